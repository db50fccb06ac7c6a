//! Model JVM methods for decompilation
//!
//! ### Simple example
//!
//! Consider resolving the call `list.get(0)` where `list` is a `List<String>`:
//!
//! ```
//! use jdec::jvm::class_graph::*;
//! use jdec::jvm::*;
//!
//! # fn resolve_list_get() -> Result<(), Error> {
//! // Setup the class graph, add in Java standard library types
//! let class_graph_arenas = ClassGraphArenas::new();
//! let class_graph = ClassGraph::new(&class_graph_arenas);
//! let java = class_graph.insert_java_library_types()?;
//!
//! // The call site only knows the erased descriptor
//! let list_of_strings = TypeReference::generic(
//!     BinaryName::LIST,
//!     vec![TypeArgument::Exact(TypeReference::object(BinaryName::STRING))],
//! );
//! let get = MethodRef::from_descriptor(Some(list_of_strings), "get", "(I)Ljava/lang/Object;")?;
//!
//! // The definition still knows about the type variable
//! let definition = get.resolve(&class_graph)?;
//! assert!(!definition.is_generic_method());
//! assert_eq!(definition.declaring_type(), Some(&java.util.list.as_type()));
//! assert_eq!(definition.signature(), "(I)TE;");
//! assert_eq!(definition.erased_signature(), "(I)Ljava/lang/Object;");
//! # Ok(())
//! # }
//! # resolve_list_get().unwrap();
//! ```

mod access_flags;
pub mod class_file;
pub mod class_graph;
mod descriptors;
mod errors;
mod method;
mod names;
mod signatures;
pub mod visitor;

pub use access_flags::*;
pub use descriptors::*;
pub use errors::*;
pub use method::*;
pub use names::*;
pub use signatures::*;
