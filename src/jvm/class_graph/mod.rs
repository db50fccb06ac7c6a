use super::{
    BinaryName, Error, GenericParameter, MethodDefinition, MethodReference, Name, TypeReference,
    UnqualifiedName,
};
use elsa::map::FrozenMap;
use elsa::FrozenVec;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use typed_arena::Arena;

mod java_lib_types;

pub use java_lib_types::*;

/// Lookup of method definitions on declared types
///
/// This is what a method reference gets resolved against. Lookups are by name and erased
/// signature, since that is all the JVM itself dispatches on.
pub trait MethodResolver {
    /// Find the definition of `method`, starting the search from `declaring_type`
    fn resolve_method(
        &self,
        declaring_type: &TypeReference,
        method: &dyn MethodReference,
    ) -> Result<&MethodDefinition, Error>;
}

pub struct ClassGraphArenas<'g> {
    class_arena: Arena<ClassData<'g>>,
    method_arena: Arena<MethodDefinition>,
}

impl<'g> ClassGraphArenas<'g> {
    pub fn new() -> Self {
        ClassGraphArenas {
            class_arena: Arena::new(),
            method_arena: Arena::new(),
        }
    }
}

impl<'g> Default for ClassGraphArenas<'g> {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the relationships between classes/interfaces and the methods declared on them
///
/// Classes are added supertypes first, so every class can point directly at its superclass and
/// interfaces. Nothing is ever removed, which is what lets the graph hand out references while
/// still accepting new classes.
pub struct ClassGraph<'g> {
    arenas: &'g ClassGraphArenas<'g>,
    classes: FrozenMap<&'g BinaryName, &'g ClassData<'g>>,
}

impl<'g> ClassGraph<'g> {
    /// New empty graph
    pub fn new(arenas: &'g ClassGraphArenas<'g>) -> Self {
        ClassGraph {
            arenas,
            classes: FrozenMap::new(),
        }
    }

    pub fn lookup_class(&self, name: &BinaryName) -> Option<&ClassData<'g>> {
        self.classes.get(name)
    }

    /// Add a new class to the class graph
    ///
    /// If a class by the same name is already present, the existing entry is kept and returned.
    pub fn add_class(&'g self, data: ClassData<'g>) -> &'g ClassData<'g> {
        let data = &*self.arenas.class_arena.alloc(data);
        let stored = self.classes.insert(&data.name, data);
        if !std::ptr::eq(stored, data) {
            log::warn!("Class {} was already in the class graph", data.name);
        }
        stored
    }

    /// Add a method to its class
    ///
    /// Adding a method with the same name and erased signature as one already on the class
    /// returns the existing method.
    pub fn add_method(
        &self,
        class: &'g ClassData<'g>,
        method: MethodDefinition,
    ) -> Result<&'g MethodDefinition, Error> {
        let declared_on = method
            .declaring_type()
            .and_then(TypeReference::erased_class_name);
        if declared_on.as_ref() != Some(&class.name) {
            return Err(Error::InvalidArgument(format!(
                "{} cannot be added to class {}",
                method.full_name(),
                class.name
            )));
        }

        let erased_signature = method.erased_signature();
        if let Some(existing) = class
            .methods
            .iter()
            .find(|m| m.name() == method.name() && m.erased_signature() == erased_signature)
        {
            log::trace!("Method {} already in the class graph", existing.full_name());
            return Ok(existing);
        }

        let data = &*self.arenas.method_arena.alloc(method);
        class.methods.push(data);
        Ok(data)
    }

    /// Add standard types to the class graph
    pub fn insert_java_library_types(&'g self) -> Result<JavaLibrary<'g>, Error> {
        JavaLibrary::add_to_graph(self)
    }
}

impl<'g> MethodResolver for ClassGraph<'g> {
    fn resolve_method(
        &self,
        declaring_type: &TypeReference,
        method: &dyn MethodReference,
    ) -> Result<&MethodDefinition, Error> {
        let class_name = declaring_type.erased_class_name().ok_or_else(|| {
            Error::NotResolvable(format!(
                "{} is declared on primitive type {:?}",
                method.full_name(),
                declaring_type
            ))
        })?;
        let class = match self.lookup_class(&class_name) {
            Some(class) => class,
            None => {
                log::debug!("Cannot resolve {}: class is unknown", method.full_name());
                return Err(Error::MissingClass(class_name.as_str().to_string()));
            }
        };

        // Initializers are never inherited
        let erased_signature = method.erased_signature();
        let found = if method.is_special_name() {
            class.declared_method(method.name(), &erased_signature)
        } else {
            class.find_method(method.name(), &erased_signature)
        };

        match found {
            Some(definition) => {
                log::trace!(
                    "Resolved {} to {}",
                    method.full_name(),
                    definition.full_name()
                );
                Ok(definition)
            }
            None => {
                log::debug!("Cannot resolve {}: no such method", method.full_name());
                Err(Error::MissingMember(format!(
                    "{}.{}{}",
                    class_name,
                    method.name(),
                    erased_signature
                )))
            }
        }
    }
}

pub struct ClassData<'g> {
    pub name: BinaryName,

    /// Superclass is only ever `null` for `java/lang/Object` itself
    pub superclass: Option<&'g ClassData<'g>>,

    /// Interfaces implemented (or super-interfaces)
    pub interfaces: FrozenVec<&'g ClassData<'g>>,

    pub is_interface: bool,

    /// Type parameters of the class, for parsing the signatures of its members
    pub generic_parameters: Vec<GenericParameter>,

    pub methods: FrozenVec<&'g MethodDefinition>,
}

impl<'g> ClassData<'g> {
    pub fn new(name: BinaryName, superclass: &'g ClassData<'g>, is_interface: bool) -> Self {
        ClassData {
            name,
            superclass: Some(superclass),
            interfaces: FrozenVec::new(),
            is_interface,
            generic_parameters: vec![],
            methods: FrozenVec::new(),
        }
    }

    pub fn with_generic_parameters(mut self, generic_parameters: Vec<GenericParameter>) -> Self {
        self.generic_parameters = generic_parameters;
        self
    }

    pub fn add_interfaces(&self, interfaces: impl IntoIterator<Item = &'g ClassData<'g>>) {
        for interface in interfaces {
            self.interfaces.push(interface);
        }
    }

    /// Erased type of instances of this class
    pub fn as_type(&self) -> TypeReference {
        TypeReference::object(self.name.clone())
    }

    /// Method declared directly on this class
    pub fn declared_method(
        &self,
        name: &UnqualifiedName,
        erased_signature: &str,
    ) -> Option<&MethodDefinition> {
        self.methods
            .iter()
            .find(|method| method.name() == name && method.erased_signature() == erased_signature)
    }

    /// Method declared on this class or inherited from a supertype
    ///
    /// The superclass chain is searched before any interfaces, so a concrete method always wins
    /// over an interface method with the same signature.
    pub fn find_method<'a>(
        &'a self,
        name: &UnqualifiedName,
        erased_signature: &str,
    ) -> Option<&'a MethodDefinition> {
        let mut interfaces_to_visit: VecDeque<&'a ClassData<'g>> = VecDeque::new();
        let mut dont_revisit: HashSet<&'a BinaryName> = HashSet::new();

        let mut next_class: Option<&'a ClassData<'g>> = Some(self);
        while let Some(class) = next_class {
            if let Some(method) = class.declared_method(name, erased_signature) {
                return Some(method);
            }
            for interface in &class.interfaces {
                if dont_revisit.insert(&interface.name) {
                    interfaces_to_visit.push_back(interface);
                }
            }
            next_class = class.superclass;
        }

        while let Some(interface) = interfaces_to_visit.pop_front() {
            if let Some(method) = interface.declared_method(name, erased_signature) {
                return Some(method);
            }
            for super_interface in &interface.interfaces {
                if dont_revisit.insert(&super_interface.name) {
                    interfaces_to_visit.push_back(super_interface);
                }
            }
        }

        None
    }
}

impl<'g> fmt::Debug for ClassData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassData")
            .field("name", &self.name)
            .field("superclass", &self.superclass.map(|class| &class.name))
            .field("is_interface", &self.is_interface)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{MethodAccessFlags, MethodRef};

    fn method(
        class: &ClassData,
        name: UnqualifiedName,
        descriptor: &str,
    ) -> MethodDefinition {
        let signature = crate::jvm::MethodSignature::parse_descriptor(descriptor).unwrap();
        MethodDefinition::new(
            class.as_type(),
            name,
            MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
            signature,
        )
    }

    #[test]
    fn inherited_methods() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        let java = graph.insert_java_library_types().unwrap();

        let string_ref = MethodRef::from_descriptor(
            Some(TypeReference::object(BinaryName::STRING)),
            "hashCode",
            "()I",
        )
        .unwrap();
        let resolved = string_ref.resolve(&graph).unwrap();
        assert_eq!(resolved.declaring_type(), Some(&java.lang.object.as_type()));
    }

    #[test]
    fn interfaces_after_superclasses() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        let java = graph.insert_java_library_types().unwrap();

        let sized = graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("test/Sized")).unwrap(),
            java.lang.object,
            true,
        ));
        let size_name = UnqualifiedName::SIZE;
        graph
            .add_method(sized, method(sized, size_name.clone(), "()I"))
            .unwrap();

        let base = graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("test/Base")).unwrap(),
            java.lang.object,
            false,
        ));
        graph
            .add_method(base, method(base, size_name.clone(), "()I"))
            .unwrap();

        let derived = graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("test/Derived")).unwrap(),
            base,
            false,
        ));
        derived.add_interfaces([sized]);

        let found = derived.find_method(&size_name, "()I").unwrap();
        assert_eq!(found.declaring_type(), Some(&base.as_type()));
    }

    #[test]
    fn initializers_are_not_inherited() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        graph.insert_java_library_types().unwrap();

        let init = MethodRef::from_descriptor(
            Some(TypeReference::object(BinaryName::INTEGER)),
            "<init>",
            "()V",
        )
        .unwrap();
        assert!(matches!(init.resolve(&graph), Err(Error::MissingMember(_))));

        let object_init = MethodRef::from_descriptor(
            Some(TypeReference::object(BinaryName::OBJECT)),
            "<init>",
            "()V",
        )
        .unwrap();
        assert!(object_init.resolve(&graph).is_ok());
    }

    #[test]
    fn duplicate_classes_keep_the_first() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        let java = graph.insert_java_library_types().unwrap();

        let name = BinaryName::from_string(String::from("test/A")).unwrap();
        let first = graph.add_class(ClassData::new(name.clone(), java.lang.object, false));
        let second = graph.add_class(ClassData::new(name.clone(), java.lang.object, false));
        assert!(std::ptr::eq(first, second));

        let f = UnqualifiedName::from_string(String::from("f")).unwrap();
        let added = graph.add_method(second, method(second, f, "()V")).unwrap();

        let f_ref = MethodRef::from_descriptor(Some(TypeReference::object(name)), "f", "()V")
            .unwrap();
        assert!(std::ptr::eq(f_ref.resolve(&graph).unwrap(), added));
    }

    #[test]
    fn add_method_deduplicates() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        let java = graph.insert_java_library_types().unwrap();
        let object = java.lang.object;

        let before = object.methods.len();
        let first = graph
            .add_method(object, method(object, UnqualifiedName::TOSTRING, "()Ljava/lang/String;"))
            .unwrap();
        assert_eq!(object.methods.len(), before);
        assert_eq!(first.name(), &UnqualifiedName::TOSTRING);

        let misplaced = method(java.lang.string, UnqualifiedName::SIZE, "()I");
        assert!(graph.add_method(object, misplaced).is_err());
    }
}
