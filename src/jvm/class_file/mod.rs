//! Method-level attributes read out of a class file
//!
//! The constant pool and the surrounding class structure are parsed elsewhere. What lives here
//! is the part a decompiler needs to get exactly right: the [`Code`](CodeAttribute) attribute,
//! whose bytecode is copied byte-for-byte out of the class file buffer into a [`ByteRegion`],
//! its exception table, and the checked exceptions declared by [`ExceptionsAttribute`].
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7

mod attribute;
mod byte_region;
mod reader;
mod settings;

pub use attribute::*;
pub use byte_region::*;
pub use reader::*;
pub use settings::*;
