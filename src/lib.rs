//! Method bodies, method signatures and code regions for a JVM class file decompiler
//!
//! The [`jvm`] module models what a decompiler reads out of a method: its `Code` attribute,
//! exception table and declared checked exceptions, its (generic) signature, and a visitor
//! protocol for pushing all of that to an instruction decoder. The [`util`] module has the
//! interval algebra used to split bytecode into protected and unprotected regions.

pub mod jvm;
pub mod util;
