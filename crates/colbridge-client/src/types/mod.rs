//! Column types and their client-visible classification.
//!
//! [`TypeKind`] is the closed set of wire-level type identifiers.
//! [`ColumnType`] is a declared column type: a kind plus its nested type
//! arguments for collections, tuples and user-defined types.

mod column;
mod kind;
pub mod registry;

pub use column::{ColumnType, UdtType};
pub use kind::{ClientKind, SqlType, TypeKind};
pub use registry::{TypeDescriptor, TypeRegistry};
