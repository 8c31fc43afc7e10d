//! Definition entries stored in the symbol table.
//!
//! Definitions describe declarations exactly as written: member types refer
//! to the declaring type's own type parameters. Symbols (see
//! [`crate::symbol`]) pair a definition with a concrete container and carry
//! the substituted types.

mod member;
mod type_def;
mod type_param;

pub use member::{EventDef, FieldDef, MethodDef, MethodKind, ParamDef, PropertyDef, RefKind};
pub use type_def::{TypeDef, TypeKind};
pub use type_param::TypeParamDef;
