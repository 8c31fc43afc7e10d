//! Core types shared across the osprey front end.
//!
//! - [`Span`] and [`TypeHash`] for locations and identity
//! - [`Ty`], the type model
//! - definition entries ([`TypeDef`], [`MethodDef`], ...) and the
//!   [`Symbol`] wrappers lookup hands to the binder
//! - [`BindError`], [`ErrorKind`] and [`DiagnosticBag`]
//! - [`LanguageVersion`] feature gates and [`ConstantValue`]

mod accessibility;
mod constant;
mod diagnostics;
pub mod entries;
mod error;
mod language;
mod span;
pub mod symbol;
mod ty;
mod type_hash;

pub use accessibility::Accessibility;
pub use constant::ConstantValue;
pub use diagnostics::{Diagnostic, DiagnosticBag};
pub use entries::{
    EventDef, FieldDef, MethodDef, MethodKind, ParamDef, PropertyDef, RefKind, TypeDef, TypeKind,
    TypeParamDef,
};
pub use error::{BindError, ErrorKind, RegistrationError, Severity};
pub use language::{LanguageVersion, MessageId};
pub use span::Span;
pub use symbol::{
    AliasSymbol, AliasTarget, EventSymbol, FieldSymbol, LabelSymbol, LocalSymbol, MethodSymbol,
    NamespaceId, NamespaceSymbol, ParamInfo, ParameterSymbol, PropertySymbol, RangeVariableSymbol,
    Symbol, SymbolKind,
};
pub use ty::{ArrayTy, ErrorType, FunctionPointerTy, NamedTy, SpecialType, Substitution, TupleTy, Ty, TypeParamTy};
pub use type_hash::{TypeHash, hash_constants};
