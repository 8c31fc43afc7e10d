//! Expression binding for the osprey front end.
//!
//! This crate turns expression syntax into bound expression trees: every
//! node annotated with its type, the symbol it resolved to and an error
//! flag, with diagnostics reported into a [`DiagnosticBag`] rather than
//! returned as `Err`.
//!
//! ## Architecture
//!
//! ```text
//! Expr<'ast> ──> bind_value ──> dispatch ──> per-form binders ──> BoundExpr<'ast>
//!                    │                            │
//!                    │                            ├── Lookup (osprey-symbols)
//!                    │                            ├── Conversions
//!                    │                            └── OverloadResolver
//!                    └── check_value (readable / assignable / ref)
//! ```
//!
//! Binding is total: every input yields a tree, and failures produce
//! bad-expression nodes carrying an error type plus whatever candidate
//! symbols and bound children were found on the way.
//!
//! ## Example
//!
//! ```ignore
//! let compilation = Compilation::new(&symbols);
//! let binder = compilation.root_binder();
//! let mut diagnostics = DiagnosticBag::new();
//! let bound = bind_value(&binder, &expr, ValueKind::ReadableValue, &mut diagnostics);
//! ```

mod binder;
mod bound;
mod compilation;
pub mod conversion;
pub mod expr;
pub mod overload;
mod scope;
mod type_binding;

pub use binder::{Binder, BinderFlags, MethodContext};
pub use bound::{BoundArm, BoundExpr, BoundKind, PatternSymbol};
pub use compilation::{Compilation, CompilationOptions};
pub use conversion::{Conversion, ConversionKind, Conversions, DefaultConversions};
pub use expr::{
    AnalyzedArguments, ValueKind, bind_arguments_and_names, bind_expression, bind_value,
    check_value, make_bad, natural_type, natural_type_without_default_diagnostic,
};
pub use overload::{
    ArgumentInfo, CandidateSignature, DefaultOverloadResolver, MemberResolutionKind,
    MemberResolutionResult, OverloadResolutionResult, OverloadResolver,
};
pub use scope::LocalScope;
pub use type_binding::bind_type;

pub use osprey_core::{BindError, Diagnostic, DiagnosticBag, ErrorKind, Severity};
