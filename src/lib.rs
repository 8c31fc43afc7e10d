//! osprey: expression binding for a C#-like front end.
//!
//! This crate re-exports the workspace members and adds a one-call entry
//! point for hosts that only need to bind a single expression.
//!
//! | Crate | Contents |
//! |-------|----------|
//! | [`core`] | `Ty`, symbols, definitions, constants, `BindError` and `DiagnosticBag` |
//! | [`syntax`] | arena-allocated expression syntax and `AstBuilder` |
//! | [`symbols`] | `SymbolTable`, the namespace tree and the default `Lookup` |
//! | [`binder`] | the binder chain, bound trees, conversions and overload resolution |
//!
//! # Example
//!
//! ```ignore
//! use osprey::prelude::*;
//!
//! let symbols = SymbolTable::with_special_types();
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let binding = osprey::bind(&symbols, CompilationOptions::default(), "", &b.int(42))?;
//! assert_eq!(binding.expr.ty, Some(Ty::INT));
//! ```

use thiserror::Error;
use tracing::{debug, instrument};

pub use osprey_binder as binder;
pub use osprey_core as core;
pub use osprey_symbols as symbols;
pub use osprey_syntax as syntax;

use osprey_binder::{BoundExpr, Compilation, CompilationOptions, ValueKind, bind_value, natural_type};
use osprey_core::DiagnosticBag;
use osprey_symbols::SymbolTable;
use osprey_syntax::Expr;

pub mod prelude {
    pub use bumpalo::Bump;
    pub use osprey_binder::{
        AnalyzedArguments, Binder, BinderFlags, BoundArm, BoundExpr, BoundKind, Compilation,
        CompilationOptions, LocalScope, MethodContext, ValueKind, bind_arguments_and_names,
        bind_expression, bind_value, natural_type,
    };
    pub use osprey_core::{
        BindError, ConstantValue, Diagnostic, DiagnosticBag, ErrorKind, LanguageVersion, Severity,
        Span, SpecialType, Ty,
    };
    pub use osprey_symbols::SymbolTable;
    pub use osprey_syntax::{AstBuilder, Expr};

    pub use crate::{Binding, SessionError, bind};
}

/// Errors setting up a binding session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown namespace '{path}'")]
    UnknownNamespace { path: String },
}

/// One bound expression and the diagnostics reported while binding it.
#[derive(Debug)]
pub struct Binding<'ast> {
    pub expr: BoundExpr<'ast>,
    pub diagnostics: DiagnosticBag,
}

impl Binding<'_> {
    pub fn has_errors(&self) -> bool {
        self.expr.has_errors || self.diagnostics.has_errors()
    }
}

/// Bind `expr` as a readable value inside `namespace` (`""` for the global
/// namespace) and give it its natural type.
#[instrument(level = "trace", skip_all, fields(namespace))]
pub fn bind<'ast>(
    symbols: &SymbolTable,
    options: CompilationOptions,
    namespace: &str,
    expr: &Expr<'ast>,
) -> Result<Binding<'ast>, SessionError> {
    let Some(ns) = symbols.namespaces().get_path(namespace) else {
        debug!(namespace, "unknown namespace");
        return Err(SessionError::UnknownNamespace {
            path: namespace.to_string(),
        });
    };
    let compilation = Compilation::new(symbols).with_options(options);
    let root = compilation.root_binder();
    let binder = root.with_namespace(ns);

    let mut diagnostics = DiagnosticBag::new();
    let bound = bind_value(&binder, expr, ValueKind::ReadableValue, &mut diagnostics);
    let expr = natural_type(&binder, bound, &mut diagnostics);
    Ok(Binding { expr, diagnostics })
}
