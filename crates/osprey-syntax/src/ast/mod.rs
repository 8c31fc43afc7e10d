//! Abstract syntax tree for expressions and type references.

pub mod expr;
pub mod ops;
pub mod types;

pub use expr::*;
pub use ops::*;
pub use types::*;

use osprey_core::Span;

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}
