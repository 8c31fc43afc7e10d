//! Type reference syntax.

use osprey_core::{Span, SpecialType};

use super::Ident;

/// A type as written in source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeExpr<'ast> {
    /// `int`, `string`, `object`, ...
    Predefined { special: SpecialType, span: Span },
    /// `A.B<C>.D`, optionally alias-qualified.
    Named(&'ast NamedTypeExpr<'ast>),
    /// `T[]`, `T[,]`
    Array {
        element: &'ast TypeExpr<'ast>,
        rank: u32,
        span: Span,
    },
    /// `T*`
    Pointer {
        pointee: &'ast TypeExpr<'ast>,
        span: Span,
    },
    /// `(int a, string b)`
    Tuple {
        elements: &'ast [TupleTypeElement<'ast>],
        span: Span,
    },
    /// `delegate*<int, void>`
    FunctionPointer {
        params: &'ast [TypeExpr<'ast>],
        return_type: &'ast TypeExpr<'ast>,
        span: Span,
    },
    /// `dynamic`
    Dynamic(Span),
}

impl<'ast> TypeExpr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Predefined { span, .. }
            | TypeExpr::Array { span, .. }
            | TypeExpr::Pointer { span, .. }
            | TypeExpr::Tuple { span, .. }
            | TypeExpr::FunctionPointer { span, .. }
            | TypeExpr::Dynamic(span) => *span,
            TypeExpr::Named(named) => named.span,
        }
    }
}

/// A dotted type name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedTypeExpr<'ast> {
    /// `alias::` or `global::` prefix.
    pub alias: Option<Ident<'ast>>,
    pub segments: &'ast [TypeSegment<'ast>],
    pub span: Span,
}

impl<'ast> NamedTypeExpr<'ast> {
    /// The dotted name without type arguments, for diagnostics.
    pub fn display_name(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.ident.name)
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeSegment<'ast> {
    pub ident: Ident<'ast>,
    pub type_args: &'ast [TypeExpr<'ast>],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TupleTypeElement<'ast> {
    pub ty: TypeExpr<'ast>,
    pub name: Option<Ident<'ast>>,
}
