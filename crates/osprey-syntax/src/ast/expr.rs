//! Expression AST nodes.
//!
//! Provides nodes for every expression shape the binder accepts:
//! - Literals, names, `this`/`base`, predefined type keywords
//! - Postfix forms (member access, invocation, element access)
//! - Creation forms (objects with initializers, arrays, stackalloc)
//! - Operators, assignment, conditional and switch expressions
//! - Casts, type tests, tuples, lambdas
//! - Keyword operators (`default`, `typeof`, `sizeof`, `nameof`, `checked`)
//! - `Missing`, a hole left by parser error recovery

use ordered_float::OrderedFloat;
use osprey_core::{RefKind, Span, SpecialType};

use super::types::TypeExpr;
use super::{BinaryOp, Ident, UnaryOp};

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value
    Literal(LiteralExpr<'ast>),
    /// Simple name, optionally with type arguments
    Ident(IdentExpr<'ast>),
    /// `alias::Name`
    AliasQualified(&'ast AliasQualifiedExpr<'ast>),
    /// `int`, `string`, ... used as an expression
    PredefinedType(PredefinedTypeExpr),
    This(Span),
    Base(Span),
    /// Parenthesized expression
    Paren(&'ast ParenExpr<'ast>),
    /// `receiver.name`
    Member(&'ast MemberExpr<'ast>),
    /// `callee(args)`
    Call(&'ast CallExpr<'ast>),
    /// `receiver[args]`
    Index(&'ast IndexExpr<'ast>),
    /// `new T(args) { ... }`
    New(&'ast NewExpr<'ast>),
    /// `new T[n] { ... }`
    ArrayCreation(&'ast ArrayCreationExpr<'ast>),
    /// `new[] { ... }`
    ImplicitArrayCreation(&'ast ImplicitArrayCreationExpr<'ast>),
    /// `stackalloc T[n]`
    StackAlloc(&'ast StackAllocExpr<'ast>),
    Unary(&'ast UnaryExpr<'ast>),
    Binary(&'ast BinaryExpr<'ast>),
    /// `a = b`, `a += b`
    Assign(&'ast AssignExpr<'ast>),
    /// `c ? a : b`
    Conditional(&'ast ConditionalExpr<'ast>),
    /// `x switch { ... }`
    Switch(&'ast SwitchExpr<'ast>),
    /// `(T)x`
    Cast(&'ast CastExpr<'ast>),
    /// `x is T`
    Is(&'ast TypeTestExpr<'ast>),
    /// `x as T`
    As(&'ast TypeTestExpr<'ast>),
    /// `(a, b)`
    Tuple(&'ast TupleExpr<'ast>),
    /// `(x, y) => body`
    Lambda(&'ast LambdaExpr<'ast>),
    /// `default` or `default(T)`
    Default(DefaultExpr<'ast>),
    TypeOf(&'ast TypeOperandExpr<'ast>),
    SizeOf(&'ast TypeOperandExpr<'ast>),
    NameOf(&'ast NameOfExpr<'ast>),
    /// `checked(x)` / `unchecked(x)`
    Checked(&'ast CheckedExpr<'ast>),
    /// `a..b`
    Range(&'ast RangeExpr<'ast>),
    /// `$"..."`
    InterpolatedString(&'ast InterpolatedStringExpr<'ast>),
    /// An expression the parser could not recover.
    Missing(Span),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) => e.span,
            Self::AliasQualified(e) => e.span,
            Self::PredefinedType(e) => e.span,
            Self::This(span) | Self::Base(span) | Self::Missing(span) => *span,
            Self::Paren(e) => e.span,
            Self::Member(e) => e.span,
            Self::Call(e) => e.span,
            Self::Index(e) => e.span,
            Self::New(e) => e.span,
            Self::ArrayCreation(e) => e.span,
            Self::ImplicitArrayCreation(e) => e.span,
            Self::StackAlloc(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Assign(e) => e.span,
            Self::Conditional(e) => e.span,
            Self::Switch(e) => e.span,
            Self::Cast(e) => e.span,
            Self::Is(e) | Self::As(e) => e.span,
            Self::Tuple(e) => e.span,
            Self::Lambda(e) => e.span,
            Self::Default(e) => e.span,
            Self::TypeOf(e) | Self::SizeOf(e) => e.span,
            Self::NameOf(e) => e.span,
            Self::Checked(e) => e.span,
            Self::Range(e) => e.span,
            Self::InterpolatedString(e) => e.span,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Expr<'ast> {
        let mut current = self;
        while let Expr::Paren(paren) = current {
            current = &paren.inner;
        }
        current
    }
}

// ============================================================================
// Literals and names
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    /// Integer literal; its type is the narrowest of int/uint/long/ulong.
    Int(u64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Bool(bool),
    Char(char),
    String(&'ast str),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentExpr<'ast> {
    pub ident: Ident<'ast>,
    pub type_args: &'ast [TypeExpr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AliasQualifiedExpr<'ast> {
    /// The alias, or `global`.
    pub alias: Ident<'ast>,
    pub name: Ident<'ast>,
    pub type_args: &'ast [TypeExpr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredefinedTypeExpr {
    pub special: SpecialType,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParenExpr<'ast> {
    pub inner: Expr<'ast>,
    pub span: Span,
}

// ============================================================================
// Postfix forms
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub receiver: Expr<'ast>,
    pub name: Ident<'ast>,
    pub type_args: &'ast [TypeExpr<'ast>],
    pub span: Span,
}

/// A call or element-access argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Argument<'ast> {
    pub name: Option<Ident<'ast>>,
    pub ref_kind: RefKind,
    pub value: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: Expr<'ast>,
    pub args: &'ast [Argument<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub receiver: Expr<'ast>,
    pub args: &'ast [Argument<'ast>],
    pub span: Span,
}

// ============================================================================
// Creation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewExpr<'ast> {
    pub ty: TypeExpr<'ast>,
    pub args: &'ast [Argument<'ast>],
    pub initializer: Option<Initializer<'ast>>,
    pub span: Span,
}

/// An object or collection initializer following `new T(...)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Initializer<'ast> {
    pub kind: InitializerKind<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitializerKind<'ast> {
    /// `{ A = 1, B = { ... } }`
    Object(&'ast [MemberInitializer<'ast>]),
    /// `{ 1, 2, { "k", 3 } }`
    Collection(&'ast [CollectionElement<'ast>]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberInitializer<'ast> {
    pub name: Ident<'ast>,
    pub value: InitializerValue<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitializerValue<'ast> {
    Expr(Expr<'ast>),
    Nested(Initializer<'ast>),
}

/// One `Add` call's worth of arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionElement<'ast> {
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayInitializer<'ast> {
    pub elements: &'ast [Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayCreationExpr<'ast> {
    pub element: TypeExpr<'ast>,
    pub rank: u32,
    /// Dimension sizes; empty when only the initializer determines them.
    pub sizes: &'ast [Expr<'ast>],
    pub initializer: Option<ArrayInitializer<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImplicitArrayCreationExpr<'ast> {
    pub initializer: ArrayInitializer<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackAllocExpr<'ast> {
    pub element: TypeExpr<'ast>,
    pub size: Option<Expr<'ast>>,
    pub initializer: Option<ArrayInitializer<'ast>>,
    pub span: Span,
}

// ============================================================================
// Operators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub op: BinaryOp,
    pub left: Expr<'ast>,
    pub right: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignExpr<'ast> {
    /// `None` for `=`, the operator for compound assignment.
    pub op: Option<BinaryOp>,
    pub target: Expr<'ast>,
    pub value: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionalExpr<'ast> {
    pub condition: Expr<'ast>,
    pub when_true: Expr<'ast>,
    pub when_false: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchExpr<'ast> {
    pub governing: Expr<'ast>,
    pub arms: &'ast [SwitchArm<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchArm<'ast> {
    pub pattern: ArmPattern<'ast>,
    pub value: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArmPattern<'ast> {
    Constant(Expr<'ast>),
    /// `_`
    Discard(Span),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    pub ty: TypeExpr<'ast>,
    pub operand: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeTestExpr<'ast> {
    pub operand: Expr<'ast>,
    pub ty: TypeExpr<'ast>,
    pub span: Span,
}

// ============================================================================
// Tuples and lambdas
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TupleExpr<'ast> {
    pub elements: &'ast [TupleElement<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TupleElement<'ast> {
    pub name: Option<Ident<'ast>>,
    pub value: Expr<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambdaExpr<'ast> {
    pub params: &'ast [LambdaParam<'ast>],
    pub body: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambdaParam<'ast> {
    pub name: Ident<'ast>,
    /// Explicit type, or `None` when inferred from the target delegate.
    pub ty: Option<TypeExpr<'ast>>,
    pub ref_kind: RefKind,
}

// ============================================================================
// Keyword operators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultExpr<'ast> {
    /// `default(T)`; `None` for the target-typed `default` literal.
    pub ty: Option<&'ast TypeExpr<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeOperandExpr<'ast> {
    pub ty: TypeExpr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameOfExpr<'ast> {
    pub operand: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckedExpr<'ast> {
    pub checked: bool,
    pub operand: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeExpr<'ast> {
    pub start: Option<Expr<'ast>>,
    pub end: Option<Expr<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedStringExpr<'ast> {
    pub parts: &'ast [InterpolationPart<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterpolationPart<'ast> {
    Text(&'ast str),
    Hole(Expr<'ast>),
}
