//! Arena-backed construction of syntax trees.
//!
//! Each node receives a fresh single-line span from a running column
//! counter, so nodes built later start later. [`AstBuilder::at`] overrides
//! the span of the next node when a test needs a specific position.

use std::cell::Cell;

use bumpalo::Bump;
use ordered_float::OrderedFloat;
use osprey_core::{RefKind, Span, SpecialType};

use crate::ast::*;

pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    line: u32,
    column: Cell<u32>,
    pinned: Cell<Option<Span>>,
}

impl<'ast> AstBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self::on_line(arena, 1)
    }

    /// A builder whose spans are all on `line`.
    pub fn on_line(arena: &'ast Bump, line: u32) -> Self {
        Self {
            arena,
            line,
            column: Cell::new(1),
            pinned: Cell::new(None),
        }
    }

    pub fn arena(&self) -> &'ast Bump {
        self.arena
    }

    /// Use `span` for the next node built.
    pub fn at(&self, span: Span) -> &Self {
        self.pinned.set(Some(span));
        self
    }

    fn span(&self, len: usize) -> Span {
        if let Some(span) = self.pinned.take() {
            return span;
        }
        let col = self.column.get();
        let len = len.max(1) as u32;
        self.column.set(col + len + 1);
        Span::new(self.line, col, len)
    }

    fn alloc<T>(&self, value: T) -> &'ast T {
        self.arena.alloc(value)
    }

    fn slice<T: Copy>(&self, items: &[T]) -> &'ast [T] {
        self.arena.alloc_slice_copy(items)
    }

    fn str(&self, text: &str) -> &'ast str {
        self.arena.alloc_str(text)
    }

    pub fn ident_token(&self, name: &str) -> Ident<'ast> {
        Ident::new(self.str(name), self.span(name.len()))
    }

    // =========================================================================
    // Literals and names
    // =========================================================================

    fn literal(&self, kind: LiteralKind<'ast>, len: usize) -> Expr<'ast> {
        Expr::Literal(LiteralExpr {
            kind,
            span: self.span(len),
        })
    }

    pub fn int(&self, value: u64) -> Expr<'ast> {
        self.literal(LiteralKind::Int(value), value.to_string().len())
    }

    pub fn double(&self, value: f64) -> Expr<'ast> {
        self.literal(LiteralKind::Double(OrderedFloat(value)), 3)
    }

    pub fn float(&self, value: f32) -> Expr<'ast> {
        self.literal(LiteralKind::Float(OrderedFloat(value)), 4)
    }

    pub fn bool(&self, value: bool) -> Expr<'ast> {
        self.literal(LiteralKind::Bool(value), 4)
    }

    pub fn char(&self, value: char) -> Expr<'ast> {
        self.literal(LiteralKind::Char(value), 3)
    }

    pub fn string(&self, value: &str) -> Expr<'ast> {
        self.literal(LiteralKind::String(self.str(value)), value.len() + 2)
    }

    pub fn null(&self) -> Expr<'ast> {
        self.literal(LiteralKind::Null, 4)
    }

    pub fn ident(&self, name: &str) -> Expr<'ast> {
        self.generic_ident(name, &[])
    }

    pub fn generic_ident(&self, name: &str, type_args: &[TypeExpr<'ast>]) -> Expr<'ast> {
        let ident = self.ident_token(name);
        Expr::Ident(IdentExpr {
            ident,
            type_args: self.slice(type_args),
            span: ident.span,
        })
    }

    pub fn alias_qualified(&self, alias: &str, name: &str) -> Expr<'ast> {
        let alias = self.ident_token(alias);
        let name = self.ident_token(name);
        Expr::AliasQualified(self.alloc(AliasQualifiedExpr {
            alias,
            name,
            type_args: &[],
            span: alias.span.merge(name.span),
        }))
    }

    pub fn predefined(&self, special: SpecialType) -> Expr<'ast> {
        Expr::PredefinedType(PredefinedTypeExpr {
            special,
            span: self.span(special.keyword().map_or(6, str::len)),
        })
    }

    pub fn this(&self) -> Expr<'ast> {
        Expr::This(self.span(4))
    }

    pub fn base(&self) -> Expr<'ast> {
        Expr::Base(self.span(4))
    }

    pub fn paren(&self, inner: Expr<'ast>) -> Expr<'ast> {
        Expr::Paren(self.alloc(ParenExpr {
            inner,
            span: inner.span(),
        }))
    }

    pub fn missing(&self) -> Expr<'ast> {
        Expr::Missing(self.span(0))
    }

    // =========================================================================
    // Postfix forms
    // =========================================================================

    pub fn member(&self, receiver: Expr<'ast>, name: &str) -> Expr<'ast> {
        self.generic_member(receiver, name, &[])
    }

    pub fn generic_member(
        &self,
        receiver: Expr<'ast>,
        name: &str,
        type_args: &[TypeExpr<'ast>],
    ) -> Expr<'ast> {
        let name = self.ident_token(name);
        Expr::Member(self.alloc(MemberExpr {
            receiver,
            name,
            type_args: self.slice(type_args),
            span: receiver.span().merge(name.span),
        }))
    }

    /// A dotted name such as `System.Console.Out`, as nested member accesses.
    pub fn dotted(&self, path: &str) -> Expr<'ast> {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or(path);
        segments.fold(self.ident(first), |receiver, segment| {
            self.member(receiver, segment)
        })
    }

    pub fn arg(&self, value: Expr<'ast>) -> Argument<'ast> {
        Argument {
            name: None,
            ref_kind: RefKind::None,
            value,
            span: value.span(),
        }
    }

    pub fn named_arg(&self, name: &str, value: Expr<'ast>) -> Argument<'ast> {
        let name = self.ident_token(name);
        Argument {
            name: Some(name),
            ref_kind: RefKind::None,
            value,
            span: name.span.merge(value.span()),
        }
    }

    pub fn ref_arg(&self, ref_kind: RefKind, value: Expr<'ast>) -> Argument<'ast> {
        Argument {
            name: None,
            ref_kind,
            value,
            span: value.span(),
        }
    }

    pub fn call(&self, callee: Expr<'ast>, args: &[Argument<'ast>]) -> Expr<'ast> {
        Expr::Call(self.alloc(CallExpr {
            callee,
            args: self.slice(args),
            span: callee.span(),
        }))
    }

    /// `callee(a, b, ...)` with positional arguments.
    pub fn call_with(&self, callee: Expr<'ast>, args: &[Expr<'ast>]) -> Expr<'ast> {
        let args: Vec<_> = args.iter().map(|a| self.arg(*a)).collect();
        self.call(callee, &args)
    }

    pub fn index(&self, receiver: Expr<'ast>, args: &[Argument<'ast>]) -> Expr<'ast> {
        Expr::Index(self.alloc(IndexExpr {
            receiver,
            args: self.slice(args),
            span: receiver.span(),
        }))
    }

    /// `receiver[a, b, ...]` with positional arguments.
    pub fn index_with(&self, receiver: Expr<'ast>, args: &[Expr<'ast>]) -> Expr<'ast> {
        let args: Vec<_> = args.iter().map(|a| self.arg(*a)).collect();
        self.index(receiver, &args)
    }

    // =========================================================================
    // Creation
    // =========================================================================

    pub fn new_object(
        &self,
        ty: TypeExpr<'ast>,
        args: &[Argument<'ast>],
        initializer: Option<Initializer<'ast>>,
    ) -> Expr<'ast> {
        Expr::New(self.alloc(NewExpr {
            ty,
            args: self.slice(args),
            initializer,
            span: self.span(3).merge(ty.span()),
        }))
    }

    pub fn object_initializer(&self, members: &[MemberInitializer<'ast>]) -> Initializer<'ast> {
        Initializer {
            kind: InitializerKind::Object(self.slice(members)),
            span: self.span(2),
        }
    }

    pub fn member_init(&self, name: &str, value: Expr<'ast>) -> MemberInitializer<'ast> {
        let name = self.ident_token(name);
        MemberInitializer {
            name,
            value: InitializerValue::Expr(value),
            span: name.span.merge(value.span()),
        }
    }

    pub fn nested_member_init(&self, name: &str, nested: Initializer<'ast>) -> MemberInitializer<'ast> {
        let name = self.ident_token(name);
        MemberInitializer {
            name,
            value: InitializerValue::Nested(nested),
            span: name.span.merge(nested.span),
        }
    }

    pub fn collection_initializer(&self, elements: &[&[Expr<'ast>]]) -> Initializer<'ast> {
        let elements: Vec<_> = elements
            .iter()
            .map(|args| CollectionElement {
                args: self.slice(args),
                span: args.first().map_or_else(|| self.span(2), Expr::span),
            })
            .collect();
        Initializer {
            kind: InitializerKind::Collection(self.slice(&elements)),
            span: self.span(2),
        }
    }

    pub fn array_initializer(&self, elements: &[Expr<'ast>]) -> ArrayInitializer<'ast> {
        ArrayInitializer {
            elements: self.slice(elements),
            span: self.span(2),
        }
    }

    pub fn new_array(
        &self,
        element: TypeExpr<'ast>,
        sizes: &[Expr<'ast>],
        initializer: Option<ArrayInitializer<'ast>>,
    ) -> Expr<'ast> {
        let rank = sizes.len().max(1) as u32;
        Expr::ArrayCreation(self.alloc(ArrayCreationExpr {
            element,
            rank,
            sizes: self.slice(sizes),
            initializer,
            span: self.span(3).merge(element.span()),
        }))
    }

    /// `new T[,]{ ... }`: a rank given by the initializer alone.
    pub fn new_array_of_rank(
        &self,
        element: TypeExpr<'ast>,
        rank: u32,
        initializer: ArrayInitializer<'ast>,
    ) -> Expr<'ast> {
        Expr::ArrayCreation(self.alloc(ArrayCreationExpr {
            element,
            rank,
            sizes: &[],
            initializer: Some(initializer),
            span: self.span(3).merge(element.span()),
        }))
    }

    pub fn implicit_array(&self, elements: &[Expr<'ast>]) -> Expr<'ast> {
        let span = self.span(5);
        Expr::ImplicitArrayCreation(self.alloc(ImplicitArrayCreationExpr {
            initializer: self.array_initializer(elements),
            span,
        }))
    }

    pub fn stackalloc(&self, element: TypeExpr<'ast>, size: Expr<'ast>) -> Expr<'ast> {
        Expr::StackAlloc(self.alloc(StackAllocExpr {
            element,
            size: Some(size),
            initializer: None,
            span: self.span(10),
        }))
    }

    pub fn stackalloc_init(
        &self,
        element: TypeExpr<'ast>,
        size: Option<Expr<'ast>>,
        elements: &[Expr<'ast>],
    ) -> Expr<'ast> {
        Expr::StackAlloc(self.alloc(StackAllocExpr {
            element,
            size,
            initializer: Some(self.array_initializer(elements)),
            span: self.span(10),
        }))
    }

    // =========================================================================
    // Operators
    // =========================================================================

    pub fn unary(&self, op: UnaryOp, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::Unary(self.alloc(UnaryExpr {
            op,
            operand,
            span: self.span(1).merge(operand.span()),
        }))
    }

    pub fn binary(&self, op: BinaryOp, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        Expr::Binary(self.alloc(BinaryExpr {
            op,
            left,
            right,
            span: left.span().merge(right.span()),
        }))
    }

    pub fn assign(&self, target: Expr<'ast>, value: Expr<'ast>) -> Expr<'ast> {
        self.compound_assign(None, target, value)
    }

    pub fn compound_assign(
        &self,
        op: Option<BinaryOp>,
        target: Expr<'ast>,
        value: Expr<'ast>,
    ) -> Expr<'ast> {
        Expr::Assign(self.alloc(AssignExpr {
            op,
            target,
            value,
            span: target.span().merge(value.span()),
        }))
    }

    pub fn conditional(
        &self,
        condition: Expr<'ast>,
        when_true: Expr<'ast>,
        when_false: Expr<'ast>,
    ) -> Expr<'ast> {
        Expr::Conditional(self.alloc(ConditionalExpr {
            condition,
            when_true,
            when_false,
            span: condition.span().merge(when_false.span()),
        }))
    }

    pub fn switch(&self, governing: Expr<'ast>, arms: &[SwitchArm<'ast>]) -> Expr<'ast> {
        Expr::Switch(self.alloc(SwitchExpr {
            governing,
            arms: self.slice(arms),
            span: governing.span(),
        }))
    }

    pub fn arm(&self, pattern: Expr<'ast>, value: Expr<'ast>) -> SwitchArm<'ast> {
        SwitchArm {
            pattern: ArmPattern::Constant(pattern),
            value,
            span: pattern.span().merge(value.span()),
        }
    }

    pub fn discard_arm(&self, value: Expr<'ast>) -> SwitchArm<'ast> {
        let span = self.span(1);
        SwitchArm {
            pattern: ArmPattern::Discard(span),
            value,
            span: span.merge(value.span()),
        }
    }

    pub fn cast(&self, ty: TypeExpr<'ast>, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::Cast(self.alloc(CastExpr {
            ty,
            operand,
            span: ty.span().merge(operand.span()),
        }))
    }

    pub fn is_type(&self, operand: Expr<'ast>, ty: TypeExpr<'ast>) -> Expr<'ast> {
        Expr::Is(self.alloc(TypeTestExpr {
            operand,
            ty,
            span: operand.span().merge(ty.span()),
        }))
    }

    pub fn as_type(&self, operand: Expr<'ast>, ty: TypeExpr<'ast>) -> Expr<'ast> {
        Expr::As(self.alloc(TypeTestExpr {
            operand,
            ty,
            span: operand.span().merge(ty.span()),
        }))
    }

    // =========================================================================
    // Tuples and lambdas
    // =========================================================================

    pub fn tuple(&self, elements: &[Expr<'ast>]) -> Expr<'ast> {
        let named: Vec<_> = elements.iter().map(|e| (None, *e)).collect();
        self.named_tuple(&named)
    }

    pub fn named_tuple(&self, elements: &[(Option<&str>, Expr<'ast>)]) -> Expr<'ast> {
        let span = self.span(2);
        let elements: Vec<_> = elements
            .iter()
            .map(|(name, value)| TupleElement {
                name: name.map(|n| self.ident_token(n)),
                value: *value,
            })
            .collect();
        Expr::Tuple(self.alloc(TupleExpr {
            elements: self.slice(&elements),
            span,
        }))
    }

    pub fn lambda_param(&self, name: &str, ty: Option<TypeExpr<'ast>>) -> LambdaParam<'ast> {
        LambdaParam {
            name: self.ident_token(name),
            ty,
            ref_kind: RefKind::None,
        }
    }

    pub fn lambda(&self, params: &[LambdaParam<'ast>], body: Expr<'ast>) -> Expr<'ast> {
        Expr::Lambda(self.alloc(LambdaExpr {
            params: self.slice(params),
            body,
            span: self.span(2).merge(body.span()),
        }))
    }

    // =========================================================================
    // Keyword operators
    // =========================================================================

    pub fn default_literal(&self) -> Expr<'ast> {
        Expr::Default(DefaultExpr {
            ty: None,
            span: self.span(7),
        })
    }

    pub fn default_of(&self, ty: TypeExpr<'ast>) -> Expr<'ast> {
        Expr::Default(DefaultExpr {
            ty: Some(self.alloc(ty)),
            span: self.span(7),
        })
    }

    pub fn type_of(&self, ty: TypeExpr<'ast>) -> Expr<'ast> {
        Expr::TypeOf(self.alloc(TypeOperandExpr {
            ty,
            span: self.span(6),
        }))
    }

    pub fn size_of(&self, ty: TypeExpr<'ast>) -> Expr<'ast> {
        Expr::SizeOf(self.alloc(TypeOperandExpr {
            ty,
            span: self.span(6),
        }))
    }

    pub fn name_of(&self, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::NameOf(self.alloc(NameOfExpr {
            operand,
            span: self.span(6),
        }))
    }

    pub fn checked(&self, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::Checked(self.alloc(CheckedExpr {
            checked: true,
            operand,
            span: self.span(7),
        }))
    }

    pub fn unchecked(&self, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::Checked(self.alloc(CheckedExpr {
            checked: false,
            operand,
            span: self.span(9),
        }))
    }

    pub fn range(&self, start: Option<Expr<'ast>>, end: Option<Expr<'ast>>) -> Expr<'ast> {
        Expr::Range(self.alloc(RangeExpr {
            start,
            end,
            span: self.span(2),
        }))
    }

    pub fn from_end(&self, operand: Expr<'ast>) -> Expr<'ast> {
        self.unary(UnaryOp::IndexFromEnd, operand)
    }

    pub fn interpolated(&self, parts: &[InterpolationPart<'ast>]) -> Expr<'ast> {
        Expr::InterpolatedString(self.alloc(InterpolatedStringExpr {
            parts: self.slice(parts),
            span: self.span(3),
        }))
    }

    pub fn text_part(&self, text: &str) -> InterpolationPart<'ast> {
        InterpolationPart::Text(self.str(text))
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub fn ty(&self, special: SpecialType) -> TypeExpr<'ast> {
        TypeExpr::Predefined {
            special,
            span: self.span(special.keyword().map_or(6, str::len)),
        }
    }

    /// A dotted type name without type arguments.
    pub fn ty_named(&self, path: &str) -> TypeExpr<'ast> {
        self.ty_generic(path, &[])
    }

    /// A dotted type name whose last segment carries `type_args`.
    pub fn ty_generic(&self, path: &str, type_args: &[TypeExpr<'ast>]) -> TypeExpr<'ast> {
        let names: Vec<&str> = path.split('.').collect();
        let last = names.len().saturating_sub(1);
        let segments: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| TypeSegment {
                ident: self.ident_token(name),
                type_args: if i == last { self.slice(type_args) } else { &[] },
            })
            .collect();
        let span = segments
            .iter()
            .map(|s| s.ident.span)
            .reduce(Span::merge)
            .unwrap_or_default();
        TypeExpr::Named(self.alloc(NamedTypeExpr {
            alias: None,
            segments: self.slice(&segments),
            span,
        }))
    }

    pub fn ty_array(&self, element: TypeExpr<'ast>, rank: u32) -> TypeExpr<'ast> {
        TypeExpr::Array {
            element: self.alloc(element),
            rank,
            span: element.span(),
        }
    }

    pub fn ty_pointer(&self, pointee: TypeExpr<'ast>) -> TypeExpr<'ast> {
        TypeExpr::Pointer {
            pointee: self.alloc(pointee),
            span: pointee.span(),
        }
    }

    pub fn ty_tuple(&self, elements: &[TypeExpr<'ast>]) -> TypeExpr<'ast> {
        let elements: Vec<_> = elements
            .iter()
            .map(|ty| TupleTypeElement { ty: *ty, name: None })
            .collect();
        TypeExpr::Tuple {
            elements: self.slice(&elements),
            span: self.span(2),
        }
    }

    pub fn ty_function_pointer(
        &self,
        params: &[TypeExpr<'ast>],
        return_type: TypeExpr<'ast>,
    ) -> TypeExpr<'ast> {
        TypeExpr::FunctionPointer {
            params: self.slice(params),
            return_type: self.alloc(return_type),
            span: self.span(9),
        }
    }

    pub fn ty_dynamic(&self) -> TypeExpr<'ast> {
        TypeExpr::Dynamic(self.span(7))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_advance() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let first = b.ident("a");
        let second = b.ident("b");
        assert!(first.span().starts_before(&second.span()));
    }

    #[test]
    fn pinned_span_applies_once() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let pinned = Span::new(9, 9, 1);
        let x = b.at(pinned).ident("x");
        let y = b.ident("y");
        assert_eq!(x.span(), pinned);
        assert_ne!(y.span(), pinned);
    }

    #[test]
    fn dotted_names_nest() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let Expr::Member(outer) = b.dotted("a.b.c") else {
            panic!("expected member access");
        };
        assert_eq!(outer.name.name, "c");
        assert!(matches!(outer.receiver, Expr::Member(inner) if inner.name.name == "b"));
    }

    #[test]
    fn unparenthesized_strips_all_levels() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let inner = b.int(1);
        let wrapped = b.paren(b.paren(inner));
        assert_eq!(*wrapped.unparenthesized(), inner);
    }

    #[test]
    fn generic_type_names() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ty = b.ty_generic("Collections.Box", &[b.ty(SpecialType::Int32)]);
        let TypeExpr::Named(named) = ty else {
            panic!("expected named type");
        };
        assert_eq!(named.display_name(), "Collections.Box");
        assert_eq!(named.segments[1].type_args.len(), 1);
        assert!(named.segments[0].type_args.is_empty());
    }
}
