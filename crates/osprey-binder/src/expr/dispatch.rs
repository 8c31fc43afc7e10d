//! The expression dispatcher.
//!
//! One exhaustive match routes every syntax shape to its binder. After the
//! form is bound, a node whose type is a pointer or function pointer outside
//! an unsafe context is reported; the node itself is kept so later checks
//! still see its symbols.

use osprey_core::{BindError, DiagnosticBag};
use osprey_symbols::LookupResultKind;
use osprey_syntax::{Expr, ParenExpr};
use tracing::{instrument, trace};

use super::recovery::{make_bad, resolve_to_value};
use super::value::{ValueKind, check_value};
use super::{
    arrays, cast, conditional, creation, element, invocation, keywords, literals, member, names,
    operators, tuple,
};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind};

/// Bind any expression.
///
/// The result may be a type, a namespace, a method group or one of the
/// untyped forms; callers that need a value go through
/// [`bind_value`](super::bind_value).
#[instrument(level = "trace", skip_all, fields(span = %expr.span()))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_expression<'ast>(
    binder: &Binder<'_>,
    expr: &Expr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let bound = dispatch(binder, expr, diagnostics);
    check_restricted_type(binder, bound, diagnostics)
}

fn dispatch<'ast>(
    binder: &Binder<'_>,
    expr: &Expr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    match *expr {
        // === Names and primaries ===
        Expr::Literal(literal) => literals::bind_literal(&literal),
        Expr::Ident(ident) => names::bind_identifier(binder, &ident, false, diagnostics),
        Expr::AliasQualified(qualified) => names::bind_alias_qualified(binder, qualified, diagnostics),
        Expr::PredefinedType(predefined) => {
            BoundExpr::type_expr(osprey_core::Ty::Special(predefined.special), predefined.span)
        }
        Expr::This(span) => names::bind_this(binder, span, diagnostics),
        Expr::Base(span) => names::bind_base(binder, span, diagnostics),
        Expr::Paren(paren) => bind_parenthesized(binder, paren, diagnostics),
        Expr::InterpolatedString(interpolated) => {
            literals::bind_interpolated_string(binder, interpolated, diagnostics)
        }

        // === Members, calls, element access ===
        Expr::Member(access) => member::bind_member_access(binder, access, false, diagnostics),
        Expr::Call(call) => invocation::bind_invocation(binder, call, diagnostics),
        Expr::Index(index) => element::bind_element_access(binder, index, diagnostics),

        // === Creation ===
        Expr::New(new) => creation::bind_object_creation(binder, new, diagnostics),
        Expr::ArrayCreation(array) => arrays::bind_array_creation(binder, array, diagnostics),
        Expr::ImplicitArrayCreation(array) => {
            arrays::bind_implicit_array_creation(binder, array, diagnostics)
        }
        Expr::StackAlloc(stackalloc) => arrays::bind_stackalloc(binder, stackalloc, diagnostics),

        // === Operators ===
        Expr::Unary(unary) => operators::bind_unary(binder, unary, diagnostics),
        Expr::Binary(binary) => operators::bind_binary(binder, binary, diagnostics),
        Expr::Assign(assign) => operators::bind_assignment(binder, assign, diagnostics),
        Expr::Range(range) => operators::bind_range(binder, range, diagnostics),
        Expr::Conditional(conditional) => {
            conditional::bind_conditional(binder, conditional, diagnostics)
        }
        Expr::Switch(switch) => conditional::bind_switch(binder, switch, diagnostics),
        Expr::Cast(cast) => cast::bind_cast(binder, cast, diagnostics),
        Expr::Is(test) => cast::bind_is(binder, test, diagnostics),
        Expr::As(test) => cast::bind_as(binder, test, diagnostics),

        // === Tuples and lambdas ===
        Expr::Tuple(tuple) => tuple::bind_tuple(binder, tuple, diagnostics),
        Expr::Lambda(lambda) => BoundExpr::new(BoundKind::UnboundLambda(lambda), None, lambda.span),

        // === Keyword operators ===
        Expr::Default(default) => keywords::bind_default(binder, &default, diagnostics),
        Expr::TypeOf(operand) => keywords::bind_typeof(binder, operand, diagnostics),
        Expr::SizeOf(operand) => keywords::bind_sizeof(binder, operand, diagnostics),
        Expr::NameOf(nameof) => keywords::bind_nameof(binder, nameof, diagnostics),
        Expr::Checked(checked) => keywords::bind_checked(binder, checked, diagnostics),

        Expr::Missing(span) => {
            diagnostics.add(BindError::MissingExpression { span });
            make_bad(binder, span, LookupResultKind::Empty, Vec::new(), Vec::new())
        }
    }
}

/// `(e)`: a parenthesized type or namespace is not a value; anything else
/// keeps its classification so `(M)(x)` and `(x => x)` still work.
fn bind_parenthesized<'ast>(
    binder: &Binder<'_>,
    paren: &ParenExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let inner = bind_expression(binder, &paren.inner, diagnostics);
    let inner = resolve_to_value(inner, diagnostics);
    let inner = match inner.kind {
        BoundKind::TypeExpr | BoundKind::NamespaceExpr(_) => {
            check_value(binder, inner, ValueKind::ReadableValue, diagnostics)
        }
        _ => inner,
    };
    BoundExpr {
        span: paren.span,
        ..inner
    }
}

/// Pointer-typed results need an unsafe context.
///
/// Forms that bind type syntax have already reported the pointer type and
/// carry `has_errors`, so each location is reported at most once.
fn check_restricted_type<'ast>(
    binder: &Binder<'_>,
    bound: BoundExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let restricted = bound.ty.as_ref().is_some_and(|ty| ty.is_unsafe());
    if restricted && !binder.in_unsafe_context() && !bound.has_errors && !bound.is_type() {
        trace!(ty = %bound.display_type(), "pointer type outside unsafe context");
        diagnostics.add(BindError::UnsafeNeeded { span: bound.span });
        return bound.with_errors();
    }
    bound
}
