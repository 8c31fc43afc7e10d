//! Casts and type tests.
//!
//! | Form | Result |
//! |------|--------|
//! | `(T)e` | an explicit conversion of `e` to `T`, folded for numeric constants |
//! | `(T1, T2)(a, b)` | a tuple literal cast element by element when the tuple as a whole does not convert |
//! | `e is T` | `bool` |
//! | `e as T` | `T`, which must be able to hold `null` |

use osprey_core::{BindError, DiagnosticBag, Span, Ty};
use osprey_syntax::{CastExpr, TypeTestExpr};
use tracing::{debug, instrument, trace};

use super::convert::{classify_expression, convert_explicit};
use super::folding;
use super::operators::folded_literal;
use super::recovery::natural_type;
use super::value::{ValueKind, bind_value};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind};
use crate::conversion::{Conversion, ConversionKind};
use crate::type_binding::bind_type_reporting;

/// Bind `(T)operand`.
#[instrument(level = "trace", skip_all)]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_cast<'ast>(
    binder: &Binder<'_>,
    cast: &'ast CastExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = cast.span;
    let (target, type_errors) = bind_type_reporting(binder, &cast.ty, diagnostics);
    let operand = bind_value(binder, &cast.operand, ValueKind::ReadableValue, diagnostics);

    if type_errors || target.contains_error() {
        let operand = natural_type(binder, operand, diagnostics);
        return conversion_node(operand, Conversion::none(), target, span).with_errors();
    }

    let conversion = classify_expression(binder, &operand, &target);
    if !conversion.is_allowed(true)
        && let BoundKind::TupleLiteral { elements, .. } = &operand.kind
        && target.as_tuple().is_some_and(|tuple| tuple.elements.len() == elements.len())
    {
        return cast_tuple_elements(binder, operand, target, span, diagnostics);
    }

    if conversion.kind == ConversionKind::ExplicitNumeric
        && let Some(special) = target.as_special()
        && let Some(folded) = operand
            .constant_value()
            .and_then(|value| folding::fold_conversion(value, special))
    {
        trace!(value = %folded.value, %target, "folded cast");
        return folded_literal(binder, folded, target, span, diagnostics);
    }

    if conversion.is_identity() && operand.ty.is_some() {
        return conversion_node(operand, conversion, target, span);
    }
    let converted = convert_explicit(binder, operand, &target, diagnostics);
    BoundExpr { span, ..converted }
}

/// `(T1, T2)(a, b)` is `((T1)a, (T2)b)` when every element converts.
/// Otherwise the whole-tuple conversion error is reported.
fn cast_tuple_elements<'ast>(
    binder: &Binder<'_>,
    operand: BoundExpr<'ast>,
    target: Ty,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let element_types = target.as_tuple().map(|tuple| tuple.elements.clone()).unwrap_or_default();
    let convertible = match &operand.kind {
        BoundKind::TupleLiteral { elements, .. } => elements.iter().zip(&element_types).all(|(element, ty)| {
            let mut speculative = DiagnosticBag::discarding();
            !convert_explicit(binder, element.clone(), ty, &mut speculative).has_errors || element.has_errors
        }),
        _ => false,
    };
    if !convertible {
        debug!(%target, "tuple literal does not convert element-wise");
        let converted = convert_explicit(binder, operand, &target, diagnostics);
        return BoundExpr { span, ..converted };
    }

    let had_errors = operand.has_errors;
    let BoundKind::TupleLiteral { elements, names } = operand.kind else {
        return BoundExpr::typed(BoundKind::DefaultValue, target, span).with_errors();
    };
    trace!(arity = elements.len(), "casting tuple elements");
    let elements = elements
        .into_iter()
        .zip(&element_types)
        .map(|(element, element_ty)| convert_explicit(binder, element, element_ty, diagnostics))
        .collect();
    BoundExpr::typed(BoundKind::TupleLiteral { elements, names }, target, span).with_errors_if(had_errors)
}

fn conversion_node<'ast>(operand: BoundExpr<'ast>, conversion: Conversion, target: Ty, span: Span) -> BoundExpr<'ast> {
    BoundExpr::typed(
        BoundKind::Conversion {
            operand: Box::new(operand),
            conversion,
            explicit: true,
        },
        target,
        span,
    )
}

/// Bind `operand is T`.
#[instrument(level = "trace", skip_all)]
pub fn bind_is<'ast>(
    binder: &Binder<'_>,
    test: &'ast TypeTestExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let (target, type_errors) = bind_type_reporting(binder, &test.ty, diagnostics);
    let operand = bind_value(binder, &test.operand, ValueKind::ReadableValue, diagnostics);
    let operand = natural_type(binder, operand, diagnostics);
    BoundExpr::typed(
        BoundKind::IsType {
            operand: Box::new(operand),
            target,
        },
        Ty::BOOL,
        test.span,
    )
    .with_errors_if(type_errors)
}

/// Bind `operand as T`.
#[instrument(level = "trace", skip_all)]
pub fn bind_as<'ast>(
    binder: &Binder<'_>,
    test: &'ast TypeTestExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = test.span;
    let (target, type_errors) = bind_type_reporting(binder, &test.ty, diagnostics);
    let operand = bind_value(binder, &test.operand, ValueKind::ReadableValue, diagnostics);
    let operand = natural_type(binder, operand, diagnostics);

    let mut has_errors = type_errors || target.contains_error();
    let conversion = if has_errors || operand.has_error_type() {
        Conversion::none()
    } else if !binder.symbols().is_reference_type(&target) && !matches!(target, Ty::TypeParam(_)) {
        debug!(%target, "as requires a reference type");
        diagnostics.add(BindError::AsRequiresReferenceType {
            ty: target.to_string(),
            span,
        });
        has_errors = true;
        Conversion::none()
    } else {
        let conversion = classify_expression(binder, &operand, &target);
        if !conversion.is_allowed(true) && !operand.has_errors {
            diagnostics.add(BindError::NoExplicitConversion {
                from: operand.display_type(),
                to: target.to_string(),
                span,
            });
            has_errors = true;
        }
        conversion
    };

    BoundExpr::typed(
        BoundKind::AsType {
            operand: Box::new(operand),
            conversion,
        },
        target,
        span,
    )
    .with_errors_if(has_errors)
}
