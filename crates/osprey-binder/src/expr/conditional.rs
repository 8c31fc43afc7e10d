//! Conditional and switch expressions.
//!
//! `c ? a : b` has the best common type of its branches when there is one.
//! Without one it stays untyped so that a target type can be pushed into
//! both branches; giving it its natural type then fails. A switch
//! expression is always left untyped, with the best common type of its arm
//! values recorded for natural typing.

use osprey_core::{BindError, ConstantValue, DiagnosticBag, MessageId, Ty};
use osprey_symbols::LookupResultKind;
use osprey_syntax::{ArmPattern, ConditionalExpr, SwitchExpr};
use tracing::{debug, instrument, trace};

use super::convert::{best_common_type, convert_implicit};
use super::recovery::{make_bad, natural_type};
use super::value::{ValueKind, bind_value};
use crate::binder::Binder;
use crate::bound::{BoundArm, BoundExpr, BoundKind};

/// Bind `condition ? when_true : when_false`.
#[instrument(level = "trace", skip_all)]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_conditional<'ast>(
    binder: &Binder<'_>,
    conditional: &'ast ConditionalExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = conditional.span;
    let condition = bind_value(binder, &conditional.condition, ValueKind::ReadableValue, diagnostics);
    let condition = convert_implicit(binder, condition, &Ty::BOOL, diagnostics);
    let when_true = bind_value(binder, &conditional.when_true, ValueKind::ReadableValue, diagnostics);
    let when_false = bind_value(binder, &conditional.when_false, ValueKind::ReadableValue, diagnostics);

    if let Some(ty) = best_common_type(binder, &[&when_true, &when_false]) {
        trace!(%ty, "conditional has a natural type");
        let when_true = convert_implicit(binder, when_true, &ty, diagnostics);
        let when_false = convert_implicit(binder, when_false, &ty, diagnostics);
        if let Some(folded) = fold(&condition, &when_true, &when_false) {
            return BoundExpr::literal(folded, ty, span);
        }
        return BoundExpr::typed(
            BoundKind::Conditional {
                condition: Box::new(condition),
                when_true: Box::new(when_true),
                when_false: Box::new(when_false),
            },
            ty,
            span,
        );
    }

    if MessageId::TargetTypedConditional.is_available_in(binder.language_version()) {
        return BoundExpr::new(
            BoundKind::UnconvertedConditional {
                condition: Box::new(condition),
                when_true: Box::new(when_true),
                when_false: Box::new(when_false),
                common_type: None,
            },
            None,
            span,
        );
    }

    if !when_true.has_errors && !when_false.has_errors {
        debug!("no common type between conditional branches");
        diagnostics.add(BindError::NoCommonType {
            first: when_true.display_type(),
            second: when_false.display_type(),
            span,
        });
    }
    make_bad(binder, span, LookupResultKind::Empty, Vec::new(), vec![condition, when_true, when_false])
}

/// A constant condition selecting a literal branch folds to that literal.
fn fold(condition: &BoundExpr<'_>, when_true: &BoundExpr<'_>, when_false: &BoundExpr<'_>) -> Option<ConstantValue> {
    let ConstantValue::Bool(chosen) = condition.constant_value()? else {
        return None;
    };
    when_false.constant_value()?;
    let branch = if *chosen { when_true } else { when_false };
    match &branch.kind {
        BoundKind::Literal(value) => Some(value.clone()),
        _ => None,
    }
}

/// Bind `governing switch { pattern => value, ... }`.
#[instrument(level = "trace", skip_all, fields(arms = switch.arms.len()))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_switch<'ast>(
    binder: &Binder<'_>,
    switch: &'ast SwitchExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let governing = bind_value(binder, &switch.governing, ValueKind::ReadableValue, diagnostics);
    let governing = natural_type(binder, governing, diagnostics);
    let governing_ty = governing.ty_or_error();

    let arms: Vec<BoundArm<'ast>> = switch
        .arms
        .iter()
        .map(|arm| {
            let pattern = match &arm.pattern {
                ArmPattern::Discard(_) => None,
                ArmPattern::Constant(pattern) => {
                    let bound = bind_value(binder, pattern, ValueKind::ReadableValue, diagnostics);
                    let bound = if governing_ty.contains_error() {
                        natural_type(binder, bound, diagnostics)
                    } else {
                        convert_implicit(binder, bound, &governing_ty, diagnostics)
                    };
                    let constant = bound.constant_value().is_some();
                    if !constant && !bound.has_errors {
                        diagnostics.add(BindError::ConstantExpected { span: bound.span });
                    }
                    Some(bound.with_errors_if(!constant))
                }
            };
            let value = bind_value(binder, &arm.value, ValueKind::ReadableValue, diagnostics);
            BoundArm { pattern, value }
        })
        .collect();

    let values: Vec<&BoundExpr<'ast>> = arms.iter().map(|arm| &arm.value).collect();
    let common_type = best_common_type(binder, &values);
    trace!(common_type = ?common_type, "switch arms bound");
    BoundExpr::new(
        BoundKind::UnconvertedSwitch {
            governing: Box::new(governing),
            arms,
            common_type,
        },
        None,
        switch.span,
    )
}
