//! Lambdas.
//!
//! A lambda has no type of its own. It stays an `UnboundLambda` until a
//! conversion to a delegate type supplies its parameter and return types;
//! only then is the body bound, in a child binder that sees the parameters.

use std::rc::Rc;

use osprey_core::{DiagnosticBag, ParameterSymbol, Span, Ty};
use osprey_syntax::LambdaExpr;
use tracing::{debug, trace};

use super::convert::convert_implicit;
use super::dispatch::bind_expression;
use super::recovery::natural_type;
use super::value::{ValueKind, check_value};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind};
use crate::conversion::{COST_TARGET_TYPED, Conversion, ConversionKind};
use crate::type_binding::bind_type;

/// Whether `lambda` converts to `target`: the target must be a delegate with
/// as many parameters, and explicitly typed parameters must match exactly.
pub(crate) fn classify_lambda(binder: &Binder<'_>, lambda: &LambdaExpr<'_>, target: &Ty) -> Conversion {
    let Some(invoke) = binder.symbols().delegate_invoke(target) else {
        return Conversion::none();
    };
    if invoke.params.len() != lambda.params.len() {
        return Conversion::none();
    }
    let mut discard = DiagnosticBag::discarding();
    for (param, expected) in lambda.params.iter().zip(invoke.params.iter()) {
        if param.ref_kind != expected.ref_kind {
            return Conversion::none();
        }
        if let Some(syntax) = &param.ty
            && bind_type(binder, syntax, &mut discard) != expected.ty
        {
            return Conversion::none();
        }
    }
    Conversion::implicit(ConversionKind::AnonymousFunction, COST_TARGET_TYPED)
}

/// Bind the body of `syntax` against the delegate type `target`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn bind_lambda<'ast>(
    binder: &Binder<'_>,
    syntax: &'ast LambdaExpr<'ast>,
    target: &Ty,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let invoke = binder.symbols().delegate_invoke(target);
    let params: Vec<Rc<ParameterSymbol>> = syntax
        .params
        .iter()
        .enumerate()
        .map(|(ordinal, param)| {
            let ty = match (&param.ty, &invoke) {
                (Some(explicit), _) => bind_type(binder, explicit, diagnostics),
                (None, Some(invoke)) => invoke
                    .params
                    .get(ordinal)
                    .map_or_else(Ty::unknown, |p| p.ty.clone()),
                (None, None) => Ty::unknown(),
            };
            Rc::new(ParameterSymbol {
                name: param.name.name.into(),
                ty,
                ref_kind: param.ref_kind,
                ordinal,
            })
        })
        .collect();

    let body_binder = binder.with_lambda(params.clone());
    let body = bind_expression(&body_binder, &syntax.body, diagnostics);
    let body = match &invoke {
        Some(invoke) if !invoke.return_type.is_void() => {
            let body = check_value(&body_binder, body, ValueKind::ReadableValue, diagnostics);
            convert_implicit(&body_binder, body, &invoke.return_type, diagnostics)
        }
        _ => natural_type(&body_binder, body, diagnostics),
    };

    if invoke.is_none() {
        debug!(%target, "lambda bound against a non-delegate target");
    }
    trace!(params = params.len(), errors = body.has_errors, "lambda bound");
    BoundExpr::typed(
        BoundKind::Lambda {
            params,
            body: Box::new(body),
        },
        target.clone(),
        span,
    )
    .with_errors_if(invoke.is_none())
}
