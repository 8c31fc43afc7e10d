//! Conversions of bound expressions.
//!
//! Type-to-type classification lives in [`crate::conversion`]. This module
//! adds what only the binder knows: untyped forms (lambdas, method groups,
//! `default`, target-typed conditionals and switches, tuple literals,
//! `stackalloc`) convert by shape, and constants may convert where their
//! type does not.
//!
//! ## Algorithm
//!
//! 1. Classify the conversion of the expression to the target
//! 2. If it is not allowed, report it (unless the operand is already
//!    erroneous) and keep an erroneous conversion node
//! 3. Otherwise materialize it: bind the lambda against the delegate, push
//!    the conversion into conditional branches and tuple elements, or wrap
//!    the operand in a conversion node

use osprey_core::{BindError, DiagnosticBag, MethodSymbol, RefKind, Ty};
use tracing::trace;

use super::lambda;
use super::recovery::{natural_type, resolve_to_value};
use crate::binder::Binder;
use crate::bound::{BoundArm, BoundExpr, BoundKind};
use crate::conversion::{COST_TARGET_TYPED, Conversion, ConversionKind};
use crate::overload::{ArgumentConverter, ArgumentInfo, CandidateSignature};

// ============================================================================
// Classification
// ============================================================================

/// Classify the conversion of `expr` to `target`.
pub(crate) fn classify_expression(binder: &Binder<'_>, expr: &BoundExpr<'_>, target: &Ty) -> Conversion {
    let symbols = binder.symbols();
    if expr.ty.is_none() && target.contains_error() {
        return Conversion::implicit(ConversionKind::ErrorType, COST_TARGET_TYPED);
    }

    match &expr.kind {
        BoundKind::UnboundLambda(lambda) => lambda::classify_lambda(binder, lambda, target),
        BoundKind::MethodGroup { .. } => match method_group_conversion(binder, expr, target) {
            Some(method) => Conversion::implicit(ConversionKind::MethodGroup(method), COST_TARGET_TYPED),
            None => Conversion::none(),
        },
        BoundKind::DefaultLiteral => Conversion::implicit(ConversionKind::DefaultLiteral, COST_TARGET_TYPED),
        BoundKind::UnconvertedConditional {
            when_true,
            when_false,
            ..
        } => all_convert(binder, [when_true.as_ref(), when_false.as_ref()], target),
        BoundKind::UnconvertedSwitch { arms, .. } => {
            all_convert(binder, arms.iter().map(|arm| &arm.value), target)
        }
        BoundKind::TupleLiteral { elements, .. } if expr.ty.is_none() => {
            match target.as_tuple() {
                Some(tuple) if tuple.elements.len() == elements.len() => {
                    let mut cost: u32 = 0;
                    for (element, element_ty) in elements.iter().zip(&tuple.elements) {
                        let conversion = classify_expression(binder, element, element_ty);
                        if !conversion.is_implicit_conversion() {
                            return Conversion::none();
                        }
                        cost = cost.saturating_add(conversion.cost);
                    }
                    Conversion::implicit(ConversionKind::ImplicitTuple, cost)
                }
                _ => Conversion::none(),
            }
        }
        BoundKind::UnconvertedStackAlloc { element, .. } => match target.pointee() {
            Some(pointee) if pointee == element => {
                Conversion::implicit(ConversionKind::StackAllocToPointer, COST_TARGET_TYPED)
            }
            _ => Conversion::none(),
        },
        BoundKind::TypeOrValue { value, .. } => classify_expression(binder, value, target),
        _ => {
            let Some(from) = &expr.ty else {
                return Conversion::none();
            };
            match expr.constant_value() {
                Some(value) => binder
                    .conversions()
                    .classify_constant(symbols, value, from, target),
                None => binder.conversions().classify(symbols, from, target),
            }
        }
    }
}

/// Implicit when every branch converts implicitly; the cost is their sum.
fn all_convert<'a, 'ast: 'a>(
    binder: &Binder<'_>,
    branches: impl IntoIterator<Item = &'a BoundExpr<'ast>>,
    target: &Ty,
) -> Conversion {
    let mut cost: u32 = 0;
    for branch in branches {
        let conversion = classify_expression(binder, branch, target);
        if !conversion.is_implicit_conversion() {
            return Conversion::none();
        }
        cost = cost.saturating_add(conversion.cost);
    }
    Conversion::implicit(ConversionKind::ConditionalExpression, cost)
}

/// The method a method group binds to when converted to `delegate`.
///
/// The delegate's `Invoke` parameters act as arguments for overload
/// resolution; the winner's return type must convert by identity or
/// reference to `Invoke`'s.
pub(crate) fn method_group_conversion(
    binder: &Binder<'_>,
    group: &BoundExpr<'_>,
    delegate: &Ty,
) -> Option<MethodSymbol> {
    let BoundKind::MethodGroup {
        receiver,
        methods,
        type_args,
        extension,
        ..
    } = &group.kind
    else {
        return None;
    };
    let symbols = binder.symbols();
    let invoke = symbols.delegate_invoke(delegate)?;
    let methods = super::invocation::with_explicit_type_args(binder, methods, type_args);

    let mut args: Vec<ArgumentInfo> = Vec::new();
    let mut types: Vec<Ty> = Vec::new();
    if *extension && let Some(receiver) = receiver {
        let ty = receiver.ty_or_error();
        args.push(ArgumentInfo::positional(ty.clone()));
        types.push(ty);
    }
    for param in invoke.params.iter() {
        args.push(ArgumentInfo {
            ty: Some(param.ty.clone()),
            name: None,
            ref_kind: param.ref_kind,
        });
        types.push(param.ty.clone());
    }

    let candidates: Vec<CandidateSignature> = methods.iter().map(CandidateSignature::from_method).collect();
    let converter = TypeConverter { binder, types };
    let resolution = binder.overloads().resolve(&candidates, &args, &converter);
    let best = resolution.best_result()?;
    if best.is_expanded {
        return None;
    }
    let mut method = methods[best.candidate].clone();
    if !best.type_args.is_empty() {
        let subst = symbols.substitution_for(&method.container);
        method = method.construct(best.type_args.clone(), &subst);
    }

    let returns_match = if invoke.return_type.is_void() {
        method.return_type.is_void()
    } else {
        let conversion = binder
            .conversions()
            .classify(symbols, &method.return_type, &invoke.return_type);
        matches!(
            conversion.kind,
            ConversionKind::Identity | ConversionKind::ImplicitReference | ConversionKind::ErrorType
        )
    };
    trace!(method = method.name(), %delegate, returns_match, "method group conversion");
    returns_match.then_some(method)
}

// ============================================================================
// Conversion
// ============================================================================

pub(crate) fn convert_implicit<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    target: &Ty,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    convert(binder, expr, target, false, diagnostics)
}

pub(crate) fn convert_explicit<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    target: &Ty,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    convert(binder, expr, target, true, diagnostics)
}

/// Convert `expr` to `target`, reporting when no (implicit, unless
/// `explicit`) conversion exists.
pub(crate) fn convert<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    target: &Ty,
    explicit: bool,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let expr = resolve_to_value(expr, diagnostics);
    let span = expr.span;
    let conversion = classify_expression(binder, &expr, target);

    if !conversion.is_allowed(explicit) {
        if !expr.has_errors && !target.contains_error() {
            let from = expr.display_type();
            let to = target.to_string();
            diagnostics.add(if explicit {
                BindError::NoExplicitConversion { from, to, span }
            } else {
                BindError::NoImplicitConversion { from, to, span }
            });
        }
        let operand = natural_type(binder, expr, &mut DiagnosticBag::discarding());
        return BoundExpr::typed(
            BoundKind::Conversion {
                operand: Box::new(operand),
                conversion,
                explicit,
            },
            target.clone(),
            span,
        )
        .with_errors();
    }

    if conversion.is_identity() && expr.ty.is_some() {
        return expr;
    }

    let had_errors = expr.has_errors;
    let converted = match expr.kind {
        BoundKind::UnboundLambda(syntax) => lambda::bind_lambda(binder, syntax, target, span, diagnostics),
        BoundKind::DefaultLiteral => BoundExpr::typed(BoundKind::DefaultValue, target.clone(), span),
        BoundKind::UnconvertedConditional {
            condition,
            when_true,
            when_false,
            ..
        } => {
            let when_true = convert(binder, *when_true, target, explicit, diagnostics);
            let when_false = convert(binder, *when_false, target, explicit, diagnostics);
            BoundExpr::typed(
                BoundKind::Conditional {
                    condition,
                    when_true: Box::new(when_true),
                    when_false: Box::new(when_false),
                },
                target.clone(),
                span,
            )
        }
        BoundKind::UnconvertedSwitch { governing, arms, .. } => {
            let arms = arms
                .into_iter()
                .map(|arm| BoundArm {
                    pattern: arm.pattern,
                    value: convert(binder, arm.value, target, explicit, diagnostics),
                })
                .collect();
            BoundExpr::typed(BoundKind::Switch { governing, arms }, target.clone(), span)
        }
        BoundKind::TupleLiteral { elements, names } if target.as_tuple().is_some_and(|t| t.elements.len() == elements.len()) => {
            let element_types = target.as_tuple().map(|t| t.elements.clone()).unwrap_or_default();
            let elements = elements
                .into_iter()
                .zip(&element_types)
                .map(|(element, element_ty)| convert(binder, element, element_ty, explicit, diagnostics))
                .collect();
            BoundExpr::typed(BoundKind::TupleLiteral { elements, names }, target.clone(), span)
        }
        BoundKind::UnconvertedStackAlloc {
            element,
            count,
            initializer,
        } => BoundExpr::typed(
            BoundKind::StackAllocArrayCreation {
                element,
                count,
                initializer,
            },
            target.clone(),
            span,
        ),
        BoundKind::MethodGroup {
            receiver,
            name,
            methods,
            type_args,
            result_kind,
            extension,
        } => {
            let method = match &conversion.kind {
                ConversionKind::MethodGroup(method) => Some(method.clone()),
                _ => None,
            };
            let group = BoundExpr::new(
                BoundKind::MethodGroup {
                    receiver,
                    name,
                    methods,
                    type_args,
                    result_kind,
                    extension,
                },
                None,
                span,
            );
            BoundExpr::typed(
                BoundKind::DelegateCreation {
                    argument: Box::new(group),
                    method,
                    is_extension: extension,
                },
                target.clone(),
                span,
            )
        }
        kind => {
            let operand = BoundExpr { kind, ..expr };
            BoundExpr::typed(
                BoundKind::Conversion {
                    operand: Box::new(operand),
                    conversion,
                    explicit,
                },
                target.clone(),
                span,
            )
        }
    };
    converted.with_errors_if(had_errors)
}

// ============================================================================
// Argument converters
// ============================================================================

/// Classifies bound arguments for overload resolution.
pub(crate) struct ExpressionConverter<'b, 'a, 'ast> {
    pub binder: &'b Binder<'a>,
    pub args: Vec<&'b BoundExpr<'ast>>,
}

impl ArgumentConverter for ExpressionConverter<'_, '_, '_> {
    fn classify(&self, arg: usize, target: &Ty) -> Conversion {
        match self.args.get(arg) {
            Some(expr) => classify_expression(self.binder, expr, target),
            None => Conversion::none(),
        }
    }
}

/// Classifies plain argument types, for delegate signatures.
pub(crate) struct TypeConverter<'b, 'a> {
    pub binder: &'b Binder<'a>,
    pub types: Vec<Ty>,
}

impl ArgumentConverter for TypeConverter<'_, '_> {
    fn classify(&self, arg: usize, target: &Ty) -> Conversion {
        match self.types.get(arg) {
            Some(ty) => self.binder.conversions().classify(self.binder.symbols(), ty, target),
            None => Conversion::none(),
        }
    }
}

/// Whether a delegate's `Invoke` has the same parameter list as `other`'s.
pub(crate) fn same_invoke_signature(a: &MethodSymbol, b: &MethodSymbol) -> bool {
    a.params.len() == b.params.len()
        && a.params
            .iter()
            .zip(b.params.iter())
            .all(|(x, y)| x.ty == y.ty && x.ref_kind == y.ref_kind)
        && a.return_type == b.return_type
}

/// The best common type of `exprs`: the one type among theirs to which
/// every expression converts implicitly. Untyped expressions contribute no
/// candidate but must still convert.
pub(crate) fn best_common_type(binder: &Binder<'_>, exprs: &[&BoundExpr<'_>]) -> Option<Ty> {
    let mut candidates: Vec<&Ty> = Vec::new();
    for ty in exprs.iter().filter_map(|expr| expr.ty.as_ref()) {
        if *ty != Ty::Null && !candidates.contains(&ty) {
            candidates.push(ty);
        }
    }
    let mut viable = candidates.into_iter().filter(|candidate| {
        exprs
            .iter()
            .all(|expr| classify_expression(binder, expr, candidate).is_implicit_conversion())
    });
    let best = viable.next()?;
    if viable.next().is_some() {
        return None;
    }
    Some(best.clone())
}

/// The ref kind a parameter expects from an argument.
pub(crate) fn expected_ref_kind(kind: RefKind) -> &'static str {
    match kind {
        RefKind::None => "value",
        RefKind::Ref => "ref",
        RefKind::Out => "out",
        RefKind::In => "in",
    }
}
