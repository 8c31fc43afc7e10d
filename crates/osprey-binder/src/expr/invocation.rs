//! Invocation: `callee(args)`.
//!
//! This module handles:
//! - Method groups, resolved over the group's methods and then over
//!   extension methods for the receiver
//! - The receiver of the chosen method: a deferred `Color Color` receiver
//!   settles here, and static/instance mismatches are reported
//! - Delegate-typed values, invoked through their `Invoke` method
//! - `dynamic` callees and argument lists, bound at runtime
//! - Argument coercion once a member is chosen: per-argument conversions,
//!   `params` packing and default values for omitted optional parameters
//!
//! The overload failure reporting here is shared with indexers and
//! constructors.

use std::rc::Rc;

use osprey_core::{
    BindError, ConstantValue, DiagnosticBag, MethodSymbol, ParamInfo, RefKind, Span, Symbol, Ty,
};
use osprey_symbols::{LookupOptions, LookupResultKind};
use osprey_syntax::{CallExpr, Expr};
use tracing::{debug, instrument, trace};

use super::arguments::{AnalyzedArguments, bind_arguments};
use super::convert::{ExpressionConverter, convert_implicit, expected_ref_kind};
use super::dispatch::bind_expression;
use super::member::{self, ExtensionLookup, lookup_extension_methods};
use super::names;
use super::recovery::{make_bad, natural_type, resolve_to_type, resolve_to_value};
use super::value::{ValueKind, check_value};
use crate::binder::{Binder, BinderFlags};
use crate::bound::{BoundExpr, BoundKind};
use crate::overload::{
    CandidateSignature, MemberResolutionKind, MemberResolutionResult, OverloadResolutionResult,
};

/// Bind `callee(args)`.
#[instrument(level = "trace", skip_all, fields(args = call.args.len()))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_invocation<'ast>(
    binder: &Binder<'_>,
    call: &'ast CallExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let callee = match call.callee {
        Expr::Ident(ident) => names::bind_identifier(binder, &ident, true, diagnostics),
        Expr::Member(access) => member::bind_member_access(binder, access, true, diagnostics),
        _ => bind_expression(binder, &call.callee, diagnostics),
    };
    let args = bind_arguments(binder, call.args, false, diagnostics);
    let span = call.span;

    let callee = match callee.kind {
        BoundKind::MethodGroup {
            receiver,
            name,
            methods,
            type_args,
            extension,
            ..
        } => {
            let group = Group {
                receiver: receiver.map(|r| *r),
                name,
                methods,
                type_args,
                extension,
                span: callee.span,
            };
            return bind_method_group_call(binder, group, args, span, diagnostics);
        }
        kind => BoundExpr { kind, ..callee },
    };

    if matches!(callee.kind, BoundKind::BadExpression { .. }) {
        return bad_call(binder, span, LookupResultKind::NotInvocable, Vec::new(), Some(callee), args);
    }
    let callee = check_value(binder, callee, ValueKind::ReadableValue, diagnostics);
    let ty = callee.ty_or_error();
    if ty.is_dynamic() {
        return dynamic_invocation(binder, callee, args, Vec::new(), span, diagnostics);
    }
    if callee.has_errors || ty.contains_error() {
        return bad_call(binder, span, LookupResultKind::NotInvocable, Vec::new(), Some(callee), args);
    }

    match binder.symbols().delegate_invoke(&ty) {
        Some(invoke) => bind_delegate_invocation(binder, callee, invoke, args, span, diagnostics),
        None => {
            let name = callee.symbol().map_or_else(|| callee.display_type(), |symbol| symbol.name());
            debug!(name, "callee is not invocable");
            diagnostics.add(BindError::NotInvocable { name, span });
            bad_call(binder, span, LookupResultKind::NotInvocable, Vec::new(), Some(callee), args)
        }
    }
}

// ============================================================================
// Method groups
// ============================================================================

/// A method group taken apart for invocation.
struct Group<'ast> {
    receiver: Option<BoundExpr<'ast>>,
    name: Rc<str>,
    methods: Vec<MethodSymbol>,
    type_args: Vec<Ty>,
    extension: bool,
    span: Span,
}

impl<'ast> Group<'ast> {
    /// Rebuild the group node, for dynamic invocations and bad calls.
    fn into_node(self) -> BoundExpr<'ast> {
        BoundExpr::new(
            BoundKind::MethodGroup {
                receiver: self.receiver.map(Box::new),
                name: self.name,
                methods: self.methods,
                type_args: self.type_args,
                result_kind: LookupResultKind::Viable,
                extension: self.extension,
            },
            None,
            self.span,
        )
    }
}

/// Invoke the method `name` on `receiver` without a call syntax, falling
/// back to extension methods when the receiver's type declares none.
pub(crate) fn bind_method_call_on<'ast>(
    binder: &Binder<'_>,
    receiver: BoundExpr<'ast>,
    name: &str,
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let ty = receiver.ty_or_error();
    let found = binder
        .lookup()
        .lookup_members(&ty, name, 0, LookupOptions::MUST_BE_INVOCABLE, binder.within());
    let methods: Vec<MethodSymbol> = if found.is_viable() {
        found
            .symbols
            .iter()
            .filter_map(|symbol| match symbol {
                Symbol::Method(method) => Some(method.clone()),
                _ => None,
            })
            .collect()
    } else {
        Vec::new()
    };

    let (methods, extension) = if !methods.is_empty() {
        (methods, false)
    } else if let ExtensionLookup::Found(extensions) = lookup_extension_methods(binder, &ty, name, 0) {
        (extensions, true)
    } else {
        if !receiver.has_errors && !ty.contains_error() {
            diagnostics.add(BindError::NoSuchMember {
                type_name: ty.to_string(),
                member: name.to_string(),
                span,
            });
        }
        return bad_call(binder, span, LookupResultKind::Empty, Vec::new(), Some(receiver), args);
    };

    let group = Group {
        receiver: Some(receiver),
        name: name.into(),
        methods,
        type_args: Vec::new(),
        extension,
        span,
    };
    bind_method_group_call(binder, group, args, span, diagnostics)
}

fn bind_method_group_call<'ast>(
    binder: &Binder<'_>,
    group: Group<'ast>,
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let candidates = with_explicit_type_args(binder, &group.methods, &group.type_args);

    if group.extension {
        let Some(receiver) = group.receiver.clone() else {
            return bad_call(binder, span, LookupResultKind::Empty, Vec::new(), Some(group.into_node()), args);
        };
        return bind_extension_call(binder, group, receiver, &candidates, args, span, diagnostics);
    }

    if args.has_dynamic() {
        return bind_dynamic_method_call(binder, group, &candidates, args, span, diagnostics);
    }

    let (signatures, resolution) = resolve_methods(binder, &candidates, &args);
    if let Some(best) = resolution.best_result() {
        let method = chosen_method(binder, &candidates, best);
        trace!(method = method.name(), expanded = best.is_expanded, "method resolved");
        return finish_method_call(binder, group.receiver, method, best, args, span, diagnostics);
    }

    // An instance group with no applicable method still allows an applicable
    // extension method.
    if let Some(receiver) = group.receiver.as_ref().filter(|r| takes_extensions(r))
        && let ExtensionLookup::Found(extensions) =
            lookup_extension_methods(binder, &receiver.ty_or_error(), &group.name, group.type_args.len())
    {
        let extensions = with_explicit_type_args(binder, &extensions, &group.type_args);
        let full = prepend_receiver(receiver.clone(), &args);
        let (_, extension_resolution) = resolve_methods(binder, &extensions, &full);
        if let Some(best) = extension_resolution.best_result() {
            let method = chosen_method(binder, &extensions, best);
            trace!(method = method.name(), "extension method resolved after instance failure");
            return finish_extension_call(binder, method, best, full, span, diagnostics);
        }
    }

    report_overload_failure(&group.name, &signatures, &resolution, &args, 0, span, diagnostics);
    let symbols = candidates.into_iter().map(Symbol::Method).collect();
    let receiver = group.receiver.map(|r| resolve_to_value(r, diagnostics));
    bad_call(
        binder,
        span,
        LookupResultKind::OverloadResolutionFailure,
        symbols,
        receiver,
        args,
    )
}

/// A group found as extension methods: the receiver is the first argument.
fn bind_extension_call<'ast>(
    binder: &Binder<'_>,
    group: Group<'ast>,
    receiver: BoundExpr<'ast>,
    candidates: &[MethodSymbol],
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let receiver = resolve_to_value(receiver, diagnostics);
    let full = prepend_receiver(receiver, &args);
    let (signatures, resolution) = resolve_methods(binder, candidates, &full);
    match resolution.best_result() {
        Some(best) => {
            let method = chosen_method(binder, candidates, best);
            trace!(method = method.name(), "extension method resolved");
            finish_extension_call(binder, method, best, full, span, diagnostics)
        }
        None => {
            report_overload_failure(&group.name, &signatures, &resolution, &full, 1, span, diagnostics);
            let symbols = candidates.iter().cloned().map(Symbol::Method).collect();
            bad_call(
                binder,
                span,
                LookupResultKind::OverloadResolutionFailure,
                symbols,
                None,
                full,
            )
        }
    }
}

/// A method group invoked with a `dynamic` argument.
///
/// Resolution only checks that some candidate could apply; the call itself
/// is bound at runtime.
fn bind_dynamic_method_call<'ast>(
    binder: &Binder<'_>,
    mut group: Group<'ast>,
    candidates: &[MethodSymbol],
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let (signatures, resolution) = resolve_methods(binder, candidates, &args);
    let applicable: Vec<MethodSymbol> = resolution
        .applicable()
        .map(|result| candidates[result.candidate].clone())
        .collect();
    if applicable.is_empty() {
        report_overload_failure(&group.name, &signatures, &resolution, &args, 0, span, diagnostics);
        let symbols = candidates.iter().cloned().map(Symbol::Method).collect();
        return bad_call(
            binder,
            span,
            LookupResultKind::OverloadResolutionFailure,
            symbols,
            Some(group.into_node()),
            args,
        );
    }

    let all_static = applicable.iter().all(MethodSymbol::is_static);
    group.receiver = group.receiver.map(|receiver| {
        if all_static {
            resolve_to_type(receiver, diagnostics)
        } else {
            resolve_to_value(receiver, diagnostics)
        }
    });
    dynamic_invocation(binder, group.into_node(), args, applicable, span, diagnostics)
}

/// Whether extension methods may be looked up for a receiver: values only,
/// and not the implicit `this` of a simple name.
fn takes_extensions(receiver: &BoundExpr<'_>) -> bool {
    !matches!(
        receiver.kind,
        BoundKind::TypeExpr | BoundKind::This { implicit: true } | BoundKind::BaseReference
    ) && !receiver.has_errors
}

fn prepend_receiver<'ast>(receiver: BoundExpr<'ast>, args: &AnalyzedArguments<'ast>) -> AnalyzedArguments<'ast> {
    let mut full = AnalyzedArguments::new();
    full.push(receiver, None, RefKind::None);
    for (i, arg) in args.args.iter().enumerate() {
        full.push(arg.clone(), args.name(i).cloned(), args.ref_kind(i));
    }
    full
}

/// Apply explicit type arguments to a group: generic methods of matching
/// arity are constructed, everything else drops out.
pub(crate) fn with_explicit_type_args(
    binder: &Binder<'_>,
    methods: &[MethodSymbol],
    type_args: &[Ty],
) -> Vec<MethodSymbol> {
    if type_args.is_empty() {
        return methods.to_vec();
    }
    methods
        .iter()
        .filter(|method| method.def.type_params.len() == type_args.len())
        .map(|method| {
            let subst = binder.symbols().substitution_for(&method.container);
            method.construct(type_args.to_vec(), &subst)
        })
        .collect()
}

pub(crate) fn resolve_methods(
    binder: &Binder<'_>,
    candidates: &[MethodSymbol],
    args: &AnalyzedArguments<'_>,
) -> (Vec<CandidateSignature>, OverloadResolutionResult) {
    let signatures: Vec<CandidateSignature> = candidates.iter().map(CandidateSignature::from_method).collect();
    let converter = ExpressionConverter {
        binder,
        args: args.args.iter().collect(),
    };
    let resolution = binder.overloads().resolve(&signatures, &args.infos(), &converter);
    (signatures, resolution)
}

/// The winning candidate, constructed with any inferred type arguments.
fn chosen_method(binder: &Binder<'_>, candidates: &[MethodSymbol], best: &MemberResolutionResult) -> MethodSymbol {
    let method = candidates[best.candidate].clone();
    if best.type_args.is_empty() {
        return method;
    }
    let subst = binder.symbols().substitution_for(&method.container);
    method.construct(best.type_args.clone(), &subst)
}

// ============================================================================
// Calls
// ============================================================================

fn finish_method_call<'ast>(
    binder: &Binder<'_>,
    receiver: Option<BoundExpr<'ast>>,
    method: MethodSymbol,
    best: &MemberResolutionResult,
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let (receiver, receiver_error) = settle_receiver(binder, receiver, &method, span, diagnostics);
    let (args, arg_to_param) = coerce_arguments(binder, &method.params, best, args, span, diagnostics);
    let ty = method.return_type.clone();
    BoundExpr::typed(
        BoundKind::Call {
            receiver: receiver.map(Box::new),
            method,
            args,
            arg_to_param,
            expanded: best.is_expanded,
            invoked_as_extension: false,
        },
        ty,
        span,
    )
    .with_errors_if(receiver_error)
}

fn finish_extension_call<'ast>(
    binder: &Binder<'_>,
    method: MethodSymbol,
    best: &MemberResolutionResult,
    full: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let (args, arg_to_param) = coerce_arguments(binder, &method.params, best, full, span, diagnostics);
    let ty = method.return_type.clone();
    BoundExpr::typed(
        BoundKind::Call {
            receiver: None,
            method,
            args,
            arg_to_param,
            expanded: best.is_expanded,
            invoked_as_extension: true,
        },
        ty,
        span,
    )
}

/// Decide the receiver of a resolved method.
///
/// Returns the receiver to keep and whether a static/instance mismatch was
/// reported.
fn settle_receiver<'ast>(
    binder: &Binder<'_>,
    receiver: Option<BoundExpr<'ast>>,
    method: &MethodSymbol,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> (Option<BoundExpr<'ast>>, bool) {
    let is_static = method.is_static();
    let object_required = |diagnostics: &mut DiagnosticBag| {
        if binder.flags().contains(BinderFlags::NAMEOF_ARGUMENT) {
            return false;
        }
        diagnostics.add(BindError::ObjectRequired {
            member: method.name().to_string(),
            span,
        });
        true
    };

    let Some(receiver) = receiver else {
        if is_static {
            return (None, false);
        }
        return (None, object_required(diagnostics));
    };

    match &receiver.kind {
        BoundKind::TypeOrValue { .. } if is_static => {
            resolve_to_type(receiver, diagnostics);
            (None, false)
        }
        BoundKind::TypeOrValue { .. } => (Some(resolve_to_value(receiver, diagnostics)), false),
        BoundKind::TypeExpr if is_static => (None, false),
        BoundKind::TypeExpr => (None, object_required(diagnostics)),
        BoundKind::This { implicit: true } if is_static => (None, false),
        _ if is_static => {
            diagnostics.add(BindError::InstanceAccessToStatic {
                member: method.name().to_string(),
                type_name: method.container.to_string(),
                span,
            });
            (Some(receiver), true)
        }
        _ => (Some(receiver), false),
    }
}

/// Delegate invocation: `d(args)` calls `d.Invoke(args)`.
fn bind_delegate_invocation<'ast>(
    binder: &Binder<'_>,
    callee: BoundExpr<'ast>,
    invoke: MethodSymbol,
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let candidates = [invoke];
    let (signatures, resolution) = resolve_methods(binder, &candidates, &args);
    let [invoke] = candidates;
    match resolution.best_result() {
        Some(best) => {
            trace!(delegate = %invoke.container, "delegate invocation");
            let (args, arg_to_param) = coerce_arguments(binder, &invoke.params, best, args, span, diagnostics);
            let ty = invoke.return_type.clone();
            BoundExpr::typed(
                BoundKind::Call {
                    receiver: Some(Box::new(callee)),
                    method: invoke,
                    args,
                    arg_to_param,
                    expanded: best.is_expanded,
                    invoked_as_extension: false,
                },
                ty,
                span,
            )
        }
        None => {
            let name = invoke.container.to_string();
            report_overload_failure(&name, &signatures, &resolution, &args, 0, span, diagnostics);
            let symbols = vec![Symbol::Method(invoke)];
            bad_call(
                binder,
                span,
                LookupResultKind::OverloadResolutionFailure,
                symbols,
                Some(callee),
                args,
            )
        }
    }
}

fn dynamic_invocation<'ast>(
    binder: &Binder<'_>,
    callee: BoundExpr<'ast>,
    args: AnalyzedArguments<'ast>,
    applicable: Vec<MethodSymbol>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let names = args.names();
    let ref_kinds = args.ref_kinds();
    let args = args
        .args
        .into_iter()
        .map(|arg| natural_type(binder, arg, diagnostics))
        .collect();
    trace!(applicable = applicable.len(), "dynamic invocation");
    BoundExpr::typed(
        BoundKind::DynamicInvocation {
            callee: Box::new(callee),
            args,
            names,
            ref_kinds,
            applicable,
        },
        Ty::Dynamic,
        span,
    )
}

fn bad_call<'ast>(
    binder: &Binder<'_>,
    span: Span,
    result_kind: LookupResultKind,
    symbols: Vec<Symbol>,
    callee: Option<BoundExpr<'ast>>,
    args: AnalyzedArguments<'ast>,
) -> BoundExpr<'ast> {
    let children = callee.into_iter().chain(args.args).collect();
    make_bad(binder, span, result_kind, symbols, children)
}

// ============================================================================
// Argument coercion
// ============================================================================

/// Convert arguments to the chosen member's parameters.
///
/// Arguments keep source order. For the expanded form the arguments packed
/// into the `params` tail become one array creation, and every omitted
/// optional parameter gets its default value appended. Returns the final
/// argument list with the parameter each argument binds to.
pub(crate) fn coerce_arguments<'ast>(
    binder: &Binder<'_>,
    params: &[ParamInfo],
    best: &MemberResolutionResult,
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> (Vec<BoundExpr<'ast>>, Vec<usize>) {
    let tail = params.len().saturating_sub(1);
    let ref_kinds = args.ref_kinds();
    let mut coerced = Vec::with_capacity(params.len());
    let mut arg_to_param = Vec::with_capacity(params.len());
    let mut packed = Vec::new();

    for (i, arg) in args.args.into_iter().enumerate() {
        let param = best.arg_to_param[i];
        let arg = match ref_kinds[i] {
            RefKind::None => convert_implicit(binder, arg, &best.parameter_types[i], diagnostics),
            _ => arg,
        };
        if best.is_expanded && param == tail {
            packed.push(arg);
        } else {
            coerced.push(arg);
            arg_to_param.push(param);
        }
    }

    if best.is_expanded
        && let Some(params_array) = params.get(tail)
    {
        coerced.push(params_array_creation(packed, params_array.ty.clone(), span));
        arg_to_param.push(tail);
    }

    for (index, param) in params.iter().enumerate() {
        if arg_to_param.contains(&index) {
            continue;
        }
        if let Some(value) = &param.default {
            coerced.push(default_argument(value, &param.ty, span));
            arg_to_param.push(index);
        }
    }
    (coerced, arg_to_param)
}

fn params_array_creation<'ast>(elements: Vec<BoundExpr<'ast>>, array_ty: Ty, span: Span) -> BoundExpr<'ast> {
    let count = i32::try_from(elements.len()).unwrap_or(i32::MAX);
    BoundExpr::typed(
        BoundKind::ArrayCreation {
            sizes: vec![BoundExpr::literal(ConstantValue::Int(count), Ty::INT, span)],
            initializer: Some(elements),
        },
        array_ty,
        span,
    )
}

fn default_argument<'ast>(value: &ConstantValue, ty: &Ty, span: Span) -> BoundExpr<'ast> {
    match value {
        ConstantValue::Null => BoundExpr::typed(BoundKind::DefaultValue, ty.clone(), span),
        value => BoundExpr::literal(value.clone(), ty.clone(), span),
    }
}

// ============================================================================
// Failure reporting
// ============================================================================

/// Report why no candidate was chosen.
///
/// `offset` is the number of implicit leading arguments (the receiver of an
/// extension call), excluded from argument numbers in messages. A failure
/// blamed on an argument that already has errors is not reported again.
pub(crate) fn report_overload_failure(
    name: &str,
    signatures: &[CandidateSignature],
    resolution: &OverloadResolutionResult,
    args: &AnalyzedArguments<'_>,
    offset: usize,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) {
    debug!(name, candidates = signatures.len(), "overload resolution failed");
    if resolution.is_ambiguous() {
        let describe = |index: usize| {
            resolution
                .results
                .get(index)
                .and_then(|result| signatures.get(result.candidate))
                .map_or_else(String::new, describe_signature)
        };
        diagnostics.add(BindError::AmbiguousCall {
            first: describe(resolution.ambiguous[0]),
            second: describe(resolution.ambiguous[1]),
            span,
        });
        return;
    }

    let explicit_count = args.len().saturating_sub(offset);
    let bad_count = BindError::BadArgumentCount {
        name: name.to_string(),
        count: explicit_count,
        span,
    };
    if resolution.all_wrong_count() {
        diagnostics.add(bad_count);
        return;
    }
    let Some(closest) = resolution.closest() else {
        diagnostics.add(BindError::NoApplicableOverload {
            name: name.to_string(),
            span,
        });
        return;
    };

    let arg_span = |arg: usize| args.args.get(arg).map_or(span, |a| a.span);
    let number = |arg: usize| (arg + 1).saturating_sub(offset);
    let error = match closest.kind {
        MemberResolutionKind::WrongArgumentCount | MemberResolutionKind::RequiredParameterMissing { .. } => {
            bad_count
        }
        MemberResolutionKind::NoCorrespondingParameter { arg } => BindError::BadNamedArgument {
            callee: name.to_string(),
            name: args.name(arg).map_or_else(String::new, |n| n.to_string()),
            span: arg_span(arg),
        },
        MemberResolutionKind::NamedArgumentUsedTwice { arg } => BindError::NamedArgumentUsedTwice {
            name: args.name(arg).map_or_else(String::new, |n| n.to_string()),
            span: arg_span(arg),
        },
        MemberResolutionKind::BadRefKind { arg } => {
            let expected = closest
                .arg_to_param
                .get(arg)
                .and_then(|&param| signatures.get(closest.candidate)?.params.get(param))
                .map_or(RefKind::None, |param| param.ref_kind);
            BindError::BadArgumentRefKind {
                index: number(arg),
                expected: expected_ref_kind(expected).to_string(),
                span: arg_span(arg),
            }
        }
        MemberResolutionKind::BadArgumentConversion { arg } => {
            let Some(argument) = args.args.get(arg) else {
                return;
            };
            if argument.has_errors {
                return;
            }
            BindError::BadArgument {
                index: number(arg),
                from: argument.display_type(),
                to: closest
                    .parameter_types
                    .get(arg)
                    .map_or_else(String::new, ToString::to_string),
                span: argument.span,
            }
        }
        MemberResolutionKind::TypeInferenceFailed | MemberResolutionKind::Applicable => {
            BindError::NoApplicableOverload {
                name: name.to_string(),
                span,
            }
        }
    };
    diagnostics.add(error);
}

pub(crate) fn describe_signature(signature: &CandidateSignature) -> String {
    let params: Vec<String> = signature.params.iter().map(|p| p.ty.to_string()).collect();
    format!("{}({})", signature.name, params.join(", "))
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use osprey_core::{ErrorKind, SpecialType};
    use osprey_syntax::AstBuilder;

    use super::*;
    use crate::expr::test_support::{Context, Fixture};

    fn bind<'ast>(fx: &Fixture, ctx: &Context, expr: &Expr<'ast>) -> (BoundExpr<'ast>, DiagnosticBag) {
        fx.bind(ctx, |binder| {
            let mut diagnostics = DiagnosticBag::new();
            (bind_expression(binder, expr, &mut diagnostics), diagnostics)
        })
    }

    fn call_parts<'a, 'ast>(bound: &'a BoundExpr<'ast>) -> (&'a MethodSymbol, &'a [BoundExpr<'ast>]) {
        match &bound.kind {
            BoundKind::Call { method, args, .. } => (method, args),
            other => panic!("expected a call, got {other:?}"),
        }
    }

    fn item_ctx(fx: &Fixture) -> Context {
        fx.context().with_local("item", fx.ty("Shop.Item"))
    }

    #[test]
    fn simple_name_calls_get_an_implicit_receiver() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.call_with(b.ident("Helper"), &[b.int(3)]));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(bound.ty, Some(Ty::INT));
        let BoundKind::Call { receiver: Some(receiver), .. } = &bound.kind else {
            panic!("expected a call with a receiver, got {:?}", bound.kind);
        };
        assert!(matches!(receiver.kind, BoundKind::This { implicit: true }));
    }

    #[test]
    fn static_calls_drop_the_implicit_receiver() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.call_with(b.ident("Build"), &[]));
        assert!(diagnostics.is_empty());
        assert!(matches!(bound.kind, BoundKind::Call { receiver: None, .. }));
    }

    #[test]
    fn instance_calls_in_static_context_need_an_object() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().static_method();
        let (bound, diagnostics) = bind(&fx, &ctx, &b.call_with(b.ident("Helper"), &[b.int(1)]));
        assert!(bound.has_errors);
        assert_eq!(diagnostics.count_of(ErrorKind::StaticInstanceMismatch), 1);
    }

    #[test]
    fn overloads_pick_the_cheapest_conversion() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = item_ctx(&fx);

        let (bound, _) = bind(&fx, &ctx, &b.call_with(b.member(b.ident("item"), "Scale"), &[b.int(2)]));
        assert_eq!(bound.ty, Some(Ty::INT));

        let (bound, _) = bind(&fx, &ctx, &b.call_with(b.member(b.ident("item"), "Scale"), &[b.double(2.5)]));
        assert_eq!(bound.ty, Some(Ty::DOUBLE));
    }

    #[test]
    fn params_arguments_are_packed() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.call_with(b.member(b.ident("Calc"), "Sum"), &[b.int(1), b.int(2), b.int(3)]);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &expr);
        assert!(diagnostics.is_empty());
        let (_, args) = call_parts(&bound);
        assert_eq!(args.len(), 1);
        let BoundKind::ArrayCreation { initializer: Some(elements), .. } = &args[0].kind else {
            panic!("expected a params array, got {:?}", args[0].kind);
        };
        assert_eq!(elements.len(), 3);
        assert_eq!(args[0].ty, Some(Ty::array(Ty::INT, 1)));
    }

    #[test]
    fn omitted_optional_parameters_get_defaults() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.call_with(b.member(b.ident("item"), "Pick"), &[b.int(1)]);
        let (bound, diagnostics) = bind(&fx, &item_ctx(&fx), &expr);
        assert!(diagnostics.is_empty());
        let (_, args) = call_parts(&bound);
        assert_eq!(args.len(), 2);
        assert_eq!(args[1].constant_value(), Some(&ConstantValue::Int(5)));
    }

    #[test]
    fn arguments_convert_to_parameter_types() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.call_with(b.member(b.ident("item"), "Log"), &[b.string("a"), b.int(1)]);
        let (bound, diagnostics) = bind(&fx, &item_ctx(&fx), &expr);
        assert!(diagnostics.is_empty());
        let (_, args) = call_parts(&bound);
        let BoundKind::ArrayCreation { initializer: Some(elements), .. } = &args[0].kind else {
            panic!("expected a params array");
        };
        assert!(elements.iter().all(|e| e.ty == Some(Ty::OBJECT)));
    }

    #[test]
    fn generic_methods_infer_or_take_type_arguments() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = item_ctx(&fx);

        let inferred = b.call_with(b.member(b.ident("item"), "Echo"), &[b.string("a")]);
        let (bound, diagnostics) = bind(&fx, &ctx, &inferred);
        assert!(diagnostics.is_empty());
        assert_eq!(bound.ty, Some(Ty::STRING));

        let explicit = b.call_with(
            b.generic_member(b.ident("item"), "Echo", &[b.ty(SpecialType::Int64)]),
            &[b.int(1)],
        );
        let (bound, diagnostics) = bind(&fx, &ctx, &explicit);
        assert!(diagnostics.is_empty());
        assert_eq!(bound.ty, Some(Ty::LONG));
    }

    #[test]
    fn extension_calls_pass_the_receiver_first() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("text", Ty::STRING);
        let (bound, diagnostics) = bind(&fx, &ctx, &b.call_with(b.member(b.ident("text"), "Shout"), &[]));
        assert!(diagnostics.is_empty());
        let BoundKind::Call { receiver: None, args, invoked_as_extension: true, .. } = &bound.kind else {
            panic!("expected an extension call, got {:?}", bound.kind);
        };
        assert_eq!(args.len(), 1);
        assert!(matches!(args[0].kind, BoundKind::Local(_)));
    }

    #[test]
    fn color_color_instance_method_uses_the_value() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.call_with(b.member(b.ident("Color"), "Darken"), &[]));
        assert!(diagnostics.is_empty());
        let BoundKind::Call { receiver: Some(receiver), .. } = &bound.kind else {
            panic!("expected a call with a receiver");
        };
        assert!(matches!(receiver.kind, BoundKind::FieldAccess { .. }));
    }

    #[test]
    fn delegate_values_are_invoked() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.call_with(b.ident("Callback"), &[b.int(2)]));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let (method, _) = call_parts(&bound);
        assert_eq!(method.name(), "Invoke");
        assert_eq!(bound.ty, Some(Ty::INT));

        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.call_with(b.ident("Callback"), &[]));
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::BadArgumentCount { count: 0, .. })
        ));
    }

    #[test]
    fn dynamic_arguments_defer_to_runtime() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("d", Ty::Dynamic);

        let (bound, diagnostics) = bind(&fx, &ctx, &b.call_with(b.ident("Helper"), &[b.ident("d")]));
        assert!(diagnostics.is_empty());
        let BoundKind::DynamicInvocation { applicable, .. } = &bound.kind else {
            panic!("expected a dynamic invocation, got {:?}", bound.kind);
        };
        assert_eq!(applicable.len(), 1);
        assert_eq!(bound.ty, Some(Ty::Dynamic));

        let (bound, _) = bind(&fx, &ctx, &b.call_with(b.member(b.ident("d"), "Anything"), &[b.int(1)]));
        assert!(matches!(bound.kind, BoundKind::DynamicInvocation { .. }));
    }

    #[test]
    fn argument_mismatches_are_reported() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = item_ctx(&fx);

        let (bound, diagnostics) = bind(&fx, &ctx, &b.call_with(b.ident("Helper"), &[b.string("x")]));
        assert!(matches!(bound.kind, BoundKind::BadExpression { .. }));
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::BadArgument { index: 1, .. })
        ));

        let swap = b.call_with(b.member(b.ident("item"), "Swap"), &[b.int(1)]);
        let (_, diagnostics) = bind(&fx, &ctx, &swap);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::BadArgumentRefKind { .. })
        ));

        let (_, diagnostics) = bind(&fx, &ctx, &b.call_with(b.ident("Helper"), &[b.int(1), b.int(2)]));
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::BadArgumentCount { count: 2, .. })
        ));
    }

    #[test]
    fn named_arguments_must_name_a_parameter() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let good = b.call(b.ident("Helper"), &[b.named_arg("n", b.int(1))]);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &good);
        assert!(!bound.has_errors);
        assert!(diagnostics.is_empty());

        let bad = b.call(b.ident("Helper"), &[b.named_arg("x", b.int(1))]);
        let (_, diagnostics) = bind(&fx, &fx.context(), &bad);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::BadNamedArgument { .. })
        ));
    }

    #[test]
    fn non_invocable_members_are_rejected() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &item_ctx(&fx), &b.call_with(b.member(b.ident("item"), "Name"), &[]));
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::NotInvocable { .. })
        ));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn failed_arguments_are_not_reported_twice() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (_, diagnostics) = bind(&fx, &fx.context(), &b.call_with(b.ident("Helper"), &[b.ident("nowhere")]));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.count_of(ErrorKind::UnresolvedName), 1);
    }
}
