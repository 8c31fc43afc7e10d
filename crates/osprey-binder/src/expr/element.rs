//! Element access: `receiver[args]`.
//!
//! | Receiver | Binding |
//! |----------|---------|
//! | array | one integral index per rank; `Index`/`Range` for rank 1 |
//! | pointer | exactly one plain integral index |
//! | `dynamic` | a dynamic indexer access, no checks |
//! | anything else | indexer lookup and overload resolution |
//!
//! When no indexer applies and the single argument is an `Index` or a
//! `Range`, the access falls back to the `Length`/`Count` pattern: an `int`
//! indexer for `Index`, a `Slice(int, int)` method for `Range`, and
//! `Substring` for strings.

use osprey_core::{
    BindError, ConstantValue, DiagnosticBag, MessageId, MethodSymbol, PropertySymbol, RefKind, Span,
    SpecialType, Symbol, Ty,
};
use osprey_symbols::{LookupOptions, LookupResultKind};
use osprey_syntax::{IndexExpr, UnaryOp};
use tracing::{debug, instrument, trace};

use super::arguments::{AnalyzedArguments, bind_arguments};
use super::convert::{ExpressionConverter, classify_expression, convert_implicit};
use super::invocation::{coerce_arguments, report_overload_failure};
use super::recovery::{make_bad, natural_type};
use super::value::{ValueKind, bind_value};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind, PatternSymbol};
use crate::overload::CandidateSignature;

/// Integral index types, in order of preference.
const INDEX_TYPES: [Ty; 4] = [Ty::INT, Ty::UINT, Ty::LONG, Ty::ULONG];

/// Bind `receiver[args]`.
#[instrument(level = "trace", skip_all, fields(args = index.args.len()))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_element_access<'ast>(
    binder: &Binder<'_>,
    index: &'ast IndexExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let receiver = bind_value(binder, &index.receiver, ValueKind::ReadableValue, diagnostics);
    let receiver = natural_type(binder, receiver, diagnostics);
    let args = bind_arguments(binder, index.args, false, diagnostics);
    let span = index.span;

    let ty = receiver.ty_or_error();
    if ty.is_error() {
        return bad_access(binder, span, LookupResultKind::Empty, Vec::new(), receiver, args);
    }
    match &ty {
        Ty::Dynamic => dynamic_indexer(binder, receiver, args, Vec::new(), span, diagnostics),
        Ty::Array(array) => bind_array_access(binder, receiver, array.rank, args, span, diagnostics),
        Ty::Pointer(pointee) => {
            let pointee = pointee.as_ref().clone();
            bind_pointer_access(binder, receiver, pointee, args, span, diagnostics)
        }
        _ => bind_indexer_access(binder, receiver, args, span, diagnostics),
    }
}

// ============================================================================
// Arrays and pointers
// ============================================================================

fn bind_array_access<'ast>(
    binder: &Binder<'_>,
    array: BoundExpr<'ast>,
    rank: u32,
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let mut errors = reject_names_and_refs(&args, "an array access", span, diagnostics);
    let rank = rank as usize;
    if args.len() != rank {
        diagnostics.add(BindError::BadIndexCount {
            expected: rank,
            found: args.len(),
            span,
        });
        return bad_access(binder, span, LookupResultKind::WrongArity, Vec::new(), array, args);
    }

    let array_ty = array.ty_or_error();
    let mut result_ty = array_ty.as_array().map_or_else(Ty::unknown, |a| a.element.clone());
    let mut indices = Vec::with_capacity(rank);
    for arg in args.args {
        let index = convert_index(binder, arg, rank == 1, diagnostics);
        errors |= check_negative(&index, rank == 1, diagnostics);
        if index.ty.as_ref() == Some(&Ty::RANGE) {
            result_ty = array_ty.clone();
        }
        indices.push(index);
    }
    trace!(rank, ty = %result_ty, "array access");
    BoundExpr::typed(
        BoundKind::ArrayAccess {
            array: Box::new(array),
            indices,
        },
        result_ty,
        span,
    )
    .with_errors_if(errors)
}

fn bind_pointer_access<'ast>(
    binder: &Binder<'_>,
    pointer: BoundExpr<'ast>,
    pointee: Ty,
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    if args.len() != 1 {
        diagnostics.add(BindError::BadIndexCount {
            expected: 1,
            found: args.len(),
            span,
        });
        return bad_access(binder, span, LookupResultKind::WrongArity, Vec::new(), pointer, args);
    }
    let mut errors = reject_names_and_refs(&args, "a pointer element access", span, diagnostics);
    if pointee.is_void() {
        diagnostics.add(BindError::VoidPointerIndex { span });
        errors = true;
    }
    let mut args = args.args;
    let Some(arg) = args.pop() else {
        return make_bad(binder, span, LookupResultKind::Empty, Vec::new(), vec![pointer]);
    };
    let index = convert_index(binder, arg, false, diagnostics);
    BoundExpr::typed(
        BoundKind::PointerElementAccess {
            pointer: Box::new(pointer),
            index: Box::new(index),
        },
        pointee,
        span,
    )
    .with_errors_if(errors)
}

/// Convert an index to the first integral type it implicitly converts to,
/// then to `Index` or `Range` when allowed. With no conversion the index is
/// converted to `int` for the error.
fn convert_index<'ast>(
    binder: &Binder<'_>,
    index: BoundExpr<'ast>,
    allow_index_and_range: bool,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let extra: &[Ty] = if allow_index_and_range {
        &[Ty::INDEX, Ty::RANGE]
    } else {
        &[]
    };
    let target = INDEX_TYPES
        .iter()
        .chain(extra)
        .find(|target| classify_expression(binder, &index, target).is_allowed(false))
        .cloned()
        .unwrap_or(Ty::INT);
    convert_implicit(binder, index, &target, diagnostics)
}

/// Report negative indices: an error for a negative constant, a warning for
/// a negated non-constant on a single-rank array. Returns whether an error
/// was reported.
fn check_negative(index: &BoundExpr<'_>, single_rank: bool, diagnostics: &mut DiagnosticBag) -> bool {
    let negative = match index.constant_value() {
        Some(ConstantValue::Int(value)) => *value < 0,
        Some(ConstantValue::Long(value)) => *value < 0,
        _ => false,
    };
    if negative {
        diagnostics.add(BindError::NegativeIndex { span: index.span });
        return true;
    }
    if single_rank && is_negated(index) {
        debug!(span = %index.span, "possibly negative array index");
        diagnostics.add(BindError::PossiblyNegativeIndex { span: index.span });
    }
    false
}

/// `-x` for a non-constant `x`, looking through conversions.
fn is_negated(index: &BoundExpr<'_>) -> bool {
    match &index.kind {
        BoundKind::Conversion { operand, .. } => is_negated(operand),
        BoundKind::Unary {
            op: UnaryOp::Minus,
            operand,
            ..
        } => operand.constant_value().is_none(),
        _ => false,
    }
}

/// Arrays and pointers take neither named nor `ref` arguments.
fn reject_names_and_refs(
    args: &AnalyzedArguments<'_>,
    context: &str,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> bool {
    let mut errors = false;
    if args.has_names() {
        let at = (0..args.len())
            .find(|&i| args.name(i).is_some())
            .map_or(span, |i| args.args[i].span);
        diagnostics.add(BindError::NamedArgumentNotAllowed {
            context: context.to_string(),
            span: at,
        });
        errors = true;
    }
    if args.ref_kinds().iter().any(|kind| *kind != RefKind::None) {
        diagnostics.add(BindError::RefNotAllowed {
            context: context.to_string(),
            span,
        });
        errors = true;
    }
    errors
}

// ============================================================================
// Indexers
// ============================================================================

fn bind_indexer_access<'ast>(
    binder: &Binder<'_>,
    receiver: BoundExpr<'ast>,
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let ty = receiver.ty_or_error();
    let lookup = binder.lookup().lookup_indexers(&ty, binder.within());

    if lookup.is_empty() {
        if let Some(pattern) = find_pattern(binder, &ty, &args) {
            return bind_pattern_access(binder, receiver, pattern, args, span, diagnostics);
        }
        diagnostics.add(BindError::CannotIndex {
            ty: ty.to_string(),
            span,
        });
        return bad_access(binder, span, LookupResultKind::Empty, Vec::new(), receiver, args);
    }
    if !lookup.is_viable() {
        if let Some(pattern) = find_pattern(binder, &ty, &args) {
            trace!(kind = ?lookup.kind, "indexer lookup failed, using pattern");
            return bind_pattern_access(binder, receiver, pattern, args, span, diagnostics);
        }
        if let Some(error) = &lookup.error {
            diagnostics.add(error.at(span));
        }
        return bad_access(binder, span, lookup.kind, lookup.symbols, receiver, args);
    }

    let indexers: Vec<PropertySymbol> = lookup
        .symbols
        .into_iter()
        .filter_map(|symbol| match symbol {
            Symbol::Property(property) => Some(property),
            _ => None,
        })
        .collect();
    let signatures: Vec<CandidateSignature> = indexers.iter().map(CandidateSignature::from_indexer).collect();
    let converter = ExpressionConverter {
        binder,
        args: args.args.iter().collect(),
    };
    let resolution = binder.overloads().resolve(&signatures, &args.infos(), &converter);

    if args.has_dynamic() {
        let applicable: Vec<PropertySymbol> = resolution
            .applicable()
            .map(|result| indexers[result.candidate].clone())
            .collect();
        if !applicable.is_empty() {
            return dynamic_indexer(binder, receiver, args, applicable, span, diagnostics);
        }
    }

    if let Some(best) = resolution.best_result() {
        let indexer = indexers[best.candidate].clone();
        trace!(indexer = %indexer.container, expanded = best.is_expanded, "indexer resolved");
        let (bound_args, arg_to_param) = coerce_arguments(binder, &indexer.params, best, args, span, diagnostics);
        let ty = indexer.ty.clone();
        return BoundExpr::typed(
            BoundKind::IndexerAccess {
                receiver: Box::new(receiver),
                indexer,
                args: bound_args,
                arg_to_param,
                expanded: best.is_expanded,
            },
            ty,
            span,
        );
    }

    if let Some(pattern) = find_pattern(binder, &ty, &args) {
        return bind_pattern_access(binder, receiver, pattern, args, span, diagnostics);
    }
    let name = format!("{ty}.this[]");
    report_overload_failure(&name, &signatures, &resolution, &args, 0, span, diagnostics);
    let symbols = indexers.into_iter().map(Symbol::Property).collect();
    bad_access(
        binder,
        span,
        LookupResultKind::OverloadResolutionFailure,
        symbols,
        receiver,
        args,
    )
}

// ============================================================================
// Index and range patterns
// ============================================================================

/// The members an `Index` or `Range` access binds through.
struct IndexPattern {
    length_or_count: PropertySymbol,
    pattern: PatternSymbol,
    result: Ty,
    feature: MessageId,
}

/// Find the pattern members for a single `Index` or `Range` argument.
fn find_pattern(binder: &Binder<'_>, receiver: &Ty, args: &AnalyzedArguments<'_>) -> Option<IndexPattern> {
    let [arg] = args.args.as_slice() else {
        return None;
    };
    let arg_ty = arg.ty.as_ref()?;
    let is_index = *arg_ty == Ty::INDEX;
    if !is_index && *arg_ty != Ty::RANGE {
        return None;
    }

    let length_or_count =
        count_property(binder, receiver, "Length").or_else(|| count_property(binder, receiver, "Count"))?;

    let (pattern, result, feature) = if is_index {
        let lookup = binder.lookup().lookup_indexers(receiver, binder.within());
        if !lookup.is_viable() {
            return None;
        }
        let indexer = lookup
            .symbols
            .into_iter()
            .find_map(|symbol| match symbol {
                Symbol::Property(p) if takes_ints(p.params.iter().map(|p| &p.ty), 1) => Some(p),
                _ => None,
            })?;
        let result = indexer.ty.clone();
        (PatternSymbol::Indexer(indexer), result, MessageId::IndexOperator)
    } else if receiver.is_special(SpecialType::String) {
        let substring = int_pair_method(binder, receiver, "Substring")?;
        (PatternSymbol::Substring(substring), Ty::STRING, MessageId::RangeOperator)
    } else {
        let slice = int_pair_method(binder, receiver, "Slice")?;
        let result = slice.return_type.clone();
        (PatternSymbol::Slice(slice), result, MessageId::RangeOperator)
    };
    trace!(%receiver, count = %length_or_count.def.name, "index pattern found");
    Some(IndexPattern {
        length_or_count,
        pattern,
        result,
        feature,
    })
}

/// An accessible instance `int` property named `name`.
fn count_property(binder: &Binder<'_>, receiver: &Ty, name: &str) -> Option<PropertySymbol> {
    let found = binder
        .lookup()
        .lookup_members(receiver, name, 0, LookupOptions::empty(), binder.within());
    if !found.is_viable() {
        return None;
    }
    match found.single()? {
        Symbol::Property(p) if !p.is_indexer() && !p.def.is_static && p.ty == Ty::INT => Some(p.clone()),
        _ => None,
    }
}

/// An accessible instance method `name(int, int)`.
fn int_pair_method(binder: &Binder<'_>, receiver: &Ty, name: &str) -> Option<MethodSymbol> {
    let found = binder
        .lookup()
        .lookup_members(receiver, name, 0, LookupOptions::empty(), binder.within());
    if !found.is_viable() {
        return None;
    }
    found.symbols.into_iter().find_map(|symbol| match symbol {
        Symbol::Method(m) if !m.is_static() && takes_ints(m.params.iter().map(|p| &p.ty), 2) => Some(m),
        _ => None,
    })
}

fn takes_ints<'t>(params: impl ExactSizeIterator<Item = &'t Ty>, count: usize) -> bool {
    params.len() == count && params.into_iter().all(|ty| *ty == Ty::INT)
}

fn bind_pattern_access<'ast>(
    binder: &Binder<'_>,
    receiver: BoundExpr<'ast>,
    pattern: IndexPattern,
    args: AnalyzedArguments<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let mut errors = !binder.check_feature(pattern.feature, span, diagnostics);
    if args.has_names() {
        diagnostics.add(BindError::NamedArgumentNotAllowed {
            context: "an index or range access".to_string(),
            span,
        });
        errors = true;
    }
    let Some(argument) = args.args.into_iter().next() else {
        return make_bad(binder, span, LookupResultKind::Empty, Vec::new(), vec![receiver]);
    };
    BoundExpr::typed(
        BoundKind::PatternIndexerAccess {
            receiver: Box::new(receiver),
            length_or_count: pattern.length_or_count,
            pattern: pattern.pattern,
            argument: Box::new(argument),
        },
        pattern.result,
        span,
    )
    .with_errors_if(errors)
}

// ============================================================================
// Shared
// ============================================================================

fn dynamic_indexer<'ast>(
    binder: &Binder<'_>,
    receiver: BoundExpr<'ast>,
    args: AnalyzedArguments<'ast>,
    applicable: Vec<PropertySymbol>,
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
    trace!(applicable = applicable.len(), "dynamic element access");
    BoundExpr::typed(
        BoundKind::DynamicIndexerAccess {
            receiver: Box::new(receiver),
            args,
            names,
            ref_kinds,
            applicable,
        },
        Ty::Dynamic,
        span,
    )
}

fn bad_access<'ast>(
    binder: &Binder<'_>,
    span: Span,
    result_kind: LookupResultKind,
    symbols: Vec<Symbol>,
    receiver: BoundExpr<'ast>,
    args: AnalyzedArguments<'ast>,
) -> BoundExpr<'ast> {
    let children = std::iter::once(receiver).chain(args.args).collect();
    make_bad(binder, span, result_kind, symbols, children)
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use osprey_core::{ErrorKind, LanguageVersion, Severity};
    use osprey_syntax::{AstBuilder, Expr};

    use super::*;
    use crate::binder::BinderFlags;
    use crate::compilation::CompilationOptions;
    use crate::expr::dispatch::bind_expression;
    use crate::expr::test_support::{Context, Fixture};

    fn bind<'ast>(fx: &Fixture, ctx: &Context, expr: &Expr<'ast>) -> (BoundExpr<'ast>, DiagnosticBag) {
        fx.bind(ctx, |binder| {
            let mut diagnostics = DiagnosticBag::new();
            (bind_expression(binder, expr, &mut diagnostics), diagnostics)
        })
    }

    fn arrays(fx: &Fixture) -> Context {
        fx.context()
            .with_local("numbers", Ty::array(Ty::INT, 1))
            .with_local("grid", Ty::array(Ty::STRING, 2))
            .with_local("i", Ty::INT)
            .with_local("from", Ty::INDEX)
            .with_local("span", Ty::RANGE)
    }

    #[test]
    fn array_indices_convert_to_integral_types() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = arrays(&fx).with_local("big", Ty::LONG).with_local("small", Ty::Special(SpecialType::Int16));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("numbers"), &[b.ident("big")]));
        assert!(diagnostics.is_empty());
        assert_eq!(bound.ty, Some(Ty::INT));
        let BoundKind::ArrayAccess { indices, .. } = &bound.kind else {
            panic!("expected an array access, got {:?}", bound.kind);
        };
        assert_eq!(indices[0].ty, Some(Ty::LONG));

        let (bound, _) = bind(&fx, &ctx, &b.index_with(b.ident("numbers"), &[b.ident("small")]));
        let BoundKind::ArrayAccess { indices, .. } = &bound.kind else {
            panic!("expected an array access");
        };
        assert_eq!(indices[0].ty, Some(Ty::INT));
    }

    #[test]
    fn array_rank_must_match() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = arrays(&fx);

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("grid"), &[b.int(0), b.int(1)]));
        assert!(diagnostics.is_empty());
        assert_eq!(bound.ty, Some(Ty::STRING));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("grid"), &[b.int(0)]));
        assert!(matches!(bound.kind, BoundKind::BadExpression { .. }));
        assert_eq!(diagnostics.count_of(ErrorKind::WrongArity), 1);
    }

    #[test]
    fn single_rank_arrays_take_index_and_range() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = arrays(&fx);

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("numbers"), &[b.ident("from")]));
        assert!(diagnostics.is_empty());
        assert_eq!(bound.ty, Some(Ty::INT));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("numbers"), &[b.ident("span")]));
        assert!(diagnostics.is_empty());
        assert_eq!(bound.ty, Some(Ty::array(Ty::INT, 1)));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("grid"), &[b.ident("from"), b.int(0)]));
        assert!(bound.has_errors);
        assert_eq!(diagnostics.count_of(ErrorKind::InvalidConversion), 1);
    }

    #[test]
    fn negative_indices() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = arrays(&fx);

        let constant = b.index_with(b.ident("numbers"), &[b.unary(UnaryOp::Minus, b.int(1))]);
        let (bound, diagnostics) = bind(&fx, &ctx, &constant);
        assert!(bound.has_errors);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.has_errors());

        let negated = b.index_with(b.ident("numbers"), &[b.unary(UnaryOp::Minus, b.ident("i"))]);
        let (bound, diagnostics) = bind(&fx, &ctx, &negated);
        assert!(!bound.has_errors);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.iter().next().map(|d| d.severity), Some(Severity::Warning));
    }

    #[test]
    fn arrays_reject_named_and_ref_arguments() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = arrays(&fx);

        let named = b.index(b.ident("numbers"), &[b.named_arg("at", b.int(0))]);
        let (bound, diagnostics) = bind(&fx, &ctx, &named);
        assert!(bound.has_errors);
        assert_eq!(diagnostics.count_of(ErrorKind::InvalidContext), 1);

        let by_ref = b.index(b.ident("numbers"), &[b.ref_arg(RefKind::Ref, b.ident("i"))]);
        let (bound, _) = bind(&fx, &ctx, &by_ref);
        assert!(bound.has_errors);
    }

    #[test]
    fn pointer_element_access() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx
            .context()
            .with_local("p", Ty::pointer(Ty::INT))
            .with_local("v", Ty::pointer(Ty::VOID))
            .with_flags(BinderFlags::UNSAFE);

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("p"), &[b.int(2)]));
        assert!(diagnostics.is_empty());
        assert!(matches!(bound.kind, BoundKind::PointerElementAccess { .. }));
        assert_eq!(bound.ty, Some(Ty::INT));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("v"), &[b.int(2)]));
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::VoidPointerIndex { .. })
        ));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("p"), &[b.int(1), b.int(2)]));
        assert!(matches!(bound.kind, BoundKind::BadExpression { .. }));
        assert_eq!(diagnostics.count_of(ErrorKind::WrongArity), 1);
    }

    #[test]
    fn dynamic_receivers_bypass_checks() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("d", Ty::Dynamic);
        let expr = b.index(b.ident("d"), &[b.named_arg("anything", b.string("x"))]);
        let (bound, diagnostics) = bind(&fx, &ctx, &expr);
        assert!(diagnostics.is_empty());
        let BoundKind::DynamicIndexerAccess { names, applicable, .. } = &bound.kind else {
            panic!("expected a dynamic indexer access, got {:?}", bound.kind);
        };
        assert_eq!(names[0].as_deref(), Some("anything"));
        assert!(applicable.is_empty());
    }

    #[test]
    fn indexers_resolve_by_overload() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("sheet", fx.ty("Shop.Sheet"));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("sheet"), &[b.int(1), b.int(2)]));
        assert!(diagnostics.is_empty());
        let BoundKind::IndexerAccess { indexer, .. } = &bound.kind else {
            panic!("expected an indexer access, got {:?}", bound.kind);
        };
        assert_eq!(indexer.params.len(), 2);
        assert_eq!(bound.ty, Some(Ty::DOUBLE));

        let (bound, _) = bind(&fx, &ctx, &b.index_with(b.ident("sheet"), &[b.string("total")]));
        assert!(matches!(bound.kind, BoundKind::IndexerAccess { .. }));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("sheet"), &[b.bool(true)]));
        assert!(matches!(bound.kind, BoundKind::BadExpression { .. }));
        assert_eq!(diagnostics.count_of(ErrorKind::NoApplicableOverload), 1);
    }

    #[test]
    fn types_without_indexers_cannot_be_indexed() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("item", fx.ty("Shop.Item"));
        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("item"), &[b.int(0)]));
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::CannotIndex { .. })
        ));
    }

    #[test]
    fn index_pattern_uses_length_and_int_indexer() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx
            .context()
            .with_local("buffer", fx.ty("Shop.Buffer"))
            .with_local("from", Ty::INDEX);
        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("buffer"), &[b.ident("from")]));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let BoundKind::PatternIndexerAccess {
            length_or_count,
            pattern: PatternSymbol::Indexer(_),
            ..
        } = &bound.kind
        else {
            panic!("expected a pattern indexer access, got {:?}", bound.kind);
        };
        assert_eq!(&*length_or_count.def.name, "Length");
        assert_eq!(bound.ty, Some(Ty::INT));
    }

    #[test]
    fn count_stands_in_for_length() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("deck", fx.ty("Shop.Deck"));
        let expr = b.index_with(b.ident("deck"), &[b.from_end(b.int(1))]);
        let (bound, diagnostics) = bind(&fx, &ctx, &expr);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let BoundKind::PatternIndexerAccess { length_or_count, .. } = &bound.kind else {
            panic!("expected a pattern indexer access, got {:?}", bound.kind);
        };
        assert_eq!(&*length_or_count.def.name, "Count");
        assert_eq!(bound.ty, Some(Ty::STRING));
    }

    #[test]
    fn range_pattern_uses_slice_or_substring() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx
            .context()
            .with_local("buffer", fx.ty("Shop.Buffer"))
            .with_local("text", Ty::STRING);
        let range = b.range(Some(b.int(1)), Some(b.int(3)));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("buffer"), &[range]));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(matches!(
            bound.kind,
            BoundKind::PatternIndexerAccess { pattern: PatternSymbol::Slice(_), .. }
        ));
        assert_eq!(bound.ty, Some(fx.ty("Shop.Buffer")));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("text"), &[range]));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(matches!(
            bound.kind,
            BoundKind::PatternIndexerAccess { pattern: PatternSymbol::Substring(_), .. }
        ));
        assert_eq!(bound.ty, Some(Ty::STRING));
    }

    #[test]
    fn range_pattern_applies_when_every_indexer_is_inaccessible() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("rope", fx.ty("Shop.Rope"));

        let range = b.range(Some(b.int(1)), Some(b.int(2)));
        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("rope"), &[range]));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(!bound.has_errors);
        assert!(matches!(
            bound.kind,
            BoundKind::PatternIndexerAccess { pattern: PatternSymbol::Slice(_), .. }
        ));
        assert_eq!(bound.ty, Some(fx.ty("Shop.Rope")));

        // An Index needs an accessible int indexer.
        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("rope"), &[b.from_end(b.int(1))]));
        assert!(bound.has_errors);
        assert_eq!(diagnostics.count_of(ErrorKind::Inaccessible), 1);

        // Anything but an Index or Range still reports the lookup failure.
        let (bound, diagnostics) = bind(&fx, &ctx, &b.index_with(b.ident("rope"), &[b.string("key")]));
        assert!(bound.has_errors);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.iter().next().map(|d| d.kind()), Some(ErrorKind::Inaccessible));
    }

    #[test]
    fn patterns_need_the_language_feature_and_no_names() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let old = fx
            .context()
            .with_local("buffer", fx.ty("Shop.Buffer"))
            .with_local("from", Ty::INDEX)
            .with_options(CompilationOptions::default().with_language_version(LanguageVersion::V7_3));
        let (bound, diagnostics) = bind(&fx, &old, &b.index_with(b.ident("buffer"), &[b.ident("from")]));
        assert!(matches!(bound.kind, BoundKind::PatternIndexerAccess { .. }));
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::FeatureUnavailable { feature: MessageId::IndexOperator, .. })
        ));

        let ctx = fx
            .context()
            .with_local("buffer", fx.ty("Shop.Buffer"))
            .with_local("from", Ty::INDEX);
        let named = b.index(b.ident("buffer"), &[b.named_arg("i", b.ident("from"))]);
        let (bound, _) = bind(&fx, &ctx, &named);
        assert!(bound.has_errors);
    }
}
