//! Error recovery and natural typing.
//!
//! This module handles:
//! - Bad expressions: error-typed nodes that keep the candidate symbols and
//!   partial children of a failed bind
//! - Natural typing of untyped forms (tuple literals, target-typed
//!   conditionals, `stackalloc`, `default`)
//! - Resolving a `Color Color` node to its value interpretation

use osprey_core::{BindError, DiagnosticBag, Span, Symbol, Ty};
use osprey_symbols::LookupResultKind;
use tracing::trace;

use super::{arrays, convert, tuple};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind};

/// Build a bad expression.
///
/// Each child is natural-typed with diagnostics discarded, so the node is
/// fully typed below it. The node's type is an error type named after the
/// single candidate symbol, or unnamed when there are zero or several.
pub fn make_bad<'ast>(
    binder: &Binder<'_>,
    span: Span,
    result_kind: LookupResultKind,
    symbols: Vec<Symbol>,
    children: Vec<BoundExpr<'ast>>,
) -> BoundExpr<'ast> {
    let mut discard = DiagnosticBag::discarding();
    let children = children
        .into_iter()
        .map(|child| natural_type(binder, child, &mut discard))
        .collect();
    let name = match symbols.as_slice() {
        [single] => single.name(),
        _ => String::new(),
    };
    trace!(?result_kind, name, "bad expression");
    BoundExpr::typed(
        BoundKind::BadExpression {
            result_kind,
            symbols,
            children,
        },
        Ty::error(name),
        span,
    )
    .with_errors()
}

/// Wrap a single expression in a bad expression, keeping its symbol.
pub(crate) fn bad_from<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    result_kind: LookupResultKind,
) -> BoundExpr<'ast> {
    let span = expr.span;
    let symbols = expr.symbol().into_iter().collect();
    make_bad(binder, span, result_kind, symbols, vec![expr])
}

/// Give an expression its natural type.
///
/// Typed expressions are returned unchanged, except that a `Color Color`
/// node resolves to its value. Untyped forms either acquire their natural
/// type or are reported and replaced by an error-typed node.
pub fn natural_type<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    natural_type_with(binder, expr, true, diagnostics)
}

/// [`natural_type`] for callers that report a target-less `default`
/// themselves. The literal still becomes an error-typed node.
pub fn natural_type_without_default_diagnostic<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    natural_type_with(binder, expr, false, diagnostics)
}

fn natural_type_with<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    report_default_without_target: bool,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let expr = resolve_to_value(expr, diagnostics);
    if expr.ty.is_some() {
        return expr;
    }

    let span = expr.span;
    match &expr.kind {
        BoundKind::UnconvertedConditional {
            common_type: Some(target),
            ..
        }
        | BoundKind::UnconvertedSwitch {
            common_type: Some(target),
            ..
        } => {
            let target = target.clone();
            convert::convert_implicit(binder, expr, &target, diagnostics)
        }
        BoundKind::UnconvertedConditional {
            when_true,
            when_false,
            ..
        } => {
            if !when_true.has_errors && !when_false.has_errors {
                diagnostics.add(BindError::NoCommonType {
                    first: when_true.display_type(),
                    second: when_false.display_type(),
                    span,
                });
            }
            let children = expr.kind.children().cloned().collect();
            make_bad(binder, span, LookupResultKind::Empty, Vec::new(), children)
        }
        BoundKind::UnconvertedSwitch { .. } => {
            if !expr.has_errors {
                diagnostics.add(BindError::NoNaturalType {
                    construct: "switch expression".to_string(),
                    span,
                });
            }
            let children = expr.kind.children().cloned().collect();
            make_bad(binder, span, LookupResultKind::Empty, Vec::new(), children)
        }
        BoundKind::TupleLiteral { .. } => tuple::natural_tuple(binder, expr, diagnostics),
        BoundKind::UnconvertedStackAlloc { .. } => arrays::natural_stackalloc(binder, expr, diagnostics),
        BoundKind::DefaultLiteral => {
            if report_default_without_target {
                diagnostics.add(BindError::DefaultLiteralNoTarget { span });
            }
            BoundExpr::typed(BoundKind::DefaultValue, Ty::error(""), span).with_errors()
        }
        BoundKind::MethodGroup {
            receiver,
            name,
            methods,
            ..
        } => {
            if !expr.has_errors {
                diagnostics.add(BindError::NotAValue {
                    name: name.to_string(),
                    kind: "method group".to_string(),
                    span,
                });
            }
            let symbols = methods.iter().cloned().map(Symbol::Method).collect();
            let children = receiver.iter().map(|r| r.as_ref().clone()).collect();
            make_bad(binder, span, LookupResultKind::NotAValue, symbols, children)
        }
        BoundKind::NamespaceExpr(ns) => {
            diagnostics.add(BindError::NotAValue {
                name: ns.path.to_string(),
                kind: "namespace".to_string(),
                span,
            });
            let symbols = vec![Symbol::Namespace(ns.clone())];
            make_bad(binder, span, LookupResultKind::NotAValue, symbols, Vec::new())
        }
        BoundKind::UnboundLambda(_) => {
            diagnostics.add(BindError::NoNaturalType {
                construct: "lambda expression".to_string(),
                span,
            });
            make_bad(binder, span, LookupResultKind::NotAValue, Vec::new(), Vec::new())
        }
        _ => {
            // Every other kind is built typed; keep binding total regardless.
            diagnostics.add(BindError::Internal {
                message: format!("untyped {}", expr.kind.describe()),
                span,
            });
            let children = expr.kind.children().cloned().collect();
            make_bad(binder, span, LookupResultKind::Empty, Vec::new(), children)
        }
    }
}

/// Take the value side of a `Color Color` node, merging its diagnostics.
pub(crate) fn resolve_to_value<'ast>(
    expr: BoundExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    match expr.kind {
        BoundKind::TypeOrValue {
            value,
            value_diagnostics,
            ..
        } => {
            diagnostics.append(value_diagnostics);
            *value
        }
        kind => BoundExpr { kind, ..expr },
    }
}

/// Take the type side of a `Color Color` node, merging its diagnostics.
pub(crate) fn resolve_to_type<'ast>(
    expr: BoundExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    match expr.kind {
        BoundKind::TypeOrValue {
            type_expr,
            type_diagnostics,
            ..
        } => {
            diagnostics.append(type_diagnostics);
            *type_expr
        }
        kind => BoundExpr { kind, ..expr },
    }
}

#[cfg(test)]
mod tests {
    use osprey_core::{ConstantValue, LocalSymbol, NamespaceSymbol};
    use std::rc::Rc;

    use super::*;
    use crate::expr::test_support::Fixture;

    #[test]
    fn bad_expressions_are_error_typed_after_their_symbol() {
        let fx = Fixture::new();
        fx.bind(&fx.context(), |binder| {
            let local = Rc::new(LocalSymbol::new("total", Ty::INT, Span::default()));
            let bad = make_bad(
                binder,
                Span::new(1, 1, 5),
                LookupResultKind::NotAValue,
                vec![Symbol::Local(local)],
                Vec::new(),
            );
            assert!(bad.has_errors);
            assert_eq!(bad.ty, Some(Ty::error("total")));
        });
    }

    #[test]
    fn bad_children_are_natural_typed() {
        let fx = Fixture::new();
        fx.bind(&fx.context(), |binder| {
            let default = BoundExpr::new(BoundKind::DefaultLiteral, None, Span::default());
            let bad = make_bad(binder, Span::default(), LookupResultKind::Empty, Vec::new(), vec![default]);
            assert!(bad.kind.children().all(|child| child.ty.is_some()));
            assert_eq!(bad.ty, Some(Ty::error("")));
        });
    }

    #[test]
    fn natural_type_is_idempotent_on_typed_nodes() {
        let fx = Fixture::new();
        fx.bind(&fx.context(), |binder| {
            let mut diagnostics = DiagnosticBag::new();
            let literal = BoundExpr::literal(ConstantValue::Int(4), Ty::INT, Span::default());
            let once = natural_type(binder, literal, &mut diagnostics);
            let twice = natural_type(binder, once.clone(), &mut diagnostics);
            assert_eq!(once.ty, twice.ty);
            assert!(diagnostics.is_empty());
        });
    }

    #[test]
    fn default_literal_without_target_is_reported() {
        let fx = Fixture::new();
        fx.bind(&fx.context(), |binder| {
            let mut diagnostics = DiagnosticBag::new();
            let default = BoundExpr::new(BoundKind::DefaultLiteral, None, Span::default());
            let typed = natural_type(binder, default, &mut diagnostics);
            assert!(typed.has_errors);
            assert!(matches!(
                diagnostics.iter().next().map(|d| &d.error),
                Some(BindError::DefaultLiteralNoTarget { .. })
            ));
        });
    }

    #[test]
    fn default_literal_diagnostic_can_be_left_to_the_caller() {
        let fx = Fixture::new();
        fx.bind(&fx.context(), |binder| {
            let mut diagnostics = DiagnosticBag::new();
            let default = BoundExpr::new(BoundKind::DefaultLiteral, None, Span::default());
            let typed = natural_type_without_default_diagnostic(binder, default, &mut diagnostics);
            assert!(typed.has_errors);
            assert_eq!(typed.ty, Some(Ty::error("")));
            assert!(diagnostics.is_empty());

            // Other untyped forms are still reported.
            let shop = binder.symbols().namespaces().get_path("Shop").unwrap();
            let namespace = NamespaceSymbol {
                id: shop,
                path: "Shop".into(),
            };
            let expr = BoundExpr::new(BoundKind::NamespaceExpr(namespace), None, Span::default());
            let typed = natural_type_without_default_diagnostic(binder, expr, &mut diagnostics);
            assert!(typed.has_errors);
            assert_eq!(diagnostics.len(), 1);
        });
    }
}
