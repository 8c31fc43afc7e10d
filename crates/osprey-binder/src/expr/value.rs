//! Value-kind checks.
//!
//! After binding, the context decides what the expression must be: a
//! readable value, an assignable variable, or a variable that can be passed
//! by reference. Types, namespaces and method groups are never values; a
//! write-only property is not readable; a property is never a `ref` target.

use osprey_core::{BindError, DiagnosticBag, RefKind, Symbol};
use osprey_symbols::LookupResultKind;
use osprey_syntax::Expr;
use tracing::instrument;

use super::dispatch::bind_expression;
use super::recovery::{bad_from, make_bad, resolve_to_value};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind, PatternSymbol};

/// What an expression is required to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A value that can be read.
    ReadableValue,
    /// The target of an assignment.
    AssignableVariable,
    /// A `ref` or `out` argument.
    RefOrOutArgument,
    /// An `in` argument.
    ReadonlyRefArgument,
}

impl ValueKind {
    /// The requirement for an argument passed with `ref_kind`.
    pub fn for_argument(ref_kind: RefKind) -> Self {
        match ref_kind {
            RefKind::None => ValueKind::ReadableValue,
            RefKind::Ref | RefKind::Out => ValueKind::RefOrOutArgument,
            RefKind::In => ValueKind::ReadonlyRefArgument,
        }
    }
}

/// Bind an expression and require it to be of the given value kind.
#[instrument(level = "trace", skip_all, fields(kind = ?kind))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_value<'ast>(
    binder: &Binder<'_>,
    expr: &Expr<'ast>,
    kind: ValueKind,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let bound = bind_expression(binder, expr, diagnostics);
    check_value(binder, bound, kind, diagnostics)
}

/// Require an already-bound expression to be of the given value kind.
///
/// A failing expression is replaced by a bad expression that keeps it as a
/// child. Expressions that are already bad are returned unchanged.
pub fn check_value<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    kind: ValueKind,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    check(binder, expr, kind, false, diagnostics)
}

/// As [`check_value`], but a method group is accepted as a readable value:
/// arguments may be converted to a delegate parameter later.
pub(crate) fn check_argument_value<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    kind: ValueKind,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    check(binder, expr, kind, true, diagnostics)
}

fn check<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    kind: ValueKind,
    allow_method_group: bool,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let expr = resolve_to_value(expr, diagnostics);
    if matches!(expr.kind, BoundKind::BadExpression { .. }) {
        return expr;
    }

    // Never values, whatever the requirement.
    match &expr.kind {
        BoundKind::TypeExpr => {
            diagnostics.add(BindError::NotAValue {
                name: expr.display_type(),
                kind: "type".to_string(),
                span: expr.span,
            });
            return bad_from(binder, expr, LookupResultKind::NotAValue);
        }
        BoundKind::NamespaceExpr(ns) => {
            diagnostics.add(BindError::NotAValue {
                name: ns.path.to_string(),
                kind: "namespace".to_string(),
                span: expr.span,
            });
            return bad_from(binder, expr, LookupResultKind::NotAValue);
        }
        BoundKind::MethodGroup {
            receiver,
            name,
            methods,
            ..
        } if !(allow_method_group && kind == ValueKind::ReadableValue) => {
            if !expr.has_errors {
                diagnostics.add(BindError::NotAValue {
                    name: name.to_string(),
                    kind: "method group".to_string(),
                    span: expr.span,
                });
            }
            let symbols = methods.iter().cloned().map(Symbol::Method).collect();
            let children = receiver.iter().map(|r| r.as_ref().clone()).collect();
            return make_bad(binder, expr.span, LookupResultKind::NotAValue, symbols, children);
        }
        _ => {}
    }

    let error = match kind {
        ValueKind::ReadableValue => readable_error(&expr),
        ValueKind::AssignableVariable => assignable_error(binder, &expr),
        ValueKind::RefOrOutArgument => ref_error(binder, &expr, false),
        ValueKind::ReadonlyRefArgument => ref_error(binder, &expr, true),
    };
    match error {
        Some(error) => {
            let result_kind = if kind == ValueKind::ReadableValue {
                LookupResultKind::NotAValue
            } else {
                LookupResultKind::NotAVariable
            };
            if !expr.has_error_type() {
                diagnostics.add(error);
            }
            bad_from(binder, expr, result_kind)
        }
        None => expr,
    }
}

fn readable_error(expr: &BoundExpr<'_>) -> Option<BindError> {
    let span = expr.span;
    match &expr.kind {
        BoundKind::PropertyAccess { property, .. } if property.def.getter.is_none() => {
            Some(BindError::WriteOnlyProperty {
                name: property.def.name.clone(),
                span,
            })
        }
        BoundKind::IndexerAccess { indexer, .. } if indexer.def.getter.is_none() => {
            Some(BindError::WriteOnlyProperty {
                name: format!("{}.this[]", indexer.container),
                span,
            })
        }
        _ => None,
    }
}

fn assignable_error(binder: &Binder<'_>, expr: &BoundExpr<'_>) -> Option<BindError> {
    let span = expr.span;
    match &expr.kind {
        BoundKind::Local(local) => {
            (!Symbol::Local(local.clone()).can_be_assigned()).then_some(BindError::NotAssignable { span })
        }
        BoundKind::Parameter(param) => (param.ref_kind == RefKind::In).then_some(BindError::NotAssignable { span }),
        BoundKind::FieldAccess { field, .. } => {
            if field.def.constant.is_some() {
                Some(BindError::NotAssignable { span })
            } else if field.def.is_readonly && !binder.in_constructor_of(field.def.owner) {
                Some(BindError::ReadonlyField {
                    name: field.def.name.clone(),
                    span,
                })
            } else {
                None
            }
        }
        BoundKind::PropertyAccess { property, .. } => {
            property.def.setter.is_none().then(|| BindError::ReadonlyProperty {
                name: property.def.name.clone(),
                span,
            })
        }
        BoundKind::IndexerAccess { indexer, .. } => {
            indexer.def.setter.is_none().then(|| BindError::ReadonlyProperty {
                name: format!("{}.this[]", indexer.container),
                span,
            })
        }
        BoundKind::PatternIndexerAccess { pattern, .. } => match pattern {
            PatternSymbol::Indexer(indexer) if indexer.def.setter.is_some() => None,
            PatternSymbol::Indexer(indexer) => Some(BindError::ReadonlyProperty {
                name: format!("{}.this[]", indexer.container),
                span,
            }),
            PatternSymbol::Slice(_) | PatternSymbol::Substring(_) => Some(BindError::NotAssignable { span }),
        },
        BoundKind::ArrayAccess { .. }
        | BoundKind::PointerElementAccess { .. }
        | BoundKind::PointerIndirection { .. }
        | BoundKind::EventAccess { .. }
        | BoundKind::DynamicMemberAccess { .. }
        | BoundKind::DynamicIndexerAccess { .. } => None,
        _ => Some(BindError::NotAssignable { span }),
    }
}

fn ref_error(binder: &Binder<'_>, expr: &BoundExpr<'_>, readonly: bool) -> Option<BindError> {
    let span = expr.span;
    match &expr.kind {
        BoundKind::Local(local) => {
            let writable = Symbol::Local(local.clone()).can_be_assigned();
            (!writable && !(readonly && local.constant.is_none())).then_some(BindError::RefValueExpected { span })
        }
        BoundKind::Parameter(param) => {
            (!readonly && param.ref_kind == RefKind::In).then_some(BindError::RefValueExpected { span })
        }
        BoundKind::FieldAccess { field, .. } => {
            if field.def.constant.is_some() {
                Some(BindError::RefValueExpected { span })
            } else if !readonly && field.def.is_readonly && !binder.in_constructor_of(field.def.owner) {
                Some(BindError::ReadonlyField {
                    name: field.def.name.clone(),
                    span,
                })
            } else {
                None
            }
        }
        BoundKind::ArrayAccess { .. }
        | BoundKind::PointerElementAccess { .. }
        | BoundKind::PointerIndirection { .. }
        | BoundKind::DynamicMemberAccess { .. }
        | BoundKind::DynamicIndexerAccess { .. } => None,
        _ => Some(BindError::RefValueExpected { span }),
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use osprey_core::{ErrorKind, LocalSymbol, Span, Ty};
    use osprey_syntax::AstBuilder;

    use super::*;
    use crate::expr::test_support::Fixture;
    use crate::scope::LocalScope;

    #[test]
    fn types_are_not_values() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.ident("Item");
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert_eq!(diagnostics.count_of(ErrorKind::InvalidContext), 1);
    }

    #[test]
    fn write_only_properties_are_not_readable() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.member(b.ident("item"), "Secret");
        let ctx = fx.context().with_local("item", fx.ty("Shop.Item"));
        let (bound, diagnostics) = fx.bind_value(&ctx, &expr, ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::WriteOnlyProperty { .. })
        ));
    }

    #[test]
    fn readonly_fields_are_assignable_only_in_constructors() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.ident("Price");

        let ctx = fx.context().in_type("Shop.Item");
        let (bound, diagnostics) = fx.bind_value(&ctx, &expr, ValueKind::AssignableVariable);
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::ReadonlyField { .. })
        ));

        let ctx = fx.context().in_type("Shop.Item").in_constructor();
        let (bound, diagnostics) = fx.bind_value(&ctx, &expr, ValueKind::AssignableVariable);
        assert!(!bound.has_errors);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn properties_cannot_be_passed_by_reference() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.member(b.ident("item"), "Title");
        let ctx = fx.context().with_local("item", fx.ty("Shop.Item"));
        let (bound, diagnostics) = fx.bind_value(&ctx, &expr, ValueKind::RefOrOutArgument);
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::RefValueExpected { .. })
        ));
    }

    #[test]
    fn readonly_locals_pass_as_in_arguments() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.ident("limit");
        let mut local = LocalSymbol::new("limit", Ty::INT, Span::default());
        local.is_readonly = true;
        let ctx = fx.context().with_scope(LocalScope::new().with_local(local));

        let (_, diagnostics) = fx.bind_value(&ctx, &expr, ValueKind::ReadonlyRefArgument);
        assert!(diagnostics.is_empty());
        let (_, diagnostics) = fx.bind_value(&ctx, &expr, ValueKind::RefOrOutArgument);
        assert_eq!(diagnostics.len(), 1);
    }
}
