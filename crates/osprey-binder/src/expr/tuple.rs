//! Tuple literals.
//!
//! A tuple literal whose elements all have types is typed immediately.
//! One with an untyped element (`null`, a lambda, `default`) stays untyped
//! and converts element by element; its natural type exists only when every
//! element has one.
//!
//! Element names are the explicit `name:` labels, or else inferred from an
//! element that is a simple name or member access (`(x, p.Y)` names its
//! elements `x` and `Y`). Inferred names that collide are dropped.

use std::rc::Rc;

use osprey_core::{BindError, DiagnosticBag, MessageId, Ty};
use osprey_symbols::LookupResultKind;
use osprey_syntax::{Expr, TupleExpr};
use tracing::{debug, instrument};

use super::recovery::{make_bad, natural_type};
use super::value::{ValueKind, bind_value};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind};

/// Bind `(a, name: b, ...)`.
#[instrument(level = "trace", skip_all, fields(arity = tuple.elements.len()))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_tuple<'ast>(
    binder: &Binder<'_>,
    tuple: &'ast TupleExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = tuple.span;
    let available = binder.check_feature(MessageId::Tuples, span, diagnostics);

    let mut has_errors = !available;
    let mut explicit: Vec<Option<Rc<str>>> = Vec::with_capacity(tuple.elements.len());
    for element in tuple.elements {
        let Some(name) = &element.name else {
            explicit.push(None);
            continue;
        };
        if explicit.iter().flatten().any(|seen| **seen == *name.name) {
            diagnostics.add(BindError::DuplicateTupleElementName {
                name: name.name.to_string(),
                span: name.span,
            });
            has_errors = true;
        }
        explicit.push(Some(name.name.into()));
    }

    let elements: Vec<BoundExpr<'ast>> = tuple
        .elements
        .iter()
        .map(|element| bind_value(binder, &element.value, ValueKind::ReadableValue, diagnostics))
        .collect();
    let names = element_names(tuple, explicit);

    let types: Option<Vec<Ty>> = elements
        .iter()
        .map(|element| element.ty.clone().filter(|ty| *ty != Ty::Null))
        .collect();
    let ty = types.map(|types| Ty::tuple(types, names.clone()));
    BoundExpr::new(BoundKind::TupleLiteral { elements, names }, ty, span).with_errors_if(has_errors)
}

/// Explicit names, then names inferred from the element expressions where
/// they are unique.
fn element_names(tuple: &TupleExpr<'_>, explicit: Vec<Option<Rc<str>>>) -> Vec<Option<Rc<str>>> {
    let inferred: Vec<Option<&str>> = tuple
        .elements
        .iter()
        .zip(&explicit)
        .map(|(element, name)| match name {
            Some(_) => None,
            None => inferred_name(&element.value),
        })
        .collect();

    explicit
        .into_iter()
        .zip(&inferred)
        .map(|(name, candidate)| {
            name.or_else(|| {
                let candidate = (*candidate)?;
                let unique = inferred.iter().flatten().filter(|other| **other == candidate).count() == 1;
                let taken = tuple
                    .elements
                    .iter()
                    .any(|element| element.name.is_some_and(|name| name.name == candidate));
                (unique && !taken).then(|| Rc::from(candidate))
            })
        })
        .collect()
}

fn inferred_name<'ast>(expr: &Expr<'ast>) -> Option<&'ast str> {
    match expr.unparenthesized() {
        Expr::Ident(ident) => Some(ident.ident.name),
        Expr::Member(member) => Some(member.name.name),
        _ => None,
    }
}

/// The natural type of a tuple literal: the tuple of its elements' natural
/// types. A `null` element has none.
pub(crate) fn natural_tuple<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    if expr.ty.is_some() {
        return expr;
    }
    let span = expr.span;
    let had_errors = expr.has_errors;
    let BoundKind::TupleLiteral { elements, names } = expr.kind else {
        return expr;
    };

    let elements: Vec<BoundExpr<'ast>> = elements
        .into_iter()
        .map(|element| natural_type(binder, element, diagnostics))
        .collect();
    if elements.iter().any(|element| element.ty == Some(Ty::Null)) {
        if !had_errors && elements.iter().all(|element| !element.has_errors) {
            debug!("tuple literal with a null element has no natural type");
            diagnostics.add(BindError::NoNaturalType {
                construct: "tuple literal".to_string(),
                span,
            });
        }
        return make_bad(binder, span, LookupResultKind::Empty, Vec::new(), elements);
    }

    let types = elements.iter().map(BoundExpr::ty_or_error).collect();
    let ty = Ty::tuple(types, names.clone());
    BoundExpr::typed(BoundKind::TupleLiteral { elements, names }, ty, span).with_errors_if(had_errors)
}
