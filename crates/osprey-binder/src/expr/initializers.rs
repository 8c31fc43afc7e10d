//! Object and collection initializers: `new T { A = 1 }`, `new T { 1, 2 }`.
//!
//! Initializers bind against an implicit receiver standing for the object
//! under construction, independently of which constructor was chosen.
//!
//! | Form | Each entry binds as |
//! |------|---------------------|
//! | `A = value` | assignment to the field or property `A` |
//! | `A = { ... }` | a nested initializer against the value of `A` |
//! | `{ x, y }` / `x` | a call to `Add(x, y)` on the receiver |

use osprey_core::{BindError, DiagnosticBag, RefKind, Span, SpecialType, Symbol, Ty};
use osprey_symbols::{LookupOptions, LookupResultKind};
use osprey_syntax::{CollectionElement, Initializer, InitializerKind, InitializerValue, MemberInitializer};
use tracing::{debug, instrument, trace};

use super::arguments::AnalyzedArguments;
use super::convert::convert_implicit;
use super::invocation::bind_method_call_on;
use super::names::member_access;
use super::recovery::{make_bad, natural_type};
use super::value::{ValueKind, bind_value, check_value};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind};

/// The collection method a collection initializer element calls.
const ADD_METHOD: &str = "Add";

/// Bind an initializer for an object of type `ty`.
#[instrument(level = "trace", skip_all, fields(%ty))]
pub(crate) fn bind_initializer<'ast>(
    binder: &Binder<'_>,
    initializer: Initializer<'ast>,
    ty: &Ty,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let receiver = implicit_receiver(ty, initializer.span);
    bind_initializer_on(binder, initializer, receiver, diagnostics)
}

fn implicit_receiver<'ast>(ty: &Ty, span: Span) -> BoundExpr<'ast> {
    BoundExpr::typed(BoundKind::ImplicitReceiver, ty.clone(), span)
}

fn bind_initializer_on<'ast>(
    binder: &Binder<'_>,
    initializer: Initializer<'ast>,
    receiver: BoundExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let ty = receiver.ty_or_error();
    match initializer.kind {
        InitializerKind::Object(members) => {
            bind_object_initializer(binder, members, &receiver, &ty, initializer.span, diagnostics)
        }
        InitializerKind::Collection(elements) => {
            bind_collection_initializer(binder, elements, &receiver, &ty, initializer.span, diagnostics)
        }
    }
}

// ============================================================================
// Object initializers
// ============================================================================

fn bind_object_initializer<'ast>(
    binder: &Binder<'_>,
    members: &'ast [MemberInitializer<'ast>],
    receiver: &BoundExpr<'ast>,
    ty: &Ty,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let mut seen: Vec<&str> = Vec::with_capacity(members.len());
    let mut bound = Vec::with_capacity(members.len());

    for member in members {
        let name = member.name.name;
        let duplicate = seen.contains(&name);
        if duplicate {
            diagnostics.add(BindError::DuplicateInitializer {
                name: name.to_string(),
                span: member.name.span,
            });
        } else {
            seen.push(name);
        }
        let assignment = bind_member_initializer(binder, member, receiver, ty, diagnostics);
        bound.push(assignment.with_errors_if(duplicate));
    }

    trace!(members = bound.len(), "object initializer bound");
    BoundExpr::typed(BoundKind::ObjectInitializer { members: bound }, ty.clone(), span)
}

/// `Name = value` or `Name = { ... }`.
fn bind_member_initializer<'ast>(
    binder: &Binder<'_>,
    member: &'ast MemberInitializer<'ast>,
    receiver: &BoundExpr<'ast>,
    ty: &Ty,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let name_span = member.name.span;
    let target = match initialized_member(binder, ty, member.name.name, name_span, diagnostics) {
        Some(symbol) => member_access(symbol, Some(Box::new(receiver.clone())), name_span),
        None if ty.is_dynamic() => dynamic_member(receiver, member.name.name, name_span),
        None => {
            let value = bind_initializer_value(binder, member, diagnostics);
            return make_bad(binder, member.span, LookupResultKind::NotAVariable, Vec::new(), vec![value]);
        }
    };

    match &member.value {
        InitializerValue::Expr(value) => {
            let target = check_value(binder, target, ValueKind::AssignableVariable, diagnostics);
            let target_ty = target.ty_or_error();
            let value = bind_value(binder, value, ValueKind::ReadableValue, diagnostics);
            let value = if target_ty.is_dynamic() {
                natural_type(binder, value, diagnostics)
            } else {
                convert_implicit(binder, value, &target_ty, diagnostics)
            };
            assignment(target, value, member.span)
        }
        InitializerValue::Nested(nested) => {
            let target = check_value(binder, target, ValueKind::ReadableValue, diagnostics);
            let readonly_value = readonly_value_type_member(binder, &target);
            if readonly_value {
                diagnostics.add(BindError::ReadonlyValueTypeInitializer {
                    name: member.name.name.to_string(),
                    ty: target.display_type(),
                    span: name_span,
                });
            }
            let nested_receiver = BoundExpr {
                span: nested.span,
                ..target.clone()
            };
            let value = bind_initializer_on(binder, *nested, nested_receiver, diagnostics);
            assignment(target, value, member.span).with_errors_if(readonly_value)
        }
    }
}

/// Members of a `dynamic` object are found at runtime.
fn dynamic_member<'ast>(receiver: &BoundExpr<'ast>, name: &str, span: Span) -> BoundExpr<'ast> {
    BoundExpr::typed(
        BoundKind::DynamicMemberAccess {
            receiver: Box::new(receiver.clone()),
            name: name.into(),
            type_args: Vec::new(),
        },
        Ty::Dynamic,
        span,
    )
}

/// The value side of an initializer whose member could not be found, bound
/// for its own diagnostics.
fn bind_initializer_value<'ast>(
    binder: &Binder<'_>,
    member: &'ast MemberInitializer<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    match &member.value {
        InitializerValue::Expr(value) => bind_value(binder, value, ValueKind::ReadableValue, diagnostics),
        InitializerValue::Nested(nested) => bind_initializer(binder, *nested, &Ty::unknown(), diagnostics),
    }
}

/// Find the instance field or property `name` of `ty`.
fn initialized_member(
    binder: &Binder<'_>,
    ty: &Ty,
    name: &str,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> Option<Symbol> {
    if ty.is_dynamic() || ty.contains_error() {
        return None;
    }
    let found = binder
        .lookup()
        .lookup_members(ty, name, 0, LookupOptions::empty(), binder.within());
    if !found.is_viable() {
        match &found.error {
            Some(error) => diagnostics.add(error.at(span)),
            None => diagnostics.add(BindError::NoSuchMember {
                type_name: ty.to_string(),
                member: name.to_string(),
                span,
            }),
        }
        return None;
    }

    let symbol = found.single().cloned();
    match symbol {
        Some(symbol @ (Symbol::Field(_) | Symbol::Property(_))) if symbol.requires_instance() => Some(symbol),
        _ => {
            debug!(name, "member cannot be initialized");
            diagnostics.add(BindError::NotInitializable {
                name: name.to_string(),
                span,
            });
            None
        }
    }
}

/// A value-type member whose nested initializer would only modify a copy:
/// a readonly field, or any property.
fn readonly_value_type_member(binder: &Binder<'_>, target: &BoundExpr<'_>) -> bool {
    let symbols = binder.symbols();
    match &target.kind {
        BoundKind::FieldAccess { field, .. } => {
            field.def.is_readonly && symbols.is_value_type(&field.ty) && !binder.in_constructor_of(field.def.owner)
        }
        BoundKind::PropertyAccess { property, .. } => symbols.is_value_type(&property.ty),
        _ => false,
    }
}

fn assignment<'ast>(target: BoundExpr<'ast>, value: BoundExpr<'ast>, span: Span) -> BoundExpr<'ast> {
    let ty = target.ty_or_error();
    BoundExpr::typed(
        BoundKind::Assignment {
            target: Box::new(target),
            value: Box::new(value),
            op: None,
        },
        ty,
        span,
    )
}

// ============================================================================
// Collection initializers
// ============================================================================

fn bind_collection_initializer<'ast>(
    binder: &Binder<'_>,
    elements: &'ast [CollectionElement<'ast>],
    receiver: &BoundExpr<'ast>,
    ty: &Ty,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let enumerable = ty.is_dynamic()
        || ty.contains_error()
        || ty.is_special(SpecialType::IEnumerable)
        || binder
            .symbols()
            .is_subtype_of(ty, SpecialType::IEnumerable.type_hash());
    if !enumerable {
        diagnostics.add(BindError::CollectionInitializerNotEnumerable {
            ty: ty.to_string(),
            span,
        });
    }

    let mut adds = Vec::with_capacity(elements.len());
    for element in elements {
        let mut args = AnalyzedArguments::new();
        for value in element.args {
            let value = bind_value(binder, value, ValueKind::ReadableValue, diagnostics);
            args.push(value, None, RefKind::None);
        }
        let add = if !enumerable {
            let children = args.args;
            make_bad(binder, element.span, LookupResultKind::NotInvocable, Vec::new(), children)
        } else if ty.is_dynamic() {
            dynamic_add(receiver, args, element.span)
        } else {
            let receiver = BoundExpr {
                span: element.span,
                ..receiver.clone()
            };
            bind_method_call_on(binder, receiver, ADD_METHOD, args, element.span, diagnostics)
        };
        adds.push(add);
    }

    trace!(adds = adds.len(), enumerable, "collection initializer bound");
    BoundExpr::typed(BoundKind::CollectionInitializer { adds }, ty.clone(), span).with_errors_if(!enumerable)
}

fn dynamic_add<'ast>(receiver: &BoundExpr<'ast>, args: AnalyzedArguments<'ast>, span: Span) -> BoundExpr<'ast> {
    let names = args.names();
    let ref_kinds = args.ref_kinds();
    let callee = dynamic_member(receiver, ADD_METHOD, span);
    BoundExpr::typed(
        BoundKind::DynamicInvocation {
            callee: Box::new(callee),
            args: args.args,
            names,
            ref_kinds,
            applicable: Vec::new(),
        },
        Ty::Dynamic,
        span,
    )
}
