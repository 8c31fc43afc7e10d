//! Simple names, `this`, `base` and `alias::Name`.
//!
//! This module handles:
//! - Simple-name lookup through the binder chain, with locals used before
//!   their declaration reported
//! - Implicit `this` receivers for instance members named without one
//! - Method groups found by simple name
//! - `global::` and alias-qualified names

use std::rc::Rc;

use osprey_core::{AliasTarget, BindError, DiagnosticBag, Span, Symbol, Ty};
use osprey_symbols::{LookupOptions, LookupResult, LookupResultKind};
use osprey_syntax::{AliasQualifiedExpr, IdentExpr, TypeExpr};
use tracing::{debug, instrument, trace};

use super::recovery::make_bad;
use crate::binder::{Binder, BinderFlags};
use crate::bound::{BoundExpr, BoundKind};
use crate::type_binding::{alias_namespace, bind_type};

/// Bind a simple name.
///
/// With `invoked`, the name is the callee of an invocation and only
/// invocable symbols are viable.
#[instrument(level = "trace", skip_all, fields(name = ident.ident.name, invoked))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_identifier<'ast>(
    binder: &Binder<'_>,
    ident: &IdentExpr<'ast>,
    invoked: bool,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let name = ident.ident.name;
    let span = ident.span;
    let type_args = bind_type_args(binder, ident.type_args, diagnostics);

    let mut options = LookupOptions::ALL_METHODS_ON_ARITY_ZERO;
    if invoked {
        options |= LookupOptions::MUST_BE_INVOCABLE;
    }
    let result = binder.lookup_name(name, type_args.len(), options);

    if result.is_empty() {
        diagnostics.add(BindError::UndefinedName {
            name: name.to_string(),
            span,
        });
        return make_bad(binder, span, LookupResultKind::Empty, Vec::new(), Vec::new());
    }
    if !result.is_viable() {
        debug!(name, kind = ?result.kind, "simple name not viable");
        if let Some(error) = &result.error {
            diagnostics.add(error.at(span));
        }
        return make_bad(binder, span, result.kind, result.symbols, Vec::new());
    }

    if result.is_method_group() {
        let receiver = (!binder.is_static_context()).then(|| Box::new(implicit_this(binder, span)));
        let methods = result
            .symbols
            .into_iter()
            .filter_map(|symbol| match symbol {
                Symbol::Method(method) => Some(method),
                _ => None,
            })
            .collect();
        return BoundExpr::new(
            BoundKind::MethodGroup {
                receiver,
                name: name.into(),
                methods,
                type_args,
                result_kind: LookupResultKind::Viable,
                extension: false,
            },
            None,
            span,
        );
    }

    match result.symbols.into_iter().next() {
        Some(symbol) => bind_symbol(binder, symbol, &type_args, span, diagnostics),
        None => make_bad(binder, span, LookupResultKind::Empty, Vec::new(), Vec::new()),
    }
}

/// Turn a single viable non-method symbol found by simple name into a node.
fn bind_symbol<'ast>(
    binder: &Binder<'_>,
    symbol: Symbol,
    type_args: &[Ty],
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    match symbol {
        Symbol::Local(local) => {
            let declared_type = match &local.ty {
                Some(ty) if !span.starts_before(&local.declared_at) => Some(ty.clone()),
                _ => None,
            };
            match declared_type {
                Some(ty) => BoundExpr::typed(BoundKind::Local(local), ty, span),
                None => {
                    trace!(name = %local.name, "local used before its declaration");
                    diagnostics.add(BindError::UsedBeforeDeclaration {
                        name: local.name.to_string(),
                        span,
                    });
                    make_bad(binder, span, LookupResultKind::NotAValue, vec![Symbol::Local(local)], Vec::new())
                }
            }
        }
        Symbol::Parameter(param) => {
            let ty = param.ty.clone();
            BoundExpr::typed(BoundKind::Parameter(param), ty, span)
        }
        Symbol::RangeVariable(range) => {
            let ty = range.ty.clone();
            BoundExpr::typed(BoundKind::RangeVariable(range), ty, span)
        }
        Symbol::Field(_) | Symbol::Property(_) | Symbol::Event(_) => {
            bind_member_symbol(binder, symbol, span, diagnostics)
        }
        Symbol::NamedType(ty) => BoundExpr::type_expr(construct_type(binder, ty, type_args), span),
        Symbol::TypeParameter(ty) => BoundExpr::type_expr(ty, span),
        Symbol::Namespace(ns) => BoundExpr::new(BoundKind::NamespaceExpr(ns), None, span),
        Symbol::Alias(alias) => match &alias.target {
            AliasTarget::Namespace(ns) => BoundExpr::new(BoundKind::NamespaceExpr(ns.clone()), None, span),
            AliasTarget::Type(ty) => BoundExpr::type_expr(ty.clone(), span),
        },
        Symbol::Method(_) | Symbol::Label(_) => {
            diagnostics.add(BindError::NotAValue {
                name: symbol.name(),
                kind: symbol.kind().to_string(),
                span,
            });
            make_bad(binder, span, LookupResultKind::NotAValue, vec![symbol], Vec::new())
        }
    }
}

/// A field, property or event named without a receiver.
///
/// Instance members get an implicit `this`; in a static context they are
/// reported (except as the operand of `nameof`) and bound without one.
fn bind_member_symbol<'ast>(
    binder: &Binder<'_>,
    symbol: Symbol,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let needs_instance = symbol.requires_instance();
    let mut missing_instance = false;
    let receiver = if !needs_instance {
        None
    } else if binder.is_static_context() {
        if !binder.flags().contains(BinderFlags::NAMEOF_ARGUMENT) {
            diagnostics.add(BindError::ObjectRequired {
                member: symbol.name(),
                span,
            });
            missing_instance = true;
        }
        None
    } else {
        Some(Box::new(implicit_this(binder, span)))
    };

    member_access(symbol, receiver, span).with_errors_if(missing_instance)
}

/// Build the access node for a field, property or event symbol.
pub(crate) fn member_access<'ast>(
    symbol: Symbol,
    receiver: Option<Box<BoundExpr<'ast>>>,
    span: Span,
) -> BoundExpr<'ast> {
    match symbol {
        Symbol::Field(field) => {
            let ty = field.ty.clone();
            BoundExpr::typed(BoundKind::FieldAccess { receiver, field }, ty, span)
        }
        Symbol::Property(property) => {
            let ty = property.ty.clone();
            BoundExpr::typed(BoundKind::PropertyAccess { receiver, property }, ty, span)
        }
        Symbol::Event(event) => {
            let ty = event.ty.clone();
            BoundExpr::typed(BoundKind::EventAccess { receiver, event }, ty, span)
        }
        other => {
            let ty = other.value_type().unwrap_or_else(Ty::unknown);
            BoundExpr::typed(
                BoundKind::BadExpression {
                    result_kind: LookupResultKind::NotAValue,
                    symbols: vec![other],
                    children: receiver.into_iter().map(|r| *r).collect(),
                },
                ty,
                span,
            )
            .with_errors()
        }
    }
}

/// The `this` a member named without a receiver is accessed through.
pub(crate) fn implicit_this<'ast>(binder: &Binder<'_>, span: Span) -> BoundExpr<'ast> {
    let ty = binder.containing_type().cloned().unwrap_or_else(Ty::unknown);
    BoundExpr::typed(BoundKind::This { implicit: true }, ty, span)
}

/// `this`.
pub fn bind_this<'ast>(binder: &Binder<'_>, span: Span, diagnostics: &mut DiagnosticBag) -> BoundExpr<'ast> {
    let ty = binder.containing_type().cloned().unwrap_or_else(Ty::unknown);
    let unavailable = binder.is_static_context();
    if unavailable {
        diagnostics.add(BindError::ThisInStaticContext { span });
    }
    BoundExpr::typed(BoundKind::This { implicit: false }, ty, span).with_errors_if(unavailable)
}

/// `base`: the containing type's base class.
pub fn bind_base<'ast>(binder: &Binder<'_>, span: Span, diagnostics: &mut DiagnosticBag) -> BoundExpr<'ast> {
    let base = binder
        .containing_type()
        .and_then(|container| binder.symbols().base_type(container));
    let Some(base) = base else {
        diagnostics.add(BindError::BaseUnavailable { span });
        return BoundExpr::typed(BoundKind::BaseReference, Ty::unknown(), span).with_errors();
    };
    let unavailable = binder.is_static_context();
    if unavailable {
        diagnostics.add(BindError::ThisInStaticContext { span });
    }
    BoundExpr::typed(BoundKind::BaseReference, base, span).with_errors_if(unavailable)
}

/// `alias::Name` and `global::Name`.
pub fn bind_alias_qualified<'ast>(
    binder: &Binder<'_>,
    qualified: &'ast AliasQualifiedExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = qualified.span;
    let Some(ns) = alias_namespace(binder, qualified.alias, diagnostics) else {
        return make_bad(binder, span, LookupResultKind::Empty, Vec::new(), Vec::new());
    };
    let type_args = bind_type_args(binder, qualified.type_args, diagnostics);
    let name = qualified.name.name;
    let result = binder
        .lookup()
        .lookup_in_namespace(ns.id, name, type_args.len(), LookupOptions::empty());
    if result.is_empty() {
        diagnostics.add(BindError::NoSuchNamespaceMember {
            namespace: ns.path.to_string(),
            member: name.to_string(),
            span,
        });
        return make_bad(binder, span, LookupResultKind::Empty, vec![Symbol::Namespace(ns)], Vec::new());
    }
    bind_namespace_member(binder, result, &type_args, span, diagnostics)
}

/// A viable or failed lookup inside a namespace, as a node.
pub(crate) fn bind_namespace_member<'ast>(
    binder: &Binder<'_>,
    result: LookupResult,
    type_args: &[Ty],
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    if !result.is_viable() {
        if let Some(error) = &result.error {
            diagnostics.add(error.at(span));
        }
        return make_bad(binder, span, result.kind, result.symbols, Vec::new());
    }
    match result.symbols.into_iter().next() {
        Some(Symbol::NamedType(ty)) => BoundExpr::type_expr(construct_type(binder, ty, type_args), span),
        Some(Symbol::Namespace(ns)) => BoundExpr::new(BoundKind::NamespaceExpr(ns), None, span),
        Some(other) => {
            diagnostics.add(BindError::NotAValue {
                name: other.name(),
                kind: other.kind().to_string(),
                span,
            });
            make_bad(binder, span, LookupResultKind::NotAValue, vec![other], Vec::new())
        }
        None => make_bad(binder, span, LookupResultKind::Empty, Vec::new(), Vec::new()),
    }
}

/// Apply written type arguments to a generic type definition.
pub(crate) fn construct_type(binder: &Binder<'_>, ty: Ty, type_args: &[Ty]) -> Ty {
    if type_args.is_empty() {
        return ty;
    }
    match binder.symbols().def_of(&ty) {
        Some(def) => def.construct(type_args.to_vec()),
        None => ty,
    }
}

pub(crate) fn bind_type_args(
    binder: &Binder<'_>,
    type_args: &[TypeExpr<'_>],
    diagnostics: &mut DiagnosticBag,
) -> Vec<Ty> {
    type_args.iter().map(|arg| bind_type(binder, arg, diagnostics)).collect()
}

/// Names used for `nameof` results and diagnostics.
pub(crate) fn simple_name_of(name: &str) -> Rc<str> {
    Rc::from(name.rsplit('.').next().unwrap_or(name))
}
