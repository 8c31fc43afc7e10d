//! Member access: `receiver.Name`.
//!
//! The receiver is bound first and its classification picks the path:
//!
//! | Receiver | Lookup |
//! |----------|--------|
//! | namespace | types and child namespaces |
//! | type | static members and nested types |
//! | type parameter | nothing; members are selected through values |
//! | `Color Color` | both; static members take the type, instance members the value |
//! | `dynamic` value | none, the access is bound at runtime |
//! | other value | instance members, then extension methods |
//!
//! ## Failure reporting
//!
//! One diagnostic per failed access, chosen in this order: the lookup's own
//! error (inaccessible, wrong arity, ambiguous, ...), a static/instance
//! mismatch, a non-value, and finally "no such member". When the member
//! would be found as an extension method in a well-known namespace that is
//! not imported, the "no such member" diagnostic names that namespace.

use osprey_core::{BindError, DiagnosticBag, MethodSymbol, NamespaceSymbol, Span, Symbol, Ty};
use osprey_symbols::{LookupOptions, LookupResult, LookupResultKind};
use osprey_syntax::{Expr, MemberExpr};
use tracing::{debug, instrument, trace};

use super::dispatch::bind_expression;
use super::names::{self, bind_type_args, construct_type, member_access};
use super::recovery::{make_bad, natural_type, resolve_to_type, resolve_to_value};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind};
use crate::conversion::ConversionKind;

/// The member being selected, shared by every receiver path.
struct Selection<'n> {
    name: &'n str,
    type_args: Vec<Ty>,
    invoked: bool,
    span: Span,
}

impl Selection<'_> {
    fn options(&self) -> LookupOptions {
        let mut options = LookupOptions::ALL_METHODS_ON_ARITY_ZERO;
        if self.invoked {
            options |= LookupOptions::MUST_BE_INVOCABLE;
        }
        options
    }
}

/// Bind `receiver.Name`.
///
/// With `invoked`, the access is the callee of an invocation, so only
/// invocable members are viable and extension methods are looked for when
/// none is found.
#[instrument(level = "trace", skip_all, fields(member = access.name.name, invoked = invoked))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_member_access<'ast>(
    binder: &Binder<'_>,
    access: &'ast MemberExpr<'ast>,
    invoked: bool,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let receiver = bind_receiver(binder, &access.receiver, diagnostics);
    let selection = Selection {
        name: access.name.name,
        type_args: bind_type_args(binder, access.type_args, diagnostics),
        invoked,
        span: access.span,
    };

    match &receiver.kind {
        BoundKind::NamespaceExpr(ns) => {
            let ns = ns.clone();
            bind_namespace_member(binder, ns, &selection, diagnostics)
        }
        BoundKind::TypeExpr => bind_type_member(binder, receiver, &selection, diagnostics),
        BoundKind::TypeOrValue { .. } => bind_color_color_member(binder, receiver, &selection, diagnostics),
        _ => bind_value_member(binder, receiver, &selection, diagnostics),
    }
}

// ============================================================================
// Receivers
// ============================================================================

/// Bind the left-hand side of `.`.
///
/// A bare identifier that names a value whose type has the same simple name
/// (`Color Color`) binds both ways; the member decides which one is kept.
fn bind_receiver<'ast>(
    binder: &Binder<'_>,
    receiver: &Expr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let Expr::Ident(ident) = *receiver else {
        return bind_expression(binder, receiver, diagnostics);
    };

    let mut value_diagnostics = DiagnosticBag::new();
    let value = names::bind_identifier(binder, &ident, false, &mut value_diagnostics);
    if ident.type_args.is_empty()
        && let Some(type_expr) = color_color_type(binder, &value, ident.ident.name)
    {
        trace!(name = ident.ident.name, "value or type receiver");
        let ty = value.ty.clone();
        return BoundExpr::new(
            BoundKind::TypeOrValue {
                value: Box::new(value),
                value_diagnostics,
                type_expr: Box::new(type_expr),
                type_diagnostics: DiagnosticBag::new(),
            },
            ty,
            ident.span,
        );
    }
    diagnostics.append(value_diagnostics);
    value
}

/// The type binding of `name` when `value` is a variable of that same type.
fn color_color_type<'ast>(binder: &Binder<'_>, value: &BoundExpr<'ast>, name: &str) -> Option<BoundExpr<'ast>> {
    let names_a_variable = matches!(
        value.kind,
        BoundKind::Local(_)
            | BoundKind::Parameter(_)
            | BoundKind::RangeVariable(_)
            | BoundKind::FieldAccess { .. }
            | BoundKind::PropertyAccess { .. }
    );
    if !names_a_variable || value.has_errors {
        return None;
    }
    let value_ty = value.ty.as_ref()?;
    if value_ty.simple_name() != Some(name) {
        return None;
    }
    let result = binder.lookup_name(name, 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
    match result.single() {
        Some(Symbol::NamedType(ty)) if ty == value_ty => Some(BoundExpr::type_expr(ty.clone(), value.span)),
        _ => None,
    }
}

// ============================================================================
// Namespace and type receivers
// ============================================================================

fn bind_namespace_member<'ast>(
    binder: &Binder<'_>,
    ns: NamespaceSymbol,
    selection: &Selection<'_>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let result = binder.lookup().lookup_in_namespace(
        ns.id,
        selection.name,
        selection.type_args.len(),
        LookupOptions::empty(),
    );
    if result.is_empty() {
        diagnostics.add(BindError::NoSuchNamespaceMember {
            namespace: ns.path.to_string(),
            member: selection.name.to_string(),
            span: selection.span,
        });
        let symbols = vec![Symbol::Namespace(ns)];
        return make_bad(binder, selection.span, LookupResultKind::Empty, symbols, Vec::new());
    }
    names::bind_namespace_member(binder, result, &selection.type_args, selection.span, diagnostics)
}

/// `Type.Name`: static members and nested types.
fn bind_type_member<'ast>(
    binder: &Binder<'_>,
    receiver: BoundExpr<'ast>,
    selection: &Selection<'_>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let ty = receiver.ty_or_error();
    if ty.is_error() {
        return make_bad(binder, selection.span, LookupResultKind::Empty, Vec::new(), vec![receiver]);
    }
    if let Ty::TypeParam(param) = &ty {
        diagnostics.add(BindError::TypeParameterMemberAccess {
            name: param.name.to_string(),
            member: selection.name.to_string(),
            span: selection.span,
        });
        return make_bad(binder, selection.span, LookupResultKind::NotAValue, Vec::new(), vec![receiver]);
    }

    let options = selection.options() | LookupOptions::MUST_NOT_BE_INSTANCE;
    let result = binder.lookup().lookup_members(
        &ty,
        selection.name,
        selection.type_args.len(),
        options,
        binder.within(),
    );
    if !result.is_viable() {
        report_failure(binder, &ty, &result, None, selection, diagnostics);
        return make_bad(binder, selection.span, result.kind, result.symbols, vec![receiver]);
    }
    bind_found_member(binder, receiver, result, selection, diagnostics)
}

/// `Color.Member` where `Color` is both a variable and its type.
///
/// Field, property and event selections settle the receiver now. Method
/// groups keep both bindings: overload resolution picks the method, and a
/// static method takes the type while an instance method takes the value.
fn bind_color_color_member<'ast>(
    binder: &Binder<'_>,
    receiver: BoundExpr<'ast>,
    selection: &Selection<'_>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let ty = receiver.ty_or_error();
    let result = binder.lookup().lookup_members(
        &ty,
        selection.name,
        selection.type_args.len(),
        selection.options(),
        binder.within(),
    );

    if result.is_viable() && result.is_method_group() {
        return method_group(receiver, result, selection, false);
    }
    let wants_type = result
        .single()
        .is_some_and(|symbol| matches!(symbol, Symbol::NamedType(_)) || !symbol.requires_instance());
    if wants_type {
        let type_receiver = resolve_to_type(receiver, diagnostics);
        bind_found_member(binder, type_receiver, result, selection, diagnostics)
    } else {
        let value = resolve_to_value(receiver, diagnostics);
        bind_value_member(binder, value, selection, diagnostics)
    }
}

// ============================================================================
// Value receivers
// ============================================================================

/// `value.Name`: instance members, then extension methods.
fn bind_value_member<'ast>(
    binder: &Binder<'_>,
    receiver: BoundExpr<'ast>,
    selection: &Selection<'_>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    if let Some(what) = unusable_receiver(&receiver) {
        diagnostics.add(BindError::BadMemberAccessReceiver {
            what: what.to_string(),
            span: selection.span,
        });
        let receiver = natural_type(binder, receiver, &mut DiagnosticBag::discarding());
        return make_bad(binder, selection.span, LookupResultKind::NotAValue, Vec::new(), vec![receiver]);
    }

    let receiver = natural_type(binder, receiver, diagnostics);
    let ty = receiver.ty_or_error();
    if ty.is_dynamic() {
        return BoundExpr::typed(
            BoundKind::DynamicMemberAccess {
                receiver: Box::new(receiver),
                name: selection.name.into(),
                type_args: selection.type_args.clone(),
            },
            Ty::Dynamic,
            selection.span,
        );
    }
    if ty.contains_error() {
        return make_bad(binder, selection.span, LookupResultKind::Empty, Vec::new(), vec![receiver]);
    }
    if ty.is_unsafe() {
        diagnostics.add(BindError::BadMemberAccessReceiver {
            what: format!("operand of type '{ty}'"),
            span: selection.span,
        });
        return make_bad(binder, selection.span, LookupResultKind::NotAValue, Vec::new(), vec![receiver]);
    }

    let mut options = selection.options();
    if matches!(receiver.kind, BoundKind::BaseReference) {
        options |= LookupOptions::USE_BASE_REFERENCE_ACCESSIBILITY;
    }
    let result = binder.lookup().lookup_members(
        &ty,
        selection.name,
        selection.type_args.len(),
        options,
        binder.within(),
    );

    if result.is_viable() {
        if let Some(symbol) = result.single()
            && !matches!(symbol, Symbol::Method(_))
            && !symbol.requires_instance()
        {
            debug!(member = selection.name, "static member through an instance");
            diagnostics.add(BindError::InstanceAccessToStatic {
                member: selection.name.to_string(),
                type_name: ty.to_string(),
                span: selection.span,
            });
            let symbols = result.symbols;
            return make_bad(binder, selection.span, LookupResultKind::StaticInstanceMismatch, symbols, vec![receiver]);
        }
        return bind_found_member(binder, receiver, result, selection, diagnostics);
    }

    let extensions = lookup_extension_methods(binder, &ty, selection.name, selection.type_args.len());
    match extensions {
        ExtensionLookup::Found(methods) => {
            trace!(member = selection.name, count = methods.len(), "extension methods");
            let result = LookupResult::viable(methods.into_iter().map(Symbol::Method).collect());
            method_group(receiver, result, selection, true)
        }
        ExtensionLookup::Inapplicable(methods) => {
            let ordinary_wins = !result.is_empty() && result.kind >= LookupResultKind::OverloadResolutionFailure;
            if ordinary_wins {
                report_failure(binder, &ty, &result, Some(&receiver), selection, diagnostics);
                return make_bad(binder, selection.span, result.kind, result.symbols, vec![receiver]);
            }
            let expected = methods
                .first()
                .and_then(|m| m.params.first())
                .map_or_else(String::new, |p| p.ty.to_string());
            diagnostics.add(BindError::ExtensionReceiverMismatch {
                type_name: ty.to_string(),
                member: selection.name.to_string(),
                receiver: expected,
                span: selection.span,
            });
            let symbols = methods.into_iter().map(Symbol::Method).collect();
            make_bad(
                binder,
                selection.span,
                LookupResultKind::OverloadResolutionFailure,
                symbols,
                vec![receiver],
            )
        }
        ExtensionLookup::None => {
            report_failure(binder, &ty, &result, Some(&receiver), selection, diagnostics);
            make_bad(binder, selection.span, result.kind, result.symbols, vec![receiver])
        }
    }
}

/// Receivers `.` cannot be applied to, described for the diagnostic.
fn unusable_receiver(receiver: &BoundExpr<'_>) -> Option<&'static str> {
    match &receiver.kind {
        BoundKind::UnboundLambda(_) | BoundKind::Lambda { .. } => Some("lambda expression"),
        BoundKind::MethodGroup { .. } => Some("method group"),
        BoundKind::DefaultLiteral => Some("default literal"),
        _ if receiver.is_null_literal() => Some("<null>"),
        _ if receiver.ty.as_ref().is_some_and(Ty::is_void) => Some("operand of type 'void'"),
        _ => None,
    }
}

// ============================================================================
// Results
// ============================================================================

/// Wrap a viable lookup result found through `receiver`.
fn bind_found_member<'ast>(
    binder: &Binder<'_>,
    receiver: BoundExpr<'ast>,
    result: LookupResult,
    selection: &Selection<'_>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    if result.is_method_group() {
        return method_group(receiver, result, selection, false);
    }
    let Some(symbol) = result.symbols.into_iter().next() else {
        return make_bad(binder, selection.span, LookupResultKind::Empty, Vec::new(), vec![receiver]);
    };
    match symbol {
        Symbol::NamedType(ty) => {
            BoundExpr::type_expr(construct_type(binder, ty, &selection.type_args), selection.span)
        }
        Symbol::Field(_) | Symbol::Property(_) | Symbol::Event(_) => {
            let receiver = (symbol.requires_instance() && !receiver.is_type()).then(|| Box::new(receiver));
            member_access(symbol, receiver, selection.span)
        }
        other => {
            diagnostics.add(BindError::NotAValue {
                name: other.name(),
                kind: other.kind().to_string(),
                span: selection.span,
            });
            make_bad(binder, selection.span, LookupResultKind::NotAValue, vec![other], vec![receiver])
        }
    }
}

fn method_group<'ast>(
    receiver: BoundExpr<'ast>,
    result: LookupResult,
    selection: &Selection<'_>,
    extension: bool,
) -> BoundExpr<'ast> {
    let methods = result
        .symbols
        .into_iter()
        .filter_map(|symbol| match symbol {
            Symbol::Method(method) => Some(method),
            _ => None,
        })
        .collect();
    BoundExpr::new(
        BoundKind::MethodGroup {
            receiver: Some(Box::new(receiver)),
            name: selection.name.into(),
            methods,
            type_args: selection.type_args.clone(),
            result_kind: LookupResultKind::Viable,
            extension,
        },
        None,
        selection.span,
    )
}

/// Report a failed member lookup.
fn report_failure(
    binder: &Binder<'_>,
    container: &Ty,
    result: &LookupResult,
    receiver: Option<&BoundExpr<'_>>,
    selection: &Selection<'_>,
    diagnostics: &mut DiagnosticBag,
) {
    let span = selection.span;
    debug!(member = selection.name, %container, kind = ?result.kind, "member lookup failed");
    let error = if let Some(error) = &result.error {
        error.at(span)
    } else if result.kind == LookupResultKind::StaticInstanceMismatch {
        BindError::InstanceAccessToStatic {
            member: selection.name.to_string(),
            type_name: container.to_string(),
            span,
        }
    } else if result.kind == LookupResultKind::NotAValue {
        BindError::NotAValue {
            name: selection.name.to_string(),
            kind: "member".to_string(),
            span,
        }
    } else {
        match receiver.and_then(|r| missing_using_hint(binder, &r.ty_or_error(), selection)) {
            Some(namespace) => BindError::NoSuchMemberNeedsUsing {
                type_name: container.to_string(),
                member: selection.name.to_string(),
                namespace,
                span,
            },
            None => BindError::NoSuchMember {
                type_name: container.to_string(),
                member: selection.name.to_string(),
                span,
            },
        }
    };
    diagnostics.add(error);
}

/// A well-known namespace that would supply an applicable extension method.
fn missing_using_hint(binder: &Binder<'_>, receiver: &Ty, selection: &Selection<'_>) -> Option<String> {
    let in_scope = binder.namespace_scopes();
    binder
        .options()
        .well_known_extension_namespaces
        .iter()
        .find(|path| {
            binder.lookup().namespace_by_path(path).is_some_and(|ns| {
                !in_scope.contains(&ns.id)
                    && binder
                        .lookup()
                        .extension_methods(ns.id, selection.name, selection.type_args.len())
                        .iter()
                        .any(|method| extension_receiver_applies(binder, receiver, method))
            })
        })
        .cloned()
}

// ============================================================================
// Extension methods
// ============================================================================

/// Extension methods found for a receiver.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExtensionLookup {
    /// The nearest scope with a method the receiver can be passed to.
    Found(Vec<MethodSymbol>),
    /// Methods with the name exist, none accepts the receiver.
    Inapplicable(Vec<MethodSymbol>),
    None,
}

/// Walk the enclosing extension scopes, nearest first, and stop at the
/// first one offering a method whose `this` parameter accepts `receiver`.
pub(crate) fn lookup_extension_methods(
    binder: &Binder<'_>,
    receiver: &Ty,
    name: &str,
    arity: usize,
) -> ExtensionLookup {
    let mut inapplicable: Vec<MethodSymbol> = Vec::new();
    for ns in binder.namespace_scopes() {
        let methods = binder.lookup().extension_methods(ns, name, arity);
        if methods.is_empty() {
            continue;
        }
        let (applicable, rejected): (Vec<_>, Vec<_>) = methods
            .into_iter()
            .partition(|method| extension_receiver_applies(binder, receiver, method));
        if !applicable.is_empty() {
            return ExtensionLookup::Found(applicable);
        }
        for method in rejected {
            if !inapplicable.contains(&method) {
                inapplicable.push(method);
            }
        }
    }
    if inapplicable.is_empty() {
        ExtensionLookup::None
    } else {
        ExtensionLookup::Inapplicable(inapplicable)
    }
}

/// Whether `receiver` can be passed as the `this` argument of `method`:
/// identity, reference or boxing conversions only.
pub(crate) fn extension_receiver_applies(binder: &Binder<'_>, receiver: &Ty, method: &MethodSymbol) -> bool {
    let Some(first) = method.params.first() else {
        return false;
    };
    if matches!(first.ty, Ty::TypeParam(_)) {
        return true;
    }
    let conversion = binder.conversions().classify(binder.symbols(), receiver, &first.ty);
    matches!(
        conversion.kind,
        ConversionKind::Identity
            | ConversionKind::ImplicitReference
            | ConversionKind::Boxing
            | ConversionKind::ErrorType
    )
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

    fn first_error(diagnostics: &DiagnosticBag) -> Option<&BindError> {
        diagnostics.iter().next().map(|d| &d.error)
    }

    #[test]
    fn instance_members_through_a_value() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("item", fx.ty("Shop.Item"));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.member(b.ident("item"), "Name"));
        let BoundKind::FieldAccess { receiver: Some(receiver), .. } = &bound.kind else {
            panic!("expected a field access, got {:?}", bound.kind);
        };
        assert!(matches!(receiver.kind, BoundKind::Local(_)));
        assert_eq!(bound.ty, Some(Ty::STRING));
        assert!(diagnostics.is_empty());

        let (bound, _) = bind(&fx, &ctx, &b.member(b.ident("item"), "Title"));
        assert!(matches!(bound.kind, BoundKind::PropertyAccess { .. }));

        let (bound, _) = bind(&fx, &ctx, &b.member(b.ident("item"), "Changed"));
        assert!(matches!(bound.kind, BoundKind::EventAccess { .. }));
    }

    #[test]
    fn static_members_through_the_type() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.member(b.ident("Item"), "Count"));
        assert!(matches!(bound.kind, BoundKind::FieldAccess { receiver: None, .. }));
        assert!(diagnostics.is_empty());

        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.member(b.ident("Item"), "Name"));
        assert!(bound.has_errors);
        assert_eq!(diagnostics.count_of(ErrorKind::StaticInstanceMismatch), 1);
    }

    #[test]
    fn static_members_through_an_instance_are_reported() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("item", fx.ty("Shop.Item"));
        let (bound, diagnostics) = bind(&fx, &ctx, &b.member(b.ident("item"), "Count"));
        assert!(bound.has_errors);
        assert!(matches!(first_error(&diagnostics), Some(BindError::InstanceAccessToStatic { .. })));
    }

    #[test]
    fn missing_and_inaccessible_members() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("item", fx.ty("Shop.Item"));

        let (bound, diagnostics) = bind(&fx, &ctx, &b.member(b.ident("item"), "Nope"));
        assert!(matches!(bound.kind, BoundKind::BadExpression { .. }));
        assert!(matches!(first_error(&diagnostics), Some(BindError::NoSuchMember { .. })));

        let (_, diagnostics) = bind(&fx, &ctx, &b.member(b.ident("item"), "serial"));
        assert_eq!(diagnostics.count_of(ErrorKind::Inaccessible), 1);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn color_color_static_member_uses_the_type() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.member(b.ident("Color"), "Red"));
        assert!(matches!(bound.kind, BoundKind::FieldAccess { receiver: None, .. }));
        assert_eq!(bound.ty, Some(fx.ty("Shop.Color")));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn color_color_instance_member_uses_the_value() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.member(b.ident("Color"), "Brightness"));
        let BoundKind::PropertyAccess { receiver: Some(receiver), .. } = &bound.kind else {
            panic!("expected a property access, got {:?}", bound.kind);
        };
        assert!(matches!(receiver.kind, BoundKind::FieldAccess { .. }));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn color_color_method_groups_defer_the_choice() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, _) = bind(&fx, &fx.context(), &b.member(b.ident("Color"), "Darken"));
        let BoundKind::MethodGroup { receiver: Some(receiver), .. } = &bound.kind else {
            panic!("expected a method group, got {:?}", bound.kind);
        };
        assert!(matches!(receiver.kind, BoundKind::TypeOrValue { .. }));
    }

    #[test]
    fn namespace_members() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.dotted("System.Linq"));
        assert!(matches!(bound.kind, BoundKind::NamespaceExpr(_)));
        assert!(diagnostics.is_empty());

        let (bound, _) = bind(&fx, &fx.context(), &b.dotted("Shop.Item"));
        assert!(bound.is_type());

        let (_, diagnostics) = bind(&fx, &fx.context(), &b.dotted("System.Nothing"));
        assert!(matches!(first_error(&diagnostics), Some(BindError::NoSuchNamespaceMember { .. })));
    }

    #[test]
    fn dynamic_receivers_skip_lookup() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("d", Ty::Dynamic);
        let (bound, diagnostics) = bind(&fx, &ctx, &b.member(b.ident("d"), "Anything"));
        assert!(matches!(bound.kind, BoundKind::DynamicMemberAccess { .. }));
        assert_eq!(bound.ty, Some(Ty::Dynamic));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn extension_methods_are_found_in_enclosing_scopes() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("text", Ty::STRING);
        let (bound, diagnostics) = bind(&fx, &ctx, &b.member(b.ident("text"), "Shout"));
        assert!(matches!(bound.kind, BoundKind::MethodGroup { extension: true, .. }));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn extension_receiver_must_convert() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("n", Ty::INT);
        let (bound, diagnostics) = bind(&fx, &ctx, &b.member(b.ident("n"), "Shout"));
        assert!(bound.has_errors);
        assert!(matches!(first_error(&diagnostics), Some(BindError::ExtensionReceiverMismatch { .. })));
    }

    #[test]
    fn missing_using_is_suggested() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_local("items", Ty::Special(SpecialType::IEnumerable));
        let (_, diagnostics) = bind(&fx, &ctx, &b.member(b.ident("items"), "Count"));
        let Some(BindError::NoSuchMemberNeedsUsing { namespace, .. }) = first_error(&diagnostics) else {
            panic!("expected a using hint, got {diagnostics:?}");
        };
        assert_eq!(namespace, "System.Linq");
    }

    #[test]
    fn type_parameters_have_no_static_members() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_type_param("T", false);
        let (bound, diagnostics) = bind(&fx, &ctx, &b.member(b.ident("T"), "Create"));
        assert!(bound.has_errors);
        assert!(matches!(first_error(&diagnostics), Some(BindError::TypeParameterMemberAccess { .. })));
    }

    #[test]
    fn null_receivers_are_rejected() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = bind(&fx, &fx.context(), &b.member(b.null(), "Length"));
        assert!(bound.has_errors);
        assert_eq!(diagnostics.count_of(ErrorKind::InvalidContext), 1);
    }
}
