//! Binding type syntax to [`Ty`].
//!
//! Type references appear inside expressions (`new T()`, casts, `typeof`,
//! `default(T)`, lambda parameters). Names are resolved through the binder
//! chain with namespace-or-type lookups; failures are reported and yield an
//! error type carrying the written name, so binding always continues.

use std::rc::Rc;

use osprey_core::{
    AliasTarget, BindError, DiagnosticBag, FunctionPointerTy, MessageId, NamespaceSymbol, Symbol,
    Ty,
};
use osprey_symbols::{LookupOptions, LookupResult};
use osprey_syntax::{Ident, NamedTypeExpr, TypeExpr, TypeSegment};
use tracing::trace;

use crate::binder::Binder;

/// Bind a type reference, reporting problems into `diagnostics`.
pub fn bind_type(binder: &Binder<'_>, ty: &TypeExpr<'_>, diagnostics: &mut DiagnosticBag) -> Ty {
    bind_type_reporting(binder, ty, diagnostics).0
}

/// Bind a type reference, also returning whether an error was reported.
pub(crate) fn bind_type_reporting(
    binder: &Binder<'_>,
    ty: &TypeExpr<'_>,
    diagnostics: &mut DiagnosticBag,
) -> (Ty, bool) {
    let mut local = DiagnosticBag::new();
    let bound = bind(binder, ty, &mut local);
    let had_errors = local.has_errors();
    diagnostics.append(local);
    (bound, had_errors)
}

fn bind(binder: &Binder<'_>, ty: &TypeExpr<'_>, diagnostics: &mut DiagnosticBag) -> Ty {
    match ty {
        TypeExpr::Predefined { special, .. } => Ty::Special(*special),
        TypeExpr::Dynamic(_) => Ty::Dynamic,
        TypeExpr::Array { element, rank, .. } => Ty::array(bind(binder, element, diagnostics), *rank),
        TypeExpr::Pointer { pointee, span } => {
            let pointee = bind(binder, pointee, diagnostics);
            if !binder.in_unsafe_context() {
                diagnostics.add(BindError::UnsafeNeeded { span: *span });
            }
            Ty::pointer(pointee)
        }
        TypeExpr::FunctionPointer {
            params,
            return_type,
            span,
        } => {
            let params = params.iter().map(|p| bind(binder, p, diagnostics)).collect();
            let return_type = bind(binder, return_type, diagnostics);
            if !binder.in_unsafe_context() {
                diagnostics.add(BindError::UnsafeNeeded { span: *span });
            }
            Ty::FunctionPointer(Rc::new(FunctionPointerTy {
                params,
                return_type,
            }))
        }
        TypeExpr::Tuple { elements, span } => {
            binder.check_feature(MessageId::Tuples, *span, diagnostics);
            let types = elements
                .iter()
                .map(|e| bind(binder, &e.ty, diagnostics))
                .collect();
            let names = elements
                .iter()
                .map(|e| e.name.map(|name| Rc::from(name.name)))
                .collect();
            Ty::tuple(types, names)
        }
        TypeExpr::Named(named) => {
            let bound = bind_named(binder, named, diagnostics)
                .unwrap_or_else(|| Ty::error(named.display_name()));
            trace!(name = %named.display_name(), ty = %bound, "type reference bound");
            bound
        }
    }
}

// ============================================================================
// Named types
// ============================================================================

fn bind_named(
    binder: &Binder<'_>,
    named: &NamedTypeExpr<'_>,
    diagnostics: &mut DiagnosticBag,
) -> Option<Ty> {
    let (first, rest) = named.segments.split_first()?;

    let mut current = match named.alias {
        Some(alias) => {
            let ns = alias_namespace(binder, alias, diagnostics)?;
            let symbol = Symbol::Namespace(ns);
            resolve_segment(binder, &symbol, first, diagnostics)?
        }
        None => {
            let name = first.ident.name;
            let result =
                binder.lookup_name(name, first.type_args.len(), LookupOptions::NAMESPACES_OR_TYPES_ONLY);
            let symbol = expect_single(result, first.ident, diagnostics, |span| {
                BindError::UndefinedName {
                    name: name.to_string(),
                    span,
                }
            })?;
            finish_symbol(binder, symbol, first, diagnostics)
        }
    };

    for segment in rest {
        current = resolve_segment(binder, &current, segment, diagnostics)?;
    }

    match current {
        Symbol::NamedType(ty) | Symbol::TypeParameter(ty) => Some(ty),
        other => {
            diagnostics.add(BindError::NotAType {
                name: named.display_name(),
                kind: other.kind().to_string(),
                span: named.span,
            });
            None
        }
    }
}

/// Resolve `segment` inside the namespace or type `container`.
fn resolve_segment(
    binder: &Binder<'_>,
    container: &Symbol,
    segment: &TypeSegment<'_>,
    diagnostics: &mut DiagnosticBag,
) -> Option<Symbol> {
    let name = segment.ident.name;
    let arity = segment.type_args.len();
    let options = LookupOptions::NAMESPACES_OR_TYPES_ONLY;
    let symbol = match container {
        Symbol::Namespace(ns) => {
            let result = binder.lookup().lookup_in_namespace(ns.id, name, arity, options);
            expect_single(result, segment.ident, diagnostics, |span| {
                BindError::NoSuchNamespaceMember {
                    namespace: ns.path.to_string(),
                    member: name.to_string(),
                    span,
                }
            })?
        }
        Symbol::NamedType(ty) => {
            let result = binder
                .lookup()
                .lookup_members(ty, name, arity, options, binder.within());
            expect_single(result, segment.ident, diagnostics, |span| BindError::NoSuchMember {
                type_name: ty.to_string(),
                member: name.to_string(),
                span,
            })?
        }
        other => {
            diagnostics.add(BindError::NotAType {
                name: other.name(),
                kind: other.kind().to_string(),
                span: segment.ident.span,
            });
            return None;
        }
    };
    Some(finish_symbol(binder, symbol, segment, diagnostics))
}

/// Apply type arguments and see through aliases.
fn finish_symbol(
    binder: &Binder<'_>,
    symbol: Symbol,
    segment: &TypeSegment<'_>,
    diagnostics: &mut DiagnosticBag,
) -> Symbol {
    match symbol {
        Symbol::Alias(alias) => match &alias.target {
            AliasTarget::Namespace(ns) => Symbol::Namespace(ns.clone()),
            AliasTarget::Type(ty) => Symbol::NamedType(ty.clone()),
        },
        Symbol::NamedType(ty) if !segment.type_args.is_empty() => {
            let args: Vec<Ty> = segment
                .type_args
                .iter()
                .map(|arg| bind(binder, arg, diagnostics))
                .collect();
            match binder.symbols().def_of(&ty) {
                Some(def) => Symbol::NamedType(def.construct(args)),
                None => Symbol::NamedType(ty),
            }
        }
        other => other,
    }
}

fn expect_single(
    result: LookupResult,
    ident: Ident<'_>,
    diagnostics: &mut DiagnosticBag,
    on_empty: impl FnOnce(osprey_core::Span) -> BindError,
) -> Option<Symbol> {
    if result.is_empty() {
        diagnostics.add(on_empty(ident.span));
        return None;
    }
    if !result.is_viable() {
        if let Some(error) = &result.error {
            diagnostics.add(error.at(ident.span));
        }
        return None;
    }
    result.symbols.into_iter().next()
}

/// The namespace named by `alias::`; `global` is the root namespace.
pub(crate) fn alias_namespace(
    binder: &Binder<'_>,
    alias: Ident<'_>,
    diagnostics: &mut DiagnosticBag,
) -> Option<NamespaceSymbol> {
    if alias.name == "global" {
        let root = binder.symbols().namespaces().root();
        return Some(binder.symbols().namespace_symbol(root));
    }
    for ns in binder.namespace_scopes() {
        if let Some(symbol) = binder.lookup().lookup_alias(ns, alias.name)
            && let AliasTarget::Namespace(target) = &symbol.target
        {
            return Some(target.clone());
        }
    }
    diagnostics.add(BindError::UndefinedAlias {
        alias: alias.name.to_string(),
        span: alias.span,
    });
    None
}
