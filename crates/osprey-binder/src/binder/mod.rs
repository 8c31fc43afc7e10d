//! The binder chain.
//!
//! A [`Binder`] is one link in a chain from the innermost context (a block's
//! locals) out to the global namespace. Simple-name lookup walks the chain
//! inside out:
//!
//! 1. locals and range variables of each enclosing block
//! 2. lambda parameters
//! 3. method parameters and method type parameters
//! 4. type parameters and members of each enclosing type
//! 5. each enclosing namespace: aliases, then types and child namespaces,
//!    then types imported by `using` directives
//!
//! The first viable result wins; otherwise the best non-viable result seen
//! is returned so the caller can report a precise error.

mod flags;

use std::rc::Rc;

use osprey_core::{
    BindError, DiagnosticBag, LanguageVersion, MessageId, NamespaceId, ParameterSymbol, RefKind,
    Span, Symbol, Ty, TypeHash, TypeParamDef,
};
use osprey_symbols::{Lookup, LookupError, LookupOptions, LookupResult, LookupResultKind, SymbolTable};
use tracing::trace;

pub use flags::BinderFlags;

use crate::compilation::{Compilation, CompilationOptions};
use crate::conversion::Conversions;
use crate::overload::OverloadResolver;
use crate::scope::LocalScope;

// ============================================================================
// Method context
// ============================================================================

/// The member whose body is being bound.
#[derive(Debug, Clone, Default)]
pub struct MethodContext {
    /// Member name, for diagnostics
    pub name: Rc<str>,
    /// Whether `this` is unavailable
    pub is_static: bool,
    /// Whether this is an instance constructor (readonly fields are writable)
    pub is_constructor: bool,
    /// Method type parameters
    pub type_params: Vec<TypeParamDef>,
    /// Parameters in declaration order
    pub params: Vec<Rc<ParameterSymbol>>,
}

impl MethodContext {
    pub fn instance(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn static_method(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            is_static: true,
            ..Self::default()
        }
    }

    pub fn constructor() -> Self {
        Self {
            name: ".ctor".into(),
            is_constructor: true,
            ..Self::default()
        }
    }

    pub fn with_param(self, name: impl Into<Rc<str>>, ty: Ty) -> Self {
        self.with_ref_param(name, ty, RefKind::None)
    }

    pub fn with_ref_param(mut self, name: impl Into<Rc<str>>, ty: Ty, ref_kind: RefKind) -> Self {
        let ordinal = self.params.len();
        self.params.push(Rc::new(ParameterSymbol {
            name: name.into(),
            ty,
            ref_kind,
            ordinal,
        }));
        self
    }

    pub fn with_type_param(mut self, param: TypeParamDef) -> Self {
        self.type_params.push(param);
        self
    }
}

// ============================================================================
// Binder
// ============================================================================

#[derive(Debug)]
enum BinderKind {
    Namespace(NamespaceId),
    Type { container: Ty },
    Method(MethodContext),
    Lambda { params: Vec<Rc<ParameterSymbol>> },
    Locals(LocalScope),
    /// Only changes flags.
    Flags,
}

/// One link of the binder chain.
pub struct Binder<'a> {
    compilation: &'a Compilation<'a>,
    parent: Option<&'a Binder<'a>>,
    kind: BinderKind,
    flags: BinderFlags,
}

impl<'a> Binder<'a> {
    pub(crate) fn root(compilation: &'a Compilation<'a>) -> Self {
        let flags = if compilation.options().checked {
            BinderFlags::CHECKED
        } else {
            BinderFlags::empty()
        };
        let root = compilation.symbols().namespaces().root();
        Self {
            compilation,
            parent: None,
            kind: BinderKind::Namespace(root),
            flags,
        }
    }

    fn child(&self, kind: BinderKind, flags: BinderFlags) -> Binder<'_> {
        Binder {
            compilation: self.compilation,
            parent: Some(self),
            kind,
            flags,
        }
    }

    // ==========================================================================
    // Chain construction
    // ==========================================================================

    /// Code inside namespace `ns` (and, through it, its ancestors).
    pub fn with_namespace(&self, ns: NamespaceId) -> Binder<'_> {
        self.child(BinderKind::Namespace(ns), self.flags)
    }

    /// Code inside the body of `container`.
    pub fn with_type(&self, container: Ty) -> Binder<'_> {
        self.child(BinderKind::Type { container }, self.flags)
    }

    pub fn with_method(&self, method: MethodContext) -> Binder<'_> {
        self.child(BinderKind::Method(method), self.flags)
    }

    pub fn with_locals(&self, scope: LocalScope) -> Binder<'_> {
        self.child(BinderKind::Locals(scope), self.flags)
    }

    pub(crate) fn with_lambda(&self, params: Vec<Rc<ParameterSymbol>>) -> Binder<'_> {
        self.child(
            BinderKind::Lambda { params },
            self.flags | BinderFlags::IN_LAMBDA,
        )
    }

    pub fn with_additional_flags(&self, flags: BinderFlags) -> Binder<'_> {
        self.child(BinderKind::Flags, self.flags | flags)
    }

    /// `checked(...)` or `unchecked(...)`; the innermost one wins.
    pub fn with_checked(&self, checked: bool) -> Binder<'_> {
        let mut flags = self.flags - (BinderFlags::CHECKED | BinderFlags::UNCHECKED);
        flags |= if checked {
            BinderFlags::CHECKED
        } else {
            BinderFlags::UNCHECKED
        };
        self.child(BinderKind::Flags, flags)
    }

    // ==========================================================================
    // Accessors
    // ==========================================================================

    #[inline]
    pub fn compilation(&self) -> &'a Compilation<'a> {
        self.compilation
    }

    #[inline]
    pub fn symbols(&self) -> &'a SymbolTable {
        self.compilation.symbols()
    }

    #[inline]
    pub fn lookup(&self) -> &'a dyn Lookup {
        self.compilation.lookup()
    }

    #[inline]
    pub fn conversions(&self) -> &'a dyn Conversions {
        self.compilation.conversions()
    }

    #[inline]
    pub fn overloads(&self) -> &'a dyn OverloadResolver {
        self.compilation.overloads()
    }

    #[inline]
    pub fn options(&self) -> &'a CompilationOptions {
        self.compilation.options()
    }

    #[inline]
    pub fn language_version(&self) -> LanguageVersion {
        self.compilation.language_version()
    }

    #[inline]
    pub fn flags(&self) -> BinderFlags {
        self.flags
    }

    pub fn in_unsafe_context(&self) -> bool {
        self.flags.contains(BinderFlags::UNSAFE)
    }

    fn ancestors(&self) -> impl Iterator<Item = &Binder<'a>> {
        std::iter::successors(Some(self), |binder| binder.parent)
    }

    /// The innermost enclosing type.
    pub fn containing_type(&self) -> Option<&Ty> {
        self.ancestors().find_map(|binder| match &binder.kind {
            BinderKind::Type { container } => Some(container),
            _ => None,
        })
    }

    /// Definition of the innermost enclosing type, for accessibility checks.
    pub fn within(&self) -> Option<TypeHash> {
        self.containing_type().and_then(Ty::definition)
    }

    /// The innermost enclosing member body.
    pub fn method_context(&self) -> Option<&MethodContext> {
        self.ancestors().find_map(|binder| match &binder.kind {
            BinderKind::Method(ctx) => Some(ctx),
            _ => None,
        })
    }

    /// Constraints of the type parameter `hash`, declared by an enclosing
    /// method or a registered type.
    pub fn type_param_def(&self, hash: TypeHash) -> Option<&TypeParamDef> {
        self.ancestors()
            .find_map(|binder| match &binder.kind {
                BinderKind::Method(ctx) => ctx.type_params.iter().find(|tp| tp.hash == hash),
                _ => None,
            })
            .or_else(|| self.symbols().type_param(hash))
    }

    /// Whether `this` (explicit or implicit) is unavailable here.
    pub fn is_static_context(&self) -> bool {
        if self.flags.intersects(BinderFlags::NO_INSTANCE) {
            return true;
        }
        match self.method_context() {
            Some(ctx) => ctx.is_static,
            None => true,
        }
    }

    /// Whether readonly fields of `owner` are writable here.
    pub fn in_constructor_of(&self, owner: TypeHash) -> bool {
        self.method_context().is_some_and(|ctx| ctx.is_constructor)
            && self.within() == Some(owner)
    }

    /// Enclosing namespaces, nearest first, each exactly once.
    pub fn namespace_scopes(&self) -> Vec<NamespaceId> {
        let mut scopes = Vec::new();
        for binder in self.ancestors() {
            let BinderKind::Namespace(ns) = binder.kind else {
                continue;
            };
            let mut current = Some(ns);
            while let Some(id) = current {
                if !scopes.contains(&id) {
                    scopes.push(id);
                }
                current = self.lookup().parent_namespace(id);
            }
        }
        scopes
    }

    /// Report `feature` as unavailable if the language version predates it.
    pub fn check_feature(&self, feature: MessageId, span: Span, diagnostics: &mut DiagnosticBag) -> bool {
        let version = self.language_version();
        if feature.is_available_in(version) {
            return true;
        }
        diagnostics.add(BindError::FeatureUnavailable {
            feature,
            version,
            required: feature.required_version(),
            span,
        });
        false
    }

    // ==========================================================================
    // Name lookup
    // ==========================================================================

    /// Look up a simple name through the chain.
    pub fn lookup_name(&self, name: &str, arity: usize, options: LookupOptions) -> LookupResult {
        let mut best = LookupResult::empty();
        for binder in self.ancestors() {
            let found = match &binder.kind {
                BinderKind::Namespace(_) => {
                    let result = self.lookup_in_namespaces(name, arity, options);
                    trace!(name, kind = ?result.kind, "simple name resolved in namespaces");
                    return if result.is_viable() {
                        result
                    } else {
                        best.or_better(result)
                    };
                }
                BinderKind::Locals(scope) => scope
                    .get(name)
                    .filter(|_| arity == 0 && !options.contains(LookupOptions::NAMESPACES_OR_TYPES_ONLY))
                    .map(|symbol| self.check_invocable(symbol.clone(), options)),
                BinderKind::Lambda { params } => params
                    .iter()
                    .find(|p| p.name.as_ref() == name)
                    .filter(|_| arity == 0 && !options.contains(LookupOptions::NAMESPACES_OR_TYPES_ONLY))
                    .map(|p| self.check_invocable(Symbol::Parameter(p.clone()), options)),
                BinderKind::Method(ctx) => lookup_in_method(self, ctx, name, arity, options),
                BinderKind::Type { container } => Some(self.lookup_in_type(container, name, arity, options)),
                BinderKind::Flags => None,
            };
            if let Some(result) = found {
                if result.is_viable() {
                    trace!(name, kind = ?result.kind, "simple name resolved");
                    return result;
                }
                best = best.or_better(result);
            }
        }
        best
    }

    fn lookup_in_type(&self, container: &Ty, name: &str, arity: usize, options: LookupOptions) -> LookupResult {
        if arity == 0
            && let Some(def) = self.symbols().def_of(container)
            && let Some(param) = def.type_params.iter().find(|tp| tp.name == name)
        {
            return LookupResult::viable(vec![Symbol::TypeParameter(param.ty())]);
        }
        self.lookup()
            .lookup_members(container, name, arity, options, self.within())
    }

    fn lookup_in_namespaces(&self, name: &str, arity: usize, options: LookupOptions) -> LookupResult {
        let mut best = LookupResult::empty();
        for ns in self.namespace_scopes() {
            if arity == 0
                && let Some(alias) = self.lookup().lookup_alias(ns, name)
            {
                return LookupResult::viable(vec![Symbol::Alias(alias)]);
            }
            let direct = self.lookup().lookup_in_namespace(ns, name, arity, options);
            if direct.is_viable() {
                return direct;
            }
            best = best.or_better(direct);
            let imported = self.lookup().lookup_in_usings(ns, name, arity);
            if imported.is_viable() || imported.kind == LookupResultKind::Ambiguous {
                return imported;
            }
            best = best.or_better(imported);
        }
        best
    }

    /// Locals and parameters used as a callee must be delegates or dynamic.
    fn check_invocable(&self, symbol: Symbol, options: LookupOptions) -> LookupResult {
        if options.contains(LookupOptions::MUST_BE_INVOCABLE) {
            let invocable = symbol
                .value_type()
                .is_none_or(|ty| ty.is_dynamic() || self.symbols().is_delegate_type(&ty));
            if !invocable {
                let name = symbol.name();
                return LookupResult::failed(
                    LookupResultKind::NotInvocable,
                    vec![symbol],
                    LookupError::NotInvocable { name },
                );
            }
        }
        LookupResult::viable(vec![symbol])
    }
}

fn lookup_in_method(
    binder: &Binder<'_>,
    ctx: &MethodContext,
    name: &str,
    arity: usize,
    options: LookupOptions,
) -> Option<LookupResult> {
    if arity != 0 {
        return None;
    }
    if let Some(param) = ctx.type_params.iter().find(|tp| tp.name == name) {
        return Some(LookupResult::viable(vec![Symbol::TypeParameter(param.ty())]));
    }
    if options.contains(LookupOptions::NAMESPACES_OR_TYPES_ONLY) {
        return None;
    }
    ctx.params
        .iter()
        .find(|p| p.name.as_ref() == name)
        .map(|p| binder.check_invocable(Symbol::Parameter(p.clone()), options))
}
