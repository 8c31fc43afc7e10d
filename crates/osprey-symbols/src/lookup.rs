//! Name lookup: the collaborator the binder asks "what does this name mean
//! here?".
//!
//! Lookup is side-effect free and idempotent. It reports a
//! [`LookupResultKind`] viability tag, the candidate symbols (also for
//! non-viable outcomes, so callers can still build best-effort trees) and an
//! optional span-less [`LookupError`] the caller anchors at a location.

use std::rc::Rc;

use bitflags::bitflags;
use osprey_core::{
    Accessibility, AliasSymbol, BindError, EventSymbol, FieldSymbol, MethodSymbol, NamespaceId,
    NamespaceSymbol, PropertySymbol, Span, Substitution, Symbol, SymbolKind, Ty, TypeDef,
    TypeHash,
};
use thiserror::Error;
use tracing::trace;

use crate::SymbolTable;

bitflags! {
    /// Options that narrow a lookup.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LookupOptions: u32 {
        /// Non-generic and generic methods alike are found when no type
        /// arguments are written (they may be inferred).
        const ALL_METHODS_ON_ARITY_ZERO = 1 << 0;
        /// Only invocable members (methods, delegate-typed values).
        const MUST_BE_INVOCABLE = 1 << 1;
        /// Exclude instance members.
        const MUST_NOT_BE_INSTANCE = 1 << 2;
        /// Protected access through `base` rather than an arbitrary receiver.
        const USE_BASE_REFERENCE_ACCESSIBILITY = 1 << 3;
        /// Only namespaces and types.
        const NAMESPACES_OR_TYPES_ONLY = 1 << 4;
    }
}

/// Viability of a lookup, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupResultKind {
    Empty,
    NotATypeOrNamespace,
    WrongArity,
    NotCreatable,
    Inaccessible,
    NotAValue,
    NotAVariable,
    NotInvocable,
    StaticInstanceMismatch,
    OverloadResolutionFailure,
    Ambiguous,
    Viable,
}

/// A lookup problem, turned into a [`BindError`] once a location is known.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("'{name}' is inaccessible due to its protection level")]
    Inaccessible { name: String },

    #[error("the {kind} '{name}' requires {expected} type arguments, found {found}")]
    WrongArity {
        kind: SymbolKind,
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("the {kind} '{name}' cannot be used with type arguments")]
    TypeArgumentsNotAllowed { kind: SymbolKind, name: String },

    #[error("'{name}' is ambiguous between '{first}' and '{second}'")]
    Ambiguous {
        name: String,
        first: String,
        second: String,
    },

    #[error("'{name}' is not invocable")]
    NotInvocable { name: String },

    #[error("an object reference is required for '{member}'")]
    ObjectRequired { member: String },
}

impl LookupError {
    pub fn at(&self, span: Span) -> BindError {
        match self.clone() {
            LookupError::Inaccessible { name } => BindError::Inaccessible { name, span },
            LookupError::WrongArity {
                kind,
                name,
                expected,
                found,
            } => BindError::WrongArity {
                kind: kind.to_string(),
                name,
                expected,
                found,
                span,
            },
            LookupError::TypeArgumentsNotAllowed { kind, name } => {
                BindError::TypeArgumentsNotAllowed {
                    kind: kind.to_string(),
                    name,
                    span,
                }
            }
            LookupError::Ambiguous {
                name,
                first,
                second,
            } => BindError::AmbiguousName {
                name,
                first,
                second,
                span,
            },
            LookupError::NotInvocable { name } => BindError::NotInvocable { name, span },
            LookupError::ObjectRequired { member } => BindError::ObjectRequired { member, span },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub kind: LookupResultKind,
    pub symbols: Vec<Symbol>,
    pub error: Option<LookupError>,
}

impl LookupResult {
    pub fn empty() -> Self {
        Self {
            kind: LookupResultKind::Empty,
            symbols: Vec::new(),
            error: None,
        }
    }

    pub fn viable(symbols: Vec<Symbol>) -> Self {
        if symbols.is_empty() {
            return Self::empty();
        }
        Self {
            kind: LookupResultKind::Viable,
            symbols,
            error: None,
        }
    }

    pub fn failed(kind: LookupResultKind, symbols: Vec<Symbol>, error: LookupError) -> Self {
        Self {
            kind,
            symbols,
            error: Some(error),
        }
    }

    pub fn is_viable(&self) -> bool {
        self.kind == LookupResultKind::Viable
    }

    pub fn is_empty(&self) -> bool {
        self.kind == LookupResultKind::Empty
    }

    /// The symbol, when exactly one was found.
    pub fn single(&self) -> Option<&Symbol> {
        match self.symbols.as_slice() {
            [symbol] => Some(symbol),
            _ => None,
        }
    }

    /// Whether every candidate is a method (a method group).
    pub fn is_method_group(&self) -> bool {
        !self.symbols.is_empty() && self.symbols.iter().all(|s| matches!(s, Symbol::Method(_)))
    }

    /// Keep whichever result is better; `self` wins ties.
    pub fn or_better(self, other: LookupResult) -> LookupResult {
        if other.kind > self.kind { other } else { self }
    }
}

/// The lookup collaborator consumed by the binder.
pub trait Lookup {
    /// Members named `name` in `container` and its bases.
    ///
    /// `within` is the type whose code performs the lookup, for accessibility.
    fn lookup_members(
        &self,
        container: &Ty,
        name: &str,
        arity: usize,
        options: LookupOptions,
        within: Option<TypeHash>,
    ) -> LookupResult;

    /// Types and child namespaces named `name` directly inside `ns`.
    fn lookup_in_namespace(
        &self,
        ns: NamespaceId,
        name: &str,
        arity: usize,
        options: LookupOptions,
    ) -> LookupResult;

    /// Types named `name` imported into `ns` by its `using` directives.
    fn lookup_in_usings(&self, ns: NamespaceId, name: &str, arity: usize) -> LookupResult;

    fn lookup_alias(&self, ns: NamespaceId, name: &str) -> Option<Rc<AliasSymbol>>;

    /// Extension methods named `name` declared in `ns` or in namespaces it
    /// imports. One call covers one extension scope.
    fn extension_methods(&self, ns: NamespaceId, name: &str, arity: usize) -> Vec<MethodSymbol>;

    /// Indexers of `container`, from the most derived type declaring any.
    fn lookup_indexers(&self, container: &Ty, within: Option<TypeHash>) -> LookupResult;

    /// Instance constructors of `ty`, substituted.
    fn constructors(&self, ty: &Ty) -> Vec<MethodSymbol>;

    fn namespace_by_path(&self, path: &str) -> Option<NamespaceSymbol>;

    fn parent_namespace(&self, ns: NamespaceId) -> Option<NamespaceId>;
}

// ============================================================================
// SymbolTable implementation
// ============================================================================

impl SymbolTable {
    /// Types to search for members of `container`, most derived first.
    fn member_levels(&self, container: &Ty) -> Vec<Ty> {
        match container {
            Ty::Special(_) | Ty::Named(_) | Ty::Array(_) => {
                let mut levels = vec![container.clone()];
                let is_interface = self.def_of(container).is_some_and(|d| d.is_interface());
                if is_interface {
                    levels.extend(self.all_interfaces(container));
                    levels.push(Ty::OBJECT);
                } else {
                    levels.extend(self.base_chain(container));
                }
                levels
            }
            Ty::TypeParam(param) => {
                let mut levels = Vec::new();
                if let Some(tp) = self.type_param(param.hash) {
                    levels.extend(tp.constraint_types.iter().cloned());
                }
                levels.extend(self.base_chain(container));
                levels
            }
            _ => Vec::new(),
        }
    }

    fn members_of_level(&self, level: &Ty, name: &str, types_only: bool) -> Vec<Symbol> {
        let Some(def) = self.def_of(level) else {
            return Vec::new();
        };
        let subst = self.substitution_for(level);
        let mut symbols: Vec<Symbol> = def
            .nested_types
            .iter()
            .filter_map(|hash| self.get(*hash))
            .filter(|nested| nested.name == name)
            .map(|nested| Symbol::NamedType(nested.self_type()))
            .collect();
        if types_only {
            return symbols;
        }
        collect_members(def, level, name, &subst, &mut symbols);
        symbols
    }

    fn symbol_accessibility(&self, symbol: &Symbol) -> Option<(Accessibility, TypeHash)> {
        match symbol {
            Symbol::Field(f) => Some((f.def.accessibility, f.def.owner)),
            Symbol::Property(p) => Some((p.def.accessibility, p.def.owner)),
            Symbol::Event(e) => Some((e.def.accessibility, e.def.owner)),
            Symbol::Method(m) => Some((m.def.accessibility, m.def.owner)),
            Symbol::NamedType(ty) => {
                let def = self.def_of(ty)?;
                Some((def.accessibility, def.containing_type?))
            }
            _ => None,
        }
    }

    fn is_symbol_accessible(
        &self,
        symbol: &Symbol,
        container: &Ty,
        options: LookupOptions,
        within: Option<TypeHash>,
    ) -> bool {
        let Some((accessibility, owner)) = self.symbol_accessibility(symbol) else {
            return true;
        };
        if !self.is_accessible(accessibility, owner, within) {
            return false;
        }
        // Protected instance members need a receiver of the caller's type.
        if accessibility.requires_derivation()
            && symbol.requires_instance()
            && !options.contains(LookupOptions::USE_BASE_REFERENCE_ACCESSIBILITY)
            && let Some(within) = within
            && !self.is_nested_within(within, owner)
        {
            let mut current = Some(within);
            while let Some(hash) = current {
                if self.derives_from(container, hash) {
                    return true;
                }
                current = self.get(hash).and_then(|d| d.containing_type);
            }
            return false;
        }
        true
    }

    fn is_invocable_symbol(&self, symbol: &Symbol) -> bool {
        match symbol {
            Symbol::Method(_) => true,
            other => other
                .value_type()
                .is_some_and(|ty| ty.is_dynamic() || self.is_delegate_type(&ty)),
        }
    }

    /// Apply arity, accessibility and option filters to raw candidates.
    fn classify(
        &self,
        name: &str,
        candidates: Vec<Symbol>,
        arity: usize,
        options: LookupOptions,
        accessible: impl Fn(&Symbol) -> bool,
    ) -> LookupResult {
        if candidates.is_empty() {
            return LookupResult::empty();
        }

        let (matching, wrong_arity): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|s| self.arity_matches(s, arity, options));
        if matching.is_empty() {
            let first = &wrong_arity[0];
            let expected = self.symbol_arity(first);
            let error = if expected == 0 && !matches!(first, Symbol::Method(_)) {
                LookupError::TypeArgumentsNotAllowed {
                    kind: first.kind(),
                    name: name.to_string(),
                }
            } else {
                LookupError::WrongArity {
                    kind: first.kind(),
                    name: name.to_string(),
                    expected,
                    found: arity,
                }
            };
            return LookupResult::failed(LookupResultKind::WrongArity, wrong_arity, error);
        }

        let (reachable, inaccessible): (Vec<_>, Vec<_>) =
            matching.into_iter().partition(|s| accessible(s));
        if reachable.is_empty() {
            return LookupResult::failed(
                LookupResultKind::Inaccessible,
                inaccessible,
                LookupError::Inaccessible {
                    name: name.to_string(),
                },
            );
        }

        let mut symbols = reachable;
        if options.contains(LookupOptions::MUST_NOT_BE_INSTANCE) {
            let (statics, instance): (Vec<_>, Vec<_>) = symbols
                .into_iter()
                .partition(|s| !s.requires_instance());
            if statics.is_empty() {
                return LookupResult::failed(
                    LookupResultKind::StaticInstanceMismatch,
                    instance,
                    LookupError::ObjectRequired {
                        member: name.to_string(),
                    },
                );
            }
            symbols = statics;
        }

        if options.contains(LookupOptions::MUST_BE_INVOCABLE) {
            let (invocable, other): (Vec<_>, Vec<_>) = symbols
                .into_iter()
                .partition(|s| self.is_invocable_symbol(s));
            if invocable.is_empty() {
                return LookupResult::failed(
                    LookupResultKind::NotInvocable,
                    other,
                    LookupError::NotInvocable {
                        name: name.to_string(),
                    },
                );
            }
            symbols = invocable;
        }

        let non_methods: Vec<&Symbol> = symbols
            .iter()
            .filter(|s| !matches!(s, Symbol::Method(_)))
            .collect();
        let mixed = !non_methods.is_empty() && non_methods.len() != symbols.len();
        if non_methods.len() > 1 || mixed {
            let first = describe(symbols[0].clone());
            let second = describe(symbols[1].clone());
            return LookupResult::failed(
                LookupResultKind::Ambiguous,
                symbols,
                LookupError::Ambiguous {
                    name: name.to_string(),
                    first,
                    second,
                },
            );
        }

        LookupResult::viable(symbols)
    }

    fn symbol_arity(&self, symbol: &Symbol) -> usize {
        match symbol {
            Symbol::Method(m) => m.def.type_params.len(),
            Symbol::NamedType(ty) => self.def_of(ty).map_or(0, |d| d.arity()),
            _ => 0,
        }
    }

    fn arity_matches(&self, symbol: &Symbol, arity: usize, options: LookupOptions) -> bool {
        match symbol {
            Symbol::Method(_) if arity == 0 => {
                options.contains(LookupOptions::ALL_METHODS_ON_ARITY_ZERO)
                    || self.symbol_arity(symbol) == 0
            }
            _ => self.symbol_arity(symbol) == arity,
        }
    }

    fn types_in_namespace(&self, ns: NamespaceId, name: &str) -> Vec<Symbol> {
        self.namespaces()
            .types_named(ns, name)
            .iter()
            .filter_map(|hash| self.get(*hash))
            .map(|def| Symbol::NamedType(def.self_type()))
            .collect()
    }
}

fn collect_members(
    def: &TypeDef,
    level: &Ty,
    name: &str,
    subst: &Substitution,
    out: &mut Vec<Symbol>,
) {
    for field in def.fields.iter().filter(|f| f.name == name) {
        out.push(Symbol::Field(FieldSymbol::new(field.clone(), level.clone(), subst)));
    }
    for property in def
        .properties
        .iter()
        .filter(|p| p.name == name && !p.is_indexer())
    {
        out.push(Symbol::Property(PropertySymbol::new(
            property.clone(),
            level.clone(),
            subst,
        )));
    }
    for event in def.events.iter().filter(|e| e.name == name) {
        out.push(Symbol::Event(EventSymbol {
            def: event.clone(),
            container: level.clone(),
            ty: event.ty.substitute(subst),
        }));
    }
    for method in def.find_methods(name) {
        out.push(Symbol::Method(MethodSymbol::new(
            method.clone(),
            level.clone(),
            subst,
        )));
    }
}

fn same_signature(a: &MethodSymbol, b: &MethodSymbol) -> bool {
    a.def.name == b.def.name
        && a.def.type_params.len() == b.def.type_params.len()
        && a.params.len() == b.params.len()
        && a.params.iter().zip(b.params.iter()).all(|(x, y)| x.ty == y.ty && x.ref_kind == y.ref_kind)
}

fn describe(symbol: Symbol) -> String {
    match &symbol {
        Symbol::Field(_) | Symbol::Property(_) | Symbol::Event(_) | Symbol::Method(_) => {
            match symbol.containing_type() {
                Some(container) => format!("{container}.{}", symbol.name()),
                None => symbol.name(),
            }
        }
        _ => symbol.name(),
    }
}

impl Lookup for SymbolTable {
    fn lookup_members(
        &self,
        container: &Ty,
        name: &str,
        arity: usize,
        options: LookupOptions,
        within: Option<TypeHash>,
    ) -> LookupResult {
        let types_only = options.contains(LookupOptions::NAMESPACES_OR_TYPES_ONLY);
        let mut candidates: Vec<Symbol> = Vec::new();
        for level in self.member_levels(container) {
            let found = self.members_of_level(&level, name, types_only);
            if found.is_empty() {
                continue;
            }
            let has_non_method = found.iter().any(|s| !matches!(s, Symbol::Method(_)));
            if has_non_method {
                // A non-method hides everything further up; below a method
                // group it is itself hidden.
                if candidates.is_empty() {
                    candidates = found;
                }
                break;
            }
            for symbol in found {
                let Symbol::Method(method) = &symbol else {
                    continue;
                };
                let overridden = candidates.iter().any(|existing| {
                    matches!(existing, Symbol::Method(m) if same_signature(m, method))
                });
                if !overridden {
                    candidates.push(symbol);
                }
            }
        }

        let result = self.classify(name, candidates, arity, options, |symbol| {
            self.is_symbol_accessible(symbol, container, options, within)
        });
        trace!(%container, name, arity, kind = ?result.kind, count = result.symbols.len(), "member lookup");
        result
    }

    fn lookup_in_namespace(
        &self,
        ns: NamespaceId,
        name: &str,
        arity: usize,
        options: LookupOptions,
    ) -> LookupResult {
        let mut candidates = self.types_in_namespace(ns, name);
        if arity == 0
            && let Some(child) = self.namespaces().find_child(ns, name)
        {
            candidates.push(Symbol::Namespace(self.namespace_symbol(child)));
        }
        let options = options - LookupOptions::MUST_NOT_BE_INSTANCE;
        let result = self.classify(name, candidates, arity, options, |_| true);
        trace!(ns = ns.0, name, arity, kind = ?result.kind, "namespace lookup");
        result
    }

    fn lookup_in_usings(&self, ns: NamespaceId, name: &str, arity: usize) -> LookupResult {
        let mut candidates: Vec<Symbol> = Vec::new();
        for target in self.namespaces().usings(ns) {
            for symbol in self.types_in_namespace(target, name) {
                if !candidates.contains(&symbol) {
                    candidates.push(symbol);
                }
            }
        }
        self.classify(name, candidates, arity, LookupOptions::empty(), |_| true)
    }

    fn lookup_alias(&self, ns: NamespaceId, name: &str) -> Option<Rc<AliasSymbol>> {
        self.namespaces().alias(ns, name)
    }

    fn extension_methods(&self, ns: NamespaceId, name: &str, arity: usize) -> Vec<MethodSymbol> {
        let scopes = std::iter::once(ns).chain(self.namespaces().usings(ns));
        let mut methods = Vec::new();
        for scope in scopes {
            for entry in self.namespaces().extension_methods(scope, name) {
                if arity != 0 && entry.method.type_params.len() != arity {
                    continue;
                }
                let Some(container) = self.get(entry.container) else {
                    continue;
                };
                let symbol =
                    MethodSymbol::new(entry.method.clone(), container.self_type(), &Substitution::new());
                if !methods.contains(&symbol) {
                    methods.push(symbol);
                }
            }
        }
        trace!(ns = ns.0, name, count = methods.len(), "extension scope");
        methods
    }

    fn lookup_indexers(&self, container: &Ty, within: Option<TypeHash>) -> LookupResult {
        for level in self.member_levels(container) {
            let Some(def) = self.def_of(&level) else {
                continue;
            };
            let subst = self.substitution_for(&level);
            let indexers: Vec<Symbol> = def
                .indexers()
                .map(|p| Symbol::Property(PropertySymbol::new(p.clone(), level.clone(), &subst)))
                .collect();
            if indexers.is_empty() {
                continue;
            }
            let (reachable, inaccessible): (Vec<_>, Vec<_>) =
                indexers.into_iter().partition(|s| {
                    self.is_symbol_accessible(s, container, LookupOptions::empty(), within)
                });
            if reachable.is_empty() {
                return LookupResult::failed(
                    LookupResultKind::Inaccessible,
                    inaccessible,
                    LookupError::Inaccessible {
                        name: format!("{level}.this[]"),
                    },
                );
            }
            return LookupResult::viable(reachable);
        }
        LookupResult::empty()
    }

    fn constructors(&self, ty: &Ty) -> Vec<MethodSymbol> {
        let Some(def) = self.def_of(ty) else {
            return Vec::new();
        };
        let subst = self.substitution_for(ty);
        def.constructors
            .iter()
            .filter(|ctor| !ctor.is_static)
            .map(|ctor| MethodSymbol::new(ctor.clone(), ty.clone(), &subst))
            .collect()
    }

    fn namespace_by_path(&self, path: &str) -> Option<NamespaceSymbol> {
        let id = self.namespaces().get_path(path)?;
        Some(self.namespace_symbol(id))
    }

    fn parent_namespace(&self, ns: NamespaceId) -> Option<NamespaceId> {
        self.namespaces().parent(ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osprey_core::{FieldDef, MethodDef, ParamDef, PropertyDef, SpecialType, TypeDef};

    fn table() -> SymbolTable {
        let mut table = SymbolTable::with_special_types();
        let shape = TypeDef::class("Geo.Shape")
            .with_field(FieldDef::new("id", Ty::INT).with_accessibility(Accessibility::Private))
            .with_property(PropertyDef::new("Area", Ty::DOUBLE))
            .with_method(MethodDef::new("Scale", vec![ParamDef::new("f", Ty::DOUBLE)], Ty::VOID))
            .with_method(MethodDef::new("Describe", vec![], Ty::STRING).as_static());
        let shape_hash = table.register_type(shape).unwrap();
        let circle = TypeDef::class("Geo.Circle")
            .with_base(Ty::named(shape_hash, "Geo.Shape"))
            .with_method(MethodDef::new(
                "Scale",
                vec![ParamDef::new("fx", Ty::DOUBLE), ParamDef::new("fy", Ty::DOUBLE)],
                Ty::VOID,
            ))
            .with_method(
                MethodDef::new("Map", vec![], Ty::VOID).generic(&["T"]),
            );
        table.register_type(circle).unwrap();
        table
    }

    fn circle(table: &SymbolTable) -> Ty {
        table.type_named("Geo.Circle").unwrap()
    }

    #[test]
    fn methods_are_collected_across_bases() {
        let table = table();
        let result = table.lookup_members(&circle(&table), "Scale", 0, LookupOptions::empty(), None);
        assert!(result.is_viable());
        assert!(result.is_method_group());
        assert_eq!(result.symbols.len(), 2);
    }

    #[test]
    fn inherited_properties_resolve() {
        let table = table();
        let result = table.lookup_members(&circle(&table), "Area", 0, LookupOptions::empty(), None);
        let symbol = result.single().unwrap();
        assert_eq!(symbol.value_type(), Some(Ty::DOUBLE));
    }

    #[test]
    fn private_members_are_inaccessible_from_outside() {
        let table = table();
        let result = table.lookup_members(&circle(&table), "id", 0, LookupOptions::empty(), None);
        assert_eq!(result.kind, LookupResultKind::Inaccessible);
        assert_eq!(result.symbols.len(), 1);
        assert!(matches!(result.error, Some(LookupError::Inaccessible { .. })));

        let shape = TypeHash::from_name("Geo.Shape");
        let inside = table.lookup_members(&circle(&table), "id", 0, LookupOptions::empty(), Some(shape));
        assert!(inside.is_viable());
    }

    #[test]
    fn generic_methods_need_matching_arity() {
        let table = table();
        let none = table.lookup_members(&circle(&table), "Map", 0, LookupOptions::empty(), None);
        assert_eq!(none.kind, LookupResultKind::WrongArity);

        let inferred = table.lookup_members(
            &circle(&table),
            "Map",
            0,
            LookupOptions::ALL_METHODS_ON_ARITY_ZERO,
            None,
        );
        assert!(inferred.is_viable());

        let explicit = table.lookup_members(&circle(&table), "Map", 1, LookupOptions::empty(), None);
        assert!(explicit.is_viable());
    }

    #[test]
    fn type_arguments_on_properties_are_rejected() {
        let table = table();
        let result = table.lookup_members(&circle(&table), "Area", 1, LookupOptions::empty(), None);
        assert!(matches!(
            result.error,
            Some(LookupError::TypeArgumentsNotAllowed { .. })
        ));
    }

    #[test]
    fn static_only_lookup_reports_instance_members() {
        let table = table();
        let ty = circle(&table);
        let result = table.lookup_members(&ty, "Area", 0, LookupOptions::MUST_NOT_BE_INSTANCE, None);
        assert_eq!(result.kind, LookupResultKind::StaticInstanceMismatch);

        let statics =
            table.lookup_members(&ty, "Describe", 0, LookupOptions::MUST_NOT_BE_INSTANCE, None);
        assert!(statics.is_viable());
    }

    #[test]
    fn invocable_lookup_rejects_properties() {
        let table = table();
        let result =
            table.lookup_members(&circle(&table), "Area", 0, LookupOptions::MUST_BE_INVOCABLE, None);
        assert_eq!(result.kind, LookupResultKind::NotInvocable);
    }

    #[test]
    fn namespace_lookup_finds_types_and_children() {
        let table = table();
        let root = table.namespaces().root();
        let geo = table.lookup_in_namespace(root, "Geo", 0, LookupOptions::empty());
        assert!(matches!(geo.single(), Some(Symbol::Namespace(ns)) if &*ns.path == "Geo"));

        let Symbol::Namespace(geo) = geo.single().unwrap() else {
            unreachable!()
        };
        let shape = table.lookup_in_namespace(geo.id, "Shape", 0, LookupOptions::empty());
        assert!(matches!(shape.single(), Some(Symbol::NamedType(_))));
    }

    #[test]
    fn usings_conflict_is_ambiguous() {
        let mut table = table();
        table.register_type(TypeDef::class("A.Widget")).unwrap();
        table.register_type(TypeDef::class("B.Widget")).unwrap();
        let app = table.add_namespace("App").unwrap();
        table.add_using(app, "A").unwrap();
        table.add_using(app, "B").unwrap();
        let result = table.lookup_in_usings(app, "Widget", 0);
        assert_eq!(result.kind, LookupResultKind::Ambiguous);
    }

    #[test]
    fn string_indexer_and_constructors() {
        let table = table();
        let indexers = table.lookup_indexers(&Ty::STRING, None);
        assert!(indexers.is_viable());
        assert_eq!(indexers.symbols.len(), 1);

        let index_ctors = table.constructors(&Ty::Special(SpecialType::Index));
        assert_eq!(index_ctors.len(), 1);
        assert_eq!(index_ctors[0].params.len(), 2);
    }

    #[test]
    fn extension_methods_include_usings() {
        let mut table = table();
        let ext = TypeDef::class("Util.Extensions").as_static().with_method(MethodDef::extension(
            "Twice",
            vec![ParamDef::new("value", Ty::INT)],
            Ty::INT,
        ));
        table.register_type(ext).unwrap();
        let app = table.add_namespace("App").unwrap();
        assert!(table.extension_methods(app, "Twice", 0).is_empty());
        table.add_using(app, "Util").unwrap();
        assert_eq!(table.extension_methods(app, "Twice", 0).len(), 1);
    }
}
