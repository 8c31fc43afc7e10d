//! SymbolTable - the type registry behind lookup.
//!
//! # Storage Model
//!
//! - **Types**: every `TypeDef` stored once by `TypeHash`, shared as `Rc`
//! - **Namespaces**: a [`NamespaceTree`] indexing types, extension methods
//!   and aliases by simple name per namespace
//! - **Type parameters**: indexed by identity so constraints can be
//!   recovered from a bare `Ty::TypeParam`
//!
//! The table is populated once and then read through `&SymbolTable` for the
//! rest of a compilation. It is not thread-safe.

use std::rc::Rc;

use osprey_core::{
    Accessibility, AliasSymbol, AliasTarget, ConstantValue, FieldDef, MethodDef, MethodSymbol,
    NamespaceId, NamespaceSymbol, ParamDef, PropertyDef, RegistrationError, SpecialType,
    Substitution, Ty, TypeDef, TypeHash, TypeKind, TypeParamDef,
};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::namespace_tree::NamespaceTree;

#[derive(Default)]
pub struct SymbolTable {
    types: FxHashMap<TypeHash, Rc<TypeDef>>,
    type_params: FxHashMap<TypeHash, TypeParamDef>,
    namespaces: NamespaceTree,
}

impl SymbolTable {
    /// Create an empty table. Most callers want [`SymbolTable::with_special_types`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the predefined types registered.
    pub fn with_special_types() -> Self {
        let mut table = Self::new();
        for def in special_type_defs() {
            // The special set is fixed and free of duplicates.
            let _ = table.register_type(def);
        }
        table
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a type definition.
    ///
    /// Top-level types are indexed in their namespace by simple name; nested
    /// types are reached through their container. Static classes contribute
    /// their extension methods to their namespace.
    pub fn register_type(&mut self, def: TypeDef) -> Result<TypeHash, RegistrationError> {
        if self.types.contains_key(&def.hash) {
            return Err(RegistrationError::DuplicateType {
                name: def.qualified_name.clone(),
            });
        }
        if let Some(base) = &def.base
            && let Some(base_hash) = base.definition()
            && !self.types.contains_key(&base_hash)
            && base_hash != def.hash
            && !is_special_hash(base_hash)
        {
            return Err(RegistrationError::UnknownType {
                owner: def.qualified_name.clone(),
                name: base.to_string(),
            });
        }

        let hash = def.hash;
        if def.containing_type.is_none() {
            let ns = self.namespaces.get_or_create_path(&def.namespace)?;
            self.namespaces.add_type(ns, &def.name, hash)?;
            if def.is_static {
                for method in def.methods.iter().filter(|m| m.is_extension) {
                    self.namespaces.add_extension_method(ns, hash, method.clone())?;
                }
            }
        }

        for param in &def.type_params {
            self.type_params.insert(param.hash, param.clone());
        }
        for method in def.methods.iter().chain(&def.constructors) {
            for param in &method.type_params {
                self.type_params.insert(param.hash, param.clone());
            }
        }

        trace!(name = %def.qualified_name, kind = def.kind.describe(), "registered type");
        self.types.insert(hash, Rc::new(def));
        Ok(hash)
    }

    /// Ensure a namespace exists.
    pub fn add_namespace(&mut self, path: &str) -> Result<NamespaceId, RegistrationError> {
        self.namespaces.get_or_create_path(path)
    }

    /// Add `using target;` to namespace `from`.
    pub fn add_using(&mut self, from: NamespaceId, target: &str) -> Result<(), RegistrationError> {
        let target = self.namespaces.get_or_create_path(target)?;
        self.namespaces.add_using(from, target);
        Ok(())
    }

    /// Add `using alias = target;` where target names a namespace.
    pub fn add_namespace_alias(
        &mut self,
        ns: NamespaceId,
        alias: &str,
        target: &str,
    ) -> Result<(), RegistrationError> {
        let target_id = self.namespaces.get_or_create_path(target)?;
        let symbol = AliasSymbol {
            name: alias.into(),
            target: AliasTarget::Namespace(self.namespace_symbol(target_id)),
        };
        self.namespaces.add_alias(ns, symbol)
    }

    /// Add `using alias = T;`.
    pub fn add_type_alias(
        &mut self,
        ns: NamespaceId,
        alias: &str,
        ty: Ty,
    ) -> Result<(), RegistrationError> {
        let symbol = AliasSymbol {
            name: alias.into(),
            target: AliasTarget::Type(ty),
        };
        self.namespaces.add_alias(ns, symbol)
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    pub fn namespaces(&self) -> &NamespaceTree {
        &self.namespaces
    }

    pub fn namespace_symbol(&self, id: NamespaceId) -> NamespaceSymbol {
        NamespaceSymbol {
            id,
            path: self.namespaces.path(id).into(),
        }
    }

    pub fn get(&self, hash: TypeHash) -> Option<&Rc<TypeDef>> {
        self.types.get(&hash)
    }

    /// Find a definition by qualified metadata name (`Ns.Box`1` for generics).
    pub fn get_by_name(&self, qualified_name: &str) -> Option<&Rc<TypeDef>> {
        self.types.get(&TypeHash::from_name(qualified_name))
    }

    /// The definition a type's members come from.
    pub fn def_of(&self, ty: &Ty) -> Option<&Rc<TypeDef>> {
        self.get(ty.definition()?)
    }

    pub fn type_param(&self, hash: TypeHash) -> Option<&TypeParamDef> {
        self.type_params.get(&hash)
    }

    /// The type a qualified name refers to, for non-generic definitions.
    pub fn type_named(&self, qualified_name: &str) -> Option<Ty> {
        self.get_by_name(qualified_name).map(|def| def.self_type())
    }

    /// Map a constructed type's definition parameters onto its arguments.
    pub fn substitution_for(&self, ty: &Ty) -> Substitution {
        let Some(named) = ty.as_named() else {
            return Substitution::new();
        };
        if named.args.is_empty() {
            return Substitution::new();
        }
        match self.get(named.def) {
            Some(def) => {
                let params: Vec<_> = def.type_params.iter().map(|tp| tp.hash).collect();
                Substitution::from_pairs(&params, &named.args)
            }
            None => Substitution::new(),
        }
    }

    /// The direct base class, with type arguments substituted.
    pub fn base_type(&self, ty: &Ty) -> Option<Ty> {
        match ty {
            Ty::Special(SpecialType::Object) => None,
            Ty::Array(_) => Some(Ty::Special(SpecialType::Array)),
            Ty::Tuple(_) => Some(Ty::Special(SpecialType::ValueType)),
            Ty::TypeParam(param) => {
                let constraint = self.type_param(param.hash).and_then(|tp| {
                    tp.constraint_types
                        .iter()
                        .find(|c| self.def_of(c).is_some_and(|d| d.kind == TypeKind::Class))
                        .cloned()
                });
                Some(constraint.unwrap_or(Ty::OBJECT))
            }
            Ty::Special(_) | Ty::Named(_) => {
                let def = self.def_of(ty)?;
                if def.is_interface() {
                    return None;
                }
                match &def.base {
                    Some(base) => Some(base.substitute(&self.substitution_for(ty))),
                    None => Some(Ty::OBJECT),
                }
            }
            _ => None,
        }
    }

    /// Base classes from nearest to `object`, excluding `ty` itself.
    pub fn base_chain(&self, ty: &Ty) -> Vec<Ty> {
        let mut chain = Vec::new();
        let mut current = self.base_type(ty);
        while let Some(base) = current {
            if chain.contains(&base) {
                break;
            }
            current = self.base_type(&base);
            chain.push(base);
        }
        chain
    }

    /// Every interface `ty` implements, directly or through bases and
    /// interface inheritance, substituted.
    pub fn all_interfaces(&self, ty: &Ty) -> Vec<Ty> {
        let mut result: Vec<Ty> = Vec::new();
        let mut pending: Vec<Ty> = std::iter::once(ty.clone())
            .chain(self.base_chain(ty))
            .collect();
        if let Ty::TypeParam(param) = ty
            && let Some(tp) = self.type_param(param.hash)
        {
            pending.extend(tp.constraint_types.iter().cloned());
        }
        while let Some(current) = pending.pop() {
            let Some(def) = self.def_of(&current) else {
                continue;
            };
            let subst = self.substitution_for(&current);
            for iface in &def.interfaces {
                let iface = iface.substitute(&subst);
                if !result.contains(&iface) {
                    result.push(iface.clone());
                    pending.push(iface);
                }
            }
            if def.is_interface() && &current != ty && !result.contains(&current) {
                result.push(current);
            }
        }
        result
    }

    /// Whether `ty` is `target` or derives from it (classes only).
    pub fn derives_from(&self, ty: &Ty, target: TypeHash) -> bool {
        ty.definition() == Some(target)
            || self
                .base_chain(ty)
                .iter()
                .any(|base| base.definition() == Some(target))
    }

    /// Whether `ty` is, derives from, or implements the definition `target`.
    pub fn is_subtype_of(&self, ty: &Ty, target: TypeHash) -> bool {
        self.derives_from(ty, target)
            || self
                .all_interfaces(ty)
                .iter()
                .any(|iface| iface.definition() == Some(target))
    }

    pub fn is_value_type(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Special(special) => special.is_value_type(),
            Ty::Named(_) => self.def_of(ty).is_some_and(|def| def.is_value_type()),
            Ty::Tuple(_) | Ty::Pointer(_) | Ty::FunctionPointer(_) => true,
            Ty::TypeParam(param) => self
                .type_param(param.hash)
                .is_some_and(|tp| tp.has_value_type_constraint),
            _ => false,
        }
    }

    pub fn is_reference_type(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Special(SpecialType::Void) => false,
            Ty::Special(special) => !special.is_value_type(),
            Ty::Named(_) => self.def_of(ty).is_some_and(|def| !def.is_value_type()),
            Ty::Array(_) | Ty::Dynamic | Ty::Null => true,
            Ty::TypeParam(param) => self.type_param(param.hash).is_some_and(|tp| {
                tp.has_reference_type_constraint
                    || tp
                        .constraint_types
                        .iter()
                        .any(|c| self.def_of(c).is_some_and(|d| d.kind == TypeKind::Class))
            }),
            _ => false,
        }
    }

    pub fn is_delegate_type(&self, ty: &Ty) -> bool {
        self.def_of(ty).is_some_and(|def| def.is_delegate())
    }

    /// The `Invoke` method of a delegate type, substituted.
    pub fn delegate_invoke(&self, ty: &Ty) -> Option<MethodSymbol> {
        let def = self.def_of(ty)?;
        let invoke = def.delegate_invoke()?;
        Some(MethodSymbol::new(
            invoke.clone(),
            ty.clone(),
            &self.substitution_for(ty),
        ))
    }

    // ==========================================================================
    // Accessibility
    // ==========================================================================

    /// Whether `inner` is `outer` or nested (at any depth) inside it.
    pub fn is_nested_within(&self, inner: TypeHash, outer: TypeHash) -> bool {
        let mut current = Some(inner);
        while let Some(hash) = current {
            if hash == outer {
                return true;
            }
            current = self.get(hash).and_then(|def| def.containing_type);
        }
        false
    }

    /// Whether a member declared in `owner` with `accessibility` can be
    /// reached from code inside `within` (`None` for namespace-level code).
    pub fn is_accessible(
        &self,
        accessibility: Accessibility,
        owner: TypeHash,
        within: Option<TypeHash>,
    ) -> bool {
        if !accessibility.is_private() && !accessibility.requires_derivation() {
            return true;
        }
        let Some(within) = within else {
            return false;
        };
        if self.is_nested_within(within, owner) {
            return true;
        }
        if accessibility.is_private() {
            return false;
        }
        // Protected: any enclosing type of the caller that derives from owner.
        let mut current = Some(within);
        while let Some(hash) = current {
            let Some(def) = self.get(hash) else {
                break;
            };
            if self.derives_from(&def.self_type(), owner) {
                return true;
            }
            current = def.containing_type;
        }
        false
    }

    /// Whether a type itself is reachable, taking containing types into account.
    pub fn is_type_accessible(&self, def: &TypeDef, within: Option<TypeHash>) -> bool {
        match def.containing_type {
            None => true,
            Some(container) => {
                self.is_accessible(def.accessibility, container, within)
                    && self
                        .get(container)
                        .is_none_or(|outer| self.is_type_accessible(outer, within))
            }
        }
    }
}

fn is_special_hash(hash: TypeHash) -> bool {
    SpecialType::ALL.iter().any(|s| s.type_hash() == hash)
}

/// Definitions for the predefined types and the library members the binder
/// relies on (`Length`, `this[int]`, `Substring`, `GetEnumerator`, ...).
fn special_type_defs() -> Vec<TypeDef> {
    use SpecialType as S;

    let object = TypeDef::special(TypeKind::Class, S::Object)
        .with_constructor(MethodDef::constructor(vec![]))
        .with_method(MethodDef::new("ToString", vec![], Ty::STRING).as_virtual())
        .with_method(
            MethodDef::new("Equals", vec![ParamDef::new("obj", Ty::OBJECT)], Ty::BOOL).as_virtual(),
        )
        .with_method(MethodDef::new("GetHashCode", vec![], Ty::INT).as_virtual());

    let enumerable = TypeDef::special(TypeKind::Interface, S::IEnumerable)
        .with_method(MethodDef::new("GetEnumerator", vec![], Ty::OBJECT).as_abstract());

    let mut string = TypeDef::special(TypeKind::Class, S::String)
        .with_interface(Ty::Special(S::IEnumerable))
        .with_property(PropertyDef::new("Length", Ty::INT))
        .with_property(PropertyDef::indexer(
            Ty::CHAR,
            vec![ParamDef::new("index", Ty::INT)],
        ))
        .with_method(MethodDef::new(
            "Substring",
            vec![ParamDef::new("startIndex", Ty::INT)],
            Ty::STRING,
        ))
        .with_method(MethodDef::new(
            "Substring",
            vec![
                ParamDef::new("startIndex", Ty::INT),
                ParamDef::new("length", Ty::INT),
            ],
            Ty::STRING,
        ))
        .with_method(
            MethodDef::new(
                "Concat",
                vec![ParamDef::new("a", Ty::STRING), ParamDef::new("b", Ty::STRING)],
                Ty::STRING,
            )
            .as_static(),
        );
    string.is_sealed = true;

    let index = TypeDef::special(TypeKind::Struct, S::Index)
        .with_constructor(MethodDef::constructor(vec![
            ParamDef::new("value", Ty::INT),
            ParamDef::new("fromEnd", Ty::BOOL).with_default(ConstantValue::Bool(false)),
        ]))
        .with_property(PropertyDef::new("Value", Ty::INT))
        .with_property(PropertyDef::new("IsFromEnd", Ty::BOOL))
        .with_method(MethodDef::new(
            "GetOffset",
            vec![ParamDef::new("length", Ty::INT)],
            Ty::INT,
        ))
        .with_method(MethodDef::operator(
            "op_Implicit",
            vec![ParamDef::new("value", Ty::INT)],
            Ty::INDEX,
        ));

    let range = TypeDef::special(TypeKind::Struct, S::Range)
        .with_constructor(MethodDef::constructor(vec![
            ParamDef::new("start", Ty::INDEX),
            ParamDef::new("end", Ty::INDEX),
        ]))
        .with_property(PropertyDef::new("Start", Ty::INDEX))
        .with_property(PropertyDef::new("End", Ty::INDEX));

    let array = TypeDef::special(TypeKind::Class, S::Array)
        .as_abstract()
        .with_interface(Ty::Special(S::IEnumerable))
        .with_property(PropertyDef::new("Length", Ty::INT))
        .with_property(PropertyDef::new("Rank", Ty::INT));

    let mut defs = vec![
        object,
        TypeDef::special(TypeKind::Class, S::ValueType).as_abstract(),
        TypeDef::special(TypeKind::Class, S::Enum)
            .as_abstract()
            .with_base(Ty::Special(S::ValueType)),
        TypeDef::special(TypeKind::Class, S::Delegate).as_abstract(),
        TypeDef::special(TypeKind::Class, S::Type)
            .as_abstract()
            .with_property(PropertyDef::new("Name", Ty::STRING)),
        enumerable,
        string,
        index,
        range,
        array,
        TypeDef::special(TypeKind::Struct, S::Void),
    ];

    for special in S::ALL.into_iter().filter(|s| s.is_numeric() || *s == S::Bool) {
        let mut def = TypeDef::special(TypeKind::Struct, special);
        if special.is_integral() && special != S::Char {
            def = def
                .with_field(FieldDef::new("MaxValue", Ty::Special(special)).as_const(max_value(special)))
                .with_field(FieldDef::new("MinValue", Ty::Special(special)).as_const(min_value(special)));
        }
        defs.push(def);
    }
    defs
}

fn max_value(special: SpecialType) -> ConstantValue {
    match special {
        SpecialType::SByte => ConstantValue::Int(i8::MAX.into()),
        SpecialType::Byte => ConstantValue::Int(u8::MAX.into()),
        SpecialType::Int16 => ConstantValue::Int(i16::MAX.into()),
        SpecialType::UInt16 => ConstantValue::Int(u16::MAX.into()),
        SpecialType::UInt32 => ConstantValue::UInt(u32::MAX),
        SpecialType::Int64 => ConstantValue::Long(i64::MAX),
        SpecialType::UInt64 => ConstantValue::ULong(u64::MAX),
        _ => ConstantValue::Int(i32::MAX),
    }
}

fn min_value(special: SpecialType) -> ConstantValue {
    match special {
        SpecialType::SByte => ConstantValue::Int(i8::MIN.into()),
        SpecialType::Int16 => ConstantValue::Int(i16::MIN.into()),
        SpecialType::Int32 => ConstantValue::Int(i32::MIN),
        SpecialType::Int64 => ConstantValue::Long(i64::MIN),
        SpecialType::UInt32 => ConstantValue::UInt(0),
        SpecialType::UInt64 => ConstantValue::ULong(0),
        _ => ConstantValue::Int(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        SymbolTable::with_special_types()
    }

    #[test]
    fn special_types_are_registered() {
        let table = table();
        for special in SpecialType::ALL {
            assert!(
                table.get(special.type_hash()).is_some(),
                "{special:?} missing"
            );
        }
        let string = table.def_of(&Ty::STRING).unwrap();
        assert_eq!(string.indexers().count(), 1);
        assert!(string.find_property("Length").is_some());
    }

    #[test]
    fn duplicate_types_are_rejected() {
        let mut table = table();
        table.register_type(TypeDef::class("App.Widget")).unwrap();
        let err = table.register_type(TypeDef::class("App.Widget")).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateType { name } if name == "App.Widget"));
    }

    #[test]
    fn unknown_base_is_rejected() {
        let mut table = table();
        let base = Ty::named(TypeHash::from_name("App.Missing"), "App.Missing");
        let err = table
            .register_type(TypeDef::class("App.Derived").with_base(base))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::UnknownType { .. }));
    }

    #[test]
    fn types_are_indexed_by_namespace() {
        let mut table = table();
        table.register_type(TypeDef::class("Geo.Shapes.Circle")).unwrap();
        let ns = table.namespaces().get_path("Geo.Shapes").unwrap();
        assert_eq!(table.namespaces().types_named(ns, "Circle").len(), 1);
        let system = table.namespaces().get_path("System").unwrap();
        assert_eq!(table.namespaces().types_named(system, "String").len(), 1);
    }

    #[test]
    fn base_chain_reaches_object() {
        let mut table = table();
        table.register_type(TypeDef::class("Animal")).unwrap();
        let animal = table.type_named("Animal").unwrap();
        table
            .register_type(TypeDef::class("Dog").with_base(animal.clone()))
            .unwrap();
        let dog = table.type_named("Dog").unwrap();
        assert_eq!(table.base_chain(&dog), vec![animal, Ty::OBJECT]);
        assert!(table.derives_from(&dog, TypeHash::from_name("Animal")));
    }

    #[test]
    fn generic_bases_are_substituted() {
        let mut table = table();
        let boxed = TypeDef::class("Box").generic(&["T"]);
        let t = boxed.type_param(0);
        let boxed = boxed.with_field(FieldDef::new("value", t));
        let box_hash = table.register_type(boxed).unwrap();
        let box_of_int = Ty::generic(box_hash, "Box", vec![Ty::INT]);
        table
            .register_type(TypeDef::class("IntBox").with_base(box_of_int.clone()))
            .unwrap();
        let int_box = table.type_named("IntBox").unwrap();
        assert_eq!(table.base_type(&int_box), Some(box_of_int.clone()));

        let subst = table.substitution_for(&box_of_int);
        let def = table.get(box_hash).unwrap();
        assert_eq!(def.fields[0].ty.substitute(&subst), Ty::INT);
    }

    #[test]
    fn interfaces_are_collected_transitively() {
        let mut table = table();
        let readable = table.register_type(TypeDef::interface("IReadable")).unwrap();
        let readable = Ty::named(readable, "IReadable");
        let stream = table
            .register_type(TypeDef::interface("IStream").with_interface(readable.clone()))
            .unwrap();
        let stream = Ty::named(stream, "IStream");
        table
            .register_type(TypeDef::class("File").with_interface(stream.clone()))
            .unwrap();
        let file = table.type_named("File").unwrap();
        let all = table.all_interfaces(&file);
        assert!(all.contains(&readable));
        assert!(all.contains(&stream));
        assert!(table.is_subtype_of(&file, TypeHash::from_name("IReadable")));
    }

    #[test]
    fn strings_are_enumerable() {
        let table = table();
        assert!(table.is_subtype_of(&Ty::STRING, SpecialType::IEnumerable.type_hash()));
        assert!(table.is_subtype_of(&Ty::array(Ty::INT, 1), SpecialType::IEnumerable.type_hash()));
    }

    #[test]
    fn private_access_requires_nesting() {
        let mut table = table();
        let outer = table.register_type(TypeDef::class("Outer")).unwrap();
        let inner = table
            .register_type(TypeDef::class("Outer.Inner").nested_in(outer))
            .unwrap();
        let other = table.register_type(TypeDef::class("Other")).unwrap();

        assert!(table.is_accessible(Accessibility::Private, outer, Some(outer)));
        assert!(table.is_accessible(Accessibility::Private, outer, Some(inner)));
        assert!(!table.is_accessible(Accessibility::Private, outer, Some(other)));
        assert!(!table.is_accessible(Accessibility::Private, outer, None));
        assert!(table.is_accessible(Accessibility::Internal, outer, None));
    }

    #[test]
    fn protected_access_requires_derivation() {
        let mut table = table();
        let base = table.register_type(TypeDef::class("Base")).unwrap();
        let base_ty = Ty::named(base, "Base");
        let derived = table
            .register_type(TypeDef::class("Derived").with_base(base_ty))
            .unwrap();
        let other = table.register_type(TypeDef::class("Other")).unwrap();

        assert!(table.is_accessible(Accessibility::Protected, base, Some(derived)));
        assert!(!table.is_accessible(Accessibility::Protected, base, Some(other)));
    }

    #[test]
    fn value_and_reference_types() {
        let mut table = table();
        table.register_type(TypeDef::structure("Point")).unwrap();
        let point = table.type_named("Point").unwrap();
        assert!(table.is_value_type(&point));
        assert!(!table.is_reference_type(&point));
        assert!(table.is_reference_type(&Ty::STRING));
        assert!(table.is_reference_type(&Ty::array(Ty::INT, 1)));
        assert!(table.is_value_type(&Ty::INT));
    }

    #[test]
    fn extension_methods_are_indexed() {
        let mut table = table();
        let ext = TypeDef::class("System.Linq.Enumerable").as_static().with_method(
            MethodDef::extension(
                "Count",
                vec![ParamDef::new("source", Ty::Special(SpecialType::IEnumerable))],
                Ty::INT,
            ),
        );
        table.register_type(ext).unwrap();
        let linq = table.namespaces().get_path("System.Linq").unwrap();
        assert_eq!(table.namespaces().extension_methods(linq, "Count").len(), 1);
    }
}
