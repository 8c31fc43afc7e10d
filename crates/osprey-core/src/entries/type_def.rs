//! Type definition entry.
//!
//! `TypeDef` covers classes, structs, interfaces, delegates and enums,
//! including generic definitions. Builder methods stamp each member with the
//! owning type's identity as it is added.

use std::rc::Rc;

use crate::{
    Accessibility, EventDef, FieldDef, MethodDef, MethodKind, ParamDef, PropertyDef, SpecialType,
    Ty, TypeHash, TypeParamDef,
};

/// The category of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Delegate,
    Enum,
}

impl TypeKind {
    pub fn is_value_type(self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::Enum)
    }

    /// Human-readable description for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Delegate => "delegate",
            TypeKind::Enum => "enum",
        }
    }
}

/// Registry entry for a type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Unqualified name, without generic arity.
    pub name: String,
    /// Fully qualified name (with namespace), without generic arity.
    pub qualified_name: String,
    /// Namespace path, empty for the global namespace.
    pub namespace: String,
    /// Type hash for identity.
    pub hash: TypeHash,
    pub kind: TypeKind,
    pub accessibility: Accessibility,
    /// Set for predefined and well-known library types.
    pub special: Option<SpecialType>,

    // === Inheritance ===
    pub base: Option<Ty>,
    pub interfaces: Vec<Ty>,

    // === Members ===
    pub type_params: Vec<TypeParamDef>,
    pub fields: Vec<Rc<FieldDef>>,
    /// Properties and indexers.
    pub properties: Vec<Rc<PropertyDef>>,
    pub methods: Vec<Rc<MethodDef>>,
    pub constructors: Vec<Rc<MethodDef>>,
    pub events: Vec<Rc<EventDef>>,
    pub nested_types: Vec<TypeHash>,
    pub containing_type: Option<TypeHash>,

    // === Modifiers ===
    pub is_abstract: bool,
    pub is_static: bool,
    pub is_sealed: bool,
    /// For interfaces: the class that `new I()` instantiates instead.
    pub coclass: Option<TypeHash>,
}

impl TypeDef {
    /// Create a new definition from a qualified name such as `Geo.Shapes.Circle`.
    pub fn new(kind: TypeKind, qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let (namespace, name) = match qualified_name.rfind('.') {
            Some(i) => (
                qualified_name[..i].to_string(),
                qualified_name[i + 1..].to_string(),
            ),
            None => (String::new(), qualified_name.clone()),
        };
        let hash = TypeHash::from_name(&qualified_name);
        let is_value = kind.is_value_type();
        Self {
            name,
            qualified_name,
            namespace,
            hash,
            kind,
            accessibility: Accessibility::Public,
            special: None,
            base: if is_value {
                Some(Ty::Special(SpecialType::ValueType))
            } else {
                None
            },
            interfaces: Vec::new(),
            type_params: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            events: Vec::new(),
            nested_types: Vec::new(),
            containing_type: None,
            is_abstract: kind == TypeKind::Interface,
            is_static: false,
            is_sealed: matches!(kind, TypeKind::Struct | TypeKind::Enum | TypeKind::Delegate),
            coclass: None,
        }
    }

    pub fn class(qualified_name: impl Into<String>) -> Self {
        Self::new(TypeKind::Class, qualified_name)
    }

    pub fn structure(qualified_name: impl Into<String>) -> Self {
        Self::new(TypeKind::Struct, qualified_name)
    }

    pub fn interface(qualified_name: impl Into<String>) -> Self {
        Self::new(TypeKind::Interface, qualified_name)
    }

    /// A delegate type with an `Invoke` method of the given signature.
    pub fn delegate(qualified_name: impl Into<String>, params: Vec<ParamDef>, return_type: Ty) -> Self {
        let mut def = Self::new(TypeKind::Delegate, qualified_name);
        def.base = Some(Ty::Special(SpecialType::Delegate));
        let invoke = MethodDef {
            kind: MethodKind::DelegateInvoke,
            is_virtual: true,
            ..MethodDef::new("Invoke", params, return_type)
        };
        def.with_method(invoke)
    }

    /// A definition for a predefined or well-known type.
    pub fn special(kind: TypeKind, special: SpecialType) -> Self {
        let mut def = Self::new(kind, special.qualified_name());
        def.special = Some(special);
        def
    }

    // === Builder Methods ===

    /// Declare type parameters, making this a generic definition.
    ///
    /// The identity changes to include the arity, so declare type parameters
    /// before adding members.
    pub fn generic(mut self, names: &[&str]) -> Self {
        self.hash = TypeHash::from_name(&format!("{}`{}", self.qualified_name, names.len()));
        self.type_params = names
            .iter()
            .enumerate()
            .map(|(i, name)| TypeParamDef::new(*name, self.hash, i))
            .collect();
        self
    }

    /// Replace the `ordinal`-th type parameter (to attach constraints).
    pub fn with_type_param(mut self, param: TypeParamDef) -> Self {
        if let Some(slot) = self.type_params.get_mut(param.ordinal) {
            *slot = param;
        }
        self
    }

    pub fn with_base(mut self, base: Ty) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_interface(mut self, interface: Ty) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_field(mut self, mut field: FieldDef) -> Self {
        field.owner = self.hash;
        field.hash = TypeHash::from_member(self.hash, &field.name);
        self.fields.push(Rc::new(field));
        self
    }

    pub fn with_property(mut self, mut property: PropertyDef) -> Self {
        property.owner = self.hash;
        let param_hashes: Vec<_> = property.params.iter().map(|p| param_hash(&p.ty)).collect();
        property.hash = if property.is_indexer() {
            TypeHash::from_method(self.hash, &property.name, &param_hashes)
        } else {
            TypeHash::from_member(self.hash, &property.name)
        };
        self.properties.push(Rc::new(property));
        self
    }

    pub fn with_method(mut self, mut method: MethodDef) -> Self {
        method.owner = self.hash;
        let param_hashes: Vec<_> = method.params.iter().map(|p| param_hash(&p.ty)).collect();
        method.hash = TypeHash::from_method(self.hash, &method.name, &param_hashes);
        self.methods.push(Rc::new(method));
        self
    }

    pub fn with_constructor(mut self, mut ctor: MethodDef) -> Self {
        ctor.owner = self.hash;
        ctor.kind = MethodKind::Constructor;
        let param_hashes: Vec<_> = ctor.params.iter().map(|p| param_hash(&p.ty)).collect();
        ctor.hash = TypeHash::from_constructor(self.hash, &param_hashes);
        self.constructors.push(Rc::new(ctor));
        self
    }

    pub fn with_event(mut self, mut event: EventDef) -> Self {
        event.owner = self.hash;
        event.hash = TypeHash::from_member(self.hash, &event.name);
        self.events.push(Rc::new(event));
        self
    }

    /// Record a nested type; the nested definition must point back with
    /// [`TypeDef::nested_in`].
    pub fn with_nested(mut self, nested: TypeHash) -> Self {
        self.nested_types.push(nested);
        self
    }

    pub fn nested_in(mut self, container: TypeHash) -> Self {
        self.containing_type = Some(container);
        self
    }

    /// Link an interface to the class `new I()` should instantiate.
    pub fn with_coclass(mut self, class: TypeHash) -> Self {
        self.coclass = Some(class);
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Static classes are abstract and sealed.
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self.is_abstract = true;
        self.is_sealed = true;
        self
    }

    // === Query Methods ===

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn arity(&self) -> usize {
        self.type_params.len()
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_delegate(&self) -> bool {
        self.kind == TypeKind::Delegate
    }

    pub fn is_value_type(&self) -> bool {
        self.kind.is_value_type() || self.special.is_some_and(SpecialType::is_value_type)
    }

    /// The type referring to the `ordinal`-th type parameter.
    pub fn type_param(&self, ordinal: usize) -> Ty {
        self.type_params
            .get(ordinal)
            .map(TypeParamDef::ty)
            .unwrap_or_else(Ty::unknown)
    }

    /// The type of this definition, constructed over its own type parameters.
    pub fn self_type(&self) -> Ty {
        if let Some(special) = self.special {
            return Ty::Special(special);
        }
        if self.type_params.is_empty() {
            Ty::named(self.hash, self.qualified_name.as_str())
        } else {
            let args = self.type_params.iter().map(TypeParamDef::ty).collect();
            Ty::generic(self.hash, self.qualified_name.as_str(), args)
        }
    }

    /// The type of this definition constructed with `args`.
    pub fn construct(&self, args: Vec<Ty>) -> Ty {
        if let Some(special) = self.special {
            return Ty::Special(special);
        }
        if args.is_empty() {
            Ty::named(self.hash, self.qualified_name.as_str())
        } else {
            Ty::generic(self.hash, self.qualified_name.as_str(), args)
        }
    }

    /// The `Invoke` method of a delegate type.
    pub fn delegate_invoke(&self) -> Option<&Rc<MethodDef>> {
        if !self.is_delegate() {
            return None;
        }
        self.methods
            .iter()
            .find(|m| m.kind == MethodKind::DelegateInvoke)
    }

    pub fn find_field(&self, name: &str) -> Option<&Rc<FieldDef>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn find_property(&self, name: &str) -> Option<&Rc<PropertyDef>> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn find_methods<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Rc<MethodDef>> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn indexers(&self) -> impl Iterator<Item = &Rc<PropertyDef>> {
        self.properties.iter().filter(|p| p.is_indexer())
    }
}

fn param_hash(ty: &Ty) -> TypeHash {
    TypeHash::from_name(&ty.to_string())
}
