//! Symbols: what a name resolves to.
//!
//! Member symbols pair a shared definition with the (possibly constructed)
//! container it was found in, and carry member types with the container's
//! type arguments already substituted. Symbols are produced by lookup and
//! consumed read-only by the binder.

use std::fmt;
use std::rc::Rc;

use crate::{
    ConstantValue, EventDef, FieldDef, MethodDef, ParamDef, PropertyDef, RefKind, Span,
    Substitution, Ty,
};

/// Identity of a namespace within a symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(pub u32);

/// A parameter as seen through a constructed member.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: Rc<str>,
    pub ty: Ty,
    pub ref_kind: RefKind,
    pub is_params: bool,
    pub default: Option<ConstantValue>,
}

impl ParamInfo {
    pub fn from_def(def: &ParamDef, subst: &Substitution) -> Self {
        Self {
            name: def.name.as_str().into(),
            ty: def.ty.substitute(subst),
            ref_kind: def.ref_kind,
            is_params: def.is_params,
            default: def.default.clone(),
        }
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

// ============================================================================
// Source-level symbols
// ============================================================================

/// A local variable.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSymbol {
    pub name: Rc<str>,
    /// `None` while an implicitly typed (`var`) local's initializer is
    /// still being bound.
    pub ty: Option<Ty>,
    pub declared_at: Span,
    pub is_readonly: bool,
    /// Value of a `const` local.
    pub constant: Option<ConstantValue>,
}

impl LocalSymbol {
    pub fn new(name: impl Into<Rc<str>>, ty: Ty, declared_at: Span) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            declared_at,
            is_readonly: false,
            constant: None,
        }
    }

    /// A `var` local whose type has not been inferred yet.
    pub fn inferred(name: impl Into<Rc<str>>, declared_at: Span) -> Self {
        Self {
            name: name.into(),
            ty: None,
            declared_at,
            is_readonly: false,
            constant: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSymbol {
    pub name: Rc<str>,
    pub ty: Ty,
    pub ref_kind: RefKind,
    pub ordinal: usize,
}

/// A query range variable (`from x in ...`).
#[derive(Debug, Clone, PartialEq)]
pub struct RangeVariableSymbol {
    pub name: Rc<str>,
    pub ty: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelSymbol {
    pub name: Rc<str>,
}

// ============================================================================
// Member symbols
// ============================================================================

#[derive(Debug, Clone)]
pub struct FieldSymbol {
    pub def: Rc<FieldDef>,
    pub container: Ty,
    pub ty: Ty,
}

#[derive(Debug, Clone)]
pub struct PropertySymbol {
    pub def: Rc<PropertyDef>,
    pub container: Ty,
    pub ty: Ty,
    pub params: Rc<[ParamInfo]>,
}

#[derive(Debug, Clone)]
pub struct MethodSymbol {
    pub def: Rc<MethodDef>,
    pub container: Ty,
    pub params: Rc<[ParamInfo]>,
    pub return_type: Ty,
    /// Explicit or inferred method type arguments, empty for non-generic methods.
    pub type_args: Rc<[Ty]>,
}

#[derive(Debug, Clone)]
pub struct EventSymbol {
    pub def: Rc<EventDef>,
    pub container: Ty,
    pub ty: Ty,
}

impl FieldSymbol {
    pub fn new(def: Rc<FieldDef>, container: Ty, subst: &Substitution) -> Self {
        let ty = def.ty.substitute(subst);
        Self { def, container, ty }
    }
}

impl PropertySymbol {
    pub fn new(def: Rc<PropertyDef>, container: Ty, subst: &Substitution) -> Self {
        let ty = def.ty.substitute(subst);
        let params = def
            .params
            .iter()
            .map(|p| ParamInfo::from_def(p, subst))
            .collect();
        Self {
            def,
            container,
            ty,
            params,
        }
    }

    pub fn is_indexer(&self) -> bool {
        self.def.is_indexer()
    }
}

impl MethodSymbol {
    pub fn new(def: Rc<MethodDef>, container: Ty, subst: &Substitution) -> Self {
        let params = def
            .params
            .iter()
            .map(|p| ParamInfo::from_def(p, subst))
            .collect();
        let return_type = def.return_type.substitute(subst);
        Self {
            def,
            container,
            params,
            return_type,
            type_args: Rc::from(Vec::new()),
        }
    }

    /// Construct a generic method with method type arguments.
    ///
    /// `container_subst` is the substitution that produced this symbol; it is
    /// combined with the method's own parameters.
    pub fn construct(&self, type_args: Vec<Ty>, container_subst: &Substitution) -> MethodSymbol {
        let hashes: Vec<_> = self.def.type_params.iter().map(|tp| tp.hash).collect();
        let mut subst = container_subst.clone();
        subst.extend(&Substitution::from_pairs(&hashes, &type_args));
        let mut constructed = MethodSymbol::new(self.def.clone(), self.container.clone(), &subst);
        constructed.type_args = Rc::from(type_args);
        constructed
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn is_static(&self) -> bool {
        self.def.is_static
    }

    pub fn is_generic_definition(&self) -> bool {
        !self.def.type_params.is_empty() && self.type_args.is_empty()
    }
}

impl PartialEq for FieldSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.def.hash == other.def.hash && self.container == other.container
    }
}

impl PartialEq for PropertySymbol {
    fn eq(&self, other: &Self) -> bool {
        self.def.hash == other.def.hash && self.container == other.container
    }
}

impl PartialEq for MethodSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.def.hash == other.def.hash
            && self.container == other.container
            && self.type_args == other.type_args
    }
}

impl PartialEq for EventSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.def.hash == other.def.hash && self.container == other.container
    }
}

// ============================================================================
// Namespaces and aliases
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceSymbol {
    pub id: NamespaceId,
    /// Fully qualified path, empty for the global namespace.
    pub path: Rc<str>,
}

impl NamespaceSymbol {
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AliasTarget {
    Namespace(NamespaceSymbol),
    Type(Ty),
}

/// A `using Alias = ...;` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasSymbol {
    pub name: Rc<str>,
    pub target: AliasTarget,
}

// ============================================================================
// Symbol
// ============================================================================

/// Anything a name can resolve to.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Local(Rc<LocalSymbol>),
    Parameter(Rc<ParameterSymbol>),
    Field(FieldSymbol),
    Property(PropertySymbol),
    Event(EventSymbol),
    Method(MethodSymbol),
    NamedType(Ty),
    TypeParameter(Ty),
    Namespace(NamespaceSymbol),
    Alias(Rc<AliasSymbol>),
    Label(Rc<LabelSymbol>),
    RangeVariable(Rc<RangeVariableSymbol>),
}

/// Symbol categories, for diagnostics and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Local,
    Parameter,
    Field,
    Property,
    Event,
    Method,
    NamedType,
    TypeParameter,
    Namespace,
    Alias,
    Label,
    RangeVariable,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SymbolKind::Local => "local variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::Event => "event",
            SymbolKind::Method => "method",
            SymbolKind::NamedType => "type",
            SymbolKind::TypeParameter => "type parameter",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Alias => "alias",
            SymbolKind::Label => "label",
            SymbolKind::RangeVariable => "range variable",
        };
        write!(f, "{text}")
    }
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Local(_) => SymbolKind::Local,
            Symbol::Parameter(_) => SymbolKind::Parameter,
            Symbol::Field(_) => SymbolKind::Field,
            Symbol::Property(_) => SymbolKind::Property,
            Symbol::Event(_) => SymbolKind::Event,
            Symbol::Method(_) => SymbolKind::Method,
            Symbol::NamedType(_) => SymbolKind::NamedType,
            Symbol::TypeParameter(_) => SymbolKind::TypeParameter,
            Symbol::Namespace(_) => SymbolKind::Namespace,
            Symbol::Alias(_) => SymbolKind::Alias,
            Symbol::Label(_) => SymbolKind::Label,
            Symbol::RangeVariable(_) => SymbolKind::RangeVariable,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Symbol::Local(local) => local.name.to_string(),
            Symbol::Parameter(param) => param.name.to_string(),
            Symbol::Field(field) => field.def.name.clone(),
            Symbol::Property(property) => property.def.name.clone(),
            Symbol::Event(event) => event.def.name.clone(),
            Symbol::Method(method) => method.def.name.clone(),
            Symbol::NamedType(ty) | Symbol::TypeParameter(ty) => ty.to_string(),
            Symbol::Namespace(ns) => ns.path.to_string(),
            Symbol::Alias(alias) => alias.name.to_string(),
            Symbol::Label(label) => label.name.to_string(),
            Symbol::RangeVariable(range) => range.name.to_string(),
        }
    }

    /// Whether the symbol denotes a readable value.
    pub fn can_be_read(&self) -> bool {
        match self {
            Symbol::Local(_) | Symbol::Parameter(_) | Symbol::RangeVariable(_) => true,
            Symbol::Field(_) | Symbol::Event(_) => true,
            Symbol::Property(property) => property.def.getter.is_some(),
            _ => false,
        }
    }

    /// Whether the symbol denotes a storage location that may be written.
    ///
    /// Readonly fields are reported as assignable here; whether the current
    /// member is a constructor of the owner is the binder's decision.
    pub fn can_be_assigned(&self) -> bool {
        match self {
            Symbol::Local(local) => !local.is_readonly && local.constant.is_none(),
            Symbol::Parameter(param) => param.ref_kind != RefKind::In,
            Symbol::Field(field) => field.def.constant.is_none(),
            Symbol::Property(property) => property.def.setter.is_some(),
            _ => false,
        }
    }

    /// The type declaring this member, if it is a member.
    pub fn containing_type(&self) -> Option<&Ty> {
        match self {
            Symbol::Field(field) => Some(&field.container),
            Symbol::Property(property) => Some(&property.container),
            Symbol::Event(event) => Some(&event.container),
            Symbol::Method(method) => Some(&method.container),
            _ => None,
        }
    }

    /// Whether using the symbol requires an instance receiver.
    pub fn requires_instance(&self) -> bool {
        match self {
            Symbol::Field(field) => !field.def.is_static,
            Symbol::Property(property) => !property.def.is_static,
            Symbol::Event(event) => !event.def.is_static,
            Symbol::Method(method) => !method.def.is_static,
            _ => false,
        }
    }

    pub fn is_invocable(&self) -> bool {
        matches!(self, Symbol::Method(_))
    }

    /// The type of the value this symbol denotes, if it denotes a value.
    pub fn value_type(&self) -> Option<Ty> {
        match self {
            Symbol::Local(local) => local.ty.clone(),
            Symbol::Parameter(param) => Some(param.ty.clone()),
            Symbol::RangeVariable(range) => Some(range.ty.clone()),
            Symbol::Field(field) => Some(field.ty.clone()),
            Symbol::Property(property) => Some(property.ty.clone()),
            Symbol::Event(event) => Some(event.ty.clone()),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodSymbol> {
        match self {
            Symbol::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertySymbol> {
        match self {
            Symbol::Property(property) => Some(property),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Accessibility, TypeDef};

    fn widget() -> TypeDef {
        TypeDef::class("Widget")
            .with_field(FieldDef::new("count", Ty::INT))
            .with_field(FieldDef::new("Max", Ty::INT).as_const(ConstantValue::Int(9)))
            .with_property(PropertyDef::new("Name", Ty::STRING))
            .with_property(PropertyDef::new("Tag", Ty::STRING).with_setter())
            .with_method(MethodDef::new("Run", vec![], Ty::VOID).as_static())
    }

    #[test]
    fn capabilities_follow_definitions() {
        let def = widget();
        let container = def.self_type();
        let subst = Substitution::new();
        let count = Symbol::Field(FieldSymbol::new(def.fields[0].clone(), container.clone(), &subst));
        let max = Symbol::Field(FieldSymbol::new(def.fields[1].clone(), container.clone(), &subst));
        let name = Symbol::Property(PropertySymbol::new(def.properties[0].clone(), container.clone(), &subst));
        let tag = Symbol::Property(PropertySymbol::new(def.properties[1].clone(), container.clone(), &subst));
        let run = Symbol::Method(MethodSymbol::new(def.methods[0].clone(), container.clone(), &subst));

        assert!(count.can_be_assigned() && count.requires_instance());
        assert!(!max.can_be_assigned() && !max.requires_instance());
        assert!(name.can_be_read() && !name.can_be_assigned());
        assert!(tag.can_be_assigned());
        assert!(run.is_invocable() && !run.requires_instance());
        assert_eq!(run.containing_type(), Some(&container));
    }

    #[test]
    fn member_types_are_substituted() {
        let def = TypeDef::class("Box").generic(&["T"]);
        let t = def.type_param(0);
        let def = def.with_property(PropertyDef::new("Value", t));
        let hashes: Vec<_> = def.type_params.iter().map(|p| p.hash).collect();
        let subst = Substitution::from_pairs(&hashes, &[Ty::STRING]);
        let container = def.construct(vec![Ty::STRING]);

        let value = PropertySymbol::new(def.properties[0].clone(), container, &subst);
        assert_eq!(value.ty, Ty::STRING);
    }

    #[test]
    fn generic_methods_construct() {
        let method = MethodDef::new("Echo", vec![], Ty::VOID).generic(&["T"]);
        let t = method.type_param(0);
        let method = method.with_params(vec![ParamDef::new("value", t.clone())]);
        let def = TypeDef::class("Util").with_method(method.with_accessibility(Accessibility::Public));
        let open = MethodSymbol::new(def.methods[0].clone(), def.self_type(), &Substitution::new());
        assert!(open.is_generic_definition());

        let closed = open.construct(vec![Ty::INT], &Substitution::new());
        assert_eq!(closed.params[0].ty, Ty::INT);
        assert!(!closed.is_generic_definition());
    }

    #[test]
    fn locals_track_inference() {
        let local = LocalSymbol::inferred("x", Span::new(1, 5, 1));
        assert!(Symbol::Local(Rc::new(local)).value_type().is_none());
    }
}
