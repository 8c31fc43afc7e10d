//! Field, property, method, event and parameter definitions.

use std::fmt;

use crate::{Accessibility, ConstantValue, Ty, TypeHash, TypeParamDef};

/// How an argument or parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefKind {
    #[default]
    None,
    Ref,
    Out,
    In,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RefKind::None => "value",
            RefKind::Ref => "ref",
            RefKind::Out => "out",
            RefKind::In => "in",
        };
        write!(f, "{text}")
    }
}

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub ty: Ty,
    pub ref_kind: RefKind,
    /// `params T[]` tail parameter.
    pub is_params: bool,
    /// Default value for an optional parameter.
    pub default: Option<ConstantValue>,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            ref_kind: RefKind::None,
            is_params: false,
            default: None,
        }
    }

    pub fn with_ref_kind(mut self, ref_kind: RefKind) -> Self {
        self.ref_kind = ref_kind;
        self
    }

    pub fn as_params(mut self) -> Self {
        self.is_params = true;
        self
    }

    pub fn with_default(mut self, value: ConstantValue) -> Self {
        self.default = Some(value);
        self
    }
}

// ============================================================================
// Fields
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub hash: TypeHash,
    pub owner: TypeHash,
    pub ty: Ty,
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub is_readonly: bool,
    /// Value of a `const` field.
    pub constant: Option<ConstantValue>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            hash: TypeHash::EMPTY,
            owner: TypeHash::EMPTY,
            ty,
            accessibility: Accessibility::Public,
            is_static: false,
            is_readonly: false,
            constant: None,
        }
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn as_readonly(mut self) -> Self {
        self.is_readonly = true;
        self
    }

    /// Make this a `const` field. Constants are implicitly static.
    pub fn as_const(mut self, value: ConstantValue) -> Self {
        self.constant = Some(value);
        self.is_static = true;
        self
    }
}

// ============================================================================
// Properties and Indexers
// ============================================================================

/// A property, or an indexer when `params` is non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub hash: TypeHash,
    pub owner: TypeHash,
    pub ty: Ty,
    pub params: Vec<ParamDef>,
    pub accessibility: Accessibility,
    /// Getter accessibility, `None` when there is no getter.
    pub getter: Option<Accessibility>,
    /// Setter accessibility, `None` when there is no setter.
    pub setter: Option<Accessibility>,
    pub is_static: bool,
}

impl PropertyDef {
    /// Name under which indexers are registered.
    pub const INDEXER_NAME: &'static str = "this[]";

    /// A public get-only property.
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            hash: TypeHash::EMPTY,
            owner: TypeHash::EMPTY,
            ty,
            params: Vec::new(),
            accessibility: Accessibility::Public,
            getter: Some(Accessibility::Public),
            setter: None,
            is_static: false,
        }
    }

    /// A public get-only indexer.
    pub fn indexer(ty: Ty, params: Vec<ParamDef>) -> Self {
        Self {
            params,
            ..Self::new(Self::INDEXER_NAME, ty)
        }
    }

    pub fn with_setter(mut self) -> Self {
        self.setter = Some(self.accessibility);
        self
    }

    /// Drop the getter, making the property write-only.
    pub fn write_only(mut self) -> Self {
        self.getter = None;
        self.setter = Some(self.accessibility);
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self.getter = self.getter.map(|_| accessibility);
        self.setter = self.setter.map(|_| accessibility);
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn is_indexer(&self) -> bool {
        !self.params.is_empty()
    }
}

// ============================================================================
// Methods
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MethodKind {
    #[default]
    Ordinary,
    Constructor,
    /// The `Invoke` method of a delegate type.
    DelegateInvoke,
    /// A user-defined operator (`op_Addition`, ...).
    Operator,
    /// A user-defined conversion (`op_Implicit`, `op_Explicit`).
    Conversion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub hash: TypeHash,
    pub owner: TypeHash,
    pub kind: MethodKind,
    pub params: Vec<ParamDef>,
    pub return_type: Ty,
    pub type_params: Vec<TypeParamDef>,
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_virtual: bool,
    /// Declared with `this` on the first parameter.
    pub is_extension: bool,
}

impl MethodDef {
    /// A public instance method returning `return_type`.
    pub fn new(name: impl Into<String>, params: Vec<ParamDef>, return_type: Ty) -> Self {
        Self {
            name: name.into(),
            hash: TypeHash::EMPTY,
            owner: TypeHash::EMPTY,
            kind: MethodKind::Ordinary,
            params,
            return_type,
            type_params: Vec::new(),
            accessibility: Accessibility::Public,
            is_static: false,
            is_abstract: false,
            is_virtual: false,
            is_extension: false,
        }
    }

    /// A public constructor.
    pub fn constructor(params: Vec<ParamDef>) -> Self {
        Self {
            kind: MethodKind::Constructor,
            ..Self::new(".ctor", params, Ty::VOID)
        }
    }

    /// A static extension method; the first parameter is the receiver.
    pub fn extension(name: impl Into<String>, params: Vec<ParamDef>, return_type: Ty) -> Self {
        Self {
            is_static: true,
            is_extension: true,
            ..Self::new(name, params, return_type)
        }
    }

    /// A static user-defined operator method.
    pub fn operator(name: impl Into<String>, params: Vec<ParamDef>, return_type: Ty) -> Self {
        let name = name.into();
        let kind = if name == "op_Implicit" || name == "op_Explicit" {
            MethodKind::Conversion
        } else {
            MethodKind::Operator
        };
        Self {
            kind,
            is_static: true,
            ..Self::new(name, params, return_type)
        }
    }

    /// Declare method type parameters.
    ///
    /// Their identity derives from the method name and parameter names, so
    /// declare them before referencing them in parameter types.
    pub fn generic(mut self, names: &[&str]) -> Self {
        let seed = TypeHash::from_name(&format!("{}``{}", self.name, names.join(",")));
        self.type_params = names
            .iter()
            .enumerate()
            .map(|(i, name)| TypeParamDef::new(*name, seed, i))
            .collect();
        self
    }

    /// The type referring to the method's `ordinal`-th type parameter.
    pub fn type_param(&self, ordinal: usize) -> Ty {
        self.type_params
            .get(ordinal)
            .map(TypeParamDef::ty)
            .unwrap_or_else(Ty::unknown)
    }

    pub fn with_params(mut self, params: Vec<ParamDef>) -> Self {
        self.params = params;
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self.is_virtual = true;
        self
    }

    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    /// Number of parameters that must be supplied.
    pub fn required_param_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.default.is_none() && !p.is_params)
            .count()
    }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EventDef {
    pub name: String,
    pub hash: TypeHash,
    pub owner: TypeHash,
    pub ty: Ty,
    pub accessibility: Accessibility,
    pub is_static: bool,
}

impl EventDef {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            hash: TypeHash::EMPTY,
            owner: TypeHash::EMPTY,
            ty,
            accessibility: Accessibility::Public,
            is_static: false,
        }
    }
}
