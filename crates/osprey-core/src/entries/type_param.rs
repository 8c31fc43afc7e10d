use crate::{Ty, TypeHash};

/// A type parameter declared by a type or a generic method.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamDef {
    pub name: String,
    pub hash: TypeHash,
    pub ordinal: usize,
    /// `new()` constraint.
    pub has_constructor_constraint: bool,
    /// `struct` constraint; implies a parameterless constructor.
    pub has_value_type_constraint: bool,
    /// `class` constraint.
    pub has_reference_type_constraint: bool,
    pub constraint_types: Vec<Ty>,
}

impl TypeParamDef {
    pub fn new(name: impl Into<String>, owner: TypeHash, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            hash: TypeHash::from_type_param(owner, ordinal),
            ordinal,
            has_constructor_constraint: false,
            has_value_type_constraint: false,
            has_reference_type_constraint: false,
            constraint_types: Vec::new(),
        }
    }

    /// The type referring to this parameter.
    pub fn ty(&self) -> Ty {
        Ty::type_param(self.hash, self.name.as_str())
    }

    /// Whether `new T()` is permitted.
    pub fn is_creatable(&self) -> bool {
        self.has_constructor_constraint || self.has_value_type_constraint
    }
}
