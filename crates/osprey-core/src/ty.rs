//! The type model shared by the symbol table and the binder.
//!
//! [`Ty`] is a cheap-to-clone, structurally comparable description of a
//! type as it appears in a bound tree:
//!
//! - `Special` for predefined and well-known library types (`int`, `string`,
//!   `System.Index`, ...)
//! - `Named` for user-defined and constructed generic types
//! - `TypeParam`, `Array`, `Pointer`, `FunctionPointer` and `Tuple`
//! - `Dynamic`, the type whose operations are bound at runtime
//! - `Null`, the type of the `null` literal
//! - `Error`, a placeholder standing in for a type that could not be determined

use std::fmt;
use std::rc::Rc;

use crate::TypeHash;

// ============================================================================
// Special Types
// ============================================================================

/// Predefined and well-known library types the binder reasons about directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialType {
    Void,
    Object,
    String,
    Bool,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    ValueType,
    Enum,
    Array,
    Delegate,
    Type,
    Index,
    Range,
    IEnumerable,
}

impl SpecialType {
    /// All special types, in registration order.
    pub const ALL: [SpecialType; 24] = [
        SpecialType::Void,
        SpecialType::Object,
        SpecialType::String,
        SpecialType::Bool,
        SpecialType::Char,
        SpecialType::SByte,
        SpecialType::Byte,
        SpecialType::Int16,
        SpecialType::UInt16,
        SpecialType::Int32,
        SpecialType::UInt32,
        SpecialType::Int64,
        SpecialType::UInt64,
        SpecialType::Single,
        SpecialType::Double,
        SpecialType::Decimal,
        SpecialType::ValueType,
        SpecialType::Enum,
        SpecialType::Array,
        SpecialType::Delegate,
        SpecialType::Type,
        SpecialType::Index,
        SpecialType::Range,
        SpecialType::IEnumerable,
    ];

    /// Fully qualified metadata name.
    pub fn qualified_name(self) -> &'static str {
        match self {
            SpecialType::Void => "System.Void",
            SpecialType::Object => "System.Object",
            SpecialType::String => "System.String",
            SpecialType::Bool => "System.Boolean",
            SpecialType::Char => "System.Char",
            SpecialType::SByte => "System.SByte",
            SpecialType::Byte => "System.Byte",
            SpecialType::Int16 => "System.Int16",
            SpecialType::UInt16 => "System.UInt16",
            SpecialType::Int32 => "System.Int32",
            SpecialType::UInt32 => "System.UInt32",
            SpecialType::Int64 => "System.Int64",
            SpecialType::UInt64 => "System.UInt64",
            SpecialType::Single => "System.Single",
            SpecialType::Double => "System.Double",
            SpecialType::Decimal => "System.Decimal",
            SpecialType::ValueType => "System.ValueType",
            SpecialType::Enum => "System.Enum",
            SpecialType::Array => "System.Array",
            SpecialType::Delegate => "System.Delegate",
            SpecialType::Type => "System.Type",
            SpecialType::Index => "System.Index",
            SpecialType::Range => "System.Range",
            SpecialType::IEnumerable => "System.Collections.IEnumerable",
        }
    }

    /// The simple (unqualified) name.
    pub fn simple_name(self) -> &'static str {
        let name = self.qualified_name();
        name.rsplit('.').next().unwrap_or(name)
    }

    /// The namespace the type lives in.
    pub fn namespace(self) -> &'static str {
        let name = self.qualified_name();
        match name.rfind('.') {
            Some(i) => &name[..i],
            None => "",
        }
    }

    /// The language keyword for this type, if it has one.
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            SpecialType::Void => "void",
            SpecialType::Object => "object",
            SpecialType::String => "string",
            SpecialType::Bool => "bool",
            SpecialType::Char => "char",
            SpecialType::SByte => "sbyte",
            SpecialType::Byte => "byte",
            SpecialType::Int16 => "short",
            SpecialType::UInt16 => "ushort",
            SpecialType::Int32 => "int",
            SpecialType::UInt32 => "uint",
            SpecialType::Int64 => "long",
            SpecialType::UInt64 => "ulong",
            SpecialType::Single => "float",
            SpecialType::Double => "double",
            SpecialType::Decimal => "decimal",
            _ => return None,
        })
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|special| special.keyword() == Some(keyword))
    }

    #[inline]
    pub fn type_hash(self) -> TypeHash {
        TypeHash::from_name(self.qualified_name())
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            SpecialType::SByte
                | SpecialType::Byte
                | SpecialType::Int16
                | SpecialType::UInt16
                | SpecialType::Int32
                | SpecialType::UInt32
                | SpecialType::Int64
                | SpecialType::UInt64
                | SpecialType::Char
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, SpecialType::Single | SpecialType::Double)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral() || self.is_floating() || self == SpecialType::Decimal
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            SpecialType::SByte
                | SpecialType::Int16
                | SpecialType::Int32
                | SpecialType::Int64
                | SpecialType::Single
                | SpecialType::Double
                | SpecialType::Decimal
        )
    }

    /// Size in bytes for types with a fixed unmanaged size.
    pub fn size_of(self) -> Option<u32> {
        Some(match self {
            SpecialType::Bool | SpecialType::SByte | SpecialType::Byte => 1,
            SpecialType::Char | SpecialType::Int16 | SpecialType::UInt16 => 2,
            SpecialType::Int32 | SpecialType::UInt32 | SpecialType::Single => 4,
            SpecialType::Int64 | SpecialType::UInt64 | SpecialType::Double => 8,
            SpecialType::Decimal => 16,
            _ => return None,
        })
    }

    pub fn is_value_type(self) -> bool {
        self.is_numeric()
            || matches!(
                self,
                SpecialType::Bool | SpecialType::Index | SpecialType::Range
            )
    }
}

// ============================================================================
// Ty
// ============================================================================

/// A type as referenced from a bound tree or a member signature.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Special(SpecialType),
    Named(NamedTy),
    TypeParam(TypeParamTy),
    Array(Rc<ArrayTy>),
    Pointer(Rc<Ty>),
    FunctionPointer(Rc<FunctionPointerTy>),
    Tuple(Rc<TupleTy>),
    Dynamic,
    Null,
    Error(ErrorType),
}

/// A reference to a named (possibly constructed generic) type definition.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NamedTy {
    pub def: TypeHash,
    pub name: Rc<str>,
    pub args: Rc<[Ty]>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeParamTy {
    pub hash: TypeHash,
    pub name: Rc<str>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ArrayTy {
    pub element: Ty,
    pub rank: u32,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FunctionPointerTy {
    pub params: Vec<Ty>,
    pub return_type: Ty,
}

/// A tuple type. Element names are informational and do not affect identity
/// conversions.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TupleTy {
    pub elements: Vec<Ty>,
    pub names: Vec<Option<Rc<str>>>,
}

/// Placeholder for a type that could not be determined.
///
/// Carries the name the source used (or the empty string) so diagnostics and
/// tooling can still display something meaningful.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ErrorType {
    pub name: Rc<str>,
    pub arity: usize,
}

impl Ty {
    pub const VOID: Ty = Ty::Special(SpecialType::Void);
    pub const OBJECT: Ty = Ty::Special(SpecialType::Object);
    pub const STRING: Ty = Ty::Special(SpecialType::String);
    pub const BOOL: Ty = Ty::Special(SpecialType::Bool);
    pub const CHAR: Ty = Ty::Special(SpecialType::Char);
    pub const INT: Ty = Ty::Special(SpecialType::Int32);
    pub const UINT: Ty = Ty::Special(SpecialType::UInt32);
    pub const LONG: Ty = Ty::Special(SpecialType::Int64);
    pub const ULONG: Ty = Ty::Special(SpecialType::UInt64);
    pub const FLOAT: Ty = Ty::Special(SpecialType::Single);
    pub const DOUBLE: Ty = Ty::Special(SpecialType::Double);
    pub const DECIMAL: Ty = Ty::Special(SpecialType::Decimal);
    pub const INDEX: Ty = Ty::Special(SpecialType::Index);
    pub const RANGE: Ty = Ty::Special(SpecialType::Range);

    /// A named, non-generic type.
    pub fn named(def: TypeHash, name: impl Into<Rc<str>>) -> Ty {
        Ty::Named(NamedTy {
            def,
            name: name.into(),
            args: Rc::from(Vec::new()),
        })
    }

    /// A constructed generic type.
    pub fn generic(def: TypeHash, name: impl Into<Rc<str>>, args: Vec<Ty>) -> Ty {
        Ty::Named(NamedTy {
            def,
            name: name.into(),
            args: Rc::from(args),
        })
    }

    pub fn type_param(hash: TypeHash, name: impl Into<Rc<str>>) -> Ty {
        Ty::TypeParam(TypeParamTy {
            hash,
            name: name.into(),
        })
    }

    pub fn array(element: Ty, rank: u32) -> Ty {
        Ty::Array(Rc::new(ArrayTy { element, rank }))
    }

    pub fn pointer(pointee: Ty) -> Ty {
        Ty::Pointer(Rc::new(pointee))
    }

    pub fn tuple(elements: Vec<Ty>, names: Vec<Option<Rc<str>>>) -> Ty {
        let names = if names.len() == elements.len() {
            names
        } else {
            vec![None; elements.len()]
        };
        Ty::Tuple(Rc::new(TupleTy { elements, names }))
    }

    /// An error type carrying the name the source used.
    pub fn error(name: impl Into<Rc<str>>) -> Ty {
        Ty::Error(ErrorType {
            name: name.into(),
            arity: 0,
        })
    }

    /// An anonymous error type.
    pub fn unknown() -> Ty {
        Ty::error("")
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error(_))
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Ty::Dynamic)
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Ty::Special(SpecialType::Void))
    }

    #[inline]
    pub fn is_special(&self, special: SpecialType) -> bool {
        matches!(self, Ty::Special(s) if *s == special)
    }

    /// Pointer and function pointer types, which require an unsafe context.
    #[inline]
    pub fn is_unsafe(&self) -> bool {
        matches!(self, Ty::Pointer(_) | Ty::FunctionPointer(_))
    }

    pub fn as_special(&self) -> Option<SpecialType> {
        match self {
            Ty::Special(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&NamedTy> {
        match self {
            Ty::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayTy> {
        match self {
            Ty::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleTy> {
        match self {
            Ty::Tuple(tuple) => Some(tuple),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<&Ty> {
        match self {
            Ty::Pointer(pointee) => Some(pointee),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_special().is_some_and(SpecialType::is_numeric)
    }

    /// The definition hash this type's members come from.
    ///
    /// Arrays resolve to `System.Array`; type parameters, pointers, tuples
    /// and placeholder types have no member-bearing definition.
    pub fn definition(&self) -> Option<TypeHash> {
        match self {
            Ty::Special(s) => Some(s.type_hash()),
            Ty::Named(named) => Some(named.def),
            Ty::Array(_) => Some(SpecialType::Array.type_hash()),
            _ => None,
        }
    }

    /// Whether this type or any component of it is an error type.
    pub fn contains_error(&self) -> bool {
        match self {
            Ty::Error(_) => true,
            Ty::Named(named) => named.args.iter().any(Ty::contains_error),
            Ty::Array(array) => array.element.contains_error(),
            Ty::Pointer(pointee) => pointee.contains_error(),
            Ty::FunctionPointer(fp) => {
                fp.return_type.contains_error() || fp.params.iter().any(Ty::contains_error)
            }
            Ty::Tuple(tuple) => tuple.elements.iter().any(Ty::contains_error),
            _ => false,
        }
    }

    /// The simple name used when comparing an identifier against this type's
    /// name (`Color Color` detection).
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Ty::Special(s) => Some(s.simple_name()),
            Ty::Named(named) => Some(named.name.rsplit('.').next().unwrap_or(&named.name)),
            Ty::TypeParam(param) => Some(&param.name),
            _ => None,
        }
    }

    /// Replace type parameters according to `subst`.
    pub fn substitute(&self, subst: &Substitution) -> Ty {
        if subst.is_empty() {
            return self.clone();
        }
        match self {
            Ty::TypeParam(param) => subst.get(param.hash).cloned().unwrap_or_else(|| self.clone()),
            Ty::Named(named) if !named.args.is_empty() => Ty::Named(NamedTy {
                def: named.def,
                name: named.name.clone(),
                args: named.args.iter().map(|arg| arg.substitute(subst)).collect(),
            }),
            Ty::Array(array) => Ty::array(array.element.substitute(subst), array.rank),
            Ty::Pointer(pointee) => Ty::pointer(pointee.substitute(subst)),
            Ty::FunctionPointer(fp) => Ty::FunctionPointer(Rc::new(FunctionPointerTy {
                params: fp.params.iter().map(|p| p.substitute(subst)).collect(),
                return_type: fp.return_type.substitute(subst),
            })),
            Ty::Tuple(tuple) => Ty::tuple(
                tuple.elements.iter().map(|e| e.substitute(subst)).collect(),
                tuple.names.clone(),
            ),
            _ => self.clone(),
        }
    }
}

impl From<SpecialType> for Ty {
    fn from(special: SpecialType) -> Self {
        Ty::Special(special)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Special(s) => match s.keyword() {
                Some(keyword) => write!(f, "{keyword}"),
                None => write!(f, "{}", s.qualified_name()),
            },
            Ty::Named(named) => {
                write!(f, "{}", named.name)?;
                if !named.args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in named.args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Ty::TypeParam(param) => write!(f, "{}", param.name),
            Ty::Array(array) => {
                let commas = ",".repeat(array.rank.saturating_sub(1) as usize);
                write!(f, "{}[{commas}]", array.element)
            }
            Ty::Pointer(pointee) => write!(f, "{pointee}*"),
            Ty::FunctionPointer(fp) => {
                write!(f, "delegate*<")?;
                for param in &fp.params {
                    write!(f, "{param}, ")?;
                }
                write!(f, "{}>", fp.return_type)
            }
            Ty::Tuple(tuple) => {
                write!(f, "(")?;
                for (i, element) in tuple.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                    if let Some(Some(name)) = tuple.names.get(i) {
                        write!(f, " {name}")?;
                    }
                }
                write!(f, ")")
            }
            Ty::Dynamic => write!(f, "dynamic"),
            Ty::Null => write!(f, "<null>"),
            Ty::Error(err) if err.name.is_empty() => write!(f, "?"),
            Ty::Error(err) => write!(f, "{}", err.name),
        }
    }
}

impl fmt::Debug for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ty({self})")
    }
}

// ============================================================================
// Substitution
// ============================================================================

/// A mapping from type parameter identities to type arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    pairs: Vec<(TypeHash, Ty)>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair up parameters and arguments. Extra entries on either side are ignored.
    pub fn from_pairs(params: &[TypeHash], args: &[Ty]) -> Self {
        Self {
            pairs: params.iter().copied().zip(args.iter().cloned()).collect(),
        }
    }

    pub fn insert(&mut self, param: TypeHash, arg: Ty) {
        match self.pairs.iter_mut().find(|(p, _)| *p == param) {
            Some(entry) => entry.1 = arg,
            None => self.pairs.push((param, arg)),
        }
    }

    pub fn get(&self, param: TypeHash) -> Option<&Ty> {
        self.pairs.iter().find(|(p, _)| *p == param).map(|(_, ty)| ty)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Combine with another substitution; entries in `other` win.
    pub fn extend(&mut self, other: &Substitution) {
        for (param, arg) in &other.pairs {
            self.insert(*param, arg.clone());
        }
    }
}
