//! Type conversion classification.
//!
//! This module decides whether a value of one type converts to another and
//! at what cost. It is consulted for:
//!
//! - Implicit conversions (arguments, assignments, initializer values)
//! - Explicit casts
//! - Overload resolution, where lower total cost wins
//!
//! ## Conversion Priority
//!
//! Conversions are classified in this order:
//! 1. Identity (including tuples differing only in element names)
//! 2. Dynamic (to and from `dynamic`)
//! 3. Null literal to reference and pointer types
//! 4. Numeric (implicit widening, explicit narrowing)
//! 5. Tuples, element-wise
//! 6. Reference (derived to base, class to interface, array covariance)
//! 7. Boxing and unboxing
//! 8. Pointers
//! 9. Enums
//! 10. User-defined (`op_Implicit`, `op_Explicit`)
//!
//! Conversions from expressions that have no type of their own (lambdas,
//! method groups, `default`, target-typed conditionals) are classified by
//! the binder, which owns the expression; see `expr::convert`.

mod classifier;
mod numeric;

use osprey_core::{ConstantValue, MethodSymbol, Ty};
use osprey_symbols::SymbolTable;

pub use classifier::DefaultConversions;
pub use numeric::{
    binary_promotion, explicit_numeric_exists, implicit_numeric_exists, numeric_rank,
    unary_promotion,
};

// ============================================================================
// Costs
// ============================================================================

/// Identity conversion.
pub const COST_IDENTITY: u32 = 0;
/// Untyped forms converted to their target (lambdas, `default`, `null`).
pub const COST_TARGET_TYPED: u32 = 1;
/// Implicit constant conversion (`1` to `byte`).
pub const COST_CONSTANT: u32 = 2;
/// Base cost of implicit numeric widening; the target's rank is added so
/// narrower targets win.
pub const COST_NUMERIC: u32 = 3;
/// Base cost of implicit reference conversions; inheritance distance is
/// added so nearer bases win.
pub const COST_REFERENCE: u32 = 20;
pub const COST_BOXING: u32 = 40;
pub const COST_DYNAMIC: u32 = 50;
pub const COST_USER_DEFINED: u32 = 60;
/// Conversions involving error types; applicable, but never preferred.
pub const COST_ERROR: u32 = 500;
/// Explicit-only conversions.
pub const COST_EXPLICIT: u32 = 1000;

// ============================================================================
// Conversion
// ============================================================================

/// A classified conversion with its cost for overload resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// The kind of conversion being performed.
    pub kind: ConversionKind,
    /// The cost of this conversion (lower is better).
    pub cost: u32,
    /// Whether this conversion can be applied implicitly.
    pub is_implicit: bool,
}

/// The kind of conversion being performed.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionKind {
    /// No conversion exists.
    NoConversion,
    /// No conversion needed (exact match).
    Identity,
    /// `int` to `long`, `float` to `double`, ...
    ImplicitNumeric,
    /// `long` to `int`, `double` to `float`, ...
    ExplicitNumeric,
    /// A constant expression whose value fits the target integral type.
    ImplicitConstant,
    /// `null` to a reference type.
    NullLiteral,
    /// `default` to any type.
    DefaultLiteral,
    /// Derived to base, class to interface, array covariance.
    ImplicitReference,
    /// Base to derived, interface to class.
    ExplicitReference,
    /// Value type to `object`, `ValueType` or an implemented interface.
    Boxing,
    Unboxing,
    /// Anything to `dynamic`, and `dynamic` to anything.
    ImplicitDynamic,
    ExplicitDynamic,
    /// Element-wise tuple conversion.
    ImplicitTuple,
    ExplicitTuple,
    /// Any pointer to `void*`.
    PointerToVoid,
    /// `null` to a pointer type.
    NullToPointer,
    /// Pointer to pointer, pointer to integer and back.
    ExplicitPointer,
    /// Constant `0` to an enum.
    ImplicitEnumeration,
    /// Enum to numeric and back.
    ExplicitEnumeration,
    /// `op_Implicit` / `op_Explicit`.
    UserDefined(MethodSymbol),
    /// Method group to delegate.
    MethodGroup(MethodSymbol),
    /// Lambda to delegate.
    AnonymousFunction,
    /// `stackalloc` to a pointer.
    StackAllocToPointer,
    /// Target-typed conditional or switch expression.
    ConditionalExpression,
    /// Placeholder conversion involving an error type.
    ErrorType,
}

impl ConversionKind {
    /// Whether the converted expression keeps its operand's constant value.
    pub fn preserves_constant(&self) -> bool {
        matches!(
            self,
            ConversionKind::Identity
                | ConversionKind::ImplicitNumeric
                | ConversionKind::ImplicitConstant
                | ConversionKind::NullLiteral
        )
    }
}

impl Conversion {
    /// Create an implicit conversion.
    pub fn implicit(kind: ConversionKind, cost: u32) -> Self {
        Self {
            kind,
            cost,
            is_implicit: true,
        }
    }

    /// Create an explicit-only conversion.
    pub fn explicit(kind: ConversionKind) -> Self {
        Self {
            kind,
            cost: COST_EXPLICIT,
            is_implicit: false,
        }
    }

    pub fn identity() -> Self {
        Self::implicit(ConversionKind::Identity, COST_IDENTITY)
    }

    pub fn none() -> Self {
        Self {
            kind: ConversionKind::NoConversion,
            cost: u32::MAX,
            is_implicit: false,
        }
    }

    /// Whether any conversion exists (implicit or explicit).
    #[inline]
    pub fn exists(&self) -> bool {
        self.kind != ConversionKind::NoConversion
    }

    /// Whether the conversion may be applied without a cast.
    #[inline]
    pub fn is_implicit_conversion(&self) -> bool {
        self.exists() && self.is_implicit
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.kind == ConversionKind::Identity
    }

    /// Whether this conversion is allowed where `explicit` casts are (or
    /// are not) permitted.
    #[inline]
    pub fn is_allowed(&self, explicit: bool) -> bool {
        self.exists() && (self.is_implicit || explicit)
    }
}

// ============================================================================
// Collaborator
// ============================================================================

/// The conversion collaborator consumed by the binder.
///
/// Implementations classify conversions between *types*; conversions of
/// untyped expressions are the binder's concern.
pub trait Conversions {
    /// Classify the conversion from `from` to `to`: the implicit conversion
    /// if one exists, otherwise the explicit one, otherwise none.
    fn classify(&self, symbols: &SymbolTable, from: &Ty, to: &Ty) -> Conversion;

    /// Classify the conversion of a constant `value` of type `from`, which
    /// may be implicit where the type-level conversion is not.
    fn classify_constant(
        &self,
        symbols: &SymbolTable,
        value: &ConstantValue,
        from: &Ty,
        to: &Ty,
    ) -> Conversion;
}
