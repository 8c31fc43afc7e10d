//! Compile-time constant values.

use std::fmt;
use std::rc::Rc;

use ordered_float::OrderedFloat;

use crate::SpecialType;

/// A compile-time constant carried by literals, constant fields and folded
/// expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    Bool(bool),
    Char(char),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(Rc<str>),
    Null,
}

impl ConstantValue {
    /// Pick the narrowest of `int`, `uint`, `long`, `ulong` that holds `value`.
    pub fn integer(value: u64) -> Self {
        if let Ok(v) = i32::try_from(value) {
            ConstantValue::Int(v)
        } else if let Ok(v) = u32::try_from(value) {
            ConstantValue::UInt(v)
        } else if let Ok(v) = i64::try_from(value) {
            ConstantValue::Long(v)
        } else {
            ConstantValue::ULong(value)
        }
    }

    /// The special type of a constant of this shape. `Null` has none.
    pub fn special_type(&self) -> Option<SpecialType> {
        Some(match self {
            ConstantValue::Bool(_) => SpecialType::Bool,
            ConstantValue::Char(_) => SpecialType::Char,
            ConstantValue::Int(_) => SpecialType::Int32,
            ConstantValue::UInt(_) => SpecialType::UInt32,
            ConstantValue::Long(_) => SpecialType::Int64,
            ConstantValue::ULong(_) => SpecialType::UInt64,
            ConstantValue::Float(_) => SpecialType::Single,
            ConstantValue::Double(_) => SpecialType::Double,
            ConstantValue::String(_) => SpecialType::String,
            ConstantValue::Null => return None,
        })
    }

    pub fn is_negative_numeric(&self) -> bool {
        match self {
            ConstantValue::Int(v) => *v < 0,
            ConstantValue::Long(v) => *v < 0,
            ConstantValue::Float(v) => v.0 < 0.0,
            ConstantValue::Double(v) => v.0 < 0.0,
            _ => false,
        }
    }

    /// Integral value widened to `i128`, for range checks.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            ConstantValue::Char(c) => Some(*c as i128),
            ConstantValue::Int(v) => Some(*v as i128),
            ConstantValue::UInt(v) => Some(*v as i128),
            ConstantValue::Long(v) => Some(*v as i128),
            ConstantValue::ULong(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Whether an integral constant fits in the range of `target`.
    pub fn fits_in(&self, target: SpecialType) -> bool {
        let Some(value) = self.as_integer() else {
            return false;
        };
        let (min, max): (i128, i128) = match target {
            SpecialType::SByte => (i8::MIN as i128, i8::MAX as i128),
            SpecialType::Byte => (0, u8::MAX as i128),
            SpecialType::Int16 => (i16::MIN as i128, i16::MAX as i128),
            SpecialType::UInt16 | SpecialType::Char => (0, u16::MAX as i128),
            SpecialType::Int32 => (i32::MIN as i128, i32::MAX as i128),
            SpecialType::UInt32 => (0, u32::MAX as i128),
            SpecialType::Int64 => (i64::MIN as i128, i64::MAX as i128),
            SpecialType::UInt64 => (0, u64::MAX as i128),
            _ => return false,
        };
        (min..=max).contains(&value)
    }

    /// Arithmetic negation for numeric constants, if representable.
    pub fn negate(&self) -> Option<ConstantValue> {
        Some(match self {
            ConstantValue::Int(v) => ConstantValue::Int(v.checked_neg()?),
            ConstantValue::Long(v) => ConstantValue::Long(v.checked_neg()?),
            ConstantValue::UInt(v) => ConstantValue::Long(-(*v as i64)),
            ConstantValue::Float(v) => ConstantValue::Float(OrderedFloat(-v.0)),
            ConstantValue::Double(v) => ConstantValue::Double(OrderedFloat(-v.0)),
            _ => return None,
        })
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Bool(v) => write!(f, "{v}"),
            ConstantValue::Char(v) => write!(f, "'{v}'"),
            ConstantValue::Int(v) => write!(f, "{v}"),
            ConstantValue::UInt(v) => write!(f, "{v}u"),
            ConstantValue::Long(v) => write!(f, "{v}L"),
            ConstantValue::ULong(v) => write!(f, "{v}UL"),
            ConstantValue::Float(v) => write!(f, "{}f", v.0),
            ConstantValue::Double(v) => write!(f, "{}", v.0),
            ConstantValue::String(v) => write!(f, "\"{v}\""),
            ConstantValue::Null => write!(f, "null"),
        }
    }
}
