//! Constant folding for the builtin operators.
//!
//! Operands arrive already converted to the operator's operand type, but a
//! conversion node reports the constant it wraps, so the values here may
//! still be narrower (`Int(1)` for a `long` addition). Integral arithmetic
//! is done in `i128` and truncated to the result type; `overflowed` records
//! whether the truncation lost information so the caller can report it in
//! a checked context.

use ordered_float::OrderedFloat;
use osprey_core::{ConstantValue, SpecialType};
use osprey_syntax::{BinaryOp, UnaryOp};

/// A folded constant.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Folded {
    pub value: ConstantValue,
    pub overflowed: bool,
}

impl Folded {
    fn exact(value: ConstantValue) -> Self {
        Self {
            value,
            overflowed: false,
        }
    }
}

/// Fold `op operand` where the operator works on `ty`.
pub(crate) fn fold_unary(op: UnaryOp, operand: &ConstantValue, ty: SpecialType) -> Option<Folded> {
    if ty.is_integral() {
        let value = operand.as_integer()?;
        return match op {
            UnaryOp::Plus => integral(value, ty),
            UnaryOp::Minus => integral(-value, ty),
            UnaryOp::BitNot => integral(!value, ty).map(|folded| Folded::exact(folded.value)),
            _ => None,
        };
    }
    if ty.is_floating() {
        let value = floating_operand(operand)?;
        return match op {
            UnaryOp::Plus => Some(floating(value, ty)),
            UnaryOp::Minus => Some(floating(-value, ty)),
            _ => None,
        };
    }
    match (op, operand) {
        (UnaryOp::Not, ConstantValue::Bool(value)) => Some(Folded::exact(ConstantValue::Bool(!value))),
        _ => None,
    }
}

/// Fold `left op right` where both operands have been converted to `ty`.
///
/// Returns `None` for anything not foldable, including integral division by
/// zero, which the caller reports.
pub(crate) fn fold_binary(
    op: BinaryOp,
    left: &ConstantValue,
    right: &ConstantValue,
    ty: SpecialType,
) -> Option<Folded> {
    if ty.is_integral() {
        return fold_integral(op, left.as_integer()?, right.as_integer()?, ty);
    }
    if ty.is_floating() {
        return fold_floating(op, floating_operand(left)?, floating_operand(right)?, ty);
    }
    match ty {
        SpecialType::Bool => {
            let (ConstantValue::Bool(l), ConstantValue::Bool(r)) = (left, right) else {
                return None;
            };
            let value = match op {
                BinaryOp::BitAnd | BinaryOp::LogicalAnd => l & r,
                BinaryOp::BitOr | BinaryOp::LogicalOr => l | r,
                BinaryOp::BitXor | BinaryOp::NotEqual => l ^ r,
                BinaryOp::Equal => l == r,
                _ => return None,
            };
            Some(Folded::exact(ConstantValue::Bool(value)))
        }
        SpecialType::String => {
            let (l, r) = (text(left)?, text(right)?);
            let value = match op {
                BinaryOp::Add => ConstantValue::String(format!("{l}{r}").into()),
                BinaryOp::Equal => ConstantValue::Bool(l == r),
                BinaryOp::NotEqual => ConstantValue::Bool(l != r),
                _ => return None,
            };
            Some(Folded::exact(value))
        }
        _ => None,
    }
}

fn fold_integral(op: BinaryOp, l: i128, r: i128, ty: SpecialType) -> Option<Folded> {
    let mask = if matches!(ty, SpecialType::Int64 | SpecialType::UInt64) { 63 } else { 31 };
    match op {
        BinaryOp::Add => integral(l + r, ty),
        BinaryOp::Sub => integral(l - r, ty),
        BinaryOp::Mul => match l.checked_mul(r) {
            Some(value) => integral(value, ty),
            None => {
                let wrapped = (l as u128).wrapping_mul(r as u128) as i128;
                integral(wrapped, ty).map(|folded| Folded {
                    overflowed: true,
                    ..folded
                })
            }
        },
        BinaryOp::Div if r != 0 => integral(l / r, ty),
        BinaryOp::Rem if r != 0 => integral(l % r, ty),
        BinaryOp::ShiftLeft => {
            let shifted = ((l as u128) << ((r as u32) & mask)) as i128;
            integral(shifted, ty).map(|folded| Folded::exact(folded.value))
        }
        BinaryOp::ShiftRight => integral(l >> ((r as u32) & mask), ty),
        BinaryOp::BitAnd => integral(l & r, ty),
        BinaryOp::BitOr => integral(l | r, ty),
        BinaryOp::BitXor => integral(l ^ r, ty),
        BinaryOp::Equal => Some(Folded::exact(ConstantValue::Bool(l == r))),
        BinaryOp::NotEqual => Some(Folded::exact(ConstantValue::Bool(l != r))),
        BinaryOp::Less => Some(Folded::exact(ConstantValue::Bool(l < r))),
        BinaryOp::LessEqual => Some(Folded::exact(ConstantValue::Bool(l <= r))),
        BinaryOp::Greater => Some(Folded::exact(ConstantValue::Bool(l > r))),
        BinaryOp::GreaterEqual => Some(Folded::exact(ConstantValue::Bool(l >= r))),
        _ => None,
    }
}

fn fold_floating(op: BinaryOp, l: f64, r: f64, ty: SpecialType) -> Option<Folded> {
    let value = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::Rem => l % r,
        BinaryOp::Equal => return Some(Folded::exact(ConstantValue::Bool(l == r))),
        BinaryOp::NotEqual => return Some(Folded::exact(ConstantValue::Bool(l != r))),
        BinaryOp::Less => return Some(Folded::exact(ConstantValue::Bool(l < r))),
        BinaryOp::LessEqual => return Some(Folded::exact(ConstantValue::Bool(l <= r))),
        BinaryOp::Greater => return Some(Folded::exact(ConstantValue::Bool(l > r))),
        BinaryOp::GreaterEqual => return Some(Folded::exact(ConstantValue::Bool(l >= r))),
        _ => return None,
    };
    Some(floating(value, ty))
}

/// Fold an explicit numeric conversion of a constant.
///
/// Floating values are truncated toward zero; a value outside the target's
/// range (including NaN and infinities) wraps and is flagged.
pub(crate) fn fold_conversion(value: &ConstantValue, target: SpecialType) -> Option<Folded> {
    if target.is_integral() {
        return match value.as_integer() {
            Some(integer) => integral(integer, target),
            None => {
                let float = floating_operand(value)?;
                let truncated = float.trunc();
                let representable = truncated.is_finite() && truncated.abs() < 2f64.powi(64);
                let folded = integral(truncated as i128, target)?;
                Some(Folded {
                    overflowed: folded.overflowed || !representable,
                    ..folded
                })
            }
        };
    }
    if target.is_floating() {
        return Some(floating(floating_operand(value)?, target));
    }
    None
}

/// Truncate `value` to `ty`, noting whether anything was lost.
fn integral(value: i128, ty: SpecialType) -> Option<Folded> {
    let (folded, fits) = match ty {
        SpecialType::SByte => (ConstantValue::Int(i32::from(value as i8)), i8::try_from(value).is_ok()),
        SpecialType::Byte => (ConstantValue::Int(i32::from(value as u8)), u8::try_from(value).is_ok()),
        SpecialType::Int16 => (ConstantValue::Int(i32::from(value as i16)), i16::try_from(value).is_ok()),
        SpecialType::UInt16 => (ConstantValue::Int(i32::from(value as u16)), u16::try_from(value).is_ok()),
        SpecialType::Int32 => (ConstantValue::Int(value as i32), i32::try_from(value).is_ok()),
        SpecialType::UInt32 => (ConstantValue::UInt(value as u32), u32::try_from(value).is_ok()),
        SpecialType::Int64 => (ConstantValue::Long(value as i64), i64::try_from(value).is_ok()),
        SpecialType::UInt64 => (ConstantValue::ULong(value as u64), u64::try_from(value).is_ok()),
        _ => return None,
    };
    Some(Folded {
        value: folded,
        overflowed: !fits,
    })
}

fn floating(value: f64, ty: SpecialType) -> Folded {
    Folded::exact(match ty {
        SpecialType::Single => ConstantValue::Float(OrderedFloat(value as f32)),
        _ => ConstantValue::Double(OrderedFloat(value)),
    })
}

fn floating_operand(value: &ConstantValue) -> Option<f64> {
    match value {
        ConstantValue::Float(v) => Some(f64::from(v.0)),
        ConstantValue::Double(v) => Some(v.0),
        other => other.as_integer().map(|v| v as f64),
    }
}

/// A string concatenation operand; `null` concatenates as empty.
fn text(value: &ConstantValue) -> Option<&str> {
    match value {
        ConstantValue::String(text) => Some(&**text),
        ConstantValue::Null => Some(""),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SpecialType::*;

    #[test]
    fn integral_arithmetic() {
        let folded = fold_binary(BinaryOp::Mul, &ConstantValue::Int(6), &ConstantValue::Int(7), Int32);
        assert_eq!(folded, Some(Folded::exact(ConstantValue::Int(42))));

        // int constant widened to long
        let folded = fold_binary(BinaryOp::Sub, &ConstantValue::Int(1), &ConstantValue::Long(3), Int64);
        assert_eq!(folded.map(|f| f.value), Some(ConstantValue::Long(-2)));
    }

    #[test]
    fn overflow_wraps_and_is_flagged() {
        let folded = fold_binary(BinaryOp::Add, &ConstantValue::Int(i32::MAX), &ConstantValue::Int(1), Int32);
        assert_eq!(
            folded,
            Some(Folded {
                value: ConstantValue::Int(i32::MIN),
                overflowed: true,
            })
        );

        let folded = fold_binary(
            BinaryOp::Mul,
            &ConstantValue::ULong(u64::MAX),
            &ConstantValue::ULong(u64::MAX),
            UInt64,
        );
        assert_eq!(folded.map(|f| (f.value, f.overflowed)), Some((ConstantValue::ULong(1), true)));
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        assert_eq!(fold_binary(BinaryOp::Div, &ConstantValue::Int(1), &ConstantValue::Int(0), Int32), None);
        assert_eq!(fold_binary(BinaryOp::Rem, &ConstantValue::Long(1), &ConstantValue::Int(0), Int64), None);
        let folded = fold_binary(BinaryOp::Div, &ConstantValue::Double(OrderedFloat(1.0)), &ConstantValue::Int(0), Double);
        assert_eq!(folded.map(|f| f.value), Some(ConstantValue::Double(OrderedFloat(f64::INFINITY))));
    }

    #[test]
    fn shifts_mask_the_count_and_never_overflow() {
        let folded = fold_binary(BinaryOp::ShiftLeft, &ConstantValue::Int(1), &ConstantValue::Int(33), Int32);
        assert_eq!(folded, Some(Folded::exact(ConstantValue::Int(2))));
        let folded = fold_binary(BinaryOp::ShiftLeft, &ConstantValue::Int(1), &ConstantValue::Int(31), Int32);
        assert_eq!(folded, Some(Folded::exact(ConstantValue::Int(i32::MIN))));
        let folded = fold_binary(BinaryOp::ShiftRight, &ConstantValue::Int(-8), &ConstantValue::Int(1), Int32);
        assert_eq!(folded.map(|f| f.value), Some(ConstantValue::Int(-4)));
    }

    #[test]
    fn unary_operators() {
        assert_eq!(
            fold_unary(UnaryOp::Minus, &ConstantValue::Int(5), Int32).map(|f| f.value),
            Some(ConstantValue::Int(-5))
        );
        assert_eq!(
            fold_unary(UnaryOp::BitNot, &ConstantValue::UInt(5), UInt32),
            Some(Folded::exact(ConstantValue::UInt(!5u32)))
        );
        assert_eq!(
            fold_unary(UnaryOp::Not, &ConstantValue::Bool(true), Bool),
            Some(Folded::exact(ConstantValue::Bool(false)))
        );
        let negated = fold_unary(UnaryOp::Minus, &ConstantValue::Int(i32::MIN), Int32);
        assert_eq!(negated.map(|f| f.overflowed), Some(true));
    }

    #[test]
    fn explicit_numeric_conversions() {
        assert_eq!(
            fold_conversion(&ConstantValue::Int(300), Byte),
            Some(Folded {
                value: ConstantValue::Int(44),
                overflowed: true,
            })
        );
        assert_eq!(
            fold_conversion(&ConstantValue::Double(OrderedFloat(-3.9)), Int32),
            Some(Folded::exact(ConstantValue::Int(-3)))
        );
        assert_eq!(
            fold_conversion(&ConstantValue::Long(7), Single),
            Some(Folded::exact(ConstantValue::Float(OrderedFloat(7.0))))
        );
        let nan = fold_conversion(&ConstantValue::Double(OrderedFloat(f64::NAN)), Int64);
        assert_eq!(nan.map(|f| f.overflowed), Some(true));
        assert_eq!(fold_conversion(&ConstantValue::Bool(true), Int32), None);
    }

    #[test]
    fn strings_concatenate_and_compare() {
        let hello = ConstantValue::String("hello ".into());
        let world = ConstantValue::String("world".into());
        assert_eq!(
            fold_binary(BinaryOp::Add, &hello, &world, String).map(|f| f.value),
            Some(ConstantValue::String("hello world".into()))
        );
        assert_eq!(
            fold_binary(BinaryOp::Add, &hello, &ConstantValue::Null, String).map(|f| f.value),
            Some(ConstantValue::String("hello ".into()))
        );
        assert_eq!(
            fold_binary(BinaryOp::Equal, &hello, &world, String).map(|f| f.value),
            Some(ConstantValue::Bool(false))
        );
        assert_eq!(fold_binary(BinaryOp::Add, &hello, &ConstantValue::Char('x'), String), None);
    }
}
