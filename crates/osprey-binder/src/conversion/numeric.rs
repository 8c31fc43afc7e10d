//! Numeric conversion tables.

use osprey_core::SpecialType;

/// Position in the widening order. Lower ranks are preferred targets.
pub fn numeric_rank(special: SpecialType) -> u32 {
    match special {
        SpecialType::SByte => 0,
        SpecialType::Byte => 1,
        SpecialType::Int16 => 2,
        SpecialType::UInt16 => 3,
        SpecialType::Char => 3,
        SpecialType::Int32 => 4,
        SpecialType::UInt32 => 5,
        SpecialType::Int64 => 6,
        SpecialType::UInt64 => 7,
        SpecialType::Single => 8,
        SpecialType::Double => 9,
        SpecialType::Decimal => 10,
        _ => u32::MAX,
    }
}

/// Whether an implicit numeric conversion from `from` to `to` exists.
pub fn implicit_numeric_exists(from: SpecialType, to: SpecialType) -> bool {
    use SpecialType::*;

    if from == to {
        return true;
    }
    let targets: &[SpecialType] = match from {
        SByte => &[Int16, Int32, Int64, Single, Double, Decimal],
        Byte => &[Int16, UInt16, Int32, UInt32, Int64, UInt64, Single, Double, Decimal],
        Int16 => &[Int32, Int64, Single, Double, Decimal],
        UInt16 => &[Int32, UInt32, Int64, UInt64, Single, Double, Decimal],
        Char => &[UInt16, Int32, UInt32, Int64, UInt64, Single, Double, Decimal],
        Int32 => &[Int64, Single, Double, Decimal],
        UInt32 => &[Int64, UInt64, Single, Double, Decimal],
        Int64 | UInt64 => &[Single, Double, Decimal],
        Single => &[Double],
        _ => &[],
    };
    targets.contains(&to)
}

/// Whether an explicit numeric conversion exists (any pair of numeric types,
/// `char` included).
pub fn explicit_numeric_exists(from: SpecialType, to: SpecialType) -> bool {
    from.is_numeric() && to.is_numeric()
}

/// The result type of binary numeric promotion, if the operands promote.
pub fn binary_promotion(left: SpecialType, right: SpecialType) -> Option<SpecialType> {
    use SpecialType::*;

    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }
    if left == Decimal || right == Decimal {
        // decimal does not mix with floating point
        return (!left.is_floating() && !right.is_floating()).then_some(Decimal);
    }
    if left == Double || right == Double {
        return Some(Double);
    }
    if left == Single || right == Single {
        return Some(Single);
    }
    if left == UInt64 || right == UInt64 {
        let signed = |s: SpecialType| matches!(s, SByte | Int16 | Int32 | Int64);
        return (!signed(left) && !signed(right)).then_some(UInt64);
    }
    if left == Int64 || right == Int64 {
        return Some(Int64);
    }
    if left == UInt32 || right == UInt32 {
        let signed = |s: SpecialType| matches!(s, SByte | Int16 | Int32);
        return Some(if signed(left) || signed(right) { Int64 } else { UInt32 });
    }
    Some(Int32)
}

/// The result type of unary numeric promotion for `+`, `-` and `~`.
pub fn unary_promotion(operand: SpecialType) -> Option<SpecialType> {
    use SpecialType::*;

    Some(match operand {
        SByte | Byte | Int16 | UInt16 | Char | Int32 => Int32,
        UInt32 | Int64 | UInt64 | Single | Double | Decimal => operand,
        _ => return None,
    })
}
