//! Literal expressions.
//!
//! Integer literals take the narrowest of `int`, `uint`, `long`, `ulong`
//! that holds the value. `null` has the null type until converted.

use osprey_core::{ConstantValue, DiagnosticBag, Ty};
use osprey_syntax::{InterpolatedStringExpr, InterpolationPart, LiteralExpr, LiteralKind};

use super::recovery::natural_type;
use super::value::{ValueKind, bind_value};
use crate::binder::Binder;
use crate::bound::{BoundExpr, BoundKind};

/// Bind a literal.
pub fn bind_literal<'ast>(literal: &LiteralExpr<'_>) -> BoundExpr<'ast> {
    let value = match literal.kind {
        LiteralKind::Int(value) => ConstantValue::integer(value),
        LiteralKind::Float(value) => ConstantValue::Float(value),
        LiteralKind::Double(value) => ConstantValue::Double(value),
        LiteralKind::Bool(value) => ConstantValue::Bool(value),
        LiteralKind::Char(value) => ConstantValue::Char(value),
        LiteralKind::String(value) => ConstantValue::String(value.into()),
        LiteralKind::Null => return BoundExpr::literal(ConstantValue::Null, Ty::Null, literal.span),
    };
    let ty = value.special_type().map_or_else(Ty::unknown, Ty::Special);
    BoundExpr::literal(value, ty, literal.span)
}

/// Bind `$"..."`: every hole is a value with a natural type.
pub fn bind_interpolated_string<'ast>(
    binder: &Binder<'_>,
    interpolated: &'ast InterpolatedStringExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let parts = interpolated
        .parts
        .iter()
        .filter_map(|part| match part {
            InterpolationPart::Text(_) => None,
            InterpolationPart::Hole(expr) => {
                let hole = bind_value(binder, expr, ValueKind::ReadableValue, diagnostics);
                Some(natural_type(binder, hole, diagnostics))
            }
        })
        .collect();
    BoundExpr::typed(BoundKind::InterpolatedString { parts }, Ty::STRING, interpolated.span)
}
