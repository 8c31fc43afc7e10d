//! Operators.
//!
//! | Form | Binding |
//! |------|---------|
//! | `+x`, `-x`, `!x`, `~x` | user-defined `op_*`, else unary numeric promotion |
//! | `a op b` | user-defined `op_*`, else string concatenation, numeric promotion, equality |
//! | `a ?? b` | `b` converts to the type of `a`, or `a` to the type of `b` |
//! | `a = b`, `a op= b` | assignable target; the value or result converts to the target |
//! | `&x`, `*p` | pointers; the unsafe-context check is the dispatcher's |
//! | `^i`, `a..b` | `System.Index` and `System.Range` |
//!
//! Builtin operators on constants fold to a literal. Overflow while folding
//! is an error unless the expression is in an `unchecked` context.

use std::rc::Rc;

use osprey_core::{
    BindError, ConstantValue, DiagnosticBag, MessageId, MethodKind, MethodSymbol, RefKind, Span,
    SpecialType, Ty, TypeKind,
};
use osprey_symbols::LookupResultKind;
use osprey_syntax::{AssignExpr, BinaryExpr, BinaryOp, Expr, LiteralKind, RangeExpr, UnaryExpr, UnaryOp};
use tracing::{debug, instrument, trace};

use super::arguments::AnalyzedArguments;
use super::convert::{classify_expression, convert_implicit};
use super::folding::{self, Folded};
use super::invocation::resolve_methods;
use super::keywords::is_unmanaged;
use super::recovery::{make_bad, natural_type};
use super::value::{ValueKind, bind_value};
use crate::binder::{Binder, BinderFlags};
use crate::bound::{BoundExpr, BoundKind};
use crate::conversion::{binary_promotion, unary_promotion};

/// Operand and result types of a builtin binary operator.
struct Signature {
    left: Ty,
    right: Ty,
    result: Ty,
}

impl Signature {
    fn uniform(operand: Ty, result: Ty) -> Self {
        Self {
            left: operand.clone(),
            right: operand,
            result,
        }
    }
}

// ============================================================================
// Unary operators
// ============================================================================

/// Bind a prefix operator, including `&x`, `*p` and `^i`.
#[instrument(level = "trace", skip_all, fields(op = %unary.op))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_unary<'ast>(
    binder: &Binder<'_>,
    unary: &'ast UnaryExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    match unary.op {
        UnaryOp::AddressOf => bind_address_of(binder, unary, diagnostics),
        UnaryOp::Deref => bind_pointer_indirection(binder, unary, diagnostics),
        UnaryOp::IndexFromEnd => bind_from_end(binder, unary, diagnostics),
        UnaryOp::Plus | UnaryOp::Minus | UnaryOp::Not | UnaryOp::BitNot => {
            bind_arithmetic_unary(binder, unary, diagnostics)
        }
    }
}

fn bind_arithmetic_unary<'ast>(
    binder: &Binder<'_>,
    unary: &'ast UnaryExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = unary.span;
    let op = unary.op;
    if op == UnaryOp::Minus
        && let Some((value, ty)) = negated_min_literal(&unary.operand)
    {
        return BoundExpr::literal(value, ty, span);
    }

    let operand = operand_value(binder, &unary.operand, diagnostics);
    let ty = operand.ty_or_error();
    if ty.contains_error() {
        return make_bad(binder, span, LookupResultKind::Empty, Vec::new(), vec![operand]);
    }
    if ty.is_dynamic() {
        return unary_node(op, operand, None, Ty::Dynamic, span);
    }

    if let Some(name) = op.operator_method_name() {
        let candidates = operator_candidates(binder, name, &[&ty]);
        if !candidates.is_empty()
            && let Some((method, params)) = resolve_operator(binder, &candidates, &[&operand])
        {
            trace!(method = method.name(), "user-defined unary operator");
            let operand = convert_to_param(binder, operand, params.first(), diagnostics);
            let result = method.return_type.clone();
            return unary_node(op, operand, Some(method), result, span);
        }
    }

    let Some(result) = builtin_unary(op, &ty) else {
        if !operand.has_errors {
            debug!(%op, operand = %ty, "no applicable unary operator");
            diagnostics.add(BindError::BadUnaryOperator {
                op: op.to_string(),
                operand: operand.display_type(),
                span,
            });
        }
        return make_bad(binder, span, LookupResultKind::OverloadResolutionFailure, Vec::new(), vec![operand]);
    };

    let result_ty = Ty::Special(result);
    let operand = convert_implicit(binder, operand, &result_ty, diagnostics);
    let folded = operand
        .constant_value()
        .and_then(|value| folding::fold_unary(op, value, result));
    match folded {
        Some(folded) => folded_literal(binder, folded, result_ty, span, diagnostics),
        None => unary_node(op, operand, None, result_ty, span),
    }
}

/// `-2147483648` and `-9223372036854775808`: the literal alone does not fit
/// the signed type its negation belongs to.
fn negated_min_literal(operand: &Expr<'_>) -> Option<(ConstantValue, Ty)> {
    let Expr::Literal(literal) = operand else {
        return None;
    };
    match literal.kind {
        LiteralKind::Int(0x8000_0000) => Some((ConstantValue::Int(i32::MIN), Ty::INT)),
        LiteralKind::Int(0x8000_0000_0000_0000) => Some((ConstantValue::Long(i64::MIN), Ty::LONG)),
        _ => None,
    }
}

/// The operand (and result) type of a predefined unary operator.
fn builtin_unary(op: UnaryOp, ty: &Ty) -> Option<SpecialType> {
    let special = ty.as_special()?;
    match op {
        UnaryOp::Not => (special == SpecialType::Bool).then_some(SpecialType::Bool),
        UnaryOp::Plus => unary_promotion(special),
        UnaryOp::Minus => match unary_promotion(special)? {
            SpecialType::UInt32 => Some(SpecialType::Int64),
            SpecialType::UInt64 => None,
            promoted => Some(promoted),
        },
        UnaryOp::BitNot => unary_promotion(special).filter(|promoted| promoted.is_integral()),
        UnaryOp::AddressOf | UnaryOp::Deref | UnaryOp::IndexFromEnd => None,
    }
}

fn unary_node<'ast>(
    op: UnaryOp,
    operand: BoundExpr<'ast>,
    method: Option<MethodSymbol>,
    ty: Ty,
    span: Span,
) -> BoundExpr<'ast> {
    BoundExpr::typed(
        BoundKind::Unary {
            op,
            operand: Box::new(operand),
            method,
        },
        ty,
        span,
    )
}

/// `&x`: only variables can have their address taken, and only when their
/// type is unmanaged.
fn bind_address_of<'ast>(
    binder: &Binder<'_>,
    unary: &'ast UnaryExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = unary.span;
    let operand = operand_value(binder, &unary.operand, diagnostics);
    let ty = operand.ty_or_error();
    if operand.has_errors || ty.contains_error() {
        return BoundExpr::typed(
            BoundKind::AddressOf {
                operand: Box::new(operand),
            },
            Ty::pointer(ty),
            span,
        )
        .with_errors();
    }

    let is_variable = matches!(
        operand.kind,
        BoundKind::Local(_)
            | BoundKind::Parameter(_)
            | BoundKind::FieldAccess { .. }
            | BoundKind::ArrayAccess { .. }
            | BoundKind::PointerElementAccess { .. }
            | BoundKind::PointerIndirection { .. }
    );
    if !is_variable || operand.constant_value().is_some() {
        diagnostics.add(BindError::AddressOfInvalid { span });
        let symbols = operand.symbol().into_iter().collect();
        return make_bad(binder, span, LookupResultKind::NotAVariable, symbols, vec![operand]);
    }

    let managed = !is_unmanaged(binder.symbols(), &ty);
    if managed {
        diagnostics.add(BindError::ManagedType {
            ty: ty.to_string(),
            span,
        });
    }
    BoundExpr::typed(
        BoundKind::AddressOf {
            operand: Box::new(operand),
        },
        Ty::pointer(ty),
        span,
    )
    .with_errors_if(managed)
}

/// `*p` for any pointer except `void*`.
fn bind_pointer_indirection<'ast>(
    binder: &Binder<'_>,
    unary: &'ast UnaryExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = unary.span;
    let operand = operand_value(binder, &unary.operand, diagnostics);
    let pointee = operand
        .ty
        .as_ref()
        .and_then(Ty::pointee)
        .filter(|pointee| !pointee.is_void())
        .cloned();
    match pointee {
        Some(pointee) => BoundExpr::typed(
            BoundKind::PointerIndirection {
                operand: Box::new(operand),
            },
            pointee,
            span,
        ),
        None => {
            if !operand.has_errors {
                diagnostics.add(BindError::BadUnaryOperator {
                    op: UnaryOp::Deref.to_string(),
                    operand: operand.display_type(),
                    span,
                });
            }
            make_bad(binder, span, LookupResultKind::OverloadResolutionFailure, Vec::new(), vec![operand])
        }
    }
}

/// `^i`: an `int` counted from the end.
fn bind_from_end<'ast>(
    binder: &Binder<'_>,
    unary: &'ast UnaryExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = unary.span;
    let available = binder.check_feature(MessageId::IndexOperator, span, diagnostics);
    let operand = bind_value(binder, &unary.operand, ValueKind::ReadableValue, diagnostics);
    let operand = convert_implicit(binder, operand, &Ty::INT, diagnostics);
    BoundExpr::typed(
        BoundKind::FromEndIndex {
            operand: Box::new(operand),
        },
        Ty::INDEX,
        span,
    )
    .with_errors_if(!available)
}

// ============================================================================
// Binary operators
// ============================================================================

/// Bind an infix operator.
#[instrument(level = "trace", skip_all, fields(op = %binary.op))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_binary<'ast>(
    binder: &Binder<'_>,
    binary: &'ast BinaryExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = binary.span;
    let left = operand_value(binder, &binary.left, diagnostics);
    if binary.op == BinaryOp::Coalesce {
        // The right operand may be target-typed by the left.
        let right = bind_value(binder, &binary.right, ValueKind::ReadableValue, diagnostics);
        return bind_coalesce(binder, left, right, span, diagnostics);
    }
    let right = operand_value(binder, &binary.right, diagnostics);
    bind_binary_operator(binder, binary.op, left, right, span, diagnostics)
}

/// Resolve `left op right` over natural-typed operands.
fn bind_binary_operator<'ast>(
    binder: &Binder<'_>,
    op: BinaryOp,
    left: BoundExpr<'ast>,
    right: BoundExpr<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let left_ty = left.ty_or_error();
    let right_ty = right.ty_or_error();
    if left_ty.contains_error() || right_ty.contains_error() {
        return make_bad(binder, span, LookupResultKind::Empty, Vec::new(), vec![left, right]);
    }
    if left_ty.is_dynamic() || right_ty.is_dynamic() {
        return binary_node(op, left, right, None, Ty::Dynamic, span);
    }

    if let Some(name) = op.operator_method_name() {
        let candidates = operator_candidates(binder, name, &[&left_ty, &right_ty]);
        if !candidates.is_empty()
            && let Some((method, params)) = resolve_operator(binder, &candidates, &[&left, &right])
        {
            trace!(method = method.name(), "user-defined binary operator");
            let left = convert_to_param(binder, left, params.first(), diagnostics);
            let right = convert_to_param(binder, right, params.get(1), diagnostics);
            let result = method.return_type.clone();
            return binary_node(op, left, right, Some(method), result, span);
        }
    }

    match builtin_binary(binder, op, &left, &right) {
        Some(signature) => apply_builtin(binder, op, signature, left, right, span, diagnostics),
        None => bad_binary(binder, op, left, right, span, diagnostics),
    }
}

/// The predefined operator that applies to the operands, if any.
fn builtin_binary(binder: &Binder<'_>, op: BinaryOp, left: &BoundExpr<'_>, right: &BoundExpr<'_>) -> Option<Signature> {
    let left_ty = left.ty_or_error();
    let right_ty = right.ty_or_error();
    if left_ty.is_void() || right_ty.is_void() {
        return None;
    }
    let is_bool = |ty: &Ty| ty.is_special(SpecialType::Bool);

    match op {
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
            let converts = classify_expression(binder, left, &Ty::BOOL).is_implicit_conversion()
                && classify_expression(binder, right, &Ty::BOOL).is_implicit_conversion();
            converts.then(|| Signature::uniform(Ty::BOOL, Ty::BOOL))
        }
        BinaryOp::Add if left_ty.is_special(SpecialType::String) || right_ty.is_special(SpecialType::String) => {
            Some(Signature {
                left: concat_operand(left_ty),
                right: concat_operand(right_ty),
                result: Ty::STRING,
            })
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let promoted = Ty::Special(numeric_promotion(left, right)?);
            Some(Signature::uniform(promoted.clone(), promoted))
        }
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => {
            let promoted = left_ty
                .as_special()
                .and_then(unary_promotion)
                .filter(|promoted| promoted.is_integral())?;
            if !classify_expression(binder, right, &Ty::INT).is_implicit_conversion() {
                return None;
            }
            Some(Signature {
                left: Ty::Special(promoted),
                right: Ty::INT,
                result: Ty::Special(promoted),
            })
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            if is_bool(&left_ty) && is_bool(&right_ty) {
                return Some(Signature::uniform(Ty::BOOL, Ty::BOOL));
            }
            let promoted = numeric_promotion(left, right).filter(|promoted| promoted.is_integral())?;
            Some(Signature::uniform(Ty::Special(promoted), Ty::Special(promoted)))
        }
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let promoted = numeric_promotion(left, right)?;
            Some(Signature::uniform(Ty::Special(promoted), Ty::BOOL))
        }
        BinaryOp::Equal | BinaryOp::NotEqual => equality(binder, left, right),
        BinaryOp::Coalesce => None,
    }
}

/// `==` and `!=`: numeric, `bool`, string, enum, pointer and reference
/// equality.
fn equality(binder: &Binder<'_>, left: &BoundExpr<'_>, right: &BoundExpr<'_>) -> Option<Signature> {
    if let Some(promoted) = numeric_promotion(left, right) {
        return Some(Signature::uniform(Ty::Special(promoted), Ty::BOOL));
    }
    let left_ty = left.ty_or_error();
    let right_ty = right.ty_or_error();
    let symbols = binder.symbols();

    if left_ty.is_special(SpecialType::Bool) && right_ty.is_special(SpecialType::Bool) {
        return Some(Signature::uniform(Ty::BOOL, Ty::BOOL));
    }
    let string_like = |ty: &Ty| ty.is_special(SpecialType::String) || *ty == Ty::Null;
    if string_like(&left_ty) && string_like(&right_ty) && (left_ty != Ty::Null || right_ty != Ty::Null) {
        return Some(Signature::uniform(Ty::STRING, Ty::BOOL));
    }
    if left_ty == right_ty && symbols.def_of(&left_ty).is_some_and(|def| def.kind == TypeKind::Enum) {
        return Some(Signature::uniform(left_ty, Ty::BOOL));
    }

    let pointer_like = |ty: &Ty| ty.pointee().is_some() || *ty == Ty::Null;
    let reference = |ty: &Ty| symbols.is_reference_type(ty);
    let comparable = if pointer_like(&left_ty) && pointer_like(&right_ty) {
        true
    } else if reference(&left_ty) && reference(&right_ty) {
        let conversions = binder.conversions();
        left_ty == Ty::Null
            || right_ty == Ty::Null
            || conversions.classify(symbols, &left_ty, &right_ty).is_implicit_conversion()
            || conversions.classify(symbols, &right_ty, &left_ty).is_implicit_conversion()
    } else {
        false
    };
    comparable.then(|| Signature {
        left: left_ty,
        right: right_ty,
        result: Ty::BOOL,
    })
}

/// Binary numeric promotion, except that a non-negative constant that fits
/// an unsigned operand's type takes that type (`x + 1` for `uint x` is
/// `uint`).
fn numeric_promotion(left: &BoundExpr<'_>, right: &BoundExpr<'_>) -> Option<SpecialType> {
    let l = left.ty.as_ref()?.as_special()?;
    let r = right.ty.as_ref()?.as_special()?;
    let fits = |expr: &BoundExpr<'_>, target: SpecialType| {
        expr.constant_value().is_some_and(|value| value.fits_in(target))
    };
    let unsigned = |special: SpecialType| matches!(special, SpecialType::UInt32 | SpecialType::UInt64);
    if unsigned(l) && l != r && fits(right, l) {
        return binary_promotion(l, l);
    }
    if unsigned(r) && l != r && fits(left, r) {
        return binary_promotion(r, r);
    }
    binary_promotion(l, r)
}

/// String concatenation takes any operand; `null` is a null string.
fn concat_operand(ty: Ty) -> Ty {
    if ty == Ty::Null { Ty::STRING } else { ty }
}

fn apply_builtin<'ast>(
    binder: &Binder<'_>,
    op: BinaryOp,
    signature: Signature,
    left: BoundExpr<'ast>,
    right: BoundExpr<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let left = convert_implicit(binder, left, &signature.left, diagnostics);
    let right = convert_implicit(binder, right, &signature.right, diagnostics);
    let operand_type = signature.left.as_special();

    let integral = operand_type.is_some_and(SpecialType::is_integral);
    if matches!(op, BinaryOp::Div | BinaryOp::Rem)
        && integral
        && right.constant_value().and_then(ConstantValue::as_integer) == Some(0)
    {
        diagnostics.add(BindError::DivideByConstantZero { span });
        return binary_node(op, left, right, None, signature.result, span).with_errors();
    }

    if let Some(operand_type) = operand_type
        && let (Some(l), Some(r)) = (left.constant_value(), right.constant_value())
        && let Some(folded) = folding::fold_binary(op, l, r, operand_type)
    {
        trace!(%op, value = %folded.value, "folded");
        return folded_literal(binder, folded, signature.result, span, diagnostics);
    }
    binary_node(op, left, right, None, signature.result, span)
}

fn bad_binary<'ast>(
    binder: &Binder<'_>,
    op: BinaryOp,
    left: BoundExpr<'ast>,
    right: BoundExpr<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    if !left.has_errors && !right.has_errors {
        debug!(%op, left = %left.display_type(), right = %right.display_type(), "no applicable binary operator");
        diagnostics.add(BindError::BadBinaryOperator {
            op: op.to_string(),
            left: left.display_type(),
            right: right.display_type(),
            span,
        });
    }
    make_bad(binder, span, LookupResultKind::OverloadResolutionFailure, Vec::new(), vec![left, right])
}

fn binary_node<'ast>(
    op: BinaryOp,
    left: BoundExpr<'ast>,
    right: BoundExpr<'ast>,
    method: Option<MethodSymbol>,
    ty: Ty,
    span: Span,
) -> BoundExpr<'ast> {
    BoundExpr::typed(
        BoundKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            method,
        },
        ty,
        span,
    )
}

/// `a ?? b`.
///
/// The left operand must be able to hold `null`. The result has the left
/// operand's type when the right converts to it, else the right operand's
/// type when the left converts to that.
fn bind_coalesce<'ast>(
    binder: &Binder<'_>,
    left: BoundExpr<'ast>,
    right: BoundExpr<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let op = BinaryOp::Coalesce;
    let left_ty = left.ty_or_error();
    if left_ty.contains_error() {
        let right = natural_type(binder, right, diagnostics);
        return make_bad(binder, span, LookupResultKind::Empty, Vec::new(), vec![left, right]);
    }
    if left_ty.is_dynamic() {
        let right = natural_type(binder, right, diagnostics);
        return binary_node(op, left, right, None, Ty::Dynamic, span);
    }
    if left.is_null_literal() || binder.symbols().is_value_type(&left_ty) {
        let right = natural_type(binder, right, diagnostics);
        return bad_binary(binder, op, left, right, span, diagnostics);
    }

    if classify_expression(binder, &right, &left_ty).is_implicit_conversion() {
        let right = convert_implicit(binder, right, &left_ty, diagnostics);
        return binary_node(op, left, right, None, left_ty, span);
    }
    let right = natural_type(binder, right, diagnostics);
    let right_ty = right.ty_or_error();
    if !right_ty.contains_error() && classify_expression(binder, &left, &right_ty).is_implicit_conversion() {
        let left = convert_implicit(binder, left, &right_ty, diagnostics);
        return binary_node(op, left, right, None, right_ty, span);
    }
    bad_binary(binder, op, left, right, span, diagnostics)
}

// ============================================================================
// Assignment
// ============================================================================

/// `a = b` and `a op= b`.
#[instrument(level = "trace", skip_all, fields(op = ?assign.op))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_assignment<'ast>(
    binder: &Binder<'_>,
    assign: &'ast AssignExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = assign.span;
    let target = bind_value(binder, &assign.target, ValueKind::AssignableVariable, diagnostics);
    let target_ty = target.ty_or_error();
    let value = bind_value(binder, &assign.value, ValueKind::ReadableValue, diagnostics);

    let Some(op) = assign.op else {
        let value = if target_ty.contains_error() || target_ty.is_dynamic() {
            natural_type(binder, value, diagnostics)
        } else {
            convert_implicit(binder, value, &target_ty, diagnostics)
        };
        return assignment(target, value, None, target_ty, span);
    };
    bind_compound_assignment(binder, op, target, value, span, diagnostics)
}

/// `a op= b` is `a = (T)(a op b)`: the operator result must convert to the
/// target implicitly, or explicitly for a predefined operator whose right
/// operand converts to the target implicitly. Events and delegates take
/// `+=` and `-=` with a value of their own type.
fn bind_compound_assignment<'ast>(
    binder: &Binder<'_>,
    op: BinaryOp,
    target: BoundExpr<'ast>,
    value: BoundExpr<'ast>,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let target_ty = target.ty_or_error();
    if target_ty.contains_error() {
        let value = natural_type(binder, value, diagnostics);
        return assignment(target, value, Some(op), target_ty, span).with_errors();
    }

    let is_event = matches!(target.kind, BoundKind::EventAccess { .. });
    if matches!(op, BinaryOp::Add | BinaryOp::Sub) && (is_event || binder.symbols().is_delegate_type(&target_ty)) {
        trace!(is_event, "delegate combination");
        let value = convert_implicit(binder, value, &target_ty, diagnostics);
        return assignment(target, value, Some(op), target_ty, span);
    }

    let value = natural_type(binder, value, diagnostics);
    let operation = bind_binary_operator(binder, op, target.clone(), value, span, diagnostics);
    if operation.has_error_type() {
        return assignment(target, operation, Some(op), target_ty, span);
    }

    let result_ty = operation.ty_or_error();
    let symbols = binder.symbols();
    let conversion = binder.conversions().classify(symbols, &result_ty, &target_ty);
    let allowed = conversion.is_implicit_conversion()
        || match &operation.kind {
            BoundKind::Binary {
                right, method: None, ..
            } => conversion.exists() && classify_expression(binder, right, &target_ty).is_implicit_conversion(),
            _ => false,
        };
    if !allowed {
        diagnostics.add(BindError::NoImplicitConversion {
            from: result_ty.to_string(),
            to: target_ty.to_string(),
            span,
        });
    }
    assignment(target, operation, Some(op), target_ty, span).with_errors_if(!allowed)
}

fn assignment<'ast>(
    target: BoundExpr<'ast>,
    value: BoundExpr<'ast>,
    op: Option<BinaryOp>,
    ty: Ty,
    span: Span,
) -> BoundExpr<'ast> {
    BoundExpr::typed(
        BoundKind::Assignment {
            target: Box::new(target),
            value: Box::new(value),
            op,
        },
        ty,
        span,
    )
}

// ============================================================================
// Ranges
// ============================================================================

/// `a..b`, either end optional.
#[instrument(level = "trace", skip_all)]
pub fn bind_range<'ast>(
    binder: &Binder<'_>,
    range: &'ast RangeExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = range.span;
    let available = binder.check_feature(MessageId::RangeOperator, span, diagnostics);
    let start = range
        .start
        .as_ref()
        .map(|start| Box::new(range_endpoint(binder, start, diagnostics)));
    let end = range
        .end
        .as_ref()
        .map(|end| Box::new(range_endpoint(binder, end, diagnostics)));
    BoundExpr::typed(BoundKind::Range { start, end }, Ty::RANGE, span).with_errors_if(!available)
}

/// A range endpoint is an `Index`, or an `int` counted from the start.
fn range_endpoint<'ast>(
    binder: &Binder<'_>,
    expr: &Expr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let bound = bind_value(binder, expr, ValueKind::ReadableValue, diagnostics);
    let target = if classify_expression(binder, &bound, &Ty::INDEX).is_implicit_conversion() {
        Ty::INDEX
    } else {
        Ty::INT
    };
    convert_implicit(binder, bound, &target, diagnostics)
}

// ============================================================================
// Helpers
// ============================================================================

fn operand_value<'ast>(
    binder: &Binder<'_>,
    expr: &Expr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let bound = bind_value(binder, expr, ValueKind::ReadableValue, diagnostics);
    natural_type(binder, bound, diagnostics)
}

/// A folded constant, reporting overflow outside `unchecked`.
pub(super) fn folded_literal<'ast>(
    binder: &Binder<'_>,
    folded: Folded,
    ty: Ty,
    span: Span,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let overflow = folded.overflowed && !binder.flags().contains(BinderFlags::UNCHECKED);
    if overflow {
        debug!(%ty, "constant overflow");
        diagnostics.add(BindError::ConstantOverflow { span });
    }
    BoundExpr::literal(folded.value, ty, span).with_errors_if(overflow)
}

/// User-defined operator methods named `name` declared by the operand
/// types. Predefined types only have the builtin operators.
fn operator_candidates(binder: &Binder<'_>, name: &str, operand_types: &[&Ty]) -> Vec<MethodSymbol> {
    let symbols = binder.symbols();
    let mut candidates: Vec<MethodSymbol> = Vec::new();
    for ty in operand_types {
        let Some(def) = symbols.def_of(ty) else {
            continue;
        };
        if def.special.is_some() {
            continue;
        }
        let subst = symbols.substitution_for(ty);
        for method in def
            .methods
            .iter()
            .filter(|m| m.kind == MethodKind::Operator && m.name == name)
        {
            if candidates.iter().any(|c| Rc::ptr_eq(&c.def, method)) {
                continue;
            }
            candidates.push(MethodSymbol::new(method.clone(), (*ty).clone(), &subst));
        }
    }
    candidates
}

/// Overload resolution over operator methods. Returns the winner and the
/// parameter type each operand converts to.
fn resolve_operator(
    binder: &Binder<'_>,
    candidates: &[MethodSymbol],
    operands: &[&BoundExpr<'_>],
) -> Option<(MethodSymbol, Vec<Ty>)> {
    let mut args = AnalyzedArguments::new();
    for operand in operands {
        args.push((*operand).clone(), None, RefKind::None);
    }
    let (_, resolution) = resolve_methods(binder, candidates, &args);
    let best = resolution.best_result()?;
    Some((candidates[best.candidate].clone(), best.parameter_types.clone()))
}

fn convert_to_param<'ast>(
    binder: &Binder<'_>,
    operand: BoundExpr<'ast>,
    param: Option<&Ty>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    match param {
        Some(ty) => convert_implicit(binder, operand, ty, diagnostics),
        None => operand,
    }
}
