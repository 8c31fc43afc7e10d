//! Keyword operators.
//!
//! | Form | Result |
//! |------|--------|
//! | `default` | untyped `DefaultLiteral`, typed by its conversion target |
//! | `default(T)` | a zero constant for the predefined value types, otherwise `DefaultValue` of `T` |
//! | `typeof(T)` | `TypeOf`, of type `System.Type` |
//! | `sizeof(T)` | a constant for predefined types, otherwise `SizeOf` (unsafe only) |
//! | `nameof(x)` | a string constant; the operand is bound for diagnostics only |
//! | `checked(x)`, `unchecked(x)` | the operand, bound in the new overflow context |

use ordered_float::OrderedFloat;
use osprey_core::{BindError, ConstantValue, DiagnosticBag, MessageId, SpecialType, Ty, TypeKind};
use osprey_symbols::SymbolTable;
use osprey_syntax::{CheckedExpr, DefaultExpr, Expr, NameOfExpr, TypeOperandExpr};
use tracing::{instrument, trace};

use super::dispatch::bind_expression;
use crate::binder::{Binder, BinderFlags};
use crate::bound::{BoundExpr, BoundKind};
use crate::type_binding::bind_type_reporting;

/// Struct nesting beyond this is treated as managed.
const MAX_LAYOUT_DEPTH: usize = 32;

/// `default` and `default(T)`.
pub fn bind_default<'ast>(
    binder: &Binder<'_>,
    default: &DefaultExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = default.span;
    let Some(syntax) = default.ty else {
        let available = binder.check_feature(MessageId::DefaultLiteral, span, diagnostics);
        return BoundExpr::new(BoundKind::DefaultLiteral, None, span).with_errors_if(!available);
    };

    let (ty, type_errors) = bind_type_reporting(binder, syntax, diagnostics);
    match ty.as_special().and_then(zero_constant) {
        Some(zero) => BoundExpr::literal(zero, ty, span),
        None => BoundExpr::typed(BoundKind::DefaultValue, ty, span).with_errors_if(type_errors),
    }
}

/// The constant `default(T)` folds to for a predefined value type.
fn zero_constant(special: SpecialType) -> Option<ConstantValue> {
    Some(match special {
        SpecialType::Bool => ConstantValue::Bool(false),
        SpecialType::Char => ConstantValue::Char('\0'),
        SpecialType::SByte
        | SpecialType::Byte
        | SpecialType::Int16
        | SpecialType::UInt16
        | SpecialType::Int32 => ConstantValue::Int(0),
        SpecialType::UInt32 => ConstantValue::UInt(0),
        SpecialType::Int64 => ConstantValue::Long(0),
        SpecialType::UInt64 => ConstantValue::ULong(0),
        SpecialType::Single => ConstantValue::Float(OrderedFloat(0.0)),
        SpecialType::Double => ConstantValue::Double(OrderedFloat(0.0)),
        _ => return None,
    })
}

/// `typeof(T)`.
pub fn bind_typeof<'ast>(
    binder: &Binder<'_>,
    operand: &'ast TypeOperandExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let (target, type_errors) = bind_type_reporting(binder, &operand.ty, diagnostics);
    BoundExpr::typed(
        BoundKind::TypeOf { target },
        Ty::Special(SpecialType::Type),
        operand.span,
    )
    .with_errors_if(type_errors)
}

/// `sizeof(T)`.
///
/// Predefined types have a known size and fold to an `int` constant. Any
/// other unmanaged type needs an unsafe context; a managed type is always
/// an error.
#[instrument(level = "trace", skip_all)]
pub fn bind_sizeof<'ast>(
    binder: &Binder<'_>,
    operand: &'ast TypeOperandExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = operand.span;
    let (target, type_errors) = bind_type_reporting(binder, &operand.ty, diagnostics);
    if let Some(size) = target.as_special().and_then(SpecialType::size_of) {
        trace!(%target, size, "sizeof folded");
        return BoundExpr::literal(ConstantValue::Int(size as i32), Ty::INT, span);
    }

    let mut errors = type_errors;
    if !type_errors && !target.contains_error() {
        if !is_unmanaged(binder.symbols(), &target) {
            diagnostics.add(BindError::ManagedType {
                ty: target.to_string(),
                span,
            });
            errors = true;
        } else if !binder.in_unsafe_context() {
            diagnostics.add(BindError::SizeOfUnmanaged {
                ty: target.to_string(),
                span,
            });
            errors = true;
        }
    }
    BoundExpr::typed(BoundKind::SizeOf { target }, Ty::INT, span).with_errors_if(errors)
}

/// `nameof(x)`.
///
/// The operand must be a simple name, a member access or an alias-qualified
/// name. It is bound so unknown names are still reported, with instance
/// members allowed from static code.
#[instrument(level = "trace", skip_all)]
pub fn bind_nameof<'ast>(
    binder: &Binder<'_>,
    nameof: &'ast NameOfExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = nameof.span;
    let name = match nameof.operand.unparenthesized() {
        Expr::Ident(ident) => Some(ident.ident.name),
        Expr::Member(access) => Some(access.name.name),
        Expr::AliasQualified(qualified) => Some(qualified.name.name),
        _ => None,
    };

    let inner = binder.with_additional_flags(BinderFlags::NAMEOF_ARGUMENT);
    let operand = bind_expression(&inner, &nameof.operand, diagnostics);

    let Some(name) = name else {
        diagnostics.add(BindError::NameOfExpected {
            span: nameof.operand.span(),
        });
        return BoundExpr::literal(ConstantValue::String("".into()), Ty::STRING, span).with_errors();
    };
    trace!(name, "nameof");
    BoundExpr::literal(ConstantValue::String(name.into()), Ty::STRING, span).with_errors_if(operand.has_errors)
}

/// `checked(x)` and `unchecked(x)`.
pub fn bind_checked<'ast>(
    binder: &Binder<'_>,
    checked: &'ast CheckedExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let inner = binder.with_checked(checked.checked);
    let operand = bind_expression(&inner, &checked.operand, diagnostics);
    BoundExpr {
        span: checked.span,
        ..operand
    }
}

// ============================================================================
// Unmanaged types
// ============================================================================

/// Whether `ty` is unmanaged: a predefined value type, an enum, a pointer,
/// or a struct or tuple whose instance fields are all unmanaged.
pub(crate) fn is_unmanaged(symbols: &SymbolTable, ty: &Ty) -> bool {
    unmanaged_at(symbols, ty, 0)
}

fn unmanaged_at(symbols: &SymbolTable, ty: &Ty, depth: usize) -> bool {
    if depth > MAX_LAYOUT_DEPTH {
        return false;
    }
    match ty {
        Ty::Special(special) => special.is_value_type(),
        Ty::Pointer(_) | Ty::FunctionPointer(_) => true,
        Ty::Tuple(tuple) => tuple
            .elements
            .iter()
            .all(|element| unmanaged_at(symbols, element, depth + 1)),
        Ty::Named(_) => {
            let Some(def) = symbols.def_of(ty) else {
                return false;
            };
            match def.kind {
                TypeKind::Enum => true,
                TypeKind::Struct => {
                    let subst = symbols.substitution_for(ty);
                    def.fields
                        .iter()
                        .filter(|field| !field.is_static && field.constant.is_none())
                        .all(|field| unmanaged_at(symbols, &field.ty.substitute(&subst), depth + 1))
                }
                _ => false,
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use osprey_core::{ErrorKind, LanguageVersion};
    use osprey_syntax::AstBuilder;

    use super::*;
    use crate::compilation::CompilationOptions;
    use crate::expr::test_support::Fixture;
    use crate::expr::value::ValueKind;

    #[test]
    fn default_literal_stays_untyped() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &b.default_literal(), ValueKind::ReadableValue);
        assert!(matches!(bound.kind, BoundKind::DefaultLiteral));
        assert!(bound.ty.is_none());
        assert!(!bound.has_errors);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn default_literal_needs_language_support() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx
            .context()
            .with_options(CompilationOptions::default().with_language_version(LanguageVersion::V7));
        let (bound, diagnostics) = fx.bind_value(&ctx, &b.default_literal(), ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert_eq!(diagnostics.count_of(ErrorKind::InvalidContext), 1);
    }

    #[test]
    fn default_of_value_types_is_a_constant() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);

        let (bound, _) = fx.bind_value(&fx.context(), &b.default_of(b.ty(SpecialType::Int32)), ValueKind::ReadableValue);
        assert_eq!(bound.constant_value(), Some(&ConstantValue::Int(0)));
        assert_eq!(bound.ty, Some(Ty::INT));

        let (bound, _) = fx.bind_value(&fx.context(), &b.default_of(b.ty_named("Item")), ValueKind::ReadableValue);
        assert!(matches!(bound.kind, BoundKind::DefaultValue));
        assert_eq!(bound.ty, Some(fx.ty("Shop.Item")));
    }

    #[test]
    fn sizeof_predefined_types_folds() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) =
            fx.bind_value(&fx.context(), &b.size_of(b.ty(SpecialType::Int64)), ValueKind::ReadableValue);
        assert_eq!(bound.constant_value(), Some(&ConstantValue::Int(8)));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn sizeof_structs_needs_unsafe() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.size_of(b.ty_named("Money"));

        let (bound, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::SizeOfUnmanaged { .. })
        ));

        let unsafe_ctx = fx.context().with_flags(BinderFlags::UNSAFE);
        let (bound, diagnostics) = fx.bind_value(&unsafe_ctx, &expr, ValueKind::ReadableValue);
        assert!(!bound.has_errors);
        assert!(matches!(bound.kind, BoundKind::SizeOf { .. }));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn sizeof_managed_types_is_an_error() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_flags(BinderFlags::UNSAFE);
        let (bound, diagnostics) = fx.bind_value(&ctx, &b.size_of(b.ty_named("Item")), ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::ManagedType { .. })
        ));
    }

    #[test]
    fn nameof_takes_the_last_identifier() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.name_of(b.member(b.ident("Item"), "Count"));
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert_eq!(bound.constant_value(), Some(&ConstantValue::String("Count".into())));
        assert_eq!(bound.ty, Some(Ty::STRING));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn nameof_allows_instance_members_from_static_code() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().static_method();
        let (bound, diagnostics) = fx.bind_value(&ctx, &b.name_of(b.ident("total")), ValueKind::ReadableValue);
        assert!(!bound.has_errors);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn nameof_rejects_other_expressions() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &b.name_of(b.int(3)), ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert_eq!(bound.ty, Some(Ty::STRING));
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::NameOfExpected { .. })
        ));
    }

    #[test]
    fn unchecked_suppresses_constant_overflow() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let overflow = b.binary(osprey_syntax::BinaryOp::Add, b.int(2_147_483_647), b.int(1));

        let (bound, diagnostics) = fx.bind_value(&fx.context(), &b.unchecked(overflow), ValueKind::ReadableValue);
        assert_eq!(bound.constant_value(), Some(&ConstantValue::Int(i32::MIN)));
        assert!(diagnostics.is_empty());

        let (bound, diagnostics) = fx.bind_value(&fx.context(), &b.checked(overflow), ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::ConstantOverflow { .. })
        ));
    }

    #[test]
    fn unmanaged_layouts() {
        let fx = Fixture::new();
        assert!(is_unmanaged(&fx.table, &Ty::INT));
        assert!(is_unmanaged(&fx.table, &Ty::pointer(Ty::OBJECT)));
        assert!(is_unmanaged(&fx.table, &fx.ty("Shop.Money")));
        assert!(is_unmanaged(&fx.table, &Ty::tuple(vec![Ty::INT, Ty::DOUBLE], vec![None, None])));
        assert!(!is_unmanaged(&fx.table, &Ty::STRING));
        assert!(!is_unmanaged(&fx.table, &fx.ty("Shop.Item")));
        assert!(!is_unmanaged(&fx.table, &Ty::tuple(vec![Ty::INT, Ty::STRING], vec![None, None])));
    }
}
