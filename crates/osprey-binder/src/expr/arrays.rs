//! Array creation and `stackalloc`.
//!
//! This module handles:
//! - `new T[n, m]` with sizes, an initializer, or both
//! - `new[] { ... }`, typed by the best common type of its elements
//! - `stackalloc T[n]`, which stays untyped until it is converted to a
//!   pointer or given its natural type `T*`
//!
//! Initializers are flattened in row-major order. Every row at a given
//! depth must have the length of the first row seen at that depth, and a
//! constant size must agree with the initializer.

use osprey_core::{BindError, ConstantValue, DiagnosticBag, MessageId, Span, Ty};
use osprey_syntax::{ArrayCreationExpr, ArrayInitializer, Expr, ImplicitArrayCreationExpr, StackAllocExpr};
use tracing::{debug, instrument, trace};

use super::convert::{best_common_type, classify_expression, convert_implicit};
use super::keywords::is_unmanaged;
use super::recovery::natural_type;
use super::value::{ValueKind, bind_value};
use crate::binder::{Binder, BinderFlags};
use crate::bound::{BoundExpr, BoundKind};
use crate::type_binding::bind_type_reporting;

/// Types an array size converts to, in order of preference.
const SIZE_TYPES: [Ty; 4] = [Ty::INT, Ty::UINT, Ty::LONG, Ty::ULONG];

// ============================================================================
// new T[...]
// ============================================================================

/// Bind `new T[sizes] { initializer }`.
#[instrument(level = "trace", skip_all, fields(rank = array.rank))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_array_creation<'ast>(
    binder: &Binder<'_>,
    array: &'ast ArrayCreationExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = array.span;
    let (element, mut has_errors) = bind_type_reporting(binder, &array.element, diagnostics);
    let ty = Ty::array(element.clone(), array.rank);

    let mut sizes: Vec<BoundExpr<'ast>> = array
        .sizes
        .iter()
        .map(|size| bind_size(binder, size, diagnostics))
        .collect();

    if !sizes.is_empty() && sizes.len() != array.rank as usize {
        diagnostics.add(BindError::BadIndexCount {
            expected: array.rank as usize,
            found: sizes.len(),
            span,
        });
        has_errors = true;
    }

    let Some(initializer) = &array.initializer else {
        if sizes.is_empty() {
            diagnostics.add(BindError::ArraySizeMissing { span });
            has_errors = true;
        }
        return array_node(sizes, None, ty, span).with_errors_if(has_errors);
    };

    let mut flattener = Flattener::new(binder, element, array.rank as usize);
    flattener.row(initializer, 0, diagnostics);
    has_errors |= flattener.has_errors;
    let Flattener { elements, lengths, .. } = flattener;

    if sizes.is_empty() {
        sizes = lengths
            .iter()
            .map(|length| size_literal(length.unwrap_or(0), initializer.span))
            .collect();
    } else {
        has_errors |= !sizes_match(&sizes, &lengths, diagnostics);
    }
    array_node(sizes, Some(elements), ty, span).with_errors_if(has_errors)
}

/// Bind `new[] { ... }`.
#[instrument(level = "trace", skip_all, fields(count = array.initializer.elements.len()))]
pub fn bind_implicit_array_creation<'ast>(
    binder: &Binder<'_>,
    array: &'ast ImplicitArrayCreationExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = array.span;
    let initializer = &array.initializer;
    let elements: Vec<BoundExpr<'ast>> = initializer
        .elements
        .iter()
        .map(|element| bind_value(binder, element, ValueKind::ReadableValue, diagnostics))
        .collect();
    let sizes = vec![size_literal(elements.len() as u64, initializer.span)];

    let refs: Vec<&BoundExpr<'ast>> = elements.iter().collect();
    match best_common_type(binder, &refs) {
        Some(element) if !element.is_void() => {
            trace!(%element, "best element type");
            let elements = elements
                .into_iter()
                .map(|e| convert_implicit(binder, e, &element, diagnostics))
                .collect();
            array_node(sizes, Some(elements), Ty::array(element, 1), span)
        }
        _ => {
            if elements.iter().all(|e| !e.has_errors) {
                debug!("no best type for implicitly-typed array");
                diagnostics.add(BindError::NoBestArrayType { span });
            }
            let mut discard = DiagnosticBag::discarding();
            let elements = elements
                .into_iter()
                .map(|e| natural_type(binder, e, &mut discard))
                .collect();
            array_node(sizes, Some(elements), Ty::array(Ty::unknown(), 1), span).with_errors()
        }
    }
}

fn array_node<'ast>(
    sizes: Vec<BoundExpr<'ast>>,
    initializer: Option<Vec<BoundExpr<'ast>>>,
    ty: Ty,
    span: Span,
) -> BoundExpr<'ast> {
    BoundExpr::typed(BoundKind::ArrayCreation { sizes, initializer }, ty, span)
}

/// Flattens a (possibly nested) array initializer.
struct Flattener<'b, 'a, 'ast> {
    binder: &'b Binder<'a>,
    element: Ty,
    rank: usize,
    elements: Vec<BoundExpr<'ast>>,
    /// Length of the first row at each depth.
    lengths: Vec<Option<u64>>,
    has_errors: bool,
}

impl<'b, 'a, 'ast> Flattener<'b, 'a, 'ast> {
    fn new(binder: &'b Binder<'a>, element: Ty, rank: usize) -> Self {
        Self {
            binder,
            element,
            rank,
            elements: Vec::new(),
            lengths: vec![None; rank],
            has_errors: false,
        }
    }

    fn row(&mut self, row: &ArrayInitializer<'ast>, depth: usize, diagnostics: &mut DiagnosticBag) {
        let length = row.elements.len() as u64;
        match self.lengths[depth] {
            None => self.lengths[depth] = Some(length),
            Some(expected) if expected != length => {
                diagnostics.add(BindError::ArrayInitializerLength {
                    expected,
                    span: row.span,
                });
                self.has_errors = true;
            }
            Some(_) => {}
        }

        let innermost = depth + 1 == self.rank;
        for element in row.elements {
            if innermost {
                let bound = bind_value(self.binder, element, ValueKind::ReadableValue, diagnostics);
                self.elements.push(convert_implicit(self.binder, bound, &self.element, diagnostics));
                continue;
            }
            match element {
                Expr::ImplicitArrayCreation(nested) => self.row(&nested.initializer, depth + 1, diagnostics),
                other => {
                    diagnostics.add(BindError::ArrayInitializerExpected { span: other.span() });
                    let bound = bind_value(self.binder, other, ValueKind::ReadableValue, diagnostics);
                    let bound = natural_type(self.binder, bound, diagnostics);
                    self.elements.push(bound.with_errors());
                    self.has_errors = true;
                }
            }
        }
    }
}

/// Check explicit sizes against the initializer's row lengths.
fn sizes_match(sizes: &[BoundExpr<'_>], lengths: &[Option<u64>], diagnostics: &mut DiagnosticBag) -> bool {
    let mut matched = true;
    for (size, length) in sizes.iter().zip(lengths) {
        if size.has_errors {
            continue;
        }
        match size.constant_value().and_then(ConstantValue::as_integer) {
            Some(value) => {
                if Some(value) != length.map(i128::from) {
                    diagnostics.add(BindError::ArrayInitializerLength {
                        expected: u64::try_from(value).unwrap_or(0),
                        span: size.span,
                    });
                    matched = false;
                }
            }
            None => {
                diagnostics.add(BindError::ConstantExpected { span: size.span });
                matched = false;
            }
        }
    }
    matched
}

/// Bind an array size: an integral value of at least `int` width, never a
/// negative constant.
fn bind_size<'ast>(binder: &Binder<'_>, size: &Expr<'ast>, diagnostics: &mut DiagnosticBag) -> BoundExpr<'ast> {
    let bound = bind_value(binder, size, ValueKind::ReadableValue, diagnostics);
    let bound = natural_type(binder, bound, diagnostics);
    let target = SIZE_TYPES
        .iter()
        .find(|ty| classify_expression(binder, &bound, ty).is_implicit_conversion())
        .unwrap_or(&Ty::INT)
        .clone();
    let converted = convert_implicit(binder, bound, &target, diagnostics);
    let negative = converted
        .constant_value()
        .and_then(ConstantValue::as_integer)
        .is_some_and(|value| value < 0);
    if negative {
        diagnostics.add(BindError::NegativeArraySize { span: converted.span });
    }
    converted.with_errors_if(negative)
}

fn size_literal<'ast>(length: u64, span: Span) -> BoundExpr<'ast> {
    let value = i32::try_from(length).unwrap_or(i32::MAX);
    BoundExpr::literal(ConstantValue::Int(value), Ty::INT, span)
}

// ============================================================================
// stackalloc
// ============================================================================

/// Bind `stackalloc T[n] { ... }` to an untyped node.
#[instrument(level = "trace", skip_all)]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn bind_stackalloc<'ast>(
    binder: &Binder<'_>,
    stackalloc: &'ast StackAllocExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = stackalloc.span;
    let (element, mut has_errors) = bind_type_reporting(binder, &stackalloc.element, diagnostics);

    if binder.flags().contains(BinderFlags::IN_CATCH_OR_FINALLY) {
        diagnostics.add(BindError::StackAllocInvalidContext { span });
        has_errors = true;
    }
    if !element.contains_error() && !is_unmanaged(binder.symbols(), &element) {
        diagnostics.add(BindError::ManagedType {
            ty: element.to_string(),
            span,
        });
        has_errors = true;
    }

    let count = stackalloc.size.as_ref().map(|size| {
        let bound = bind_value(binder, size, ValueKind::ReadableValue, diagnostics);
        let converted = convert_implicit(binder, bound, &Ty::INT, diagnostics);
        let negative = converted.constant_value().and_then(ConstantValue::as_integer).is_some_and(|v| v < 0);
        if negative {
            diagnostics.add(BindError::NegativeArraySize { span: converted.span });
        }
        converted.with_errors_if(negative)
    });

    let initializer = stackalloc.initializer.as_ref().map(|initializer| {
        initializer
            .elements
            .iter()
            .map(|e| {
                let bound = bind_value(binder, e, ValueKind::ReadableValue, diagnostics);
                convert_implicit(binder, bound, &element, diagnostics)
            })
            .collect::<Vec<_>>()
    });

    let count = match (count, &initializer, &stackalloc.initializer) {
        (None, None, _) => {
            diagnostics.add(BindError::ArraySizeMissing { span });
            has_errors = true;
            None
        }
        (None, Some(_), Some(syntax)) => Some(size_literal(syntax.elements.len() as u64, syntax.span)),
        (Some(count), Some(elements), _) => {
            let lengths = [Some(elements.len() as u64)];
            if !sizes_match(std::slice::from_ref(&count), &lengths, diagnostics) {
                has_errors = true;
            }
            Some(count)
        }
        (count, _, _) => count,
    };

    BoundExpr::new(
        BoundKind::UnconvertedStackAlloc {
            element,
            count: count.map(Box::new),
            initializer,
        },
        None,
        span,
    )
    .with_errors_if(has_errors)
}

/// The natural type of `stackalloc T[n]` is `T*`.
pub(crate) fn natural_stackalloc<'ast>(
    binder: &Binder<'_>,
    expr: BoundExpr<'ast>,
    diagnostics: &mut DiagnosticBag,
) -> BoundExpr<'ast> {
    let span = expr.span;
    let had_errors = expr.has_errors;
    let BoundKind::UnconvertedStackAlloc {
        element,
        count,
        initializer,
    } = expr.kind
    else {
        return expr;
    };

    let available = binder.check_feature(MessageId::NestedStackalloc, span, diagnostics);
    let unsafe_context = binder.in_unsafe_context();
    if !unsafe_context {
        diagnostics.add(BindError::UnsafeNeeded { span });
    }
    let ty = Ty::pointer(element.clone());
    BoundExpr::typed(
        BoundKind::StackAllocArrayCreation {
            element,
            count,
            initializer,
        },
        ty,
        span,
    )
    .with_errors_if(had_errors || !available || !unsafe_context)
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use osprey_core::{ErrorKind, SpecialType};
    use osprey_syntax::AstBuilder;

    use super::*;
    use crate::expr::test_support::Fixture;

    fn sizes<'a>(bound: &'a BoundExpr<'_>) -> Vec<Option<&'a ConstantValue>> {
        match &bound.kind {
            BoundKind::ArrayCreation { sizes, .. } => sizes.iter().map(BoundExpr::constant_value).collect(),
            other => panic!("expected an array creation, got {other:?}"),
        }
    }

    #[test]
    fn sized_array() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.new_array(b.ty(SpecialType::Int32), &[b.ident("total")], None);
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert_eq!(bound.ty, Some(Ty::array(Ty::INT, 1)));
        assert!(!bound.has_errors);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn negative_constant_size() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let size = b.unary(osprey_syntax::UnaryOp::Minus, b.int(1));
        let expr = b.new_array(b.ty(SpecialType::Int32), &[size], None);
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::NegativeArraySize { .. })
        ));
    }

    #[test]
    fn initializer_supplies_the_sizes() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let rows = [
            b.implicit_array(&[b.int(1), b.int(2), b.int(3)]),
            b.implicit_array(&[b.int(4), b.int(5), b.int(6)]),
        ];
        let expr = b.new_array_of_rank(b.ty(SpecialType::Int32), 2, b.array_initializer(&rows));
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(bound.ty, Some(Ty::array(Ty::INT, 2)));
        assert_eq!(
            sizes(&bound),
            vec![Some(&ConstantValue::Int(2)), Some(&ConstantValue::Int(3))]
        );
        let BoundKind::ArrayCreation {
            initializer: Some(elements),
            ..
        } = &bound.kind
        else {
            panic!("expected an initializer");
        };
        assert_eq!(elements.len(), 6);
        assert_eq!(elements[3].constant_value(), Some(&ConstantValue::Int(4)));
    }

    #[test]
    fn ragged_initializer() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let rows = [b.implicit_array(&[b.int(1), b.int(2)]), b.implicit_array(&[b.int(3)])];
        let expr = b.new_array_of_rank(b.ty(SpecialType::Int32), 2, b.array_initializer(&rows));
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::ArrayInitializerLength { expected: 2, .. })
        ));
    }

    #[test]
    fn size_must_match_the_initializer() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let init = b.array_initializer(&[b.int(1), b.int(2)]);
        let expr = b.new_array(b.ty(SpecialType::Int32), &[b.int(3)], Some(init));
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert_eq!(diagnostics.len(), 1);

        let init = b.array_initializer(&[b.int(1)]);
        let expr = b.new_array(b.ty(SpecialType::Int32), &[b.ident("total")], Some(init));
        let (_, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert!(matches!(
            diagnostics.iter().next().map(|d| &d.error),
            Some(BindError::ConstantExpected { .. })
        ));
    }

    #[test]
    fn implicit_array_uses_the_best_common_type() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.implicit_array(&[b.int(1), b.double(2.5)]);
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert_eq!(bound.ty, Some(Ty::array(Ty::DOUBLE, 1)));
        assert!(diagnostics.is_empty());

        let expr = b.implicit_array(&[b.int(1), b.string("two")]);
        let (bound, diagnostics) = fx.bind_value(&fx.context(), &expr, ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert_eq!(diagnostics.count_of(ErrorKind::InvalidConversion), 1);
    }

    #[test]
    fn stackalloc_is_untyped_until_converted() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ctx = fx.context().with_flags(BinderFlags::UNSAFE);
        let expr = b.stackalloc(b.ty(SpecialType::Int32), b.int(4));
        fx.bind(&ctx, |binder| {
            let mut diagnostics = DiagnosticBag::new();
            let bound = crate::expr::bind_expression(binder, &expr, &mut diagnostics);
            assert!(bound.is_untyped());
            let natural = natural_type(binder, bound, &mut diagnostics);
            assert_eq!(natural.ty, Some(Ty::pointer(Ty::INT)));
            assert!(matches!(natural.kind, BoundKind::StackAllocArrayCreation { .. }));
            assert!(diagnostics.is_empty());
        });
    }

    #[test]
    fn stackalloc_restrictions() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);

        let managed = b.stackalloc(b.ty(SpecialType::String), b.int(4));
        let ctx = fx.context().with_flags(BinderFlags::UNSAFE);
        let (bound, diagnostics) = fx.bind_value(&ctx, &managed, ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert!(diagnostics.iter().any(|d| matches!(d.error, BindError::ManagedType { .. })));

        let in_finally = fx.context().with_flags(BinderFlags::UNSAFE | BinderFlags::IN_CATCH_OR_FINALLY);
        let expr = b.stackalloc_init(b.ty(SpecialType::Int32), None, &[b.int(1), b.int(2)]);
        let (bound, diagnostics) = fx.bind_value(&in_finally, &expr, ValueKind::ReadableValue);
        assert!(bound.has_errors);
        assert!(
            diagnostics
                .iter()
                .any(|d| matches!(d.error, BindError::StackAllocInvalidContext { .. }))
        );
    }

    #[test]
    fn stackalloc_pointer_outside_unsafe() {
        let fx = Fixture::new();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let expr = b.stackalloc(b.ty(SpecialType::Int32), b.int(4));
        fx.bind(&fx.context(), |binder| {
            let mut diagnostics = DiagnosticBag::new();
            let bound = bind_value(binder, &expr, ValueKind::ReadableValue, &mut diagnostics);
            assert!(!bound.has_errors);
            let natural = natural_type(binder, bound, &mut diagnostics);
            assert!(natural.has_errors);
            assert!(diagnostics.iter().any(|d| matches!(d.error, BindError::UnsafeNeeded { .. })));
        });
    }
}
