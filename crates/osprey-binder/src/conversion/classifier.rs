//! The default conversion classifier.

use osprey_core::{ConstantValue, MethodKind, MethodSymbol, SpecialType, Ty, TypeKind};
use osprey_symbols::SymbolTable;

use super::numeric::{implicit_numeric_exists, numeric_rank};
use super::{
    COST_BOXING, COST_CONSTANT, COST_DYNAMIC, COST_ERROR, COST_NUMERIC, COST_REFERENCE,
    COST_TARGET_TYPED, COST_USER_DEFINED, Conversion, ConversionKind, Conversions,
};

/// Conversion rules over the [`SymbolTable`] type model.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConversions;

impl Conversions for DefaultConversions {
    fn classify(&self, symbols: &SymbolTable, from: &Ty, to: &Ty) -> Conversion {
        standard(symbols, from, to)
            .or_else(|| user_defined(symbols, from, to))
            .unwrap_or_else(Conversion::none)
    }

    fn classify_constant(
        &self,
        symbols: &SymbolTable,
        value: &ConstantValue,
        from: &Ty,
        to: &Ty,
    ) -> Conversion {
        let conversion = self.classify(symbols, from, to);
        if conversion.is_implicit_conversion() {
            return conversion;
        }

        if let (Some(source), Some(target)) = (from.as_special(), to.as_special())
            && constant_narrowing_allowed(source, target)
            && value.fits_in(target)
        {
            return Conversion::implicit(ConversionKind::ImplicitConstant, COST_CONSTANT);
        }

        // Literal zero converts to any enum.
        if value.as_integer() == Some(0)
            && !matches!(value, ConstantValue::Char(_))
            && symbols
                .def_of(to)
                .is_some_and(|def| def.kind == TypeKind::Enum)
        {
            return Conversion::implicit(ConversionKind::ImplicitEnumeration, COST_CONSTANT);
        }

        conversion
    }
}

/// `int` constants narrow to any integral type but `char`; `long`
/// constants narrow to `ulong`.
fn constant_narrowing_allowed(source: SpecialType, target: SpecialType) -> bool {
    match source {
        SpecialType::Int32 => target.is_integral() && target != SpecialType::Char,
        SpecialType::Int64 => target == SpecialType::UInt64,
        _ => false,
    }
}

// ============================================================================
// Standard conversions
// ============================================================================

/// Every conversion except user-defined ones.
fn standard(symbols: &SymbolTable, from: &Ty, to: &Ty) -> Option<Conversion> {
    if identical(from, to) {
        return Some(Conversion::identity());
    }
    if from.contains_error() || to.contains_error() {
        return Some(Conversion::implicit(ConversionKind::ErrorType, COST_ERROR));
    }
    if from.is_void() || to.is_void() {
        return None;
    }

    if let Ty::Null = from {
        return null_conversion(symbols, to);
    }

    if to.is_dynamic() {
        return (!from.is_unsafe())
            .then(|| Conversion::implicit(ConversionKind::ImplicitDynamic, COST_DYNAMIC));
    }
    if from.is_dynamic() {
        return (!to.is_unsafe())
            .then(|| Conversion::implicit(ConversionKind::ImplicitDynamic, COST_DYNAMIC));
    }

    if let (Some(source), Some(target)) = (from.as_special(), to.as_special())
        && source.is_numeric()
        && target.is_numeric()
    {
        return Some(if implicit_numeric_exists(source, target) {
            Conversion::implicit(
                ConversionKind::ImplicitNumeric,
                COST_NUMERIC + numeric_rank(target),
            )
        } else {
            Conversion::explicit(ConversionKind::ExplicitNumeric)
        });
    }

    if let (Ty::Tuple(source), Ty::Tuple(target)) = (from, to) {
        return tuple_conversion(symbols, &source.elements, &target.elements);
    }

    if from.is_unsafe() || to.is_unsafe() {
        return pointer_conversion(from, to);
    }

    if let Some(distance) = upcast_distance(symbols, from, to) {
        return Some(if symbols.is_reference_type(from) {
            Conversion::implicit(ConversionKind::ImplicitReference, COST_REFERENCE + distance)
        } else {
            Conversion::implicit(ConversionKind::Boxing, COST_BOXING + distance)
        });
    }

    if let (Ty::Array(source), Ty::Array(target)) = (from, to)
        && source.rank == target.rank
        && symbols.is_reference_type(&source.element)
    {
        let element = standard(symbols, &source.element, &target.element)?;
        return match element.kind {
            ConversionKind::ImplicitReference => Some(Conversion::implicit(
                ConversionKind::ImplicitReference,
                element.cost + 1,
            )),
            ConversionKind::ExplicitReference => {
                Some(Conversion::explicit(ConversionKind::ExplicitReference))
            }
            _ => None,
        };
    }

    explicit_reference(symbols, from, to).or_else(|| enum_conversion(symbols, from, to))
}

/// Structural identity, ignoring tuple element names.
fn identical(from: &Ty, to: &Ty) -> bool {
    match (from, to) {
        (Ty::Tuple(a), Ty::Tuple(b)) => {
            a.elements.len() == b.elements.len()
                && a.elements
                    .iter()
                    .zip(b.elements.iter())
                    .all(|(x, y)| identical(x, y))
        }
        _ => from == to,
    }
}

fn null_conversion(symbols: &SymbolTable, to: &Ty) -> Option<Conversion> {
    if to.pointee().is_some() || matches!(to, Ty::FunctionPointer(_)) {
        return Some(Conversion::implicit(
            ConversionKind::NullToPointer,
            COST_TARGET_TYPED,
        ));
    }
    if symbols.is_reference_type(to) {
        // Prefer a typed reference over `object` when both accept null.
        let cost = COST_TARGET_TYPED + u32::from(to == &Ty::OBJECT);
        return Some(Conversion::implicit(ConversionKind::NullLiteral, cost));
    }
    None
}

fn tuple_conversion(symbols: &SymbolTable, from: &[Ty], to: &[Ty]) -> Option<Conversion> {
    if from.len() != to.len() {
        return None;
    }
    let mut implicit = true;
    let mut cost: u32 = 0;
    for (source, target) in from.iter().zip(to) {
        let element = DefaultConversions.classify(symbols, source, target);
        if !element.exists() {
            return None;
        }
        implicit &= element.is_implicit;
        cost = cost.saturating_add(element.cost);
    }
    Some(if implicit {
        Conversion::implicit(ConversionKind::ImplicitTuple, cost)
    } else {
        Conversion::explicit(ConversionKind::ExplicitTuple)
    })
}

fn pointer_conversion(from: &Ty, to: &Ty) -> Option<Conversion> {
    let integral = |ty: &Ty| ty.as_special().is_some_and(SpecialType::is_integral);
    match (from, to) {
        (Ty::Pointer(_), Ty::Pointer(pointee)) if pointee.is_void() => Some(
            Conversion::implicit(ConversionKind::PointerToVoid, COST_REFERENCE),
        ),
        (Ty::Pointer(_), Ty::Pointer(_)) => Some(Conversion::explicit(ConversionKind::ExplicitPointer)),
        (Ty::Pointer(_), other) | (other, Ty::Pointer(_)) if integral(other) => {
            Some(Conversion::explicit(ConversionKind::ExplicitPointer))
        }
        _ => None,
    }
}

/// How far `to` is above `from` in the base chain or interface set.
///
/// Nearer bases cost less; interfaces rank after every base class.
fn upcast_distance(symbols: &SymbolTable, from: &Ty, to: &Ty) -> Option<u32> {
    let chain = symbols.base_chain(from);
    if let Some(index) = chain.iter().position(|base| base == to) {
        return Some(2 * (index as u32 + 1));
    }
    let is_interface = symbols.def_of(from).is_some_and(|def| def.is_interface());
    if is_interface && to == &Ty::OBJECT {
        return Some(2);
    }
    if symbols.all_interfaces(from).contains(to) {
        return Some(2 * chain.len() as u32 + 1);
    }
    // Enums box to System.Enum.
    if to.is_special(SpecialType::Enum)
        && symbols
            .def_of(from)
            .is_some_and(|def| def.kind == TypeKind::Enum)
    {
        return Some(1);
    }
    None
}

fn explicit_reference(symbols: &SymbolTable, from: &Ty, to: &Ty) -> Option<Conversion> {
    if upcast_distance(symbols, to, from).is_some() {
        let kind = if symbols.is_value_type(to) {
            ConversionKind::Unboxing
        } else {
            ConversionKind::ExplicitReference
        };
        return Some(Conversion::explicit(kind));
    }

    // Casting to or from an interface is allowed unless a sealed class rules
    // it out.
    let from_def = symbols.def_of(from);
    let to_def = symbols.def_of(to);
    let interface_cast = match (from_def, to_def) {
        (Some(a), Some(b)) if a.is_interface() && b.is_interface() => true,
        (Some(a), Some(b)) if a.is_interface() => b.kind == TypeKind::Class && !b.is_sealed,
        (Some(a), Some(b)) if b.is_interface() => a.kind == TypeKind::Class && !a.is_sealed,
        _ => false,
    };
    interface_cast.then(|| Conversion::explicit(ConversionKind::ExplicitReference))
}

fn enum_conversion(symbols: &SymbolTable, from: &Ty, to: &Ty) -> Option<Conversion> {
    let is_enum = |ty: &Ty| symbols.def_of(ty).is_some_and(|def| def.kind == TypeKind::Enum);
    let enum_like = |ty: &Ty| is_enum(ty) || ty.is_numeric();
    ((is_enum(from) || is_enum(to)) && enum_like(from) && enum_like(to))
        .then(|| Conversion::explicit(ConversionKind::ExplicitEnumeration))
}

// ============================================================================
// User-defined conversions
// ============================================================================

/// `op_Implicit` / `op_Explicit` declared on the source or target type.
///
/// The operand may reach the operator's parameter, and its result the
/// target, through standard implicit conversions only.
fn user_defined(symbols: &SymbolTable, from: &Ty, to: &Ty) -> Option<Conversion> {
    let mut best: Option<Conversion> = None;
    for container in [from, to] {
        let Some(def) = symbols.def_of(container) else {
            continue;
        };
        let subst = symbols.substitution_for(container);
        for method in def.methods.iter().filter(|m| m.kind == MethodKind::Conversion) {
            let symbol = MethodSymbol::new(method.clone(), container.clone(), &subst);
            let Some(param) = symbol.params.first() else {
                continue;
            };
            let (Some(into_param), Some(into_target)) = (
                standard(symbols, from, &param.ty),
                standard(symbols, &symbol.return_type, to),
            ) else {
                continue;
            };
            let implicit = symbol.name() == "op_Implicit"
                && into_param.is_implicit_conversion()
                && into_target.is_implicit_conversion();
            let candidate = if implicit {
                let cost = COST_USER_DEFINED + into_param.cost + into_target.cost;
                Conversion::implicit(ConversionKind::UserDefined(symbol), cost)
            } else {
                Conversion::explicit(ConversionKind::UserDefined(symbol))
            };
            let better = match &best {
                None => true,
                Some(current) => {
                    (candidate.is_implicit && !current.is_implicit)
                        || (candidate.is_implicit == current.is_implicit
                            && candidate.cost < current.cost)
                }
            };
            if better {
                best = Some(candidate);
            }
        }
    }
    best
}
