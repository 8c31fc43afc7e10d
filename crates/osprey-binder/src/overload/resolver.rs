//! Applicability of individual candidates.

use osprey_core::{RefKind, Substitution, Ty, TypeHash};
use tracing::trace;

use super::{
    ArgumentConverter, ArgumentInfo, CandidateSignature, MemberResolutionKind,
    MemberResolutionResult, OverloadResolutionResult, OverloadResolver, find_best_match,
};
use crate::conversion::ConversionKind;

/// Cost-based resolution: the applicable candidate with the cheapest
/// argument conversions wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOverloadResolver;

impl OverloadResolver for DefaultOverloadResolver {
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn resolve(
        &self,
        candidates: &[CandidateSignature],
        args: &[ArgumentInfo],
        converter: &dyn ArgumentConverter,
    ) -> OverloadResolutionResult {
        let results: Vec<_> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| evaluate(index, candidate, args, converter))
            .collect();
        let (best, ambiguous) = find_best_match(&results);
        trace!(
            candidates = candidates.len(),
            applicable = results.iter().filter(|r| r.is_applicable()).count(),
            ?best,
            "overload resolution"
        );
        OverloadResolutionResult {
            results,
            best,
            ambiguous,
        }
    }
}

/// Try the normal form, then the expanded form for a `params` tail.
fn evaluate(
    index: usize,
    candidate: &CandidateSignature,
    args: &[ArgumentInfo],
    converter: &dyn ArgumentConverter,
) -> MemberResolutionResult {
    let normal = try_form(index, candidate, args, converter, false);
    if normal.is_applicable() || !candidate.has_params_tail() {
        return normal;
    }
    let expanded = try_form(index, candidate, args, converter, true);
    if expanded.is_applicable() || expanded.kind.progress() > normal.kind.progress() {
        expanded
    } else {
        normal
    }
}

fn try_form(
    index: usize,
    candidate: &CandidateSignature,
    args: &[ArgumentInfo],
    converter: &dyn ArgumentConverter,
    expanded: bool,
) -> MemberResolutionResult {
    let params = &candidate.params;
    let tail = params.len().saturating_sub(1);
    let mut result = MemberResolutionResult::failed(index, MemberResolutionKind::Applicable);
    result.is_expanded = expanded;

    // === Argument to parameter mapping ===
    let mut assigned = vec![false; params.len()];
    for (i, arg) in args.iter().enumerate() {
        let param = match &arg.name {
            Some(name) => match params.iter().position(|p| p.name == *name) {
                Some(p) if expanded && p == tail => {
                    result.kind = MemberResolutionKind::NoCorrespondingParameter { arg: i };
                    return result;
                }
                Some(p) => p,
                None => {
                    result.kind = MemberResolutionKind::NoCorrespondingParameter { arg: i };
                    return result;
                }
            },
            None if expanded && i >= tail => tail,
            None if i < params.len() => i,
            None => {
                result.kind = MemberResolutionKind::WrongArgumentCount;
                return result;
            }
        };
        let packed = expanded && param == tail;
        if assigned[param] && !packed {
            result.kind = MemberResolutionKind::NamedArgumentUsedTwice { arg: i };
            return result;
        }
        assigned[param] = true;
        result.arg_to_param.push(param);
    }

    if let Some(missing) = params
        .iter()
        .enumerate()
        .position(|(p, param)| !assigned[p] && !param.is_optional() && !(expanded && p == tail))
    {
        result.kind = MemberResolutionKind::RequiredParameterMissing { param: missing };
        return result;
    }

    let declared: Vec<Ty> = result
        .arg_to_param
        .iter()
        .map(|&p| {
            let ty = &params[p].ty;
            match ty.as_array() {
                Some(array) if expanded && p == tail => array.element.clone(),
                _ => ty.clone(),
            }
        })
        .collect();

    // === Type inference ===
    let subst = if candidate.type_params.is_empty() {
        Substitution::new()
    } else {
        match infer(&candidate.type_params, &declared, args) {
            Some(type_args) => {
                let subst = Substitution::from_pairs(&candidate.type_params, &type_args);
                result.type_args = type_args;
                subst
            }
            None => {
                result.kind = MemberResolutionKind::TypeInferenceFailed;
                return result;
            }
        }
    };
    result.parameter_types = declared.iter().map(|ty| ty.substitute(&subst)).collect();

    // === Ref kinds and conversions ===
    let mut cost: u32 = 0;
    for (i, arg) in args.iter().enumerate() {
        let param = result.arg_to_param[i];
        let expected = if expanded && param == tail {
            RefKind::None
        } else {
            params[param].ref_kind
        };
        if !ref_kind_matches(arg.ref_kind, expected) {
            result.kind = MemberResolutionKind::BadRefKind { arg: i };
            return result;
        }
        let conversion = converter.classify(i, &result.parameter_types[i]);
        let convertible = match arg.ref_kind {
            RefKind::Ref | RefKind::Out => {
                conversion.is_identity() || conversion.kind == ConversionKind::ErrorType
            }
            _ => conversion.is_implicit_conversion(),
        };
        if !convertible {
            result.conversions.push(conversion);
            result.kind = MemberResolutionKind::BadArgumentConversion { arg: i };
            return result;
        }
        cost = cost.saturating_add(conversion.cost);
        result.conversions.push(conversion);
    }

    result.cost = cost;
    result
}

/// An `in` parameter also accepts a plain value argument.
fn ref_kind_matches(arg: RefKind, param: RefKind) -> bool {
    arg == param || (param == RefKind::In && arg == RefKind::None)
}

// ============================================================================
// Type inference
// ============================================================================

/// Infer method type arguments from argument types. Every type parameter
/// must be fixed by some argument, and consistently.
fn infer(type_params: &[TypeHash], declared: &[Ty], args: &[ArgumentInfo]) -> Option<Vec<Ty>> {
    let mut inferred: Vec<Option<Ty>> = vec![None; type_params.len()];
    for (param_ty, arg) in declared.iter().zip(args) {
        let Some(arg_ty) = &arg.ty else {
            continue;
        };
        if matches!(arg_ty, Ty::Null) {
            continue;
        }
        unify(param_ty, arg_ty, type_params, &mut inferred)?;
    }
    inferred.into_iter().collect()
}

fn unify(
    param_ty: &Ty,
    arg_ty: &Ty,
    type_params: &[TypeHash],
    inferred: &mut [Option<Ty>],
) -> Option<()> {
    match (param_ty, arg_ty) {
        (Ty::TypeParam(param), _) => {
            if let Some(pos) = type_params.iter().position(|h| *h == param.hash) {
                match &inferred[pos] {
                    None => inferred[pos] = Some(arg_ty.clone()),
                    Some(existing) if existing == arg_ty => {}
                    Some(_) => return None,
                }
            }
        }
        (Ty::Array(p), Ty::Array(a)) if p.rank == a.rank => {
            unify(&p.element, &a.element, type_params, inferred)?;
        }
        (Ty::Named(p), Ty::Named(a)) if p.def == a.def && p.args.len() == a.args.len() => {
            for (p, a) in p.args.iter().zip(a.args.iter()) {
                unify(p, a, type_params, inferred)?;
            }
        }
        (Ty::Tuple(p), Ty::Tuple(a)) if p.elements.len() == a.elements.len() => {
            for (p, a) in p.elements.iter().zip(a.elements.iter()) {
                unify(p, a, type_params, inferred)?;
            }
        }
        _ => {}
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use osprey_core::{ConstantValue, ParamInfo};
    use osprey_symbols::SymbolTable;

    use super::*;
    use crate::conversion::{Conversion, Conversions, DefaultConversions};

    struct TypeConverter<'a> {
        symbols: &'a SymbolTable,
        args: Vec<Ty>,
    }

    impl ArgumentConverter for TypeConverter<'_> {
        fn classify(&self, arg: usize, target: &Ty) -> Conversion {
            DefaultConversions.classify(self.symbols, &self.args[arg], target)
        }
    }

    fn param(name: &str, ty: Ty) -> ParamInfo {
        ParamInfo {
            name: name.into(),
            ty,
            ref_kind: RefKind::None,
            is_params: false,
            default: None,
        }
    }

    fn candidate(params: Vec<ParamInfo>) -> CandidateSignature {
        CandidateSignature {
            name: "M".into(),
            params: Rc::from(params),
            type_params: Vec::new(),
        }
    }

    fn resolve(
        symbols: &SymbolTable,
        candidates: &[CandidateSignature],
        args: Vec<ArgumentInfo>,
    ) -> OverloadResolutionResult {
        let converter = TypeConverter {
            symbols,
            args: args.iter().map(|a| a.ty.clone().unwrap_or_else(Ty::unknown)).collect(),
        };
        DefaultOverloadResolver.resolve(candidates, &args, &converter)
    }

    fn named(name: &str, ty: Ty) -> ArgumentInfo {
        ArgumentInfo {
            name: Some(name.into()),
            ..ArgumentInfo::positional(ty)
        }
    }

    #[test]
    fn exact_match_beats_widening() {
        let symbols = SymbolTable::with_special_types();
        let candidates = [
            candidate(vec![param("x", Ty::LONG)]),
            candidate(vec![param("x", Ty::INT)]),
        ];
        let result = resolve(&symbols, &candidates, vec![ArgumentInfo::positional(Ty::INT)]);
        assert_eq!(result.best, Some(1));
        assert!(!result.is_ambiguous());
    }

    #[test]
    fn symmetric_widening_is_ambiguous() {
        let symbols = SymbolTable::with_special_types();
        let candidates = [
            candidate(vec![param("a", Ty::INT), param("b", Ty::LONG)]),
            candidate(vec![param("a", Ty::LONG), param("b", Ty::INT)]),
        ];
        let args = vec![ArgumentInfo::positional(Ty::INT), ArgumentInfo::positional(Ty::INT)];
        let result = resolve(&symbols, &candidates, args);
        assert!(!result.succeeded());
        assert_eq!(result.ambiguous, vec![0, 1]);
    }

    #[test]
    fn named_arguments_map_by_name() {
        let symbols = SymbolTable::with_special_types();
        let candidates = [candidate(vec![param("a", Ty::INT), param("b", Ty::STRING)])];
        let args = vec![named("b", Ty::STRING), named("a", Ty::INT)];
        let result = resolve(&symbols, &candidates, args);
        let best = result.best_result().unwrap();
        assert_eq!(best.arg_to_param, vec![1, 0]);
        assert_eq!(best.parameter_types, vec![Ty::STRING, Ty::INT]);
    }

    #[test]
    fn unknown_and_repeated_names_fail() {
        let symbols = SymbolTable::with_special_types();
        let candidates = [candidate(vec![param("a", Ty::INT)])];

        let unknown = resolve(&symbols, &candidates, vec![named("z", Ty::INT)]);
        assert_eq!(
            unknown.results[0].kind,
            MemberResolutionKind::NoCorrespondingParameter { arg: 0 }
        );

        let twice = resolve(
            &symbols,
            &candidates,
            vec![ArgumentInfo::positional(Ty::INT), named("a", Ty::INT)],
        );
        assert_eq!(
            twice.results[0].kind,
            MemberResolutionKind::NamedArgumentUsedTwice { arg: 1 }
        );
    }

    #[test]
    fn params_tail_expands() {
        let symbols = SymbolTable::with_special_types();
        let mut tail = param("values", Ty::array(Ty::INT, 1));
        tail.is_params = true;
        let candidates = [candidate(vec![param("label", Ty::STRING), tail])];

        let args = vec![
            ArgumentInfo::positional(Ty::STRING),
            ArgumentInfo::positional(Ty::INT),
            ArgumentInfo::positional(Ty::INT),
        ];
        let expanded = resolve(&symbols, &candidates, args);
        let best = expanded.best_result().unwrap();
        assert!(best.is_expanded);
        assert_eq!(best.arg_to_param, vec![0, 1, 1]);
        assert_eq!(best.parameter_types[2], Ty::INT);

        let args = vec![
            ArgumentInfo::positional(Ty::STRING),
            ArgumentInfo::positional(Ty::array(Ty::INT, 1)),
        ];
        let normal = resolve(&symbols, &candidates, args);
        assert!(!normal.best_result().unwrap().is_expanded);

        let empty = resolve(&symbols, &candidates, vec![ArgumentInfo::positional(Ty::STRING)]);
        assert!(empty.best_result().unwrap().is_expanded);
    }

    #[test]
    fn optional_parameters_may_be_omitted() {
        let symbols = SymbolTable::with_special_types();
        let mut optional = param("b", Ty::INT);
        optional.default = Some(ConstantValue::Int(0));
        let candidates = [candidate(vec![param("a", Ty::INT), optional])];
        let result = resolve(&symbols, &candidates, vec![ArgumentInfo::positional(Ty::INT)]);
        assert!(result.succeeded());

        let none = resolve(&symbols, &candidates, vec![]);
        assert_eq!(
            none.results[0].kind,
            MemberResolutionKind::RequiredParameterMissing { param: 0 }
        );
    }

    #[test]
    fn ref_kinds_must_match() {
        let symbols = SymbolTable::with_special_types();
        let mut by_ref = param("x", Ty::INT);
        by_ref.ref_kind = RefKind::Ref;
        let candidates = [candidate(vec![by_ref])];

        let value = resolve(&symbols, &candidates, vec![ArgumentInfo::positional(Ty::INT)]);
        assert_eq!(value.results[0].kind, MemberResolutionKind::BadRefKind { arg: 0 });

        let arg = ArgumentInfo {
            ref_kind: RefKind::Ref,
            ..ArgumentInfo::positional(Ty::LONG)
        };
        let mismatched = resolve(&symbols, &candidates, vec![arg]);
        assert_eq!(
            mismatched.results[0].kind,
            MemberResolutionKind::BadArgumentConversion { arg: 0 }
        );
    }

    #[test]
    fn type_arguments_are_inferred() {
        let symbols = SymbolTable::with_special_types();
        let t = Ty::type_param(TypeHash::from_name("M``T"), "T");
        let generic = CandidateSignature {
            name: "M".into(),
            params: Rc::from(vec![param("a", t.clone()), param("b", t.clone())]),
            type_params: vec![TypeHash::from_name("M``T")],
        };
        let candidates = [generic];

        let args = vec![ArgumentInfo::positional(Ty::INT), ArgumentInfo::positional(Ty::INT)];
        let result = resolve(&symbols, &candidates, args);
        assert_eq!(result.best_result().unwrap().type_args, vec![Ty::INT]);

        let args = vec![ArgumentInfo::positional(Ty::INT), ArgumentInfo::positional(Ty::STRING)];
        let conflict = resolve(&symbols, &candidates, args);
        assert_eq!(conflict.results[0].kind, MemberResolutionKind::TypeInferenceFailed);
    }

    #[test]
    fn closest_prefers_conversion_failures() {
        let symbols = SymbolTable::with_special_types();
        let candidates = [
            candidate(vec![param("a", Ty::INT), param("b", Ty::INT)]),
            candidate(vec![param("s", Ty::STRING)]),
        ];
        let result = resolve(&symbols, &candidates, vec![ArgumentInfo::positional(Ty::INT)]);
        let closest = result.closest().unwrap();
        assert_eq!(closest.candidate, 1);
        assert_eq!(closest.kind, MemberResolutionKind::BadArgumentConversion { arg: 0 });
        assert!(!result.all_wrong_count());
    }
}
