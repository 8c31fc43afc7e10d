//! Ranking applicable candidates.

use super::MemberResolutionResult;

/// Pick the best applicable candidate.
///
/// Returns the index of the unique best result, or the indices of the tied
/// candidates when no single one wins. Both are empty/`None` when nothing
/// is applicable.
pub fn find_best_match(results: &[MemberResolutionResult]) -> (Option<usize>, Vec<usize>) {
    let mut viable: Vec<&MemberResolutionResult> =
        results.iter().filter(|r| r.is_applicable()).collect();

    match viable.len() {
        0 => return (None, Vec::new()),
        1 => return (Some(viable[0].candidate), Vec::new()),
        _ => {}
    }

    viable.sort_by_key(|r| r.cost);
    let lowest = viable[0].cost;
    let tied: Vec<&MemberResolutionResult> =
        viable.into_iter().take_while(|r| r.cost == lowest).collect();

    if tied.len() == 1 {
        return (Some(tied[0].candidate), Vec::new());
    }

    // A winner must beat every other tied candidate
    for &candidate in &tied {
        let beats_all = tied.iter().all(|&other| {
            other.candidate == candidate.candidate
                || break_tie(candidate, other) == Some(candidate.candidate)
        });
        if beats_all {
            return (Some(candidate.candidate), Vec::new());
        }
    }

    let mut ambiguous: Vec<usize> = tied.iter().map(|r| r.candidate).collect();
    ambiguous.sort_unstable();
    (None, ambiguous)
}

/// Compare two candidates of equal cost.
fn break_tie(a: &MemberResolutionResult, b: &MemberResolutionResult) -> Option<usize> {
    let a_exact = count_exact_matches(a);
    let b_exact = count_exact_matches(b);
    if a_exact != b_exact {
        return Some(if a_exact > b_exact { a.candidate } else { b.candidate });
    }

    if a.is_expanded != b.is_expanded {
        return Some(if a.is_expanded { b.candidate } else { a.candidate });
    }

    let a_generic = !a.type_args.is_empty();
    let b_generic = !b.type_args.is_empty();
    if a_generic != b_generic {
        return Some(if a_generic { b.candidate } else { a.candidate });
    }

    None
}

fn count_exact_matches(result: &MemberResolutionResult) -> usize {
    result.conversions.iter().filter(|c| c.is_identity()).count()
}

#[cfg(test)]
mod tests {
    use osprey_core::Ty;

    use super::*;
    use crate::conversion::{COST_NUMERIC, Conversion, ConversionKind};
    use crate::overload::MemberResolutionKind;

    fn applicable(candidate: usize, conversions: Vec<Conversion>) -> MemberResolutionResult {
        let cost = conversions.iter().map(|c| c.cost).sum();
        MemberResolutionResult {
            candidate,
            kind: MemberResolutionKind::Applicable,
            arg_to_param: (0..conversions.len()).collect(),
            parameter_types: vec![Ty::INT; conversions.len()],
            conversions,
            type_args: Vec::new(),
            is_expanded: false,
            cost,
        }
    }

    fn widening() -> Conversion {
        Conversion::implicit(ConversionKind::ImplicitNumeric, COST_NUMERIC)
    }

    #[test]
    fn nothing_applicable() {
        let results = vec![MemberResolutionResult::failed(
            0,
            MemberResolutionKind::WrongArgumentCount,
        )];
        assert_eq!(find_best_match(&results), (None, Vec::new()));
    }

    #[test]
    fn lowest_cost_wins() {
        let results = vec![
            applicable(0, vec![widening()]),
            applicable(1, vec![Conversion::identity()]),
        ];
        assert_eq!(find_best_match(&results), (Some(1), Vec::new()));
    }

    #[test]
    fn normal_form_beats_expanded() {
        let mut expanded = applicable(0, vec![Conversion::identity()]);
        expanded.is_expanded = true;
        let results = vec![expanded, applicable(1, vec![Conversion::identity()])];
        assert_eq!(find_best_match(&results), (Some(1), Vec::new()));
    }

    #[test]
    fn non_generic_beats_generic() {
        let mut generic = applicable(0, vec![Conversion::identity()]);
        generic.type_args = vec![Ty::INT];
        let results = vec![generic, applicable(1, vec![Conversion::identity()])];
        assert_eq!(find_best_match(&results), (Some(1), Vec::new()));
    }

    #[test]
    fn indistinguishable_candidates_are_ambiguous() {
        let results = vec![
            applicable(0, vec![Conversion::identity(), widening()]),
            applicable(1, vec![widening(), Conversion::identity()]),
            MemberResolutionResult::failed(2, MemberResolutionKind::TypeInferenceFailed),
        ];
        assert_eq!(find_best_match(&results), (None, vec![0, 1]));
    }
}
