//! Overload resolution for invocations, indexers and constructors.
//!
//! This module selects the best member from a candidate set given the
//! arguments at the use site. It knows nothing about expressions: argument
//! conversions are classified through an [`ArgumentConverter`] supplied by
//! the binder, which owns the bound arguments (lambdas, method groups and
//! constants convert differently from their types).
//!
//! ## Algorithm
//!
//! 1. Map arguments to parameters, by name and then by position
//! 2. Try the normal form; for a `params` tail, also the expanded form
//! 3. Infer method type arguments from argument types
//! 4. Check ref kinds and require an implicit conversion per argument
//! 5. Rank applicable candidates by total conversion cost
//! 6. Report ambiguity when the best candidates tie

mod ranking;
mod resolver;

pub use ranking::find_best_match;
pub use resolver::DefaultOverloadResolver;

use std::rc::Rc;

use osprey_core::{MethodSymbol, ParamInfo, PropertySymbol, RefKind, Ty, TypeHash};

use crate::conversion::Conversion;

// ============================================================================
// Inputs
// ============================================================================

/// A member signature taking part in resolution.
#[derive(Debug, Clone)]
pub struct CandidateSignature {
    /// Name for diagnostics.
    pub name: Rc<str>,
    pub params: Rc<[ParamInfo]>,
    /// Method type parameters still to be inferred; empty when the member
    /// is not generic or was constructed with explicit type arguments.
    pub type_params: Vec<TypeHash>,
}

impl CandidateSignature {
    pub fn from_method(method: &MethodSymbol) -> Self {
        let type_params = if method.is_generic_definition() {
            method.def.type_params.iter().map(|tp| tp.hash).collect()
        } else {
            Vec::new()
        };
        Self {
            name: method.name().into(),
            params: method.params.clone(),
            type_params,
        }
    }

    /// A constructor, named after the type it creates.
    pub fn from_constructor(ctor: &MethodSymbol) -> Self {
        Self {
            name: ctor.container.to_string().into(),
            ..Self::from_method(ctor)
        }
    }

    pub fn from_indexer(indexer: &PropertySymbol) -> Self {
        Self {
            name: format!("{}.this[]", indexer.container).into(),
            params: indexer.params.clone(),
            type_params: Vec::new(),
        }
    }

    /// Whether the last parameter is a `params` array.
    pub fn has_params_tail(&self) -> bool {
        self.params
            .last()
            .is_some_and(|p| p.is_params && p.ty.as_array().is_some())
    }
}

/// What resolution needs to know about one argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentInfo {
    /// `None` for untyped arguments (lambdas, method groups, `default`).
    pub ty: Option<Ty>,
    pub name: Option<Rc<str>>,
    pub ref_kind: RefKind,
}

impl ArgumentInfo {
    pub fn positional(ty: Ty) -> Self {
        Self {
            ty: Some(ty),
            name: None,
            ref_kind: RefKind::None,
        }
    }
}

/// Classifies the conversion of the `arg`-th argument to a parameter type.
pub trait ArgumentConverter {
    fn classify(&self, arg: usize, target: &Ty) -> Conversion;
}

// ============================================================================
// Results
// ============================================================================

/// Why a candidate is (or is not) applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberResolutionKind {
    Applicable,
    /// More arguments than parameters, with no `params` tail to absorb them.
    WrongArgumentCount,
    /// A named argument matches no parameter.
    NoCorrespondingParameter { arg: usize },
    /// A named argument names a parameter that already has an argument.
    NamedArgumentUsedTwice { arg: usize },
    /// A required parameter received no argument.
    RequiredParameterMissing { param: usize },
    TypeInferenceFailed,
    BadRefKind { arg: usize },
    BadArgumentConversion { arg: usize },
}

impl MemberResolutionKind {
    /// How far a candidate got before failing; the closest failure is the
    /// one worth reporting.
    fn progress(self) -> u8 {
        match self {
            MemberResolutionKind::WrongArgumentCount => 0,
            MemberResolutionKind::RequiredParameterMissing { .. } => 1,
            MemberResolutionKind::NoCorrespondingParameter { .. } => 2,
            MemberResolutionKind::NamedArgumentUsedTwice { .. } => 3,
            MemberResolutionKind::TypeInferenceFailed => 4,
            MemberResolutionKind::BadRefKind { .. } => 5,
            MemberResolutionKind::BadArgumentConversion { .. } => 6,
            MemberResolutionKind::Applicable => 7,
        }
    }
}

/// The outcome for one candidate.
#[derive(Debug, Clone)]
pub struct MemberResolutionResult {
    /// Index into the candidate list.
    pub candidate: usize,
    pub kind: MemberResolutionKind,
    /// Parameter index for each argument, in argument order.
    pub arg_to_param: Vec<usize>,
    /// Target type for each argument: the parameter type, or the `params`
    /// element type for arguments packed by the expanded form.
    pub parameter_types: Vec<Ty>,
    /// Conversion for each argument.
    pub conversions: Vec<Conversion>,
    /// Inferred method type arguments, empty when none were inferred.
    pub type_args: Vec<Ty>,
    /// Applicable only in the expanded `params` form.
    pub is_expanded: bool,
    /// Total conversion cost (lower is better).
    pub cost: u32,
}

impl MemberResolutionResult {
    pub fn is_applicable(&self) -> bool {
        self.kind == MemberResolutionKind::Applicable
    }

    pub(crate) fn failed(candidate: usize, kind: MemberResolutionKind) -> Self {
        Self {
            candidate,
            kind,
            arg_to_param: Vec::new(),
            parameter_types: Vec::new(),
            conversions: Vec::new(),
            type_args: Vec::new(),
            is_expanded: false,
            cost: u32::MAX,
        }
    }
}

/// The outcome of resolving a whole candidate set.
#[derive(Debug, Clone, Default)]
pub struct OverloadResolutionResult {
    /// One result per candidate, in candidate order.
    pub results: Vec<MemberResolutionResult>,
    /// Index into `results` of the unique best candidate.
    pub best: Option<usize>,
    /// Indices of the tied best candidates when resolution is ambiguous.
    pub ambiguous: Vec<usize>,
}

impl OverloadResolutionResult {
    pub fn succeeded(&self) -> bool {
        self.best.is_some()
    }

    pub fn best_result(&self) -> Option<&MemberResolutionResult> {
        self.best.map(|i| &self.results[i])
    }

    pub fn is_ambiguous(&self) -> bool {
        self.ambiguous.len() > 1
    }

    /// Results of every applicable candidate.
    pub fn applicable(&self) -> impl Iterator<Item = &MemberResolutionResult> {
        self.results.iter().filter(|r| r.is_applicable())
    }

    /// The candidate to blame in diagnostics: the best one, else the first
    /// of a tie, else the failure that got furthest.
    pub fn closest(&self) -> Option<&MemberResolutionResult> {
        if let Some(best) = self.best_result() {
            return Some(best);
        }
        if let Some(&first) = self.ambiguous.first() {
            return self.results.get(first);
        }
        self.results
            .iter()
            .rev()
            .max_by_key(|r| r.kind.progress())
    }

    /// Whether every candidate failed on argument count alone.
    pub fn all_wrong_count(&self) -> bool {
        !self.results.is_empty()
            && self.results.iter().all(|r| {
                matches!(
                    r.kind,
                    MemberResolutionKind::WrongArgumentCount
                        | MemberResolutionKind::RequiredParameterMissing { .. }
                )
            })
    }
}

// ============================================================================
// Collaborator
// ============================================================================

/// The overload resolution collaborator consumed by the binder.
pub trait OverloadResolver {
    fn resolve(
        &self,
        candidates: &[CandidateSignature],
        args: &[ArgumentInfo],
        converter: &dyn ArgumentConverter,
    ) -> OverloadResolutionResult;
}
