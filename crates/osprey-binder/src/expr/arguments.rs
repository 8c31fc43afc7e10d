//! Argument lists.
//!
//! [`AnalyzedArguments`] holds the bound arguments of one call, indexer
//! access or creation, in source order, together with their names and ref
//! kinds. Names and ref kinds are recorded lazily: the common unannotated
//! list never allocates either vector, and the first annotation backfills
//! the earlier positions so both stay the same length as the arguments.

use std::rc::Rc;

use osprey_core::{BindError, DiagnosticBag, MessageId, RefKind};
use osprey_syntax::Argument;
use tracing::{instrument, trace};

use super::dispatch::bind_expression;
use super::value::{ValueKind, check_argument_value};
use crate::binder::Binder;
use crate::bound::BoundExpr;
use crate::overload::ArgumentInfo;

/// Bound arguments with optional names and ref kinds.
#[derive(Debug, Clone, Default)]
pub struct AnalyzedArguments<'ast> {
    pub args: Vec<BoundExpr<'ast>>,
    names: Option<Vec<Option<Rc<str>>>>,
    ref_kinds: Option<Vec<RefKind>>,
}

impl<'ast> AnalyzedArguments<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument, backfilling names and ref kinds on first use.
    pub fn push(&mut self, arg: BoundExpr<'ast>, name: Option<Rc<str>>, ref_kind: RefKind) {
        let count = self.args.len();
        if name.is_some() && self.names.is_none() {
            self.names = Some(vec![None; count]);
        }
        if let Some(names) = &mut self.names {
            names.push(name);
        }
        if ref_kind != RefKind::None && self.ref_kinds.is_none() {
            self.ref_kinds = Some(vec![RefKind::None; count]);
        }
        if let Some(ref_kinds) = &mut self.ref_kinds {
            ref_kinds.push(ref_kind);
        }
        self.args.push(arg);
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&Rc<str>> {
        self.names.as_ref()?.get(index)?.as_ref()
    }

    pub fn ref_kind(&self, index: usize) -> RefKind {
        self.ref_kinds
            .as_ref()
            .and_then(|kinds| kinds.get(index).copied())
            .unwrap_or(RefKind::None)
    }

    pub fn has_names(&self) -> bool {
        self.names.is_some()
    }

    pub fn has_ref_kinds(&self) -> bool {
        self.ref_kinds.is_some()
    }

    /// Names, one per argument.
    pub fn names(&self) -> Vec<Option<Rc<str>>> {
        (0..self.len()).map(|i| self.name(i).cloned()).collect()
    }

    /// Ref kinds, one per argument.
    pub fn ref_kinds(&self) -> Vec<RefKind> {
        (0..self.len()).map(|i| self.ref_kind(i)).collect()
    }

    /// What overload resolution needs to know about each argument.
    pub fn infos(&self) -> Vec<ArgumentInfo> {
        self.args
            .iter()
            .enumerate()
            .map(|(i, arg)| ArgumentInfo {
                ty: arg.ty.clone(),
                name: self.name(i).cloned(),
                ref_kind: self.ref_kind(i),
            })
            .collect()
    }

    /// Whether any argument is typed `dynamic`.
    pub fn has_dynamic(&self) -> bool {
        self.args
            .iter()
            .any(|arg| arg.ty.as_ref().is_some_and(|ty| ty.is_dynamic()))
    }

    pub fn has_errors(&self) -> bool {
        self.args.iter().any(|arg| arg.has_errors)
    }
}

/// Bind an argument list, recording names and ref kinds.
#[instrument(level = "trace", skip_all, fields(count = args.len()))]
pub fn bind_arguments_and_names<'ast>(
    binder: &Binder<'_>,
    args: &[Argument<'ast>],
    diagnostics: &mut DiagnosticBag,
) -> AnalyzedArguments<'ast> {
    bind_arguments(binder, args, false, diagnostics)
}

/// Bind an argument list.
///
/// With `delegate_creation` outside strict mode, `ref` and `out` on an
/// argument are accepted and ignored.
pub(crate) fn bind_arguments<'ast>(
    binder: &Binder<'_>,
    args: &[Argument<'ast>],
    delegate_creation: bool,
    diagnostics: &mut DiagnosticBag,
) -> AnalyzedArguments<'ast> {
    let ignore_ref = delegate_creation && !binder.options().strict;
    let mut analyzed = AnalyzedArguments::new();
    let mut reported_order = false;

    for arg in args {
        if arg.name.is_none() && analyzed.has_names() && !reported_order {
            let named_before = (0..analyzed.len()).any(|i| analyzed.name(i).is_some());
            if named_before
                && !MessageId::NonTrailingNamedArguments.is_available_in(binder.language_version())
            {
                diagnostics.add(BindError::NamedArgumentSpecificationRequired { span: arg.span });
                reported_order = true;
            }
        }

        let ref_kind = match arg.ref_kind {
            RefKind::Ref | RefKind::Out if ignore_ref => RefKind::None,
            kind => kind,
        };
        let bound = bind_expression(binder, &arg.value, diagnostics);
        let bound = check_argument_value(binder, bound, ValueKind::for_argument(ref_kind), diagnostics);
        analyzed.push(bound, arg.name.map(|name| Rc::from(name.name)), ref_kind);
    }

    trace!(
        count = analyzed.len(),
        named = analyzed.has_names(),
        by_ref = analyzed.has_ref_kinds(),
        "arguments bound"
    );
    analyzed
}
