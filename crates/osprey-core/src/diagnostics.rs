//! Append-only diagnostic collection.

use std::fmt;

use crate::{BindError, ErrorKind, Severity, Span};

/// A reported problem with its severity.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub error: BindError,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn span(&self) -> Span {
        self.error.span()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.error),
            Severity::Warning => write!(f, "warning: {}", self.error),
        }
    }
}

/// An order-preserving sink for diagnostics.
///
/// A bag created with [`DiagnosticBag::discarding`] accepts and drops
/// everything; speculative binding uses it so that exploratory attempts
/// never reach the primary stream.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    items: Vec<Diagnostic>,
    discard: bool,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discarding() -> Self {
        Self {
            items: Vec::new(),
            discard: true,
        }
    }

    pub fn is_discarding(&self) -> bool {
        self.discard
    }

    /// Report an error at its own severity.
    pub fn add(&mut self, error: BindError) {
        if self.discard {
            return;
        }
        let severity = error.severity();
        self.items.push(Diagnostic { error, severity });
    }

    /// Move every diagnostic from `other` to the end of this bag.
    pub fn append(&mut self, other: DiagnosticBag) {
        if self.discard {
            return;
        }
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any error (not warning) has been reported.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.items.iter().filter(|d| d.kind() == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for DiagnosticBag {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn undefined(name: &str) -> BindError {
        BindError::UndefinedName {
            name: name.into(),
            span: Span::default(),
        }
    }

    #[test]
    fn preserves_order() {
        let mut bag = DiagnosticBag::new();
        bag.add(undefined("a"));
        bag.add(undefined("b"));
        let names: Vec<_> = bag
            .iter()
            .map(|d| match &d.error {
                BindError::UndefinedName { name, .. } => name.clone(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(bag.count_of(ErrorKind::UnresolvedName), 2);
    }

    #[test]
    fn discarding_bag_drops_everything() {
        let mut bag = DiagnosticBag::discarding();
        bag.add(undefined("a"));
        let mut other = DiagnosticBag::new();
        other.add(undefined("b"));
        bag.append(other);
        assert!(bag.is_empty());
    }

    #[test]
    fn warnings_are_not_errors() {
        let mut bag = DiagnosticBag::new();
        bag.add(BindError::PossiblyNegativeIndex { span: Span::default() });
        assert!(!bag.has_errors());
        assert_eq!(bag.len(), 1);
    }
}
