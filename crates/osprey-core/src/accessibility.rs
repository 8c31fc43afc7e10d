use std::fmt;

/// Declared accessibility of a type or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accessibility {
    #[default]
    Public,
    ProtectedInternal,
    Internal,
    Protected,
    PrivateProtected,
    Private,
}

impl Accessibility {
    /// Whether access requires the caller to be within the declaring type or a
    /// type nested in it.
    pub fn is_private(self) -> bool {
        self == Accessibility::Private
    }

    /// Whether access requires the caller to derive from the declaring type.
    ///
    /// A compilation is a single assembly, so `internal` widens to public and
    /// `protected internal` never restricts.
    pub fn requires_derivation(self) -> bool {
        matches!(
            self,
            Accessibility::Protected | Accessibility::PrivateProtected
        )
    }
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Accessibility::Public => "public",
            Accessibility::ProtectedInternal => "protected internal",
            Accessibility::Internal => "internal",
            Accessibility::Protected => "protected",
            Accessibility::PrivateProtected => "private protected",
            Accessibility::Private => "private",
        };
        write!(f, "{text}")
    }
}
