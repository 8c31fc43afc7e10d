//! Language versions and version-gated features.

use std::fmt;

/// Source language version. Ordered, so feature checks compare with `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LanguageVersion {
    V6,
    V7,
    V7_1,
    V7_2,
    V7_3,
    V8,
    V9,
    V10,
    #[default]
    Latest,
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LanguageVersion::V6 => "6",
            LanguageVersion::V7 => "7.0",
            LanguageVersion::V7_1 => "7.1",
            LanguageVersion::V7_2 => "7.2",
            LanguageVersion::V7_3 => "7.3",
            LanguageVersion::V8 => "8.0",
            LanguageVersion::V9 => "9.0",
            LanguageVersion::V10 => "10.0",
            LanguageVersion::Latest => "latest",
        };
        write!(f, "{text}")
    }
}

/// A language feature whose availability depends on [`LanguageVersion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    Tuples,
    DefaultLiteral,
    NonTrailingNamedArguments,
    IndexOperator,
    RangeOperator,
    NestedStackalloc,
    TargetTypedConditional,
}

impl MessageId {
    pub fn required_version(self) -> LanguageVersion {
        match self {
            MessageId::Tuples => LanguageVersion::V7,
            MessageId::DefaultLiteral => LanguageVersion::V7_1,
            MessageId::NonTrailingNamedArguments => LanguageVersion::V7_2,
            MessageId::IndexOperator | MessageId::RangeOperator | MessageId::NestedStackalloc => {
                LanguageVersion::V8
            }
            MessageId::TargetTypedConditional => LanguageVersion::V9,
        }
    }

    pub fn is_available_in(self, version: LanguageVersion) -> bool {
        version >= self.required_version()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MessageId::Tuples => "tuples",
            MessageId::DefaultLiteral => "default literal",
            MessageId::NonTrailingNamedArguments => "non-trailing named arguments",
            MessageId::IndexOperator => "index operator",
            MessageId::RangeOperator => "range operator",
            MessageId::NestedStackalloc => "stackalloc in nested expressions",
            MessageId::TargetTypedConditional => "target-typed conditional expression",
        };
        write!(f, "{text}")
    }
}
