//! Compilation-wide state shared by every binder.
//!
//! A [`Compilation`] bundles the symbol table with the three collaborators
//! the binder consults (lookup, conversions, overload resolution) and the
//! options that gate language features.

use osprey_core::LanguageVersion;
use osprey_symbols::{Lookup, SymbolTable};

use crate::binder::Binder;
use crate::conversion::{Conversions, DefaultConversions};
use crate::overload::{DefaultOverloadResolver, OverloadResolver};

// ============================================================================
// Options
// ============================================================================

/// Options controlling how expressions are bound.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationOptions {
    /// Language version used for feature gating.
    pub language_version: LanguageVersion,
    /// Whether arithmetic defaults to `checked`.
    pub checked: bool,
    /// Strict mode disables legacy leniencies (ref/out on delegate
    /// creation arguments is accepted and ignored when not strict).
    pub strict: bool,
    /// Namespaces suggested in "missing using" hints when an extension
    /// method lookup fails.
    pub well_known_extension_namespaces: Vec<String>,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            language_version: LanguageVersion::Latest,
            checked: false,
            strict: false,
            well_known_extension_namespaces: vec!["System.Linq".to_string()],
        }
    }
}

impl CompilationOptions {
    pub fn with_language_version(mut self, version: LanguageVersion) -> Self {
        self.language_version = version;
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_extension_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.well_known_extension_namespaces.push(namespace.into());
        self
    }
}

// ============================================================================
// Compilation
// ============================================================================

/// The symbol table plus collaborators, borrowed for the binding session.
pub struct Compilation<'a> {
    symbols: &'a SymbolTable,
    lookup: &'a dyn Lookup,
    conversions: Box<dyn Conversions + 'a>,
    overloads: Box<dyn OverloadResolver + 'a>,
    options: CompilationOptions,
}

impl<'a> Compilation<'a> {
    /// A compilation using the symbol table for lookup and the default
    /// conversion and overload rules.
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            lookup: symbols,
            conversions: Box::new(DefaultConversions),
            overloads: Box::new(DefaultOverloadResolver),
            options: CompilationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompilationOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the lookup collaborator.
    pub fn with_lookup(mut self, lookup: &'a dyn Lookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_conversions(mut self, conversions: impl Conversions + 'a) -> Self {
        self.conversions = Box::new(conversions);
        self
    }

    pub fn with_overload_resolver(mut self, resolver: impl OverloadResolver + 'a) -> Self {
        self.overloads = Box::new(resolver);
        self
    }

    #[inline]
    pub fn symbols(&self) -> &'a SymbolTable {
        self.symbols
    }

    #[inline]
    pub fn lookup(&self) -> &'a dyn Lookup {
        self.lookup
    }

    #[inline]
    pub fn conversions(&self) -> &dyn Conversions {
        self.conversions.as_ref()
    }

    #[inline]
    pub fn overloads(&self) -> &dyn OverloadResolver {
        self.overloads.as_ref()
    }

    #[inline]
    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    #[inline]
    pub fn language_version(&self) -> LanguageVersion {
        self.options.language_version
    }

    /// The outermost binder: the global namespace, no containing type.
    pub fn root_binder(&self) -> Binder<'_> {
        Binder::root(self)
    }
}
