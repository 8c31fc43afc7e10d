//! Symbol table and name lookup for osprey.
//!
//! - [`SymbolTable`]: type registry populated through [`osprey_core::TypeDef`]
//!   builders, with base chains, interface sets, generic substitution and
//!   accessibility checks
//! - [`NamespaceTree`]: petgraph-backed namespace hierarchy with `using`
//!   directives, aliases and extension-method indexes
//! - [`Lookup`]: the lookup collaborator the binder consumes, implemented
//!   for `SymbolTable`

mod lookup;
mod namespace_tree;
mod registry;

pub use lookup::{Lookup, LookupError, LookupOptions, LookupResult, LookupResultKind};
pub use namespace_tree::{ExtensionEntry, NamespaceData, NamespaceEdge, NamespaceTree};
pub use registry::SymbolTable;
