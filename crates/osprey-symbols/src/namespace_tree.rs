//! Namespace tree: hierarchical storage for namespace-level names.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: `NamespaceData` (types, extension methods and aliases declared
//!   at that level)
//! - Edges: `Contains(name)` for hierarchy, `Uses` for `using` directives

use std::rc::Rc;

use osprey_core::{AliasSymbol, MethodDef, NamespaceId, RegistrationError, TypeHash};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

/// Edge types in the namespace graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceEdge {
    /// Parent namespace contains child namespace, keyed by the child's
    /// simple name.
    Contains(String),
    /// `using` directive from source to target.
    Uses,
}

/// An extension method together with the static class declaring it.
#[derive(Debug, Clone)]
pub struct ExtensionEntry {
    pub container: TypeHash,
    pub method: Rc<MethodDef>,
}

/// Data stored in each namespace node.
#[derive(Debug, Default)]
pub struct NamespaceData {
    /// Types by simple name. Several generic arities may share a name.
    pub types: FxHashMap<String, Vec<TypeHash>>,
    /// Extension methods declared by static classes in this namespace.
    pub extension_methods: FxHashMap<String, Vec<ExtensionEntry>>,
    /// `using X = ...;` aliases declared at this level.
    pub aliases: FxHashMap<String, Rc<AliasSymbol>>,
}

pub struct NamespaceTree {
    graph: DiGraph<NamespaceData, NamespaceEdge>,
    root: NodeIndex,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceTree {
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(NamespaceData::default());
        Self { graph, root }
    }

    pub fn root(&self) -> NamespaceId {
        to_id(self.root)
    }

    pub fn data(&self, ns: NamespaceId) -> Option<&NamespaceData> {
        self.graph.node_weight(to_node(ns))
    }

    fn data_mut(&mut self, ns: NamespaceId) -> Result<&mut NamespaceData, RegistrationError> {
        let path = self.path(ns);
        self.graph
            .node_weight_mut(to_node(ns))
            .ok_or(RegistrationError::InvalidNamespace { path })
    }

    /// Find a child namespace by simple name.
    pub fn find_child(&self, parent: NamespaceId, name: &str) -> Option<NamespaceId> {
        self.graph
            .edges(to_node(parent))
            .find(|edge| matches!(edge.weight(), NamespaceEdge::Contains(child) if child == name))
            .map(|edge| to_id(edge.target()))
    }

    fn get_or_create_child(&mut self, parent: NamespaceId, name: &str) -> NamespaceId {
        if let Some(child) = self.find_child(parent, name) {
            return child;
        }
        let child = self.graph.add_node(NamespaceData::default());
        self.graph
            .add_edge(to_node(parent), child, NamespaceEdge::Contains(name.to_string()));
        to_id(child)
    }

    /// Get or create a dotted namespace path from the root.
    ///
    /// The empty string names the root namespace.
    pub fn get_or_create_path(&mut self, path: &str) -> Result<NamespaceId, RegistrationError> {
        let mut current = self.root();
        if path.is_empty() {
            return Ok(current);
        }
        for segment in path.split('.') {
            if !is_identifier(segment) {
                return Err(RegistrationError::InvalidNamespace {
                    path: path.to_string(),
                });
            }
            current = self.get_or_create_child(current, segment);
        }
        Ok(current)
    }

    /// Get an existing namespace by dotted path.
    pub fn get_path(&self, path: &str) -> Option<NamespaceId> {
        let mut current = self.root();
        if path.is_empty() {
            return Some(current);
        }
        for segment in path.split('.') {
            current = self.find_child(current, segment)?;
        }
        Some(current)
    }

    pub fn parent(&self, ns: NamespaceId) -> Option<NamespaceId> {
        self.graph
            .edges_directed(to_node(ns), Direction::Incoming)
            .find(|edge| matches!(edge.weight(), NamespaceEdge::Contains(_)))
            .map(|edge| to_id(edge.source()))
    }

    fn simple_name(&self, ns: NamespaceId) -> Option<&str> {
        self.graph
            .edges_directed(to_node(ns), Direction::Incoming)
            .find_map(|edge| match edge.weight() {
                NamespaceEdge::Contains(name) => Some(name.as_str()),
                NamespaceEdge::Uses => None,
            })
    }

    /// The dotted path of a namespace; empty for the root.
    pub fn path(&self, ns: NamespaceId) -> String {
        let mut segments = Vec::new();
        let mut current = ns;
        while let Some(parent) = self.parent(current) {
            if let Some(name) = self.simple_name(current) {
                segments.push(name);
            }
            current = parent;
        }
        segments.reverse();
        segments.join(".")
    }

    // ========================================================================
    // Using directives and aliases
    // ========================================================================

    pub fn add_using(&mut self, from: NamespaceId, target: NamespaceId) {
        let from_node = to_node(from);
        let target_node = to_node(target);
        let exists = self
            .graph
            .edges(from_node)
            .any(|edge| matches!(edge.weight(), NamespaceEdge::Uses) && edge.target() == target_node);
        if !exists {
            self.graph.add_edge(from_node, target_node, NamespaceEdge::Uses);
        }
    }

    /// Namespaces imported by `using` directives at exactly this level.
    pub fn usings(&self, ns: NamespaceId) -> Vec<NamespaceId> {
        let mut targets: Vec<_> = self
            .graph
            .edges(to_node(ns))
            .filter(|edge| matches!(edge.weight(), NamespaceEdge::Uses))
            .map(|edge| to_id(edge.target()))
            .collect();
        // petgraph yields edges newest-first
        targets.reverse();
        targets
    }

    pub fn add_alias(
        &mut self,
        ns: NamespaceId,
        alias: AliasSymbol,
    ) -> Result<(), RegistrationError> {
        let data = self.data_mut(ns)?;
        data.aliases.insert(alias.name.to_string(), Rc::new(alias));
        Ok(())
    }

    pub fn alias(&self, ns: NamespaceId, name: &str) -> Option<Rc<AliasSymbol>> {
        self.data(ns)?.aliases.get(name).cloned()
    }

    // ========================================================================
    // Members
    // ========================================================================

    pub fn add_type(
        &mut self,
        ns: NamespaceId,
        name: &str,
        hash: TypeHash,
    ) -> Result<(), RegistrationError> {
        let data = self.data_mut(ns)?;
        data.types.entry(name.to_string()).or_default().push(hash);
        Ok(())
    }

    pub fn types_named(&self, ns: NamespaceId, name: &str) -> &[TypeHash] {
        self.data(ns)
            .and_then(|data| data.types.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn add_extension_method(
        &mut self,
        ns: NamespaceId,
        container: TypeHash,
        method: Rc<MethodDef>,
    ) -> Result<(), RegistrationError> {
        let data = self.data_mut(ns)?;
        data.extension_methods
            .entry(method.name.clone())
            .or_default()
            .push(ExtensionEntry { container, method });
        Ok(())
    }

    pub fn extension_methods(&self, ns: NamespaceId, name: &str) -> &[ExtensionEntry] {
        self.data(ns)
            .and_then(|data| data.extension_methods.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn to_node(ns: NamespaceId) -> NodeIndex {
    NodeIndex::new(ns.0 as usize)
}

fn to_id(node: NodeIndex) -> NamespaceId {
    NamespaceId(node.index() as u32)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
