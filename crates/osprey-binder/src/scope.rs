//! Local scope for the statement list surrounding an expression.
//!
//! A `LocalScope` holds the locals, range variables and labels declared in
//! one block. Binders chain scopes, so an inner block's scope is consulted
//! before the outer ones and a redeclared name shadows the outer entry.
//!
//! Declarations are recorded with their source span: a use that appears
//! before the declaration (or inside the initializer of an implicitly typed
//! local, whose type is not known yet) is reported by the binder.

use std::rc::Rc;

use osprey_core::{LabelSymbol, LocalSymbol, RangeVariableSymbol, Symbol};
use rustc_hash::FxHashMap;

// ============================================================================
// LocalScope
// ============================================================================

/// Names declared in one block.
#[derive(Debug, Clone, Default)]
pub struct LocalScope {
    /// Symbols by name
    symbols: FxHashMap<Rc<str>, Symbol>,
    /// Declaration order, for deterministic iteration
    order: Vec<Rc<str>>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a local variable. A later declaration with the same name
    /// replaces the earlier one.
    pub fn declare(&mut self, local: LocalSymbol) -> Rc<LocalSymbol> {
        let local = Rc::new(local);
        self.insert(local.name.clone(), Symbol::Local(local.clone()));
        local
    }

    pub fn declare_range_variable(&mut self, range: RangeVariableSymbol) -> Rc<RangeVariableSymbol> {
        let range = Rc::new(range);
        self.insert(range.name.clone(), Symbol::RangeVariable(range.clone()));
        range
    }

    pub fn declare_label(&mut self, label: LabelSymbol) {
        let name = label.name.clone();
        self.insert(name, Symbol::Label(Rc::new(label)));
    }

    /// Builder form of [`declare`](Self::declare).
    pub fn with_local(mut self, local: LocalSymbol) -> Self {
        self.declare(local);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Declared symbols in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter().filter_map(|name| self.symbols.get(name))
    }

    fn insert(&mut self, name: Rc<str>, symbol: Symbol) {
        if self.symbols.insert(name.clone(), symbol).is_none() {
            self.order.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osprey_core::{Span, Ty};

    #[test]
    fn declare_and_get() {
        let mut scope = LocalScope::new();
        let local = scope.declare(LocalSymbol::new("count", Ty::INT, Span::new(1, 1, 5)));
        assert_eq!(local.ty, Some(Ty::INT));
        assert!(matches!(scope.get("count"), Some(Symbol::Local(l)) if l.name.as_ref() == "count"));
        assert!(scope.get("missing").is_none());
    }

    #[test]
    fn redeclaration_replaces_entry() {
        let scope = LocalScope::new()
            .with_local(LocalSymbol::new("x", Ty::INT, Span::new(1, 1, 1)))
            .with_local(LocalSymbol::new("x", Ty::STRING, Span::new(2, 1, 1)));
        assert_eq!(scope.len(), 1);
        let Some(Symbol::Local(local)) = scope.get("x") else {
            panic!("expected local");
        };
        assert_eq!(local.ty, Some(Ty::STRING));
    }

    #[test]
    fn iteration_follows_declaration_order() {
        let mut scope = LocalScope::new();
        scope.declare(LocalSymbol::new("b", Ty::INT, Span::default()));
        scope.declare_range_variable(RangeVariableSymbol {
            name: "a".into(),
            ty: Ty::STRING,
        });
        scope.declare_label(LabelSymbol { name: "done".into() });
        let names: Vec<_> = scope.iter().map(Symbol::name).collect();
        assert_eq!(names, vec!["b", "a", "done"]);
    }

    #[test]
    fn inferred_locals_have_no_type() {
        let scope =
            LocalScope::new().with_local(LocalSymbol::inferred("v", Span::new(3, 5, 1)));
        let Some(Symbol::Local(local)) = scope.get("v") else {
            panic!("expected local");
        };
        assert!(local.ty.is_none());
    }
}
