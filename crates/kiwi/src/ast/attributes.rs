//! Per-node metadata side-table

use dashmap::DashMap;
use indexmap::IndexMap;

use super::ExprId;

/// Open-ended `name -> expression` metadata keyed by node.
///
/// Lives beside the arena so that nodes without metadata pay nothing, and
/// takes `&self` so passes holding a shared borrow of the tree can still
/// annotate it.
#[derive(Debug, Default)]
pub struct Attributes {
    table: DashMap<ExprId, IndexMap<String, ExprId>>,
}

impl Attributes {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` on `node`, returning the previous value.
    pub fn set(&self, node: ExprId, name: impl Into<String>, value: ExprId) -> Option<ExprId> {
        self.table.entry(node).or_default().insert(name.into(), value)
    }

    /// Look up `name` on `node`.
    pub fn get(&self, node: ExprId, name: &str) -> Option<ExprId> {
        self.table
            .get(&node)
            .and_then(|attrs| attrs.get(name).copied())
    }

    /// Snapshot of every attribute on `node`, in insertion order.
    pub fn of(&self, node: ExprId) -> IndexMap<String, ExprId> {
        self.table
            .get(&node)
            .map(|attrs| attrs.clone())
            .unwrap_or_default()
    }

    /// Copy all attributes of `from` onto `to`, keeping any `to` already has.
    pub fn copy(&self, from: ExprId, to: ExprId) {
        if from == to {
            return;
        }
        let source = self.of(from);
        if source.is_empty() {
            return;
        }
        let mut target = self.table.entry(to).or_default();
        for (name, value) in source {
            target.entry(name).or_insert(value);
        }
    }

    /// Remove `name` from `node`.
    pub fn remove(&self, node: ExprId, name: &str) -> Option<ExprId> {
        self.table
            .get_mut(&node)
            .and_then(|mut attrs| attrs.shift_remove(name))
    }

    /// Number of nodes carrying at least one attribute.
    pub fn len(&self) -> usize {
        self.table.iter().filter(|entry| !entry.is_empty()).count()
    }

    /// No node carries an attribute.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
