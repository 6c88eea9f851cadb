//! Dependency graph over schema objects with deterministic ordering.
//!
//! Nodes are object keys (`table:users`, `view:active_users`, ...); edges
//! point from an object to what it needs. Ordering is Kahn's algorithm with
//! every frontier processed in name order, so two runs over the same inputs
//! produce byte-identical plans.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::PlanError;

#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    deps: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: &str) {
        self.deps.entry(node.to_string()).or_default();
    }

    /// Record that `node` needs `on` to exist first. Unknown endpoints are
    /// added implicitly; self-edges are ignored.
    pub fn add_dependency(&mut self, node: &str, on: &str) {
        if node == on {
            return;
        }
        self.add_node(on);
        self.deps
            .entry(node.to_string())
            .or_default()
            .insert(on.to_string());
    }

    /// Order with every dependency before its dependents. Used for creates.
    pub fn dependencies_first(&self) -> Result<Vec<String>, PlanError> {
        let mut remaining: BTreeMap<String, BTreeSet<String>> = self.deps.clone();
        let mut order = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let ready: Vec<String> = remaining
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(node, _)| node.clone())
                .collect();
            if ready.is_empty() {
                return Err(PlanError::Cycle {
                    objects: remaining.keys().cloned().collect(),
                });
            }
            for node in &ready {
                remaining.remove(node);
            }
            for deps in remaining.values_mut() {
                for node in &ready {
                    deps.remove(node);
                }
            }
            order.extend(ready);
        }
        Ok(order)
    }

    /// Order with every dependent before its dependencies. Used for drops.
    pub fn dependents_first(&self) -> Result<Vec<String>, PlanError> {
        let mut order = self.dependencies_first()?;
        order.reverse();
        Ok(order)
    }
}

/// True when `text` contains `name` as a standalone identifier, bare or
/// double-quoted. Used to discover references inside deparsed definitions,
/// where false positives only cost ordering conservatism, never
/// correctness.
pub(crate) fn references_name(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    if text.contains(&format!("\"{name}\"")) {
        return true;
    }
    let mut start = 0;
    while let Some(pos) = text[start..].find(name) {
        let at = start + pos;
        let before_ok = at == 0
            || text[..at]
                .chars()
                .next_back()
                .is_some_and(|c| !(c.is_alphanumeric() || c == '_'));
        let after = at + name.len();
        let after_ok = after >= text.len()
            || text[after..]
                .chars()
                .next()
                .is_some_and(|c| !(c.is_alphanumeric() || c == '_'));
        if before_ok && after_ok {
            return true;
        }
        start = at + name.len();
    }
    false
}
