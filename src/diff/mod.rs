//! Per-object-kind comparators.
//!
//! Each comparator takes the current and desired flavor of one object (or
//! one pair of sub-entity maps) and emits [`PlanStep`]s. The comparators are
//! pure over the IR; ordering across kinds is the plan assembler's job.

pub mod comments;
pub mod constraints;
pub mod indexes;
pub mod policies;
pub mod privileges;
pub mod routines;
pub mod sequences;
pub mod tables;
pub mod triggers;
pub mod typedefs;
pub mod views;

use std::collections::BTreeMap;

use crate::plan::PlanStep;

/// Classification of two keyed maps into dropped, added, and common keys, in
/// deterministic key order.
pub(crate) struct MapDiff<'a, T> {
    pub dropped: Vec<(&'a String, &'a T)>,
    pub added: Vec<(&'a String, &'a T)>,
    pub common: Vec<(&'a String, &'a T, &'a T)>,
}

pub(crate) fn diff_maps<'a, T>(
    current: &'a BTreeMap<String, T>,
    desired: &'a BTreeMap<String, T>,
) -> MapDiff<'a, T> {
    let mut dropped = Vec::new();
    let mut added = Vec::new();
    let mut common = Vec::new();

    for (key, value) in current {
        match desired.get(key) {
            Some(wanted) => common.push((key, value, wanted)),
            None => dropped.push((key, value)),
        }
    }
    for (key, value) in desired {
        if !current.contains_key(key) {
            added.push((key, value));
        }
    }

    MapDiff {
        dropped,
        added,
        common,
    }
}

/// Steps produced for one table, bucketed so sub-object drops always precede
/// column changes and sub-object creations always follow them. Foreign keys
/// are split out so the assembler can emit them after every table exists.
#[derive(Debug, Default)]
pub struct TableSteps {
    /// Sub-object drops (constraints, indexes, triggers, policies) that must
    /// run before column changes.
    pub pre: Vec<PlanStep>,
    /// Table-level and column-level statements.
    pub steps: Vec<PlanStep>,
    /// Sub-object creations and comments that must run after column changes.
    pub post: Vec<PlanStep>,
    /// Foreign-key additions, deferred until every table exists.
    pub fk_steps: Vec<PlanStep>,
}

impl TableSteps {
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.steps.is_empty() && self.post.is_empty() && self.fk_steps.is_empty()
    }

    /// Flatten the ordered buckets, leaving FK steps to the caller.
    pub fn into_ordered(self) -> (Vec<PlanStep>, Vec<PlanStep>) {
        let mut steps = self.pre;
        steps.extend(self.steps);
        steps.extend(self.post);
        (steps, self.fk_steps)
    }
}

/// Dotted object path used in step metadata.
pub(crate) fn object_path(schema: &str, parts: &[&str]) -> String {
    let mut path = schema.to_string();
    for part in parts {
        path.push('.');
        path.push_str(part);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_diff_classifies_keys_in_order() {
        let mut current = BTreeMap::new();
        current.insert("a".to_string(), 1);
        current.insert("b".to_string(), 2);
        let mut desired = BTreeMap::new();
        desired.insert("b".to_string(), 3);
        desired.insert("c".to_string(), 4);

        let diff = diff_maps(&current, &desired);
        assert_eq!(diff.dropped.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), ["a"]);
        assert_eq!(diff.added.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), ["c"]);
        assert_eq!(
            diff.common
                .iter()
                .map(|(k, old, new)| (k.as_str(), **old, **new))
                .collect::<Vec<_>>(),
            [("b", 2, 3)]
        );
    }

    #[test]
    fn object_paths_are_dotted() {
        assert_eq!(object_path("public", &["users"]), "public.users");
        assert_eq!(
            object_path("public", &["users", "email"]),
            "public.users.email"
        );
    }
}
