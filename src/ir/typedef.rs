//! User-defined types: enums, composites, and domains.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    pub schema: String,
    pub name: String,
    pub kind: TypeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TypeKind {
    Enum {
        /// Labels in `enumsortorder` order. Order is part of identity:
        /// appending labels alters in place, anything else recreates.
        labels: Vec<String>,
    },
    Composite {
        fields: Vec<CompositeField>,
    },
    Domain {
        base_type: String,
        not_null: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
        constraints: Vec<DomainConstraint>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeField {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConstraint {
    pub name: String,
    /// Canonical expression without the outer `CHECK (...)`.
    pub check: String,
}

impl TypeDef {
    /// Labels present in `desired` but not in `self`, in desired order, each
    /// paired with the desired label directly before it (`None` for the
    /// first position). The anchor may itself be a label added one step
    /// earlier; emitting the additions in order keeps every anchor valid.
    ///
    /// Returns `None` when the change is not a pure addition, i.e. labels
    /// were removed or reordered, and the type must be recreated.
    pub fn enum_added_labels<'a>(&self, desired: &'a TypeDef) -> Option<Vec<(&'a str, Option<&'a str>)>> {
        let (TypeKind::Enum { labels: current }, TypeKind::Enum { labels: wanted }) =
            (&self.kind, &desired.kind)
        else {
            return None;
        };

        let mut added = Vec::new();
        let mut cur = current.iter().peekable();
        let mut prev: Option<&str> = None;
        for label in wanted {
            if cur.peek().is_some_and(|c| *c == label) {
                cur.next();
            } else if current.contains(label) {
                // Present but out of order relative to the current sequence.
                return None;
            } else {
                added.push((label.as_str(), prev));
            }
            prev = Some(label.as_str());
        }
        // Anything left on the current side was removed.
        if cur.next().is_some() {
            return None;
        }
        Some(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enum_type(labels: &[&str]) -> TypeDef {
        TypeDef {
            schema: "public".into(),
            name: "mood".into(),
            kind: TypeKind::Enum {
                labels: labels.iter().map(|s| s.to_string()).collect(),
            },
            comment: None,
        }
    }

    #[test]
    fn appended_label_is_an_addition() {
        let old = enum_type(&["ok", "bad"]);
        let new = enum_type(&["ok", "bad", "great"]);
        let added = old.enum_added_labels(&new).unwrap();
        assert_eq!(added, vec![("great", Some("bad"))]);
    }

    #[test]
    fn inserted_label_carries_anchor() {
        let old = enum_type(&["ok", "bad"]);
        let new = enum_type(&["ok", "fine", "bad"]);
        let added = old.enum_added_labels(&new).unwrap();
        assert_eq!(added, vec![("fine", Some("ok"))]);
    }

    #[test]
    fn consecutive_insertions_anchor_on_each_other() {
        let old = enum_type(&["ok", "bad"]);
        let new = enum_type(&["ok", "x", "y", "bad"]);
        let added = old.enum_added_labels(&new).unwrap();
        assert_eq!(added, vec![("x", Some("ok")), ("y", Some("x"))]);
    }

    #[test]
    fn removed_label_forces_recreate() {
        let old = enum_type(&["ok", "bad"]);
        let new = enum_type(&["ok"]);
        assert!(old.enum_added_labels(&new).is_none());
    }

    #[test]
    fn reorder_forces_recreate() {
        let old = enum_type(&["ok", "bad"]);
        let new = enum_type(&["bad", "ok"]);
        assert!(old.enum_added_labels(&new).is_none());
    }

    #[test]
    fn label_inserted_at_front_has_no_anchor() {
        let old = enum_type(&["ok", "bad"]);
        let new = enum_type(&["first", "ok", "bad"]);
        let added = old.enum_added_labels(&new).unwrap();
        assert_eq!(added, vec![("first", None)]);
    }
}
