//! Type comparison: enums, composites, and domains.
//!
//! Appending or inserting enum labels alters in place (non-transactional);
//! removing or reordering labels, and any change to a composite or domain,
//! recreates the type. The recreate steps land in the type stage, so tables
//! using the type must have been adjusted first by their own comparators.

use crate::ir::{ObjectKind, TypeDef};
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;

use super::{comments, object_path};

pub fn create_steps(typedef: &TypeDef) -> Vec<PlanStep> {
    let path = object_path(&typedef.schema, &[&typedef.name]);
    let mut steps = vec![PlanStep::new(
        sqlgen::create_type(typedef),
        ObjectKind::Type,
        Operation::Create,
        path.clone(),
    )];
    if let Some(comment) = comments::create_comment(
        ObjectKind::Type,
        &comment_target(typedef),
        &path,
        typedef.comment.as_deref(),
    ) {
        steps.push(comment);
    }
    steps
}

pub fn drop_step(typedef: &TypeDef) -> PlanStep {
    PlanStep::new(
        sqlgen::drop_type(typedef),
        ObjectKind::Type,
        Operation::Drop,
        object_path(&typedef.schema, &[&typedef.name]),
    )
}

pub fn alter_steps(current: &TypeDef, desired: &TypeDef) -> Vec<PlanStep> {
    let path = object_path(&desired.schema, &[&desired.name]);
    let mut steps = Vec::new();

    if current.kind != desired.kind {
        match current.enum_added_labels(desired) {
            Some(added) if !added.is_empty() => {
                // Track the label list as additions land so each anchor
                // names a label that exists at execution time.
                let mut evolving: Vec<String> = match &current.kind {
                    crate::ir::TypeKind::Enum { labels } => labels.clone(),
                    _ => Vec::new(),
                };
                for (label, anchor) in added {
                    let position = match anchor {
                        Some(prev) if evolving.last().is_some_and(|l| l == prev) => {
                            sqlgen::EnumValuePosition::Last
                        }
                        Some(prev) => sqlgen::EnumValuePosition::After(prev),
                        None => match evolving.first() {
                            Some(first) => sqlgen::EnumValuePosition::Before(first.as_str()),
                            None => sqlgen::EnumValuePosition::Last,
                        },
                    };
                    steps.push(
                        PlanStep::new(
                            sqlgen::alter_enum_add_value(desired, label, position),
                            ObjectKind::Type,
                            Operation::Alter,
                            path.clone(),
                        )
                        .non_transactional(),
                    );
                    let insert_at = match anchor {
                        None => 0,
                        Some(prev) => {
                            evolving.iter().position(|l| l == prev).map_or(evolving.len(), |i| i + 1)
                        }
                    };
                    evolving.insert(insert_at, label.to_string());
                }
            }
            _ => {
                // Label removal or reorder, or a composite/domain change.
                steps.push(drop_step(current));
                steps.push(PlanStep::new(
                    sqlgen::create_type(desired),
                    ObjectKind::Type,
                    Operation::Create,
                    path.clone(),
                ));
            }
        }
    }

    if let Some(step) = comments::diff_comment(
        ObjectKind::Type,
        &comment_target(desired),
        &path,
        current.comment.as_deref(),
        desired.comment.as_deref(),
    ) {
        steps.push(step);
    }
    steps
}

fn comment_target(typedef: &TypeDef) -> String {
    let keyword = match typedef.kind {
        crate::ir::TypeKind::Domain { .. } => "DOMAIN",
        _ => "TYPE",
    };
    format!(
        "{keyword} {}",
        crate::normalize::quote_ident(&typedef.name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TypeKind;

    fn mood(labels: &[&str]) -> TypeDef {
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
    fn appended_label_is_non_transactional_alter() {
        let steps = alter_steps(&mood(&["ok", "bad"]), &mood(&["ok", "bad", "great"]));
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].sql, "ALTER TYPE mood ADD VALUE 'great';");
        assert!(!steps[0].can_run_in_transaction);
    }

    #[test]
    fn inserted_labels_are_anchored_in_sequence() {
        let steps = alter_steps(&mood(&["ok", "bad"]), &mood(&["ok", "x", "y", "bad"]));
        let sqls: Vec<&str> = steps.iter().map(|s| s.sql.as_str()).collect();
        assert_eq!(
            sqls,
            [
                "ALTER TYPE mood ADD VALUE 'x' AFTER 'ok';",
                "ALTER TYPE mood ADD VALUE 'y' AFTER 'x';",
            ]
        );
    }

    #[test]
    fn tail_appends_stay_plain_in_order() {
        let steps = alter_steps(&mood(&["ok"]), &mood(&["ok", "bad", "great"]));
        let sqls: Vec<&str> = steps.iter().map(|s| s.sql.as_str()).collect();
        assert_eq!(
            sqls,
            [
                "ALTER TYPE mood ADD VALUE 'bad';",
                "ALTER TYPE mood ADD VALUE 'great';",
            ]
        );
    }

    #[test]
    fn removed_label_recreates_type() {
        let steps = alter_steps(&mood(&["ok", "bad"]), &mood(&["ok"]));
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].sql, "DROP TYPE mood;");
        assert_eq!(steps[1].sql, "CREATE TYPE mood AS ENUM ('ok');");
    }

    #[test]
    fn domain_change_recreates() {
        let current = TypeDef {
            schema: "public".into(),
            name: "positive_int".into(),
            kind: TypeKind::Domain {
                base_type: "integer".into(),
                not_null: false,
                default: None,
                constraints: vec![],
            },
            comment: None,
        };
        let desired = TypeDef {
            kind: TypeKind::Domain {
                base_type: "integer".into(),
                not_null: true,
                default: None,
                constraints: vec![],
            },
            ..current.clone()
        };
        let steps = alter_steps(&current, &desired);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].sql, "DROP DOMAIN positive_int;");
        assert!(steps[1].sql.starts_with("CREATE DOMAIN positive_int AS integer"));
    }
}
