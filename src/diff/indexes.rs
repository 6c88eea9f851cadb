//! Index comparison.
//!
//! Indexes have no usable `ALTER INDEX` for structural changes, so any
//! difference is drop and create. New indexes on a pre-existing table build
//! concurrently; an index created together with its table builds plain.

use crate::ir::{Index, ObjectKind, Table};
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;

use super::{TableSteps, comments, diff_maps, object_path};

pub(crate) fn diff_indexes(current: &Table, desired: &Table, out: &mut TableSteps) {
    let diff = diff_maps(&current.indexes, &desired.indexes);

    for (_, index) in diff.dropped {
        out.pre.push(drop_step(&desired.schema, &desired.name, index));
    }
    for (_, index) in diff.added {
        // The table already exists, so build without blocking writes.
        out.post
            .extend(create_steps(&desired.schema, &desired.name, index, true));
    }
    for (name, old, new) in diff.common {
        if structure_changed(old, new) {
            out.pre.push(drop_step(&desired.schema, &desired.name, old));
            out.post
                .extend(create_steps(&desired.schema, &desired.name, new, true));
        } else if let Some(step) = comments::diff_comment(
            ObjectKind::Index,
            &format!("INDEX {}", crate::normalize::quote_ident(name)),
            &object_path(&desired.schema, &[&desired.name, name]),
            old.comment.as_deref(),
            new.comment.as_deref(),
        ) {
            out.post.push(step);
        }
    }
}

/// Steps to create one index. `concurrently` selects the online build path
/// and marks the step non-transactional.
pub(crate) fn create_steps(
    schema: &str,
    table: &str,
    index: &Index,
    concurrently: bool,
) -> Vec<PlanStep> {
    let path = object_path(schema, &[table, &index.name]);
    let mut step = PlanStep::new(
        sqlgen::create_index(index, concurrently),
        ObjectKind::Index,
        Operation::Create,
        path.clone(),
    )
    .owned_by(object_path(schema, &[table]));
    if concurrently {
        step = step.non_transactional();
    }

    let mut steps = vec![step];
    if let Some(comment) = comments::create_comment(
        ObjectKind::Index,
        &format!("INDEX {}", crate::normalize::quote_ident(&index.name)),
        &path,
        index.comment.as_deref(),
    ) {
        steps.push(comment);
    }
    steps
}

pub(crate) fn drop_step(schema: &str, table: &str, index: &Index) -> PlanStep {
    PlanStep::new(
        sqlgen::drop_index(index),
        ObjectKind::Index,
        Operation::Drop,
        object_path(schema, &[table, &index.name]),
    )
    .owned_by(object_path(schema, &[table]))
}

fn structure_changed(old: &Index, new: &Index) -> bool {
    old.method != new.method
        || old.unique != new.unique
        || old.nulls_not_distinct != new.nulls_not_distinct
        || old.elements != new.elements
        || old.include != new.include
        || old.predicate != new.predicate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IndexElement;

    fn email_index() -> Index {
        Index {
            schema: "public".into(),
            table: "users".into(),
            name: "users_email_idx".into(),
            method: "btree".into(),
            unique: false,
            nulls_not_distinct: false,
            elements: vec![IndexElement::column("email")],
            include: vec![],
            predicate: None,
            comment: None,
        }
    }

    fn table_with(index: Option<Index>) -> Table {
        let mut table = Table::new("public", "users");
        if let Some(index) = index {
            table.indexes.insert(index.name.to_string(), index);
        }
        table
    }

    #[test]
    fn new_index_on_existing_table_is_concurrent_and_non_transactional() {
        let mut out = TableSteps::default();
        diff_indexes(&table_with(None), &table_with(Some(email_index())), &mut out);
        assert!(out.pre.is_empty());
        assert_eq!(out.post.len(), 1);
        assert!(out.post[0].sql.contains("CONCURRENTLY"));
        assert!(!out.post[0].can_run_in_transaction);
    }

    #[test]
    fn uniqueness_change_recreates() {
        let mut unique = email_index();
        unique.unique = true;
        let mut out = TableSteps::default();
        diff_indexes(
            &table_with(Some(email_index())),
            &table_with(Some(unique)),
            &mut out,
        );
        assert_eq!(out.pre.len(), 1);
        assert_eq!(out.pre[0].sql, "DROP INDEX users_email_idx;");
        assert_eq!(out.post.len(), 1);
        assert!(out.post[0].sql.starts_with("CREATE UNIQUE INDEX CONCURRENTLY"));
    }

    #[test]
    fn identical_index_is_silent() {
        let mut out = TableSteps::default();
        diff_indexes(
            &table_with(Some(email_index())),
            &table_with(Some(email_index())),
            &mut out,
        );
        assert!(out.is_empty());
    }
}
