//! Constraint comparison.
//!
//! Any attribute change on a constraint means drop and re-add; PostgreSQL
//! has no `ALTER CONSTRAINT` form that covers column lists or expressions.
//! Foreign keys are routed into the deferred FK bucket so the assembler can
//! place them after every referenced table exists.

use std::collections::BTreeSet;

use crate::ir::{Constraint, ObjectKind, Table};
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;

use super::{TableSteps, comments, diff_maps, object_path};

/// Diff the constraint maps of one table. `consumed` names constraints that
/// were folded into an `ADD COLUMN` statement and must not be emitted again.
pub(crate) fn diff_constraints(
    current: &Table,
    desired: &Table,
    consumed: &BTreeSet<String>,
    out: &mut TableSteps,
) {
    let diff = diff_maps(&current.constraints, &desired.constraints);

    for (name, _) in diff.dropped {
        out.pre.push(drop_step(current, name));
    }
    for (name, constraint) in diff.added {
        if consumed.contains(name) {
            continue;
        }
        push_add_step(desired, name, constraint, out);
    }
    for (name, old, new) in diff.common {
        let path = object_path(&desired.schema, &[&desired.name, name]);
        if definition_changed(old, new) {
            out.pre.push(drop_step(current, name));
            push_add_step(desired, name, new, out);
        }
        if let Some(step) = comments::diff_comment(
            ObjectKind::Constraint,
            &comment_target(desired, name),
            &path,
            old.comment.as_deref(),
            new.comment.as_deref(),
        ) {
            out.post.push(step);
        }
    }
}

/// All steps to add one constraint on an existing table, comment included.
pub(crate) fn push_add_step(
    table: &Table,
    name: &str,
    constraint: &Constraint,
    out: &mut TableSteps,
) {
    let path = object_path(&table.schema, &[&table.name, name]);
    let step = PlanStep::new(
        sqlgen::add_constraint(table, constraint),
        ObjectKind::Constraint,
        Operation::Create,
        path.clone(),
    )
    .owned_by(object_path(&table.schema, &[&table.name]));

    if constraint.inline_in_create_table() {
        out.post.push(step);
    } else {
        out.fk_steps.push(step);
    }
    if let Some(comment) = comments::create_comment(
        ObjectKind::Constraint,
        &comment_target(table, name),
        &path,
        constraint.comment.as_deref(),
    ) {
        out.post.push(comment);
    }
}

fn drop_step(table: &Table, name: &str) -> PlanStep {
    PlanStep::new(
        sqlgen::drop_constraint(table, name),
        ObjectKind::Constraint,
        Operation::Drop,
        object_path(&table.schema, &[&table.name, name]),
    )
    .owned_by(object_path(&table.schema, &[&table.name]))
}

/// Everything except the comment takes part in identity.
fn definition_changed(old: &Constraint, new: &Constraint) -> bool {
    old.kind != new.kind
        || old.deferrable != new.deferrable
        || old.initially_deferred != new.initially_deferred
}

pub(crate) fn comment_target(table: &Table, name: &str) -> String {
    format!(
        "CONSTRAINT {} ON {}",
        crate::normalize::quote_ident(name),
        crate::normalize::quote_ident(&table.name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Column, ConstraintKind, FkAction};

    fn table_with_constraint(constraint: Constraint) -> Table {
        let mut table = Table::new("public", "tasks");
        table.columns.push(Column::new("project_id", "integer"));
        table.columns.push(Column::new("phase_id", "integer"));
        table
            .constraints
            .insert(constraint.name.clone(), constraint);
        table
    }

    fn composite_fk() -> Constraint {
        Constraint::new(
            "fk_task_project_phase",
            ConstraintKind::ForeignKey {
                columns: vec!["project_id".into(), "phase_id".into()],
                ref_schema: "public".into(),
                ref_table: "projects".into(),
                ref_columns: vec!["project_id".into(), "phase_id".into()],
                on_update: FkAction::NoAction,
                on_delete: FkAction::NoAction,
            },
        )
    }

    #[test]
    fn added_fk_lands_in_deferred_bucket_with_its_name() {
        let current = {
            let mut t = Table::new("public", "tasks");
            t.columns.push(Column::new("project_id", "integer"));
            t.columns.push(Column::new("phase_id", "integer"));
            t
        };
        let desired = table_with_constraint(composite_fk());

        let mut out = TableSteps::default();
        diff_constraints(&current, &desired, &BTreeSet::new(), &mut out);
        assert!(out.pre.is_empty());
        assert!(out.post.is_empty());
        assert_eq!(out.fk_steps.len(), 1);
        assert!(
            out.fk_steps[0]
                .sql
                .starts_with("ALTER TABLE tasks ADD CONSTRAINT fk_task_project_phase")
        );
    }

    #[test]
    fn fk_action_change_is_drop_then_add() {
        let current = table_with_constraint(composite_fk());
        let mut changed = composite_fk();
        if let ConstraintKind::ForeignKey { on_delete, .. } = &mut changed.kind {
            *on_delete = FkAction::Cascade;
        }
        let desired = table_with_constraint(changed);

        let mut out = TableSteps::default();
        diff_constraints(&current, &desired, &BTreeSet::new(), &mut out);
        assert_eq!(out.pre.len(), 1);
        assert!(out.pre[0].sql.starts_with("ALTER TABLE tasks DROP CONSTRAINT"));
        assert_eq!(out.fk_steps.len(), 1);
        assert!(out.fk_steps[0].sql.contains("ON DELETE CASCADE"));
    }

    #[test]
    fn unchanged_constraint_is_silent() {
        let current = table_with_constraint(composite_fk());
        let desired = table_with_constraint(composite_fk());
        let mut out = TableSteps::default();
        diff_constraints(&current, &desired, &BTreeSet::new(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn consumed_constraint_is_skipped() {
        let current = Table::new("public", "tasks");
        let desired = table_with_constraint(Constraint::new(
            "tasks_code_key",
            ConstraintKind::Unique {
                columns: vec!["code".into()],
                nulls_not_distinct: false,
            },
        ));
        let consumed = BTreeSet::from(["tasks_code_key".to_string()]);
        let mut out = TableSteps::default();
        diff_constraints(&current, &desired, &consumed, &mut out);
        assert!(out.is_empty());
    }
}
