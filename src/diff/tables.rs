//! Table comparison: the table itself, its columns, and the recursion into
//! constraint, index, trigger, and policy comparators.

use std::collections::BTreeSet;

use crate::error::DiffError;
use crate::ir::{Column, ConstraintKind, ObjectKind, Table};
use crate::normalize::{TypeFamily, quote_ident};
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;
use crate::version::PgVersion;

use super::{
    TableSteps, comments, constraints, indexes, object_path, policies, triggers,
};

/// Steps for a brand-new table: the `CREATE TABLE` itself (with inline
/// non-FK constraints), then indexes, triggers, row-level security, and
/// comments. Foreign keys go to the deferred bucket.
pub fn create_table_steps(table: &Table) -> TableSteps {
    let mut out = TableSteps::default();
    let table_path = object_path(&table.schema, &[&table.name]);

    out.steps.push(PlanStep::new(
        sqlgen::create_table(table),
        ObjectKind::Table,
        Operation::Create,
        table_path.clone(),
    ));

    for constraint in table.constraints.values() {
        if !constraint.inline_in_create_table() {
            constraints::push_add_step(table, &constraint.name, constraint, &mut out);
        } else if let Some(comment) = comments::create_comment(
            ObjectKind::Constraint,
            &constraints::comment_target(table, &constraint.name),
            &object_path(&table.schema, &[&table.name, &constraint.name]),
            constraint.comment.as_deref(),
        ) {
            out.post.push(comment);
        }
    }

    // Indexes created together with their table build plain, not
    // concurrently.
    for index in table.indexes.values() {
        out.post
            .extend(indexes::create_steps(&table.schema, &table.name, index, false));
    }
    for trigger in table.triggers.values() {
        out.post.extend(triggers::create_steps(table, trigger, false));
    }
    if table.rls_enabled {
        out.post.push(PlanStep::new(
            sqlgen::enable_row_level_security(table),
            ObjectKind::Table,
            Operation::Alter,
            table_path.clone(),
        ));
        for policy in table.policies.values() {
            out.post.extend(policies::create_steps(table, policy));
        }
    }

    if let Some(comment) = comments::create_comment(
        ObjectKind::Table,
        &format!("TABLE {}", quote_ident(&table.name)),
        &table_path,
        table.comment.as_deref(),
    ) {
        out.post.push(comment);
    }
    for column in &table.columns {
        if let Some(comment) = comments::create_comment(
            ObjectKind::Column,
            &column_comment_target(table, &column.name),
            &object_path(&table.schema, &[&table.name, &column.name]),
            column.comment.as_deref(),
        ) {
            out.post.push(comment);
        }
    }

    out
}

/// Dropping a table takes its sub-objects with it; one statement suffices.
pub fn drop_table_steps(table: &Table) -> Vec<PlanStep> {
    vec![PlanStep::new(
        sqlgen::drop_table(table),
        ObjectKind::Table,
        Operation::Drop,
        object_path(&table.schema, &[&table.name]),
    )]
}

/// Steps reconciling one table that exists on both sides.
pub fn alter_table_steps(
    current: &Table,
    desired: &Table,
    version: PgVersion,
) -> Result<TableSteps, DiffError> {
    let mut out = TableSteps::default();
    let table_path = object_path(&desired.schema, &[&desired.name]);

    if current.kind != desired.kind || current.partition_by != desired.partition_by {
        return Err(DiffError::IncompatibleChange {
            object: table_path,
            detail: "partitioning cannot change in place".into(),
        });
    }

    // Single-column PK/UNIQUE constraints declared together with a new
    // column fold into the ADD COLUMN statement.
    let consumed = inline_constraints(current, desired);

    diff_columns(current, desired, &consumed, version, &mut out)?;
    constraints::diff_constraints(current, desired, &consumed, &mut out);
    indexes::diff_indexes(current, desired, &mut out);
    triggers::diff_triggers(current, desired, &mut out);
    policies::diff_row_level_security(current, desired, &mut out);

    if let Some(step) = comments::diff_comment(
        ObjectKind::Table,
        &format!("TABLE {}", quote_ident(&desired.name)),
        &object_path(&desired.schema, &[&desired.name]),
        current.comment.as_deref(),
        desired.comment.as_deref(),
    ) {
        out.post.push(step);
    }

    Ok(out)
}

/// Names of added constraints that ride along inside an `ADD COLUMN`.
fn inline_constraints(current: &Table, desired: &Table) -> BTreeSet<String> {
    let mut consumed = BTreeSet::new();
    for (name, constraint) in &desired.constraints {
        if current.constraints.contains_key(name) {
            continue;
        }
        let column = match &constraint.kind {
            ConstraintKind::PrimaryKey { columns } if columns.len() == 1 => &columns[0],
            ConstraintKind::Unique { columns, .. } if columns.len() == 1 => &columns[0],
            _ => continue,
        };
        let is_new_column =
            current.column(column).is_none() && desired.column(column).is_some();
        if is_new_column {
            consumed.insert(name.clone());
        }
    }
    consumed
}

fn diff_columns(
    current: &Table,
    desired: &Table,
    consumed: &BTreeSet<String>,
    version: PgVersion,
    out: &mut TableSteps,
) -> Result<(), DiffError> {
    for column in &current.columns {
        if desired.column(&column.name).is_none() {
            out.steps.push(
                PlanStep::new(
                    sqlgen::drop_column(desired, &column.name),
                    ObjectKind::Column,
                    Operation::Drop,
                    object_path(&desired.schema, &[&desired.name, &column.name]),
                )
                .owned_by(object_path(&desired.schema, &[&desired.name])),
            );
        }
    }

    for column in &desired.columns {
        match current.column(&column.name) {
            None => {
                let inline = desired.constraints.values().find(|c| {
                    consumed.contains(&c.name) && constraint_covers(&c.kind, &column.name)
                });
                let path = object_path(&desired.schema, &[&desired.name, &column.name]);
                out.steps.push(
                    PlanStep::new(
                        sqlgen::add_column(desired, column, inline),
                        ObjectKind::Column,
                        Operation::Create,
                        path.clone(),
                    )
                    .owned_by(object_path(&desired.schema, &[&desired.name])),
                );
                if let Some(comment) = comments::create_comment(
                    ObjectKind::Column,
                    &column_comment_target(desired, &column.name),
                    &path,
                    column.comment.as_deref(),
                ) {
                    out.post.push(comment);
                }
            }
            Some(existing) => {
                alter_column(existing, column, desired, version, out)?;
            }
        }
    }
    Ok(())
}

fn constraint_covers(kind: &ConstraintKind, column: &str) -> bool {
    match kind {
        ConstraintKind::PrimaryKey { columns } => columns.len() == 1 && columns[0] == column,
        ConstraintKind::Unique { columns, .. } => columns.len() == 1 && columns[0] == column,
        _ => false,
    }
}

/// Independent ALTERs for each changed column attribute; a type change
/// without an in-place path recreates the column.
fn alter_column(
    old: &Column,
    new: &Column,
    desired: &Table,
    version: PgVersion,
    out: &mut TableSteps,
) -> Result<(), DiffError> {
    let path = object_path(&desired.schema, &[&desired.name, &new.name]);
    let table_path = object_path(&desired.schema, &[&desired.name]);

    let generation_changed = old.generated != new.generated;
    let type_needs_recreate = old.data_type != new.data_type
        && !TypeFamily::of(&old.data_type).convertible_to(&TypeFamily::of(&new.data_type));
    // Stored generation cannot be added to an existing column, and the
    // expression can only change in place from 17 on.
    let generation_needs_recreate = generation_changed
        && new.generated.is_some()
        && (old.generated.is_none() || version.major < 17);
    let needs_recreate = type_needs_recreate || generation_needs_recreate;

    if needs_recreate {
        out.steps.push(
            PlanStep::new(
                sqlgen::drop_column(desired, &new.name),
                ObjectKind::Column,
                Operation::Drop,
                path.clone(),
            )
            .owned_by(table_path.clone()),
        );
        out.steps.push(
            PlanStep::new(
                sqlgen::add_column(desired, new, None),
                ObjectKind::Column,
                Operation::Create,
                path.clone(),
            )
            .owned_by(table_path.clone()),
        );
        if let Some(step) = comments::diff_comment(
            ObjectKind::Column,
            &column_comment_target(desired, &new.name),
            &path,
            None,
            new.comment.as_deref(),
        ) {
            out.post.push(step);
        }
        return Ok(());
    }

    if old.data_type != new.data_type {
        let using = if TypeFamily::of(&old.data_type) == TypeFamily::of(&new.data_type) {
            None
        } else {
            Some(format!("{}::{}", quote_ident(&new.name), new.data_type))
        };
        out.steps.push(
            PlanStep::new(
                sqlgen::alter_column_type(desired, new, using.as_deref()),
                ObjectKind::Column,
                Operation::Alter,
                path.clone(),
            )
            .owned_by(table_path.clone()),
        );
    }

    if generation_changed {
        match (&old.generated, &new.generated) {
            (Some(_), None) => out.steps.push(
                PlanStep::new(
                    sqlgen::alter_column_drop_expression(desired, &new.name),
                    ObjectKind::Column,
                    Operation::Alter,
                    path.clone(),
                )
                .owned_by(table_path.clone()),
            ),
            (Some(_), Some(generated)) => {
                // Reachable only on majors that support SET EXPRESSION.
                out.steps.push(
                    PlanStep::new(
                        format!(
                            "ALTER TABLE {} ALTER COLUMN {} SET EXPRESSION AS ({});",
                            quote_ident(&desired.name),
                            quote_ident(&new.name),
                            generated.expression
                        ),
                        ObjectKind::Column,
                        Operation::Alter,
                        path.clone(),
                    )
                    .owned_by(table_path.clone()),
                );
            }
            _ => {}
        }
    }

    if old.default != new.default && new.generated.is_none() && new.identity.is_none() {
        out.steps.push(
            PlanStep::new(
                sqlgen::alter_column_default(desired, &new.name, new.default.as_deref()),
                ObjectKind::Column,
                Operation::Alter,
                path.clone(),
            )
            .owned_by(table_path.clone()),
        );
    }

    if old.identity != new.identity {
        let step_sql = match (&old.identity, &new.identity) {
            (None, Some(_)) => sqlgen::alter_column_add_identity(desired, new),
            (Some(_), Some(_)) => sqlgen::alter_column_set_identity_kind(desired, new),
            (Some(_), None) => Some(sqlgen::alter_column_drop_identity(desired, &new.name)),
            (None, None) => None,
        };
        if let Some(sql) = step_sql {
            out.steps.push(
                PlanStep::new(sql, ObjectKind::Column, Operation::Alter, path.clone())
                    .owned_by(table_path.clone()),
            );
        }
    }

    if old.not_null != new.not_null {
        out.steps.push(
            PlanStep::new(
                sqlgen::alter_column_not_null(desired, &new.name, new.not_null),
                ObjectKind::Column,
                Operation::Alter,
                path.clone(),
            )
            .owned_by(table_path.clone()),
        );
    }

    if let Some(step) = comments::diff_comment(
        ObjectKind::Column,
        &column_comment_target(desired, &new.name),
        &path,
        old.comment.as_deref(),
        new.comment.as_deref(),
    ) {
        out.post.push(step);
    }

    Ok(())
}

fn column_comment_target(table: &Table, column: &str) -> String {
    format!(
        "COLUMN {}.{}",
        quote_ident(&table.name),
        quote_ident(column)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Constraint;

    fn users_with(columns: Vec<Column>) -> Table {
        let mut table = Table::new("public", "users");
        table.columns = columns;
        table
    }

    fn not_null(mut column: Column) -> Column {
        column.not_null = true;
        column
    }

    #[test]
    fn added_column_with_default_is_one_step() {
        let current = users_with(vec![not_null(Column::new("id", "integer"))]);
        let mut status = Column::new("status", "text");
        status.not_null = true;
        status.default = Some("def_status()".into());
        let desired = users_with(vec![not_null(Column::new("id", "integer")), status]);

        let out = alter_table_steps(&current, &desired, PgVersion::new(16)).unwrap();
        let (steps, fks) = out.into_ordered();
        assert!(fks.is_empty());
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].sql,
            "ALTER TABLE users ADD COLUMN status text DEFAULT def_status() NOT NULL;"
        );
    }

    #[test]
    fn widening_type_changes_in_place() {
        let current = users_with(vec![Column::new("id", "integer")]);
        let desired = users_with(vec![Column::new("id", "bigint")]);

        let out = alter_table_steps(&current, &desired, PgVersion::new(16)).unwrap();
        let (steps, _) = out.into_ordered();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].sql, "ALTER TABLE users ALTER COLUMN id TYPE bigint;");
    }

    #[test]
    fn integer_to_numeric_gets_a_using_clause() {
        let current = users_with(vec![Column::new("amount", "integer")]);
        let desired = users_with(vec![Column::new("amount", "numeric(10,2)")]);

        let out = alter_table_steps(&current, &desired, PgVersion::new(16)).unwrap();
        let (steps, _) = out.into_ordered();
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].sql,
            "ALTER TABLE users ALTER COLUMN amount TYPE numeric(10,2) USING amount::numeric(10,2);"
        );
    }

    #[test]
    fn cross_family_type_change_recreates_column() {
        let current = users_with(vec![Column::new("code", "text")]);
        let desired = users_with(vec![Column::new("code", "integer")]);

        let out = alter_table_steps(&current, &desired, PgVersion::new(16)).unwrap();
        let (steps, _) = out.into_ordered();
        assert_eq!(steps.len(), 2);
        assert!(steps[0].sql.starts_with("ALTER TABLE users DROP COLUMN code"));
        assert!(steps[1].sql.starts_with("ALTER TABLE users ADD COLUMN code integer"));
    }

    #[test]
    fn nullability_and_default_are_independent_alters() {
        let mut old = Column::new("status", "text");
        old.default = Some("'new'::text".into());
        let mut new = Column::new("status", "text");
        new.not_null = true;
        new.default = Some("'active'::text".into());

        let out = alter_table_steps(
            &users_with(vec![old]),
            &users_with(vec![new]),
            PgVersion::new(16),
        )
        .unwrap();
        let (steps, _) = out.into_ordered();
        assert_eq!(steps.len(), 2);
        assert_eq!(
            steps[0].sql,
            "ALTER TABLE users ALTER COLUMN status SET DEFAULT 'active'::text;"
        );
        assert_eq!(
            steps[1].sql,
            "ALTER TABLE users ALTER COLUMN status SET NOT NULL;"
        );
    }

    #[test]
    fn single_column_unique_added_with_column_is_inlined() {
        let current = users_with(vec![Column::new("id", "integer")]);
        let mut desired = users_with(vec![Column::new("id", "integer"), Column::new("email", "text")]);
        desired.constraints.insert(
            "users_email_key".into(),
            Constraint::new(
                "users_email_key",
                ConstraintKind::Unique {
                    columns: vec!["email".into()],
                    nulls_not_distinct: false,
                },
            ),
        );

        let out = alter_table_steps(&current, &desired, PgVersion::new(16)).unwrap();
        let (steps, _) = out.into_ordered();
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].sql,
            "ALTER TABLE users ADD COLUMN email text UNIQUE;"
        );
    }

    #[test]
    fn multi_column_constraint_is_separate_add() {
        let current = users_with(vec![Column::new("a", "integer"), Column::new("b", "integer")]);
        let mut desired = users_with(vec![Column::new("a", "integer"), Column::new("b", "integer")]);
        desired.constraints.insert(
            "users_a_b_key".into(),
            Constraint::new(
                "users_a_b_key",
                ConstraintKind::Unique {
                    columns: vec!["a".into(), "b".into()],
                    nulls_not_distinct: false,
                },
            ),
        );

        let out = alter_table_steps(&current, &desired, PgVersion::new(16)).unwrap();
        let (steps, _) = out.into_ordered();
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].sql,
            "ALTER TABLE users ADD CONSTRAINT users_a_b_key UNIQUE (a, b);"
        );
    }

    #[test]
    fn partition_change_is_incompatible() {
        let current = users_with(vec![Column::new("id", "integer")]);
        let mut desired = users_with(vec![Column::new("id", "integer")]);
        desired.kind = crate::ir::TableKind::Partitioned;
        desired.partition_by = Some("RANGE (id)".into());

        let err = alter_table_steps(&current, &desired, PgVersion::new(16)).unwrap_err();
        assert_eq!(err.kind(), "diff.incompatible_change");
    }

    #[test]
    fn dropped_column_is_dropped() {
        let current = users_with(vec![Column::new("id", "integer"), Column::new("legacy", "text")]);
        let desired = users_with(vec![Column::new("id", "integer")]);

        let out = alter_table_steps(&current, &desired, PgVersion::new(16)).unwrap();
        let (steps, _) = out.into_ordered();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].sql, "ALTER TABLE users DROP COLUMN legacy;");
    }
}
