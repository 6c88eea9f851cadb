//! View and materialized view comparison.
//!
//! Plain views replace in place. Materialized views have no `REPLACE`, so a
//! body change recreates them together with their indexes.

use crate::ir::{MaterializedView, ObjectKind, View};
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;

use super::{comments, diff_maps, indexes, object_path};

pub fn create_view_steps(view: &View) -> Vec<PlanStep> {
    let path = object_path(&view.schema, &[&view.name]);
    let mut steps = vec![PlanStep::new(
        sqlgen::create_view(view, false),
        ObjectKind::View,
        Operation::Create,
        path.clone(),
    )];
    if let Some(comment) = comments::create_comment(
        ObjectKind::View,
        &format!("VIEW {}", crate::normalize::quote_ident(&view.name)),
        &path,
        view.comment.as_deref(),
    ) {
        steps.push(comment);
    }
    steps
}

pub fn drop_view_step(view: &View) -> PlanStep {
    PlanStep::new(
        sqlgen::drop_view(view),
        ObjectKind::View,
        Operation::Drop,
        object_path(&view.schema, &[&view.name]),
    )
}

pub fn alter_view_steps(current: &View, desired: &View) -> Vec<PlanStep> {
    let path = object_path(&desired.schema, &[&desired.name]);
    let mut steps = Vec::new();

    let body_changed = current.definition != desired.definition
        || current.check_option != desired.check_option
        || current.security_barrier != desired.security_barrier
        || current.security_invoker != desired.security_invoker;
    if body_changed {
        steps.push(PlanStep::new(
            sqlgen::create_view(desired, true),
            ObjectKind::View,
            Operation::Alter,
            path.clone(),
        ));
    }

    if let Some(step) = comments::diff_comment(
        ObjectKind::View,
        &format!("VIEW {}", crate::normalize::quote_ident(&desired.name)),
        &path,
        current.comment.as_deref(),
        desired.comment.as_deref(),
    ) {
        steps.push(step);
    }
    steps
}

// =============================================================================
// Materialized views
// =============================================================================

pub fn create_matview_steps(matview: &MaterializedView) -> Vec<PlanStep> {
    let path = object_path(&matview.schema, &[&matview.name]);
    let mut steps = vec![PlanStep::new(
        sqlgen::create_materialized_view(matview),
        ObjectKind::MaterializedView,
        Operation::Create,
        path.clone(),
    )];
    // Matview indexes build plain: the matview was just created, nothing
    // reads it concurrently yet.
    for index in matview.indexes.values() {
        steps.extend(indexes::create_steps(
            &matview.schema,
            &matview.name,
            index,
            false,
        ));
    }
    if let Some(comment) = comments::create_comment(
        ObjectKind::MaterializedView,
        &matview_comment_target(matview),
        &path,
        matview.comment.as_deref(),
    ) {
        steps.push(comment);
    }
    steps
}

pub fn drop_matview_step(matview: &MaterializedView) -> PlanStep {
    PlanStep::new(
        sqlgen::drop_materialized_view(matview),
        ObjectKind::MaterializedView,
        Operation::Drop,
        object_path(&matview.schema, &[&matview.name]),
    )
}

pub fn alter_matview_steps(
    current: &MaterializedView,
    desired: &MaterializedView,
) -> Vec<PlanStep> {
    let path = object_path(&desired.schema, &[&desired.name]);
    let mut steps = Vec::new();

    if current.definition != desired.definition {
        // No REPLACE for matviews: recreate, dependent indexes included.
        steps.push(drop_matview_step(current));
        steps.extend(create_matview_steps(desired));
        return steps;
    }

    let diff = diff_maps(&current.indexes, &desired.indexes);
    for (_, index) in diff.dropped {
        steps.push(indexes::drop_step(&desired.schema, &desired.name, index));
    }
    for (_, index) in diff.added {
        steps.extend(indexes::create_steps(
            &desired.schema,
            &desired.name,
            index,
            true,
        ));
    }
    for (_, old, new) in diff.common {
        if old != new {
            steps.push(indexes::drop_step(&desired.schema, &desired.name, old));
            steps.extend(indexes::create_steps(
                &desired.schema,
                &desired.name,
                new,
                true,
            ));
        }
    }

    if let Some(step) = comments::diff_comment(
        ObjectKind::MaterializedView,
        &matview_comment_target(desired),
        &path,
        current.comment.as_deref(),
        desired.comment.as_deref(),
    ) {
        steps.push(step);
    }
    steps
}

fn matview_comment_target(matview: &MaterializedView) -> String {
    format!(
        "MATERIALIZED VIEW {}",
        crate::normalize::quote_ident(&matview.name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IndexElement;

    fn active_users(definition: &str) -> View {
        View {
            schema: "public".into(),
            name: "active_users".into(),
            definition: definition.into(),
            check_option: None,
            security_barrier: false,
            security_invoker: false,
            comment: None,
        }
    }

    #[test]
    fn body_change_replaces_view() {
        let current = active_users(" SELECT id FROM users");
        let desired = active_users(" SELECT id, email FROM users");
        let steps = alter_view_steps(&current, &desired);
        assert_eq!(steps.len(), 1);
        assert!(steps[0].sql.starts_with("CREATE OR REPLACE VIEW active_users AS"));
    }

    #[test]
    fn unchanged_view_is_silent() {
        let view = active_users(" SELECT id FROM users");
        assert!(alter_view_steps(&view, &view).is_empty());
    }

    #[test]
    fn matview_body_change_recreates_with_indexes() {
        let mut current = MaterializedView {
            schema: "public".into(),
            name: "daily_stats".into(),
            definition: " SELECT count(*) FROM events".into(),
            indexes: Default::default(),
            comment: None,
        };
        current.indexes.insert(
            "daily_stats_idx".into(),
            crate::ir::Index {
                schema: "public".into(),
                table: "daily_stats".into(),
                name: "daily_stats_idx".into(),
                method: "btree".into(),
                unique: false,
                nulls_not_distinct: false,
                elements: vec![IndexElement::column("count")],
                include: vec![],
                predicate: None,
                comment: None,
            },
        );
        let desired = MaterializedView {
            definition: " SELECT count(*), max(at) FROM events".into(),
            ..current.clone()
        };

        let steps = alter_matview_steps(&current, &desired);
        assert_eq!(steps.len(), 3);
        assert!(steps[0].sql.starts_with("DROP MATERIALIZED VIEW"));
        assert!(steps[1].sql.starts_with("CREATE MATERIALIZED VIEW"));
        assert!(steps[2].sql.starts_with("CREATE INDEX daily_stats_idx"));
    }
}
