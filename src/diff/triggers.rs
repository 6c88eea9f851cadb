//! Trigger comparison.
//!
//! `CREATE OR REPLACE TRIGGER` covers timing, events, level, WHEN, and the
//! target call. A change of identity, plain trigger to constraint trigger or
//! back, needs drop and create instead.

use crate::ir::{ObjectKind, Table, Trigger};
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;

use super::{TableSteps, comments, diff_maps, object_path};

pub(crate) fn diff_triggers(current: &Table, desired: &Table, out: &mut TableSteps) {
    let diff = diff_maps(&current.triggers, &desired.triggers);

    for (name, _) in diff.dropped {
        out.pre.push(drop_step(desired, name));
    }
    for (_, trigger) in diff.added {
        out.post.extend(create_steps(desired, trigger, false));
    }
    for (name, old, new) in diff.common {
        if behavior_changed(old, new) {
            if identity_changed(old, new) {
                out.pre.push(drop_step(desired, name));
                out.post.extend(create_steps(desired, new, false));
            } else {
                out.post.extend(create_steps(desired, new, true));
            }
        } else if let Some(step) = comments::diff_comment(
            ObjectKind::Trigger,
            &comment_target(desired, name),
            &object_path(&desired.schema, &[&desired.name, name]),
            old.comment.as_deref(),
            new.comment.as_deref(),
        ) {
            out.post.push(step);
        }
    }
}

pub(crate) fn create_steps(table: &Table, trigger: &Trigger, or_replace: bool) -> Vec<PlanStep> {
    let path = object_path(&table.schema, &[&table.name, &trigger.name]);
    let operation = if or_replace {
        Operation::Alter
    } else {
        Operation::Create
    };
    let mut steps = vec![
        PlanStep::new(
            sqlgen::create_trigger(table, trigger, or_replace),
            ObjectKind::Trigger,
            operation,
            path.clone(),
        )
        .owned_by(object_path(&table.schema, &[&table.name])),
    ];
    if let Some(comment) = comments::create_comment(
        ObjectKind::Trigger,
        &comment_target(table, &trigger.name),
        &path,
        trigger.comment.as_deref(),
    ) {
        steps.push(comment);
    }
    steps
}

pub(crate) fn drop_step(table: &Table, name: &str) -> PlanStep {
    PlanStep::new(
        sqlgen::drop_trigger(table, name),
        ObjectKind::Trigger,
        Operation::Drop,
        object_path(&table.schema, &[&table.name, name]),
    )
    .owned_by(object_path(&table.schema, &[&table.name]))
}

fn behavior_changed(old: &Trigger, new: &Trigger) -> bool {
    old.timing != new.timing
        || old.events != new.events
        || old.for_each_row != new.for_each_row
        || old.when != new.when
        || old.function_call != new.function_call
        || identity_changed(old, new)
}

fn identity_changed(old: &Trigger, new: &Trigger) -> bool {
    old.constraint != new.constraint
        || old.deferrable != new.deferrable
        || old.initially_deferred != new.initially_deferred
}

fn comment_target(table: &Table, name: &str) -> String {
    format!(
        "TRIGGER {} ON {}",
        crate::normalize::quote_ident(name),
        crate::normalize::quote_ident(&table.name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{TriggerEvent, TriggerTiming};

    fn audit_trigger() -> Trigger {
        Trigger {
            name: "audit".into(),
            timing: TriggerTiming::After,
            events: vec![TriggerEvent::Insert],
            for_each_row: true,
            when: None,
            function_call: "log_change()".into(),
            constraint: false,
            deferrable: false,
            initially_deferred: false,
            comment: None,
        }
    }

    fn table_with(trigger: Option<Trigger>) -> Table {
        let mut table = Table::new("public", "users");
        if let Some(trigger) = trigger {
            table.triggers.insert(trigger.name.to_string(), trigger);
        }
        table
    }

    #[test]
    fn when_change_uses_or_replace() {
        let mut changed = audit_trigger();
        changed.when = Some("new.name IS NOT NULL".into());
        let mut out = TableSteps::default();
        diff_triggers(
            &table_with(Some(audit_trigger())),
            &table_with(Some(changed)),
            &mut out,
        );
        assert!(out.pre.is_empty());
        assert_eq!(out.post.len(), 1);
        assert!(out.post[0].sql.starts_with("CREATE OR REPLACE TRIGGER"));
        assert_eq!(out.post[0].operation, Operation::Alter);
    }

    #[test]
    fn becoming_a_constraint_trigger_recreates() {
        let mut changed = audit_trigger();
        changed.constraint = true;
        changed.deferrable = true;
        let mut out = TableSteps::default();
        diff_triggers(
            &table_with(Some(audit_trigger())),
            &table_with(Some(changed)),
            &mut out,
        );
        assert_eq!(out.pre.len(), 1);
        assert!(out.pre[0].sql.starts_with("DROP TRIGGER"));
        assert_eq!(out.post.len(), 1);
        assert!(out.post[0].sql.contains("CONSTRAINT TRIGGER"));
        assert!(out.post[0].sql.contains("DEFERRABLE"));
    }
}
