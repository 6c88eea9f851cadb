//! Row-level-security comparison: the table-level flag and the policies.
//!
//! The flag and the policies are independent steps. `ALTER POLICY` covers
//! role lists and expressions; a change of command or of the
//! permissive/restrictive flag recreates the policy. Policies on a table
//! whose desired state has RLS disabled are inert and produce nothing.

use crate::ir::{ObjectKind, Policy, Table};
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;

use super::{TableSteps, comments, diff_maps, object_path};

pub(crate) fn diff_row_level_security(current: &Table, desired: &Table, out: &mut TableSteps) {
    let table_path = object_path(&desired.schema, &[&desired.name]);

    if !current.rls_enabled && desired.rls_enabled {
        out.post.push(PlanStep::new(
            sqlgen::enable_row_level_security(desired),
            ObjectKind::Table,
            Operation::Alter,
            table_path.clone(),
        ));
    } else if current.rls_enabled && !desired.rls_enabled {
        out.post.push(PlanStep::new(
            sqlgen::disable_row_level_security(desired),
            ObjectKind::Table,
            Operation::Alter,
            table_path.clone(),
        ));
    }

    // With RLS off on the desired side the policies carry no effect; parsed
    // policies stay in the IR but must not reach the plan.
    let empty = std::collections::BTreeMap::new();
    let current_policies = if current.rls_enabled || desired.rls_enabled {
        &current.policies
    } else {
        &empty
    };
    let desired_policies = if desired.rls_enabled {
        &desired.policies
    } else {
        &empty
    };

    let diff = diff_maps(current_policies, desired_policies);
    for (name, _) in diff.dropped {
        out.pre.push(drop_step(desired, name));
    }
    for (_, policy) in diff.added {
        out.post.extend(create_steps(desired, policy));
    }
    for (name, old, new) in diff.common {
        // ALTER POLICY can swap roles and expressions but cannot change the
        // command, the permissive flag, or remove an expression outright.
        let needs_recreate = old.command != new.command
            || old.permissive != new.permissive
            || (old.using.is_some() && new.using.is_none())
            || (old.with_check.is_some() && new.with_check.is_none());
        if needs_recreate {
            out.pre.push(drop_step(desired, name));
            out.post.extend(create_steps(desired, new));
        } else if old.roles != new.roles || old.using != new.using || old.with_check != new.with_check
        {
            out.post.push(
                PlanStep::new(
                    sqlgen::alter_policy(desired, new),
                    ObjectKind::Policy,
                    Operation::Alter,
                    object_path(&desired.schema, &[&desired.name, name]),
                )
                .owned_by(table_path.clone()),
            );
        }
        if let Some(step) = comments::diff_comment(
            ObjectKind::Policy,
            &comment_target(desired, name),
            &object_path(&desired.schema, &[&desired.name, name]),
            old.comment.as_deref(),
            new.comment.as_deref(),
        ) {
            out.post.push(step);
        }
    }
}

pub(crate) fn create_steps(table: &Table, policy: &Policy) -> Vec<PlanStep> {
    let path = object_path(&table.schema, &[&table.name, &policy.name]);
    let mut steps = vec![
        PlanStep::new(
            sqlgen::create_policy(table, policy),
            ObjectKind::Policy,
            Operation::Create,
            path.clone(),
        )
        .owned_by(object_path(&table.schema, &[&table.name])),
    ];
    if let Some(comment) = comments::create_comment(
        ObjectKind::Policy,
        &comment_target(table, &policy.name),
        &path,
        policy.comment.as_deref(),
    ) {
        steps.push(comment);
    }
    steps
}

fn drop_step(table: &Table, name: &str) -> PlanStep {
    PlanStep::new(
        sqlgen::drop_policy(table, name),
        ObjectKind::Policy,
        Operation::Drop,
        object_path(&table.schema, &[&table.name, name]),
    )
    .owned_by(object_path(&table.schema, &[&table.name]))
}

fn comment_target(table: &Table, name: &str) -> String {
    format!(
        "POLICY {} ON {}",
        crate::normalize::quote_ident(name),
        crate::normalize::quote_ident(&table.name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::PolicyCommand;

    fn tenant_policy() -> Policy {
        Policy {
            name: "tenant_read".into(),
            command: PolicyCommand::Select,
            permissive: true,
            roles: vec!["app_user".into()],
            using: Some("(tenant_id = current_tenant())".into()),
            with_check: None,
            comment: None,
        }
    }

    fn table(rls: bool, policy: Option<Policy>) -> Table {
        let mut t = Table::new("public", "accounts");
        t.rls_enabled = rls;
        if let Some(p) = policy {
            t.policies.insert(p.name.to_string(), p);
        }
        t
    }

    #[test]
    fn enabling_rls_and_adding_policy_are_separate_steps() {
        let mut out = TableSteps::default();
        diff_row_level_security(
            &table(false, None),
            &table(true, Some(tenant_policy())),
            &mut out,
        );
        assert_eq!(out.post.len(), 2);
        assert!(out.post[0].sql.contains("ENABLE ROW LEVEL SECURITY"));
        assert!(out.post[1].sql.starts_with("CREATE POLICY"));
    }

    #[test]
    fn policies_are_inert_when_rls_disabled_on_both_sides() {
        let mut out = TableSteps::default();
        diff_row_level_security(
            &table(false, None),
            &table(false, Some(tenant_policy())),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn expression_change_uses_alter_policy() {
        let mut changed = tenant_policy();
        changed.using = Some("(tenant_id = current_setting('app.tenant')::uuid)".into());
        let mut out = TableSteps::default();
        diff_row_level_security(
            &table(true, Some(tenant_policy())),
            &table(true, Some(changed)),
            &mut out,
        );
        assert_eq!(out.post.len(), 1);
        assert!(out.post[0].sql.starts_with("ALTER POLICY tenant_read ON accounts"));
    }

    #[test]
    fn dropping_the_using_expression_recreates_policy() {
        let mut changed = tenant_policy();
        changed.using = None;
        let mut out = TableSteps::default();
        diff_row_level_security(
            &table(true, Some(tenant_policy())),
            &table(true, Some(changed)),
            &mut out,
        );
        assert_eq!(out.pre.len(), 1);
        assert!(out.pre[0].sql.starts_with("DROP POLICY"));
        assert_eq!(out.post.len(), 1);
        assert!(out.post[0].sql.starts_with("CREATE POLICY"));
    }

    #[test]
    fn command_change_recreates_policy() {
        let mut changed = tenant_policy();
        changed.command = PolicyCommand::All;
        let mut out = TableSteps::default();
        diff_row_level_security(
            &table(true, Some(tenant_policy())),
            &table(true, Some(changed)),
            &mut out,
        );
        assert_eq!(out.pre.len(), 1);
        assert!(out.pre[0].sql.starts_with("DROP POLICY"));
        assert_eq!(out.post.len(), 1);
        assert!(out.post[0].sql.starts_with("CREATE POLICY"));
    }
}
