//! Grant and default-privilege comparison, as sets per grantee.

use crate::ir::{ObjectKind, Schema};
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;

use super::{diff_maps, object_path};

pub fn diff_grants(current: &Schema, desired: &Schema) -> Vec<PlanStep> {
    let mut steps = Vec::new();
    let diff = diff_maps(&current.grants, &desired.grants);

    // Grants absent from the desired state are "no opinion": the authored
    // file is additive for privileges, so nothing is revoked wholesale.
    for (key, grant) in diff.added {
        steps.push(PlanStep::new(
            sqlgen::grant(grant),
            ObjectKind::Privilege,
            Operation::Create,
            object_path(&desired.name, &[key]),
        ));
    }
    for (key, old, new) in diff.common {
        let revoked: Vec<String> = old
            .privileges
            .difference(&new.privileges)
            .cloned()
            .collect();
        let granted: Vec<String> = new
            .privileges
            .difference(&old.privileges)
            .cloned()
            .collect();
        if !revoked.is_empty() {
            steps.push(PlanStep::new(
                sqlgen::revoke(old, &revoked),
                ObjectKind::Privilege,
                Operation::Drop,
                object_path(&desired.name, &[key]),
            ));
        }
        if !granted.is_empty() {
            let mut addition = new.clone();
            addition.privileges = granted.into_iter().collect();
            steps.push(PlanStep::new(
                sqlgen::grant(&addition),
                ObjectKind::Privilege,
                Operation::Create,
                object_path(&desired.name, &[key]),
            ));
        }
    }
    steps
}

pub fn diff_default_privileges(current: &Schema, desired: &Schema) -> Vec<PlanStep> {
    let mut steps = Vec::new();
    let diff = diff_maps(&current.default_privileges, &desired.default_privileges);

    for (key, default) in diff.dropped {
        steps.push(PlanStep::new(
            sqlgen::alter_default_privileges_revoke(default),
            ObjectKind::Privilege,
            Operation::Drop,
            object_path(&desired.name, &[key]),
        ));
    }
    for (key, default) in diff.added {
        steps.push(PlanStep::new(
            sqlgen::alter_default_privileges_grant(default),
            ObjectKind::Privilege,
            Operation::Create,
            object_path(&desired.name, &[key]),
        ));
    }
    for (key, old, new) in diff.common {
        if old.privileges != new.privileges {
            steps.push(PlanStep::new(
                sqlgen::alter_default_privileges_revoke(old),
                ObjectKind::Privilege,
                Operation::Drop,
                object_path(&desired.name, &[key]),
            ));
            steps.push(PlanStep::new(
                sqlgen::alter_default_privileges_grant(new),
                ObjectKind::Privilege,
                Operation::Create,
                object_path(&desired.name, &[key]),
            ));
        }
    }
    steps
}
