//! Function, procedure, and aggregate comparison.
//!
//! Overload keys carry the identity argument list, so a signature change
//! surfaces as drop plus add at the map level. Within one key: a source or
//! declaration change replaces the routine; attribute-only changes emit one
//! `ALTER` per attribute.

use crate::ir::{Aggregate, ObjectKind, Routine, RoutineKind};
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;

use super::{comments, object_path};

pub fn create_steps(routine: &Routine) -> Vec<PlanStep> {
    let path = object_path(&routine.schema, &[&routine.key()]);
    let mut steps = vec![PlanStep::new(
        sqlgen::create_routine(routine),
        routine_kind(routine),
        Operation::Create,
        path.clone(),
    )];
    if let Some(comment) = comments::create_comment(
        routine_kind(routine),
        &comment_target(routine),
        &path,
        routine.comment.as_deref(),
    ) {
        steps.push(comment);
    }
    steps
}

pub fn drop_step(routine: &Routine) -> PlanStep {
    PlanStep::new(
        sqlgen::drop_routine(routine),
        routine_kind(routine),
        Operation::Drop,
        object_path(&routine.schema, &[&routine.key()]),
    )
}

pub fn alter_steps(current: &Routine, desired: &Routine) -> Vec<PlanStep> {
    let path = object_path(&desired.schema, &[&desired.key()]);
    let mut steps = Vec::new();

    let declaration_changed = current.source != desired.source
        || current.arguments != desired.arguments
        || current.returns != desired.returns
        || current.language != desired.language;

    if declaration_changed {
        // The replacement body carries every attribute, so no separate
        // attribute steps are needed.
        steps.push(PlanStep::new(
            sqlgen::create_routine(desired),
            routine_kind(desired),
            Operation::Alter,
            path.clone(),
        ));
    } else {
        for attribute in attribute_changes(current, desired) {
            steps.push(PlanStep::new(
                sqlgen::alter_routine_attribute(desired, &attribute),
                routine_kind(desired),
                Operation::Alter,
                path.clone(),
            ));
        }
    }

    if let Some(step) = comments::diff_comment(
        routine_kind(desired),
        &comment_target(desired),
        &path,
        current.comment.as_deref(),
        desired.comment.as_deref(),
    ) {
        steps.push(step);
    }
    steps
}

/// Attribute clauses, one `ALTER` each, in a fixed order.
fn attribute_changes(current: &Routine, desired: &Routine) -> Vec<String> {
    let mut changes = Vec::new();
    if current.volatility != desired.volatility {
        changes.push(desired.volatility.as_sql().to_string());
    }
    if current.strict != desired.strict {
        changes.push(
            if desired.strict {
                "STRICT"
            } else {
                "CALLED ON NULL INPUT"
            }
            .to_string(),
        );
    }
    if current.security_definer != desired.security_definer {
        changes.push(
            if desired.security_definer {
                "SECURITY DEFINER"
            } else {
                "SECURITY INVOKER"
            }
            .to_string(),
        );
    }
    if current.leakproof != desired.leakproof {
        changes.push(
            if desired.leakproof {
                "LEAKPROOF"
            } else {
                "NOT LEAKPROOF"
            }
            .to_string(),
        );
    }
    if current.parallel != desired.parallel {
        changes.push(format!("PARALLEL {}", desired.parallel.as_sql()));
    }
    changes
}

fn routine_kind(routine: &Routine) -> ObjectKind {
    match routine.kind {
        RoutineKind::Function => ObjectKind::Function,
        RoutineKind::Procedure => ObjectKind::Procedure,
    }
}

fn comment_target(routine: &Routine) -> String {
    format!("{} {}", routine.kind.as_sql(), routine.signature())
}

// =============================================================================
// Aggregates
// =============================================================================

pub fn create_aggregate_steps(aggregate: &Aggregate) -> Vec<PlanStep> {
    let path = object_path(&aggregate.schema, &[&aggregate.key()]);
    let mut steps = vec![PlanStep::new(
        sqlgen::create_aggregate(aggregate),
        ObjectKind::Aggregate,
        Operation::Create,
        path.clone(),
    )];
    if let Some(comment) = comments::create_comment(
        ObjectKind::Aggregate,
        &format!("AGGREGATE {}", aggregate.signature()),
        &path,
        aggregate.comment.as_deref(),
    ) {
        steps.push(comment);
    }
    steps
}

pub fn drop_aggregate_step(aggregate: &Aggregate) -> PlanStep {
    PlanStep::new(
        sqlgen::drop_aggregate(aggregate),
        ObjectKind::Aggregate,
        Operation::Drop,
        object_path(&aggregate.schema, &[&aggregate.key()]),
    )
}

/// Aggregates have no alterable attributes the engine tracks; any change is
/// drop plus create.
pub fn alter_aggregate_steps(current: &Aggregate, desired: &Aggregate) -> Vec<PlanStep> {
    let mut steps = Vec::new();
    let definition_changed = current.transition_function != desired.transition_function
        || current.state_type != desired.state_type
        || current.final_function != desired.final_function
        || current.initial_condition != desired.initial_condition;
    if definition_changed {
        steps.push(drop_aggregate_step(current));
        steps.push(PlanStep::new(
            sqlgen::create_aggregate(desired),
            ObjectKind::Aggregate,
            Operation::Create,
            object_path(&desired.schema, &[&desired.key()]),
        ));
    }
    if let Some(step) = comments::diff_comment(
        ObjectKind::Aggregate,
        &format!("AGGREGATE {}", desired.signature()),
        &object_path(&desired.schema, &[&desired.key()]),
        current.comment.as_deref(),
        desired.comment.as_deref(),
    ) {
        steps.push(step);
    }
    steps
}
