//! Sequence comparison. Attribute changes alter in place; ownership moves
//! through a separate `OWNED BY` step so the owning table can be created
//! first.

use crate::ir::{ObjectKind, Sequence};
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;

use super::{comments, object_path};

/// Creation without the `OWNED BY` linkage; the assembler emits ownership
/// via [`owned_by_step`] after tables exist.
pub fn create_steps(sequence: &Sequence) -> Vec<PlanStep> {
    let path = object_path(&sequence.schema, &[&sequence.name]);
    let mut steps = vec![PlanStep::new(
        sqlgen::create_sequence(sequence),
        ObjectKind::Sequence,
        Operation::Create,
        path.clone(),
    )];
    if let Some(comment) = comments::create_comment(
        ObjectKind::Sequence,
        &comment_target(sequence),
        &path,
        sequence.comment.as_deref(),
    ) {
        steps.push(comment);
    }
    steps
}

pub fn drop_step(sequence: &Sequence) -> PlanStep {
    PlanStep::new(
        sqlgen::drop_sequence(sequence),
        ObjectKind::Sequence,
        Operation::Drop,
        object_path(&sequence.schema, &[&sequence.name]),
    )
}

pub fn owned_by_step(sequence: &Sequence) -> PlanStep {
    PlanStep::new(
        sqlgen::alter_sequence_owned_by(sequence),
        ObjectKind::Sequence,
        Operation::Alter,
        object_path(&sequence.schema, &[&sequence.name]),
    )
}

/// Attribute and comment changes. Ownership changes are reported separately
/// through [`ownership_change`] so the assembler can schedule them after the
/// owning table exists.
pub fn alter_steps(current: &Sequence, desired: &Sequence) -> Vec<PlanStep> {
    let path = object_path(&desired.schema, &[&desired.name]);
    let mut steps = Vec::new();

    if let Some(sql) = sqlgen::alter_sequence(current, desired) {
        steps.push(PlanStep::new(
            sql,
            ObjectKind::Sequence,
            Operation::Alter,
            path.clone(),
        ));
    }
    if let Some(step) = comments::diff_comment(
        ObjectKind::Sequence,
        &comment_target(desired),
        &path,
        current.comment.as_deref(),
        desired.comment.as_deref(),
    ) {
        steps.push(step);
    }
    steps
}

/// The `OWNED BY` step for a changed linkage, if any.
pub fn ownership_change(current: &Sequence, desired: &Sequence) -> Option<PlanStep> {
    (current.owned_by != desired.owned_by).then(|| owned_by_step(desired))
}

fn comment_target(sequence: &Sequence) -> String {
    format!("SEQUENCE {}", crate::normalize::quote_ident(&sequence.name))
}
