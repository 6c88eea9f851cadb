//! Comment steps.
//!
//! A comment-only change emits exactly one `COMMENT ON` statement and
//! nothing else; object creations carry their comments as trailing steps.

use crate::ir::ObjectKind;
use crate::plan::{Operation, PlanStep};
use crate::sqlgen;

/// Emit a comment step when current and desired comments differ.
pub(crate) fn diff_comment(
    kind: ObjectKind,
    target: &str,
    path: &str,
    current: Option<&str>,
    desired: Option<&str>,
) -> Option<PlanStep> {
    if current == desired {
        return None;
    }
    Some(PlanStep::new(
        sqlgen::comment_on(target, desired),
        kind,
        Operation::Alter,
        path,
    ))
}

/// Emit the comment step for a freshly created object.
pub(crate) fn create_comment(
    kind: ObjectKind,
    target: &str,
    path: &str,
    comment: Option<&str>,
) -> Option<PlanStep> {
    comment.map(|text| {
        PlanStep::new(
            sqlgen::comment_on(target, Some(text)),
            kind,
            Operation::Alter,
            path,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_comment_emits_nothing() {
        assert!(
            diff_comment(
                ObjectKind::Table,
                "TABLE users",
                "public.users",
                Some("x"),
                Some("x")
            )
            .is_none()
        );
    }

    #[test]
    fn cleared_comment_sets_null() {
        let step = diff_comment(
            ObjectKind::Table,
            "TABLE users",
            "public.users",
            Some("x"),
            None,
        )
        .unwrap();
        assert_eq!(step.sql, "COMMENT ON TABLE users IS NULL;");
        assert_eq!(step.operation, Operation::Alter);
    }
}
