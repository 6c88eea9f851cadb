//! SQL-script rendering of a plan.
//!
//! The script is what `plan --format sql` prints and what the apply executor
//! feeds statement by statement: a header comment, one statement per block,
//! blank lines between blocks, and a `-- pgschema:wait` marker with a
//! polling query after every concurrent index build.

use crate::plan::{Plan, PlanStep};

/// Marker the apply executor recognizes; the statement following it is
/// polled until it returns no rows.
pub const WAIT_MARKER: &str = "-- pgschema:wait";

pub(crate) fn render_script(plan: &Plan) -> String {
    let mut blocks: Vec<String> = Vec::new();

    blocks.push(format!(
        "-- pgschema migration\n-- pgschema version: {}\n-- PostgreSQL version: {}\n-- generated at: {}",
        plan.pgschema_version, plan.pg_version, plan.created_at
    ));

    // Deparsed routine bodies may reference objects created later in the
    // same script; pg_dump disables body validation the same way.
    if !plan.diffs.is_empty() {
        blocks.push("SET check_function_bodies = false;".to_string());
    }

    for step in &plan.diffs {
        blocks.push(step.sql.clone());
        if step.needs_wait_marker() {
            blocks.push(wait_block(step));
        }
    }

    let mut script = blocks.join("\n\n");
    script.push('\n');
    script
}

fn wait_block(step: &PlanStep) -> String {
    let index_name = step.path.rsplit('.').next().unwrap_or(&step.path);
    format!(
        "{WAIT_MARKER}\nSELECT 1 FROM pg_stat_progress_create_index WHERE index_relid = to_regclass('{index_name}');"
    )
}

#[cfg(test)]
mod tests {
    use crate::ir::ObjectKind;
    use crate::plan::{Operation, Plan, PlanStep};
    use crate::version::PgVersion;

    use super::*;

    #[test]
    fn script_has_header_and_blank_line_separation() {
        let plan = Plan::new(
            PgVersion::new(16),
            vec![
                PlanStep::new(
                    "CREATE TABLE users (\n    id integer NOT NULL\n);",
                    ObjectKind::Table,
                    Operation::Create,
                    "public.users",
                ),
                PlanStep::new(
                    "COMMENT ON TABLE users IS 'app users';",
                    ObjectKind::Table,
                    Operation::Alter,
                    "public.users",
                ),
            ],
        );
        let script = plan.to_sql();
        assert!(script.starts_with("-- pgschema migration\n"));
        assert!(script.contains("-- PostgreSQL version: 16\n"));
        assert!(script.contains(");\n\nCOMMENT ON TABLE users"));
        assert!(script.ends_with(";\n"));
    }

    #[test]
    fn concurrent_index_gets_wait_marker() {
        let plan = Plan::new(
            PgVersion::new(16),
            vec![
                PlanStep::new(
                    "CREATE INDEX CONCURRENTLY users_email_idx ON users USING btree (email);",
                    ObjectKind::Index,
                    Operation::Create,
                    "public.users.users_email_idx",
                )
                .non_transactional(),
            ],
        );
        let script = plan.to_sql();
        let marker_pos = script.find(WAIT_MARKER).unwrap();
        let index_pos = script.find("CREATE INDEX CONCURRENTLY").unwrap();
        assert!(marker_pos > index_pos);
        assert!(script.contains("pg_stat_progress_create_index"));
        assert!(script.contains("to_regclass('users_email_idx')"));
    }

    #[test]
    fn empty_plan_renders_header_only() {
        let plan = Plan::new(PgVersion::new(15), vec![]);
        let script = plan.to_sql();
        assert!(script.starts_with("-- pgschema migration\n"));
        assert!(!script.contains("check_function_bodies"));
    }
}
