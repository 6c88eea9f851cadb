//! Migration plans: the ordered list of DDL steps the differ produces and
//! the apply executor consumes.

pub mod assemble;
pub mod deps;
pub mod render;

pub use assemble::diff_schemas;

use serde::{Deserialize, Serialize};

use crate::ir::ObjectKind;
use crate::version::PgVersion;

/// Envelope version of the JSON serialization.
pub const PLAN_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Drop,
    Alter,
}

/// One DDL statement with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub sql: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub operation: Operation,
    /// Dotted path of the object, e.g. `public.users.status`.
    pub path: String,
    pub can_run_in_transaction: bool,
    /// Path of the owning object for sub-object steps (constraints, indexes,
    /// triggers, policies, columns), `None` for top-level objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl PlanStep {
    pub fn new(
        sql: impl Into<String>,
        kind: ObjectKind,
        operation: Operation,
        path: impl Into<String>,
    ) -> Self {
        Self {
            sql: sql.into(),
            kind,
            operation,
            path: path.into(),
            can_run_in_transaction: true,
            source: None,
        }
    }

    /// Mark the step as unable to run inside a transaction
    /// (`CREATE INDEX CONCURRENTLY`, `ALTER TYPE ... ADD VALUE`).
    pub fn non_transactional(mut self) -> Self {
        self.can_run_in_transaction = false;
        self
    }

    pub fn owned_by(mut self, parent: impl Into<String>) -> Self {
        self.source = Some(parent.into());
        self
    }

    /// True for steps that need a progress-poll marker in script output.
    pub fn needs_wait_marker(&self) -> bool {
        !self.can_run_in_transaction && self.sql.contains("CONCURRENTLY")
    }
}

/// The assembled migration plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub version: u32,
    pub pgschema_version: String,
    pub created_at: String,
    /// Target server major version the plan was computed against.
    pub pg_version: PgVersion,
    /// True when every step can run inside one transaction.
    pub transaction: bool,
    pub diffs: Vec<PlanStep>,
}

impl Plan {
    pub fn new(pg_version: PgVersion, diffs: Vec<PlanStep>) -> Self {
        let transaction = diffs.iter().all(|s| s.can_run_in_transaction);
        Self {
            version: PLAN_FORMAT_VERSION,
            pgschema_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            pg_version,
            transaction,
            diffs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// JSON serialization of the plan envelope.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Executable SQL script with the leading header comment.
    pub fn to_sql(&self) -> String {
        render::render_script(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(sql: &str) -> PlanStep {
        PlanStep::new(sql, ObjectKind::Table, Operation::Create, "public.t")
    }

    #[test]
    fn transaction_flag_is_the_and_of_step_flags() {
        let plan = Plan::new(PgVersion::new(16), vec![step("CREATE TABLE t ();")]);
        assert!(plan.transaction);

        let plan = Plan::new(
            PgVersion::new(16),
            vec![
                step("CREATE TABLE t ();"),
                PlanStep::new(
                    "CREATE INDEX CONCURRENTLY i ON t (a);",
                    ObjectKind::Index,
                    Operation::Create,
                    "public.t.i",
                )
                .non_transactional(),
            ],
        );
        assert!(!plan.transaction);
    }

    #[test]
    fn json_round_trip_keeps_steps() {
        let plan = Plan::new(PgVersion::new(15), vec![step("CREATE TABLE t ();")]);
        let json = plan.to_json().unwrap();
        assert!(json.contains("\"type\": \"table\""));
        assert!(json.contains("\"operation\": \"create\""));
        let back = Plan::from_json(&json).unwrap();
        assert_eq!(back.diffs, plan.diffs);
        assert_eq!(back.transaction, plan.transaction);
    }

    #[test]
    fn wait_marker_only_for_concurrent_steps() {
        let concurrent = PlanStep::new(
            "CREATE INDEX CONCURRENTLY i ON t (a);",
            ObjectKind::Index,
            Operation::Create,
            "public.t.i",
        )
        .non_transactional();
        assert!(concurrent.needs_wait_marker());

        let enum_value = PlanStep::new(
            "ALTER TYPE mood ADD VALUE 'great';",
            ObjectKind::Type,
            Operation::Alter,
            "public.mood",
        )
        .non_transactional();
        assert!(!enum_value.needs_wait_marker());
    }
}
