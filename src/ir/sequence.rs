//! Standalone sequences.
//!
//! Sequences backing `serial` columns or identity columns are auto-managed
//! by PostgreSQL and are filtered out during introspection; only explicitly
//! created sequences appear here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub schema: String,
    pub name: String,
    /// `smallint`, `integer`, or `bigint`.
    pub data_type: String,
    pub start: i64,
    pub min_value: i64,
    pub max_value: i64,
    pub increment: i64,
    pub cache: i64,
    pub cycle: bool,
    /// `OWNED BY table.column`, applied as a separate step after the owning
    /// table exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<SequenceOwner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceOwner {
    pub table: String,
    pub column: String,
}

impl Sequence {
    /// Defaults PostgreSQL assigns to `CREATE SEQUENCE` with no options.
    pub fn with_defaults(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            data_type: "bigint".into(),
            start: 1,
            min_value: 1,
            max_value: i64::MAX,
            increment: 1,
            cache: 1,
            cycle: false,
            owned_by: None,
            comment: None,
        }
    }

    /// True when every attribute matches what `CREATE SEQUENCE` with no
    /// options produces, so the create statement can stay short.
    pub fn is_all_defaults(&self) -> bool {
        let defaults = Self::with_defaults(self.schema.clone(), self.name.clone());
        self.data_type == defaults.data_type
            && self.start == defaults.start
            && self.min_value == defaults.min_value
            && self.max_value == defaults.max_value
            && self.increment == defaults.increment
            && self.cache == defaults.cache
            && self.cycle == defaults.cycle
    }
}
