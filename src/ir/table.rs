//! Tables and the entities they own: columns, constraints, indexes,
//! triggers, and row-level-security policies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Relation kind as stored in `pg_class.relkind`. Views and materialized
/// views live in their own maps; this only distinguishes partitioned tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableKind {
    Ordinary,
    Partitioned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub kind: TableKind,
    /// `pg_get_partkeydef` output, e.g. `RANGE (created_at)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_by: Option<String>,
    pub rls_enabled: bool,
    /// Ordered by attribute number.
    pub columns: Vec<Column>,
    pub constraints: BTreeMap<String, Constraint>,
    pub indexes: BTreeMap<String, Index>,
    pub triggers: BTreeMap<String, Trigger>,
    pub policies: BTreeMap<String, Policy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind: TableKind::Ordinary,
            partition_by: None,
            rls_enabled: false,
            columns: Vec::new(),
            constraints: BTreeMap::new(),
            indexes: BTreeMap::new(),
            triggers: BTreeMap::new(),
            policies: BTreeMap::new(),
            comment: None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The table's primary key, if any.
    pub fn primary_key(&self) -> Option<&Constraint> {
        self.constraints
            .values()
            .find(|c| matches!(c.kind, ConstraintKind::PrimaryKey { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    /// Attribute number; informational only, the differ compares by name.
    pub position: i32,
    /// `format_type` output with the qualification policy applied: own-schema
    /// and `pg_catalog` types unqualified, other user schemas qualified.
    pub data_type: String,
    pub not_null: bool,
    /// Normalized default expression. Same-schema function calls are
    /// unqualified so both pipeline sides agree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated: Option<GeneratedColumn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<ColumnIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: 0,
            data_type: data_type.into(),
            not_null: false,
            default: None,
            generated: None,
            identity: None,
            comment: None,
        }
    }
}

/// A `GENERATED ALWAYS AS (...) STORED` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedColumn {
    pub expression: String,
}

/// A `GENERATED ... AS IDENTITY` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnIdentity {
    pub kind: IdentityKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentityKind {
    Always,
    ByDefault,
}

impl IdentityKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Always => "ALWAYS",
            Self::ByDefault => "BY DEFAULT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub deferrable: bool,
    pub initially_deferred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Constraint {
    pub fn new(name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            kind,
            deferrable: false,
            initially_deferred: false,
            comment: None,
        }
    }

    /// True for kinds that may be declared inline in `CREATE TABLE`. Foreign
    /// keys are always separate steps so that mutually referencing tables
    /// never need topological backtracking.
    pub fn inline_in_create_table(&self) -> bool {
        !matches!(self.kind, ConstraintKind::ForeignKey { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ConstraintKind {
    PrimaryKey {
        columns: Vec<String>,
    },
    Unique {
        columns: Vec<String>,
        nulls_not_distinct: bool,
    },
    ForeignKey {
        columns: Vec<String>,
        ref_schema: String,
        ref_table: String,
        ref_columns: Vec<String>,
        on_update: FkAction,
        on_delete: FkAction,
    },
    Check {
        /// Canonical expression text without the outer `CHECK (...)`.
        expression: String,
        no_inherit: bool,
    },
    Exclude {
        /// Canonical `pg_get_constraintdef` text, e.g.
        /// `EXCLUDE USING gist (room WITH =, during WITH &&)`.
        definition: String,
    },
}

/// Referential action stored as a single character in
/// `pg_constraint.confupdtype` / `confdeltype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FkAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl FkAction {
    pub fn from_code(code: char) -> Self {
        match code {
            'r' => Self::Restrict,
            'c' => Self::Cascade,
            'n' => Self::SetNull,
            'd' => Self::SetDefault,
            _ => Self::NoAction,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// Access method, e.g. `btree` or `gist`.
    pub method: String,
    pub unique: bool,
    pub nulls_not_distinct: bool,
    pub elements: Vec<IndexElement>,
    /// `INCLUDE` columns, in order.
    pub include: Vec<String>,
    /// Partial-index predicate from `pg_get_expr(indpred, ...)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One key element of an index: either a column reference or a parenthesized
/// expression, with its ordering modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexElement {
    /// Column name, or expression text for expression elements.
    pub expression: String,
    pub is_expression: bool,
    pub descending: bool,
    pub nulls_first: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opclass: Option<String>,
}

impl IndexElement {
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            expression: name.into(),
            is_expression: false,
            descending: false,
            nulls_first: false,
            collation: None,
            opclass: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

impl TriggerTiming {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Before => "BEFORE",
            Self::After => "AFTER",
            Self::InsteadOf => "INSTEAD OF",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum TriggerEvent {
    Insert,
    Update {
        /// `UPDATE OF col, ...` column list; empty for plain `UPDATE`.
        columns: Vec<String>,
    },
    Delete,
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub name: String,
    pub timing: TriggerTiming,
    pub events: Vec<TriggerEvent>,
    pub for_each_row: bool,
    /// `WHEN` predicate from `pg_get_expr(tgqual, tgrelid)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Full `EXECUTE FUNCTION` call, e.g. `audit('users')`.
    pub function_call: String,
    pub constraint: bool,
    pub deferrable: bool,
    pub initially_deferred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Trigger {
    /// Bare function name from the call text, without qualifier or
    /// arguments. Used for dependency edges.
    pub fn function_name(&self) -> &str {
        let head = self
            .function_call
            .split('(')
            .next()
            .unwrap_or(&self.function_call);
        head.rsplit('.').next().unwrap_or(head).trim_matches('"')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyCommand {
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl PolicyCommand {
    pub fn from_code(code: char) -> Self {
        match code {
            'r' => Self::Select,
            'a' => Self::Insert,
            'w' => Self::Update,
            'd' => Self::Delete,
            _ => Self::All,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub name: String,
    pub command: PolicyCommand,
    pub permissive: bool,
    /// Role names; `["public"]` when the policy applies to everyone.
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub using: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_check: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_function_name_strips_qualifier_and_args() {
        let trigger = Trigger {
            name: "t".into(),
            timing: TriggerTiming::Before,
            events: vec![TriggerEvent::Insert],
            for_each_row: true,
            when: None,
            function_call: "audit.log_change('users', 'insert')".into(),
            constraint: false,
            deferrable: false,
            initially_deferred: false,
            comment: None,
        };
        assert_eq!(trigger.function_name(), "log_change");
    }

    #[test]
    fn fk_action_codes_round_trip() {
        for (code, sql) in [
            ('a', "NO ACTION"),
            ('r', "RESTRICT"),
            ('c', "CASCADE"),
            ('n', "SET NULL"),
            ('d', "SET DEFAULT"),
        ] {
            assert_eq!(FkAction::from_code(code).as_sql(), sql);
        }
    }

    #[test]
    fn foreign_keys_are_never_inlined() {
        let fk = Constraint::new(
            "orders_user_id_fkey",
            ConstraintKind::ForeignKey {
                columns: vec!["user_id".into()],
                ref_schema: "public".into(),
                ref_table: "users".into(),
                ref_columns: vec!["id".into()],
                on_update: FkAction::NoAction,
                on_delete: FkAction::Cascade,
            },
        );
        assert!(!fk.inline_in_create_table());

        let pk = Constraint::new(
            "users_pkey",
            ConstraintKind::PrimaryKey {
                columns: vec!["id".into()],
            },
        );
        assert!(pk.inline_in_create_table());
    }
}
