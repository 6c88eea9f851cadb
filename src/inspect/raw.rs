//! Row-shaped structs matching the catalog queries, decoded with
//! `tokio_postgres` by column name. The converter turns these into IR.

use tokio_postgres::Row;

type DecodeResult<T> = Result<T, tokio_postgres::Error>;

#[derive(Debug, Clone)]
pub struct RawTable {
    pub name: String,
    pub kind: String,
    pub rls_enabled: bool,
    pub partition_by: Option<String>,
    pub comment: Option<String>,
}

impl RawTable {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            kind: row.try_get("kind")?,
            rls_enabled: row.try_get("rls_enabled")?,
            partition_by: row.try_get("partition_by")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawColumn {
    pub table: String,
    pub name: String,
    pub position: i16,
    pub data_type: String,
    pub type_schema: String,
    pub not_null: bool,
    pub identity: String,
    pub generated: String,
    pub default_expr: Option<String>,
    pub comment: Option<String>,
}

impl RawColumn {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            table: row.try_get("table")?,
            name: row.try_get("name")?,
            position: row.try_get("position")?,
            data_type: row.try_get("data_type")?,
            type_schema: row.try_get("type_schema")?,
            not_null: row.try_get("not_null")?,
            identity: row.try_get("identity")?,
            generated: row.try_get("generated")?,
            default_expr: row.try_get("default_expr")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawConstraint {
    pub table: String,
    pub name: String,
    pub kind: String,
    pub deferrable: bool,
    pub initially_deferred: bool,
    pub no_inherit: bool,
    pub definition: String,
    pub columns: Vec<String>,
    pub ref_schema: Option<String>,
    pub ref_table: Option<String>,
    pub ref_columns: Vec<String>,
    pub on_update: String,
    pub on_delete: String,
    pub comment: Option<String>,
}

impl RawConstraint {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            table: row.try_get("table")?,
            name: row.try_get("name")?,
            kind: row.try_get("kind")?,
            deferrable: row.try_get("deferrable")?,
            initially_deferred: row.try_get("initially_deferred")?,
            no_inherit: row.try_get("no_inherit")?,
            definition: row.try_get("definition")?,
            columns: row.try_get("columns")?,
            ref_schema: row.try_get("ref_schema")?,
            ref_table: row.try_get("ref_table")?,
            ref_columns: row.try_get("ref_columns")?,
            on_update: row.try_get("on_update")?,
            on_delete: row.try_get("on_delete")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawIndex {
    pub table: String,
    pub table_kind: String,
    pub name: String,
    pub method: String,
    pub is_unique: bool,
    pub key_columns: i16,
    pub predicate: Option<String>,
    pub definition: String,
    pub elements: Vec<String>,
    pub comment: Option<String>,
}

impl RawIndex {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            table: row.try_get("table")?,
            table_kind: row.try_get("table_kind")?,
            name: row.try_get("name")?,
            method: row.try_get("method")?,
            is_unique: row.try_get("is_unique")?,
            key_columns: row.try_get("key_columns")?,
            predicate: row.try_get("predicate")?,
            definition: row.try_get("definition")?,
            elements: row.try_get("elements")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawTrigger {
    pub table: String,
    pub name: String,
    pub tgtype: i16,
    pub is_constraint: bool,
    pub deferrable: bool,
    pub initially_deferred: bool,
    pub when_expr: Option<String>,
    pub definition: String,
    pub update_columns: Vec<String>,
    pub comment: Option<String>,
}

impl RawTrigger {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            table: row.try_get("table")?,
            name: row.try_get("name")?,
            tgtype: row.try_get("tgtype")?,
            is_constraint: row.try_get("is_constraint")?,
            deferrable: row.try_get("deferrable")?,
            initially_deferred: row.try_get("initially_deferred")?,
            when_expr: row.try_get("when_expr")?,
            definition: row.try_get("definition")?,
            update_columns: row.try_get("update_columns")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawPolicy {
    pub table: String,
    pub name: String,
    pub command: String,
    pub permissive: bool,
    pub roles: Vec<String>,
    pub using_expr: Option<String>,
    pub with_check_expr: Option<String>,
    pub comment: Option<String>,
}

impl RawPolicy {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            table: row.try_get("table")?,
            name: row.try_get("name")?,
            command: row.try_get("command")?,
            permissive: row.try_get("permissive")?,
            roles: row.try_get("roles")?,
            using_expr: row.try_get("using_expr")?,
            with_check_expr: row.try_get("with_check_expr")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawView {
    pub name: String,
    pub definition: String,
    pub options: Option<Vec<String>>,
    pub comment: Option<String>,
}

impl RawView {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            definition: row.try_get("definition")?,
            options: row.try_get("options")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawMaterializedView {
    pub name: String,
    pub definition: String,
    pub comment: Option<String>,
}

impl RawMaterializedView {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            definition: row.try_get("definition")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawRoutine {
    pub name: String,
    pub kind: String,
    pub arguments: String,
    pub identity_arguments: String,
    pub returns: Option<String>,
    pub body: String,
    pub source: String,
    pub language: String,
    pub volatility: String,
    pub strict: bool,
    pub security_definer: bool,
    pub leakproof: bool,
    pub parallel: String,
    pub comment: Option<String>,
}

impl RawRoutine {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            kind: row.try_get("kind")?,
            arguments: row.try_get("arguments")?,
            identity_arguments: row.try_get("identity_arguments")?,
            returns: row.try_get("returns")?,
            body: row.try_get("body")?,
            source: row.try_get("source")?,
            language: row.try_get("language")?,
            volatility: row.try_get("volatility")?,
            strict: row.try_get("strict")?,
            security_definer: row.try_get("security_definer")?,
            leakproof: row.try_get("leakproof")?,
            parallel: row.try_get("parallel")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawAggregate {
    pub name: String,
    pub arguments: String,
    pub identity_arguments: String,
    pub transition_function: String,
    pub state_type: String,
    pub final_function: Option<String>,
    pub initial_condition: Option<String>,
    pub comment: Option<String>,
}

impl RawAggregate {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            arguments: row.try_get("arguments")?,
            identity_arguments: row.try_get("identity_arguments")?,
            transition_function: row.try_get("transition_function")?,
            state_type: row.try_get("state_type")?,
            final_function: row.try_get("final_function")?,
            initial_condition: row.try_get("initial_condition")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawSequence {
    pub name: String,
    pub data_type: String,
    pub start: i64,
    pub min_value: i64,
    pub max_value: i64,
    pub increment: i64,
    pub cache: i64,
    pub cycle: bool,
    pub owner_table: Option<String>,
    pub owner_column: Option<String>,
    pub owner_deptype: Option<String>,
    pub comment: Option<String>,
}

impl RawSequence {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            data_type: row.try_get("data_type")?,
            start: row.try_get("start")?,
            min_value: row.try_get("min_value")?,
            max_value: row.try_get("max_value")?,
            increment: row.try_get("increment")?,
            cache: row.try_get("cache")?,
            cycle: row.try_get("cycle")?,
            owner_table: row.try_get("owner_table")?,
            owner_column: row.try_get("owner_column")?,
            owner_deptype: row.try_get("owner_deptype")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawEnum {
    pub name: String,
    pub labels: Vec<String>,
    pub comment: Option<String>,
}

impl RawEnum {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            labels: row.try_get("labels")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawComposite {
    pub name: String,
    pub field_names: Vec<String>,
    pub field_types: Vec<String>,
    pub comment: Option<String>,
}

impl RawComposite {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            field_names: row.try_get("field_names")?,
            field_types: row.try_get("field_types")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawDomain {
    pub name: String,
    pub base_type: String,
    pub not_null: bool,
    pub default_expr: Option<String>,
    pub constraint_names: Vec<String>,
    pub constraint_defs: Vec<String>,
    pub comment: Option<String>,
}

impl RawDomain {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            base_type: row.try_get("base_type")?,
            not_null: row.try_get("not_null")?,
            default_expr: row.try_get("default_expr")?,
            constraint_names: row.try_get("constraint_names")?,
            constraint_defs: row.try_get("constraint_defs")?,
            comment: row.try_get("comment")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawRelationGrant {
    pub object: String,
    pub kind: String,
    pub grantee: String,
    pub privilege: String,
}

impl RawRelationGrant {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            object: row.try_get("object")?,
            kind: row.try_get("kind")?,
            grantee: row.try_get("grantee")?,
            privilege: row.try_get("privilege")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawRoutineGrant {
    pub object: String,
    pub identity_arguments: String,
    pub grantee: String,
    pub privilege: String,
}

impl RawRoutineGrant {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            object: row.try_get("object")?,
            identity_arguments: row.try_get("identity_arguments")?,
            grantee: row.try_get("grantee")?,
            privilege: row.try_get("privilege")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawDefaultPrivilege {
    pub role: String,
    pub object_type: String,
    pub grantee: String,
    pub privilege: String,
}

impl RawDefaultPrivilege {
    pub fn from_row(row: &Row) -> DecodeResult<Self> {
        Ok(Self {
            role: row.try_get("role")?,
            object_type: row.try_get("object_type")?,
            grantee: row.try_get("grantee")?,
            privilege: row.try_get("privilege")?,
        })
    }
}
