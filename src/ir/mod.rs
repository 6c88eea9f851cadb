//! Intermediate representation of a PostgreSQL schema.
//!
//! Both pipeline inputs, the live database and the desired-state file, are
//! funneled through catalog introspection, so every value here reflects what
//! the server itself produced: expressions are in `pg_get_expr` form, types
//! in `format_type` form, constraint text in `pg_get_constraintdef` form.
//! The differ compares these values structurally and never sees raw input
//! SQL.
//!
//! A [`Schema`] owns all top-level maps; nested entities (columns,
//! constraints, indexes, triggers, policies) are owned by their parent. All
//! maps are `BTreeMap` so iteration order, and therefore plan output, is
//! deterministic.

mod privilege;
mod routine;
mod sequence;
mod table;
mod typedef;
mod view;

pub use privilege::{DefaultPrivilege, Grant, GrantObject};
pub use routine::{Aggregate, ParallelSafety, Routine, RoutineKind, Volatility};
pub use sequence::{Sequence, SequenceOwner};
pub use table::{
    Column, ColumnIdentity, Constraint, ConstraintKind, FkAction, GeneratedColumn, IdentityKind,
    Index, IndexElement, Policy, PolicyCommand, Table, TableKind, Trigger, TriggerEvent,
    TriggerTiming,
};
pub use typedef::{CompositeField, DomainConstraint, TypeDef, TypeKind};
pub use view::{MaterializedView, View};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::version::PgVersion;

/// Everything the engine tracks for one schema.
///
/// Routines are keyed by `name(identity-argument-list)` so overloads compare
/// independently; every other map is keyed by bare object name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    pub server_version: PgVersion,
    pub tables: BTreeMap<String, Table>,
    pub views: BTreeMap<String, View>,
    pub materialized_views: BTreeMap<String, MaterializedView>,
    pub functions: BTreeMap<String, Routine>,
    pub procedures: BTreeMap<String, Routine>,
    pub aggregates: BTreeMap<String, Aggregate>,
    pub sequences: BTreeMap<String, Sequence>,
    pub types: BTreeMap<String, TypeDef>,
    /// Grants keyed by `object-kind:object:grantee`.
    pub grants: BTreeMap<String, Grant>,
    /// Default privileges keyed by `role:object-class:grantee`.
    pub default_privileges: BTreeMap<String, DefaultPrivilege>,
    pub comment: Option<String>,
}

impl Schema {
    pub fn new(name: impl Into<String>, server_version: PgVersion) -> Self {
        Self {
            name: name.into(),
            server_version,
            tables: BTreeMap::new(),
            views: BTreeMap::new(),
            materialized_views: BTreeMap::new(),
            functions: BTreeMap::new(),
            procedures: BTreeMap::new(),
            aggregates: BTreeMap::new(),
            sequences: BTreeMap::new(),
            types: BTreeMap::new(),
            grants: BTreeMap::new(),
            default_privileges: BTreeMap::new(),
            comment: None,
        }
    }

    /// True when the schema holds no objects at all.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.views.is_empty()
            && self.materialized_views.is_empty()
            && self.functions.is_empty()
            && self.procedures.is_empty()
            && self.aggregates.is_empty()
            && self.sequences.is_empty()
            && self.types.is_empty()
            && self.grants.is_empty()
            && self.default_privileges.is_empty()
    }
}

/// Kind discriminator carried on every plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Type,
    Sequence,
    Function,
    Procedure,
    Aggregate,
    Table,
    Column,
    Constraint,
    Index,
    Trigger,
    Policy,
    View,
    MaterializedView,
    Privilege,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Sequence => "sequence",
            Self::Function => "function",
            Self::Procedure => "procedure",
            Self::Aggregate => "aggregate",
            Self::Table => "table",
            Self::Column => "column",
            Self::Constraint => "constraint",
            Self::Index => "index",
            Self::Trigger => "trigger",
            Self::Policy => "policy",
            Self::View => "view",
            Self::MaterializedView => "materialized_view",
            Self::Privilege => "privilege",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
