//! Views and materialized views.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::table::Index;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub schema: String,
    pub name: String,
    /// Canonical body from `pg_get_viewdef(oid, true)`, without a trailing
    /// semicolon.
    pub definition: String,
    /// `local` or `cascaded` when `WITH CHECK OPTION` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_option: Option<String>,
    pub security_barrier: bool,
    pub security_invoker: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializedView {
    pub schema: String,
    pub name: String,
    pub definition: String,
    /// Matview indexes; recreated when the matview itself is recreated.
    pub indexes: BTreeMap<String, Index>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
