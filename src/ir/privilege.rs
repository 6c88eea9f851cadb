//! Grants and default privileges.
//!
//! Privileges are compared as sets per grantee. Owner-implicit privileges
//! (grantor and grantee both the owner) are filtered during introspection so
//! that a freshly created object diffs clean.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrantObject {
    Table,
    Sequence,
    Function,
}

impl GrantObject {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::Sequence => "SEQUENCE",
            Self::Function => "FUNCTION",
        }
    }

    pub fn key_fragment(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Sequence => "sequence",
            Self::Function => "function",
        }
    }
}

/// Privileges one grantee holds on one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub object_kind: GrantObject,
    /// Object name; `name(identity args)` for functions.
    pub object: String,
    pub grantee: String,
    pub privileges: BTreeSet<String>,
}

impl Grant {
    pub fn key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.object_kind.key_fragment(),
            self.object,
            self.grantee
        )
    }
}

/// One `ALTER DEFAULT PRIVILEGES` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultPrivilege {
    /// Role whose object creations the default applies to.
    pub role: String,
    /// `TABLES`, `SEQUENCES`, `FUNCTIONS`, or `TYPES`.
    pub object_class: String,
    pub grantee: String,
    pub privileges: BTreeSet<String>,
}

impl DefaultPrivilege {
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.role, self.object_class, self.grantee)
    }
}
