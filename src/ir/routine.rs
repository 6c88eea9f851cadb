//! Functions, procedures, and aggregates.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoutineKind {
    Function,
    Procedure,
}

impl RoutineKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Function => "FUNCTION",
            Self::Procedure => "PROCEDURE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Volatility {
    Immutable,
    Stable,
    Volatile,
}

impl Volatility {
    pub fn from_code(code: char) -> Self {
        match code {
            'i' => Self::Immutable,
            's' => Self::Stable,
            _ => Self::Volatile,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Immutable => "IMMUTABLE",
            Self::Stable => "STABLE",
            Self::Volatile => "VOLATILE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParallelSafety {
    Safe,
    Restricted,
    Unsafe,
}

impl ParallelSafety {
    pub fn from_code(code: char) -> Self {
        match code {
            's' => Self::Safe,
            'r' => Self::Restricted,
            _ => Self::Unsafe,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Restricted => "RESTRICTED",
            Self::Unsafe => "UNSAFE",
        }
    }
}

/// A function or procedure.
///
/// The body holds the complete `pg_get_functiondef` statement with the
/// schema qualifier on the routine name stripped, so that the same authored
/// routine introspected from two differently named schemas compares equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub schema: String,
    pub name: String,
    pub kind: RoutineKind,
    /// Full argument list from `pg_get_function_arguments`, with names,
    /// modes, and defaults.
    pub arguments: String,
    /// `pg_get_function_identity_arguments` output; part of the map key so
    /// overloads diff independently.
    pub identity_arguments: String,
    /// `pg_get_function_result` output; `None` for procedures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    pub language: String,
    pub volatility: Volatility,
    pub strict: bool,
    pub security_definer: bool,
    pub leakproof: bool,
    pub parallel: ParallelSafety,
    /// Complete `CREATE OR REPLACE` statement.
    pub body: String,
    /// Raw `prosrc`, used to distinguish body changes from attribute-only
    /// changes (the full body text embeds the attributes).
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Routine {
    /// Map key: `name(identity-argument-list)`.
    pub fn key(&self) -> String {
        format!("{}({})", self.name, self.identity_arguments)
    }

    /// Identity for `ALTER`/`DROP` statements, without argument names or
    /// defaults.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.identity_arguments)
    }
}

/// A user-defined aggregate, reconstructed from `pg_aggregate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub schema: String,
    pub name: String,
    pub arguments: String,
    pub identity_arguments: String,
    /// `sfunc`, possibly schema-qualified.
    pub transition_function: String,
    /// `stype` in `format_type` form.
    pub state_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Aggregate {
    pub fn key(&self) -> String {
        format!("{}({})", self.name, self.identity_arguments)
    }

    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.identity_arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overloads_get_distinct_keys() {
        let a = Routine {
            schema: "public".into(),
            name: "fmt".into(),
            kind: RoutineKind::Function,
            arguments: "v integer".into(),
            identity_arguments: "integer".into(),
            returns: Some("text".into()),
            language: "sql".into(),
            volatility: Volatility::Immutable,
            strict: false,
            security_definer: false,
            leakproof: false,
            parallel: ParallelSafety::Safe,
            body: String::new(),
            source: String::new(),
            comment: None,
        };
        let b = Routine {
            arguments: "v text".into(),
            identity_arguments: "text".into(),
            ..a.clone()
        };
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), "fmt(integer)");
    }
}
