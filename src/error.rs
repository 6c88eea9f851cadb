//! Error taxonomy for the reconciliation pipeline.
//!
//! Each component has its own error enum; every variant maps to a stable kind
//! code (`introspection.catalog`, `parse.syntax`, ...) that the surrounding
//! tooling uses for exit codes and rendering. Errors are never swallowed:
//! catalog failures name the query that failed, and parser errors keep the
//! server's SQLSTATE and message verbatim.

use crate::version::{MAX_SUPPORTED_MAJOR, MIN_SUPPORTED_MAJOR, PgVersion};

/// Introspection failures.
#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    /// A catalog query failed or returned rows the converter could not use.
    #[error("catalog query '{query}' failed: {source}")]
    Catalog {
        /// Identifier of the failing query, e.g. `tables` or `routines`.
        query: &'static str,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A catalog row carried data outside what the engine understands.
    #[error("catalog query '{query}' returned malformed data: {detail}")]
    Malformed { query: &'static str, detail: String },

    /// The connected server is outside the supported version window.
    #[error(
        "server version {version} is unsupported (supported: {MIN_SUPPORTED_MAJOR}-{MAX_SUPPORTED_MAJOR})"
    )]
    UnsupportedVersion { version: PgVersion },
}

impl IntrospectError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Catalog { .. } | Self::Malformed { .. } => "introspection.catalog",
            Self::UnsupportedVersion { .. } => "introspection.unsupported_version",
        }
    }
}

/// Desired-state parsing failures.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The server rejected the authored SQL. SQLSTATE and message are kept
    /// verbatim; `position` is the 1-based character offset when the server
    /// reported one.
    #[error("{message}")]
    Syntax {
        message: String,
        sqlstate: Option<String>,
        position: Option<u32>,
    },

    /// A statement that cannot execute inside a transaction appeared in the
    /// desired-state file.
    #[error("statement cannot run in a transaction and is not allowed in a desired-state file: {statement}")]
    UnsupportedStatement { statement: String },

    /// Introspecting the temporary schema after applying the SQL failed.
    #[error(transparent)]
    Introspect(#[from] IntrospectError),

    /// The desired-state provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ParseError {
    /// Build from a driver error, preserving SQLSTATE and position.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db) => Self::Syntax {
                message: db.message().to_string(),
                sqlstate: Some(db.code().code().to_string()),
                position: db.position().map(|p| match p {
                    tokio_postgres::error::ErrorPosition::Original(n) => *n,
                    tokio_postgres::error::ErrorPosition::Internal { position, .. } => *position,
                }),
            },
            None => Self::Syntax {
                message: err.to_string(),
                sqlstate: None,
                position: None,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "parse.syntax",
            Self::UnsupportedStatement { .. } => "parse.unsupported_statement",
            Self::Introspect(e) => e.kind(),
            Self::Provider(e) => e.kind(),
        }
    }
}

/// Diff failures.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A change with no in-place migration path, e.g. narrowing a column
    /// type across categories without a usable cast.
    #[error("no migration path for {object}: {detail}")]
    IncompatibleChange { object: String, detail: String },
}

impl DiffError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IncompatibleChange { .. } => "diff.incompatible_change",
        }
    }
}

/// Plan assembly failures.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The dependency graph could not be linearized even with shell-first
    /// emission. Should not occur for supported object kinds.
    #[error("dependency cycle involving {objects:?}")]
    Cycle { objects: Vec<String> },

    #[error(transparent)]
    Diff(#[from] DiffError),
}

impl PlanError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cycle { .. } => "plan.cycle",
            Self::Diff(e) => e.kind(),
        }
    }
}

/// Desired-state provider failures.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider's server major version differs from the target's.
    #[error("provider runs PostgreSQL {provider} but the target runs {target}; majors must match")]
    VersionMismatch {
        provider: PgVersion,
        target: PgVersion,
    },

    /// Executing DDL against the temporary schema failed outside the user's
    /// own statements (schema creation, search_path, cleanup).
    #[error("desired-state provider failed: {0}")]
    Backend(String),
}

impl ProviderError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VersionMismatch { .. } => "provider.version_mismatch",
            Self::Backend(_) => "provider.backend",
        }
    }
}

/// Umbrella error for the end-to-end plan pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Introspect(#[from] IntrospectError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Introspect(e) => e.kind(),
            Self::Parse(e) => e.kind(),
            Self::Plan(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_are_stable() {
        let err = IntrospectError::UnsupportedVersion {
            version: PgVersion::new(12),
        };
        assert_eq!(err.kind(), "introspection.unsupported_version");

        let err = ParseError::UnsupportedStatement {
            statement: "CREATE INDEX CONCURRENTLY ...".into(),
        };
        assert_eq!(err.kind(), "parse.unsupported_statement");

        let err = DiffError::IncompatibleChange {
            object: "public.users.id".into(),
            detail: "integer -> point".into(),
        };
        assert_eq!(err.kind(), "diff.incompatible_change");

        let err = PlanError::Cycle { objects: vec![] };
        assert_eq!(err.kind(), "plan.cycle");

        let err = ProviderError::VersionMismatch {
            provider: PgVersion::new(15),
            target: PgVersion::new(16),
        };
        assert_eq!(err.kind(), "provider.version_mismatch");
    }

    #[test]
    fn unsupported_version_message_names_window() {
        let err = IntrospectError::UnsupportedVersion {
            version: PgVersion::new(13),
        };
        let text = err.to_string();
        assert!(text.contains("13"));
        assert!(text.contains("14-18"));
    }
}
