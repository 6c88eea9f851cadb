//! pgschema - declarative schema migrations for PostgreSQL.
//!
//! A user-maintained SQL file expresses the desired state of a single
//! schema; this crate reconciles a live database against it. The pipeline
//! has one pivot, the intermediate representation: the live side is
//! introspected from the system catalogs, the authored side is applied to a
//! temporary schema on a real server and introspected the same way, and the
//! differ compares the two IRs structurally to assemble an ordered
//! migration plan.
//!
//! ```ignore
//! use pgschema::{diff_schemas, introspect_schema, parse_schema};
//!
//! let current = introspect_schema(&client, "public").await?;
//! let desired = parse_schema(&mut provider, "public", &sql, current.server_version).await?;
//! let plan = diff_schemas(&current, &desired)?;
//! println!("{}", plan.to_sql());
//! ```
//!
//! Out of scope here and owned by the surrounding tooling: the CLI,
//! connection management, the apply executor, and the concrete
//! desired-state providers (an embedded server or a scratch schema on the
//! target). The core consumes providers through
//! [`parse::DesiredStateProvider`].

pub mod diff;
pub mod dump;
pub mod error;
pub mod inspect;
pub mod ir;
pub mod normalize;
pub mod parse;
pub mod plan;
pub mod sqlgen;
pub mod version;

pub use dump::dump_schema;
pub use error::{
    DiffError, EngineError, IntrospectError, ParseError, PlanError, ProviderError,
};
pub use inspect::{introspect_schema, server_version};
pub use ir::Schema;
pub use parse::{DesiredStateProvider, parse_schema, temp_schema_name};
pub use plan::{Operation, Plan, PlanStep, diff_schemas};
pub use version::PgVersion;

/// End-to-end pipeline: introspect the live schema, parse the desired file,
/// and assemble the plan.
pub async fn plan<P: DesiredStateProvider>(
    client: &tokio_postgres::Client,
    provider: &mut P,
    schema_name: &str,
    desired_sql: &str,
) -> Result<Plan, EngineError> {
    let current = introspect_schema(client, schema_name).await?;
    let desired = parse_schema(provider, schema_name, desired_sql, current.server_version).await?;
    Ok(diff_schemas(&current, &desired)?)
}
