//! Desired-state provider contract.
//!
//! The parser needs a write-capable temporary schema on a real PostgreSQL
//! server of the same major version as the target. Concrete providers (an
//! embedded ephemeral server, or a scratch schema on the user's own server)
//! live outside the core; the core consumes only this trait.

use tokio_postgres::Client;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::version::PgVersion;

/// A transient writable namespace used to canonicalize authored SQL.
///
/// Lifecycle: the parser reads [`client`](DesiredStateProvider::client) and
/// [`temp_schema`](DesiredStateProvider::temp_schema), drives
/// [`apply`](DesiredStateProvider::apply) with rewritten statements, then
/// introspects the temporary schema over the same connection and calls
/// [`release`](DesiredStateProvider::release). Cleanup is best-effort; the
/// random schema name keeps a leaked namespace from colliding with anything.
pub trait DesiredStateProvider {
    /// Connection to the provider's server, valid until `release`.
    fn client(&self) -> &Client;

    /// The unique temporary schema name this invocation owns.
    fn temp_schema(&self) -> &str;

    /// Create the temporary schema if absent and point `search_path` at it
    /// (with `public` as fallback so extension types installed there still
    /// resolve), then execute the prepared statements.
    fn apply(
        &self,
        statements: &[String],
    ) -> impl Future<Output = Result<(), tokio_postgres::Error>> + Send;

    /// Drop the temporary schema and free resources.
    fn release(&mut self) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Generate a collision-proof temporary schema name,
/// `pgschema_tmp_<timestamp>_<random>`.
pub fn temp_schema_name() -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let random = Uuid::new_v4().simple().to_string();
    format!("pgschema_tmp_{timestamp}_{}", &random[..8])
}

/// The provider's server must run the same major version as the target;
/// deparser output differs across majors and would poison the comparison.
pub fn check_version_match(
    provider: PgVersion,
    target: PgVersion,
) -> Result<(), ProviderError> {
    if provider.major != target.major {
        return Err(ProviderError::VersionMismatch { provider, target });
    }
    Ok(())
}
