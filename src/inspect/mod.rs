//! Catalog introspection: build the IR for one schema from a live
//! connection.
//!
//! The inspector is strictly read-only. Any failing catalog query aborts
//! the whole introspection with the query attributed in the error; there
//! are no partial IRs.

pub mod convert;
pub mod queries;
pub mod raw;

pub use convert::RawCatalog;

use tokio_postgres::{Client, Row};
use tracing::debug;

use crate::error::IntrospectError;
use crate::ir::Schema;
use crate::version::PgVersion;

/// Major version of the connected server.
pub async fn server_version(client: &Client) -> Result<PgVersion, IntrospectError> {
    let row = client
        .query_one(queries::SERVER_VERSION, &[])
        .await
        .map_err(|source| IntrospectError::Catalog {
            query: "server_version",
            source,
        })?;
    let num: i32 = row
        .try_get(0)
        .map_err(|source| IntrospectError::Catalog {
            query: "server_version",
            source,
        })?;
    Ok(PgVersion::from_version_num(num))
}

/// Introspect one schema into the IR.
pub async fn introspect_schema(
    client: &Client,
    schema: &str,
) -> Result<Schema, IntrospectError> {
    let version = server_version(client).await?;
    if !version.is_supported() {
        return Err(IntrospectError::UnsupportedVersion { version });
    }
    debug!(schema, %version, "introspecting schema");

    let raw = fetch_catalog(client, schema).await?;
    let ir = convert::assemble_schema(schema, version, raw)?;
    debug!(
        schema,
        tables = ir.tables.len(),
        views = ir.views.len(),
        functions = ir.functions.len(),
        "introspection complete"
    );
    Ok(ir)
}

/// Run every catalog query for one schema. The queries are independent and
/// read-committed consistency is enough here: the caller owns the
/// connection and nothing else writes to the schema mid-introspection.
async fn fetch_catalog(client: &Client, schema: &str) -> Result<RawCatalog, IntrospectError> {
    let schema_comment: Option<String> = match client
        .query_opt(queries::SCHEMA_COMMENT, &[&schema])
        .await
        .map_err(|source| IntrospectError::Catalog {
            query: "schema_comment",
            source,
        })? {
        Some(row) => row
            .try_get("comment")
            .map_err(|source| IntrospectError::Catalog {
                query: "schema_comment",
                source,
            })?,
        None => None,
    };

    Ok(RawCatalog {
        schema_comment,
        tables: fetch(client, "tables", queries::TABLES, schema, raw::RawTable::from_row).await?,
        columns: fetch(
            client,
            "columns",
            queries::COLUMNS,
            schema,
            raw::RawColumn::from_row,
        )
        .await?,
        constraints: fetch(
            client,
            "constraints",
            queries::CONSTRAINTS,
            schema,
            raw::RawConstraint::from_row,
        )
        .await?,
        indexes: fetch(
            client,
            "indexes",
            queries::INDEXES,
            schema,
            raw::RawIndex::from_row,
        )
        .await?,
        triggers: fetch(
            client,
            "triggers",
            queries::TRIGGERS,
            schema,
            raw::RawTrigger::from_row,
        )
        .await?,
        policies: fetch(
            client,
            "policies",
            queries::POLICIES,
            schema,
            raw::RawPolicy::from_row,
        )
        .await?,
        views: fetch(client, "views", queries::VIEWS, schema, raw::RawView::from_row).await?,
        materialized_views: fetch(
            client,
            "materialized_views",
            queries::MATERIALIZED_VIEWS,
            schema,
            raw::RawMaterializedView::from_row,
        )
        .await?,
        routines: fetch(
            client,
            "routines",
            queries::ROUTINES,
            schema,
            raw::RawRoutine::from_row,
        )
        .await?,
        aggregates: fetch(
            client,
            "aggregates",
            queries::AGGREGATES,
            schema,
            raw::RawAggregate::from_row,
        )
        .await?,
        sequences: fetch(
            client,
            "sequences",
            queries::SEQUENCES,
            schema,
            raw::RawSequence::from_row,
        )
        .await?,
        enums: fetch(client, "enums", queries::ENUMS, schema, raw::RawEnum::from_row).await?,
        composites: fetch(
            client,
            "composites",
            queries::COMPOSITES,
            schema,
            raw::RawComposite::from_row,
        )
        .await?,
        domains: fetch(
            client,
            "domains",
            queries::DOMAINS,
            schema,
            raw::RawDomain::from_row,
        )
        .await?,
        relation_grants: fetch(
            client,
            "relation_grants",
            queries::RELATION_GRANTS,
            schema,
            raw::RawRelationGrant::from_row,
        )
        .await?,
        routine_grants: fetch(
            client,
            "routine_grants",
            queries::ROUTINE_GRANTS,
            schema,
            raw::RawRoutineGrant::from_row,
        )
        .await?,
        default_privileges: fetch(
            client,
            "default_privileges",
            queries::DEFAULT_PRIVILEGES,
            schema,
            raw::RawDefaultPrivilege::from_row,
        )
        .await?,
    })
}

async fn fetch<T>(
    client: &Client,
    query_id: &'static str,
    sql: &str,
    schema: &str,
    decode: impl Fn(&Row) -> Result<T, tokio_postgres::Error>,
) -> Result<Vec<T>, IntrospectError> {
    let rows = client
        .query(sql, &[&schema])
        .await
        .map_err(|source| IntrospectError::Catalog {
            query: query_id,
            source,
        })?;
    rows.iter()
        .map(|row| {
            decode(row).map_err(|source| IntrospectError::Catalog {
                query: query_id,
                source,
            })
        })
        .collect()
}
