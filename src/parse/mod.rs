//! Desired-state parsing.
//!
//! No SQL is interpreted here beyond lexing. The authored file is split into
//! statements, screened, rewritten to target the provider's temporary
//! schema, applied to a real server, and then read back with the same
//! inspector that reads the live database. Whatever the server made of the
//! SQL is what the differ sees, so both pipeline sides share one
//! canonicalization by construction.

pub mod lexer;
pub mod provider;
pub mod rewrite;

pub use provider::{DesiredStateProvider, check_version_match, temp_schema_name};

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::inspect;
use crate::ir::{ConstraintKind, Schema};
use crate::normalize::fold_ident;
use crate::version::PgVersion;

/// Parse a desired-state file into the IR for `target_schema`.
///
/// `target_version` is the live database's major version; the provider must
/// match it exactly or the deparsers could disagree across the two sides.
pub async fn parse_schema<P: DesiredStateProvider>(
    provider: &mut P,
    target_schema: &str,
    sql: &str,
    target_version: PgVersion,
) -> Result<Schema, ParseError> {
    let target = fold_ident(target_schema);
    let temp_schema = provider.temp_schema().to_string();

    let mut statements = Vec::new();
    for statement in lexer::split_statements(sql) {
        rewrite::screen_statement(&statement)?;
        if creates_target_schema(&statement, &target) {
            // The namespace itself is the provider's concern.
            continue;
        }
        statements.push(rewrite::rewrite_statement(&statement, &target, &temp_schema));
    }
    debug!(
        statements = statements.len(),
        %temp_schema,
        "applying desired state to temporary schema"
    );

    let provider_version = inspect::server_version(provider.client()).await?;
    check_version_match(provider_version, target_version)?;

    provider
        .apply(&statements)
        .await
        .map_err(ParseError::from_db_error)?;

    let mut ir = inspect::introspect_schema(provider.client(), &temp_schema).await?;
    relabel(&mut ir, &target);

    if let Err(err) = provider.release().await {
        // Cleanup is best-effort; the random schema name cannot collide.
        warn!(error = %err, "failed to release temporary schema");
    }

    Ok(ir)
}

/// `CREATE SCHEMA <target>` in the authored file declares the namespace the
/// tool already manages.
fn creates_target_schema(statement: &str, target: &str) -> bool {
    let words = lexer::leading_keywords(statement, 6);
    let mut words = words.iter().map(|w| w.as_str());
    if words.next() != Some("CREATE") || words.next() != Some("SCHEMA") {
        return false;
    }
    let name = match words.next() {
        Some("IF") => words.nth(2),
        other => other,
    };
    name.is_some_and(|n| fold_ident(n) == target)
}

/// Rename the introspected temporary schema back to the authored one. The
/// deparsed texts are already qualifier-free for own-schema references, so
/// only the structural schema fields need the rename.
fn relabel(ir: &mut Schema, target: &str) {
    let temp = std::mem::replace(&mut ir.name, target.to_string());

    for table in ir.tables.values_mut() {
        table.schema = target.to_string();
        for constraint in table.constraints.values_mut() {
            if let ConstraintKind::ForeignKey { ref_schema, .. } = &mut constraint.kind
                && *ref_schema == temp
            {
                *ref_schema = target.to_string();
            }
        }
        for index in table.indexes.values_mut() {
            index.schema = target.to_string();
        }
    }
    for view in ir.views.values_mut() {
        view.schema = target.to_string();
    }
    for matview in ir.materialized_views.values_mut() {
        matview.schema = target.to_string();
        for index in matview.indexes.values_mut() {
            index.schema = target.to_string();
        }
    }
    for routine in ir.functions.values_mut().chain(ir.procedures.values_mut()) {
        routine.schema = target.to_string();
    }
    for aggregate in ir.aggregates.values_mut() {
        aggregate.schema = target.to_string();
    }
    for sequence in ir.sequences.values_mut() {
        sequence.schema = target.to_string();
    }
    for typedef in ir.types.values_mut() {
        typedef.schema = target.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_schema_statements_are_recognized() {
        assert!(creates_target_schema("CREATE SCHEMA public", "public"));
        assert!(creates_target_schema(
            "CREATE SCHEMA IF NOT EXISTS public",
            "public"
        ));
        assert!(!creates_target_schema("CREATE SCHEMA other", "public"));
        assert!(!creates_target_schema("CREATE TABLE public.t (x int)", "public"));
    }

    #[test]
    fn relabel_renames_structural_fields() {
        use crate::ir::{Constraint, FkAction, Table};
        use crate::version::PgVersion;

        let mut ir = Schema::new("pgschema_tmp_1_abc", PgVersion::new(16));
        let mut table = Table::new("pgschema_tmp_1_abc", "orders");
        table.constraints.insert(
            "orders_user_id_fkey".into(),
            Constraint::new(
                "orders_user_id_fkey",
                ConstraintKind::ForeignKey {
                    columns: vec!["user_id".into()],
                    ref_schema: "pgschema_tmp_1_abc".into(),
                    ref_table: "users".into(),
                    ref_columns: vec!["id".into()],
                    on_update: FkAction::NoAction,
                    on_delete: FkAction::NoAction,
                },
            ),
        );
        ir.tables.insert("orders".into(), table);

        relabel(&mut ir, "public");
        assert_eq!(ir.name, "public");
        let table = &ir.tables["orders"];
        assert_eq!(table.schema, "public");
        let ConstraintKind::ForeignKey { ref_schema, .. } =
            &table.constraints["orders_user_id_fkey"].kind
        else {
            panic!("expected foreign key");
        };
        assert_eq!(ref_schema, "public");
    }
}
