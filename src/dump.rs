//! Canonical SQL rendering of a whole schema.
//!
//! A dump is the plan from an empty schema to the given one, rendered as a
//! plain statement list. Feeding the dump back through the parser yields an
//! IR equal to the dumped one, which is what keeps `plan(db, dump(db))`
//! empty.

use crate::error::PlanError;
use crate::ir::Schema;
use crate::plan;

/// The desired-state SQL file equivalent of an introspected schema.
pub fn dump_schema(schema: &Schema) -> Result<String, PlanError> {
    let empty = Schema::new(schema.name.clone(), schema.server_version);
    let plan = plan::diff_schemas(&empty, schema)?;

    let statements: Vec<String> = plan.diffs.into_iter().map(|step| step.sql).collect();
    if statements.is_empty() {
        return Ok(String::new());
    }
    let mut dump = statements.join("\n\n");
    dump.push('\n');
    Ok(dump)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Column, Constraint, ConstraintKind, Table};
    use crate::version::PgVersion;

    #[test]
    fn dump_orders_types_before_tables() {
        let mut schema = Schema::new("public", PgVersion::new(16));
        schema.types.insert(
            "mood".into(),
            crate::ir::TypeDef {
                schema: "public".into(),
                name: "mood".into(),
                kind: crate::ir::TypeKind::Enum {
                    labels: vec!["ok".into(), "bad".into()],
                },
                comment: None,
            },
        );
        let mut table = Table::new("public", "users");
        let mut id = Column::new("id", "integer");
        id.not_null = true;
        table.columns.push(id);
        table.columns.push(Column::new("current_mood", "mood"));
        table.constraints.insert(
            "users_pkey".into(),
            Constraint::new(
                "users_pkey",
                ConstraintKind::PrimaryKey {
                    columns: vec!["id".into()],
                },
            ),
        );
        schema.tables.insert("users".into(), table);

        let dump = dump_schema(&schema).unwrap();
        let type_pos = dump.find("CREATE TYPE mood").unwrap();
        let table_pos = dump.find("CREATE TABLE users").unwrap();
        assert!(type_pos < table_pos);
        assert!(dump.ends_with(";\n"));
    }

    #[test]
    fn empty_schema_dumps_empty() {
        let schema = Schema::new("public", PgVersion::new(16));
        assert_eq!(dump_schema(&schema).unwrap(), "");
    }
}
