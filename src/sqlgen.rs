//! DDL statement generation from IR entities.
//!
//! Objects in the target schema are emitted unqualified; the apply contract
//! sets `search_path` to the target schema. Cross-schema references (foreign
//! key targets, types from other schemas) keep their qualifier.

use crate::ir::{
    Aggregate, Column, Constraint, ConstraintKind, DefaultPrivilege, Grant, Index, IndexElement,
    MaterializedView, Policy, Routine, Sequence, Table, TableKind, Trigger, TriggerEvent, TypeDef,
    TypeKind, View,
};
use crate::normalize::{
    is_serial_default, nextval_sequence, quote_ident, quote_literal, quote_qualified,
    serial_sequence_name,
};

// =============================================================================
// Tables and columns
// =============================================================================

/// `CREATE TABLE` with columns and inline constraints. Foreign keys are never
/// inlined; they are separate `ADD CONSTRAINT` steps so that mutually
/// referencing tables create cleanly in any order.
pub fn create_table(table: &Table) -> String {
    let mut parts: Vec<String> = Vec::new();

    for column in &table.columns {
        parts.push(format!("    {}", column_definition(table, column)));
    }

    for constraint in table.constraints.values() {
        if !constraint.inline_in_create_table() {
            continue;
        }
        parts.push(format!(
            "    CONSTRAINT {} {}",
            quote_ident(&constraint.name),
            constraint_definition(&table.schema, constraint)
        ));
    }

    let mut sql = format!("CREATE TABLE {} (\n", quote_ident(&table.name));
    sql.push_str(&parts.join(",\n"));
    sql.push_str("\n)");
    if table.kind == TableKind::Partitioned
        && let Some(partition_by) = &table.partition_by
    {
        sql.push_str(&format!(" PARTITION BY {partition_by}"));
    }
    sql.push(';');
    sql
}

pub fn drop_table(table: &Table) -> String {
    format!("DROP TABLE {};", quote_ident(&table.name))
}

/// Column clause for `CREATE TABLE` / `ADD COLUMN`.
///
/// A column whose default is the `nextval` of its own serial sequence is
/// collapsed back to the `serial` shorthand, because the backing sequence is
/// auto-managed and never appears in the plan on its own.
pub fn column_definition(table: &Table, column: &Column) -> String {
    let mut parts = vec![quote_ident(&column.name)];

    let serial_type = serial_shorthand(table, column);
    match &serial_type {
        Some(shorthand) => parts.push((*shorthand).to_string()),
        None => parts.push(column.data_type.clone()),
    }

    if let Some(generated) = &column.generated {
        parts.push(format!("GENERATED ALWAYS AS ({}) STORED", generated.expression));
    }
    if let Some(identity) = &column.identity {
        parts.push(format!("GENERATED {} AS IDENTITY", identity.kind.as_sql()));
    }
    if serial_type.is_none()
        && let Some(default) = &column.default
    {
        parts.push(format!("DEFAULT {default}"));
    }
    if column.not_null && serial_type.is_none() {
        parts.push("NOT NULL".to_string());
    }

    parts.join(" ")
}

/// The `serial`/`bigserial`/`smallserial` shorthand for a column, when its
/// default is the conventional sequence for that column.
fn serial_shorthand(table: &Table, column: &Column) -> Option<&'static str> {
    let default = column.default.as_deref()?;
    if !is_serial_default(default, &table.schema) {
        return None;
    }
    if nextval_sequence(default)? != serial_sequence_name(&table.name, &column.name) {
        return None;
    }
    match column.data_type.as_str() {
        "integer" => Some("serial"),
        "bigint" => Some("bigserial"),
        "smallint" => Some("smallserial"),
        _ => None,
    }
}

/// `ADD COLUMN`, optionally carrying a single-column PK or UNIQUE declared
/// together with the column.
pub fn add_column(table: &Table, column: &Column, inline: Option<&Constraint>) -> String {
    let mut sql = format!(
        "ALTER TABLE {} ADD COLUMN {}",
        quote_ident(&table.name),
        column_definition(table, column)
    );
    if let Some(constraint) = inline {
        match &constraint.kind {
            ConstraintKind::PrimaryKey { .. } => sql.push_str(" PRIMARY KEY"),
            ConstraintKind::Unique { .. } => sql.push_str(" UNIQUE"),
            _ => {}
        }
    }
    sql.push(';');
    sql
}

pub fn drop_column(table: &Table, column: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {};",
        quote_ident(&table.name),
        quote_ident(column)
    )
}

pub fn alter_column_type(table: &Table, column: &Column, using: Option<&str>) -> String {
    let mut sql = format!(
        "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
        quote_ident(&table.name),
        quote_ident(&column.name),
        column.data_type
    );
    if let Some(using) = using {
        sql.push_str(&format!(" USING {using}"));
    }
    sql.push(';');
    sql
}

pub fn alter_column_not_null(table: &Table, column: &str, not_null: bool) -> String {
    let action = if not_null { "SET" } else { "DROP" };
    format!(
        "ALTER TABLE {} ALTER COLUMN {} {action} NOT NULL;",
        quote_ident(&table.name),
        quote_ident(column)
    )
}

pub fn alter_column_default(table: &Table, column: &str, default: Option<&str>) -> String {
    match default {
        Some(expr) => format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};",
            quote_ident(&table.name),
            quote_ident(column),
            expr
        ),
        None => format!(
            "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;",
            quote_ident(&table.name),
            quote_ident(column)
        ),
    }
}

pub fn alter_column_add_identity(table: &Table, column: &Column) -> Option<String> {
    let identity = column.identity.as_ref()?;
    Some(format!(
        "ALTER TABLE {} ALTER COLUMN {} ADD GENERATED {} AS IDENTITY;",
        quote_ident(&table.name),
        quote_ident(&column.name),
        identity.kind.as_sql()
    ))
}

pub fn alter_column_set_identity_kind(table: &Table, column: &Column) -> Option<String> {
    let identity = column.identity.as_ref()?;
    Some(format!(
        "ALTER TABLE {} ALTER COLUMN {} SET GENERATED {};",
        quote_ident(&table.name),
        quote_ident(&column.name),
        identity.kind.as_sql()
    ))
}

pub fn alter_column_drop_identity(table: &Table, column: &str) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {} DROP IDENTITY;",
        quote_ident(&table.name),
        quote_ident(column)
    )
}

pub fn alter_column_drop_expression(table: &Table, column: &str) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {} DROP EXPRESSION;",
        quote_ident(&table.name),
        quote_ident(column)
    )
}

pub fn enable_row_level_security(table: &Table) -> String {
    format!(
        "ALTER TABLE {} ENABLE ROW LEVEL SECURITY;",
        quote_ident(&table.name)
    )
}

pub fn disable_row_level_security(table: &Table) -> String {
    format!(
        "ALTER TABLE {} DISABLE ROW LEVEL SECURITY;",
        quote_ident(&table.name)
    )
}

// =============================================================================
// Constraints
// =============================================================================

pub fn add_constraint(table: &Table, constraint: &Constraint) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} {};",
        quote_ident(&table.name),
        quote_ident(&constraint.name),
        constraint_definition(&table.schema, constraint)
    )
}

pub fn drop_constraint(table: &Table, name: &str) -> String {
    format!(
        "ALTER TABLE {} DROP CONSTRAINT {};",
        quote_ident(&table.name),
        quote_ident(name)
    )
}

/// Constraint body after `CONSTRAINT <name>`.
pub fn constraint_definition(own_schema: &str, constraint: &Constraint) -> String {
    let mut sql = match &constraint.kind {
        ConstraintKind::PrimaryKey { columns } => {
            format!("PRIMARY KEY ({})", quoted_list(columns))
        }
        ConstraintKind::Unique {
            columns,
            nulls_not_distinct,
        } => {
            let modifier = if *nulls_not_distinct {
                " NULLS NOT DISTINCT"
            } else {
                ""
            };
            format!("UNIQUE{modifier} ({})", quoted_list(columns))
        }
        ConstraintKind::ForeignKey {
            columns,
            ref_schema,
            ref_table,
            ref_columns,
            on_update,
            on_delete,
        } => {
            let mut fk = format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                quoted_list(columns),
                quote_qualified(own_schema, ref_schema, ref_table),
                quoted_list(ref_columns)
            );
            if *on_update != crate::ir::FkAction::NoAction {
                fk.push_str(&format!(" ON UPDATE {}", on_update.as_sql()));
            }
            if *on_delete != crate::ir::FkAction::NoAction {
                fk.push_str(&format!(" ON DELETE {}", on_delete.as_sql()));
            }
            fk
        }
        ConstraintKind::Check {
            expression,
            no_inherit,
        } => {
            let modifier = if *no_inherit { " NO INHERIT" } else { "" };
            format!("CHECK ({expression}){modifier}")
        }
        ConstraintKind::Exclude { definition } => definition.clone(),
    };
    if constraint.deferrable {
        sql.push_str(" DEFERRABLE");
        if constraint.initially_deferred {
            sql.push_str(" INITIALLY DEFERRED");
        }
    }
    sql
}

fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Indexes
// =============================================================================

pub fn create_index(index: &Index, concurrently: bool) -> String {
    let unique = if index.unique { "UNIQUE " } else { "" };
    let concurrent = if concurrently { "CONCURRENTLY " } else { "" };
    let elements = index
        .elements
        .iter()
        .map(index_element)
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "CREATE {unique}INDEX {concurrent}{} ON {} USING {} ({elements})",
        quote_ident(&index.name),
        quote_ident(&index.table),
        index.method
    );
    if !index.include.is_empty() {
        sql.push_str(&format!(" INCLUDE ({})", quoted_list(&index.include)));
    }
    if index.nulls_not_distinct {
        sql.push_str(" NULLS NOT DISTINCT");
    }
    if let Some(predicate) = &index.predicate {
        sql.push_str(&format!(" WHERE {predicate}"));
    }
    sql.push(';');
    sql
}

pub fn drop_index(index: &Index) -> String {
    format!("DROP INDEX {};", quote_ident(&index.name))
}

fn index_element(element: &IndexElement) -> String {
    let mut sql = if element.is_expression {
        element.expression.clone()
    } else {
        quote_ident(&element.expression)
    };
    if let Some(collation) = &element.collation {
        sql.push_str(&format!(" COLLATE {}", quote_ident(collation)));
    }
    if let Some(opclass) = &element.opclass {
        sql.push_str(&format!(" {opclass}"));
    }
    if element.descending {
        sql.push_str(" DESC");
    }
    if element.nulls_first && !element.descending {
        sql.push_str(" NULLS FIRST");
    } else if !element.nulls_first && element.descending {
        sql.push_str(" NULLS LAST");
    }
    sql
}

// =============================================================================
// Triggers
// =============================================================================

pub fn create_trigger(table: &Table, trigger: &Trigger, or_replace: bool) -> String {
    let replace = if or_replace { "OR REPLACE " } else { "" };
    let kind = if trigger.constraint {
        "CONSTRAINT TRIGGER"
    } else {
        "TRIGGER"
    };
    let events = trigger
        .events
        .iter()
        .map(trigger_event)
        .collect::<Vec<_>>()
        .join(" OR ");

    let mut sql = format!(
        "CREATE {replace}{kind} {} {} {events} ON {}",
        quote_ident(&trigger.name),
        trigger.timing.as_sql(),
        quote_ident(&table.name)
    );
    if trigger.constraint && trigger.deferrable {
        sql.push_str(" DEFERRABLE");
        if trigger.initially_deferred {
            sql.push_str(" INITIALLY DEFERRED");
        }
    }
    sql.push_str(if trigger.for_each_row {
        " FOR EACH ROW"
    } else {
        " FOR EACH STATEMENT"
    });
    if let Some(when) = &trigger.when {
        sql.push_str(&format!(" WHEN ({when})"));
    }
    sql.push_str(&format!(" EXECUTE FUNCTION {};", trigger.function_call));
    sql
}

pub fn drop_trigger(table: &Table, name: &str) -> String {
    format!(
        "DROP TRIGGER {} ON {};",
        quote_ident(name),
        quote_ident(&table.name)
    )
}

fn trigger_event(event: &TriggerEvent) -> String {
    match event {
        TriggerEvent::Insert => "INSERT".to_string(),
        TriggerEvent::Delete => "DELETE".to_string(),
        TriggerEvent::Truncate => "TRUNCATE".to_string(),
        TriggerEvent::Update { columns } if columns.is_empty() => "UPDATE".to_string(),
        TriggerEvent::Update { columns } => format!("UPDATE OF {}", quoted_list(columns)),
    }
}

// =============================================================================
// Policies
// =============================================================================

pub fn create_policy(table: &Table, policy: &Policy) -> String {
    let mut sql = format!(
        "CREATE POLICY {} ON {}",
        quote_ident(&policy.name),
        quote_ident(&table.name)
    );
    if !policy.permissive {
        sql.push_str(" AS RESTRICTIVE");
    }
    if policy.command != crate::ir::PolicyCommand::All {
        sql.push_str(&format!(" FOR {}", policy.command.as_sql()));
    }
    sql.push_str(&format!(" TO {}", role_list(&policy.roles)));
    if let Some(using) = &policy.using {
        sql.push_str(&format!(" USING ({using})"));
    }
    if let Some(with_check) = &policy.with_check {
        sql.push_str(&format!(" WITH CHECK ({with_check})"));
    }
    sql.push(';');
    sql
}

/// `ALTER POLICY` can change roles and expressions, but not the command or
/// the permissive flag; callers fall back to drop and create for those.
pub fn alter_policy(table: &Table, policy: &Policy) -> String {
    let mut sql = format!(
        "ALTER POLICY {} ON {} TO {}",
        quote_ident(&policy.name),
        quote_ident(&table.name),
        role_list(&policy.roles)
    );
    if let Some(using) = &policy.using {
        sql.push_str(&format!(" USING ({using})"));
    }
    if let Some(with_check) = &policy.with_check {
        sql.push_str(&format!(" WITH CHECK ({with_check})"));
    }
    sql.push(';');
    sql
}

pub fn drop_policy(table: &Table, name: &str) -> String {
    format!(
        "DROP POLICY {} ON {};",
        quote_ident(name),
        quote_ident(&table.name)
    )
}

fn role_list(roles: &[String]) -> String {
    if roles.is_empty() {
        return "PUBLIC".to_string();
    }
    roles
        .iter()
        .map(|r| {
            if r.eq_ignore_ascii_case("public") {
                "PUBLIC".to_string()
            } else {
                quote_ident(r)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Views and materialized views
// =============================================================================

pub fn create_view(view: &View, or_replace: bool) -> String {
    let replace = if or_replace { "OR REPLACE " } else { "" };
    let mut options = Vec::new();
    if view.security_barrier {
        options.push("security_barrier=true".to_string());
    }
    if view.security_invoker {
        options.push("security_invoker=true".to_string());
    }
    let with = if options.is_empty() {
        String::new()
    } else {
        format!(" WITH ({})", options.join(", "))
    };

    let mut sql = format!(
        "CREATE {replace}VIEW {}{with} AS\n{}",
        quote_ident(&view.name),
        view.definition
    );
    if let Some(check_option) = &view.check_option {
        sql.push_str(&format!(
            "\nWITH {} CHECK OPTION",
            check_option.to_uppercase()
        ));
    }
    sql.push(';');
    sql
}

pub fn drop_view(view: &View) -> String {
    format!("DROP VIEW {};", quote_ident(&view.name))
}

pub fn create_materialized_view(matview: &MaterializedView) -> String {
    format!(
        "CREATE MATERIALIZED VIEW {} AS\n{};",
        quote_ident(&matview.name),
        matview.definition
    )
}

pub fn drop_materialized_view(matview: &MaterializedView) -> String {
    format!("DROP MATERIALIZED VIEW {};", quote_ident(&matview.name))
}

// =============================================================================
// Routines
// =============================================================================

/// The routine body is already a complete `CREATE OR REPLACE` statement from
/// `pg_get_functiondef`; it only needs a terminator.
pub fn create_routine(routine: &Routine) -> String {
    let body = routine.body.trim_end();
    if body.ends_with(';') {
        body.to_string()
    } else {
        format!("{body};")
    }
}

pub fn drop_routine(routine: &Routine) -> String {
    format!("DROP {} {};", routine.kind.as_sql(), routine.signature())
}

/// One `ALTER FUNCTION` per changed attribute.
pub fn alter_routine_attribute(routine: &Routine, attribute: &str) -> String {
    format!(
        "ALTER {} {} {attribute};",
        routine.kind.as_sql(),
        routine.signature()
    )
}

pub fn create_aggregate(aggregate: &Aggregate) -> String {
    let mut clauses = vec![
        format!("SFUNC = {}", aggregate.transition_function),
        format!("STYPE = {}", aggregate.state_type),
    ];
    if let Some(final_function) = &aggregate.final_function {
        clauses.push(format!("FINALFUNC = {final_function}"));
    }
    if let Some(initial) = &aggregate.initial_condition {
        clauses.push(format!("INITCOND = {}", quote_literal(initial)));
    }
    format!(
        "CREATE AGGREGATE {} (\n    {}\n);",
        aggregate.signature(),
        clauses.join(",\n    ")
    )
}

pub fn drop_aggregate(aggregate: &Aggregate) -> String {
    format!("DROP AGGREGATE {};", aggregate.signature())
}

// =============================================================================
// Sequences
// =============================================================================

pub fn create_sequence(sequence: &Sequence) -> String {
    if sequence.is_all_defaults() {
        return format!("CREATE SEQUENCE {};", quote_ident(&sequence.name));
    }
    let mut sql = format!("CREATE SEQUENCE {}", quote_ident(&sequence.name));
    if sequence.data_type != "bigint" {
        sql.push_str(&format!(" AS {}", sequence.data_type));
    }
    sql.push_str(&format!(" INCREMENT BY {}", sequence.increment));
    sql.push_str(&format!(" MINVALUE {}", sequence.min_value));
    sql.push_str(&format!(" MAXVALUE {}", sequence.max_value));
    sql.push_str(&format!(" START WITH {}", sequence.start));
    sql.push_str(&format!(" CACHE {}", sequence.cache));
    if sequence.cycle {
        sql.push_str(" CYCLE");
    }
    sql.push(';');
    sql
}

pub fn drop_sequence(sequence: &Sequence) -> String {
    format!("DROP SEQUENCE {};", quote_ident(&sequence.name))
}

pub fn alter_sequence(current: &Sequence, desired: &Sequence) -> Option<String> {
    let mut clauses = Vec::new();
    if current.data_type != desired.data_type {
        clauses.push(format!("AS {}", desired.data_type));
    }
    if current.increment != desired.increment {
        clauses.push(format!("INCREMENT BY {}", desired.increment));
    }
    if current.min_value != desired.min_value {
        clauses.push(format!("MINVALUE {}", desired.min_value));
    }
    if current.max_value != desired.max_value {
        clauses.push(format!("MAXVALUE {}", desired.max_value));
    }
    if current.start != desired.start {
        clauses.push(format!("START WITH {}", desired.start));
    }
    if current.cache != desired.cache {
        clauses.push(format!("CACHE {}", desired.cache));
    }
    if current.cycle != desired.cycle {
        clauses.push(if desired.cycle { "CYCLE" } else { "NO CYCLE" }.to_string());
    }
    if clauses.is_empty() {
        return None;
    }
    Some(format!(
        "ALTER SEQUENCE {} {};",
        quote_ident(&desired.name),
        clauses.join(" ")
    ))
}

pub fn alter_sequence_owned_by(sequence: &Sequence) -> String {
    match &sequence.owned_by {
        Some(owner) => format!(
            "ALTER SEQUENCE {} OWNED BY {}.{};",
            quote_ident(&sequence.name),
            quote_ident(&owner.table),
            quote_ident(&owner.column)
        ),
        None => format!(
            "ALTER SEQUENCE {} OWNED BY NONE;",
            quote_ident(&sequence.name)
        ),
    }
}

// =============================================================================
// Types
// =============================================================================

pub fn create_type(typedef: &TypeDef) -> String {
    match &typedef.kind {
        TypeKind::Enum { labels } => {
            let labels = labels
                .iter()
                .map(|l| quote_literal(l))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "CREATE TYPE {} AS ENUM ({labels});",
                quote_ident(&typedef.name)
            )
        }
        TypeKind::Composite { fields } => {
            let fields = fields
                .iter()
                .map(|f| format!("    {} {}", quote_ident(&f.name), f.data_type))
                .collect::<Vec<_>>()
                .join(",\n");
            format!(
                "CREATE TYPE {} AS (\n{fields}\n);",
                quote_ident(&typedef.name)
            )
        }
        TypeKind::Domain {
            base_type,
            not_null,
            default,
            constraints,
        } => {
            let mut sql = format!(
                "CREATE DOMAIN {} AS {base_type}",
                quote_ident(&typedef.name)
            );
            if let Some(default) = default {
                sql.push_str(&format!(" DEFAULT {default}"));
            }
            if *not_null {
                sql.push_str(" NOT NULL");
            }
            for constraint in constraints {
                sql.push_str(&format!(
                    " CONSTRAINT {} CHECK ({})",
                    quote_ident(&constraint.name),
                    constraint.check
                ));
            }
            sql.push(';');
            sql
        }
    }
}

pub fn drop_type(typedef: &TypeDef) -> String {
    match typedef.kind {
        TypeKind::Domain { .. } => format!("DROP DOMAIN {};", quote_ident(&typedef.name)),
        _ => format!("DROP TYPE {};", quote_ident(&typedef.name)),
    }
}

/// Placement of a new enum label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumValuePosition<'a> {
    /// Appended at the end; plain `ADD VALUE`.
    Last,
    Before(&'a str),
    After(&'a str),
}

/// `ALTER TYPE ... ADD VALUE`, anchored so label order is preserved.
pub fn alter_enum_add_value(
    typedef: &TypeDef,
    label: &str,
    position: EnumValuePosition<'_>,
) -> String {
    let mut sql = format!(
        "ALTER TYPE {} ADD VALUE {}",
        quote_ident(&typedef.name),
        quote_literal(label)
    );
    match position {
        EnumValuePosition::Last => {}
        EnumValuePosition::Before(anchor) => {
            sql.push_str(&format!(" BEFORE {}", quote_literal(anchor)));
        }
        EnumValuePosition::After(anchor) => {
            sql.push_str(&format!(" AFTER {}", quote_literal(anchor)));
        }
    }
    sql.push(';');
    sql
}

// =============================================================================
// Privileges
// =============================================================================

pub fn grant(privilege: &Grant) -> String {
    format!(
        "GRANT {} ON {} {} TO {};",
        privilege
            .privileges
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
        privilege.object_kind.as_sql(),
        privilege.object,
        grantee_name(&privilege.grantee)
    )
}

pub fn revoke(privilege: &Grant, privileges: &[String]) -> String {
    format!(
        "REVOKE {} ON {} {} FROM {};",
        privileges.join(", "),
        privilege.object_kind.as_sql(),
        privilege.object,
        grantee_name(&privilege.grantee)
    )
}

pub fn alter_default_privileges_grant(default: &DefaultPrivilege) -> String {
    format!(
        "ALTER DEFAULT PRIVILEGES FOR ROLE {} GRANT {} ON {} TO {};",
        quote_ident(&default.role),
        default
            .privileges
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
        default.object_class,
        grantee_name(&default.grantee)
    )
}

pub fn alter_default_privileges_revoke(default: &DefaultPrivilege) -> String {
    format!(
        "ALTER DEFAULT PRIVILEGES FOR ROLE {} REVOKE {} ON {} FROM {};",
        quote_ident(&default.role),
        default
            .privileges
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
        default.object_class,
        grantee_name(&default.grantee)
    )
}

fn grantee_name(grantee: &str) -> String {
    if grantee.eq_ignore_ascii_case("public") {
        "PUBLIC".to_string()
    } else {
        quote_ident(grantee)
    }
}

// =============================================================================
// Comments
// =============================================================================

/// `COMMENT ON <target> IS ...`; `None` clears the comment.
pub fn comment_on(target: &str, comment: Option<&str>) -> String {
    match comment {
        Some(text) => format!("COMMENT ON {target} IS {};", quote_literal(text)),
        None => format!("COMMENT ON {target} IS NULL;"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ColumnIdentity, FkAction, IdentityKind, PolicyCommand, TriggerTiming};

    fn table_with(columns: Vec<Column>) -> Table {
        let mut table = Table::new("public", "users");
        table.columns = columns;
        table
    }

    #[test]
    fn create_table_inlines_pk_but_not_fk() {
        let mut table = table_with(vec![
            {
                let mut c = Column::new("id", "integer");
                c.not_null = true;
                c
            },
            Column::new("org_id", "integer"),
        ]);
        table.constraints.insert(
            "users_pkey".into(),
            Constraint::new(
                "users_pkey",
                ConstraintKind::PrimaryKey {
                    columns: vec!["id".into()],
                },
            ),
        );
        table.constraints.insert(
            "users_org_id_fkey".into(),
            Constraint::new(
                "users_org_id_fkey",
                ConstraintKind::ForeignKey {
                    columns: vec!["org_id".into()],
                    ref_schema: "public".into(),
                    ref_table: "orgs".into(),
                    ref_columns: vec!["id".into()],
                    on_update: FkAction::NoAction,
                    on_delete: FkAction::NoAction,
                },
            ),
        );

        let sql = create_table(&table);
        assert!(sql.contains("CONSTRAINT users_pkey PRIMARY KEY (id)"));
        assert!(!sql.contains("FOREIGN KEY"));
    }

    #[test]
    fn serial_columns_collapse_to_shorthand() {
        let mut column = Column::new("id", "integer");
        column.not_null = true;
        column.default = Some("nextval('users_id_seq'::regclass)".into());
        let table = table_with(vec![column.clone()]);

        assert_eq!(column_definition(&table, &column), "id serial");
    }

    #[test]
    fn default_renders_before_not_null() {
        let mut column = Column::new("status", "text");
        column.not_null = true;
        column.default = Some("def_status()".into());
        let table = table_with(vec![column.clone()]);

        assert_eq!(
            add_column(&table, &column, None),
            "ALTER TABLE users ADD COLUMN status text DEFAULT def_status() NOT NULL;"
        );
    }

    #[test]
    fn identity_column_definition() {
        let mut column = Column::new("id", "bigint");
        column.not_null = true;
        column.identity = Some(ColumnIdentity {
            kind: IdentityKind::Always,
        });
        let table = table_with(vec![column.clone()]);
        assert_eq!(
            column_definition(&table, &column),
            "id bigint GENERATED ALWAYS AS IDENTITY NOT NULL"
        );
    }

    #[test]
    fn composite_fk_definition() {
        let constraint = Constraint::new(
            "fk_task_project_phase",
            ConstraintKind::ForeignKey {
                columns: vec!["project_id".into(), "phase_id".into()],
                ref_schema: "public".into(),
                ref_table: "projects".into(),
                ref_columns: vec!["project_id".into(), "phase_id".into()],
                on_update: FkAction::NoAction,
                on_delete: FkAction::NoAction,
            },
        );
        let mut table = Table::new("public", "tasks");
        table.columns.push(Column::new("project_id", "integer"));

        assert_eq!(
            add_constraint(&table, &constraint),
            "ALTER TABLE tasks ADD CONSTRAINT fk_task_project_phase FOREIGN KEY (project_id, phase_id) REFERENCES projects (project_id, phase_id);"
        );
    }

    #[test]
    fn concurrent_index_statement() {
        let index = Index {
            schema: "public".into(),
            table: "users".into(),
            name: "users_email_idx".into(),
            method: "btree".into(),
            unique: false,
            nulls_not_distinct: false,
            elements: vec![IndexElement::column("email")],
            include: vec![],
            predicate: None,
            comment: None,
        };
        assert_eq!(
            create_index(&index, true),
            "CREATE INDEX CONCURRENTLY users_email_idx ON users USING btree (email);"
        );
    }

    #[test]
    fn partial_expression_index() {
        let index = Index {
            schema: "public".into(),
            table: "users".into(),
            name: "users_lower_email_idx".into(),
            method: "btree".into(),
            unique: true,
            nulls_not_distinct: false,
            elements: vec![IndexElement {
                expression: "lower(email)".into(),
                is_expression: true,
                descending: false,
                nulls_first: false,
                collation: None,
                opclass: None,
            }],
            include: vec![],
            predicate: Some("(deleted_at IS NULL)".into()),
            comment: None,
        };
        assert_eq!(
            create_index(&index, false),
            "CREATE UNIQUE INDEX users_lower_email_idx ON users USING btree (lower(email)) WHERE (deleted_at IS NULL);"
        );
    }

    #[test]
    fn trigger_with_when_clause() {
        let table = Table::new("public", "test_table");
        let trigger = Trigger {
            name: "t".into(),
            timing: TriggerTiming::Before,
            events: vec![TriggerEvent::Insert],
            for_each_row: true,
            when: Some("new.name IS NOT NULL".into()),
            function_call: "f()".into(),
            constraint: false,
            deferrable: false,
            initially_deferred: false,
            comment: None,
        };
        assert_eq!(
            create_trigger(&table, &trigger, false),
            "CREATE TRIGGER t BEFORE INSERT ON test_table FOR EACH ROW WHEN (new.name IS NOT NULL) EXECUTE FUNCTION f();"
        );
    }

    #[test]
    fn restrictive_policy_statement() {
        let table = Table::new("public", "accounts");
        let policy = Policy {
            name: "tenant_isolation".into(),
            command: PolicyCommand::Select,
            permissive: false,
            roles: vec!["app_user".into()],
            using: Some("(tenant_id = current_tenant())".into()),
            with_check: None,
            comment: None,
        };
        assert_eq!(
            create_policy(&table, &policy),
            "CREATE POLICY tenant_isolation ON accounts AS RESTRICTIVE FOR SELECT TO app_user USING ((tenant_id = current_tenant()));"
        );
    }

    #[test]
    fn enum_add_value_positions() {
        let typedef = TypeDef {
            schema: "public".into(),
            name: "mood".into(),
            kind: TypeKind::Enum {
                labels: vec!["ok".into(), "bad".into()],
            },
            comment: None,
        };
        assert_eq!(
            alter_enum_add_value(&typedef, "great", EnumValuePosition::Last),
            "ALTER TYPE mood ADD VALUE 'great';"
        );
        assert_eq!(
            alter_enum_add_value(&typedef, "fine", EnumValuePosition::After("ok")),
            "ALTER TYPE mood ADD VALUE 'fine' AFTER 'ok';"
        );
        assert_eq!(
            alter_enum_add_value(&typedef, "first", EnumValuePosition::Before("ok")),
            "ALTER TYPE mood ADD VALUE 'first' BEFORE 'ok';"
        );
    }

    #[test]
    fn sequence_with_defaults_renders_short_form() {
        let sequence = Sequence::with_defaults("public", "order_numbers");
        assert_eq!(
            create_sequence(&sequence),
            "CREATE SEQUENCE order_numbers;"
        );
    }

    #[test]
    fn sequence_alter_emits_only_changed_attributes() {
        let current = Sequence::with_defaults("public", "order_numbers");
        let desired = Sequence {
            cache: 20,
            cycle: true,
            ..current.clone()
        };
        assert_eq!(
            alter_sequence(&current, &desired).as_deref(),
            Some("ALTER SEQUENCE order_numbers CACHE 20 CYCLE;")
        );
        assert_eq!(alter_sequence(&current, &current), None);
    }

    #[test]
    fn comment_statements() {
        assert_eq!(
            comment_on("TABLE users", Some("app users")),
            "COMMENT ON TABLE users IS 'app users';"
        );
        assert_eq!(comment_on("TABLE users", None), "COMMENT ON TABLE users IS NULL;");
    }
}
