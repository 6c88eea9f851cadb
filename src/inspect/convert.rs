//! Conversion from raw catalog rows into the IR, applying the
//! normalization rules that the deparsers leave open: type qualification,
//! own-schema call stripping in defaults, serial-sequence suppression, and
//! index-element parsing.

use std::collections::BTreeMap;

use crate::error::IntrospectError;
use crate::ir::{
    Aggregate, Column, ColumnIdentity, CompositeField, Constraint, ConstraintKind,
    DefaultPrivilege, DomainConstraint, FkAction, GeneratedColumn, Grant, GrantObject,
    IdentityKind, Index, IndexElement, MaterializedView, ParallelSafety, Policy, PolicyCommand,
    Routine, RoutineKind, Schema, Sequence, SequenceOwner, Table, TableKind, Trigger,
    TriggerEvent, TriggerTiming, TypeDef, TypeKind, View, Volatility,
};
use crate::normalize::{
    normalize_nextval_default, normalize_type_name, serial_sequence_name, strip_own_prefix,
    strip_own_schema_calls,
};
use crate::parse::rewrite::strip_qualifiers;
use crate::version::PgVersion;

use super::raw::{
    RawAggregate, RawColumn, RawComposite, RawConstraint, RawDefaultPrivilege, RawDomain,
    RawEnum, RawIndex, RawMaterializedView, RawPolicy, RawRelationGrant, RawRoutine,
    RawRoutineGrant, RawSequence, RawTable, RawTrigger, RawView,
};

/// Everything the catalog queries produced for one schema.
#[derive(Debug, Default)]
pub struct RawCatalog {
    pub schema_comment: Option<String>,
    pub tables: Vec<RawTable>,
    pub columns: Vec<RawColumn>,
    pub constraints: Vec<RawConstraint>,
    pub indexes: Vec<RawIndex>,
    pub triggers: Vec<RawTrigger>,
    pub policies: Vec<RawPolicy>,
    pub views: Vec<RawView>,
    pub materialized_views: Vec<RawMaterializedView>,
    pub routines: Vec<RawRoutine>,
    pub aggregates: Vec<RawAggregate>,
    pub sequences: Vec<RawSequence>,
    pub enums: Vec<RawEnum>,
    pub composites: Vec<RawComposite>,
    pub domains: Vec<RawDomain>,
    pub relation_grants: Vec<RawRelationGrant>,
    pub routine_grants: Vec<RawRoutineGrant>,
    pub default_privileges: Vec<RawDefaultPrivilege>,
}

pub fn assemble_schema(
    name: &str,
    version: PgVersion,
    raw: RawCatalog,
) -> Result<Schema, IntrospectError> {
    let mut schema = Schema::new(name, version);
    schema.comment = raw.schema_comment;

    for table in &raw.tables {
        schema.tables.insert(
            table.name.clone(),
            Table {
                schema: name.to_string(),
                name: table.name.clone(),
                kind: if table.kind == "p" {
                    TableKind::Partitioned
                } else {
                    TableKind::Ordinary
                },
                partition_by: table.partition_by.clone(),
                rls_enabled: table.rls_enabled,
                columns: Vec::new(),
                constraints: BTreeMap::new(),
                indexes: BTreeMap::new(),
                triggers: BTreeMap::new(),
                policies: BTreeMap::new(),
                comment: table.comment.clone(),
            },
        );
    }

    for column in &raw.columns {
        let converted = convert_column(name, column);
        let table = schema.tables.get_mut(&column.table).ok_or_else(|| {
            IntrospectError::Malformed {
                query: "columns",
                detail: format!("column {}.{} has no table row", column.table, column.name),
            }
        })?;
        table.columns.push(converted);
    }

    for constraint in &raw.constraints {
        let converted = convert_constraint(name, constraint)?;
        let table = schema.tables.get_mut(&constraint.table).ok_or_else(|| {
            IntrospectError::Malformed {
                query: "constraints",
                detail: format!(
                    "constraint {} targets unknown table {}",
                    constraint.name, constraint.table
                ),
            }
        })?;
        table.constraints.insert(constraint.name.clone(), converted);
    }

    for view in &raw.materialized_views {
        schema.materialized_views.insert(
            view.name.clone(),
            MaterializedView {
                schema: name.to_string(),
                name: view.name.clone(),
                definition: strip_qualifiers(&trim_view_definition(&view.definition), name),
                indexes: BTreeMap::new(),
                comment: view.comment.clone(),
            },
        );
    }

    for index in &raw.indexes {
        let converted = convert_index(name, index);
        if index.table_kind == "m" {
            let matview = schema
                .materialized_views
                .get_mut(&index.table)
                .ok_or_else(|| IntrospectError::Malformed {
                    query: "indexes",
                    detail: format!(
                        "index {} targets unknown materialized view {}",
                        index.name, index.table
                    ),
                })?;
            matview.indexes.insert(index.name.clone(), converted);
        } else {
            let table =
                schema
                    .tables
                    .get_mut(&index.table)
                    .ok_or_else(|| IntrospectError::Malformed {
                        query: "indexes",
                        detail: format!(
                            "index {} targets unknown table {}",
                            index.name, index.table
                        ),
                    })?;
            table.indexes.insert(index.name.clone(), converted);
        }
    }

    for trigger in &raw.triggers {
        let converted = convert_trigger(name, trigger)?;
        let table = schema.tables.get_mut(&trigger.table).ok_or_else(|| {
            IntrospectError::Malformed {
                query: "triggers",
                detail: format!(
                    "trigger {} targets unknown table {}",
                    trigger.name, trigger.table
                ),
            }
        })?;
        table.triggers.insert(trigger.name.clone(), converted);
    }

    for policy in &raw.policies {
        let converted = convert_policy(name, policy);
        let table = schema.tables.get_mut(&policy.table).ok_or_else(|| {
            IntrospectError::Malformed {
                query: "policies",
                detail: format!(
                    "policy {} targets unknown table {}",
                    policy.name, policy.table
                ),
            }
        })?;
        table.policies.insert(policy.name.clone(), converted);
    }

    for view in &raw.views {
        schema
            .views
            .insert(view.name.clone(), convert_view(name, view));
    }

    for routine in &raw.routines {
        let converted = convert_routine(name, routine);
        let key = converted.key();
        match converted.kind {
            RoutineKind::Function => schema.functions.insert(key, converted),
            RoutineKind::Procedure => schema.procedures.insert(key, converted),
        };
    }

    for aggregate in &raw.aggregates {
        let converted = convert_aggregate(name, aggregate);
        schema.aggregates.insert(converted.key(), converted);
    }

    for sequence in &raw.sequences {
        if let Some(converted) = convert_sequence(name, sequence, &raw.columns) {
            schema.sequences.insert(sequence.name.clone(), converted);
        }
    }

    for raw_enum in &raw.enums {
        schema.types.insert(
            raw_enum.name.clone(),
            TypeDef {
                schema: name.to_string(),
                name: raw_enum.name.clone(),
                kind: TypeKind::Enum {
                    labels: raw_enum.labels.clone(),
                },
                comment: raw_enum.comment.clone(),
            },
        );
    }
    for composite in &raw.composites {
        schema.types.insert(
            composite.name.clone(),
            convert_composite(name, composite)?,
        );
    }
    for domain in &raw.domains {
        schema
            .types
            .insert(domain.name.clone(), convert_domain(name, domain)?);
    }

    for grant in &raw.relation_grants {
        let object_kind = match grant.kind.as_str() {
            "S" => GrantObject::Sequence,
            _ => GrantObject::Table,
        };
        insert_grant(
            &mut schema.grants,
            object_kind,
            grant.object.clone(),
            &grant.grantee,
            &grant.privilege,
        );
    }
    for grant in &raw.routine_grants {
        insert_grant(
            &mut schema.grants,
            GrantObject::Function,
            format!("{}({})", grant.object, grant.identity_arguments),
            &grant.grantee,
            &grant.privilege,
        );
    }
    for default in &raw.default_privileges {
        let object_class = match default.object_type.as_str() {
            "S" => "SEQUENCES",
            "f" => "FUNCTIONS",
            "T" => "TYPES",
            _ => "TABLES",
        };
        let key = format!("{}:{}:{}", default.role, object_class, default.grantee);
        schema
            .default_privileges
            .entry(key)
            .or_insert_with(|| DefaultPrivilege {
                role: default.role.clone(),
                object_class: object_class.to_string(),
                grantee: default.grantee.clone(),
                privileges: Default::default(),
            })
            .privileges
            .insert(default.privilege.clone());
    }

    Ok(schema)
}

fn insert_grant(
    grants: &mut BTreeMap<String, Grant>,
    object_kind: GrantObject,
    object: String,
    grantee: &str,
    privilege: &str,
) {
    let grant = Grant {
        object_kind,
        object,
        grantee: grantee.to_string(),
        privileges: Default::default(),
    };
    grants
        .entry(grant.key())
        .or_insert(grant)
        .privileges
        .insert(privilege.to_string());
}

fn convert_column(schema: &str, raw: &RawColumn) -> Column {
    let data_type = normalize_type_name(schema, &raw.type_schema, &raw.data_type);

    let mut generated = None;
    let mut default = None;
    if raw.generated == "s" {
        generated = raw.default_expr.as_ref().map(|expr| GeneratedColumn {
            expression: strip_own_schema_calls(expr, schema),
        });
    } else if let Some(expr) = &raw.default_expr {
        let expr = normalize_nextval_default(expr, schema);
        default = Some(strip_own_schema_calls(&expr, schema));
    }

    let identity = match raw.identity.as_str() {
        "a" => Some(ColumnIdentity {
            kind: IdentityKind::Always,
        }),
        "d" => Some(ColumnIdentity {
            kind: IdentityKind::ByDefault,
        }),
        _ => None,
    };

    Column {
        name: raw.name.clone(),
        position: raw.position as i32,
        data_type,
        not_null: raw.not_null,
        default,
        generated,
        identity,
        comment: raw.comment.clone(),
    }
}

fn convert_constraint(
    schema: &str,
    raw: &RawConstraint,
) -> Result<Constraint, IntrospectError> {
    let kind = match raw.kind.as_str() {
        "p" => ConstraintKind::PrimaryKey {
            columns: raw.columns.clone(),
        },
        "u" => ConstraintKind::Unique {
            columns: raw.columns.clone(),
            nulls_not_distinct: raw.definition.contains("NULLS NOT DISTINCT"),
        },
        "f" => ConstraintKind::ForeignKey {
            columns: raw.columns.clone(),
            ref_schema: raw.ref_schema.clone().unwrap_or_else(|| schema.to_string()),
            ref_table: raw.ref_table.clone().ok_or_else(|| {
                IntrospectError::Malformed {
                    query: "constraints",
                    detail: format!("foreign key {} lacks a referenced table", raw.name),
                }
            })?,
            ref_columns: raw.ref_columns.clone(),
            on_update: fk_action(&raw.on_update),
            on_delete: fk_action(&raw.on_delete),
        },
        "c" => ConstraintKind::Check {
            expression: strip_qualifiers(&check_expression(&raw.definition), schema),
            no_inherit: raw.no_inherit,
        },
        "x" => ConstraintKind::Exclude {
            definition: strip_qualifiers(&exclude_definition(&raw.definition), schema),
        },
        other => {
            return Err(IntrospectError::Malformed {
                query: "constraints",
                detail: format!("constraint {} has unexpected type '{other}'", raw.name),
            });
        }
    };

    Ok(Constraint {
        name: raw.name.clone(),
        kind,
        deferrable: raw.deferrable,
        initially_deferred: raw.initially_deferred,
        comment: raw.comment.clone(),
    })
}

fn fk_action(code: &str) -> FkAction {
    FkAction::from_code(code.chars().next().unwrap_or('a'))
}

/// Inner expression of a `pg_get_constraintdef` CHECK rendering, outer
/// parentheses preserved as the deparser wrote them.
fn check_expression(definition: &str) -> String {
    let trimmed = definition
        .trim_end_matches(" NO INHERIT")
        .trim_end_matches(" NOT VALID");
    trimmed
        .strip_prefix("CHECK (")
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Exclusion constraints keep the canonical definition text, minus the
/// deferrability tail that the IR carries as flags.
fn exclude_definition(definition: &str) -> String {
    definition
        .trim_end_matches(" INITIALLY DEFERRED")
        .trim_end_matches(" DEFERRABLE")
        .to_string()
}

fn convert_index(schema: &str, raw: &RawIndex) -> Index {
    let key_count = raw.key_columns.max(0) as usize;
    let elements = raw
        .elements
        .iter()
        .take(key_count)
        .map(|text| parse_index_element(&strip_qualifiers(text, schema)))
        .collect();
    let include = raw
        .elements
        .iter()
        .skip(key_count)
        .map(|text| text.trim_matches('"').to_string())
        .collect();

    Index {
        schema: schema.to_string(),
        table: raw.table.clone(),
        name: raw.name.clone(),
        method: raw.method.clone(),
        unique: raw.is_unique,
        nulls_not_distinct: raw.definition.contains("NULLS NOT DISTINCT"),
        elements,
        include,
        predicate: raw
            .predicate
            .as_ref()
            .map(|p| strip_qualifiers(p, schema)),
        comment: raw.comment.clone(),
    }
}

/// Parse one `pg_get_indexdef(oid, n, true)` element: a column name or
/// parenthesized expression, optionally followed by COLLATE, an operator
/// class, and ordering modifiers.
fn parse_index_element(text: &str) -> IndexElement {
    let mut rest = text.trim().to_string();

    let descending = rest.ends_with(" DESC")
        || rest.contains(" DESC ")
        || rest.ends_with(" DESC NULLS LAST")
        || rest.ends_with(" DESC NULLS FIRST");
    let explicit_nulls_first = rest.ends_with(" NULLS FIRST");
    let explicit_nulls_last = rest.ends_with(" NULLS LAST");
    for suffix in [" NULLS FIRST", " NULLS LAST"] {
        if let Some(stripped) = rest.strip_suffix(suffix) {
            rest = stripped.to_string();
        }
    }
    if let Some(stripped) = rest.strip_suffix(" DESC") {
        rest = stripped.to_string();
    }

    let mut collation = None;
    if let Some(at) = rest.find(" COLLATE ") {
        let after = rest[at + " COLLATE ".len()..].to_string();
        let name = after
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_matches('"')
            .to_string();
        let tail = after[after.find(' ').unwrap_or(after.len())..].to_string();
        collation = Some(name);
        rest = format!("{}{}", &rest[..at], tail);
    }

    // A trailing bare identifier after the column or expression is an
    // operator class.
    let mut opclass = None;
    if let Some(at) = rest.rfind(' ') {
        let candidate = &rest[at + 1..];
        let is_ident = !candidate.is_empty()
            && candidate
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        let head = rest[..at].trim_end();
        let head_complete = head.ends_with(')') || !head.contains('(');
        if is_ident && head_complete && !head.is_empty() {
            opclass = Some(candidate.to_string());
            rest = head.to_string();
        }
    }

    let is_expression = rest.contains('(') || rest.contains("::") || rest.contains(' ');
    let expression = if is_expression {
        rest
    } else {
        rest.trim_matches('"').to_string()
    };

    IndexElement {
        expression,
        is_expression,
        descending,
        nulls_first: explicit_nulls_first || (descending && !explicit_nulls_last),
        collation,
        opclass,
    }
}

// Bits of pg_trigger.tgtype.
const TRIGGER_ROW: i16 = 1 << 0;
const TRIGGER_BEFORE: i16 = 1 << 1;
const TRIGGER_INSERT: i16 = 1 << 2;
const TRIGGER_DELETE: i16 = 1 << 3;
const TRIGGER_UPDATE: i16 = 1 << 4;
const TRIGGER_TRUNCATE: i16 = 1 << 5;
const TRIGGER_INSTEAD: i16 = 1 << 6;

fn convert_trigger(schema: &str, raw: &RawTrigger) -> Result<Trigger, IntrospectError> {
    let timing = if raw.tgtype & TRIGGER_INSTEAD != 0 {
        TriggerTiming::InsteadOf
    } else if raw.tgtype & TRIGGER_BEFORE != 0 {
        TriggerTiming::Before
    } else {
        TriggerTiming::After
    };

    let mut events = Vec::new();
    if raw.tgtype & TRIGGER_INSERT != 0 {
        events.push(TriggerEvent::Insert);
    }
    if raw.tgtype & TRIGGER_DELETE != 0 {
        events.push(TriggerEvent::Delete);
    }
    if raw.tgtype & TRIGGER_UPDATE != 0 {
        events.push(TriggerEvent::Update {
            columns: raw.update_columns.clone(),
        });
    }
    if raw.tgtype & TRIGGER_TRUNCATE != 0 {
        events.push(TriggerEvent::Truncate);
    }

    let function_call = raw
        .definition
        .split(" EXECUTE FUNCTION ")
        .nth(1)
        .or_else(|| raw.definition.split(" EXECUTE PROCEDURE ").nth(1))
        .ok_or_else(|| IntrospectError::Malformed {
            query: "triggers",
            detail: format!("trigger {} has no EXECUTE clause", raw.name),
        })?;

    Ok(Trigger {
        name: raw.name.clone(),
        timing,
        events,
        for_each_row: raw.tgtype & TRIGGER_ROW != 0,
        when: raw.when_expr.as_ref().map(|w| strip_qualifiers(w, schema)),
        function_call: strip_own_prefix(function_call, schema),
        constraint: raw.is_constraint,
        deferrable: raw.deferrable,
        initially_deferred: raw.initially_deferred,
        comment: raw.comment.clone(),
    })
}

fn convert_policy(schema: &str, raw: &RawPolicy) -> Policy {
    let roles = if raw.roles.is_empty() {
        vec!["public".to_string()]
    } else {
        raw.roles.clone()
    };
    Policy {
        name: raw.name.clone(),
        command: PolicyCommand::from_code(raw.command.chars().next().unwrap_or('*')),
        permissive: raw.permissive,
        roles,
        using: raw.using_expr.as_ref().map(|e| strip_qualifiers(e, schema)),
        with_check: raw
            .with_check_expr
            .as_ref()
            .map(|e| strip_qualifiers(e, schema)),
        comment: raw.comment.clone(),
    }
}

fn convert_view(schema: &str, raw: &RawView) -> View {
    let mut check_option = None;
    let mut security_barrier = false;
    let mut security_invoker = false;
    for option in raw.options.iter().flatten() {
        match option.split_once('=') {
            Some(("check_option", value)) => check_option = Some(value.to_string()),
            Some(("security_barrier", value)) => security_barrier = value == "true",
            Some(("security_invoker", value)) => security_invoker = value == "true",
            _ => {}
        }
    }
    View {
        schema: schema.to_string(),
        name: raw.name.clone(),
        definition: strip_qualifiers(&trim_view_definition(&raw.definition), schema),
        check_option,
        security_barrier,
        security_invoker,
        comment: raw.comment.clone(),
    }
}

/// `pg_get_viewdef(oid, true)` ends with a semicolon; the IR stores the body
/// bare so renderers control termination.
fn trim_view_definition(definition: &str) -> String {
    definition.trim_end().trim_end_matches(';').to_string()
}

fn convert_routine(schema: &str, raw: &RawRoutine) -> Routine {
    Routine {
        schema: schema.to_string(),
        name: raw.name.clone(),
        kind: if raw.kind == "p" {
            RoutineKind::Procedure
        } else {
            RoutineKind::Function
        },
        arguments: raw.arguments.clone(),
        identity_arguments: raw.identity_arguments.clone(),
        returns: raw.returns.clone().filter(|r| !r.is_empty()),
        language: raw.language.clone(),
        volatility: Volatility::from_code(raw.volatility.chars().next().unwrap_or('v')),
        strict: raw.strict,
        security_definer: raw.security_definer,
        leakproof: raw.leakproof,
        parallel: ParallelSafety::from_code(raw.parallel.chars().next().unwrap_or('u')),
        body: strip_qualifiers(&raw.body, schema),
        source: raw.source.clone(),
        comment: raw.comment.clone(),
    }
}

fn convert_aggregate(schema: &str, raw: &RawAggregate) -> Aggregate {
    Aggregate {
        schema: schema.to_string(),
        name: raw.name.clone(),
        arguments: raw.arguments.clone(),
        identity_arguments: raw.identity_arguments.clone(),
        transition_function: strip_own_prefix(&raw.transition_function, schema),
        state_type: strip_own_prefix(&raw.state_type, schema),
        final_function: raw
            .final_function
            .as_ref()
            .map(|f| strip_own_prefix(f, schema)),
        initial_condition: raw.initial_condition.clone(),
        comment: raw.comment.clone(),
    }
}

/// Identity sequences and serial-backed sequences are auto-managed and stay
/// out of the IR; everything else keeps its ownership linkage.
fn convert_sequence(
    schema: &str,
    raw: &RawSequence,
    columns: &[RawColumn],
) -> Option<Sequence> {
    match raw.owner_deptype.as_deref() {
        Some("i") => return None,
        Some("a") => {
            if let (Some(table), Some(column)) = (&raw.owner_table, &raw.owner_column) {
                let serial_name = serial_sequence_name(table, column);
                let backs_serial_default = columns.iter().any(|c| {
                    c.table == *table
                        && c.name == *column
                        && c.default_expr
                            .as_deref()
                            .and_then(crate::normalize::nextval_sequence)
                            .is_some_and(|seq| seq == raw.name)
                });
                if raw.name == serial_name && backs_serial_default {
                    return None;
                }
            }
        }
        _ => {}
    }

    Some(Sequence {
        schema: schema.to_string(),
        name: raw.name.clone(),
        data_type: raw.data_type.clone(),
        start: raw.start,
        min_value: raw.min_value,
        max_value: raw.max_value,
        increment: raw.increment,
        cache: raw.cache,
        cycle: raw.cycle,
        owned_by: raw.owner_table.as_ref().zip(raw.owner_column.as_ref()).map(
            |(table, column)| SequenceOwner {
                table: table.clone(),
                column: column.clone(),
            },
        ),
        comment: raw.comment.clone(),
    })
}

fn convert_composite(schema: &str, raw: &RawComposite) -> Result<TypeDef, IntrospectError> {
    if raw.field_names.len() != raw.field_types.len() {
        return Err(IntrospectError::Malformed {
            query: "composites",
            detail: format!("type {} has mismatched field arrays", raw.name),
        });
    }
    let fields = raw
        .field_names
        .iter()
        .zip(&raw.field_types)
        .map(|(name, data_type)| CompositeField {
            name: name.clone(),
            data_type: strip_own_prefix(data_type, schema),
        })
        .collect();
    Ok(TypeDef {
        schema: schema.to_string(),
        name: raw.name.clone(),
        kind: TypeKind::Composite { fields },
        comment: raw.comment.clone(),
    })
}

fn convert_domain(schema: &str, raw: &RawDomain) -> Result<TypeDef, IntrospectError> {
    if raw.constraint_names.len() != raw.constraint_defs.len() {
        return Err(IntrospectError::Malformed {
            query: "domains",
            detail: format!("domain {} has mismatched constraint arrays", raw.name),
        });
    }
    let constraints = raw
        .constraint_names
        .iter()
        .zip(&raw.constraint_defs)
        .map(|(name, definition)| DomainConstraint {
            name: name.clone(),
            check: strip_qualifiers(&check_expression(definition), schema),
        })
        .collect();
    Ok(TypeDef {
        schema: schema.to_string(),
        name: raw.name.clone(),
        kind: TypeKind::Domain {
            base_type: strip_own_prefix(&raw.base_type, schema),
            not_null: raw.not_null,
            default: raw
                .default_expr
                .as_ref()
                .map(|d| strip_qualifiers(d, schema)),
            constraints,
        },
        comment: raw.comment.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_element_parsing_covers_modifiers() {
        let plain = parse_index_element("email");
        assert_eq!(plain.expression, "email");
        assert!(!plain.is_expression);
        assert!(!plain.descending);
        assert!(!plain.nulls_first);

        let desc = parse_index_element("created_at DESC");
        assert!(desc.descending);
        assert!(desc.nulls_first);

        let desc_last = parse_index_element("created_at DESC NULLS LAST");
        assert!(desc_last.descending);
        assert!(!desc_last.nulls_first);

        let expr = parse_index_element("lower(email)");
        assert!(expr.is_expression);
        assert_eq!(expr.expression, "lower(email)");

        let opclass = parse_index_element("name text_pattern_ops");
        assert_eq!(opclass.expression, "name");
        assert_eq!(opclass.opclass.as_deref(), Some("text_pattern_ops"));

        let collated = parse_index_element("title COLLATE \"C\"");
        assert_eq!(collated.expression, "title");
        assert_eq!(collated.collation.as_deref(), Some("C"));
    }

    #[test]
    fn check_expression_strips_wrapper() {
        assert_eq!(check_expression("CHECK ((price > 0))"), "(price > 0)");
        assert_eq!(
            check_expression("CHECK ((price > 0)) NO INHERIT"),
            "(price > 0)"
        );
    }

    #[test]
    fn serial_backed_sequence_is_suppressed() {
        let raw_sequence = RawSequence {
            name: "users_id_seq".into(),
            data_type: "integer".into(),
            start: 1,
            min_value: 1,
            max_value: 2147483647,
            increment: 1,
            cache: 1,
            cycle: false,
            owner_table: Some("users".into()),
            owner_column: Some("id".into()),
            owner_deptype: Some("a".into()),
            comment: None,
        };
        let raw_column = RawColumn {
            table: "users".into(),
            name: "id".into(),
            position: 1,
            data_type: "integer".into(),
            type_schema: "pg_catalog".into(),
            not_null: true,
            identity: String::new(),
            generated: String::new(),
            default_expr: Some("nextval('users_id_seq'::regclass)".into()),
            comment: None,
        };
        assert!(convert_sequence("public", &raw_sequence, &[raw_column.clone()]).is_none());

        // An explicitly named sequence with the same ownership survives.
        let named = RawSequence {
            name: "user_ids".into(),
            ..raw_sequence
        };
        let kept = convert_sequence("public", &named, &[raw_column]).unwrap();
        assert_eq!(kept.owned_by.as_ref().unwrap().table, "users");
    }

    #[test]
    fn trigger_conversion_decodes_tgtype() {
        let raw = RawTrigger {
            table: "test_table".into(),
            name: "t".into(),
            // BEFORE INSERT, FOR EACH ROW.
            tgtype: TRIGGER_ROW | TRIGGER_BEFORE | TRIGGER_INSERT,
            is_constraint: false,
            deferrable: false,
            initially_deferred: false,
            when_expr: Some("new.name IS NOT NULL".into()),
            definition: "CREATE TRIGGER t BEFORE INSERT ON test_table FOR EACH ROW WHEN (new.name IS NOT NULL) EXECUTE FUNCTION f()".into(),
            update_columns: vec![],
            comment: None,
        };
        let trigger = convert_trigger("public", &raw).unwrap();
        assert_eq!(trigger.timing, TriggerTiming::Before);
        assert_eq!(trigger.events, vec![TriggerEvent::Insert]);
        assert!(trigger.for_each_row);
        assert_eq!(trigger.when.as_deref(), Some("new.name IS NOT NULL"));
        assert_eq!(trigger.function_call, "f()");
    }

    #[test]
    fn column_with_own_schema_default_is_normalized() {
        let raw = RawColumn {
            table: "users".into(),
            name: "status".into(),
            position: 2,
            data_type: "text".into(),
            type_schema: "pg_catalog".into(),
            not_null: true,
            identity: String::new(),
            generated: String::new(),
            default_expr: Some("public.def_status()".into()),
            comment: None,
        };
        let column = convert_column("public", &raw);
        assert_eq!(column.default.as_deref(), Some("def_status()"));
    }
}
