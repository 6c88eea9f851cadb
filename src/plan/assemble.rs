//! Plan assembly: runs the per-kind comparators over two IRs and orders the
//! resulting steps.
//!
//! The ordering is staged. First the sub-object drops on surviving tables
//! (they may unhook things that later drops or column changes need gone),
//! then drops of removed views and materialized views, then all creates and
//! alters leaves-first (types, sequences, routines, aggregates, tables,
//! sequence ownership, foreign keys, views, privileges), and finally drops
//! of removed tables, aggregates, routines, sequences, and types. Foreign
//! keys and table drops sit at opposite ends so mutually referencing tables
//! never need backtracking; removed routines and types outlive the
//! create/alter phase because surviving objects may reference them until
//! their own alter steps have run.

use std::collections::BTreeSet;

use tracing::debug;

use crate::diff::{
    diff_maps, privileges, routines, sequences, tables, typedefs, views,
};
use crate::error::PlanError;
use crate::ir::{Schema, TypeKind};
use crate::plan::deps::{DependencyGraph, references_name};
use crate::plan::{Plan, PlanStep};

/// Compute the ordered migration plan turning `current` into `desired`.
pub fn diff_schemas(current: &Schema, desired: &Schema) -> Result<Plan, PlanError> {
    let version = current.server_version;
    let mut steps: Vec<PlanStep> = Vec::new();

    let table_diff = diff_maps(&current.tables, &desired.tables);
    let dropped_tables: BTreeSet<&str> = table_diff
        .dropped
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();

    // Comparator output for surviving tables, computed once.
    let mut altered_tables = Vec::new();
    for (name, cur, des) in &table_diff.common {
        let table_steps = tables::alter_table_steps(cur, des, version)?;
        if !table_steps.is_empty() {
            altered_tables.push((name.as_str(), table_steps));
        }
    }

    // Sub-object drops on surviving tables come first: they detach foreign
    // keys, triggers, and policies that reference objects removed later.
    for (_, table_steps) in &mut altered_tables {
        steps.append(&mut table_steps.pre);
    }

    // Removed views and materialized views, dependents first.
    let view_diff = diff_maps(&current.views, &desired.views);
    let matview_diff = diff_maps(&current.materialized_views, &desired.materialized_views);
    drop_relations_dependents_first(&view_diff, &matview_diff, &mut steps)?;

    // Creates and alters, leaves first.
    emit_types(current, desired, &mut steps)?;

    let sequence_diff = diff_maps(&current.sequences, &desired.sequences);
    for (_, sequence) in &sequence_diff.added {
        steps.extend(sequences::create_steps(sequence));
    }
    for (_, cur, des) in &sequence_diff.common {
        steps.extend(sequences::alter_steps(cur, des));
    }

    emit_routines(current, desired, &mut steps);

    let aggregate_diff = diff_maps(&current.aggregates, &desired.aggregates);
    for (_, aggregate) in &aggregate_diff.added {
        steps.extend(routines::create_aggregate_steps(aggregate));
    }
    for (_, cur, des) in &aggregate_diff.common {
        steps.extend(routines::alter_aggregate_steps(cur, des));
    }

    // Tables, added and altered interleaved in name order, foreign keys
    // deferred.
    let mut fk_steps: Vec<PlanStep> = Vec::new();
    let mut table_work: Vec<(&str, crate::diff::TableSteps)> = Vec::new();
    for (name, table) in &table_diff.added {
        table_work.push((name.as_str(), tables::create_table_steps(table)));
    }
    table_work.extend(altered_tables);
    table_work.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (_, table_steps) in table_work {
        let (mut ordered, mut fks) = table_steps.into_ordered();
        steps.append(&mut ordered);
        fk_steps.append(&mut fks);
    }

    // Sequence ownership, once the owning tables exist.
    for (_, sequence) in &sequence_diff.added {
        if sequence.owned_by.is_some() {
            steps.push(sequences::owned_by_step(sequence));
        }
    }
    for (_, cur, des) in &sequence_diff.common {
        if let Some(step) = sequences::ownership_change(cur, des) {
            steps.push(step);
        }
    }

    steps.append(&mut fk_steps);

    emit_views(&view_diff, &matview_diff, &mut steps)?;

    steps.extend(privileges::diff_grants(current, desired));
    steps.extend(privileges::diff_default_privileges(current, desired));

    // Removed tables, referencing tables first so their foreign keys vanish
    // before the referenced table goes.
    let mut table_drop_graph = DependencyGraph::new();
    for (name, table) in &table_diff.dropped {
        table_drop_graph.add_node(name);
        for constraint in table.constraints.values() {
            if let crate::ir::ConstraintKind::ForeignKey { ref_table, .. } = &constraint.kind
                && dropped_tables.contains(ref_table.as_str())
            {
                table_drop_graph.add_dependency(name, ref_table);
            }
        }
    }
    for name in table_drop_graph.dependents_first()? {
        if let Some(table) = current.tables.get(&name) {
            steps.extend(tables::drop_table_steps(table));
        }
    }

    // Remaining removed objects: aggregates before the functions they use,
    // sequences and types last.
    for (_, aggregate) in &aggregate_diff.dropped {
        steps.push(routines::drop_aggregate_step(aggregate));
    }
    for map_pair in [
        (&current.functions, &desired.functions),
        (&current.procedures, &desired.procedures),
    ] {
        let diff = diff_maps(map_pair.0, map_pair.1);
        for (_, routine) in diff.dropped {
            steps.push(routines::drop_step(routine));
        }
    }
    for (_, sequence) in &sequence_diff.dropped {
        // A sequence owned by a dropped table goes down with it.
        let owner_dropped = sequence
            .owned_by
            .as_ref()
            .is_some_and(|owner| dropped_tables.contains(owner.table.as_str()));
        if !owner_dropped {
            steps.push(sequences::drop_step(sequence));
        }
    }
    let type_diff = diff_maps(&current.types, &desired.types);
    for (_, typedef) in &type_diff.dropped {
        steps.push(typedefs::drop_step(typedef));
    }

    debug!(steps = steps.len(), "assembled migration plan");
    Ok(Plan::new(version, steps))
}

/// Added types leaves-first (a domain may sit on an enum, a composite may
/// embed either), then in-place changes.
fn emit_types(
    current: &Schema,
    desired: &Schema,
    steps: &mut Vec<PlanStep>,
) -> Result<(), PlanError> {
    let type_diff = diff_maps(&current.types, &desired.types);

    let mut graph = DependencyGraph::new();
    for (name, typedef) in &type_diff.added {
        graph.add_node(name);
        let referenced_text = type_reference_text(&typedef.kind);
        for (other, _) in &type_diff.added {
            if *other != *name && references_name(&referenced_text, other) {
                graph.add_dependency(name, other);
            }
        }
    }
    let added: BTreeSet<&str> = type_diff.added.iter().map(|(n, _)| n.as_str()).collect();
    for name in graph.dependencies_first()? {
        if added.contains(name.as_str())
            && let Some(typedef) = desired.types.get(&name)
        {
            steps.extend(typedefs::create_steps(typedef));
        }
    }
    for (_, cur, des) in &type_diff.common {
        steps.extend(typedefs::alter_steps(cur, des));
    }
    Ok(())
}

fn type_reference_text(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Enum { .. } => String::new(),
        TypeKind::Composite { fields } => fields
            .iter()
            .map(|f| f.data_type.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        TypeKind::Domain {
            base_type,
            default,
            constraints,
            ..
        } => {
            let mut text = base_type.clone();
            if let Some(default) = default {
                text.push(' ');
                text.push_str(default);
            }
            for constraint in constraints {
                text.push(' ');
                text.push_str(&constraint.check);
            }
            text
        }
    }
}

fn emit_routines(current: &Schema, desired: &Schema, steps: &mut Vec<PlanStep>) {
    for map_pair in [
        (&current.functions, &desired.functions),
        (&current.procedures, &desired.procedures),
    ] {
        let diff = diff_maps(map_pair.0, map_pair.1);
        for (_, routine) in diff.added {
            steps.extend(routines::create_steps(routine));
        }
        for (_, cur, des) in diff.common {
            steps.extend(routines::alter_steps(cur, des));
        }
    }
}

type ViewDiff<'a> = crate::diff::MapDiff<'a, crate::ir::View>;
type MatviewDiff<'a> = crate::diff::MapDiff<'a, crate::ir::MaterializedView>;

/// Removed views and matviews ordered so that anything selecting from
/// another removed relation goes first.
fn drop_relations_dependents_first(
    view_diff: &ViewDiff<'_>,
    matview_diff: &MatviewDiff<'_>,
    steps: &mut Vec<PlanStep>,
) -> Result<(), PlanError> {
    let mut graph = DependencyGraph::new();
    let mut definitions: Vec<(String, &str)> = Vec::new();
    for (name, view) in &view_diff.dropped {
        definitions.push((format!("view:{name}"), &view.definition));
    }
    for (name, matview) in &matview_diff.dropped {
        definitions.push((format!("matview:{name}"), &matview.definition));
    }
    for (key, definition) in &definitions {
        graph.add_node(key);
        for (other_key, _) in &definitions {
            if other_key == key {
                continue;
            }
            let other_name = other_key.split(':').nth(1).unwrap_or_default();
            if references_name(definition, other_name) {
                graph.add_dependency(key, other_key);
            }
        }
    }

    for key in graph.dependents_first()? {
        match key.split_once(':') {
            Some(("view", name)) => {
                if let Some((_, view)) = view_diff.dropped.iter().find(|(n, _)| **n == name) {
                    steps.push(views::drop_view_step(view));
                }
            }
            Some(("matview", name)) => {
                if let Some((_, matview)) =
                    matview_diff.dropped.iter().find(|(n, _)| **n == name)
                {
                    steps.push(views::drop_matview_step(matview));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Added views and matviews leaves-first, then in-place changes.
fn emit_views(
    view_diff: &ViewDiff<'_>,
    matview_diff: &MatviewDiff<'_>,
    steps: &mut Vec<PlanStep>,
) -> Result<(), PlanError> {
    let mut graph = DependencyGraph::new();
    let mut definitions: Vec<(String, &str)> = Vec::new();
    for (name, view) in &view_diff.added {
        definitions.push((format!("view:{name}"), &view.definition));
    }
    for (name, matview) in &matview_diff.added {
        definitions.push((format!("matview:{name}"), &matview.definition));
    }
    for (key, definition) in &definitions {
        graph.add_node(key);
        for (other_key, _) in &definitions {
            if other_key == key {
                continue;
            }
            let other_name = other_key.split(':').nth(1).unwrap_or_default();
            if references_name(definition, other_name) {
                graph.add_dependency(key, other_key);
            }
        }
    }

    for key in graph.dependencies_first()? {
        match key.split_once(':') {
            Some(("view", name)) => {
                if let Some((_, view)) = view_diff.added.iter().find(|(n, _)| **n == name) {
                    steps.extend(views::create_view_steps(view));
                }
            }
            Some(("matview", name)) => {
                if let Some((_, matview)) = matview_diff.added.iter().find(|(n, _)| **n == name)
                {
                    steps.extend(views::create_matview_steps(matview));
                }
            }
            _ => {}
        }
    }

    for (_, cur, des) in &view_diff.common {
        steps.extend(views::alter_view_steps(cur, des));
    }
    for (_, cur, des) in &matview_diff.common {
        steps.extend(views::alter_matview_steps(cur, des));
    }
    Ok(())
}
