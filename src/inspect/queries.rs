//! Catalog queries for schema introspection.
//!
//! All queries are scoped to one schema (`$1`) and read from the system
//! catalogs rather than `information_schema`: the catalogs carry the
//! deparsed canonical text (`pg_get_expr`, `pg_get_constraintdef`,
//! `pg_get_indexdef`, `pg_get_viewdef`, `pg_get_functiondef`) that the
//! whole comparison model relies on. Objects owned by extensions are
//! excluded via `pg_depend` with `deptype = 'e'`.

/// Server version as an integer, e.g. 160002.
pub const SERVER_VERSION: &str = "SELECT current_setting('server_version_num')::int";

pub const SCHEMA_COMMENT: &str = r#"
SELECT obj_description(n.oid, 'pg_namespace') AS comment
FROM pg_namespace n
WHERE n.nspname = $1
"#;

/// Ordinary and partitioned tables. Child partitions are attachments, not
/// independent objects, and are skipped.
pub const TABLES: &str = r#"
SELECT
    c.relname AS name,
    c.relkind::text AS kind,
    c.relrowsecurity AS rls_enabled,
    pg_get_partkeydef(c.oid) AS partition_by,
    obj_description(c.oid, 'pg_class') AS comment
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
  AND NOT c.relispartition
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.classid = 'pg_class'::regclass AND d.objid = c.oid AND d.deptype = 'e'
  )
ORDER BY c.relname
"#;

/// Table columns. The default expression comes from `pg_attrdef` through
/// `pg_get_expr`; for stored generated columns the same expression is the
/// generation expression.
pub const COLUMNS: &str = r#"
SELECT
    c.relname AS table,
    a.attname AS name,
    a.attnum AS position,
    format_type(a.atttypid, a.atttypmod) AS data_type,
    tn.nspname AS type_schema,
    a.attnotnull AS not_null,
    a.attidentity::text AS identity,
    a.attgenerated::text AS generated,
    pg_get_expr(ad.adbin, ad.adrelid) AS default_expr,
    col_description(c.oid, a.attnum) AS comment
FROM pg_attribute a
JOIN pg_class c ON c.oid = a.attrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
JOIN pg_type t ON t.oid = a.atttypid
JOIN pg_namespace tn ON tn.oid = t.typnamespace
LEFT JOIN pg_attrdef ad ON ad.adrelid = a.attrelid AND ad.adnum = a.attnum
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
  AND NOT c.relispartition
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY c.relname, a.attnum
"#;

/// Every table constraint, with columns in key order and the canonical
/// definition text for kinds the IR stores verbatim.
pub const CONSTRAINTS: &str = r#"
SELECT
    rel.relname AS table,
    con.conname AS name,
    con.contype::text AS kind,
    con.condeferrable AS deferrable,
    con.condeferred AS initially_deferred,
    con.connoinherit AS no_inherit,
    pg_get_constraintdef(con.oid) AS definition,
    ARRAY(
        SELECT att.attname::text
        FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_attribute att ON att.attrelid = con.conrelid AND att.attnum = k.attnum
        ORDER BY k.ord
    ) AS columns,
    ref_ns.nspname AS ref_schema,
    ref_rel.relname AS ref_table,
    ARRAY(
        SELECT att.attname::text
        FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_attribute att ON att.attrelid = con.confrelid AND att.attnum = k.attnum
        ORDER BY k.ord
    ) AS ref_columns,
    con.confupdtype::text AS on_update,
    con.confdeltype::text AS on_delete,
    obj_description(con.oid, 'pg_constraint') AS comment
FROM pg_constraint con
JOIN pg_class rel ON rel.oid = con.conrelid
JOIN pg_namespace n ON n.oid = rel.relnamespace
LEFT JOIN pg_class ref_rel ON ref_rel.oid = con.confrelid
LEFT JOIN pg_namespace ref_ns ON ref_ns.oid = ref_rel.relnamespace
WHERE n.nspname = $1
  AND rel.relkind IN ('r', 'p')
  AND NOT rel.relispartition
  AND con.contype IN ('p', 'u', 'f', 'c', 'x')
ORDER BY rel.relname, con.conname
"#;

/// Indexes on tables and materialized views, excluding those backing
/// constraints. Per-position element text comes from `pg_get_indexdef`; the
/// full definition is kept for flags the per-position form omits.
pub const INDEXES: &str = r#"
SELECT
    tbl.relname AS table,
    tbl.relkind::text AS table_kind,
    idx.relname AS name,
    am.amname AS method,
    ix.indisunique AS is_unique,
    ix.indnkeyatts AS key_columns,
    pg_get_expr(ix.indpred, ix.indrelid) AS predicate,
    pg_get_indexdef(ix.indexrelid) AS definition,
    ARRAY(
        SELECT pg_get_indexdef(ix.indexrelid, k.n, true)
        FROM generate_series(1, ix.indnatts) AS k(n)
        ORDER BY k.n
    ) AS elements,
    obj_description(ix.indexrelid, 'pg_class') AS comment
FROM pg_index ix
JOIN pg_class idx ON idx.oid = ix.indexrelid
JOIN pg_class tbl ON tbl.oid = ix.indrelid
JOIN pg_namespace n ON n.oid = tbl.relnamespace
JOIN pg_am am ON am.oid = idx.relam
WHERE n.nspname = $1
  AND tbl.relkind IN ('r', 'p', 'm')
  AND NOT tbl.relispartition
  AND NOT ix.indisprimary
  AND NOT EXISTS (
      SELECT 1 FROM pg_constraint con WHERE con.conindid = ix.indexrelid
  )
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.classid = 'pg_class'::regclass AND d.objid = idx.oid AND d.deptype = 'e'
  )
ORDER BY tbl.relname, idx.relname
"#;

/// User triggers with structured attributes plus the deparsed definition,
/// which supplies the `EXECUTE FUNCTION` tail verbatim. `tgqual` through
/// `pg_get_expr` is authoritative for the WHEN predicate.
pub const TRIGGERS: &str = r#"
SELECT
    rel.relname AS table,
    t.tgname AS name,
    t.tgtype AS tgtype,
    t.tgconstraint <> 0 AS is_constraint,
    t.tgdeferrable AS deferrable,
    t.tginitdeferred AS initially_deferred,
    pg_get_expr(t.tgqual, t.tgrelid) AS when_expr,
    pg_get_triggerdef(t.oid, true) AS definition,
    ARRAY(
        SELECT att.attname::text
        FROM unnest(t.tgattr) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_attribute att ON att.attrelid = t.tgrelid AND att.attnum = k.attnum
        ORDER BY k.ord
    ) AS update_columns,
    obj_description(t.oid, 'pg_trigger') AS comment
FROM pg_trigger t
JOIN pg_class rel ON rel.oid = t.tgrelid
JOIN pg_namespace n ON n.oid = rel.relnamespace
WHERE n.nspname = $1
  AND NOT t.tgisinternal
ORDER BY rel.relname, t.tgname
"#;

/// Row-level-security policies. `polroles = {0}` means PUBLIC.
pub const POLICIES: &str = r#"
SELECT
    rel.relname AS table,
    p.polname AS name,
    p.polcmd::text AS command,
    p.polpermissive AS permissive,
    ARRAY(
        SELECT r.rolname::text FROM pg_roles r WHERE r.oid = ANY(p.polroles) ORDER BY r.rolname
    ) AS roles,
    pg_get_expr(p.polqual, p.polrelid) AS using_expr,
    pg_get_expr(p.polwithcheck, p.polrelid) AS with_check_expr,
    obj_description(p.oid, 'pg_policy') AS comment
FROM pg_policy p
JOIN pg_class rel ON rel.oid = p.polrelid
JOIN pg_namespace n ON n.oid = rel.relnamespace
WHERE n.nspname = $1
ORDER BY rel.relname, p.polname
"#;

/// Plain views with their reloptions.
pub const VIEWS: &str = r#"
SELECT
    c.relname AS name,
    pg_get_viewdef(c.oid, true) AS definition,
    c.reloptions AS options,
    obj_description(c.oid, 'pg_class') AS comment
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1
  AND c.relkind = 'v'
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.classid = 'pg_class'::regclass AND d.objid = c.oid AND d.deptype = 'e'
  )
ORDER BY c.relname
"#;

pub const MATERIALIZED_VIEWS: &str = r#"
SELECT
    c.relname AS name,
    pg_get_viewdef(c.oid, true) AS definition,
    obj_description(c.oid, 'pg_class') AS comment
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1
  AND c.relkind = 'm'
ORDER BY c.relname
"#;

/// Functions and procedures. Aggregates have their own query; the
/// deparsers used here do not apply to them.
pub const ROUTINES: &str = r#"
SELECT
    p.proname AS name,
    p.prokind::text AS kind,
    pg_get_function_arguments(p.oid) AS arguments,
    pg_get_function_identity_arguments(p.oid) AS identity_arguments,
    pg_get_function_result(p.oid) AS returns,
    pg_get_functiondef(p.oid) AS body,
    p.prosrc AS source,
    l.lanname AS language,
    p.provolatile::text AS volatility,
    p.proisstrict AS strict,
    p.prosecdef AS security_definer,
    p.proleakproof AS leakproof,
    p.proparallel::text AS parallel,
    obj_description(p.oid, 'pg_proc') AS comment
FROM pg_proc p
JOIN pg_namespace n ON n.oid = p.pronamespace
JOIN pg_language l ON l.oid = p.prolang
WHERE n.nspname = $1
  AND p.prokind IN ('f', 'p')
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.classid = 'pg_proc'::regclass AND d.objid = p.oid AND d.deptype = 'e'
  )
ORDER BY p.proname, pg_get_function_identity_arguments(p.oid)
"#;

pub const AGGREGATES: &str = r#"
SELECT
    p.proname AS name,
    pg_get_function_arguments(p.oid) AS arguments,
    pg_get_function_identity_arguments(p.oid) AS identity_arguments,
    a.aggtransfn::text AS transition_function,
    format_type(a.aggtranstype, NULL) AS state_type,
    CASE WHEN a.aggfinalfn::oid = 0 THEN NULL ELSE a.aggfinalfn::text END AS final_function,
    a.agginitval AS initial_condition,
    obj_description(p.oid, 'pg_proc') AS comment
FROM pg_proc p
JOIN pg_aggregate a ON a.aggfnoid = p.oid
JOIN pg_namespace n ON n.oid = p.pronamespace
WHERE n.nspname = $1
  AND p.prokind = 'a'
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.classid = 'pg_proc'::regclass AND d.objid = p.oid AND d.deptype = 'e'
  )
ORDER BY p.proname, pg_get_function_identity_arguments(p.oid)
"#;

/// Sequences with their column linkage. `pg_depend` deptype `'i'` marks
/// identity sequences, `'a'` serial-style ownership; the converter decides
/// which ones are auto-managed and stay out of the IR.
pub const SEQUENCES: &str = r#"
SELECT
    c.relname AS name,
    format_type(s.seqtypid, NULL) AS data_type,
    s.seqstart AS start,
    s.seqmin AS min_value,
    s.seqmax AS max_value,
    s.seqincrement AS increment,
    s.seqcache AS cache,
    s.seqcycle AS cycle,
    owner_rel.relname AS owner_table,
    owner_att.attname AS owner_column,
    dep.deptype::text AS owner_deptype,
    obj_description(c.oid, 'pg_class') AS comment
FROM pg_sequence s
JOIN pg_class c ON c.oid = s.seqrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_depend dep
    ON dep.classid = 'pg_class'::regclass
    AND dep.objid = c.oid
    AND dep.refclassid = 'pg_class'::regclass
    AND dep.refobjsubid > 0
    AND dep.deptype IN ('a', 'i')
LEFT JOIN pg_class owner_rel ON owner_rel.oid = dep.refobjid
LEFT JOIN pg_attribute owner_att
    ON owner_att.attrelid = dep.refobjid AND owner_att.attnum = dep.refobjsubid
WHERE n.nspname = $1
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.classid = 'pg_class'::regclass AND d.objid = c.oid AND d.deptype = 'e'
  )
ORDER BY c.relname
"#;

pub const ENUMS: &str = r#"
SELECT
    t.typname AS name,
    ARRAY(
        SELECT e.enumlabel::text FROM pg_enum e
        WHERE e.enumtypid = t.oid ORDER BY e.enumsortorder
    ) AS labels,
    obj_description(t.oid, 'pg_type') AS comment
FROM pg_type t
JOIN pg_namespace n ON n.oid = t.typnamespace
WHERE n.nspname = $1
  AND t.typtype = 'e'
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.classid = 'pg_type'::regclass AND d.objid = t.oid AND d.deptype = 'e'
  )
ORDER BY t.typname
"#;

/// Free-standing composite types; every relation also has a row type, which
/// `relkind = 'c'` excludes.
pub const COMPOSITES: &str = r#"
SELECT
    t.typname AS name,
    ARRAY(
        SELECT a.attname::text FROM pg_attribute a
        WHERE a.attrelid = t.typrelid AND a.attnum > 0 AND NOT a.attisdropped
        ORDER BY a.attnum
    ) AS field_names,
    ARRAY(
        SELECT format_type(a.atttypid, a.atttypmod) FROM pg_attribute a
        WHERE a.attrelid = t.typrelid AND a.attnum > 0 AND NOT a.attisdropped
        ORDER BY a.attnum
    ) AS field_types,
    obj_description(t.oid, 'pg_type') AS comment
FROM pg_type t
JOIN pg_class c ON c.oid = t.typrelid
JOIN pg_namespace n ON n.oid = t.typnamespace
WHERE n.nspname = $1
  AND t.typtype = 'c'
  AND c.relkind = 'c'
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.classid = 'pg_type'::regclass AND d.objid = t.oid AND d.deptype = 'e'
  )
ORDER BY t.typname
"#;

pub const DOMAINS: &str = r#"
SELECT
    t.typname AS name,
    format_type(t.typbasetype, t.typtypmod) AS base_type,
    t.typnotnull AS not_null,
    t.typdefault AS default_expr,
    ARRAY(
        SELECT con.conname::text FROM pg_constraint con
        WHERE con.contypid = t.oid ORDER BY con.conname
    ) AS constraint_names,
    ARRAY(
        SELECT pg_get_constraintdef(con.oid) FROM pg_constraint con
        WHERE con.contypid = t.oid ORDER BY con.conname
    ) AS constraint_defs,
    obj_description(t.oid, 'pg_type') AS comment
FROM pg_type t
JOIN pg_namespace n ON n.oid = t.typnamespace
WHERE n.nspname = $1
  AND t.typtype = 'd'
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.classid = 'pg_type'::regclass AND d.objid = t.oid AND d.deptype = 'e'
  )
ORDER BY t.typname
"#;

/// Explicit grants on tables and sequences, owner self-grants excluded.
pub const RELATION_GRANTS: &str = r#"
SELECT
    c.relname AS object,
    c.relkind::text AS kind,
    COALESCE(grantee_role.rolname, 'public') AS grantee,
    acl.privilege_type AS privilege
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
CROSS JOIN LATERAL aclexplode(c.relacl) AS acl
LEFT JOIN pg_roles grantee_role ON grantee_role.oid = acl.grantee
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p', 'S', 'v', 'm')
  AND acl.grantee <> c.relowner
ORDER BY c.relname, grantee, acl.privilege_type
"#;

pub const ROUTINE_GRANTS: &str = r#"
SELECT
    p.proname AS object,
    pg_get_function_identity_arguments(p.oid) AS identity_arguments,
    COALESCE(grantee_role.rolname, 'public') AS grantee,
    acl.privilege_type AS privilege
FROM pg_proc p
JOIN pg_namespace n ON n.oid = p.pronamespace
CROSS JOIN LATERAL aclexplode(p.proacl) AS acl
LEFT JOIN pg_roles grantee_role ON grantee_role.oid = acl.grantee
WHERE n.nspname = $1
  AND acl.grantee <> p.proowner
ORDER BY p.proname, identity_arguments, grantee, acl.privilege_type
"#;

pub const DEFAULT_PRIVILEGES: &str = r#"
SELECT
    owner_role.rolname AS role,
    d.defaclobjtype::text AS object_type,
    COALESCE(grantee_role.rolname, 'public') AS grantee,
    acl.privilege_type AS privilege
FROM pg_default_acl d
JOIN pg_namespace n ON n.oid = d.defaclnamespace
JOIN pg_roles owner_role ON owner_role.oid = d.defaclrole
CROSS JOIN LATERAL aclexplode(d.defaclacl) AS acl
LEFT JOIN pg_roles grantee_role ON grantee_role.oid = acl.grantee
WHERE n.nspname = $1
ORDER BY role, object_type, grantee, acl.privilege_type
"#;
