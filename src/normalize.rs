//! Canonicalization rules that make equal schemas compare equal regardless
//! of how the user wrote them.
//!
//! Expressions, defaults, predicates, and view bodies are already canonical
//! because both pipeline sides run through the server's `pg_get_*` deparsers.
//! What remains here is everything the deparsers do not settle: identifier
//! folding and quoting, type aliases, detection of serial-backed defaults,
//! schema-qualifier stripping, and the names PostgreSQL assigns to anonymous
//! constraints.

use std::sync::LazyLock;

use regex::Regex;

/// Reserved words that force quoting when emitted as identifiers.
///
/// This is the `RESERVED_KEYWORD` subset of PostgreSQL's keyword list; words
/// that are merely non-reserved stay unquoted.
const RESERVED_KEYWORDS: &[&str] = &[
    "all",
    "analyse",
    "analyze",
    "and",
    "any",
    "array",
    "as",
    "asc",
    "asymmetric",
    "both",
    "case",
    "cast",
    "check",
    "collate",
    "column",
    "constraint",
    "create",
    "current_catalog",
    "current_date",
    "current_role",
    "current_time",
    "current_timestamp",
    "current_user",
    "default",
    "deferrable",
    "desc",
    "distinct",
    "do",
    "else",
    "end",
    "except",
    "false",
    "fetch",
    "for",
    "foreign",
    "from",
    "grant",
    "group",
    "having",
    "in",
    "initially",
    "intersect",
    "into",
    "lateral",
    "leading",
    "limit",
    "localtime",
    "localtimestamp",
    "not",
    "null",
    "offset",
    "on",
    "only",
    "or",
    "order",
    "placing",
    "primary",
    "references",
    "returning",
    "select",
    "session_user",
    "some",
    "symmetric",
    "table",
    "then",
    "to",
    "trailing",
    "true",
    "union",
    "unique",
    "user",
    "using",
    "variadic",
    "when",
    "where",
    "window",
    "with",
];

static PLAIN_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_$]*$").unwrap());

/// Quote an identifier for DDL emission.
///
/// Lowercase identifiers that are not reserved words stay bare; everything
/// else is double-quoted with embedded quotes doubled.
pub fn quote_ident(name: &str) -> String {
    if PLAIN_IDENT.is_match(name) && !RESERVED_KEYWORDS.contains(&name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Quote a qualified name, omitting the schema when it matches `own_schema`.
pub fn quote_qualified(own_schema: &str, schema: &str, name: &str) -> String {
    if schema == own_schema || schema == "pg_catalog" {
        quote_ident(name)
    } else {
        format!("{}.{}", quote_ident(schema), quote_ident(name))
    }
}

/// Fold an authored identifier the way the server does: unquoted identifiers
/// lowercase, quoted identifiers verbatim with the quotes removed.
pub fn fold_ident(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    {
        inner.replace("\"\"", "\"")
    } else {
        trimmed.to_lowercase()
    }
}

/// Quote a string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Apply the type qualification policy to a `format_type` result.
///
/// Types in the object's own schema or in `pg_catalog` are emitted
/// unqualified; other user schemas keep their qualifier. The inspector
/// passes the type's namespace alongside the formatted name.
pub fn normalize_type_name(own_schema: &str, type_schema: &str, formatted: &str) -> String {
    if type_schema == "pg_catalog" {
        return formatted.to_string();
    }
    let prefixes = [
        format!("{}.", quote_ident(type_schema)),
        format!("{}.", type_schema),
        format!("\"{}\".", type_schema),
    ];
    if type_schema == own_schema {
        for prefix in &prefixes {
            if let Some(rest) = formatted.strip_prefix(prefix.as_str()) {
                return rest.to_string();
            }
        }
    }
    formatted.to_string()
}

/// Strip `schema.` qualifiers on function calls inside a default expression
/// when the qualifier names the table's own schema.
///
/// `pg_get_expr` qualifies a function reference whenever the function's
/// schema is not on the connection's `search_path`, so the live side and the
/// temporary-schema side can disagree on qualification even though the
/// semantics match. Only the own-schema qualifier is stripped; cross-schema
/// calls keep their prefix because stripping them would change meaning under
/// a different `search_path`.
pub fn strip_own_schema_calls(expression: &str, own_schema: &str) -> String {
    let quoted = format!("\"{}\".", own_schema.replace('"', "\"\""));
    let bare = format!("{}.", own_schema);
    let mut out = String::with_capacity(expression.len());
    let mut i = 0;
    let mut in_string = false;
    while i < expression.len() {
        let rest = &expression[i..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        if in_string {
            out.push(c);
            if c == '\'' {
                in_string = false;
            }
            i += c.len_utf8();
            continue;
        }
        if c == '\'' {
            in_string = true;
            out.push(c);
            i += c.len_utf8();
            continue;
        }
        let at_word_boundary = out
            .chars()
            .next_back()
            .is_none_or(|p| !(p.is_alphanumeric() || p == '_' || p == '.' || p == '"'));
        if at_word_boundary {
            let prefix_len = if rest.starts_with(quoted.as_str()) {
                Some(quoted.len())
            } else if rest.starts_with(bare.as_str()) {
                Some(bare.len())
            } else {
                None
            };
            if let Some(len) = prefix_len
                && is_function_reference(&rest[len..])
            {
                i += len;
                continue;
            }
        }
        out.push(c);
        i += c.len_utf8();
    }
    out
}

/// True when `tail` starts with an identifier immediately followed by an
/// opening parenthesis, i.e. a function call.
fn is_function_reference(tail: &str) -> bool {
    let mut chars = tail.char_indices();
    let Some((_, first)) = chars.next() else {
        return false;
    };
    if first == '"' {
        // Quoted function name.
        if let Some(close) = tail[1..].find('"') {
            return tail[close + 2..].trim_start().starts_with('(');
        }
        return false;
    }
    if !(first.is_ascii_lowercase() || first == '_') {
        return false;
    }
    for (idx, c) in chars {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            continue;
        }
        return c == '(' && idx > 0;
    }
    false
}

/// Strip a leading `own_schema.` qualifier from a possibly qualified name,
/// e.g. a `regproc` rendering.
pub fn strip_own_prefix(name: &str, own_schema: &str) -> String {
    for prefix in [
        format!("{own_schema}."),
        format!("\"{}\".", own_schema.replace('"', "\"\"")),
    ] {
        if let Some(rest) = name.strip_prefix(prefix.as_str()) {
            return rest.to_string();
        }
    }
    name.to_string()
}

/// Rewrite an own-schema qualifier inside a `nextval` default so both
/// pipeline sides agree regardless of the `search_path` the deparser saw.
pub fn normalize_nextval_default(expression: &str, own_schema: &str) -> String {
    if !is_serial_default(expression, own_schema) {
        return expression.to_string();
    }
    match nextval_sequence(expression) {
        Some(sequence) => format!("nextval('{}'::regclass)", sequence),
        None => expression.to_string(),
    }
}

/// Extract the sequence name from a `nextval('...'::regclass)` default.
pub fn nextval_sequence(expression: &str) -> Option<String> {
    let inner = expression
        .strip_prefix("nextval('")?
        .strip_suffix("'::regclass)")?;
    let name = match inner.rfind('.') {
        Some(pos) => &inner[pos + 1..],
        None => inner,
    };
    let name = name.trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}

/// True when a default expression is the `nextval` call of a serial or
/// identity-backed sequence in the given schema.
pub fn is_serial_default(expression: &str, schema: &str) -> bool {
    if !expression.starts_with("nextval('") {
        return false;
    }
    let Some(inner) = expression
        .strip_prefix("nextval('")
        .and_then(|s| s.strip_suffix("'::regclass)"))
    else {
        return false;
    };
    match inner.rfind('.') {
        Some(pos) => {
            let qualifier = inner[..pos].trim_matches('"');
            qualifier == schema
        }
        None => true,
    }
}

/// Coarse type families used to decide whether a column type change has an
/// in-place migration path. Changes within a family get
/// `ALTER COLUMN ... TYPE ... USING`; changes across families recreate the
/// column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Numeric,
    Float,
    Character,
    Bytea,
    Boolean,
    Date,
    Time,
    Timestamp,
    Interval,
    Json,
    Uuid,
    Network,
    Other(String),
}

static NUMERIC_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(numeric|decimal)(\(\d+(,\s*\d+)?\))?$").unwrap());
static CHARACTER_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(text|character varying(\(\d+\))?|varchar(\(\d+\))?|character\(\d+\)|char\(\d+\)|bpchar)$")
        .unwrap()
});
static TIME_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^time(\(\d+\))?( with(out)? time zone)?$").unwrap());
static TIMESTAMP_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^timestamp(\(\d+\))?( with(out)? time zone)?$").unwrap());

impl TypeFamily {
    pub fn of(type_name: &str) -> Self {
        let name = type_name.trim().to_lowercase();
        match name.as_str() {
            "smallint" | "integer" | "bigint" | "int2" | "int4" | "int8" => return Self::Integer,
            "real" | "double precision" | "float4" | "float8" => return Self::Float,
            "boolean" | "bool" => return Self::Boolean,
            "bytea" => return Self::Bytea,
            "date" => return Self::Date,
            "interval" => return Self::Interval,
            "json" | "jsonb" => return Self::Json,
            "uuid" => return Self::Uuid,
            "inet" | "cidr" | "macaddr" | "macaddr8" => return Self::Network,
            _ => {}
        }
        if NUMERIC_TYPE.is_match(&name) {
            Self::Numeric
        } else if CHARACTER_TYPE.is_match(&name) {
            Self::Character
        } else if TIMESTAMP_TYPE.is_match(&name) {
            Self::Timestamp
        } else if TIME_TYPE.is_match(&name) {
            Self::Time
        } else {
            Self::Other(name)
        }
    }

    /// Whether an in-place `ALTER COLUMN ... TYPE` between the two families
    /// is sensible. Integer widening into numeric or float counts.
    pub fn convertible_to(&self, other: &TypeFamily) -> bool {
        if self == other {
            return true;
        }
        matches!(
            (self, other),
            (Self::Integer, Self::Numeric)
                | (Self::Integer, Self::Float)
                | (Self::Numeric, Self::Float)
                | (Self::Timestamp, Self::Date)
                | (Self::Date, Self::Timestamp)
        )
    }
}

// PostgreSQL truncates generated constraint names to fit NAMEDATALEN.
const MAX_IDENT_LEN: usize = 63;

fn assembled_name(table: &str, middle: &str, suffix: &str) -> String {
    fn join(table: &str, middle: &str, suffix: &str) -> String {
        if middle.is_empty() {
            format!("{table}_{suffix}")
        } else {
            format!("{table}_{middle}_{suffix}")
        }
    }

    let name = join(table, middle, suffix);
    if name.len() <= MAX_IDENT_LEN {
        return name;
    }

    // Mirror the server's makeObjectName truncation: shorten the longer of
    // the two leading parts until the whole name fits.
    let mut table_part = table.to_string();
    let mut middle_part = middle.to_string();
    while join(&table_part, &middle_part, suffix).len() > MAX_IDENT_LEN {
        if table_part.len() > middle_part.len() {
            table_part.pop();
        } else {
            middle_part.pop();
        }
    }
    join(&table_part, &middle_part, suffix)
}

/// The name PostgreSQL assigns to an anonymous primary key.
pub fn default_pkey_name(table: &str) -> String {
    assembled_name(table, "", "pkey")
}

/// The name PostgreSQL assigns to an anonymous unique constraint.
pub fn default_unique_name(table: &str, columns: &[String]) -> String {
    assembled_name(table, &columns.join("_"), "key")
}

/// The name PostgreSQL assigns to an anonymous foreign key.
pub fn default_fkey_name(table: &str, columns: &[String]) -> String {
    assembled_name(table, &columns.join("_"), "fkey")
}

/// The name PostgreSQL assigns to an anonymous check constraint.
pub fn default_check_name(table: &str, column: Option<&str>) -> String {
    assembled_name(table, column.unwrap_or(""), "check")
}

/// The name PostgreSQL assigns to the sequence behind a serial column.
pub fn serial_sequence_name(table: &str, column: &str) -> String {
    assembled_name(table, column, "seq")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_stay_bare() {
        assert_eq!(quote_ident("users"), "users");
        assert_eq!(quote_ident("user_accounts"), "user_accounts");
    }

    #[test]
    fn reserved_and_mixed_case_identifiers_get_quoted() {
        assert_eq!(quote_ident("user"), "\"user\"");
        assert_eq!(quote_ident("order"), "\"order\"");
        assert_eq!(quote_ident("MyTable"), "\"MyTable\"");
        assert_eq!(quote_ident("has space"), "\"has space\"");
        assert_eq!(quote_ident("has\"quote"), "\"has\"\"quote\"");
    }

    #[test]
    fn folding_matches_server_behavior() {
        assert_eq!(fold_ident("Users"), "users");
        assert_eq!(fold_ident("\"Users\""), "Users");
        assert_eq!(fold_ident("\"with\"\"quote\""), "with\"quote");
    }

    #[test]
    fn own_schema_call_is_stripped_from_default() {
        assert_eq!(
            strip_own_schema_calls("public.def_status()", "public"),
            "def_status()"
        );
        assert_eq!(
            strip_own_schema_calls("COALESCE(public.def_status(), 'x'::text)", "public"),
            "COALESCE(def_status(), 'x'::text)"
        );
    }

    #[test]
    fn cross_schema_call_is_preserved() {
        assert_eq!(
            strip_own_schema_calls("util.def_status()", "public"),
            "util.def_status()"
        );
    }

    #[test]
    fn qualifier_inside_string_literal_is_preserved() {
        assert_eq!(
            strip_own_schema_calls("'public.fn()'::text", "public"),
            "'public.fn()'::text"
        );
    }

    #[test]
    fn non_call_qualifier_is_preserved() {
        // A qualified column or table reference is not a function call.
        assert_eq!(
            strip_own_schema_calls("public.users.id", "public"),
            "public.users.id"
        );
    }

    #[test]
    fn nextval_extraction() {
        assert_eq!(
            nextval_sequence("nextval('orders_id_seq'::regclass)").as_deref(),
            Some("orders_id_seq")
        );
        assert_eq!(
            nextval_sequence("nextval('public.orders_id_seq'::regclass)").as_deref(),
            Some("orders_id_seq")
        );
        assert_eq!(
            nextval_sequence("nextval('\"public\".\"orders_id_seq\"'::regclass)").as_deref(),
            Some("orders_id_seq")
        );
        assert_eq!(nextval_sequence("now()"), None);
    }

    #[test]
    fn nextval_defaults_lose_their_own_schema_qualifier() {
        assert_eq!(
            normalize_nextval_default("nextval('public.users_id_seq'::regclass)", "public"),
            "nextval('users_id_seq'::regclass)"
        );
        assert_eq!(
            normalize_nextval_default("nextval('other.users_id_seq'::regclass)", "public"),
            "nextval('other.users_id_seq'::regclass)"
        );
    }

    #[test]
    fn serial_default_detection() {
        assert!(is_serial_default(
            "nextval('users_id_seq'::regclass)",
            "public"
        ));
        assert!(is_serial_default(
            "nextval('public.users_id_seq'::regclass)",
            "public"
        ));
        assert!(!is_serial_default(
            "nextval('other.users_id_seq'::regclass)",
            "public"
        ));
    }

    #[test]
    fn generated_constraint_names() {
        assert_eq!(default_pkey_name("users"), "users_pkey");
        assert_eq!(
            default_unique_name("users", &["email".into()]),
            "users_email_key"
        );
        assert_eq!(
            default_fkey_name("orders", &["user_id".into()]),
            "orders_user_id_fkey"
        );
        assert_eq!(default_check_name("users", Some("age")), "users_age_check");
        assert_eq!(serial_sequence_name("users", "id"), "users_id_seq");
    }

    #[test]
    fn long_names_are_truncated_to_identifier_limit() {
        let table = "t".repeat(40);
        let column = "c".repeat(40);
        let name = default_unique_name(&table, &[column]);
        assert!(name.len() <= 63);
        assert!(name.ends_with("_key"));
    }

    #[test]
    fn type_families_gate_in_place_conversion() {
        assert_eq!(TypeFamily::of("integer"), TypeFamily::Integer);
        assert_eq!(TypeFamily::of("character varying(50)"), TypeFamily::Character);
        assert_eq!(TypeFamily::of("numeric(10,2)"), TypeFamily::Numeric);
        assert_eq!(
            TypeFamily::of("timestamp with time zone"),
            TypeFamily::Timestamp
        );

        assert!(TypeFamily::of("integer").convertible_to(&TypeFamily::of("bigint")));
        assert!(TypeFamily::of("character varying(50)").convertible_to(&TypeFamily::of("text")));
        assert!(TypeFamily::of("integer").convertible_to(&TypeFamily::of("numeric(10,0)")));
        assert!(!TypeFamily::of("text").convertible_to(&TypeFamily::of("integer")));
        assert!(!TypeFamily::of("integer").convertible_to(&TypeFamily::of("uuid")));
    }

    #[test]
    fn type_qualification_policy() {
        assert_eq!(
            normalize_type_name("public", "pg_catalog", "integer"),
            "integer"
        );
        assert_eq!(
            normalize_type_name("public", "public", "public.mood"),
            "mood"
        );
        assert_eq!(
            normalize_type_name("public", "other", "other.mood"),
            "other.mood"
        );
    }
}
