//! Statement rewriting for the temporary-schema bounce.
//!
//! The authored file may qualify objects with the target schema; those
//! qualifiers are stripped so the objects land in the provider's temporary
//! schema via `search_path`. `ALTER DEFAULT PRIVILEGES ... IN SCHEMA
//! <target>` is repointed at the temporary schema. Statements that cannot
//! run inside a transaction are rejected outright: a desired-state file
//! declares state, not migration mechanics.

use crate::error::ParseError;
use crate::normalize::fold_ident;

use super::lexer::{Token, TokenKind, contains_keyword, leading_keywords, tokenize};

/// Reject statements that cannot execute inside a transaction, and
/// transaction control itself.
pub fn screen_statement(statement: &str) -> Result<(), ParseError> {
    let head = leading_keywords(statement, 3);
    let head: Vec<&str> = head.iter().map(|s| s.as_str()).collect();

    let rejected = match head.as_slice() {
        ["BEGIN", ..] | ["START", "TRANSACTION", ..] | ["COMMIT", ..] | ["ROLLBACK", ..]
        | ["SAVEPOINT", ..] => true,
        ["VACUUM", ..] => true,
        ["ALTER", "SYSTEM", ..] => true,
        ["CREATE", "DATABASE", ..] | ["DROP", "DATABASE", ..] => true,
        ["CREATE", "TABLESPACE", ..] | ["DROP", "TABLESPACE", ..] => true,
        ["CREATE", "INDEX", ..] | ["CREATE", "UNIQUE", "INDEX"] | ["DROP", "INDEX", ..]
        | ["REINDEX", ..] | ["REFRESH", "MATERIALIZED", ..] => {
            contains_keyword(statement, "CONCURRENTLY")
        }
        ["ALTER", "TYPE", ..] => has_keyword_pair(statement, "ADD", "VALUE"),
        _ => false,
    };

    if rejected {
        return Err(ParseError::UnsupportedStatement {
            statement: summarize(statement),
        });
    }
    Ok(())
}

fn has_keyword_pair(statement: &str, first: &str, second: &str) -> bool {
    let words: Vec<Token<'_>> = tokenize(statement)
        .into_iter()
        .filter(|t| t.kind == TokenKind::Word)
        .collect();
    words.windows(2).any(|pair| {
        pair[0].text.eq_ignore_ascii_case(first) && pair[1].text.eq_ignore_ascii_case(second)
    })
}

fn summarize(statement: &str) -> String {
    let flat = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 120 {
        let head: String = flat.chars().take(117).collect();
        format!("{head}...")
    } else {
        flat
    }
}

/// Strip `<target>.` qualifiers and repoint `IN SCHEMA <target>` at the
/// temporary schema. Qualifiers inside strings, comments, and function
/// bodies are left alone; cross-schema qualifiers are preserved.
pub fn rewrite_statement(statement: &str, target: &str, temp_schema: &str) -> String {
    let tokens = tokenize(statement);
    let mut out = String::with_capacity(statement.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];

        if names_schema(&token, target) {
            // `<target>.` qualifier, possibly with whitespace around the dot.
            let mut j = i + 1;
            while j < tokens.len() && tokens[j].kind == TokenKind::Whitespace {
                j += 1;
            }
            if j < tokens.len()
                && tokens[j].kind == TokenKind::Symbol
                && tokens[j].text == "."
            {
                i = j + 1;
                continue;
            }

            // `IN SCHEMA <target>` in a default-privileges statement.
            if preceded_by_in_schema(&tokens, i) {
                out.push_str(temp_schema);
                i += 1;
                continue;
            }
        }

        out.push_str(token.text);
        i += 1;
    }
    out
}

/// Remove `<schema>.` qualifiers from a deparsed expression or definition.
///
/// Both pipeline sides run this with their own schema name, so texts store
/// same-schema references unqualified no matter what `search_path` the
/// deparser saw. String literals and dollar-quoted bodies are opaque to the
/// token walk and stay untouched.
pub fn strip_qualifiers(text: &str, schema: &str) -> String {
    let tokens = tokenize(text);
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        if names_schema(&token, schema) {
            let mut j = i + 1;
            while j < tokens.len() && tokens[j].kind == TokenKind::Whitespace {
                j += 1;
            }
            if j < tokens.len() && tokens[j].kind == TokenKind::Symbol && tokens[j].text == "." {
                i = j + 1;
                continue;
            }
        }
        out.push_str(token.text);
        i += 1;
    }
    out
}

fn names_schema(token: &Token<'_>, target: &str) -> bool {
    match token.kind {
        TokenKind::Word => fold_ident(token.text) == target,
        TokenKind::QuotedIdent => fold_ident(token.text) == target,
        _ => false,
    }
}

fn preceded_by_in_schema(tokens: &[Token<'_>], at: usize) -> bool {
    let mut words = tokens[..at]
        .iter()
        .rev()
        .filter(|t| t.kind == TokenKind::Word);
    let schema_kw = words.next();
    let in_kw = words.next();
    matches!(
        (in_kw, schema_kw),
        (Some(a), Some(b))
            if a.text.eq_ignore_ascii_case("in") && b.text.eq_ignore_ascii_case("schema")
    )
}
