//! SQL lexing for desired-state files.
//!
//! The engine never interprets SQL semantics itself; it only needs to split
//! a file into statements and walk tokens to rewrite schema qualifiers and
//! screen statement heads. The lexer understands the quoting forms that make
//! naive splitting wrong: string literals (including `E''` escapes), quoted
//! identifiers, dollar quoting, and both comment styles.

use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_while, take_while1},
    combinator::recognize,
    sequence::pair,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare identifier or keyword.
    Word,
    /// `"Quoted Identifier"`, quotes included in the text.
    QuotedIdent,
    /// `'...'` or `E'...'`, quotes included.
    StringLit,
    /// `$tag$...$tag$`, delimiters included.
    DollarString,
    /// `-- ...` or `/* ... */`.
    Comment,
    Whitespace,
    /// Any single other character: punctuation, operators.
    Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

fn word(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    ))
    .parse(input)
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_whitespace()).parse(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("--"), take_while(|c| c != '\n'))).parse(input)
}

/// Block comment with PostgreSQL's nesting rule.
fn block_comment(input: &str) -> IResult<&str, &str> {
    if !input.starts_with("/*") {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    let mut depth = 0usize;
    let mut i = 0usize;
    let bytes = input.as_bytes();
    while i < bytes.len() {
        if input[i..].starts_with("/*") {
            depth += 1;
            i += 2;
        } else if input[i..].starts_with("*/") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return Ok((&input[i..], &input[..i]));
            }
        } else {
            i += input[i..].chars().next().map_or(1, |c| c.len_utf8());
        }
    }
    // Unterminated comment: consume the rest, the server will complain.
    Ok(("", input))
}

/// `'...'` with `''` doubling, optionally `E`-prefixed with backslash
/// escapes.
fn string_literal(input: &str) -> IResult<&str, &str> {
    let escaped = input.starts_with("E'") || input.starts_with("e'");
    let body_start = if escaped { 2 } else { 1 };
    if !escaped && !input.starts_with('\'') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }
    let bytes = input.as_bytes();
    let mut i = body_start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if escaped => i += 2,
            b'\'' => {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                } else {
                    return Ok((&input[i + 1..], &input[..i + 1]));
                }
            }
            _ => i += input[i..].chars().next().map_or(1, |c| c.len_utf8()),
        }
    }
    Ok(("", input))
}

fn quoted_ident(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('"') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }
    let bytes = input.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                i += 2;
            } else {
                return Ok((&input[i + 1..], &input[..i + 1]));
            }
        } else {
            i += input[i..].chars().next().map_or(1, |c| c.len_utf8());
        }
    }
    Ok(("", input))
}

/// `$tag$ ... $tag$` where the tag is a possibly empty identifier.
fn dollar_string(input: &str) -> IResult<&str, &str> {
    let rest = input.strip_prefix('$').ok_or_else(|| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))
    })?;
    let tag_len = rest
        .char_indices()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    if !rest[tag_len..].starts_with('$') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }
    let delimiter = &input[..tag_len + 2];
    let body_start = delimiter.len();
    match input[body_start..].find(delimiter) {
        Some(end) => {
            let total = body_start + end + delimiter.len();
            Ok((&input[total..], &input[..total]))
        }
        None => Ok(("", input)),
    }
}

/// Tokenize a chunk of SQL. The concatenation of all token texts is the
/// input, so a rewriter can emit tokens verbatim.
pub fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = sql;
    while !rest.is_empty() {
        let (kind, text, remaining) = next_token(rest);
        tokens.push(Token { kind, text });
        rest = remaining;
    }
    tokens
}

fn next_token(input: &str) -> (TokenKind, &str, &str) {
    if let Ok((rest, text)) = whitespace(input) {
        return (TokenKind::Whitespace, text, rest);
    }
    if input.starts_with("--")
        && let Ok((rest, text)) = line_comment(input)
    {
        return (TokenKind::Comment, text, rest);
    }
    if input.starts_with("/*")
        && let Ok((rest, text)) = block_comment(input)
    {
        return (TokenKind::Comment, text, rest);
    }
    if let Ok((rest, text)) = string_literal(input) {
        return (TokenKind::StringLit, text, rest);
    }
    if let Ok((rest, text)) = quoted_ident(input) {
        return (TokenKind::QuotedIdent, text, rest);
    }
    if let Ok((rest, text)) = dollar_string(input) {
        return (TokenKind::DollarString, text, rest);
    }
    if let Ok((rest, text)) = word(input) {
        return (TokenKind::Word, text, rest);
    }
    let len = input.chars().next().map_or(1, |c| c.len_utf8());
    (TokenKind::Symbol, &input[..len], &input[len..])
}

/// Split a file into `;`-terminated statements, comments preserved.
/// Statements that are blank or comment-only are dropped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut buffer = String::new();
    let mut has_code = false;

    for token in tokenize(sql) {
        if token.kind == TokenKind::Symbol && token.text == ";" {
            if has_code {
                statements.push(buffer.trim().to_string());
            }
            buffer.clear();
            has_code = false;
            continue;
        }
        if !matches!(token.kind, TokenKind::Whitespace | TokenKind::Comment) {
            has_code = true;
        }
        buffer.push_str(token.text);
    }
    if has_code {
        statements.push(buffer.trim().to_string());
    }
    statements
}

/// Uppercased leading keywords of a statement, comments skipped. Enough of
/// the head to classify the statement kind.
pub fn leading_keywords(statement: &str, limit: usize) -> Vec<String> {
    tokenize(statement)
        .into_iter()
        .filter(|t| t.kind == TokenKind::Word)
        .take(limit)
        .map(|t| t.text.to_uppercase())
        .collect()
}

/// True when the statement contains `word` as a bare keyword outside
/// strings, comments, and quoted identifiers.
pub fn contains_keyword(statement: &str, word: &str) -> bool {
    tokenize(statement)
        .iter()
        .any(|t| t.kind == TokenKind::Word && t.text.eq_ignore_ascii_case(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_top_level_semicolons_only() {
        let sql = "CREATE TABLE a (x text DEFAULT ';');\nCREATE TABLE b (y int); -- trailing ; comment\n";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("DEFAULT ';'"));
        assert!(statements[1].starts_with("CREATE TABLE b"));
    }

    #[test]
    fn dollar_quoted_bodies_are_opaque() {
        let sql = "CREATE FUNCTION f() RETURNS void LANGUAGE plpgsql AS $$ BEGIN PERFORM 1; END; $$;\nSELECT 1;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("END; $$"));
    }

    #[test]
    fn tagged_dollar_quotes_respect_their_tag() {
        let sql = "CREATE FUNCTION f() RETURNS text AS $body$ SELECT '$$'; $body$ LANGUAGE sql;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn comments_do_not_split_statements() {
        let sql = "CREATE TABLE a (\n  x int -- trailing; with semicolon\n);\n/* block; comment */ CREATE TABLE b (y int);";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn nested_block_comments_close_correctly() {
        let sql = "/* outer /* inner; */ still outer; */ SELECT 1;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].ends_with("SELECT 1"));
    }

    #[test]
    fn escaped_string_literals_hide_quotes() {
        let sql = r"INSERT INTO t VALUES (E'a\';b');INSERT INTO t VALUES ('x');";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn comment_only_chunks_are_dropped() {
        let sql = "-- a comment\n;\nCREATE TABLE a (x int);";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn keyword_helpers_skip_strings_and_comments() {
        let statement = "CREATE INDEX -- CONCURRENTLY in a comment\n idx ON t (a)";
        assert!(!contains_keyword(statement, "CONCURRENTLY"));
        assert_eq!(
            leading_keywords(statement, 2),
            vec!["CREATE".to_string(), "INDEX".to_string()]
        );

        let statement = "SELECT 'CONCURRENTLY'";
        assert!(!contains_keyword(statement, "CONCURRENTLY"));

        let statement = "CREATE INDEX CONCURRENTLY idx ON t (a)";
        assert!(contains_keyword(statement, "CONCURRENTLY"));
    }

    #[test]
    fn tokens_round_trip_verbatim() {
        let sql = "ALTER TABLE \"My Table\" ADD COLUMN x text DEFAULT 'a;b' /* c */;";
        let rebuilt: String = tokenize(sql).iter().map(|t| t.text).collect();
        assert_eq!(rebuilt, sql);
    }
}
