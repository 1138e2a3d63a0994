//! Minimal SQL lexer used for keyword inspection.
//!
//! Splits text into words, punctuation, comments and quoted spans. Quoted
//! string literals and quoted identifiers are opaque; comment bodies are kept
//! so callers can still inspect them. Unterminated quotes and comments run to
//! the end of the input.

use std::iter::Peekable;
use std::str::CharIndices;

/// A lexical unit of SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lexeme<'a> {
    /// Bare word: keyword, unquoted identifier or number.
    Word(&'a str),
    /// Single-quoted string literal.
    Literal,
    /// Identifier in double quotes, backticks or brackets.
    QuotedIdent,
    /// Body of a `--` or `/* */` comment.
    Comment(&'a str),
    /// Any other single character.
    Punct(char),
}

/// Returns true for characters that continue a bare word.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}

/// Splits SQL text into lexemes. Whitespace is dropped.
pub(crate) fn lex(sql: &str) -> Vec<Lexeme<'_>> {
    let mut lexemes = Vec::new();
    let mut chars = sql.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '-' if matches!(chars.peek(), Some(&(_, '-'))) => {
                chars.next();
                let end = line_comment_end(sql, &mut chars);
                lexemes.push(Lexeme::Comment(&sql[start + 2..end]));
            }
            '/' if matches!(chars.peek(), Some(&(_, '*'))) => {
                chars.next();
                let end = block_comment_end(sql, &mut chars);
                lexemes.push(Lexeme::Comment(&sql[start + 2..end]));
            }
            '\'' => {
                skip_quoted(&mut chars, '\'');
                lexemes.push(Lexeme::Literal);
            }
            '"' | '`' => {
                skip_quoted(&mut chars, c);
                lexemes.push(Lexeme::QuotedIdent);
            }
            '[' => {
                skip_quoted(&mut chars, ']');
                lexemes.push(Lexeme::QuotedIdent);
            }
            c if is_word_char(c) => {
                let mut end = sql.len();
                while let Some(&(i, next)) = chars.peek() {
                    if !is_word_char(next) {
                        end = i;
                        break;
                    }
                    chars.next();
                }
                lexemes.push(Lexeme::Word(&sql[start..end]));
            }
            other => lexemes.push(Lexeme::Punct(other)),
        }
    }

    lexemes
}

/// Counts the statements in SQL text.
///
/// Statements are separated by `;` outside literals, quoted identifiers and
/// comments. Segments holding only comments or whitespace do not count, so
/// `SELECT 1;` and `SELECT 1; -- done` are one statement.
pub fn statement_count(sql: &str) -> usize {
    let mut count = 0;
    let mut open = false;

    for lexeme in lex(sql) {
        match lexeme {
            Lexeme::Punct(';') => open = false,
            Lexeme::Comment(_) => {}
            _ if !open => {
                open = true;
                count += 1;
            }
            _ => {}
        }
    }

    count
}

/// Consumes a line comment body, leaving the newline in place.
fn line_comment_end(sql: &str, chars: &mut Peekable<CharIndices<'_>>) -> usize {
    while let Some(&(i, c)) = chars.peek() {
        if c == '\n' {
            return i;
        }
        chars.next();
    }
    sql.len()
}

/// Consumes a block comment including its terminator; returns the body end.
fn block_comment_end(sql: &str, chars: &mut Peekable<CharIndices<'_>>) -> usize {
    let mut prev = None;
    for (i, c) in chars.by_ref() {
        if prev == Some('*') && c == '/' {
            return i - 1;
        }
        prev = Some(c);
    }
    sql.len()
}

/// Consumes a quoted span. A doubled closing quote is an escape, except for brackets.
fn skip_quoted(chars: &mut Peekable<CharIndices<'_>>, close: char) {
    while let Some((_, c)) = chars.next() {
        if c != close {
            continue;
        }
        if close != ']' && matches!(chars.peek(), Some(&(_, next)) if next == close) {
            chars.next();
            continue;
        }
        return;
    }
}
