//! Keyword-based read-only validation.

use super::lexer::{is_word_char, lex, Lexeme};
use super::parser::check_single_read_statement;
use super::{Rejection, ValidationMode, ValidationVerdict};

/// Keywords whose presence as a whole word forces rejection.
pub const DENYLIST: [&str; 13] = [
    "DROP", "DELETE", "TRUNCATE", "ALTER", "CREATE", "INSERT", "UPDATE", "EXEC", "EXECUTE",
    "GRANT", "REVOKE", "MERGE", "REPLACE",
];

/// Validates a candidate query in [`ValidationMode::Keyword`].
///
/// Pure function of its input. The text itself is never modified; words are
/// compared case-insensitively. A denylisted word anywhere outside quoted
/// literals and identifiers (comments included) wins over the leading-token
/// check, so `DELETE FROM sales` is reported as a forbidden keyword.
pub fn validate(candidate: &str) -> ValidationVerdict {
    let lexemes = lex(candidate);

    if let Some(keyword) = lexemes.iter().find_map(forbidden_keyword) {
        return ValidationVerdict::Rejected(Rejection::ForbiddenKeyword(keyword));
    }

    let leading = lexemes
        .iter()
        .find(|lexeme| !matches!(lexeme, Lexeme::Comment(_)));
    match leading {
        Some(Lexeme::Word(word)) if word.eq_ignore_ascii_case("SELECT") => {
            ValidationVerdict::Allowed
        }
        _ => ValidationVerdict::Rejected(Rejection::NotAReadQuery),
    }
}

/// Validates a candidate query using the given mode.
pub fn validate_with(mode: ValidationMode, candidate: &str) -> ValidationVerdict {
    let verdict = validate(candidate);
    match (mode, verdict) {
        (ValidationMode::Strict, ValidationVerdict::Allowed) => {
            match check_single_read_statement(candidate) {
                Ok(()) => ValidationVerdict::Allowed,
                Err(reason) => ValidationVerdict::Rejected(reason),
            }
        }
        (_, verdict) => verdict,
    }
}

/// Returns the denylisted keyword carried by a lexeme, if any.
fn forbidden_keyword(lexeme: &Lexeme<'_>) -> Option<&'static str> {
    match lexeme {
        Lexeme::Word(word) => denylisted(word),
        Lexeme::Comment(body) => body
            .split(|c: char| !is_word_char(c))
            .filter(|word| !word.is_empty())
            .find_map(denylisted),
        _ => None,
    }
}

fn denylisted(word: &str) -> Option<&'static str> {
    DENYLIST
        .iter()
        .find(|keyword| word.eq_ignore_ascii_case(keyword))
        .copied()
}
