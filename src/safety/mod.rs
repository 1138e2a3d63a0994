//! Query safety validation module.
//!
//! Decides whether a candidate SQL string may reach the store. The default
//! [`ValidationMode::Keyword`] inspects the text with a small lexer: the first
//! significant token must be `SELECT` and no denylisted keyword may appear as a
//! whole word outside quoted literals or identifiers. [`ValidationMode::Strict`]
//! additionally parses the text and requires a single read-only query.

mod lexer;
mod parser;
mod validator;

pub use lexer::statement_count;
pub use parser::check_single_read_statement;
pub use validator::{validate, validate_with, DENYLIST};

use serde::{Deserialize, Serialize};
use std::fmt;

/// How thoroughly candidate queries are inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Leading-token and keyword-denylist checks on the raw text.
    #[default]
    Keyword,
    /// Keyword checks followed by an AST check for a single read-only query.
    Strict,
}

impl ValidationMode {
    /// Returns the mode as a string for display and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Strict => "strict",
        }
    }
}

impl std::str::FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "strict" => Ok(Self::Strict),
            _ => Err(format!(
                "Invalid validation mode: {s}. Expected: keyword or strict"
            )),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a candidate query was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The first significant token is not `SELECT`.
    NotAReadQuery,
    /// A denylisted keyword appears as a whole word.
    ForbiddenKeyword(&'static str),
    /// Strict mode only: the text does not parse.
    Unparseable(String),
    /// Strict mode only: more than one statement, or a statement that can write.
    NotSingleReadStatement,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAReadQuery => write!(f, "not a read query"),
            Self::ForbiddenKeyword(keyword) => write!(f, "forbidden keyword: {keyword}"),
            Self::Unparseable(message) => write!(f, "unparseable query: {message}"),
            Self::NotSingleReadStatement => write!(f, "not a single read-only statement"),
        }
    }
}

/// Outcome of validating a candidate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationVerdict {
    /// The query may be executed.
    Allowed,
    /// The query must not reach the store.
    Rejected(Rejection),
}

impl ValidationVerdict {
    /// Returns true if the query may be executed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns the rejection reason, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Allowed => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

impl fmt::Display for ValidationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "Allowed"),
            Self::Rejected(reason) => write!(f, "Rejected({reason})"),
        }
    }
}
