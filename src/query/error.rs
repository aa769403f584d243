//! Query error types
//!
//! The three-way error taxonomy of the query pipeline: syntax errors from
//! the tokenizer/parser, semantic errors from the interpreter, and data
//! source failures surfaced by the executor. Syntax and semantic errors
//! carry the offending token's position when one is available.

use crate::query::token::Position;
use crate::source::SourceError;
use thiserror::Error;

/// Errors that can occur while compiling or executing a query.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Malformed query text: unknown keyword, missing operator or value,
    /// unterminated string, invalid enumerated value.
    #[error("syntax error at {position}: {message}")]
    Syntax { message: String, position: Position },

    /// Grammatically valid but meaningless: unregistered field, `BETWEEN`
    /// on a non-range field, value of the wrong kind.
    #[error("semantic error{}: {message}", fmt_at(.position))]
    Semantic {
        message: String,
        position: Option<Position>,
    },

    /// The underlying data source failed; propagated unchanged, no retries.
    #[error("data source error: {0}")]
    Source(#[from] SourceError),
}

impl QueryError {
    pub(crate) fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn semantic(message: impl Into<String>, position: Option<Position>) -> Self {
        Self::Semantic {
            message: message.into(),
            position,
        }
    }
}

fn fmt_at(position: &Option<Position>) -> String {
    match position {
        Some(p) => format!(" at {p}"),
        None => String::new(),
    }
}

/// Result type alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
