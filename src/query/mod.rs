//! Worklog query language
//!
//! A small clause-oriented language for selecting and shaping time
//! entries:
//!
//! - **Tokenizer**: query text → positioned tokens
//! - **Parser**: tokens → clause AST, predicate fields resolved against a
//!   handler registry
//! - **Interpreter**: clause AST → normalized [`Query`] with defaults
//!
//! # Query Language
//!
//! ```text
//! WHERE year = 2024 AND month = 12
//! SHOW date AS "Date", project AS "Work Order", hours AS "Hours"
//! VIEW table
//! SIZE compact
//! ```
//!
//! Keywords are case-insensitive, `//` comments are allowed, and clauses
//! may span lines. Omitted clauses default to `VIEW summary`,
//! `CHART monthly`, `PERIOD current-year`, `SIZE normal`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use worklog::query::{compile, HandlerRegistry};
//!
//! let registry = HandlerRegistry::builtin();
//! let query = compile("WHERE year = 2024\nVIEW table", &registry)?;
//! ```

mod ast;
mod error;
mod interpreter;
mod parser;
mod registry;
mod token;

pub use ast::{
    ChartKind, Clause, ColumnFormat, ColumnSpec, Comparison, Period, Predicate, Query,
    QueryBuilder, SizeMode, Value, ViewMode,
};
pub use error::{QueryError, QueryResult};
pub use interpreter::{compile, compile_or_default, interpret};
pub use parser::Parser;
pub use registry::{FieldEval, FieldHandler, HandlerRegistry, PushdownField, ValueKind};
pub use token::{tokenize, InvalidReason, Keyword, Position, Token, TokenKind};
