//! # worklog
//!
//! A query language and aggregation engine for time-tracking records.
//!
//! ## Features
//!
//! - **Query language**: `WHERE`/`SHOW`/`VIEW`/`CHART`/`PERIOD`/`SIZE`
//!   clauses with comments, quoted literals and case-insensitive keywords
//! - **Extensible predicates**: a handler registry lets callers add
//!   `WHERE` fields without touching the grammar
//! - **Aggregation**: monthly buckets, trend series and summary rollups
//!   with well-defined zero-denominator behavior
//! - **Narrow seams**: entries arrive through an async [`EntrySource`];
//!   defaults come from a read-only [`Settings`] value
//!
//! ## Modules
//!
//! - [`query`]: tokenizer, parser, interpreter and handler registry
//! - [`engine`]: executor, aggregation and calendar math
//! - [`source`]: the `EntrySource` trait plus in-memory and CSV sources
//! - [`config`]: settings loading
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use worklog::{Executor, MemorySource, Settings, TimeEntry};
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let entries = vec![
//!         TimeEntry::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 8.0)
//!             .rate(75.0)
//!             .project("Acme Redesign"),
//!     ];
//!     let executor = Executor::new(Arc::new(MemorySource::new(entries)), Settings::default());
//!
//!     let report = executor
//!         .execute_str("WHERE year = 2024\nVIEW table")
//!         .await?;
//!
//!     println!("{} hours logged", report.summary.total_hours);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod query;
pub mod source;

// Re-export top-level types for convenience
pub use config::{ConfigError, ProjectConfig, ProjectKind, Settings};

pub use engine::{Executor, MonthlyDataPoint, Report, SummaryData, TrendData};

pub use query::{
    compile, compile_or_default, ChartKind, ColumnFormat, ColumnSpec, Comparison, FieldHandler,
    HandlerRegistry, Period, Predicate, Query, QueryBuilder, QueryError, QueryResult, SizeMode,
    Value, ViewMode,
};

pub use source::{
    CsvImport, CsvImporter, DateRange, EntryFilter, EntrySource, MemorySource, SourceError,
    SourceResult, TimeEntry,
};
