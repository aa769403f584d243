//! Execution engine
//!
//! Turns a normalized query into a report:
//!
//! - **Executor**: coarse retrieval, residual filtering, orchestration
//! - **Aggregation**: monthly buckets, summaries, trend series
//! - **Calendar**: working-day math and period windows
//!
//! # Examples
//!
//! ```rust,ignore
//! use worklog::engine::Executor;
//!
//! let executor = Executor::new(source, settings);
//! let report = executor.execute_str("WHERE year = 2024\nVIEW table").await?;
//! println!("{} hours", report.summary.total_hours);
//! ```

pub mod aggregate;
pub mod calendar;
mod executor;
mod types;

pub use executor::Executor;
pub use types::{MonthlyDataPoint, Report, SummaryData, TrendData};
