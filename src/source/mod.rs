//! Time entry data sources
//!
//! The engine never reads files itself; it consumes entries through the
//! narrow [`EntrySource`] seam:
//!
//! - [`EntrySource`]: async trait a host application implements
//! - [`MemorySource`]: `Vec`-backed reference implementation with a
//!   result cache
//! - [`CsvImporter`]: header-mapped CSV loading for the CLI
//!
//! A source receives an [`EntryFilter`] and returns the entries it
//! believes satisfy it; the engine re-applies every predicate in memory,
//! so a source may over-approximate freely.

mod csv_import;
mod error;
mod memory;
mod types;

pub use csv_import::{CsvImport, CsvImporter};
pub use error::{SourceError, SourceResult};
pub use memory::MemorySource;
pub use types::{DateRange, EntryFilter, TimeEntry};

use async_trait::async_trait;

/// Common trait for all entry sources.
#[async_trait]
pub trait EntrySource: Send + Sync {
    /// Fetch entries satisfying the coarse filter.
    ///
    /// Returned entries must have non-negative hours. Ordering is
    /// unspecified.
    async fn fetch(&self, filter: &EntryFilter) -> SourceResult<Vec<TimeEntry>>;

    /// Drop any cached results. Safe to call between executions.
    fn clear_cache(&self);
}
