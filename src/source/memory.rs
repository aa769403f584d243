//! In-memory entry source
//!
//! The crate's reference [`EntrySource`]: a fixed entry list with a
//! per-filter result cache. Hosts with real storage implement the trait
//! themselves; the CLI and the tests run on this one.

use crate::source::{EntryFilter, EntrySource, SourceResult, TimeEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// `Vec`-backed entry source with a filter-keyed cache.
pub struct MemorySource {
    entries: Vec<TimeEntry>,
    cache: Mutex<HashMap<EntryFilter, Vec<TimeEntry>>>,
}

impl MemorySource {
    pub fn new(entries: Vec<TimeEntry>) -> Self {
        Self {
            entries,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of entries held, before any filtering.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl EntrySource for MemorySource {
    async fn fetch(&self, filter: &EntryFilter) -> SourceResult<Vec<TimeEntry>> {
        let mut cache = self.cache.lock().expect("entry cache poisoned");
        if let Some(hit) = cache.get(filter) {
            return Ok(hit.clone());
        }
        let selected: Vec<TimeEntry> = self
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        cache.insert(filter.clone(), selected.clone());
        Ok(selected)
    }

    fn clear_cache(&self) {
        self.cache.lock().expect("entry cache poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DateRange;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_source() -> MemorySource {
        MemorySource::new(vec![
            TimeEntry::new(date(2023, 11, 6), 8.0).project("Acme"),
            TimeEntry::new(date(2024, 1, 2), 8.0).project("Acme"),
            TimeEntry::new(date(2024, 1, 3), 7.5).project("Beta"),
            TimeEntry::new(date(2024, 2, 1), 4.0).project("Acme"),
        ])
    }

    #[tokio::test]
    async fn test_fetch_unfiltered() {
        let source = sample_source();
        let all = source.fetch(&EntryFilter::new()).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_by_year_and_project() {
        let source = sample_source();
        let filter = EntryFilter::new().year(2024).project("Acme");
        let entries = source.fetch(&filter).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.project.as_deref() == Some("Acme")));
    }

    #[tokio::test]
    async fn test_fetch_by_date_range() {
        let source = sample_source();
        let filter = EntryFilter::new()
            .date_range(DateRange::new(date(2024, 1, 1), date(2024, 1, 31)));
        let entries = source.fetch(&filter).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_round_trip() {
        let source = sample_source();
        let filter = EntryFilter::new().year(2024);

        let first = source.fetch(&filter).await.unwrap();
        let cached = source.fetch(&filter).await.unwrap();
        assert_eq!(first, cached);

        source.clear_cache();
        let refreshed = source.fetch(&filter).await.unwrap();
        assert_eq!(first, refreshed);
    }
}
