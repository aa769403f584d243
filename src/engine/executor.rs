//! Query executor
//!
//! Resolves a normalized [`Query`] against an [`EntrySource`] and
//! aggregates the result:
//!
//! ```text
//! Query → coarse filter → fetch → residual filter → aggregate → Report
//! ```
//!
//! Pushdown-capable predicates (`year`, `month`, `project`, `date
//! BETWEEN`) and relative periods become the coarse [`EntryFilter`]; the
//! source returns a believed superset, and every predicate is re-checked
//! in memory, so residual and pushed-down filtering share one code path.
//! A single fetch happens per execution and aggregation starts only once
//! it completes. Data source failures propagate unchanged; empty result
//! sets degrade to zero-valued aggregates.

use crate::config::Settings;
use crate::engine::types::Report;
use crate::engine::{aggregate, calendar};
use crate::query::{
    Comparison, FieldEval, HandlerRegistry, Query, QueryError, QueryResult, Value,
};
use crate::source::{DateRange, EntryFilter, EntrySource, TimeEntry};
use chrono::{Datelike, NaiveDate, Utc};
use std::sync::Arc;

/// Executes queries against a data source.
///
/// Holds no mutable state; concurrent executions only share the source's
/// own cache.
pub struct Executor {
    source: Arc<dyn EntrySource>,
    settings: Settings,
    registry: HandlerRegistry,
}

impl Executor {
    /// Create an executor with the built-in field handlers.
    pub fn new(source: Arc<dyn EntrySource>, settings: Settings) -> Self {
        Self::with_registry(source, settings, HandlerRegistry::builtin())
    }

    /// Create an executor with a customized handler registry.
    pub fn with_registry(
        source: Arc<dyn EntrySource>,
        settings: Settings,
        registry: HandlerRegistry,
    ) -> Self {
        Self {
            source,
            settings,
            registry,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Compile and execute a query text.
    pub async fn execute_str(&self, text: &str) -> QueryResult<Report> {
        let query = crate::query::compile(text, &self.registry)?;
        self.execute(&query).await
    }

    /// Execute a query, anchoring relative periods at today's UTC date.
    pub async fn execute(&self, query: &Query) -> QueryResult<Report> {
        self.execute_as_of(query, Utc::now().date_naive()).await
    }

    /// Execute a query with an explicit "today", for deterministic
    /// callers and tests.
    pub async fn execute_as_of(&self, query: &Query, today: NaiveDate) -> QueryResult<Report> {
        // Builder-made queries skip the interpreter, so re-check that
        // every predicate field is registered before touching the source.
        for predicate in &query.predicates {
            if !self.registry.contains(&predicate.field) {
                return Err(QueryError::semantic(
                    format!("unknown field '{}'", predicate.field),
                    predicate.position,
                ));
            }
        }

        let pool = match self.coarse_filter(query, today) {
            Some(filter) => {
                tracing::debug!(?filter, "fetching entries");
                let entries = self.source.fetch(&filter).await?;
                tracing::debug!("fetched {} entries", entries.len());
                self.residual_filter(entries, query)
            }
            // Contradictory date bounds: nothing can match.
            None => Vec::new(),
        };

        let period_entries = match calendar::window(query.period, today) {
            Some(window) => select(&pool, |e| window.contains(e.date)),
            None => pool.clone(),
        };
        let year_entries = match DateRange::year(today.year()) {
            Some(window) => select(&pool, |e| window.contains(e.date)),
            None => Vec::new(),
        };

        let monthly = aggregate::monthly_points(&pool, &self.settings);
        let trend = aggregate::trend_series(&monthly, query.period, query.size);
        let summary = aggregate::summarize(&period_entries, &self.settings);
        let year_summary = aggregate::summarize(&year_entries, &self.settings);
        let all_time_summary = aggregate::summarize(&pool, &self.settings);

        Ok(Report {
            entries: pool,
            monthly,
            trend,
            summary,
            year_summary,
            all_time_summary,
        })
    }

    /// Translate pushdown-capable predicates plus the period shortcut
    /// into the coarse filter. `None` means the date bounds contradict
    /// each other and the result is provably empty.
    fn coarse_filter(&self, query: &Query, today: NaiveDate) -> Option<EntryFilter> {
        use crate::query::PushdownField::*;

        // Intersect a new bound into the accumulated date range; a
        // missing intersection means nothing can match.
        fn narrow(range: &mut Option<DateRange>, empty: &mut bool, next: DateRange) {
            match range {
                Some(current) => match current.intersection(&next) {
                    Some(both) => *range = Some(both),
                    None => *empty = true,
                },
                None => *range = Some(next),
            }
        }

        let mut filter = EntryFilter::new();
        let mut range: Option<DateRange> = None;
        let mut empty = false;

        for predicate in &query.predicates {
            let Some(handler) = self.registry.get(&predicate.field) else {
                continue;
            };
            let FieldEval::Pushdown(field) = &handler.eval else {
                continue;
            };
            match (field, &predicate.comparison) {
                (Year, Comparison::Eq(Value::Number(n))) if n.fract() == 0.0 => {
                    filter.year = Some(*n as i32);
                }
                (Month, Comparison::Eq(Value::Number(n))) if n.fract() == 0.0 => {
                    filter.month = Some(*n as u32);
                }
                (Project, Comparison::Eq(Value::Text(name))) => {
                    filter.project = Some(name.clone());
                }
                (Date, Comparison::Eq(Value::Date(date))) => {
                    narrow(&mut range, &mut empty, DateRange::day(*date));
                }
                (Date, Comparison::Between(Value::Date(lo), Value::Date(hi))) => {
                    match DateRange::try_new(*lo, *hi) {
                        Some(between) => narrow(&mut range, &mut empty, between),
                        None => empty = true,
                    }
                }
                // Forms the source cannot express stay residual-only.
                _ => {}
            }
        }

        if let Some(window) = calendar::pushdown_window(query.period, today) {
            narrow(&mut range, &mut empty, window);
        }

        if empty {
            return None;
        }
        filter.date_range = range;
        Some(filter)
    }

    /// Apply every predicate in memory and sort the survivors by date.
    fn residual_filter(&self, entries: Vec<TimeEntry>, query: &Query) -> Vec<TimeEntry> {
        let mut pool: Vec<TimeEntry> = entries
            .into_iter()
            .filter(|entry| self.entry_matches(entry, query))
            .collect();
        pool.sort_by_key(|e| e.date);
        pool
    }

    fn entry_matches(&self, entry: &TimeEntry, query: &Query) -> bool {
        query.predicates.iter().all(|predicate| {
            match self.registry.get(&predicate.field).map(|h| &h.eval) {
                Some(FieldEval::Pushdown(field)) => field.matches(entry, &predicate.comparison),
                Some(FieldEval::Residual(matches)) => {
                    matches(entry, &predicate.comparison, &self.settings)
                }
                None => false,
            }
        })
    }
}

fn select(pool: &[TimeEntry], keep: impl Fn(&TimeEntry) -> bool) -> Vec<TimeEntry> {
    pool.iter().filter(|e| keep(e)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProjectConfig, ProjectKind};
    use crate::source::{MemorySource, SourceError, SourceResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn executor_with(entries: Vec<TimeEntry>, settings: Settings) -> Executor {
        Executor::new(Arc::new(MemorySource::new(entries)), settings)
    }

    #[tokio::test]
    async fn test_end_to_end_january() {
        let executor = executor_with(
            vec![
                TimeEntry::new(date(2024, 1, 2), 8.0).rate(75.0),
                TimeEntry::new(date(2024, 1, 3), 7.5).rate(75.0),
            ],
            Settings::default(),
        );
        let query = crate::query::compile(
            r#"WHERE date BETWEEN "2024-01-01" AND "2024-01-31" SHOW date, hours VIEW table"#,
            executor.registry(),
        )
        .unwrap();

        let report = executor
            .execute_as_of(&query, date(2024, 6, 15))
            .await
            .unwrap();

        assert_eq!(report.monthly.len(), 1);
        let january = &report.monthly[0];
        assert_eq!((january.year, january.month), (2024, 1));
        assert_eq!(january.hours, 15.5);
        assert_eq!(january.invoiced, 1162.5);
        assert_eq!(january.rate, 75.0);
        assert_eq!(report.trend.labels, vec!["January 2024"]);
        assert_eq!(report.summary.total_hours, 15.5);
    }

    #[tokio::test]
    async fn test_residual_predicates_drop_entries() {
        let executor = executor_with(
            vec![
                TimeEntry::new(date(2024, 1, 2), 8.0)
                    .rate(90.0)
                    .category("Backend Development"),
                TimeEntry::new(date(2024, 1, 3), 8.0)
                    .rate(60.0)
                    .category("Design Review"),
            ],
            Settings::default(),
        );

        let report = executor
            .execute_str(r#"WHERE service = "backend" AND value = 75"#)
            .await
            .unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(
            report.entries[0].category.as_deref(),
            Some("Backend Development")
        );
    }

    #[tokio::test]
    async fn test_summaries_cover_three_windows() {
        let executor = executor_with(
            vec![
                TimeEntry::new(date(2022, 5, 2), 10.0),
                TimeEntry::new(date(2024, 1, 8), 8.0),
                TimeEntry::new(date(2024, 3, 4), 6.0),
            ],
            Settings::default(),
        );
        let query = Query::default(); // period defaults to current-year

        let report = executor
            .execute_as_of(&query, date(2024, 6, 15))
            .await
            .unwrap();

        assert_eq!(report.summary.total_hours, 14.0);
        assert_eq!(report.year_summary.total_hours, 14.0);
        assert_eq!(report.all_time_summary.total_hours, 24.0);
        // Monthly series covers the whole pool.
        assert_eq!(report.monthly.len(), 3);
    }

    #[tokio::test]
    async fn test_relative_period_is_pushed_down() {
        let executor = executor_with(
            vec![
                TimeEntry::new(date(2023, 1, 10), 8.0),
                TimeEntry::new(date(2024, 5, 10), 6.0),
            ],
            Settings::default(),
        );
        let query = crate::query::compile("PERIOD last-6-months", executor.registry()).unwrap();

        let report = executor
            .execute_as_of(&query, date(2024, 6, 15))
            .await
            .unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.all_time_summary.total_hours, 6.0);
    }

    #[tokio::test]
    async fn test_empty_result_degrades_to_zero() {
        let executor = executor_with(Vec::new(), Settings::default());
        let report = executor.execute_str("WHERE year = 2024").await.unwrap();

        assert!(report.entries.is_empty());
        assert!(report.monthly.is_empty());
        assert!(report.trend.is_empty());
        assert_eq!(report.summary.total_hours, 0.0);
        assert_eq!(report.summary.utilization, 0.0);
        assert!(report.summary.utilization.is_finite());
    }

    #[tokio::test]
    async fn test_contradictory_date_bounds_yield_empty() {
        let executor = executor_with(
            vec![TimeEntry::new(date(2024, 1, 2), 8.0)],
            Settings::default(),
        );
        let report = executor
            .execute_str(
                r#"WHERE date BETWEEN "2024-01-01" AND "2024-01-31" AND date BETWEEN "2024-03-01" AND "2024-03-31""#,
            )
            .await
            .unwrap();
        assert!(report.entries.is_empty());
    }

    #[tokio::test]
    async fn test_idempotent_execution() {
        let executor = executor_with(
            vec![
                TimeEntry::new(date(2024, 1, 2), 8.0).rate(75.0),
                TimeEntry::new(date(2024, 2, 6), 5.0).rate(80.0),
            ],
            Settings::default(),
        );
        let query = crate::query::compile("WHERE year = 2024", executor.registry()).unwrap();

        let today = date(2024, 6, 15);
        let first = executor.execute_as_of(&query, today).await.unwrap();
        let second = executor.execute_as_of(&query, today).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_budget_scenario() {
        let mut settings = Settings::default();
        settings.project = Some(ProjectConfig {
            name: "Acme Redesign".to_string(),
            kind: ProjectKind::FixedBudget,
            budget_hours: Some(120.0),
        });
        let executor = executor_with(
            vec![
                TimeEntry::new(date(2024, 1, 10), 40.0),
                TimeEntry::new(date(2024, 2, 12), 38.5),
            ],
            settings,
        );

        let report = executor
            .execute_as_of(&Query::default(), date(2024, 6, 15))
            .await
            .unwrap();

        let last = report.monthly.last().unwrap();
        assert!((last.budget_progress.unwrap() - 0.654).abs() < 1e-3);
        assert_eq!(last.budget_remaining.unwrap(), 41.5);
        assert!((report.summary.budget_progress.unwrap() - 0.654).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_unknown_builder_field_is_semantic_error() {
        let executor = executor_with(Vec::new(), Settings::default());
        let query = Query::builder()
            .predicate(crate::query::Predicate::eq("flavor", Value::Number(1.0)))
            .build();

        let err = executor
            .execute_as_of(&query, date(2024, 6, 15))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Semantic { .. }));
    }

    /// Source that records the filter it was asked for.
    struct RecordingSource {
        seen: Mutex<Option<EntryFilter>>,
    }

    #[async_trait]
    impl EntrySource for RecordingSource {
        async fn fetch(&self, filter: &EntryFilter) -> SourceResult<Vec<TimeEntry>> {
            *self.seen.lock().unwrap() = Some(filter.clone());
            Ok(Vec::new())
        }

        fn clear_cache(&self) {}
    }

    #[tokio::test]
    async fn test_pushdown_split() {
        let source = Arc::new(RecordingSource {
            seen: Mutex::new(None),
        });
        let executor = Executor::new(source.clone(), Settings::default());
        let query = crate::query::compile(
            r#"WHERE year = 2024 AND project = "Acme" AND utilization = 0.5"#,
            executor.registry(),
        )
        .unwrap();

        executor
            .execute_as_of(&query, date(2024, 6, 15))
            .await
            .unwrap();

        let seen = source.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.year, Some(2024));
        assert_eq!(seen.project.as_deref(), Some("Acme"));
        // The utilization threshold cannot be pushed down.
        assert_eq!(seen.month, None);
        assert_eq!(seen.date_range, None);
    }

    /// Source that always fails.
    struct FailingSource;

    #[async_trait]
    impl EntrySource for FailingSource {
        async fn fetch(&self, _filter: &EntryFilter) -> SourceResult<Vec<TimeEntry>> {
            Err(SourceError::Malformed("vault unreadable".to_string()))
        }

        fn clear_cache(&self) {}
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let executor = Executor::new(Arc::new(FailingSource), Settings::default());
        let err = executor.execute_str("WHERE year = 2024").await.unwrap_err();
        assert!(matches!(err, QueryError::Source(_)));
        assert!(err.to_string().contains("vault unreadable"));
    }
}
