//! Report data types
//!
//! The aggregated output of one query execution. All of these are pure
//! functions of `(entries, query, settings)`: recomputed every run, never
//! mutated afterwards.

use crate::source::TimeEntry;
use serde::Serialize;

/// Aggregates for one `(year, month)` bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyDataPoint {
    pub year: i32,
    pub month: u32,
    /// Display label, e.g. `"January 2024"`.
    pub label: String,
    pub hours: f64,
    pub invoiced: f64,
    /// Hours over the month's target hours; 0 when the target is 0.
    pub utilization: f64,
    /// Effective hourly rate (invoiced over hours); 0 when hours are 0.
    pub rate: f64,
    /// Running hour total across months in chronological order.
    pub cumulative_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_remaining: Option<f64>,
}

/// Rollup over an entry set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryData {
    pub total_hours: f64,
    pub total_invoiced: f64,
    /// Total hours over the summed target hours of every distinct month
    /// represented; 0 when the target sum is 0.
    pub utilization: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_remaining: Option<f64>,
}

/// Chronological series for chart rendering, as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendData {
    pub labels: Vec<String>,
    pub hours: Vec<f64>,
    pub utilization: Vec<f64>,
    pub invoiced: Vec<f64>,
}

impl TrendData {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Everything one execution produces, consumed by rendering collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// The filtered entries, sorted by date.
    pub entries: Vec<TimeEntry>,
    pub monthly: Vec<MonthlyDataPoint>,
    pub trend: TrendData,
    /// Rollup over the period-filtered entries.
    pub summary: SummaryData,
    /// Rollup over the current calendar year's entries.
    pub year_summary: SummaryData,
    /// Rollup over every filtered entry.
    pub all_time_summary: SummaryData,
}
