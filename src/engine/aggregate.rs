//! Aggregation
//!
//! Pure functions turning a filtered entry set into monthly buckets,
//! summary rollups and trend series. Degenerate denominators (no target
//! hours, no worked hours) resolve to 0, never to NaN or infinity.

use crate::config::Settings;
use crate::engine::calendar;
use crate::engine::types::{MonthlyDataPoint, SummaryData, TrendData};
use crate::query::{Period, SizeMode};
use crate::source::TimeEntry;
use std::collections::BTreeMap;

/// Divide, treating a non-positive denominator as "no data".
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Group entries into chronologically ordered monthly buckets.
pub fn monthly_points(entries: &[TimeEntry], settings: &Settings) -> Vec<MonthlyDataPoint> {
    // BTreeMap keys are (year, month), so iteration is chronological.
    let mut buckets: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for entry in entries {
        let bucket = buckets.entry(entry.month_key()).or_insert((0.0, 0.0));
        bucket.0 += entry.hours;
        bucket.1 += entry.invoiced();
    }

    let budget = settings.budget_hours();
    let mut cumulative = 0.0;
    buckets
        .into_iter()
        .map(|((year, month), (hours, invoiced))| {
            cumulative += hours;
            let target = calendar::target_hours(year, month, settings.hours_per_workday);
            MonthlyDataPoint {
                year,
                month,
                label: calendar::month_label(year, month),
                hours,
                invoiced,
                utilization: ratio(hours, target),
                rate: ratio(invoiced, hours),
                cumulative_hours: cumulative,
                budget_progress: budget.map(|b| cumulative / b),
                budget_remaining: budget.map(|b| b - cumulative),
            }
        })
        .collect()
}

/// Roll an entry set up into one summary. The utilization target is the
/// sum of target hours over every distinct month represented.
pub fn summarize(entries: &[TimeEntry], settings: &Settings) -> SummaryData {
    let mut total_hours = 0.0;
    let mut total_invoiced = 0.0;
    let mut months: BTreeMap<(i32, u32), ()> = BTreeMap::new();
    for entry in entries {
        total_hours += entry.hours;
        total_invoiced += entry.invoiced();
        months.insert(entry.month_key(), ());
    }

    let target: f64 = months
        .keys()
        .map(|&(year, month)| calendar::target_hours(year, month, settings.hours_per_workday))
        .sum();

    let budget = settings.budget_hours();
    SummaryData {
        total_hours,
        total_invoiced,
        utilization: ratio(total_hours, target),
        budget_progress: budget.map(|b| total_hours / b),
        budget_remaining: budget.map(|b| b - total_hours),
    }
}

/// Derive the trend series from chronologically ordered monthly points.
///
/// Relative periods keep only their last 6 or 12 points; `SIZE compact`
/// trims to the last 6 when no period truncation already applies.
pub fn trend_series(monthly: &[MonthlyDataPoint], period: Period, size: SizeMode) -> TrendData {
    let cap = match period {
        Period::LastSixMonths => Some(6),
        Period::LastTwelveMonths => Some(12),
        Period::CurrentYear | Period::AllTime => {
            (size == SizeMode::Compact).then_some(6)
        }
    };
    let skip = cap
        .map(|c| monthly.len().saturating_sub(c))
        .unwrap_or(0);

    let mut trend = TrendData::default();
    for point in &monthly[skip..] {
        trend.labels.push(point.label.clone());
        trend.hours.push(point.hours);
        trend.utilization.push(point.utilization);
        trend.invoiced.push(point.invoiced);
    }
    trend
}
