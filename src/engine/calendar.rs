//! Calendar arithmetic
//!
//! Working-day counts, month labels and the date windows named periods
//! resolve to. Weekends are Saturday and Sunday; there is no holiday
//! calendar.

use crate::query::Period;
use crate::source::DateRange;
use chrono::{Datelike, Months, NaiveDate, Weekday};

/// Number of working days (Mon-Fri) in a calendar month. Returns 0 for an
/// invalid year/month combination.
pub fn weekdays_in_month(year: i32, month: u32) -> u32 {
    let Some(mut day) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    let mut count = 0;
    while day.month() == month {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }
    count
}

/// Target hours for a month under the configured workday length.
pub fn target_hours(year: i32, month: u32, hours_per_workday: f64) -> f64 {
    weekdays_in_month(year, month) as f64 * hours_per_workday
}

/// Human-readable month label, e.g. `"January 2024"`.
pub fn month_label(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format("%B %Y").to_string(),
        None => format!("{year}-{month:02}"),
    }
}

/// The date window a period selects, anchored at `today`. `all-time` has
/// no window.
pub fn window(period: Period, today: NaiveDate) -> Option<DateRange> {
    match period {
        Period::CurrentYear => DateRange::year(today.year()),
        Period::AllTime => None,
        Period::LastSixMonths => months_back(today, 6),
        Period::LastTwelveMonths => months_back(today, 12),
    }
}

/// The window a period contributes to the coarse filter. Only the
/// relative periods are pushed down; `current-year` stays in memory so
/// the year and all-time summaries see the whole predicate-filtered pool.
pub fn pushdown_window(period: Period, today: NaiveDate) -> Option<DateRange> {
    match period {
        Period::LastSixMonths | Period::LastTwelveMonths => window(period, today),
        Period::CurrentYear | Period::AllTime => None,
    }
}

fn months_back(today: NaiveDate, months: u32) -> Option<DateRange> {
    let start = today
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN);
    DateRange::try_new(start, today)
}
