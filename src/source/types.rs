//! Core data types shared between the data source and the engine
//!
//! - `TimeEntry`: one time-tracked record, owned by the data source
//! - `DateRange`: an inclusive calendar interval
//! - `EntryFilter`: the coarse filter a data source can push down

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single time-tracked record.
///
/// Produced by a data source and read-only to the engine. Hours are
/// non-negative by contract; the rate is in currency units per hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub date: NaiveDate,
    pub hours: f64,
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TimeEntry {
    pub fn new(date: NaiveDate, hours: f64) -> Self {
        Self {
            date,
            hours,
            rate: None,
            project: None,
            client: None,
            category: None,
            notes: None,
        }
    }

    /// Builder method: set the hourly rate.
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Builder method: set the project name.
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Builder method: set the client name.
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    /// Builder method: set the category tag.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder method: set free-form notes.
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Amount invoiced for this entry; entries without a rate invoice 0.
    pub fn invoiced(&self) -> f64 {
        self.hours * self.rate.unwrap_or(0.0)
    }

    /// The `(year, month)` bucket this entry falls into.
    pub fn month_key(&self) -> (i32, u32) {
        (self.date.year(), self.date.month())
    }
}

/// An inclusive calendar interval: `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a new range.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        assert!(start <= end, "DateRange: start must not be after end");
        Self { start, end }
    }

    /// Create a range, returning `None` if `start > end`.
    pub fn try_new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// A single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// A whole calendar year.
    pub fn year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(Self { start, end })
    }

    /// Check whether a date falls within this range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Get the intersection with another range, if any.
    pub fn intersection(&self, other: &DateRange) -> Option<Self> {
        Self::try_new(self.start.max(other.start), self.end.min(other.end))
    }
}

/// The coarse filter passed to a data source.
///
/// Every field is optional; a data source returns the entries it believes
/// satisfy all the set fields. The engine re-checks predicates in memory,
/// so an over-approximating source is still correct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EntryFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub project: Option<String>,
    pub date_range: Option<DateRange>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Check whether an entry satisfies all the set fields.
    pub fn matches(&self, entry: &TimeEntry) -> bool {
        if let Some(year) = self.year {
            if entry.date.year() != year {
                return false;
            }
        }
        if let Some(month) = self.month {
            if entry.date.month() != month {
                return false;
            }
        }
        if let Some(project) = &self.project {
            match &entry.project {
                Some(p) if p.eq_ignore_ascii_case(project) => {}
                _ => return false,
            }
        }
        if let Some(range) = &self.date_range {
            if !range.contains(entry.date) {
                return false;
            }
        }
        true
    }
}
