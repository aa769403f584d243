//! Clause-handler registry
//!
//! Maps a predicate field name to a handler that knows the field's value
//! kind, whether it supports `BETWEEN`, and how the executor evaluates it:
//! either pushed down into the coarse [`EntryFilter`](crate::source::EntryFilter)
//! or applied in memory after retrieval.
//!
//! The parser resolves field names against this registry, so optional
//! modules add predicates by registering a handler before parsing begins;
//! the grammar itself never changes. The built-in set covers `year`,
//! `month`, `project`, `date`, `service`, `category`, `utilization` and
//! `value`.

use crate::config::Settings;
use crate::query::ast::{Comparison, Value};
use crate::source::TimeEntry;
use chrono::Datelike;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What kind of literal a field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Text,
    Date,
}

impl ValueKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Number => "a number",
            Self::Text => "a quoted string",
            Self::Date => "a date literal (YYYY-MM-DD)",
        }
    }

    /// Whether a parsed literal is acceptable for this kind. Text fields
    /// also admit date-shaped strings, since those are ordinary text to
    /// them.
    pub fn admits(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Number, Value::Number(_))
                | (Self::Text, Value::Text(_))
                | (Self::Text, Value::Date(_))
                | (Self::Date, Value::Date(_))
        )
    }
}

/// Coarse-filter fields a data source can evaluate itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushdownField {
    Year,
    Month,
    Project,
    Date,
}

impl PushdownField {
    /// In-memory evaluation of a pushdown field. The executor re-checks
    /// every predicate against the returned entries, since a source only
    /// promises a superset.
    pub fn matches(&self, entry: &TimeEntry, comparison: &Comparison) -> bool {
        match self {
            Self::Year => number_equals(entry.date.year() as f64, comparison),
            Self::Month => number_equals(entry.date.month() as f64, comparison),
            Self::Project => match comparison {
                Comparison::Eq(Value::Text(wanted)) => entry
                    .project
                    .as_deref()
                    .is_some_and(|p| p.eq_ignore_ascii_case(wanted)),
                _ => false,
            },
            Self::Date => match comparison {
                Comparison::Eq(Value::Date(wanted)) => entry.date == *wanted,
                Comparison::Between(Value::Date(lo), Value::Date(hi)) => {
                    entry.date >= *lo && entry.date <= *hi
                }
                _ => false,
            },
        }
    }
}

/// In-memory predicate evaluation for residual fields.
pub type ResidualFn = Arc<dyn Fn(&TimeEntry, &Comparison, &Settings) -> bool + Send + Sync>;

/// How the executor evaluates predicates on a field.
pub enum FieldEval {
    /// Translated into the coarse filter where the comparison form allows.
    Pushdown(PushdownField),
    /// Always evaluated in memory after retrieval.
    Residual(ResidualFn),
}

/// Everything the parser, interpreter and executor need to know about one
/// predicate field.
pub struct FieldHandler {
    pub value_kind: ValueKind,
    pub range_capable: bool,
    pub eval: FieldEval,
}

impl FieldHandler {
    pub fn pushdown(value_kind: ValueKind, range_capable: bool, field: PushdownField) -> Self {
        Self {
            value_kind,
            range_capable,
            eval: FieldEval::Pushdown(field),
        }
    }

    pub fn residual<F>(value_kind: ValueKind, range_capable: bool, matches: F) -> Self
    where
        F: Fn(&TimeEntry, &Comparison, &Settings) -> bool + Send + Sync + 'static,
    {
        Self {
            value_kind,
            range_capable,
            eval: FieldEval::Residual(Arc::new(matches)),
        }
    }
}

/// Registry of predicate field handlers.
pub struct HandlerRegistry {
    handlers: HashMap<String, FieldHandler>,
}

impl HandlerRegistry {
    /// Registry with the eight built-in handlers.
    pub fn builtin() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };

        registry.register(
            "year",
            FieldHandler::pushdown(ValueKind::Number, true, PushdownField::Year),
        );
        registry.register(
            "month",
            FieldHandler::pushdown(ValueKind::Number, true, PushdownField::Month),
        );
        registry.register(
            "project",
            FieldHandler::pushdown(ValueKind::Text, false, PushdownField::Project),
        );
        registry.register(
            "date",
            FieldHandler::pushdown(ValueKind::Date, true, PushdownField::Date),
        );
        registry.register(
            "service",
            FieldHandler::residual(ValueKind::Text, false, text_contains),
        );
        registry.register(
            "category",
            FieldHandler::residual(ValueKind::Text, false, text_contains),
        );
        registry.register(
            "utilization",
            FieldHandler::residual(ValueKind::Number, true, |entry, cmp, settings| {
                let utilization = if settings.hours_per_workday > 0.0 {
                    entry.hours / settings.hours_per_workday
                } else {
                    0.0
                };
                number_threshold(utilization, cmp)
            }),
        );
        registry.register(
            "value",
            FieldHandler::residual(ValueKind::Number, true, |entry, cmp, _| {
                number_threshold(entry.rate.unwrap_or(0.0), cmp)
            }),
        );

        registry
    }

    /// Register a handler under a field name, replacing any existing one.
    /// Names are matched lowercased, like every identifier in the language.
    pub fn register(&mut self, name: impl Into<String>, handler: FieldHandler) {
        self.handlers.insert(name.into().to_lowercase(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&FieldHandler> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered field names, sorted for stable output.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("fields", &self.field_names())
            .finish()
    }
}

/// Case-insensitive substring match against the entry's category, project
/// and notes text.
fn text_contains(entry: &TimeEntry, comparison: &Comparison, _settings: &Settings) -> bool {
    let Comparison::Eq(value) = comparison else {
        return false;
    };
    let needle = match value {
        Value::Text(t) => t.to_lowercase(),
        Value::Date(d) => d.to_string(),
        Value::Number(_) => return false,
    };
    [&entry.category, &entry.project, &entry.notes]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(&needle))
}

/// Threshold comparison for numeric residual fields: `=` means "at
/// least", `BETWEEN` is inclusive on both ends.
fn number_threshold(actual: f64, comparison: &Comparison) -> bool {
    match comparison {
        Comparison::Eq(Value::Number(min)) => actual >= *min,
        Comparison::Between(Value::Number(lo), Value::Number(hi)) => {
            actual >= *lo && actual <= *hi
        }
        _ => false,
    }
}

/// Exact numeric comparison for calendar fields.
fn number_equals(actual: f64, comparison: &Comparison) -> bool {
    match comparison {
        Comparison::Eq(Value::Number(wanted)) => (actual - wanted).abs() < f64::EPSILON,
        Comparison::Between(Value::Number(lo), Value::Number(hi)) => {
            actual >= *lo && actual <= *hi
        }
        _ => false,
    }
}
