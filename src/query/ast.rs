//! Query abstract syntax tree
//!
//! Clause nodes produced by the parser and the normalized [`Query`] the
//! interpreter derives from them. A `Query` is immutable and fully
//! defaulted: every mode field holds exactly one value of its fixed
//! enumeration, so downstream code never checks for "missing" clauses.
//!
//! # Example Queries
//!
//! ```text
//! WHERE year = 2024 AND month = 12
//! SHOW date AS "Date", hours FORMAT CURRENCY
//! VIEW table
//! SIZE compact
//! ```

use crate::query::token::Position;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// A literal value in a predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Number(f64),
    Text(String),
    /// A quoted `YYYY-MM-DD` literal, recognized contextually by the parser.
    Date(NaiveDate),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Date(d) => write!(f, "\"{d}\""),
        }
    }
}

/// How a predicate compares its field against its value(s).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Eq(Value),
    Between(Value, Value),
}

/// One filter condition inside a `WHERE` clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub field: String,
    pub comparison: Comparison,
    /// Source position of the field name; absent for built queries.
    #[serde(skip)]
    pub position: Option<Position>,
}

impl Predicate {
    pub fn new(field: impl Into<String>, comparison: Comparison) -> Self {
        Self {
            field: field.into(),
            comparison,
            position: None,
        }
    }

    /// Equality predicate shorthand.
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Comparison::Eq(value))
    }

    /// Range predicate shorthand.
    pub fn between(field: impl Into<String>, lo: Value, hi: Value) -> Self {
        Self::new(field, Comparison::Between(lo, hi))
    }
}

/// Output format directive attached to a `SHOW` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFormat {
    Currency,
    Money,
    Percent,
}

impl ColumnFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "currency" => Some(Self::Currency),
            "money" => Some(Self::Money),
            "percent" => Some(Self::Percent),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Currency => write!(f, "CURRENCY"),
            Self::Money => write!(f, "MONEY"),
            Self::Percent => write!(f, "PERCENT"),
        }
    }
}

/// One column in a `SHOW` clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ColumnFormat>,
}

impl ColumnSpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            alias: None,
            format: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_format(mut self, format: ColumnFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Header text for this column (alias or field name).
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field)
    }
}

/// How results are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Summary,
    Chart,
    Table,
    Full,
}

impl ViewMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "summary" => Some(Self::Summary),
            "chart" => Some(Self::Chart),
            "table" => Some(Self::Table),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Chart => write!(f, "chart"),
            Self::Table => write!(f, "table"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Which chart a chart-capable view draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Monthly,
    Trend,
    Budget,
}

impl ChartKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "monthly" => Some(Self::Monthly),
            "trend" => Some(Self::Trend),
            "budget" => Some(Self::Budget),
            _ => None,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Trend => write!(f, "trend"),
            Self::Budget => write!(f, "budget"),
        }
    }
}

/// Named time window applied to the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Period {
    #[default]
    #[serde(rename = "current-year")]
    CurrentYear,
    #[serde(rename = "all-time")]
    AllTime,
    #[serde(rename = "last-6-months")]
    LastSixMonths,
    #[serde(rename = "last-12-months")]
    LastTwelveMonths,
}

impl Period {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "current-year" => Some(Self::CurrentYear),
            "all-time" => Some(Self::AllTime),
            "last-6-months" => Some(Self::LastSixMonths),
            "last-12-months" => Some(Self::LastTwelveMonths),
            _ => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentYear => write!(f, "current-year"),
            Self::AllTime => write!(f, "all-time"),
            Self::LastSixMonths => write!(f, "last-6-months"),
            Self::LastTwelveMonths => write!(f, "last-12-months"),
        }
    }
}

/// Output density.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    Compact,
    #[default]
    Normal,
    Detailed,
}

impl SizeMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "compact" => Some(Self::Compact),
            "normal" => Some(Self::Normal),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

impl fmt::Display for SizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact => write!(f, "compact"),
            Self::Normal => write!(f, "normal"),
            Self::Detailed => write!(f, "detailed"),
        }
    }
}

/// One top-level statement, as parsed. The interpreter folds a clause list
/// into a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Where(Vec<Predicate>),
    Show(Vec<ColumnSpec>),
    View(ViewMode),
    Chart(ChartKind),
    Period(Period),
    Size(SizeMode),
}

/// A normalized query ready for execution.
///
/// Produced by the interpreter (or [`QueryBuilder`]); every mode field is
/// defaulted, so nothing downstream deals with omitted clauses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub columns: Vec<ColumnSpec>,
    pub view: ViewMode,
    pub chart: ChartKind,
    pub period: Period,
    pub size: SizeMode,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            columns: Vec::new(),
            view: ViewMode::default(),
            chart: ChartKind::default(),
            period: Period::default(),
            size: SizeMode::default(),
        }
    }
}

impl Query {
    /// Start building a query programmatically.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Builder for constructing queries without going through the text syntax.
///
/// The builder trusts its caller: it applies no semantic validation beyond
/// what the type system enforces. Queries compiled from text go through the
/// interpreter's checks instead.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `WHERE` predicate.
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.query.predicates.push(predicate);
        self
    }

    /// Add a `SHOW` column by field name.
    pub fn show(mut self, field: impl Into<String>) -> Self {
        self.query.columns.push(ColumnSpec::new(field));
        self
    }

    /// Add a fully specified `SHOW` column.
    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.query.columns.push(column);
        self
    }

    pub fn view(mut self, view: ViewMode) -> Self {
        self.query.view = view;
        self
    }

    pub fn chart(mut self, chart: ChartKind) -> Self {
        self.query.chart = chart;
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.query.period = period;
        self
    }

    pub fn size(mut self, size: SizeMode) -> Self {
        self.query.size = size;
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}
