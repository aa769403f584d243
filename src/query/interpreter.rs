//! Query interpreter
//!
//! Folds a parsed clause list into a normalized [`Query`]: repeated
//! clauses of the same kind collapse (last one wins), omitted clauses get
//! their defaults, and semantic constraints are checked against the
//! handler registry. After this stage every mode field holds exactly one
//! value, so the executor never sees an "unset" view, chart, period or
//! size.

use crate::query::ast::{Clause, Comparison, Predicate, Query, ViewMode};
use crate::query::error::{QueryError, QueryResult};
use crate::query::parser::Parser;
use crate::query::registry::HandlerRegistry;
use crate::query::token::tokenize;

/// Fold clauses into a normalized query, validating semantics.
pub fn interpret(clauses: &[Clause], registry: &HandlerRegistry) -> QueryResult<Query> {
    let mut query = Query::default();
    let mut explicit_chart = false;

    for clause in clauses {
        match clause {
            Clause::Where(predicates) => {
                for predicate in predicates {
                    validate_predicate(predicate, registry)?;
                }
                query.predicates = predicates.clone();
            }
            Clause::Show(columns) => query.columns = columns.clone(),
            Clause::View(view) => query.view = *view,
            Clause::Chart(chart) => {
                query.chart = *chart;
                explicit_chart = true;
            }
            Clause::Period(period) => query.period = *period,
            Clause::Size(size) => query.size = *size,
        }
    }

    // A chart selection is meaningless unless the view can draw one.
    if explicit_chart && !matches!(query.view, ViewMode::Chart | ViewMode::Full) {
        return Err(QueryError::semantic(
            "CHART requires VIEW chart or full",
            None,
        ));
    }

    Ok(query)
}

fn validate_predicate(predicate: &Predicate, registry: &HandlerRegistry) -> QueryResult<()> {
    let Some(handler) = registry.get(&predicate.field) else {
        return Err(QueryError::semantic(
            format!("unknown field '{}'", predicate.field),
            predicate.position,
        ));
    };

    match &predicate.comparison {
        Comparison::Eq(value) => {
            if !handler.value_kind.admits(value) {
                return Err(QueryError::semantic(
                    format!(
                        "field '{}' expects {}, got {value}",
                        predicate.field,
                        handler.value_kind.label()
                    ),
                    predicate.position,
                ));
            }
        }
        Comparison::Between(lo, hi) => {
            if !handler.range_capable {
                return Err(QueryError::semantic(
                    format!("field '{}' does not support BETWEEN", predicate.field),
                    predicate.position,
                ));
            }
            for value in [lo, hi] {
                if !handler.value_kind.admits(value) {
                    return Err(QueryError::semantic(
                        format!(
                            "field '{}' expects {}, got {value}",
                            predicate.field,
                            handler.value_kind.label()
                        ),
                        predicate.position,
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Compile query text: tokenize, parse, interpret.
pub fn compile(text: &str, registry: &HandlerRegistry) -> QueryResult<Query> {
    let tokens = tokenize(text);
    let clauses = Parser::new(registry).parse(&tokens)?;
    interpret(&clauses, registry)
}

/// Compile query text, substituting the default query on failure.
///
/// The documented recovery policy for interactive callers: the error is
/// logged, never swallowed silently, and an all-defaults query runs in
/// its place.
pub fn compile_or_default(text: &str, registry: &HandlerRegistry) -> Query {
    match compile(text, registry) {
        Ok(query) => query,
        Err(e) => {
            tracing::warn!("query failed to compile, falling back to defaults: {e}");
            Query::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::{ChartKind, Period, Predicate, SizeMode, Value};

    fn compile_ok(text: &str) -> Query {
        compile(text, &HandlerRegistry::builtin()).unwrap()
    }

    fn expect_semantic_error(text: &str, fragment: &str) {
        match compile(text, &HandlerRegistry::builtin()) {
            Err(QueryError::Semantic { message, .. }) => {
                assert!(
                    message.contains(fragment),
                    "expected '{fragment}' in '{message}'"
                );
            }
            other => panic!("expected semantic error for '{text}', got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_applied() {
        let query = compile_ok("WHERE year = 2024");
        assert_eq!(query.view, ViewMode::Summary);
        assert_eq!(query.chart, ChartKind::Monthly);
        assert_eq!(query.period, Period::CurrentYear);
        assert_eq!(query.size, SizeMode::Normal);
    }

    #[test]
    fn test_every_mode_has_a_value() {
        // Totality over assorted valid inputs: interpretation always
        // produces a fully defaulted query.
        for text in [
            "",
            "WHERE year = 2024",
            "VIEW table",
            "SHOW date, hours\nSIZE detailed",
            "WHERE month = 6 AND utilization = 0.5\nPERIOD all-time",
        ] {
            let query = compile_ok(text);
            // Enum fields can't be unset; this documents the invariant.
            let _ = (query.view, query.chart, query.period, query.size);
        }
    }

    #[test]
    fn test_last_clause_wins() {
        let query = compile_ok("VIEW table\nVIEW summary\nSIZE compact\nSIZE detailed");
        assert_eq!(query.view, ViewMode::Summary);
        assert_eq!(query.size, SizeMode::Detailed);
    }

    #[test]
    fn test_last_where_wins() {
        let query = compile_ok("WHERE year = 2023\nWHERE year = 2024");
        assert_eq!(query.predicates.len(), 1);
        assert_eq!(
            query.predicates[0].comparison,
            Comparison::Eq(Value::Number(2024.0))
        );
    }

    #[test]
    fn test_predicate_order_preserved() {
        let query = compile_ok("WHERE year = 2024 AND month = 6 AND utilization = 0.5");
        let fields: Vec<&str> = query.predicates.iter().map(|p| p.field.as_str()).collect();
        assert_eq!(fields, vec!["year", "month", "utilization"]);
    }

    #[test]
    fn test_chart_requires_chart_capable_view() {
        expect_semantic_error("CHART trend", "CHART requires VIEW chart or full");
        expect_semantic_error("VIEW table\nCHART trend", "CHART requires VIEW chart or full");

        assert_eq!(compile_ok("VIEW chart\nCHART trend").chart, ChartKind::Trend);
        assert_eq!(compile_ok("VIEW full\nCHART budget").chart, ChartKind::Budget);
    }

    #[test]
    fn test_between_on_non_range_field() {
        expect_semantic_error(
            r#"WHERE project BETWEEN "A" AND "B""#,
            "does not support BETWEEN",
        );
    }

    #[test]
    fn test_value_kind_mismatch() {
        expect_semantic_error(r#"WHERE year = "2024ish""#, "expects a number");
        expect_semantic_error(r#"WHERE date = "someday""#, "expects a date literal");
        expect_semantic_error("WHERE project = 7", "expects a quoted string");
    }

    #[test]
    fn test_interpret_rejects_unregistered_builder_field() {
        let clauses = vec![Clause::Where(vec![Predicate::eq(
            "flavor",
            Value::Number(3.0),
        )])];
        let err = interpret(&clauses, &HandlerRegistry::builtin()).unwrap_err();
        assert!(matches!(err, QueryError::Semantic { .. }));
    }

    #[test]
    fn test_compile_or_default_falls_back() {
        let registry = HandlerRegistry::builtin();
        let query = compile_or_default("INVALID year = 2024", &registry);
        assert_eq!(query, Query::default());

        let query = compile_or_default("VIEW table", &registry);
        assert_eq!(query.view, ViewMode::Table);
    }
}
