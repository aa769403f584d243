//! Query parser
//!
//! Consumes the token stream into a list of clause AST nodes. Grammar
//! (informal EBNF):
//!
//! ```text
//! query       := clause*
//! clause      := whereClause | showClause | viewClause
//!              | chartClause | periodClause | sizeClause
//! whereClause := "WHERE" predicate ("AND" predicate)*
//! predicate   := field ("=" value | "BETWEEN" value "AND" value)
//! showClause  := "SHOW" column ("," column)*
//! column      := field ("FORMAT" formatKind)? ("AS" string)?
//! viewClause  := "VIEW" ("summary"|"chart"|"table"|"full")
//! chartClause := "CHART" ("monthly"|"trend"|"budget")
//! periodClause:= "PERIOD" ("current-year"|"all-time"|"last-6-months"|"last-12-months")
//! sizeClause  := "SIZE" ("compact"|"normal"|"detailed")
//! ```
//!
//! `field` is not a fixed enumeration: predicate field names are resolved
//! against the [`HandlerRegistry`] supplied at construction, which is how
//! optional modules add predicates without touching this grammar. Every
//! failure is a [`QueryError::Syntax`] carrying the offending token's
//! position: unknown fields and bad enumerated values never default
//! silently.

use crate::query::ast::{Clause, ColumnFormat, ColumnSpec, Comparison, Predicate, Value};
use crate::query::ast::{ChartKind, Period, SizeMode, ViewMode};
use crate::query::error::{QueryError, QueryResult};
use crate::query::registry::HandlerRegistry;
use crate::query::token::{InvalidReason, Keyword, Token, TokenKind};
use chrono::NaiveDate;

/// Registry-driven clause parser.
pub struct Parser<'r> {
    registry: &'r HandlerRegistry,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Parse a token stream into clauses.
    pub fn parse(&self, tokens: &[Token]) -> QueryResult<Vec<Clause>> {
        let mut cursor = Cursor::new(tokens);
        let mut clauses = Vec::new();

        loop {
            let token = cursor.peek().clone();
            match &token.kind {
                TokenKind::Eof => return Ok(clauses),
                TokenKind::Keyword(Keyword::Where) => {
                    clauses.push(self.parse_where(&mut cursor)?);
                }
                TokenKind::Keyword(Keyword::Show) => {
                    clauses.push(self.parse_show(&mut cursor)?);
                }
                TokenKind::Keyword(Keyword::View) => {
                    cursor.advance();
                    let view =
                        parse_mode(&mut cursor, "view type", ViewMode::from_name)?;
                    clauses.push(Clause::View(view));
                }
                TokenKind::Keyword(Keyword::Chart) => {
                    cursor.advance();
                    let chart =
                        parse_mode(&mut cursor, "chart type", ChartKind::from_name)?;
                    clauses.push(Clause::Chart(chart));
                }
                TokenKind::Keyword(Keyword::Period) => {
                    cursor.advance();
                    let period = parse_mode(&mut cursor, "period", Period::from_name)?;
                    clauses.push(Clause::Period(period));
                }
                TokenKind::Keyword(Keyword::Size) => {
                    cursor.advance();
                    let size = parse_mode(&mut cursor, "size", SizeMode::from_name)?;
                    clauses.push(Clause::Size(size));
                }
                TokenKind::Keyword(kw) => {
                    return Err(QueryError::syntax(
                        format!("unexpected keyword {} outside a clause", kw.canonical()),
                        token.position,
                    ));
                }
                TokenKind::Ident(_) => {
                    return Err(QueryError::syntax(
                        format!("unknown keyword '{}'", token.lexeme),
                        token.position,
                    ));
                }
                TokenKind::Invalid(_) => return Err(invalid_error(&token)),
                other => {
                    return Err(QueryError::syntax(
                        format!("expected a clause keyword, found {}", other.describe()),
                        token.position,
                    ));
                }
            }
        }
    }

    fn parse_where(&self, cursor: &mut Cursor<'_>) -> QueryResult<Clause> {
        cursor.advance();
        let mut predicates = vec![self.parse_predicate(cursor)?];
        while matches!(cursor.peek().kind, TokenKind::Keyword(Keyword::And)) {
            cursor.advance();
            predicates.push(self.parse_predicate(cursor)?);
        }
        Ok(Clause::Where(predicates))
    }

    fn parse_predicate(&self, cursor: &mut Cursor<'_>) -> QueryResult<Predicate> {
        let token = cursor.advance().clone();
        let field = match &token.kind {
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Invalid(_) => return Err(invalid_error(&token)),
            other => {
                return Err(QueryError::syntax(
                    format!("expected a field name, found {}", other.describe()),
                    token.position,
                ));
            }
        };
        if !self.registry.contains(&field) {
            return Err(QueryError::syntax(
                format!("unknown field '{field}'"),
                token.position,
            ));
        }

        let op = cursor.peek().clone();
        let comparison = match op.kind {
            TokenKind::Equals => {
                cursor.advance();
                Comparison::Eq(parse_value(cursor)?)
            }
            TokenKind::Keyword(Keyword::Between) => {
                cursor.advance();
                let lo = parse_value(cursor)?;
                let and = cursor.advance().clone();
                if !matches!(and.kind, TokenKind::Keyword(Keyword::And)) {
                    return Err(QueryError::syntax(
                        format!(
                            "expected AND between range bounds, found {}",
                            and.kind.describe()
                        ),
                        and.position,
                    ));
                }
                Comparison::Between(lo, parse_value(cursor)?)
            }
            other => {
                return Err(QueryError::syntax(
                    format!(
                        "expected operator '=' or BETWEEN after field '{field}', found {}",
                        other.describe()
                    ),
                    op.position,
                ));
            }
        };

        Ok(Predicate {
            field,
            comparison,
            position: Some(token.position),
        })
    }

    fn parse_show(&self, cursor: &mut Cursor<'_>) -> QueryResult<Clause> {
        cursor.advance();
        let mut columns = vec![parse_column(cursor)?];
        while matches!(cursor.peek().kind, TokenKind::Comma) {
            cursor.advance();
            columns.push(parse_column(cursor)?);
        }
        Ok(Clause::Show(columns))
    }
}

fn parse_column(cursor: &mut Cursor<'_>) -> QueryResult<ColumnSpec> {
    let token = cursor.advance().clone();
    let mut column = match &token.kind {
        TokenKind::Ident(field) => ColumnSpec::new(field.clone()),
        TokenKind::Invalid(_) => return Err(invalid_error(&token)),
        other => {
            return Err(QueryError::syntax(
                format!("expected a column field name, found {}", other.describe()),
                token.position,
            ));
        }
    };

    if matches!(cursor.peek().kind, TokenKind::Keyword(Keyword::Format)) {
        cursor.advance();
        let kind = cursor.advance().clone();
        let format = match &kind.kind {
            TokenKind::Ident(name) => ColumnFormat::from_name(name),
            _ => None,
        };
        match format {
            Some(f) => column = column.with_format(f),
            None => {
                return Err(QueryError::syntax(
                    format!(
                        "invalid format '{}' (expected CURRENCY, MONEY, or PERCENT)",
                        kind.lexeme
                    ),
                    kind.position,
                ));
            }
        }
    }

    if matches!(cursor.peek().kind, TokenKind::Keyword(Keyword::As)) {
        cursor.advance();
        let alias = cursor.advance().clone();
        match alias.kind {
            TokenKind::Str(text) => column = column.with_alias(text),
            TokenKind::Invalid(_) => return Err(invalid_error(&alias)),
            other => {
                return Err(QueryError::syntax(
                    format!("expected a quoted alias after AS, found {}", other.describe()),
                    alias.position,
                ));
            }
        }
    }

    Ok(column)
}

/// Parse one predicate value. Quoted strings shaped like `YYYY-MM-DD`
/// become date literals here; everything else stays text.
fn parse_value(cursor: &mut Cursor<'_>) -> QueryResult<Value> {
    let token = cursor.advance().clone();
    match token.kind {
        TokenKind::Number(n) => Ok(Value::Number(n)),
        TokenKind::Str(text) => match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            Ok(date) => Ok(Value::Date(date)),
            Err(_) => Ok(Value::Text(text)),
        },
        TokenKind::Invalid(_) => Err(invalid_error(&token)),
        other => Err(QueryError::syntax(
            format!("expected value, found {}", other.describe()),
            token.position,
        )),
    }
}

/// Parse the value of a `VIEW`/`CHART`/`PERIOD`/`SIZE` clause. Keywords
/// are admitted as names because `VIEW chart` reuses the CHART keyword.
fn parse_mode<T>(
    cursor: &mut Cursor<'_>,
    kind_name: &str,
    from_name: fn(&str) -> Option<T>,
) -> QueryResult<T> {
    let token = cursor.advance().clone();
    let name = match &token.kind {
        TokenKind::Ident(name) => name.clone(),
        TokenKind::Keyword(kw) => kw.canonical().to_lowercase(),
        TokenKind::Invalid(_) => return Err(invalid_error(&token)),
        other => {
            return Err(QueryError::syntax(
                format!("expected a {kind_name}, found {}", other.describe()),
                token.position,
            ));
        }
    };
    from_name(&name).ok_or_else(|| {
        QueryError::syntax(
            format!("invalid {kind_name} '{}'", token.lexeme),
            token.position,
        )
    })
}

fn invalid_error(token: &Token) -> QueryError {
    match token.kind {
        TokenKind::Invalid(InvalidReason::UnterminatedString) => {
            QueryError::syntax("unterminated string", token.position)
        }
        _ => QueryError::syntax(
            format!("unexpected character '{}'", token.lexeme),
            token.position,
        ),
    }
}

/// Read-only cursor over a token slice. The slice always ends with an
/// `Eof` token, which `peek`/`advance` saturate on.
struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| &t.kind),
            Some(TokenKind::Eof)
        ));
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        &self.tokens[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::token::tokenize;

    fn parse(text: &str) -> QueryResult<Vec<Clause>> {
        let registry = HandlerRegistry::builtin();
        Parser::new(&registry).parse(&tokenize(text))
    }

    fn expect_syntax_error(text: &str, fragment: &str) {
        match parse(text) {
            Err(QueryError::Syntax { message, .. }) => {
                assert!(
                    message.contains(fragment),
                    "expected '{fragment}' in '{message}'"
                );
            }
            other => panic!("expected syntax error for '{text}', got {other:?}"),
        }
    }

    #[test]
    fn test_parse_where_conjunction() {
        let clauses = parse("WHERE year = 2024 AND month = 12").unwrap();
        assert_eq!(clauses.len(), 1);
        let Clause::Where(predicates) = &clauses[0] else {
            panic!("expected WHERE clause");
        };
        assert_eq!(predicates.len(), 2);
        assert_eq!(predicates[0].field, "year");
        assert_eq!(
            predicates[0].comparison,
            Comparison::Eq(Value::Number(2024.0))
        );
        assert_eq!(predicates[1].field, "month");
    }

    #[test]
    fn test_parse_date_between() {
        let clauses = parse(r#"WHERE date BETWEEN "2024-01-01" AND "2024-06-30""#).unwrap();
        let Clause::Where(predicates) = &clauses[0] else {
            panic!("expected WHERE clause");
        };
        let Comparison::Between(Value::Date(lo), Value::Date(hi)) = &predicates[0].comparison
        else {
            panic!("expected a date range, got {:?}", predicates[0].comparison);
        };
        assert_eq!(lo.to_string(), "2024-01-01");
        assert_eq!(hi.to_string(), "2024-06-30");
    }

    #[test]
    fn test_parse_show_columns() {
        let clauses =
            parse(r#"SHOW date AS "Date", project AS "Work Order", hours"#).unwrap();
        let Clause::Show(columns) = &clauses[0] else {
            panic!("expected SHOW clause");
        };
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].field, "date");
        assert_eq!(columns[0].alias.as_deref(), Some("Date"));
        assert_eq!(columns[1].alias.as_deref(), Some("Work Order"));
        assert!(columns[2].alias.is_none());
    }

    #[test]
    fn test_parse_show_format() {
        let clauses = parse(r#"SHOW value FORMAT CURRENCY AS "Amount", utilization FORMAT PERCENT"#)
            .unwrap();
        let Clause::Show(columns) = &clauses[0] else {
            panic!("expected SHOW clause");
        };
        assert_eq!(columns[0].format, Some(ColumnFormat::Currency));
        assert_eq!(columns[0].alias.as_deref(), Some("Amount"));
        assert_eq!(columns[1].format, Some(ColumnFormat::Percent));
    }

    #[test]
    fn test_parse_full_query() {
        let clauses = parse(
            "// report query\n\
             WHERE year = 2024\n\
             SHOW date, hours\n\
             VIEW table\n\
             SIZE compact",
        )
        .unwrap();
        assert_eq!(clauses.len(), 4);
        assert_eq!(clauses[2], Clause::View(ViewMode::Table));
        assert_eq!(clauses[3], Clause::Size(SizeMode::Compact));
    }

    #[test]
    fn test_parse_multiline_where() {
        let clauses = parse(
            "WHERE year = 2024\n\
             AND month = 6\n\
             AND project = \"Acme\"",
        )
        .unwrap();
        let Clause::Where(predicates) = &clauses[0] else {
            panic!("expected WHERE clause");
        };
        assert_eq!(predicates.len(), 3);
    }

    #[test]
    fn test_parse_view_chart_keyword_value() {
        let clauses = parse("VIEW chart\nCHART trend\nPERIOD last-6-months").unwrap();
        assert_eq!(clauses[0], Clause::View(ViewMode::Chart));
        assert_eq!(clauses[1], Clause::Chart(ChartKind::Trend));
        assert_eq!(clauses[2], Clause::Period(Period::LastSixMonths));
    }

    #[test]
    fn test_error_unknown_keyword() {
        expect_syntax_error("INVALID year = 2024", "unknown keyword");
    }

    #[test]
    fn test_error_missing_operator() {
        expect_syntax_error("WHERE year 2024", "expected operator");
    }

    #[test]
    fn test_error_invalid_view() {
        expect_syntax_error("VIEW invalid_view", "invalid view type");
    }

    #[test]
    fn test_error_unterminated_string() {
        expect_syntax_error(r#"WHERE project = "unterminated"#, "unterminated string");
    }

    #[test]
    fn test_error_missing_value() {
        expect_syntax_error("WHERE year =", "expected value");
    }

    #[test]
    fn test_error_unknown_field() {
        expect_syntax_error("WHERE flavor = 3", "unknown field 'flavor'");
    }

    #[test]
    fn test_error_between_missing_and() {
        expect_syntax_error(
            r#"WHERE date BETWEEN "2024-01-01" "2024-06-30""#,
            "expected AND",
        );
    }

    #[test]
    fn test_error_position_reported() {
        let err = parse("WHERE year 2024").unwrap_err();
        let QueryError::Syntax { position, .. } = err else {
            panic!("expected syntax error");
        };
        assert_eq!(position.line, 1);
        assert_eq!(position.column, 12);
    }

    #[test]
    fn test_registered_field_parses() {
        let mut registry = HandlerRegistry::builtin();
        registry.register(
            "client",
            crate::query::registry::FieldHandler::residual(
                crate::query::registry::ValueKind::Text,
                false,
                |_, _, _| true,
            ),
        );
        let clauses = Parser::new(&registry)
            .parse(&tokenize(r#"WHERE client = "Globex""#))
            .unwrap();
        let Clause::Where(predicates) = &clauses[0] else {
            panic!("expected WHERE clause");
        };
        assert_eq!(predicates[0].field, "client");
    }
}
