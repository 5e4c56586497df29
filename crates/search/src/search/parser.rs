//! Search-string tokenizer and parser.
//!
//! The grammar is the one users type into a search box:
//!
//! ```text
//! name:foo male:true date:[1990-01-01 TO 2000-01-01]
//! (name:foo OR nickname:foo) status:ACTIVE
//! keywords:red|green "quoted value" age:[18 TO *]
//! ```
//!
//! Terms are `field:value` pairs (a bare value searches the schema's
//! default field). Adjacent terms are implicitly AND-joined; `AND` binds
//! tighter than `OR`; parentheses group. Quotes protect spaces and
//! brackets; `[lo TO hi]` is an inclusive range with `*` for an open
//! bound.

use std::vec::IntoIter;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use tracing::trace;

use super::Search;
use super::clause::{BoolOp, CompoundClause, SearchClause};
use crate::error::{ParseError, QueryError, SchemaError};
use crate::schema::{EntitySchema, FieldType};
use crate::transform::FieldTransformer;
use crate::value::SqlValue;

/// A lexical token of the search grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `(` — opens a group.
    Open,
    /// `)` — closes a group.
    Close,
    /// A `field:value` term, an `AND`/`OR` keyword, or a bare value.
    Term(String),
}

/// Parses user search strings into [`Search`] trees for one entity.
///
/// Field types come from the entity schema, with [`FieldTransformer`]
/// overrides consulted first. Parsers are cheap to share; wrap one in an
/// `Arc` to attach it to builders.
#[derive(Debug, Clone)]
pub struct SearchParser {
    schema: EntitySchema,
    transformer: FieldTransformer,
}

impl SearchParser {
    /// Creates a parser over the given schema with no transformations.
    pub fn new(schema: EntitySchema) -> Self {
        Self::with_transformer(schema, FieldTransformer::new())
    }

    /// Creates a parser with field transformations.
    pub fn with_transformer(schema: EntitySchema, transformer: FieldTransformer) -> Self {
        Self {
            schema,
            transformer,
        }
    }

    /// The entity schema this parser resolves fields against.
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Parses a search string.
    ///
    /// Empty input yields an empty search, which folds into builders as
    /// no predicate at all.
    pub fn parse(&self, input: &str) -> Result<Search, QueryError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Search::empty());
        }

        trace!(search = input, "parsing search string");
        let tokens = Self::tokenize(input)?;
        let mut iter = tokens.into_iter();
        let root = self.parse_group(&mut iter, 0)?;
        Ok(Search::new(root))
    }

    /// Splits a search string into tokens.
    ///
    /// Whitespace and parentheses separate terms except inside a quoted
    /// literal or a `[...]` range; parentheses become standalone tokens.
    /// Unterminated quotes or brackets, a bracket opened inside another,
    /// and a stray `]` are all hard failures.
    pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut term = String::new();
        let mut quoted = false;
        let mut bracketed = false;

        let flush = |term: &mut String, tokens: &mut Vec<Token>| {
            if !term.is_empty() {
                tokens.push(Token::Term(std::mem::take(term)));
            }
        };

        for (position, c) in input.char_indices() {
            match c {
                '"' => {
                    quoted = !quoted;
                    term.push(c);
                }
                '[' if !quoted => {
                    if bracketed {
                        return Err(ParseError::NestedBracket { position });
                    }
                    bracketed = true;
                    term.push(c);
                }
                ']' if !quoted => {
                    if !bracketed {
                        return Err(ParseError::UnopenedBracket { position });
                    }
                    bracketed = false;
                    term.push(c);
                }
                '(' if !quoted && !bracketed => {
                    flush(&mut term, &mut tokens);
                    tokens.push(Token::Open);
                }
                ')' if !quoted && !bracketed => {
                    flush(&mut term, &mut tokens);
                    tokens.push(Token::Close);
                }
                c if c.is_whitespace() && !quoted && !bracketed => {
                    flush(&mut term, &mut tokens);
                }
                _ => term.push(c),
            }
        }

        if quoted {
            return Err(ParseError::UnterminatedQuote);
        }
        if bracketed {
            return Err(ParseError::UnterminatedBracket);
        }
        flush(&mut term, &mut tokens);

        Ok(tokens)
    }

    /// Consumes tokens left to right into a compound clause.
    ///
    /// The group under construction starts as AND. An `OR` packages the
    /// accumulated AND group as one alternative and switches the group to
    /// OR; later terms start a new AND sub-group. Single-clause groups
    /// collapse to the bare clause.
    fn parse_group(
        &self,
        tokens: &mut IntoIter<Token>,
        depth: usize,
    ) -> Result<CompoundClause, QueryError> {
        let mut saw_or = false;
        let mut alternatives: Vec<CompoundClause> = Vec::new();
        let mut current = CompoundClause::new(BoolOp::And);

        loop {
            let Some(token) = tokens.next() else {
                if depth > 0 {
                    return Err(ParseError::UnclosedGroup.into());
                }
                break;
            };
            match token {
                Token::Open => {
                    let inner = self.parse_group(tokens, depth + 1)?;
                    if !inner.is_childless() {
                        current.push(inner.collapse());
                    }
                }
                Token::Close => {
                    if depth > 0 {
                        break;
                    }
                    trace!("ignoring unmatched ')' at top level");
                }
                Token::Term(term) if term == "AND" => {}
                Token::Term(term) if term == "OR" => {
                    saw_or = true;
                    if !current.is_childless() {
                        alternatives
                            .push(std::mem::replace(&mut current, CompoundClause::new(BoolOp::And)));
                    }
                }
                Token::Term(term) => current.push(self.clause_for(&term)?),
            }
        }

        if !saw_or {
            return Ok(current);
        }

        if !current.is_childless() {
            alternatives.push(current);
        }
        let mut group = CompoundClause::new(BoolOp::Or);
        for alternative in alternatives {
            group.push(alternative.collapse());
        }
        Ok(group)
    }

    /// Builds the clause for a single `field:value` term.
    fn clause_for(&self, term: &str) -> Result<SearchClause, QueryError> {
        let (field, value) = match term.split_once(':') {
            Some((field, value)) => (field, value),
            None => (self.schema.default_field(), term),
        };

        if let Some(transformation) = self.transformer.get(field) {
            if let Some(sql) = transformation.custom_sql() {
                return Ok(SearchClause::custom(sql, transformation.parse_value(value))?);
            }
            if transformation.has_parser() {
                return Ok(SearchClause::generic(
                    transformation.column(),
                    transformation.parse_value(value),
                )?);
            }
        }

        let field_type = self
            .transformer
            .get(field)
            .and_then(|t| t.field_type())
            .or_else(|| self.schema.field_type(field))
            .ok_or_else(|| SchemaError::UnknownField {
                entity: self.schema.entity().to_string(),
                field: field.to_string(),
            })?;
        let column = self.transformer.column(field);

        let clause = match field_type {
            FieldType::Text => SearchClause::text(column, &strip_quotes(value))?,
            FieldType::Enum => SearchClause::enumeration(column, value)?,
            FieldType::List => {
                let items = value.split('|').map(strip_quotes).collect();
                SearchClause::list_item(column, items)?
            }
            FieldType::Boolean => SearchClause::boolean(column, parse_bool(field, value)?)?,
            FieldType::Number => {
                if value.starts_with('[') {
                    let (lo, hi) = range_bounds(value)?;
                    SearchClause::number_range(
                        column,
                        parse_number_bound(field, lo)?,
                        parse_number_bound(field, hi)?,
                    )?
                } else {
                    let number = parse_number_bound(field, value)?.ok_or_else(|| {
                        ParseError::InvalidNumber {
                            field: field.to_string(),
                            value: value.to_string(),
                        }
                    })?;
                    SearchClause::number(column, number)?
                }
            }
            FieldType::Date => {
                if value.starts_with('[') {
                    let (lo, hi) = range_bounds(value)?;
                    SearchClause::date_range(
                        column,
                        parse_date_bound(field, lo)?,
                        parse_date_bound(field, hi)?,
                    )?
                } else {
                    let date = parse_date_bound(field, value)?.ok_or_else(|| {
                        ParseError::InvalidDate {
                            field: field.to_string(),
                            value: value.to_string(),
                        }
                    })?;
                    SearchClause::date(column, date)?
                }
            }
            FieldType::Timestamp => {
                if !value.starts_with('[') {
                    return Err(ParseError::TimeRangeRequired {
                        field: field.to_string(),
                        value: value.to_string(),
                    }
                    .into());
                }
                let (lo, hi) = range_bounds(value)?;
                SearchClause::time_range(
                    column,
                    parse_time_bound(field, lo, false)?,
                    parse_time_bound(field, hi, true)?,
                )?
            }
            FieldType::Generic => {
                SearchClause::generic(column, SqlValue::Text(strip_quotes(value)))?
            }
        };
        Ok(clause)
    }

    /// Rewrites external field names in an `ORDER BY` expression.
    ///
    /// Each comma-separated directive has its leading field name mapped
    /// through the transformer; directions and any other trailing words
    /// pass through untouched.
    pub fn translate_sort(&self, sort: &str) -> String {
        sort.split(',')
            .filter_map(|directive| {
                let mut words = directive.split_whitespace();
                let field = words.next()?;
                let mut out = vec![self.transformer.column(field).to_string()];
                out.extend(words.map(str::to_string));
                Some(out.join(" "))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Removes a leading and a trailing double quote, each independently.
fn strip_quotes(value: &str) -> String {
    let value = value.strip_prefix('"').unwrap_or(value);
    let value = value.strip_suffix('"').unwrap_or(value);
    value.to_string()
}

/// Splits `[lo TO hi]` into its bound texts.
fn range_bounds(value: &str) -> Result<(&str, &str), ParseError> {
    let malformed = || ParseError::MalformedRange {
        value: value.to_string(),
    };

    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(malformed)?;
    let mut words = inner.split_whitespace();
    match (words.next(), words.next(), words.next(), words.next()) {
        (Some(lo), Some("TO"), Some(hi), None) => Ok((lo, hi)),
        _ => Err(malformed()),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidBoolean {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_number_bound(field: &str, bit: &str) -> Result<Option<Decimal>, ParseError> {
    if bit == "*" {
        return Ok(None);
    }
    bit.parse::<Decimal>()
        .map(Some)
        .map_err(|_| ParseError::InvalidNumber {
            field: field.to_string(),
            value: bit.to_string(),
        })
}

fn parse_date_bound(field: &str, bit: &str) -> Result<Option<NaiveDate>, ParseError> {
    if bit == "*" {
        return Ok(None);
    }
    bit.parse::<NaiveDate>()
        .map(Some)
        .map_err(|_| ParseError::InvalidDate {
            field: field.to_string(),
            value: bit.to_string(),
        })
}

/// Parses a timestamp range bound.
///
/// Accepts an RFC 3339 timestamp (normalized to UTC), a naive ISO
/// datetime (interpreted as UTC), or a bare date. A bare date expands to
/// the start of that day, or for the end bound to the last instant of it.
fn parse_time_bound(
    field: &str,
    bit: &str,
    end_of_day: bool,
) -> Result<Option<DateTime<Utc>>, ParseError> {
    if bit == "*" {
        return Ok(None);
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(bit) {
        return Ok(Some(zoned.with_timezone(&Utc)));
    }
    if let Ok(naive) = bit.parse::<NaiveDateTime>() {
        return Ok(Some(naive.and_utc()));
    }
    let date = bit
        .parse::<NaiveDate>()
        .map_err(|_| ParseError::InvalidTimestamp {
            field: field.to_string(),
            value: bit.to_string(),
        })?;
    let bound = if end_of_day {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        next.and_time(NaiveTime::MIN).and_utc() - TimeDelta::nanoseconds(1)
    } else {
        date.and_time(NaiveTime::MIN).and_utc()
    };
    Ok(Some(bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Dialect;

    fn person_parser() -> SearchParser {
        SearchParser::new(
            EntitySchema::new("person", "name")
                .with_field("name", FieldType::Text)
                .with_field("male", FieldType::Boolean)
                .with_field("age", FieldType::Number)
                .with_field("date", FieldType::Date)
                .with_field("last_seen", FieldType::Timestamp)
                .with_field("status", FieldType::Enum)
                .with_field("keywords", FieldType::List),
        )
    }

    fn terms(tokens: Vec<Token>) -> Vec<String> {
        tokens
            .into_iter()
            .map(|t| match t {
                Token::Open => "(".to_string(),
                Token::Close => ")".to_string(),
                Token::Term(s) => s,
            })
            .collect()
    }

    #[test]
    fn test_tokenize_single_term() {
        assert_eq!(
            terms(SearchParser::tokenize("name").unwrap()),
            vec!["name"]
        );
        assert_eq!(
            terms(SearchParser::tokenize("name:foo").unwrap()),
            vec!["name:foo"]
        );
    }

    #[test]
    fn test_tokenize_multiple_terms() {
        assert_eq!(
            terms(SearchParser::tokenize("name:foo male:true date:1990-01-01").unwrap()),
            vec!["name:foo", "male:true", "date:1990-01-01"]
        );
    }

    #[test]
    fn test_tokenize_extra_spaces() {
        assert_eq!(
            terms(SearchParser::tokenize(" name:foo  male:true ").unwrap()),
            vec!["name:foo", "male:true"]
        );
    }

    #[test]
    fn test_tokenize_quotes_protect_spaces_and_brackets() {
        assert_eq!(
            terms(SearchParser::tokenize("name:\"Greg Leitheiser\" male:true").unwrap()),
            vec!["name:\"Greg Leitheiser\"", "male:true"]
        );
        assert_eq!(
            terms(SearchParser::tokenize("name:\"Greg [Leitheiser\" male:true").unwrap()),
            vec!["name:\"Greg [Leitheiser\"", "male:true"]
        );
        assert_eq!(
            terms(SearchParser::tokenize("name:\"Greg ]Leitheiser\" male:true").unwrap()),
            vec!["name:\"Greg ]Leitheiser\"", "male:true"]
        );
    }

    #[test]
    fn test_tokenize_range_keeps_spaces() {
        assert_eq!(
            terms(SearchParser::tokenize("date:[1990-01-01 TO 2000-01-01]").unwrap()),
            vec!["date:[1990-01-01 TO 2000-01-01]"]
        );
    }

    #[test]
    fn test_tokenize_parens_are_tokens() {
        assert_eq!(
            terms(SearchParser::tokenize("(name:foo OR name:bar) male:true").unwrap()),
            vec!["(", "name:foo", "OR", "name:bar", ")", "male:true"]
        );
    }

    #[test]
    fn test_tokenize_failures() {
        assert_eq!(
            SearchParser::tokenize("name:\"Greg male:true"),
            Err(ParseError::UnterminatedQuote)
        );
        assert_eq!(
            SearchParser::tokenize("date:[1990-01-01 TO 2000-01-01"),
            Err(ParseError::UnterminatedBracket)
        );
        assert_eq!(
            SearchParser::tokenize("date:[[1990-01-01 TO 2000-01-01]"),
            Err(ParseError::NestedBracket { position: 6 })
        );
        assert_eq!(
            SearchParser::tokenize("date:1990-01-01 TO 2000-01-01]"),
            Err(ParseError::UnopenedBracket { position: 29 })
        );
        assert_eq!(
            SearchParser::tokenize("name:\"Greg male:true date:[1990-01-01 \"TO 2000-01-01]"),
            Err(ParseError::UnopenedBracket { position: 52 })
        );
    }

    #[test]
    fn test_parse_implicit_and() {
        let parser = person_parser();
        let search = parser.parse("name:foo male:true").unwrap();
        let fragment = search.render(Dialect::Postgres);
        assert_eq!(fragment.sql, "(name ILIKE ? AND male = ?)");
        assert_eq!(
            fragment.values,
            vec![
                SqlValue::Text("%foo%".to_string()),
                SqlValue::Bool(true),
            ]
        );
    }

    #[test]
    fn test_parse_explicit_and_matches_implicit() {
        let parser = person_parser();
        let explicit = parser.parse("name:foo AND male:true").unwrap();
        let implicit = parser.parse("name:foo male:true").unwrap();
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_parse_or_groups_accumulated_ands() {
        let parser = person_parser();
        let search = parser.parse("name:foo male:true OR name:bar").unwrap();
        let fragment = search.render(Dialect::Postgres);
        assert_eq!(
            fragment.sql,
            "((name ILIKE ? AND male = ?) OR name ILIKE ?)"
        );
        assert_eq!(fragment.values.len(), 3);
    }

    #[test]
    fn test_parse_parens_with_or_and_date() {
        let parser = person_parser();
        let search = parser
            .parse("(name:foo OR male:true) AND date:1990-01-01")
            .unwrap();
        let fragment = search.render(Dialect::Postgres);
        assert_eq!(
            fragment.sql,
            "((name ILIKE ? OR male = ?) AND (date >= ? AND date <= ?))"
        );
        assert_eq!(
            fragment.values,
            vec![
                SqlValue::Text("%foo%".to_string()),
                SqlValue::Bool(true),
                SqlValue::Date(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()),
                SqlValue::Date(NaiveDate::from_ymd_opt(1990, 1, 2).unwrap()),
            ]
        );
    }

    #[test]
    fn test_parse_default_field() {
        let parser = person_parser();
        let search = parser.parse("foo").unwrap();
        let fragment = search.render(Dialect::Postgres);
        assert_eq!(fragment.sql, "name ILIKE ?");
        assert_eq!(fragment.values, vec![SqlValue::Text("%foo%".to_string())]);
    }

    #[test]
    fn test_parse_quoted_text_strips_quotes() {
        let parser = person_parser();
        let search = parser.parse("name:\"Greg Leitheiser\"").unwrap();
        let fragment = search.render(Dialect::Postgres);
        assert_eq!(
            fragment.values,
            vec![SqlValue::Text("%Greg Leitheiser%".to_string())]
        );
    }

    #[test]
    fn test_parse_enum_uppercases() {
        let parser = person_parser();
        let fragment = parser
            .parse("status:active")
            .unwrap()
            .render(Dialect::Postgres);
        assert_eq!(fragment.sql, "status = ?");
        assert_eq!(fragment.values, vec![SqlValue::Text("ACTIVE".to_string())]);
    }

    #[test]
    fn test_parse_list_values() {
        let parser = person_parser();
        let fragment = parser
            .parse("keywords:red|\"dark green\"")
            .unwrap()
            .render(Dialect::Postgres);
        assert_eq!(fragment.sql, "(? = any(keywords) OR ? = any(keywords))");
        assert_eq!(
            fragment.values,
            vec![
                SqlValue::Text("red".to_string()),
                SqlValue::Text("dark green".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_number_and_range() {
        let parser = person_parser();
        let fragment = parser.parse("age:42").unwrap().render(Dialect::Postgres);
        assert_eq!(fragment.sql, "age = ?");

        let fragment = parser
            .parse("age:[18 TO 65]")
            .unwrap()
            .render(Dialect::Postgres);
        assert_eq!(fragment.sql, "(age >= ? AND age <= ?)");

        let fragment = parser
            .parse("age:[18 TO *]")
            .unwrap()
            .render(Dialect::Postgres);
        assert_eq!(fragment.sql, "age >= ?");
    }

    #[test]
    fn test_parse_timestamp_requires_range() {
        let parser = person_parser();
        match parser.parse("last_seen:2020-01-01") {
            Err(QueryError::Parse(ParseError::TimeRangeRequired { field, .. })) => {
                assert_eq!(field, "last_seen");
            }
            other => panic!("expected TimeRangeRequired, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_timestamp_range_expands_bare_dates() {
        let parser = person_parser();
        let fragment = parser
            .parse("last_seen:[2020-01-01 TO 2020-01-02]")
            .unwrap()
            .render(Dialect::Postgres);
        assert_eq!(fragment.sql, "(last_seen >= ? AND last_seen <= ?)");
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_time(NaiveTime::MIN)
            .and_utc();
        let end = NaiveDate::from_ymd_opt(2020, 1, 3)
            .unwrap()
            .and_time(NaiveTime::MIN)
            .and_utc()
            - TimeDelta::nanoseconds(1);
        assert_eq!(
            fragment.values,
            vec![SqlValue::Timestamp(start), SqlValue::Timestamp(end)]
        );
    }

    #[test]
    fn test_parse_timestamp_range_normalizes_zones() {
        let parser = person_parser();
        let fragment = parser
            .parse("last_seen:[2020-06-01T12:00:00+02:00 TO *]")
            .unwrap()
            .render(Dialect::Postgres);
        let expected = NaiveDate::from_ymd_opt(2020, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(fragment.values, vec![SqlValue::Timestamp(expected)]);
    }

    #[test]
    fn test_parse_unknown_field() {
        let parser = person_parser();
        match parser.parse("height:12") {
            Err(QueryError::Schema(SchemaError::UnknownField { entity, field })) => {
                assert_eq!(entity, "person");
                assert_eq!(field, "height");
            }
            other => panic!("expected UnknownField, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_values_fail() {
        let parser = person_parser();
        assert!(parser.parse("male:yes").is_err());
        assert!(parser.parse("age:twelve").is_err());
        assert!(parser.parse("date:today").is_err());
        assert!(parser.parse("age:[18 UNTIL 65]").is_err());
    }

    #[test]
    fn test_parse_empty_input() {
        let parser = person_parser();
        assert!(parser.parse("").unwrap().is_empty());
        assert!(parser.parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_stray_close_paren_tolerated() {
        let parser = person_parser();
        let search = parser.parse("name:foo) male:true").unwrap();
        let fragment = search.render(Dialect::Postgres);
        assert_eq!(fragment.sql, "(name ILIKE ? AND male = ?)");
    }

    #[test]
    fn test_parse_unclosed_group_fails() {
        let parser = person_parser();
        assert!(matches!(
            parser.parse("(name:foo male:true"),
            Err(QueryError::Parse(ParseError::UnclosedGroup))
        ));
    }

    #[test]
    fn test_transformer_rename_and_custom_sql() {
        let schema = EntitySchema::new("person", "name").with_field("name", FieldType::Text);
        let transformer = FieldTransformer::new()
            .with_column("name", "full_name")
            .with_custom_sql("near", "distance(position, ?) < 25");
        let parser = SearchParser::with_transformer(schema, transformer);

        let fragment = parser.parse("name:foo").unwrap().render(Dialect::Postgres);
        assert_eq!(fragment.sql, "full_name ILIKE ?");

        let fragment = parser
            .parse("near:downtown")
            .unwrap()
            .render(Dialect::Postgres);
        assert_eq!(fragment.sql, "distance(position, ?) < 25");
        assert_eq!(
            fragment.values,
            vec![SqlValue::Text("downtown".to_string())]
        );
    }

    #[test]
    fn test_transformer_value_parser_yields_equality() {
        let schema = EntitySchema::new("person", "name").with_field("name", FieldType::Text);
        let transformer =
            FieldTransformer::new().with_parser("org", "org_id", |raw| match raw.parse::<i32>() {
                Ok(n) => SqlValue::Int(n),
                Err(_) => SqlValue::Null,
            });
        let parser = SearchParser::with_transformer(schema, transformer);

        let fragment = parser.parse("org:12").unwrap().render(Dialect::Postgres);
        assert_eq!(fragment.sql, "org_id = ?");
        assert_eq!(fragment.values, vec![SqlValue::Int(12)]);
    }

    #[test]
    fn test_transformer_type_override() {
        let schema = EntitySchema::new("person", "name").with_field("name", FieldType::Text);
        let transformer =
            FieldTransformer::new().with_type("status", "status_code", FieldType::Enum);
        let parser = SearchParser::with_transformer(schema, transformer);

        let fragment = parser
            .parse("status:active")
            .unwrap()
            .render(Dialect::Postgres);
        assert_eq!(fragment.sql, "status_code = ?");
        assert_eq!(fragment.values, vec![SqlValue::Text("ACTIVE".to_string())]);
    }

    #[test]
    fn test_translate_sort() {
        let schema = EntitySchema::new("person", "name").with_field("name", FieldType::Text);
        let transformer = FieldTransformer::new().with_column("display", "full_name");
        let parser = SearchParser::with_transformer(schema, transformer);

        assert_eq!(
            parser.translate_sort("display desc, age"),
            "full_name desc, age"
        );
        assert_eq!(parser.translate_sort("name"), "name");
    }
}
