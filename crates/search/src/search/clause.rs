//! Search clause tree and SQL rendering.
//!
//! [`SearchClause`] is a closed sum type: one variant per predicate kind,
//! plus [`CompoundClause`] for AND/OR combinations. Every clause renders a
//! [`SqlFragment`] — SQL text using `?` placeholders and the ordered bind
//! values matching those placeholders left to right.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::context::Dialect;
use crate::error::ClauseError;
use crate::value::SqlValue;

/// A rendered SQL fragment with its ordered bind values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Bind values, one per placeholder, left to right.
    pub values: Vec<SqlValue>,
}

impl SqlFragment {
    /// Creates a fragment with no bind values.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            values: Vec::new(),
        }
    }

    /// Creates a fragment with bind values.
    pub fn with_values(sql: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// Returns `true` when the fragment renders no SQL.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Boolean combinator for compound clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    /// All children must match.
    And,
    /// Any child may match.
    Or,
}

impl BoolOp {
    fn joiner(self) -> &'static str {
        match self {
            BoolOp::And => " AND ",
            BoolOp::Or => " OR ",
        }
    }
}

/// A single predicate in a parsed search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchClause {
    /// Case-insensitive substring match.
    Text {
        /// Column filtered.
        field: String,
        /// Raw substring; wrapped in `%...%` at render time.
        value: String,
    },
    /// Equality against an upper-cased vocabulary value.
    Enum {
        /// Column filtered.
        field: String,
        /// Upper-cased value.
        value: String,
    },
    /// Numeric equality.
    Number {
        /// Column filtered.
        field: String,
        /// Exact value.
        value: Decimal,
    },
    /// Inclusive numeric range; either bound may be open.
    NumberRange {
        /// Column filtered.
        field: String,
        /// Lower bound, inclusive.
        start: Option<Decimal>,
        /// Upper bound, inclusive.
        end: Option<Decimal>,
    },
    /// Boolean equality.
    Boolean {
        /// Column filtered.
        field: String,
        /// Value matched.
        value: bool,
    },
    /// A single calendar day, matched as the inclusive window
    /// `[day, day + 1]`.
    Date {
        /// Column filtered.
        field: String,
        /// The day matched.
        value: NaiveDate,
    },
    /// Inclusive date range; either bound may be open.
    DateRange {
        /// Column filtered.
        field: String,
        /// Lower bound, inclusive.
        start: Option<NaiveDate>,
        /// Upper bound, inclusive.
        end: Option<NaiveDate>,
    },
    /// Inclusive timestamp range; either bound may be open. Bounds are UTC.
    TimeRange {
        /// Column filtered.
        field: String,
        /// Lower bound, inclusive.
        start: Option<DateTime<Utc>>,
        /// Upper bound, inclusive.
        end: Option<DateTime<Utc>>,
    },
    /// Membership test against an array-typed column.
    ListItem {
        /// Column filtered (array-typed).
        field: String,
        /// Candidate members; at least one.
        items: Vec<String>,
    },
    /// Plain equality for fields without a semantic type.
    Generic {
        /// Column filtered.
        field: String,
        /// Value matched.
        value: SqlValue,
    },
    /// Caller-supplied SQL fragment with one bound value.
    Custom {
        /// SQL fragment carrying its own `?` placeholder.
        sql: String,
        /// The bound value.
        value: SqlValue,
    },
    /// AND/OR combination of child clauses.
    Compound(CompoundClause),
}

impl SearchClause {
    fn require_field(field: &str) -> Result<(), ClauseError> {
        if field.is_empty() {
            return Err(ClauseError::EmptyField);
        }
        Ok(())
    }

    /// Case-insensitive substring match.
    pub fn text(field: &str, value: &str) -> Result<Self, ClauseError> {
        Self::require_field(field)?;
        Ok(SearchClause::Text {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    /// Equality against a vocabulary value; the value is upper-cased.
    pub fn enumeration(field: &str, value: &str) -> Result<Self, ClauseError> {
        Self::require_field(field)?;
        Ok(SearchClause::Enum {
            field: field.to_string(),
            value: value.to_uppercase(),
        })
    }

    /// Numeric equality.
    pub fn number(field: &str, value: Decimal) -> Result<Self, ClauseError> {
        Self::require_field(field)?;
        Ok(SearchClause::Number {
            field: field.to_string(),
            value,
        })
    }

    /// Inclusive numeric range.
    pub fn number_range(
        field: &str,
        start: Option<Decimal>,
        end: Option<Decimal>,
    ) -> Result<Self, ClauseError> {
        Self::require_field(field)?;
        Ok(SearchClause::NumberRange {
            field: field.to_string(),
            start,
            end,
        })
    }

    /// Boolean equality.
    pub fn boolean(field: &str, value: bool) -> Result<Self, ClauseError> {
        Self::require_field(field)?;
        Ok(SearchClause::Boolean {
            field: field.to_string(),
            value,
        })
    }

    /// One-day window.
    pub fn date(field: &str, value: NaiveDate) -> Result<Self, ClauseError> {
        Self::require_field(field)?;
        Ok(SearchClause::Date {
            field: field.to_string(),
            value,
        })
    }

    /// Inclusive date range.
    pub fn date_range(
        field: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, ClauseError> {
        Self::require_field(field)?;
        Ok(SearchClause::DateRange {
            field: field.to_string(),
            start,
            end,
        })
    }

    /// Inclusive timestamp range; bounds are stored in UTC.
    pub fn time_range(
        field: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, ClauseError> {
        Self::require_field(field)?;
        Ok(SearchClause::TimeRange {
            field: field.to_string(),
            start,
            end,
        })
    }

    /// Membership test; `items` must be non-empty.
    pub fn list_item(field: &str, items: Vec<String>) -> Result<Self, ClauseError> {
        Self::require_field(field)?;
        if items.is_empty() {
            return Err(ClauseError::EmptyList {
                field: field.to_string(),
            });
        }
        Ok(SearchClause::ListItem {
            field: field.to_string(),
            items,
        })
    }

    /// Plain equality.
    pub fn generic(field: &str, value: impl Into<SqlValue>) -> Result<Self, ClauseError> {
        Self::require_field(field)?;
        Ok(SearchClause::Generic {
            field: field.to_string(),
            value: value.into(),
        })
    }

    /// Caller-supplied SQL fragment with one bound value.
    pub fn custom(sql: &str, value: impl Into<SqlValue>) -> Result<Self, ClauseError> {
        if sql.is_empty() {
            return Err(ClauseError::EmptySql);
        }
        Ok(SearchClause::Custom {
            sql: sql.to_string(),
            value: value.into(),
        })
    }

    /// Renders the clause for the given dialect.
    pub fn render(&self, dialect: Dialect) -> SqlFragment {
        match self {
            SearchClause::Text { field, value } => SqlFragment::with_values(
                format!("{} {} ?", field, dialect.like_operator()),
                vec![SqlValue::Text(format!("%{}%", value))],
            ),
            SearchClause::Enum { field, value } => SqlFragment::with_values(
                format!("{} = ?", field),
                vec![SqlValue::Text(value.clone())],
            ),
            SearchClause::Number { field, value } => SqlFragment::with_values(
                format!("{} = ?", field),
                vec![SqlValue::Numeric(*value)],
            ),
            SearchClause::NumberRange { field, start, end } => range_fragment(
                field,
                start.map(SqlValue::Numeric),
                end.map(SqlValue::Numeric),
            ),
            SearchClause::Boolean { field, value } => {
                SqlFragment::with_values(format!("{} = ?", field), vec![SqlValue::Bool(*value)])
            }
            SearchClause::Date { field, value } => {
                let next = value.checked_add_days(Days::new(1)).unwrap_or(*value);
                range_fragment(field, Some(SqlValue::Date(*value)), Some(SqlValue::Date(next)))
            }
            SearchClause::DateRange { field, start, end } => {
                range_fragment(field, start.map(SqlValue::Date), end.map(SqlValue::Date))
            }
            SearchClause::TimeRange { field, start, end } => range_fragment(
                field,
                start.map(SqlValue::Timestamp),
                end.map(SqlValue::Timestamp),
            ),
            SearchClause::ListItem { field, items } => {
                let test = format!("? = any({})", field);
                let joined = vec![test; items.len()].join(" OR ");
                let sql = if items.len() > 1 {
                    format!("({})", joined)
                } else {
                    joined
                };
                let values = items
                    .iter()
                    .map(|item| SqlValue::Text(item.clone()))
                    .collect();
                SqlFragment::with_values(sql, values)
            }
            SearchClause::Generic { field, value } => {
                SqlFragment::with_values(format!("{} = ?", field), vec![value.clone()])
            }
            SearchClause::Custom { sql, value } => {
                SqlFragment::with_values(sql.clone(), vec![value.clone()])
            }
            SearchClause::Compound(compound) => compound.render(dialect),
        }
    }
}

/// Renders an inclusive range, parenthesized only when both bounds exist.
fn range_fragment(field: &str, start: Option<SqlValue>, end: Option<SqlValue>) -> SqlFragment {
    match (start, end) {
        (Some(start), Some(end)) => SqlFragment::with_values(
            format!("({field} >= ? AND {field} <= ?)"),
            vec![start, end],
        ),
        (Some(start), None) => SqlFragment::with_values(format!("{field} >= ?"), vec![start]),
        (None, Some(end)) => SqlFragment::with_values(format!("{field} <= ?"), vec![end]),
        (None, None) => SqlFragment::default(),
    }
}

/// AND/OR combination of child clauses.
///
/// Renders its children joined by the combinator, wrapped in parentheses
/// unless exactly one child renders — a single leaf prints without
/// extraneous parens. Children rendering empty fragments are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundClause {
    op: BoolOp,
    children: Vec<SearchClause>,
}

impl CompoundClause {
    /// Creates an empty compound.
    pub fn new(op: BoolOp) -> Self {
        Self {
            op,
            children: Vec::new(),
        }
    }

    /// Creates a compound from children.
    pub fn with_children(op: BoolOp, children: Vec<SearchClause>) -> Self {
        Self { op, children }
    }

    /// The combinator.
    pub fn op(&self) -> BoolOp {
        self.op
    }

    /// The child clauses, in order.
    pub fn children(&self) -> &[SearchClause] {
        &self.children
    }

    /// Returns `true` when the compound has no children.
    pub fn is_childless(&self) -> bool {
        self.children.is_empty()
    }

    /// Appends a child clause.
    pub fn push(&mut self, clause: SearchClause) {
        self.children.push(clause);
    }

    /// Unwraps a single-child compound to the bare child.
    pub fn collapse(mut self) -> SearchClause {
        if self.children.len() == 1 {
            self.children.remove(0)
        } else {
            SearchClause::Compound(self)
        }
    }

    /// Renders the compound for the given dialect.
    pub fn render(&self, dialect: Dialect) -> SqlFragment {
        let mut rendered: Vec<SqlFragment> = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let fragment = child.render(dialect);
            if !fragment.is_empty() {
                rendered.push(fragment);
            }
        }

        match rendered.len() {
            0 => SqlFragment::default(),
            1 => rendered.remove(0),
            _ => {
                let sql = rendered
                    .iter()
                    .map(|f| f.sql.as_str())
                    .collect::<Vec<_>>()
                    .join(self.op.joiner());
                let values = rendered.into_iter().flat_map(|f| f.values).collect();
                SqlFragment::with_values(format!("({})", sql), values)
            }
        }
    }
}
