//! SQL statement builders.
//!
//! Each builder is a phase-ordered state machine: methods assert that the
//! phase they belong to is not behind the builder's current phase, so SQL
//! sections can only be assembled in the order they render. Violations are
//! typed [`BuilderError`]s, rendering happens exactly once, and bind values
//! accumulate in placeholder order — including values carried by embedded
//! sub-builders, which flatten recursively at bind time.
//!
//! Builders are built and discarded per request; none are reusable after
//! `sql()`.

mod batch;
mod delete;
mod insert;
mod query;
mod update;

pub use batch::{BatchDeleteBuilder, BatchInsertBuilder, BatchUpdateBuilder};
pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use query::QueryBuilder;
pub use update::UpdateBuilder;

use std::fmt;

use crate::context::{QueryContext, TenantScope};
use crate::error::{BuilderError, QueryError};
use crate::search::{Search, SearchParser};
use crate::value::SqlValue;

/// An accumulated bind slot: a scalar, or an embedded sub-statement's
/// slots carried along positionally.
#[derive(Debug, Clone)]
pub enum Param {
    /// A scalar bind value.
    Value(SqlValue),
    /// The parameter list of an embedded sub-builder.
    Nested(Vec<Param>),
}

/// Flattens params depth-first into normalized bind values.
pub(crate) fn flatten_params(params: &[Param], out: &mut Vec<SqlValue>) {
    for param in params {
        match param {
            Param::Value(value) => out.push(value.clone().normalized()),
            Param::Nested(inner) => flatten_params(inner, out),
        }
    }
}

/// Collects a builder's bind values in placeholder order.
pub(crate) fn collect_bind_values(params: &[Param]) -> Vec<SqlValue> {
    let mut out = Vec::with_capacity(params.len());
    flatten_params(params, &mut out);
    out
}

/// Moves a builder phase forward, rejecting backward transitions.
pub(crate) fn advance<P>(current: &mut P, next: P) -> Result<(), BuilderError>
where
    P: PartialOrd + Copy + fmt::Debug,
{
    if next < *current {
        return Err(BuilderError::OutOfOrder {
            attempted: format!("{:?}", next),
            current: format!("{:?}", current),
        });
    }
    *current = next;
    Ok(())
}

/// OR-of-ANDs predicate accumulator.
///
/// Predicates land in the current AND group; [`FilterSet::start_or_group`]
/// seals the group as one OR alternative. At render time a trailing
/// ungrouped list folds in as one more alternative:
/// `WHERE (g1a AND g1b) OR (g2a) OR (g3a AND g3b)`.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    groups: Vec<Vec<String>>,
    current: Vec<String>,
}

impl FilterSet {
    /// Adds a predicate to the current AND group.
    pub fn add(&mut self, clause: String) {
        self.current.push(clause);
    }

    /// Seals the current AND group as an OR alternative.
    pub fn start_or_group(&mut self) {
        self.groups.push(std::mem::take(&mut self.current));
    }

    /// Returns `true` when no predicates have been added.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.groups.iter().all(|g| g.is_empty())
    }

    /// Renders the `WHERE ...` section, or `None` when empty.
    pub fn render(&self) -> Option<String> {
        let mut groups: Vec<&Vec<String>> =
            self.groups.iter().filter(|g| !g.is_empty()).collect();
        if !self.current.is_empty() && !groups.is_empty() {
            groups.push(&self.current);
        }

        if !groups.is_empty() {
            let alternatives = groups
                .iter()
                .map(|g| g.join(" AND "))
                .collect::<Vec<_>>()
                .join(") OR (");
            return Some(format!("WHERE ({})", alternatives));
        }
        if !self.current.is_empty() {
            return Some(format!("WHERE {}", self.current.join(" AND ")));
        }
        None
    }
}

/// Shared filtering vocabulary for WHERE-capable builders.
///
/// Implemented by [`QueryBuilder`], [`UpdateBuilder`] and
/// [`DeleteBuilder`]. The accessor methods expose the builder's filter
/// state to the provided methods; callers use the provided vocabulary.
pub trait Filterable: Sized {
    /// Moves the builder into its WHERE phase.
    fn begin_where(&mut self) -> Result<(), BuilderError>;

    /// The builder's predicate accumulator.
    fn filters(&mut self) -> &mut FilterSet;

    /// The builder's bind slots.
    fn params_mut(&mut self) -> &mut Vec<Param>;

    /// The builder's rendering context.
    fn context(&self) -> &QueryContext;

    /// The attached search parser, if any.
    fn parser(&self) -> Option<&SearchParser>;

    /// Adds an equality predicate; a [`SqlValue::Null`] renders
    /// `field IS NULL` and binds nothing.
    fn with(mut self, field: &str, value: impl Into<SqlValue>) -> Result<Self, BuilderError> {
        self.begin_where()?;
        let value = value.into();
        if value.is_null() {
            self.filters().add(format!("{} IS NULL", field));
        } else {
            self.filters().add(format!("{}=?", field));
            self.params_mut().push(Param::Value(value));
        }
        Ok(self)
    }

    /// Equality on the `id` column.
    fn with_id(self, id: i32) -> Result<Self, BuilderError> {
        self.with("id", id)
    }

    /// Membership of the `id` column in a list.
    fn with_id_in(self, ids: Vec<i32>) -> Result<Self, BuilderError> {
        self.with_any("id", ids.into_iter().map(SqlValue::from).collect())
    }

    /// Adds a `field IN (?, ...)` predicate; an empty list is an error.
    fn with_any(mut self, field: &str, values: Vec<SqlValue>) -> Result<Self, BuilderError> {
        self.begin_where()?;
        if values.is_empty() {
            return Err(BuilderError::EmptyInList {
                field: field.to_string(),
            });
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.filters().add(format!("{} IN ({})", field, placeholders));
        self.params_mut().extend(values.into_iter().map(Param::Value));
        Ok(self)
    }

    /// Closes the current AND group and starts a new OR alternative.
    fn or(mut self) -> Result<Self, BuilderError> {
        self.begin_where()?;
        self.filters().start_or_group();
        Ok(self)
    }

    /// Adds a raw predicate with no bind values.
    fn where_clause(mut self, clause: &str) -> Result<Self, BuilderError> {
        self.begin_where()?;
        self.filters().add(clause.to_string());
        Ok(self)
    }

    /// Adds a raw predicate with one bind value.
    fn where_value(
        self,
        clause: &str,
        value: impl Into<SqlValue>,
    ) -> Result<Self, BuilderError> {
        self.where_values(clause, vec![value.into()])
    }

    /// Adds a raw predicate with bind values.
    fn where_values(
        mut self,
        clause: &str,
        values: Vec<SqlValue>,
    ) -> Result<Self, BuilderError> {
        self.begin_where()?;
        self.filters().add(clause.to_string());
        self.params_mut().extend(values.into_iter().map(Param::Value));
        Ok(self)
    }

    /// Embeds a sub-select: `field IN (<subselect>)`.
    ///
    /// The sub-builder renders here and its bind values travel along
    /// positionally, flattened at bind time.
    fn where_id_in(
        mut self,
        field: &str,
        mut subselect: QueryBuilder,
    ) -> Result<Self, BuilderError> {
        self.begin_where()?;
        let sql = subselect.sql()?;
        self.filters().add(format!("{} IN ({})", field, sql));
        self.params_mut().push(Param::Nested(subselect.into_params()));
        Ok(self)
    }

    /// Embeds a sub-select: `field NOT IN (<subselect>)`.
    fn where_id_not_in(
        mut self,
        field: &str,
        mut subselect: QueryBuilder,
    ) -> Result<Self, BuilderError> {
        self.begin_where()?;
        let sql = subselect.sql()?;
        self.filters().add(format!("{} NOT IN ({})", field, sql));
        self.params_mut().push(Param::Nested(subselect.into_params()));
        Ok(self)
    }

    /// Scopes rows to the context's organization via the `org_id` column.
    ///
    /// Renders nothing when tenancy is disabled.
    fn in_org(self) -> Result<Self, BuilderError> {
        self.in_org_field("org_id")
    }

    /// Scopes rows to the context's organization via the given column.
    fn in_org_field(mut self, field: &str) -> Result<Self, BuilderError> {
        self.begin_where()?;
        if let TenantScope::Org(org) = self.context().tenancy() {
            self.filters().add(format!("{}=?", field));
            self.params_mut()
                .push(Param::Value(SqlValue::Int(org.as_i32())));
        }
        Ok(self)
    }

    /// Tenant scoping that also admits system rows (NULL org).
    fn in_org_or_system(self) -> Result<Self, BuilderError> {
        self.in_org_or_system_field("org_id")
    }

    /// Tenant-or-system scoping via the given column.
    fn in_org_or_system_field(mut self, field: &str) -> Result<Self, BuilderError> {
        self.begin_where()?;
        if let TenantScope::Org(org) = self.context().tenancy() {
            self.filters()
                .add(format!("({field}=? OR {field} IS NULL)"));
            self.params_mut()
                .push(Param::Value(SqlValue::Int(org.as_i32())));
        }
        Ok(self)
    }

    /// Tenant scoping, optionally admitting system rows.
    fn in_org_with_system(self, include_system: bool) -> Result<Self, BuilderError> {
        if include_system {
            self.in_org_or_system()
        } else {
            self.in_org()
        }
    }

    /// Folds a parsed search in as one predicate.
    fn search(mut self, search: &Search) -> Result<Self, BuilderError> {
        self.begin_where()?;
        if search.is_empty() {
            return Ok(self);
        }
        let fragment = search.render(self.context().dialect());
        if fragment.is_empty() {
            return Ok(self);
        }
        self.filters().add(fragment.sql);
        self.params_mut()
            .extend(fragment.values.into_iter().map(Param::Value));
        Ok(self)
    }

    /// Parses a search string with the attached parser and folds it in.
    fn search_str(self, input: &str) -> Result<Self, QueryError> {
        let search = self
            .parser()
            .ok_or(BuilderError::ParserNotConfigured)?
            .parse(input)?;
        Ok(self.search(&search)?)
    }
}
