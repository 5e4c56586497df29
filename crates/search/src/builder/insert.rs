//! INSERT statement builder.

use tracing::trace;

use super::{Param, advance, collect_bind_values};
use crate::context::{QueryContext, TenantScope};
use crate::error::BuilderError;
use crate::value::SqlValue;

/// Ordered construction phases; calls may never move backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Start,
    Into,
    Fields,
    Select,
    From,
    Join,
    Where,
    Values,
    On,
    Done,
}

/// Builder for parameterized INSERT statements.
///
/// Supports plain value-list inserts, SELECT-sourced inserts (field list
/// declared separately from the select), and upsert conflict clauses.
///
/// # Examples
///
/// ```
/// use steward_search::builder::InsertBuilder;
/// use steward_search::context::QueryContext;
///
/// let mut cmd = InsertBuilder::new(QueryContext::default())
///     .into_table("invite").unwrap()
///     .value("event_id", 1).unwrap()
///     .value("person_id", 2).unwrap()
///     .value("is_active", true).unwrap();
///
/// assert_eq!(
///     cmd.sql().unwrap(),
///     "INSERT INTO invite (event_id, person_id, is_active) VALUES (?, ?, ?)"
/// );
/// ```
#[derive(Debug)]
pub struct InsertBuilder {
    ctx: QueryContext,
    phase: Phase,
    table: Option<String>,
    fields: Vec<String>,
    select: Option<String>,
    from: Option<String>,
    joins: Vec<String>,
    wheres: Vec<String>,
    on: Option<String>,
    has_value_list: bool,
    params: Vec<Param>,
}

impl InsertBuilder {
    /// Creates a builder for the given context.
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            ctx,
            phase: Phase::Start,
            table: None,
            fields: Vec::new(),
            select: None,
            from: None,
            joins: Vec::new(),
            wheres: Vec::new(),
            on: None,
            has_value_list: false,
            params: Vec::new(),
        }
    }

    /// Sets the target table.
    pub fn into_table(mut self, table: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Into)?;
        self.table = Some(table.to_string());
        Ok(self)
    }

    /// Declares inserted fields for a SELECT-sourced insert.
    pub fn fields(mut self, fields: &[&str]) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Fields)?;
        self.fields.extend(fields.iter().map(|f| f.to_string()));
        Ok(self)
    }

    /// Declares one inserted field for a SELECT-sourced insert.
    pub fn field(mut self, field: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Fields)?;
        self.fields.push(field.to_string());
        Ok(self)
    }

    /// Sets the source selection for a SELECT-sourced insert.
    pub fn select(mut self, select: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Select)?;
        self.select = Some(select.to_string());
        Ok(self)
    }

    /// Sets the source table for a SELECT-sourced insert.
    pub fn from(mut self, from: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::From)?;
        self.from = Some(from.to_string());
        Ok(self)
    }

    /// Adds a LEFT JOIN to the source selection.
    pub fn left_join(mut self, join: &str, values: Vec<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Join)?;
        self.joins.push(format!("LEFT JOIN {}", join));
        self.params.extend(values.into_iter().map(Param::Value));
        Ok(self)
    }

    /// Adds a raw predicate to the source selection.
    ///
    /// Predicates may interleave with the other source-selection calls,
    /// so this does not advance the phase.
    pub fn where_clause(mut self, clause: &str) -> Result<Self, BuilderError> {
        self.ensure_not_rendered()?;
        self.wheres.push(clause.to_string());
        Ok(self)
    }

    /// Adds a predicate with one bind value to the source selection.
    pub fn where_value(
        self,
        clause: &str,
        value: impl Into<SqlValue>,
    ) -> Result<Self, BuilderError> {
        self.where_values(clause, vec![value.into()])
    }

    /// Adds a predicate with bind values to the source selection.
    pub fn where_values(
        mut self,
        clause: &str,
        values: Vec<SqlValue>,
    ) -> Result<Self, BuilderError> {
        self.ensure_not_rendered()?;
        self.wheres.push(clause.to_string());
        self.params.extend(values.into_iter().map(Param::Value));
        Ok(self)
    }

    fn ensure_not_rendered(&self) -> Result<(), BuilderError> {
        if self.phase == Phase::Done {
            return Err(BuilderError::AlreadyRendered);
        }
        Ok(())
    }

    /// Inserts a field with a bound value.
    pub fn value(mut self, field: &str, value: impl Into<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Values)?;
        self.fields.push(field.to_string());
        self.params.push(Param::Value(value.into()));
        self.has_value_list = true;
        Ok(self)
    }

    /// Inserts the context's organization id into the `org_id` column.
    ///
    /// No-op when tenancy is disabled.
    pub fn in_org(self) -> Result<Self, BuilderError> {
        self.in_org_field("org_id")
    }

    /// Inserts the context's organization id into the given column.
    pub fn in_org_field(mut self, field: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Values)?;
        if let TenantScope::Org(org) = self.ctx.tenancy() {
            self.fields.push(field.to_string());
            self.params.push(Param::Value(SqlValue::Int(org.as_i32())));
            self.has_value_list = true;
        }
        Ok(self)
    }

    /// Appends an `ON ...` conflict-resolution clause.
    pub fn on(mut self, on: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::On)?;
        self.on = Some(on.to_string());
        Ok(self)
    }

    /// Renders the statement. May be called once.
    pub fn sql(&mut self) -> Result<String, BuilderError> {
        if self.phase == Phase::Done {
            return Err(BuilderError::AlreadyRendered);
        }
        self.phase = Phase::Done;

        let table = self.table.as_deref().ok_or(BuilderError::Incomplete {
            missing: "table".to_string(),
        })?;

        let mut sql = String::new();
        sql.push_str("INSERT INTO ");
        sql.push_str(table);
        sql.push_str(" (");
        sql.push_str(&self.fields.join(", "));
        sql.push(')');
        if let Some(select) = &self.select {
            sql.push_str(" SELECT ");
            sql.push_str(select);
        }
        if let Some(from) = &self.from {
            sql.push_str(" FROM ");
            sql.push_str(from);
        }
        if !self.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&self.joins.join(" "));
        }
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.join(" AND "));
        }
        if self.has_value_list {
            let placeholders = vec!["?"; self.fields.len()].join(", ");
            sql.push_str(" VALUES (");
            sql.push_str(&placeholders);
            sql.push(')');
        }
        if let Some(on) = &self.on {
            sql.push_str(" ON ");
            sql.push_str(on);
        }

        trace!(sql = %sql, "rendered insert");
        Ok(sql)
    }

    /// Flattened, normalized bind values in placeholder order.
    pub fn bind_values(&self) -> Vec<SqlValue> {
        collect_bind_values(&self.params)
    }
}
