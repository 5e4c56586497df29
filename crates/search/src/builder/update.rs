//! UPDATE statement builder.

use std::sync::Arc;

use tracing::trace;

use super::{FilterSet, Filterable, Param, advance, collect_bind_values};
use crate::context::QueryContext;
use crate::error::BuilderError;
use crate::search::SearchParser;
use crate::value::SqlValue;

/// Ordered construction phases; calls may never move backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Start,
    WithCte,
    Table,
    Join,
    Values,
    Where,
    Done,
}

/// Builder for parameterized UPDATE statements.
///
/// # Examples
///
/// ```
/// use steward_search::builder::{Filterable, UpdateBuilder};
/// use steward_search::context::QueryContext;
///
/// let mut cmd = UpdateBuilder::new(QueryContext::default())
///     .update("person").unwrap()
///     .value("name", "Greg").unwrap()
///     .with_id(12).unwrap();
///
/// assert_eq!(cmd.sql().unwrap(), "UPDATE person SET name=? WHERE id=?");
/// ```
#[derive(Debug)]
pub struct UpdateBuilder {
    ctx: QueryContext,
    phase: Phase,
    cte: Option<String>,
    table: Option<String>,
    joins: Vec<String>,
    fields: Vec<String>,
    filter_set: FilterSet,
    params: Vec<Param>,
    parser: Option<Arc<SearchParser>>,
}

impl UpdateBuilder {
    /// Creates a builder for the given context.
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            ctx,
            phase: Phase::Start,
            cte: None,
            table: None,
            joins: Vec::new(),
            fields: Vec::new(),
            filter_set: FilterSet::default(),
            params: Vec::new(),
            parser: None,
        }
    }

    /// Attaches a search parser for `search_str`.
    pub fn with_parser(mut self, parser: Arc<SearchParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Prefixes the statement with a common table expression.
    pub fn with_cte(mut self, cte: &str, values: Vec<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::WithCte)?;
        self.cte = Some(cte.to_string());
        self.params.extend(values.into_iter().map(Param::Value));
        Ok(self)
    }

    /// Sets the updated table.
    pub fn update(mut self, table: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Table)?;
        self.table = Some(table.to_string());
        Ok(self)
    }

    /// Adds a LEFT JOIN with bind values.
    pub fn left_join(mut self, join: &str, values: Vec<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Join)?;
        self.joins.push(format!("LEFT JOIN {}", join));
        self.params.extend(values.into_iter().map(Param::Value));
        Ok(self)
    }

    /// Sets a column to a bound value.
    pub fn value(mut self, field: &str, value: impl Into<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Values)?;
        self.fields.push(field.to_string());
        self.params.push(Param::Value(value.into()));
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
        if let Some(cte) = &self.cte {
            sql.push_str("WITH ");
            sql.push_str(cte);
            sql.push(' ');
        }
        sql.push_str("UPDATE ");
        sql.push_str(table);
        if !self.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&self.joins.join(" "));
        }
        if !self.fields.is_empty() {
            sql.push_str(" SET ");
            let assignments = self
                .fields
                .iter()
                .map(|f| format!("{}=?", f))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&assignments);
        }
        if let Some(where_sql) = self.filter_set.render() {
            sql.push(' ');
            sql.push_str(&where_sql);
        }

        trace!(sql = %sql, "rendered update");
        Ok(sql)
    }

    /// Flattened, normalized bind values in placeholder order.
    pub fn bind_values(&self) -> Vec<SqlValue> {
        collect_bind_values(&self.params)
    }
}

impl Filterable for UpdateBuilder {
    fn begin_where(&mut self) -> Result<(), BuilderError> {
        advance(&mut self.phase, Phase::Where)
    }

    fn filters(&mut self) -> &mut FilterSet {
        &mut self.filter_set
    }

    fn params_mut(&mut self) -> &mut Vec<Param> {
        &mut self.params
    }

    fn context(&self) -> &QueryContext {
        &self.ctx
    }

    fn parser(&self) -> Option<&SearchParser> {
        self.parser.as_deref()
    }
}
