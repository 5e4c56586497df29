//! DELETE statement builder.

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
    Table,
    Where,
    Done,
}

/// Builder for parameterized DELETE statements.
///
/// # Examples
///
/// ```
/// use steward_search::builder::{DeleteBuilder, Filterable};
/// use steward_search::context::QueryContext;
///
/// let mut cmd = DeleteBuilder::new(QueryContext::default())
///     .from("sessions").unwrap()
///     .with("person_id", 8).unwrap();
///
/// assert_eq!(cmd.sql().unwrap(), "DELETE FROM sessions WHERE person_id=?");
/// ```
#[derive(Debug)]
pub struct DeleteBuilder {
    ctx: QueryContext,
    phase: Phase,
    table: Option<String>,
    filter_set: FilterSet,
    params: Vec<Param>,
    parser: Option<Arc<SearchParser>>,
}

impl DeleteBuilder {
    /// Creates a builder for the given context.
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            ctx,
            phase: Phase::Start,
            table: None,
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

    /// Sets the table to delete from.
    pub fn from(mut self, table: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Table)?;
        self.table = Some(table.to_string());
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

        let mut sql = format!("DELETE FROM {}", table);
        if let Some(where_sql) = self.filter_set.render() {
            sql.push(' ');
            sql.push_str(&where_sql);
        }

        trace!(sql = %sql, "rendered delete");
        Ok(sql)
    }

    /// Flattened, normalized bind values in placeholder order.
    pub fn bind_values(&self) -> Vec<SqlValue> {
        collect_bind_values(&self.params)
    }
}

impl Filterable for DeleteBuilder {
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
