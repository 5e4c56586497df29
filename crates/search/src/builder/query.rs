//! SELECT statement builder.

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
    Select,
    From,
    Join,
    Where,
    Group,
    Sort,
    Limit,
    Offset,
    Done,
}

/// Builder for parameterized SELECT statements.
///
/// # Examples
///
/// ```
/// use steward_search::builder::{Filterable, QueryBuilder};
/// use steward_search::context::QueryContext;
///
/// let ctx = QueryContext::default();
/// let mut query = QueryBuilder::new(ctx)
///     .select(&["id", "name"]).unwrap()
///     .from(&["people"]).unwrap()
///     .with("active", true).unwrap()
///     .sort("name").unwrap()
///     .limit(25).unwrap();
///
/// assert_eq!(
///     query.sql().unwrap(),
///     "SELECT id, name FROM people WHERE active=? ORDER BY name LIMIT ?"
/// );
/// assert_eq!(query.bind_values().len(), 2);
/// ```
#[derive(Debug)]
pub struct QueryBuilder {
    ctx: QueryContext,
    phase: Phase,
    cte: Option<String>,
    distinct: bool,
    selections: Vec<String>,
    tables: Vec<String>,
    joins: Vec<String>,
    filter_set: FilterSet,
    group_by: Vec<String>,
    sort: Option<String>,
    limit: bool,
    offset: bool,
    params: Vec<Param>,
    parser: Option<Arc<SearchParser>>,
}

impl QueryBuilder {
    /// Creates a builder for the given context.
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            ctx,
            phase: Phase::Start,
            cte: None,
            distinct: false,
            selections: Vec::new(),
            tables: Vec::new(),
            joins: Vec::new(),
            filter_set: FilterSet::default(),
            group_by: Vec::new(),
            sort: None,
            limit: false,
            offset: false,
            params: Vec::new(),
            parser: None,
        }
    }

    /// Attaches a search parser for `search_str` and sort translation.
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

    /// Adds selection expressions.
    pub fn select(mut self, selections: &[&str]) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Select)?;
        self.selections
            .extend(selections.iter().map(|s| s.to_string()));
        Ok(self)
    }

    /// Adds a selection expression carrying bind values.
    pub fn select_with(mut self, selection: &str, values: Vec<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Select)?;
        self.selections.push(selection.to_string());
        self.params.extend(values.into_iter().map(Param::Value));
        Ok(self)
    }

    /// Makes the selection DISTINCT.
    pub fn distinct(mut self) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Select)?;
        self.distinct = true;
        Ok(self)
    }

    /// Adds source tables.
    pub fn from(mut self, tables: &[&str]) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::From)?;
        self.tables.extend(tables.iter().map(|t| t.to_string()));
        Ok(self)
    }

    /// Uses another query as an aliased source.
    pub fn from_query(mut self, mut query: QueryBuilder, alias: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::From)?;
        let sql = query.sql()?;
        self.tables.push(format!("({}) {}", sql, alias));
        self.params.push(Param::Nested(query.into_params()));
        Ok(self)
    }

    /// Adds raw join clauses.
    pub fn join(mut self, joins: &[&str]) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Join)?;
        self.joins.extend(joins.iter().map(|j| j.to_string()));
        Ok(self)
    }

    /// Adds a LEFT JOIN with bind values.
    pub fn left_join(mut self, join: &str, values: Vec<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Join)?;
        self.joins.push(format!("LEFT JOIN {}", join));
        self.params.extend(values.into_iter().map(Param::Value));
        Ok(self)
    }

    /// LEFT JOIN against a correlated sub-query.
    pub fn left_join_query(
        self,
        query: QueryBuilder,
        alias: &str,
        join_on: &str,
    ) -> Result<Self, BuilderError> {
        self.join_subquery("LEFT JOIN", query, alias, join_on)
    }

    /// Adds an INNER JOIN with bind values.
    pub fn inner_join(mut self, join: &str, values: Vec<SqlValue>) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Join)?;
        self.joins.push(format!("INNER JOIN {}", join));
        self.params.extend(values.into_iter().map(Param::Value));
        Ok(self)
    }

    /// INNER JOIN against a correlated sub-query.
    pub fn inner_join_query(
        self,
        query: QueryBuilder,
        alias: &str,
        join_on: &str,
    ) -> Result<Self, BuilderError> {
        self.join_subquery("INNER JOIN", query, alias, join_on)
    }

    /// LEFT JOIN LATERAL against a correlated sub-query.
    pub fn left_join_lateral(
        self,
        query: QueryBuilder,
        alias: &str,
        join_on: &str,
    ) -> Result<Self, BuilderError> {
        self.join_subquery("LEFT JOIN LATERAL", query, alias, join_on)
    }

    /// FULL OUTER JOIN against a correlated sub-query.
    pub fn full_outer_join(
        self,
        query: QueryBuilder,
        alias: &str,
        join_on: &str,
    ) -> Result<Self, BuilderError> {
        self.join_subquery("FULL OUTER JOIN", query, alias, join_on)
    }

    fn join_subquery(
        mut self,
        kind: &str,
        mut query: QueryBuilder,
        alias: &str,
        join_on: &str,
    ) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Join)?;
        let sql = query.sql()?;
        self.joins
            .push(format!("{} ({}) {} ON {}", kind, sql, alias, join_on));
        self.params.push(Param::Nested(query.into_params()));
        Ok(self)
    }

    /// Adds GROUP BY fields.
    pub fn group_by(mut self, fields: &[&str]) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Group)?;
        self.group_by.extend(fields.iter().map(|f| f.to_string()));
        Ok(self)
    }

    /// Applies sort, limit and offset in one call.
    pub fn page(self, sort: &str, start: i64, count: i64) -> Result<Self, BuilderError> {
        self.sort(sort)?.limit(count)?.offset(start)
    }

    /// Sets the ORDER BY expression.
    ///
    /// When a parser is attached, external field names in the expression
    /// are translated to column names.
    pub fn sort(mut self, sort: &str) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Sort)?;
        self.sort = Some(match &self.parser {
            Some(parser) => parser.translate_sort(sort),
            None => sort.to_string(),
        });
        Ok(self)
    }

    /// Sets LIMIT; non-positive values render no limit.
    pub fn limit(mut self, limit: i64) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Limit)?;
        if limit > 0 {
            self.limit = true;
            self.params.push(Param::Value(SqlValue::BigInt(limit)));
        }
        Ok(self)
    }

    /// Sets OFFSET; non-positive values render no offset.
    pub fn offset(mut self, offset: i64) -> Result<Self, BuilderError> {
        advance(&mut self.phase, Phase::Offset)?;
        if offset > 0 {
            self.offset = true;
            self.params.push(Param::Value(SqlValue::BigInt(offset)));
        }
        Ok(self)
    }

    /// Renders the statement. May be called once.
    pub fn sql(&mut self) -> Result<String, BuilderError> {
        if self.phase == Phase::Done {
            return Err(BuilderError::AlreadyRendered);
        }
        self.phase = Phase::Done;

        let mut sql = String::new();
        if let Some(cte) = &self.cte {
            sql.push_str("WITH ");
            sql.push_str(cte);
            sql.push(' ');
        }
        sql.push_str("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.selections.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.tables.join(", "));
        if !self.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&self.joins.join(" "));
        }
        if let Some(where_sql) = self.filter_set.render() {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if let Some(sort) = &self.sort {
            sql.push_str(" ORDER BY ");
            sql.push_str(sort);
        }
        if self.limit {
            sql.push_str(" LIMIT ?");
        }
        if self.offset {
            sql.push_str(" OFFSET ?");
        }

        trace!(sql = %sql, "rendered select");
        Ok(sql)
    }

    /// Flattened, normalized bind values in placeholder order.
    pub fn bind_values(&self) -> Vec<SqlValue> {
        collect_bind_values(&self.params)
    }

    pub(crate) fn into_params(self) -> Vec<Param> {
        self.params
    }
}

impl Filterable for QueryBuilder {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Dialect, OrgId, QueryContext};

    fn ctx() -> QueryContext {
        QueryContext::single_tenant(Dialect::Postgres)
    }

    #[test]
    fn test_full_select_order() {
        let mut query = QueryBuilder::new(ctx())
            .select(&["id", "name"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .with("active", true)
            .unwrap()
            .sort("name")
            .unwrap()
            .limit(10)
            .unwrap()
            .offset(20)
            .unwrap();

        assert_eq!(
            query.sql().unwrap(),
            "SELECT id, name FROM people WHERE active=? ORDER BY name LIMIT ? OFFSET ?"
        );
        assert_eq!(
            query.bind_values(),
            vec![
                SqlValue::Bool(true),
                SqlValue::BigInt(10),
                SqlValue::BigInt(20),
            ]
        );
    }

    #[test]
    fn test_select_after_where_fails() {
        let query = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .with("active", true)
            .unwrap();

        let err = query.select(&["name"]).unwrap_err();
        assert_eq!(
            err,
            BuilderError::OutOfOrder {
                attempted: "Select".to_string(),
                current: "Where".to_string(),
            }
        );
    }

    #[test]
    fn test_sql_renders_once() {
        let mut query = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap();
        query.sql().unwrap();
        assert_eq!(query.sql(), Err(BuilderError::AlreadyRendered));
    }

    #[test]
    fn test_or_composition() {
        let mut query = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .with("a", 1)
            .unwrap()
            .with("b", 2)
            .unwrap()
            .or()
            .unwrap()
            .with("c", 3)
            .unwrap();

        assert_eq!(
            query.sql().unwrap(),
            "SELECT id FROM people WHERE (a=? AND b=?) OR (c=?)"
        );
    }

    #[test]
    fn test_with_null_renders_is_null() {
        let mut query = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .with("deleted_at", SqlValue::Null)
            .unwrap();

        assert_eq!(
            query.sql().unwrap(),
            "SELECT id FROM people WHERE deleted_at IS NULL"
        );
        assert!(query.bind_values().is_empty());
    }

    #[test]
    fn test_with_any() {
        let mut query = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .with_id_in(vec![1, 2, 3])
            .unwrap();

        assert_eq!(
            query.sql().unwrap(),
            "SELECT id FROM people WHERE id IN (?, ?, ?)"
        );
        assert_eq!(query.bind_values().len(), 3);
    }

    #[test]
    fn test_with_any_empty_fails() {
        let err = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .with_any("id", Vec::new())
            .unwrap_err();
        assert_eq!(
            err,
            BuilderError::EmptyInList {
                field: "id".to_string()
            }
        );
    }

    #[test]
    fn test_cte_prefix() {
        let mut query = QueryBuilder::new(ctx())
            .with_cte("recent AS (SELECT id FROM events WHERE at > ?)", vec![
                SqlValue::Text("2020-01-01".to_string()),
            ])
            .unwrap()
            .select(&["e.id"])
            .unwrap()
            .from(&["entity e"])
            .unwrap();

        assert_eq!(
            query.sql().unwrap(),
            "WITH recent AS (SELECT id FROM events WHERE at > ?) SELECT e.id FROM entity e"
        );
        assert_eq!(query.bind_values().len(), 1);
    }

    #[test]
    fn test_subselect_params_flatten_in_order() {
        let sub = QueryBuilder::new(ctx())
            .select(&["person_id"])
            .unwrap()
            .from(&["sessions"])
            .unwrap()
            .with("org_id", 5)
            .unwrap();

        let mut query = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .with("active", true)
            .unwrap()
            .where_id_in("id", sub)
            .unwrap()
            .where_value("name=?", "x")
            .unwrap();

        assert_eq!(
            query.sql().unwrap(),
            "SELECT id FROM people WHERE active=? AND id IN \
             (SELECT person_id FROM sessions WHERE org_id=?) AND name=?"
        );
        assert_eq!(
            query.bind_values(),
            vec![
                SqlValue::Bool(true),
                SqlValue::Int(5),
                SqlValue::Text("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_join_subquery() {
        let counts = QueryBuilder::new(ctx())
            .select(&["person_id", "count(*) AS visits"])
            .unwrap()
            .from(&["sessions"])
            .unwrap()
            .with("kind", "web")
            .unwrap();

        let mut query = QueryBuilder::new(ctx())
            .select(&["p.id", "v.visits"])
            .unwrap()
            .from(&["people p"])
            .unwrap()
            .left_join_query(counts, "v", "v.person_id = p.id")
            .unwrap();

        assert_eq!(
            query.sql().unwrap(),
            "SELECT p.id, v.visits FROM people p LEFT JOIN \
             (SELECT person_id, count(*) AS visits FROM sessions WHERE kind=?) v \
             ON v.person_id = p.id"
        );
        assert_eq!(query.bind_values().len(), 1);
    }

    #[test]
    fn test_from_query() {
        let inner = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["events"])
            .unwrap()
            .with("kind", "login")
            .unwrap();

        let mut query = QueryBuilder::new(ctx())
            .select(&["count(*)"])
            .unwrap()
            .from_query(inner, "logins")
            .unwrap();

        assert_eq!(
            query.sql().unwrap(),
            "SELECT count(*) FROM (SELECT id FROM events WHERE kind=?) logins"
        );
        assert_eq!(query.bind_values().len(), 1);
    }

    #[test]
    fn test_group_by_and_distinct() {
        let mut query = QueryBuilder::new(ctx())
            .distinct()
            .unwrap()
            .select(&["kind"])
            .unwrap()
            .from(&["events"])
            .unwrap()
            .group_by(&["kind"])
            .unwrap();

        assert_eq!(
            query.sql().unwrap(),
            "SELECT DISTINCT kind FROM events GROUP BY kind"
        );
    }

    #[test]
    fn test_page() {
        let mut query = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .page("name", 40, 20)
            .unwrap();

        assert_eq!(
            query.sql().unwrap(),
            "SELECT id FROM people ORDER BY name LIMIT ? OFFSET ?"
        );
        assert_eq!(
            query.bind_values(),
            vec![SqlValue::BigInt(20), SqlValue::BigInt(40)]
        );
    }

    #[test]
    fn test_zero_limit_renders_nothing() {
        let mut query = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .limit(0)
            .unwrap()
            .offset(0)
            .unwrap();

        assert_eq!(query.sql().unwrap(), "SELECT id FROM people");
        assert!(query.bind_values().is_empty());
    }

    #[test]
    fn test_in_org_scoping() {
        let org_ctx = QueryContext::for_org(Dialect::Postgres, OrgId::new(7));
        let mut query = QueryBuilder::new(org_ctx)
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .in_org()
            .unwrap();
        assert_eq!(query.sql().unwrap(), "SELECT id FROM people WHERE org_id=?");
        assert_eq!(query.bind_values(), vec![SqlValue::Int(7)]);

        let mut query = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .in_org()
            .unwrap();
        assert_eq!(query.sql().unwrap(), "SELECT id FROM people");
    }

    #[test]
    fn test_in_org_or_system() {
        let org_ctx = QueryContext::for_org(Dialect::Postgres, OrgId::new(7));
        let mut query = QueryBuilder::new(org_ctx)
            .select(&["id"])
            .unwrap()
            .from(&["settings"])
            .unwrap()
            .in_org_with_system(true)
            .unwrap();
        assert_eq!(
            query.sql().unwrap(),
            "SELECT id FROM settings WHERE (org_id=? OR org_id IS NULL)"
        );
    }

    #[test]
    fn test_search_str_without_parser_fails() {
        let result = QueryBuilder::new(ctx())
            .select(&["id"])
            .unwrap()
            .from(&["people"])
            .unwrap()
            .search_str("name:foo");
        assert!(matches!(
            result,
            Err(crate::error::QueryError::Builder(
                BuilderError::ParserNotConfigured
            ))
        ));
    }
}
