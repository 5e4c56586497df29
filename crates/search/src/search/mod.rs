//! Parsed search expressions.
//!
//! A [`Search`] is the immutable result of parsing a user-typed search
//! string: a single compound clause (possibly holding just one leaf) that
//! renders to a parameterized SQL predicate. Builders fold a search in via
//! [`Filterable::search`](crate::builder::Filterable::search).

mod clause;
mod parser;

pub use clause::{BoolOp, CompoundClause, SearchClause, SqlFragment};
pub use parser::{SearchParser, Token};

use tracing::trace;

use crate::context::Dialect;

/// Root of a parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    root: CompoundClause,
}

impl Search {
    /// Wraps a parsed compound clause.
    pub fn new(root: CompoundClause) -> Self {
        Self { root }
    }

    /// A search matching everything (renders no SQL).
    pub fn empty() -> Self {
        Self::new(CompoundClause::new(BoolOp::And))
    }

    /// Builds a search from explicit clauses.
    pub fn from_clauses(op: BoolOp, clauses: Vec<SearchClause>) -> Self {
        Self::new(CompoundClause::with_children(op, clauses))
    }

    /// The root compound clause.
    pub fn root(&self) -> &CompoundClause {
        &self.root
    }

    /// Returns `true` when the search carries no clauses.
    pub fn is_empty(&self) -> bool {
        self.root.is_childless()
    }

    /// Renders the search as a single predicate fragment.
    pub fn render(&self, dialect: Dialect) -> SqlFragment {
        let fragment = self.root.render(dialect);
        trace!(sql = %fragment.sql, "rendered search");
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_renders_nothing() {
        let search = Search::empty();
        assert!(search.is_empty());
        assert!(search.render(Dialect::Postgres).is_empty());
    }

    #[test]
    fn test_from_clauses() {
        let search = Search::from_clauses(
            BoolOp::Or,
            vec![
                SearchClause::text("name", "a").unwrap(),
                SearchClause::text("name", "b").unwrap(),
            ],
        );
        let fragment = search.render(Dialect::Postgres);
        assert_eq!(fragment.sql, "(name ILIKE ? OR name ILIKE ?)");
        assert_eq!(fragment.values.len(), 2);
    }
}
