//! Steward search-query DSL and SQL statement builders.
//!
//! This crate turns a human-typed search string into a typed boolean
//! clause tree, and renders parameterized SQL statements — select, insert,
//! update, delete, plus batched variants — with an ordered bind list. The
//! rendered SQL carries only `?` placeholders; user data never appears
//! inline. Execution belongs to the caller: a persistence layer prepares
//! the statement, binds the values in order, and runs it.
//!
//! # Search grammar
//!
//! ```text
//! name:foo male:true date:[1990-01-01 TO 2000-01-01]
//! (name:foo OR nickname:foo) status:ACTIVE keywords:red|green
//! ```
//!
//! Terms are `field:value` pairs; a bare value searches the entity's
//! default field. Adjacent terms AND together, `AND` binds tighter than
//! `OR`, parentheses group, quotes protect spaces, and `[lo TO hi]` is an
//! inclusive range with `*` for an open bound. Field types come from an
//! explicit per-entity schema, with optional per-field transformations
//! (column renames, type overrides, value parsing, custom SQL).
//!
//! # Quick start
//!
//! ```
//! use steward_search::builder::{Filterable, QueryBuilder};
//! use steward_search::context::{Dialect, QueryContext};
//! use steward_search::schema::{EntitySchema, FieldType};
//! use steward_search::search::SearchParser;
//!
//! let schema = EntitySchema::new("person", "name")
//!     .with_field("name", FieldType::Text)
//!     .with_field("male", FieldType::Boolean);
//! let parser = SearchParser::new(schema);
//! let search = parser.parse("name:foo male:true").unwrap();
//!
//! let ctx = QueryContext::single_tenant(Dialect::Postgres);
//! let mut query = QueryBuilder::new(ctx)
//!     .select(&["id", "name"]).unwrap()
//!     .from(&["people"]).unwrap()
//!     .search(&search).unwrap()
//!     .sort("name").unwrap()
//!     .limit(10).unwrap()
//!     .offset(20).unwrap();
//!
//! assert_eq!(
//!     query.sql().unwrap(),
//!     "SELECT id, name FROM people WHERE (name ILIKE ? AND male = ?) \
//!      ORDER BY name LIMIT ? OFFSET ?"
//! );
//! assert_eq!(query.bind_values().len(), 4);
//! ```
//!
//! # Multi-tenancy
//!
//! Builders take an explicit [`QueryContext`](context::QueryContext)
//! carrying the SQL dialect and the tenant scope resolved by the request
//! layer. `in_org()` injects an organization predicate when tenancy is
//! enabled and renders nothing otherwise; there is no ambient tenant
//! state.
//!
//! # Builders are single-use state machines
//!
//! Each builder enforces its construction order — a `select` after a
//! `where` is a typed error, and `sql()` renders exactly once. Bind
//! values accumulate in placeholder order, including values carried by
//! embedded sub-selects, which flatten recursively at bind time.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod builder;
pub mod context;
pub mod error;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod schema;
pub mod search;
pub mod transform;
pub mod value;

pub use builder::{
    BatchDeleteBuilder, BatchInsertBuilder, BatchUpdateBuilder, DeleteBuilder, FilterSet,
    Filterable, InsertBuilder, Param, QueryBuilder, UpdateBuilder,
};
pub use context::{Dialect, OrgId, QueryContext, TenantScope};
pub use error::{BuilderError, ClauseError, ParseError, QueryError, QueryResult, SchemaError};
pub use schema::{EntitySchema, FieldType};
pub use search::{BoolOp, CompoundClause, Search, SearchClause, SearchParser, SqlFragment, Token};
pub use transform::{FieldTransformer, Transformation};
pub use value::SqlValue;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
