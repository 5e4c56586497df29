//! Explicit rendering context: SQL dialect and tenant scope.
//!
//! Every builder takes a [`QueryContext`] at construction. There is no
//! process-wide dialect flag or ambient organization — the request layer
//! resolves the tenant once and passes it down, so statement construction
//! stays pure and testable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// SQL dialect used when rendering clause text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// PostgreSQL: case-insensitive matching via `ILIKE`.
    #[default]
    Postgres,
    /// Generic ANSI SQL: `LIKE` only.
    Ansi,
}

impl Dialect {
    /// The substring-match operator for this dialect.
    pub fn like_operator(self) -> &'static str {
        match self {
            Dialect::Postgres => "ILIKE",
            Dialect::Ansi => "LIKE",
        }
    }
}

/// Identifier of the organization (tenant) owning a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(i32);

impl OrgId {
    /// Creates an organization id.
    pub fn new(id: i32) -> Self {
        OrgId(id)
    }

    /// Returns the raw id.
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tenant scoping applied during statement construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// Single-tenant deployment; org predicates render nothing.
    Disabled,
    /// Scope rows to the given organization.
    Org(OrgId),
}

impl TenantScope {
    /// Returns the active organization id, if tenancy is enabled.
    pub fn org_id(self) -> Option<OrgId> {
        match self {
            TenantScope::Disabled => None,
            TenantScope::Org(id) => Some(id),
        }
    }

    /// Returns `true` when tenancy is enabled.
    pub fn is_enabled(self) -> bool {
        matches!(self, TenantScope::Org(_))
    }
}

/// Per-request context passed to every builder.
///
/// Cheap to copy; built once per request by the caller that resolved the
/// tenant, then handed to each builder and search render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryContext {
    dialect: Dialect,
    tenancy: TenantScope,
}

impl QueryContext {
    /// Creates a context with the given dialect and tenant scope.
    pub fn new(dialect: Dialect, tenancy: TenantScope) -> Self {
        Self { dialect, tenancy }
    }

    /// Context for a single-tenant deployment.
    pub fn single_tenant(dialect: Dialect) -> Self {
        Self::new(dialect, TenantScope::Disabled)
    }

    /// Context scoped to one organization.
    pub fn for_org(dialect: Dialect, org: OrgId) -> Self {
        Self::new(dialect, TenantScope::Org(org))
    }

    /// The active SQL dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The active tenant scope.
    pub fn tenancy(&self) -> TenantScope {
        self.tenancy
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::single_tenant(Dialect::Postgres)
    }
}
