//! PostgreSQL statement hand-off.
//!
//! Builders render `?` placeholders; PostgreSQL wants `$N`. This module
//! rewrites placeholders and exposes [`SqlValue`] lists as
//! `tokio_postgres` query arguments:
//!
//! ```ignore
//! let sql = postgres::numbered(&query.sql()?);
//! let values = query.bind_values();
//! let rows = client.query(&sql, &postgres::args(&values)).await?;
//! ```

use bytes::BytesMut;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

use crate::value::SqlValue;

/// Rewrites `?` placeholders as `$1..$n`.
///
/// Question marks inside single-quoted SQL literals are left alone.
pub fn numbered(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    let mut in_literal = false;
    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            _ => out.push(c),
        }
    }
    out
}

/// Borrows bind values as `tokio_postgres` query arguments.
pub fn args(values: &[SqlValue]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(v) => v.to_sql(ty, out),
            SqlValue::Int(v) => v.to_sql(ty, out),
            SqlValue::BigInt(v) => v.to_sql(ty, out),
            SqlValue::Float(v) => v.to_sql(ty, out),
            SqlValue::Numeric(v) => v.to_sql(ty, out),
            SqlValue::Text(v) => v.to_sql(ty, out),
            SqlValue::Date(v) => v.to_sql(ty, out),
            SqlValue::Timestamp(v) => v.to_sql(ty, out),
        }
    }

    // The concrete variant is only known at bind time; column-type
    // checking is left to the server.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_rewrites_in_order() {
        assert_eq!(
            numbered("SELECT id FROM people WHERE a=? AND b=? LIMIT ?"),
            "SELECT id FROM people WHERE a=$1 AND b=$2 LIMIT $3"
        );
    }

    #[test]
    fn test_numbered_skips_quoted_literals() {
        assert_eq!(
            numbered("SELECT * FROM t WHERE a = 'what?' AND b=?"),
            "SELECT * FROM t WHERE a = 'what?' AND b=$1"
        );
    }

    #[test]
    fn test_numbered_no_placeholders() {
        assert_eq!(numbered("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_args_borrows_every_value() {
        let values = vec![SqlValue::Int(1), SqlValue::Text("x".to_string())];
        assert_eq!(args(&values).len(), 2);
    }
}
