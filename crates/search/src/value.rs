//! Bind values and their normalization.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

/// A value bound to a single `?` placeholder.
///
/// Builders accumulate these in placeholder order; the rendered statement
/// never contains inline literals for user data. Timestamps are carried in
/// UTC; conversion happens in the [`From`] impl so no zoned value can reach
/// the bind list.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// 32-bit integer. A zero here is treated as an unset foreign key and
    /// binds as NULL; see [`SqlValue::normalized`].
    Int(i32),
    /// 64-bit integer.
    BigInt(i64),
    /// Double-precision float.
    Float(f64),
    /// Exact decimal, used for search-string numeric values.
    Numeric(Decimal),
    /// Text.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Point in time, UTC.
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Returns `true` for [`SqlValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Bind-time normalization.
    ///
    /// An `Int` zero is an unset foreign key upstream and binds as NULL.
    /// This applies to `Int` only; `BigInt`, `Float` and `Numeric` zeros
    /// bind as real zeros. Callers filtering on a column where zero is a
    /// legitimate value should widen to `BigInt`.
    pub fn normalized(self) -> SqlValue {
        match self {
            SqlValue::Int(0) => SqlValue::Null,
            other => other,
        }
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::BigInt(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        SqlValue::Numeric(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for SqlValue {
    fn from(value: DateTime<Tz>) -> Self {
        SqlValue::Timestamp(value.with_timezone(&Utc))
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_int_zero_normalizes_to_null() {
        assert_eq!(SqlValue::Int(0).normalized(), SqlValue::Null);
        assert_eq!(SqlValue::Int(7).normalized(), SqlValue::Int(7));
    }

    #[test]
    fn test_bigint_zero_stays_zero() {
        assert_eq!(SqlValue::BigInt(0).normalized(), SqlValue::BigInt(0));
    }

    #[test]
    fn test_zoned_timestamps_convert_to_utc() {
        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2020, 3, 1, 10, 30, 0).unwrap();
        let value = SqlValue::from(local);
        match value {
            SqlValue::Timestamp(utc) => {
                assert_eq!(utc, Utc.with_ymd_and_hms(2020, 3, 1, 5, 30, 0).unwrap());
            }
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_option_none_is_null() {
        let none: Option<i32> = None;
        assert_eq!(SqlValue::from(none), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(3)), SqlValue::Int(3));
    }
}
