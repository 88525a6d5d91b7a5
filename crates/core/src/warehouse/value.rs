//! Typed cell values bound into warehouse inserts

use chrono::{NaiveDate, NaiveDateTime};
use duckdb::types::{ToSqlOutput, Value, ValueRef};

use crate::inference::{SemanticType, parse_integral, parse_number, parse_permissive};

/// A single cell converted to its column's type
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Boolean(bool),
}

impl SqlValue {
    /// Convert text to the column's type; anything that does not fit is `Null`
    pub fn from_text(value: Option<&str>, ty: SemanticType) -> Self {
        let Some(value) = value else {
            return SqlValue::Null;
        };
        match ty {
            SemanticType::Integer => parse_integral(value)
                .and_then(|n| i32::try_from(n).ok())
                .map_or(SqlValue::Null, |n| SqlValue::Integer(n as i64)),
            SemanticType::BigInt => parse_integral(value)
                .and_then(|n| i64::try_from(n).ok())
                .map_or(SqlValue::Null, SqlValue::Integer),
            SemanticType::Decimal => parse_number(value)
                .filter(|n| n.is_finite())
                .map_or(SqlValue::Null, SqlValue::Float),
            SemanticType::Date => {
                parse_permissive(value).map_or(SqlValue::Null, |dt| SqlValue::Date(dt.date()))
            }
            SemanticType::DateTime => parse_permissive(value).map_or(SqlValue::Null, SqlValue::DateTime),
            SemanticType::Boolean => parse_bool(value).map_or(SqlValue::Null, SqlValue::Boolean),
            SemanticType::String(_) => SqlValue::Text(value.to_string()),
        }
    }

    /// Force a value to a whole number, truncating any fraction
    pub fn coerce_integer(value: Option<&str>) -> Self {
        value
            .and_then(parse_number)
            .filter(|n| n.is_finite() && *n >= i64::MIN as f64 && *n <= i64::MAX as f64)
            .map_or(SqlValue::Null, |n| SqlValue::Integer(n.trunc() as i64))
    }

    /// Whether the value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

impl duckdb::ToSql for SqlValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        match self {
            SqlValue::Null => Ok(ToSqlOutput::Owned(Value::Null)),
            SqlValue::Integer(n) => Ok(ToSqlOutput::Owned(Value::BigInt(*n))),
            SqlValue::Float(n) => Ok(ToSqlOutput::Owned(Value::Double(*n))),
            SqlValue::Text(s) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
            SqlValue::Date(d) => d.to_sql(),
            SqlValue::DateTime(dt) => dt.to_sql(),
            SqlValue::Boolean(b) => Ok(ToSqlOutput::Owned(Value::Boolean(*b))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_conversion() {
        assert_eq!(
            SqlValue::from_text(Some("42"), SemanticType::Integer),
            SqlValue::Integer(42)
        );
        assert_eq!(
            SqlValue::from_text(Some("3.0"), SemanticType::Integer),
            SqlValue::Integer(3)
        );
        assert_eq!(
            SqlValue::from_text(Some("abc"), SemanticType::Integer),
            SqlValue::Null
        );
        assert_eq!(
            SqlValue::from_text(Some("9999999999"), SemanticType::Integer),
            SqlValue::Null
        );
        assert_eq!(
            SqlValue::from_text(Some("9999999999"), SemanticType::BigInt),
            SqlValue::Integer(9_999_999_999)
        );
    }

    #[test]
    fn test_coerce_integer_truncates() {
        assert_eq!(SqlValue::coerce_integer(Some("7.9")), SqlValue::Integer(7));
        assert_eq!(SqlValue::coerce_integer(Some("-2.5")), SqlValue::Integer(-2));
        assert_eq!(SqlValue::coerce_integer(Some("x")), SqlValue::Null);
        assert_eq!(SqlValue::coerce_integer(None), SqlValue::Null);
    }

    #[test]
    fn test_temporal_conversion() {
        assert_eq!(
            SqlValue::from_text(Some("2024-01-31"), SemanticType::Date),
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).expect("date"))
        );
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .expect("timestamp");
        assert_eq!(
            SqlValue::from_text(Some("2024-01-01 10:00:00"), SemanticType::DateTime),
            SqlValue::DateTime(expected)
        );
        assert!(SqlValue::from_text(Some("someday"), SemanticType::Date).is_null());
    }

    #[test]
    fn test_boolean_and_text() {
        assert_eq!(
            SqlValue::from_text(Some("Yes"), SemanticType::Boolean),
            SqlValue::Boolean(true)
        );
        assert!(SqlValue::from_text(Some("maybe"), SemanticType::Boolean).is_null());
        assert_eq!(
            SqlValue::from_text(Some("abc"), SemanticType::TEXT),
            SqlValue::Text("abc".to_string())
        );
        assert!(SqlValue::from_text(None, SemanticType::TEXT).is_null());
    }
}
