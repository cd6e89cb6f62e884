use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::Postgres;
use std::str::FromStr;
use uuid::Uuid;

/// Storage type of a column, used to coerce client JSON before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Uuid,
    Text,
    Int,
    Decimal,
    Bool,
    Date,
    Timestamp,
    /// Postgres enum type name and its allowed labels.
    Enum(&'static str, &'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

pub const fn col(name: &'static str, kind: ColumnKind) -> ColumnDef {
    ColumnDef { name, kind }
}

/// A typed bind parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null(ColumnKind),
    Uuid(Uuid),
    Text(String),
    Int(i32),
    /// Paging values; no column is declared with this kind
    BigInt(i64),
    Decimal(Decimal),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Enum { type_name: &'static str, value: String },
}

impl SqlValue {
    /// Placeholder text for parameter `index`, with a cast for enum columns.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            SqlValue::Enum { type_name, .. } | SqlValue::Null(ColumnKind::Enum(type_name, _)) => {
                format!("${}::{}", index, type_name)
            }
            _ => format!("${}", index),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        SqlValue::Text(value.into())
    }

    pub fn opt_text(value: Option<impl Into<String>>) -> Self {
        value.map(|v| SqlValue::Text(v.into())).unwrap_or(SqlValue::Null(ColumnKind::Text))
    }

    pub fn opt_uuid(value: Option<Uuid>) -> Self {
        value.map(SqlValue::Uuid).unwrap_or(SqlValue::Null(ColumnKind::Uuid))
    }

    pub fn opt_int(value: Option<i32>) -> Self {
        value.map(SqlValue::Int).unwrap_or(SqlValue::Null(ColumnKind::Int))
    }

    pub fn opt_decimal(value: Option<Decimal>) -> Self {
        value.map(SqlValue::Decimal).unwrap_or(SqlValue::Null(ColumnKind::Decimal))
    }

    pub fn opt_date(value: Option<NaiveDate>) -> Self {
        value.map(SqlValue::Date).unwrap_or(SqlValue::Null(ColumnKind::Date))
    }

    /// Convert a JSON value into a bind parameter for a column of `kind`.
    pub fn coerce(kind: ColumnKind, value: &Value) -> Result<SqlValue, String> {
        if value.is_null() {
            return Ok(SqlValue::Null(kind));
        }
        match kind {
            ColumnKind::Uuid => value
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(SqlValue::Uuid)
                .ok_or_else(|| format!("expected a UUID, got {}", value)),
            ColumnKind::Text => match value {
                Value::String(s) => Ok(SqlValue::Text(s.clone())),
                Value::Number(n) => Ok(SqlValue::Text(n.to_string())),
                Value::Bool(b) => Ok(SqlValue::Text(b.to_string())),
                _ => Err(format!("expected a string, got {}", value)),
            },
            ColumnKind::Int => {
                let parsed = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                parsed
                    .and_then(|n| i32::try_from(n).ok())
                    .map(SqlValue::Int)
                    .ok_or_else(|| format!("expected an integer, got {}", value))
            }
            ColumnKind::Decimal => {
                let text = match value {
                    Value::Number(n) => n.to_string(),
                    Value::String(s) => s.trim().to_string(),
                    _ => return Err(format!("expected a number, got {}", value)),
                };
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(SqlValue::Decimal)
                    .map_err(|_| format!("expected a number, got {}", value))
            }
            ColumnKind::Bool => match value {
                Value::Bool(b) => Ok(SqlValue::Bool(*b)),
                Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(SqlValue::Bool(true)),
                Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(SqlValue::Bool(false)),
                _ => Err(format!("expected a boolean, got {}", value)),
            },
            ColumnKind::Date => value
                .as_str()
                .and_then(parse_date)
                .map(SqlValue::Date)
                .ok_or_else(|| format!("expected a date (YYYY-MM-DD), got {}", value)),
            ColumnKind::Timestamp => value
                .as_str()
                .and_then(parse_timestamp)
                .map(SqlValue::Timestamp)
                .ok_or_else(|| format!("expected an RFC 3339 timestamp, got {}", value)),
            ColumnKind::Enum(type_name, labels) => {
                let label = value.as_str().ok_or_else(|| format!("expected one of {}", labels.join(", ")))?;
                if labels.contains(&label) {
                    Ok(SqlValue::Enum { type_name, value: label.to_string() })
                } else {
                    Err(format!("expected one of {}, got {}", labels.join(", "), label))
                }
            }
        }
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

macro_rules! bind_sql_value {
    ($q:expr, $value:expr) => {
        match $value {
            SqlValue::Null(kind) => match kind {
                ColumnKind::Uuid => $q.bind(None::<Uuid>),
                ColumnKind::Int => $q.bind(None::<i32>),
                ColumnKind::Decimal => $q.bind(None::<Decimal>),
                ColumnKind::Bool => $q.bind(None::<bool>),
                ColumnKind::Date => $q.bind(None::<NaiveDate>),
                ColumnKind::Timestamp => $q.bind(None::<DateTime<Utc>>),
                ColumnKind::Text | ColumnKind::Enum(..) => $q.bind(None::<String>),
            },
            SqlValue::Uuid(v) => $q.bind(v),
            SqlValue::Text(v) => $q.bind(v),
            SqlValue::Int(v) => $q.bind(v),
            SqlValue::BigInt(v) => $q.bind(v),
            SqlValue::Decimal(v) => $q.bind(v),
            SqlValue::Bool(v) => $q.bind(v),
            SqlValue::Date(v) => $q.bind(v),
            SqlValue::Timestamp(v) => $q.bind(v),
            SqlValue::Enum { value, .. } => $q.bind(value),
        }
    };
}

pub fn bind_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    params: Vec<SqlValue>,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    params.into_iter().fold(q, |q, value| bind_sql_value!(q, value))
}

pub fn bind_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    params: Vec<SqlValue>,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments> {
    params.into_iter().fold(q, |q, value| bind_sql_value!(q, value))
}

pub fn bind_query_scalar<'q, O>(
    q: sqlx::query::QueryScalar<'q, Postgres, O, PgArguments>,
    params: Vec<SqlValue>,
) -> sqlx::query::QueryScalar<'q, Postgres, O, PgArguments> {
    params.into_iter().fold(q, |q, value| bind_sql_value!(q, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EXAM_TYPE: ColumnKind = ColumnKind::Enum("exam_type", &["MIDTERM", "REMEDIAL", "FINAL"]);

    #[test]
    fn enum_placeholders_carry_a_cast() {
        let v = SqlValue::coerce(EXAM_TYPE, &json!("FINAL")).unwrap();
        assert_eq!(v.placeholder(3), "$3::exam_type");
        assert_eq!(SqlValue::Null(EXAM_TYPE).placeholder(1), "$1::exam_type");
        assert_eq!(SqlValue::Int(4).placeholder(2), "$2");
    }

    #[test]
    fn coerce_rejects_unknown_enum_labels() {
        let err = SqlValue::coerce(EXAM_TYPE, &json!("QUIZ")).unwrap_err();
        assert!(err.contains("MIDTERM"));
    }

    #[test]
    fn coerce_parses_scalars() {
        let id = Uuid::new_v4();
        assert_eq!(SqlValue::coerce(ColumnKind::Uuid, &json!(id.to_string())).unwrap(), SqlValue::Uuid(id));
        assert_eq!(SqlValue::coerce(ColumnKind::Int, &json!("5")).unwrap(), SqlValue::Int(5));
        assert_eq!(SqlValue::coerce(ColumnKind::Bool, &json!("TRUE")).unwrap(), SqlValue::Bool(true));
        assert_eq!(
            SqlValue::coerce(ColumnKind::Decimal, &json!(8.75)).unwrap(),
            SqlValue::Decimal(Decimal::new(875, 2))
        );
        assert_eq!(
            SqlValue::coerce(ColumnKind::Date, &json!("2025-07-01")).unwrap(),
            SqlValue::Date(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
        );
        assert!(SqlValue::coerce(ColumnKind::Uuid, &json!("not-a-uuid")).is_err());
        assert!(SqlValue::coerce(ColumnKind::Int, &json!(1.5)).is_err());
    }

    #[test]
    fn null_keeps_the_column_kind() {
        assert_eq!(SqlValue::coerce(ColumnKind::Date, &Value::Null).unwrap(), SqlValue::Null(ColumnKind::Date));
    }
}
