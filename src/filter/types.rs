use serde::{Deserialize, Serialize};

use crate::database::value::SqlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,

    Like,
    NLike,
    ILike,
    NILike,

    In,
    NIn,

    Between,
    Null,
}

impl FilterOp {
    pub fn parse(op_key: &str) -> Option<Self> {
        Some(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$nlike" => FilterOp::NLike,
            "$ilike" => FilterOp::ILike,
            "$nilike" => FilterOp::NILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$null" => FilterOp::Null,
            _ => return None,
        })
    }

    pub fn comparison_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "<>",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Like => "LIKE",
            FilterOp::NLike => "NOT LIKE",
            FilterOp::ILike => "ILIKE",
            FilterOp::NILike => "NOT ILIKE",
            FilterOp::In => "IN",
            FilterOp::NIn => "NOT IN",
            FilterOp::Between => "BETWEEN",
            FilterOp::Null => "IS NULL",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    #[serde(rename = "where", alias = "where_clause", default)]
    pub where_clause: Option<serde_json::Value>,
    #[serde(default)]
    pub order: Option<serde_json::Value>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default, rename = "includeDeleted", alias = "include_deleted")]
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterWhereOptions {
    /// Table carries an `is_deleted` flag.
    pub soft_delete: bool,
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlValue>,
}
