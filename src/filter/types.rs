use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::FilterError;

/// Comparison applied by a single WHERE condition.
/// `Contains` is only produced by the substring searches, never by `filtermode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Lt,
    In,
    Contains,
}

impl FilterOp {
    /// Parse a `filtermode` token. Absent or empty means `eq`; anything
    /// outside the enumerated set is rejected.
    pub fn from_mode(token: Option<&str>) -> Result<Self, FilterError> {
        match token {
            None | Some("") | Some("eq") => Ok(FilterOp::Eq),
            Some("ne") => Ok(FilterOp::Ne),
            Some("gt") => Ok(FilterOp::Gt),
            Some("lt") => Ok(FilterOp::Lt),
            Some("in") => Ok(FilterOp::In),
            Some(other) => Err(FilterError::InvalidFilterMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Unlike `FilterOp::from_mode`, unrecognized tokens fall back to ascending.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(t) if t.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Declared type of a filterable column; drives how `filtervalue` is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Timestamp,
}

/// Byte-order collation for text comparisons, so Postgres sorts the way
/// `String::cmp` does in memory.
pub const TEXT_COLLATION: &str = "COLLATE \"C\"";

impl ColumnType {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Text => "text",
            ColumnType::Timestamp => "RFC 3339 timestamp",
        }
    }

    pub fn parse_value(&self, column: &str, raw: &str) -> Result<FilterValue, FilterError> {
        let invalid = || FilterError::InvalidFilterValue {
            column: column.to_string(),
            value: raw.to_string(),
            expected: self.name(),
        };
        match self {
            ColumnType::Integer => raw.trim().parse::<i64>().map(FilterValue::Integer).map_err(|_| invalid()),
            ColumnType::Text => Ok(FilterValue::Text(raw.to_string())),
            ColumnType::Timestamp => DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| FilterValue::Timestamp(dt.with_timezone(&Utc)))
                .map_err(|_| invalid()),
        }
    }
}

/// A typed scalar: either a bound SQL parameter or a column value read from
/// an in-memory record.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl FilterValue {
    /// SQL-style comparison: NULL or mismatched types compare as unknown.
    pub fn sql_cmp(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (FilterValue::Integer(a), FilterValue::Integer(b)) => Some(a.cmp(b)),
            (FilterValue::Text(a), FilterValue::Text(b)) => Some(a.cmp(b)),
            (FilterValue::Timestamp(a), FilterValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total ordering used for sorting. NULLs sort after every value, which
    /// matches Postgres for ascending order (and, reversed, for descending).
    pub fn sort_cmp(&self, other: &FilterValue) -> Ordering {
        match (self, other) {
            (FilterValue::Null, FilterValue::Null) => Ordering::Equal,
            (FilterValue::Null, _) => Ordering::Greater,
            (_, FilterValue::Null) => Ordering::Less,
            _ => self.sql_cmp(other).unwrap_or(Ordering::Equal),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Integer(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<Option<String>> for FilterValue {
    fn from(v: Option<String>) -> Self {
        v.map(FilterValue::Text).unwrap_or(FilterValue::Null)
    }
}

/// Raw list parameters as they arrive from the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub pagesize: Option<i64>,
    pub pagenum: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub filterby: Option<String>,
    pub filtermode: Option<String>,
    pub filtervalue: Option<String>,
    pub searchbyindex: Option<String>,
    pub searchbyname: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: &'static str,
    pub operator: FilterOp,
    pub data: Vec<FilterValue>,
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: &'static str,
    pub column_type: ColumnType,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub max_in_values: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            max_in_values: crate::config::config().filter.max_in_values,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterValue>,
}
