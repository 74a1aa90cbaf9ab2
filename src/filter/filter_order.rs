use std::cmp::Ordering;

use super::error::FilterError;
use super::schema::{EntitySchema, FilterRecord};
use super::types::{ColumnType, FilterOrderInfo, SortDirection, TEXT_COLLATION};

pub struct FilterOrder;

impl FilterOrder {
    /// Resolve `sort`/`order` parameters. The column must be on the allow-list;
    /// the direction token is lenient. The primary key is always appended as
    /// a tie-breaker so pagination is deterministic.
    pub fn validate_and_parse(
        schema: &EntitySchema,
        sort: Option<&str>,
        order: Option<&str>,
    ) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        if let Some(column) = sort.filter(|s| !s.is_empty()) {
            let def = schema.column(column)?;
            out.push(FilterOrderInfo {
                column: def.name,
                column_type: def.column_type,
                sort: SortDirection::from_token(order),
            });
        }
        if !out.iter().any(|o| o.column == schema.primary_key) {
            let column_type = schema
                .column(schema.primary_key)
                .map(|def| def.column_type)
                .unwrap_or(ColumnType::Integer);
            out.push(FilterOrderInfo {
                column: schema.primary_key,
                column_type,
                sort: SortDirection::Asc,
            });
        }
        Ok(out)
    }

    /// Text columns sort with byte-order collation.
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| match i.column_type {
                ColumnType::Text => format!("\"{}\" {} {}", i.column, TEXT_COLLATION, i.sort.to_sql()),
                _ => format!("\"{}\" {}", i.column, i.sort.to_sql()),
            })
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    pub fn compare<R: FilterRecord>(infos: &[FilterOrderInfo], a: &R, b: &R) -> Ordering {
        for info in infos {
            let ord = a.column_value(info.column).sort_cmp(&b.column_value(info.column));
            let ord = match info.sort {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}
