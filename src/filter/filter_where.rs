use std::cmp::Ordering;

use super::schema::FilterRecord;
use super::types::{FilterOp, FilterValue, FilterWhereInfo, TEXT_COLLATION};

pub struct FilterWhere {
    param_values: Vec<FilterValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render AND-joined conditions with positional parameters starting after
    /// `starting_param_index`. Returns an empty clause when there is nothing to filter.
    pub fn generate(conditions: &[FilterWhereInfo], starting_param_index: usize) -> (String, Vec<FilterValue>) {
        let mut filter_where = Self::new(starting_param_index);
        let sql_conditions: Vec<String> = conditions
            .iter()
            .map(|c| filter_where.build_sql_condition(c))
            .collect();
        (sql_conditions.join(" AND "), filter_where.param_values)
    }

    /// Evaluate the same conditions against an in-memory record with SQL
    /// semantics: comparisons against NULL never match.
    pub fn matches<R: FilterRecord>(conditions: &[FilterWhereInfo], record: &R) -> bool {
        conditions.iter().all(|c| Self::condition_matches(c, &record.column_value(c.column)))
    }

    fn condition_matches(condition: &FilterWhereInfo, value: &FilterValue) -> bool {
        let first = condition.data.first();
        match condition.operator {
            FilterOp::Eq => first.and_then(|d| value.sql_cmp(d)) == Some(Ordering::Equal),
            FilterOp::Ne => matches!(first.and_then(|d| value.sql_cmp(d)), Some(o) if o != Ordering::Equal),
            FilterOp::Gt => first.and_then(|d| value.sql_cmp(d)) == Some(Ordering::Greater),
            FilterOp::Lt => first.and_then(|d| value.sql_cmp(d)) == Some(Ordering::Less),
            FilterOp::In => condition
                .data
                .iter()
                .any(|d| value.sql_cmp(d) == Some(Ordering::Equal)),
            FilterOp::Contains => match (value, first) {
                (FilterValue::Text(haystack), Some(FilterValue::Text(needle))) => haystack.contains(needle.as_str()),
                _ => false,
            },
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> String {
        let quoted_column = format!("\"{}\"", condition.column);
        let first = condition.data.first().cloned().unwrap_or(FilterValue::Null);
        let ranged_column = match first {
            FilterValue::Text(_) => format!("{} {}", quoted_column, TEXT_COLLATION),
            _ => quoted_column.clone(),
        };
        match condition.operator {
            FilterOp::Eq => format!("{} = {}", quoted_column, self.param(first)),
            FilterOp::Ne => format!("{} <> {}", quoted_column, self.param(first)),
            FilterOp::Gt => format!("{} > {}", ranged_column, self.param(first)),
            FilterOp::Lt => format!("{} < {}", ranged_column, self.param(first)),
            FilterOp::In => {
                if condition.data.is_empty() {
                    return "1=0".to_string();
                }
                let params: Vec<String> = condition.data.iter().map(|v| self.param(v.clone())).collect();
                format!("{} IN ({})", quoted_column, params.join(", "))
            }
            FilterOp::Contains => {
                let pattern = match first {
                    FilterValue::Text(needle) => format!("%{}%", escape_like(&needle)),
                    _ => "%".to_string(),
                };
                format!("{} LIKE {} ESCAPE '\\'", quoted_column, self.param(FilterValue::Text(pattern)))
            }
        }
    }

    fn param(&mut self, value: FilterValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// Escape LIKE metacharacters so user input is matched literally
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
