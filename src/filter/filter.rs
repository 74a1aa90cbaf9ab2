use std::cmp::Ordering;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::schema::{EntitySchema, FilterRecord};
use super::types::{FilterOp, FilterOptions, FilterOrderInfo, FilterWhereInfo, ListQuery, SqlResult};

/// Validated, schema-bound query descriptor: predicate, ordering and page window.
/// Renders parameterised SQL or evaluates against in-memory records; it never
/// executes anything itself.
#[derive(Debug, Clone)]
pub struct Filter {
    schema: &'static EntitySchema,
    where_data: Vec<FilterWhereInfo>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
    options: FilterOptions,
}

impl Filter {
    pub fn new(schema: &'static EntitySchema) -> Self {
        Self::with_options(schema, FilterOptions::default())
    }

    pub fn with_options(schema: &'static EntitySchema, options: FilterOptions) -> Self {
        Self {
            schema,
            where_data: vec![],
            order_data: vec![],
            limit: None,
            offset: None,
            options,
        }
    }

    /// Build a filter from raw list parameters. Every validation error is
    /// raised here, before anything touches the store.
    pub fn from_query(schema: &'static EntitySchema, query: &ListQuery) -> Result<Self, FilterError> {
        Self::from_query_with_options(schema, query, FilterOptions::default())
    }

    pub fn from_query_with_options(
        schema: &'static EntitySchema,
        query: &ListQuery,
        options: FilterOptions,
    ) -> Result<Self, FilterError> {
        let mut filter = Self::with_options(schema, options);

        // Mode is checked even when no filter column is given
        let mode = FilterOp::from_mode(query.filtermode.as_deref())?;
        if let Some(column) = non_empty(&query.filterby) {
            let value = query
                .filtervalue
                .as_deref()
                .ok_or_else(|| FilterError::MissingFilterValue(column.to_string()))?;
            filter.where_column(column, mode, value)?;
        }
        if let Some(needle) = non_empty(&query.searchbyindex) {
            filter.search("index", needle)?;
        }
        if let Some(needle) = non_empty(&query.searchbyname) {
            filter.search("name", needle)?;
        }

        filter.order(query.sort.as_deref(), query.order.as_deref())?;
        filter.paginate(query.pagesize.unwrap_or(0), query.pagenum.unwrap_or(1));
        Ok(filter)
    }

    pub fn where_column(&mut self, column: &str, operator: FilterOp, raw: &str) -> Result<&mut Self, FilterError> {
        let def = *self.schema.column(column)?;
        let data = if operator == FilterOp::In {
            let items: Vec<&str> = raw.split(',').collect();
            if items.len() > self.options.max_in_values {
                return Err(FilterError::TooManyValues {
                    column: def.name.to_string(),
                    count: items.len(),
                    max: self.options.max_in_values,
                });
            }
            items
                .into_iter()
                .map(|item| def.column_type.parse_value(def.name, item))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![def.column_type.parse_value(def.name, raw)?]
        };
        self.where_data.push(FilterWhereInfo { column: def.name, operator, data });
        Ok(self)
    }

    /// Literal substring match on a text column, AND-combined with everything else
    pub fn search(&mut self, column: &str, needle: &str) -> Result<&mut Self, FilterError> {
        let def = self.schema.column(column)?;
        self.where_data.push(FilterWhereInfo {
            column: def.name,
            operator: FilterOp::Contains,
            data: vec![needle.into()],
        });
        Ok(self)
    }

    pub fn order(&mut self, sort: Option<&str>, order: Option<&str>) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(self.schema, sort, order)?;
        Ok(self)
    }

    /// Page size <= 0 disables pagination entirely; page numbers below 1 clamp to 1.
    pub fn paginate(&mut self, page_size: i64, page_num: i64) -> &mut Self {
        if page_size <= 0 {
            self.limit = None;
            self.offset = None;
        } else {
            let page_num = page_num.max(1);
            self.limit = Some(page_size);
            self.offset = Some((page_num - 1).saturating_mul(page_size));
        }
        self
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.where_data, 0);
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.schema.table),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        if crate::config::config().filter.debug_logging {
            tracing::debug!(sql = %query, params = params.len(), "filter select");
        }
        SqlResult { query, params }
    }

    pub fn to_where_sql(&self) -> SqlResult {
        let (query, params) = FilterWhere::generate(&self.where_data, 0);
        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let where_result = self.to_where_sql();
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.schema.table)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.schema.table, where_result.query)
        };
        SqlResult { query, params: where_result.params }
    }

    pub fn matches<R: FilterRecord>(&self, record: &R) -> bool {
        FilterWhere::matches(&self.where_data, record)
    }

    pub fn compare<R: FilterRecord>(&self, a: &R, b: &R) -> Ordering {
        FilterOrder::compare(&self.order_data, a, b)
    }

    /// Apply predicate, ordering and page window to an in-memory row set
    pub fn apply<R: FilterRecord + Clone>(&self, rows: &[R]) -> Vec<R> {
        let mut matched: Vec<R> = rows.iter().filter(|r| self.matches(*r)).cloned().collect();
        matched.sort_by(|a, b| self.compare(a, b));
        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let iter = matched.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(limit.max(0) as usize).collect(),
            None => iter.collect(),
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) if o > 0 => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), _) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::schema::ColumnDef;
    use crate::filter::types::{ColumnType, FilterValue};

    static WIDGETS: EntitySchema = EntitySchema {
        table: "widgets",
        primary_key: "id",
        columns: &[
            ColumnDef::new("id", ColumnType::Integer),
            ColumnDef::new("index", ColumnType::Text),
            ColumnDef::new("name", ColumnType::Text),
            ColumnDef::new("update_freq", ColumnType::Integer),
        ],
    };

    fn options() -> FilterOptions {
        FilterOptions { max_in_values: 3 }
    }

    fn build(query: ListQuery) -> Result<Filter, FilterError> {
        Filter::from_query_with_options(&WIDGETS, &query, options())
    }

    #[derive(Clone)]
    struct Widget {
        id: i64,
        index: &'static str,
        name: &'static str,
    }

    impl FilterRecord for Widget {
        fn column_value(&self, column: &str) -> FilterValue {
            match column {
                "id" => FilterValue::Integer(self.id),
                "index" => self.index.into(),
                "name" => self.name.into(),
                _ => FilterValue::Null,
            }
        }
    }

    fn widgets() -> Vec<Widget> {
        vec![
            Widget { id: 1, index: "a", name: "Rain gauge" },
            Widget { id: 2, index: "b", name: "Bus stops" },
            Widget { id: 3, index: "c", name: "Rainfall" },
            Widget { id: 4, index: "d", name: "Parks" },
        ]
    }

    #[test]
    fn empty_query_selects_everything_ordered_by_id() {
        let filter = build(ListQuery::default()).unwrap();
        let sql = filter.to_sql();
        assert_eq!(sql.query, "SELECT * FROM \"widgets\" ORDER BY \"id\" ASC");
        assert!(sql.params.is_empty());
        assert_eq!(filter.to_count_sql().query, "SELECT COUNT(*) AS count FROM \"widgets\"");
    }

    #[test]
    fn combines_filter_and_searches_with_and() {
        let filter = build(ListQuery {
            filterby: Some("update_freq".into()),
            filtermode: Some("gt".into()),
            filtervalue: Some("10".into()),
            searchbyindex: Some("tr".into()),
            searchbyname: Some("Bus".into()),
            sort: Some("name".into()),
            order: Some("DESC".into()),
            pagesize: Some(5),
            pagenum: Some(3),
            ..Default::default()
        })
        .unwrap();

        let sql = filter.to_sql();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"widgets\" WHERE \"update_freq\" > $1 AND \"index\" LIKE $2 ESCAPE '\\' AND \"name\" LIKE $3 ESCAPE '\\' ORDER BY \"name\" COLLATE \"C\" DESC, \"id\" ASC LIMIT 5 OFFSET 10"
        );
        assert_eq!(sql.params[0], FilterValue::Integer(10));
        assert_eq!(
            filter.to_count_sql().query,
            "SELECT COUNT(*) AS count FROM \"widgets\" WHERE \"update_freq\" > $1 AND \"index\" LIKE $2 ESCAPE '\\' AND \"name\" LIKE $3 ESCAPE '\\'"
        );
    }

    #[test]
    fn unknown_filter_mode_is_rejected_not_defaulted() {
        let err = build(ListQuery {
            filterby: Some("index".into()),
            filtermode: Some("xyz".into()),
            filtervalue: Some("a".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, FilterError::InvalidFilterMode("xyz".into()));
    }

    #[test]
    fn unknown_order_token_degrades_to_asc() {
        let filter = build(ListQuery {
            sort: Some("name".into()),
            order: Some("upwards".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(filter.to_sql().query.ends_with("ORDER BY \"name\" COLLATE \"C\" ASC, \"id\" ASC"));
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let err = build(ListQuery {
            filterby: Some("name; DROP TABLE widgets".into()),
            filtervalue: Some("x".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, FilterError::UnknownColumn(_)));

        let err = build(ListQuery { sort: Some("links".into()), ..Default::default() }).unwrap_err();
        assert_eq!(err, FilterError::UnknownColumn("links".into()));
    }

    #[test]
    fn filter_column_requires_value() {
        let err = build(ListQuery { filterby: Some("index".into()), ..Default::default() }).unwrap_err();
        assert_eq!(err, FilterError::MissingFilterValue("index".into()));
    }

    #[test]
    fn in_list_is_capped() {
        let err = build(ListQuery {
            filterby: Some("index".into()),
            filtermode: Some("in".into()),
            filtervalue: Some("a,b,c,d".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, FilterError::TooManyValues { count: 4, max: 3, .. }));
    }

    #[test]
    fn non_positive_page_size_disables_pagination() {
        for size in [0, -1, -50] {
            let filter = build(ListQuery { pagesize: Some(size), pagenum: Some(7), ..Default::default() }).unwrap();
            assert_eq!(filter.limit(), None);
            assert_eq!(filter.offset(), None);
            assert_eq!(filter.apply(&widgets()).len(), 4);
        }
    }

    #[test]
    fn page_number_clamps_to_one() {
        let filter = build(ListQuery { pagesize: Some(2), pagenum: Some(-3), ..Default::default() }).unwrap();
        assert_eq!(filter.offset(), Some(0));
        assert_eq!(filter.to_sql().query, "SELECT * FROM \"widgets\" ORDER BY \"id\" ASC LIMIT 2");
    }

    #[test]
    fn huge_page_number_saturates() {
        let filter = build(ListQuery { pagesize: Some(10), pagenum: Some(i64::MAX), ..Default::default() }).unwrap();
        assert_eq!(filter.offset(), Some(i64::MAX));
    }

    #[test]
    fn applies_in_memory_like_sql() {
        let filter = build(ListQuery {
            searchbyname: Some("Rain".into()),
            sort: Some("name".into()),
            order: Some("desc".into()),
            ..Default::default()
        })
        .unwrap();
        let ids: Vec<i64> = filter.apply(&widgets()).iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![3, 1]);

        let filter = build(ListQuery {
            filterby: Some("index".into()),
            filtermode: Some("in".into()),
            filtervalue: Some("a,c,z".into()),
            ..Default::default()
        })
        .unwrap();
        let ids: Vec<i64> = filter.apply(&widgets()).iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
