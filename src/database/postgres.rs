use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{debug, warn};

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{ChartConfig, ChartConfigFields, Component, ComponentFields, MapConfig, MapConfigFields};
use super::store::{Store, StoreTx};
use crate::config::config;
use crate::filter::{Filter, FilterValue};

/// Postgres-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn from_manager(manager: &DatabaseManager) -> Self {
        Self::new(manager.pool().clone())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DatabaseError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

const COMPONENT_COLUMNS: &str = "\"id\", \"index\", \"name\", \"history_config\", \"map_filter\", \"time_from\", \"time_to\", \
     \"update_freq\", \"update_freq_unit\", \"source\", \"short_desc\", \"long_desc\", \"use_case\", \
     \"links\", \"contributors\", \"map_config_ids\", \"created_at\", \"updated_at\"";

impl PgTx {
    async fn attach_charts(&mut self, components: &mut [Component]) -> Result<(), DatabaseError> {
        if components.is_empty() {
            return Ok(());
        }
        let indexes: Vec<String> = components.iter().map(|c| c.index.clone()).collect();
        let started = Instant::now();
        let sql = "SELECT \"index\", \"color\", \"types\", \"unit\" FROM \"component_charts\" WHERE \"index\" = ANY($1)";
        let charts: Vec<ChartConfig> = sqlx::query_as(sql).bind(&indexes).fetch_all(&mut *self.tx).await?;
        observe(sql, started);

        let mut by_index: HashMap<String, ChartConfig> =
            charts.into_iter().map(|c| (c.index.clone(), c)).collect();
        for component in components.iter_mut() {
            component.chart_config = by_index.remove(&component.index);
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn count_components(&mut self, filter: &Filter) -> Result<i64, DatabaseError> {
        let sql = filter.to_count_sql();
        let started = Instant::now();
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(&mut *self.tx).await?;
        observe(&sql.query, started);
        Ok(row.try_get("count")?)
    }

    async fn find_components(&mut self, filter: &Filter) -> Result<Vec<Component>, DatabaseError> {
        let sql = filter.to_sql();
        let started = Instant::now();
        let mut q = sqlx::query_as::<_, Component>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let mut rows = q.fetch_all(&mut *self.tx).await?;
        observe(&sql.query, started);
        self.attach_charts(&mut rows).await?;
        Ok(rows)
    }

    async fn find_component(&mut self, id: i64, lock: bool) -> Result<Option<Component>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM \"components\" WHERE \"id\" = $1{}",
            COMPONENT_COLUMNS,
            if lock { " FOR UPDATE" } else { "" }
        );
        let started = Instant::now();
        let row: Option<Component> = sqlx::query_as(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        observe(&sql, started);

        match row {
            Some(component) => {
                let mut rows = [component];
                self.attach_charts(&mut rows).await?;
                let [component] = rows;
                Ok(Some(component))
            }
            None => Ok(None),
        }
    }

    async fn component_index_exists(&mut self, index: &str) -> Result<bool, DatabaseError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM \"components\" WHERE \"index\" = $1) AS found")
            .bind(index)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.try_get("found")?)
    }

    async fn insert_component(
        &mut self,
        index: &str,
        fields: &ComponentFields,
        map_config_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Component, DatabaseError> {
        let sql = format!(
            "INSERT INTO \"components\" (\"index\", \"name\", \"history_config\", \"map_filter\", \"time_from\", \"time_to\", \
             \"update_freq\", \"update_freq_unit\", \"source\", \"short_desc\", \"long_desc\", \"use_case\", \
             \"links\", \"contributors\", \"map_config_ids\", \"created_at\", \"updated_at\") \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16) RETURNING {}",
            COMPONENT_COLUMNS
        );
        let started = Instant::now();
        let component: Component = sqlx::query_as(&sql)
            .bind(index)
            .bind(&fields.name)
            .bind(&fields.history_config)
            .bind(&fields.map_filter)
            .bind(&fields.time_from)
            .bind(&fields.time_to)
            .bind(fields.update_freq)
            .bind(&fields.update_freq_unit)
            .bind(&fields.source)
            .bind(&fields.short_desc)
            .bind(&fields.long_desc)
            .bind(&fields.use_case)
            .bind(&fields.links)
            .bind(&fields.contributors)
            .bind(map_config_ids.to_vec())
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        observe(&sql, started);
        Ok(component)
    }

    async fn update_component(
        &mut self,
        id: i64,
        fields: &ComponentFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Component>, DatabaseError> {
        let sql = format!(
            "UPDATE \"components\" SET \"name\" = $2, \"history_config\" = $3, \"map_filter\" = $4, \"time_from\" = $5, \
             \"time_to\" = $6, \"update_freq\" = $7, \"update_freq_unit\" = $8, \"source\" = $9, \"short_desc\" = $10, \
             \"long_desc\" = $11, \"use_case\" = $12, \"links\" = $13, \"contributors\" = $14, \"updated_at\" = $15 \
             WHERE \"id\" = $1 RETURNING {}",
            COMPONENT_COLUMNS
        );
        let started = Instant::now();
        let row: Option<Component> = sqlx::query_as(&sql)
            .bind(id)
            .bind(&fields.name)
            .bind(&fields.history_config)
            .bind(&fields.map_filter)
            .bind(&fields.time_from)
            .bind(&fields.time_to)
            .bind(fields.update_freq)
            .bind(&fields.update_freq_unit)
            .bind(&fields.source)
            .bind(&fields.short_desc)
            .bind(&fields.long_desc)
            .bind(&fields.use_case)
            .bind(&fields.links)
            .bind(&fields.contributors)
            .bind(now)
            .fetch_optional(&mut *self.tx)
            .await?;
        observe(&sql, started);

        match row {
            Some(component) => {
                let mut rows = [component];
                self.attach_charts(&mut rows).await?;
                let [component] = rows;
                Ok(Some(component))
            }
            None => Ok(None),
        }
    }

    async fn touch_component(&mut self, id: i64, now: DateTime<Utc>) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE \"components\" SET \"updated_at\" = $2 WHERE \"id\" = $1")
            .bind(id)
            .bind(now)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_component(&mut self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM \"components\" WHERE \"id\" = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_chart_config(&mut self, index: &str, fields: &ChartConfigFields) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO \"component_charts\" (\"index\", \"color\", \"types\", \"unit\") VALUES ($1, $2, $3, $4) \
             ON CONFLICT (\"index\") DO UPDATE SET \"color\" = EXCLUDED.\"color\", \"types\" = EXCLUDED.\"types\", \
             \"unit\" = EXCLUDED.\"unit\"",
        )
        .bind(index)
        .bind(&fields.color)
        .bind(&fields.types)
        .bind(&fields.unit)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_chart_config(&mut self, index: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM \"component_charts\" WHERE \"index\" = $1")
            .bind(index)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn lock_map_config(&mut self, id: i64, exclusive: bool) -> Result<Option<MapConfig>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM \"component_maps\" WHERE \"id\" = $1 {}",
            if exclusive { "FOR UPDATE" } else { "FOR SHARE" }
        );
        let started = Instant::now();
        let row = sqlx::query_as::<_, MapConfig>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        observe(&sql, started);
        Ok(row)
    }

    async fn insert_map_config(&mut self, fields: &MapConfigFields) -> Result<MapConfig, DatabaseError> {
        let row = sqlx::query_as::<_, MapConfig>(
            "INSERT INTO \"component_maps\" (\"index\", \"title\", \"type\", \"source\", \"size\", \"icon\", \"paint\", \"property\") \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(&fields.index)
        .bind(&fields.title)
        .bind(&fields.map_type)
        .bind(&fields.source)
        .bind(&fields.size)
        .bind(&fields.icon)
        .bind(&fields.paint)
        .bind(&fields.property)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_map_config(&mut self, id: i64, fields: &MapConfigFields) -> Result<Option<MapConfig>, DatabaseError> {
        let row = sqlx::query_as::<_, MapConfig>(
            "UPDATE \"component_maps\" SET \"index\" = $2, \"title\" = $3, \"type\" = $4, \"source\" = $5, \"size\" = $6, \
             \"icon\" = $7, \"paint\" = $8, \"property\" = $9 WHERE \"id\" = $1 RETURNING *",
        )
        .bind(id)
        .bind(&fields.index)
        .bind(&fields.title)
        .bind(&fields.map_type)
        .bind(&fields.source)
        .bind(&fields.size)
        .bind(&fields.icon)
        .bind(&fields.paint)
        .bind(&fields.property)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn count_map_config_referrers(
        &mut self,
        map_config_id: i64,
        excluding_component_id: i64,
    ) -> Result<i64, DatabaseError> {
        let sql = "SELECT COUNT(*) AS count FROM \"components\" \
                   WHERE \"map_config_ids\" @> ARRAY[$1]::BIGINT[] AND \"id\" <> $2";
        let started = Instant::now();
        let row = sqlx::query(sql)
            .bind(map_config_id)
            .bind(excluding_component_id)
            .fetch_one(&mut *self.tx)
            .await?;
        observe(sql, started);
        Ok(row.try_get("count")?)
    }

    async fn delete_map_config(&mut self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM \"component_maps\" WHERE \"id\" = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Query logging and slow-query warnings, per database config
fn observe(sql: &str, started: Instant) {
    let db = &config().database;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if db.enable_query_logging {
        debug!(sql, elapsed_ms, "query");
    }
    if db.enable_slow_query_warning && elapsed_ms >= db.slow_query_threshold_ms {
        warn!(sql, elapsed_ms, "slow query");
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &FilterValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        FilterValue::Null => q.bind(Option::<String>::None),
        FilterValue::Integer(i) => q.bind(*i),
        FilterValue::Text(s) => q.bind(s.clone()),
        FilterValue::Timestamp(t) => q.bind(*t),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    v: &FilterValue,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        FilterValue::Null => q.bind(Option::<String>::None),
        FilterValue::Integer(i) => q.bind(*i),
        FilterValue::Text(s) => q.bind(s.clone()),
        FilterValue::Timestamp(t) => q.bind(*t),
    }
}
