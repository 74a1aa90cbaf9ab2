use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::manager::DatabaseError;
use super::models::{ChartConfigFields, Component, ComponentFields, MapConfig, MapConfigFields};
use crate::filter::Filter;

/// Backing store for components and their sub-configurations. All work
/// happens inside a transaction obtained from `begin`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;

    fn backend_name(&self) -> &'static str;
}

/// A unit of work. Dropping it without `commit` discards every change.
#[async_trait]
pub trait StoreTx: Send {
    /// Rows matching the filter predicate, ignoring its page window
    async fn count_components(&mut self, filter: &Filter) -> Result<i64, DatabaseError>;

    /// One page of components with their chart configs attached
    async fn find_components(&mut self, filter: &Filter) -> Result<Vec<Component>, DatabaseError>;

    /// Load a component with its chart config. `lock` takes a row lock held
    /// until the transaction ends.
    async fn find_component(&mut self, id: i64, lock: bool) -> Result<Option<Component>, DatabaseError>;

    async fn component_index_exists(&mut self, index: &str) -> Result<bool, DatabaseError>;

    async fn insert_component(
        &mut self,
        index: &str,
        fields: &ComponentFields,
        map_config_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Component, DatabaseError>;

    async fn update_component(
        &mut self,
        id: i64,
        fields: &ComponentFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Component>, DatabaseError>;

    async fn touch_component(&mut self, id: i64, now: DateTime<Utc>) -> Result<(), DatabaseError>;

    async fn delete_component(&mut self, id: i64) -> Result<bool, DatabaseError>;

    async fn upsert_chart_config(&mut self, index: &str, fields: &ChartConfigFields) -> Result<(), DatabaseError>;

    async fn delete_chart_config(&mut self, index: &str) -> Result<bool, DatabaseError>;

    /// Lock a map config row. `exclusive` serialises deleters; shared locks
    /// only keep the row from vanishing underneath the caller.
    async fn lock_map_config(&mut self, id: i64, exclusive: bool) -> Result<Option<MapConfig>, DatabaseError>;

    async fn insert_map_config(&mut self, fields: &MapConfigFields) -> Result<MapConfig, DatabaseError>;

    async fn update_map_config(&mut self, id: i64, fields: &MapConfigFields) -> Result<Option<MapConfig>, DatabaseError>;

    /// Components other than `excluding_component_id` that reference the map config
    async fn count_map_config_referrers(
        &mut self,
        map_config_id: i64,
        excluding_component_id: i64,
    ) -> Result<i64, DatabaseError>;

    async fn delete_map_config(&mut self, id: i64) -> Result<bool, DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;
}
