use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::manager::DatabaseError;
use super::models::{
    ChartConfig, ChartConfigFields, Component, ComponentFields, MapConfig, MapConfigFields, COMPONENT_INDEX_KEY,
};
use super::store::{Store, StoreTx};
use crate::filter::Filter;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    components: BTreeMap<i64, Component>,
    charts: BTreeMap<String, ChartConfig>,
    maps: BTreeMap<i64, MapConfig>,
    last_component_id: i64,
    last_map_id: i64,
}

impl MemoryState {
    fn with_chart(&self, component: &Component) -> Component {
        let mut component = component.clone();
        component.chart_config = self.charts.get(&component.index).cloned();
        component
    }
}

/// Process-local store. Transactions hold the whole state exclusively, so
/// they run one at a time and commit by swapping in their working copy.
/// Text compares by byte order, matching the `COLLATE "C"` used in SQL sorts.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every stored map config
    pub async fn map_config_ids(&self) -> Vec<i64> {
        self.state.lock().await.maps.keys().copied().collect()
    }

    /// Indexes of every stored chart config
    pub async fn chart_config_indexes(&self) -> Vec<String> {
        self.state.lock().await.charts.keys().cloned().collect()
    }

    pub async fn component_count(&self) -> usize {
        self.state.lock().await.components.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, DatabaseError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn count_components(&mut self, filter: &Filter) -> Result<i64, DatabaseError> {
        let count = self.working.components.values().filter(|c| filter.matches(*c)).count();
        Ok(count as i64)
    }

    async fn find_components(&mut self, filter: &Filter) -> Result<Vec<Component>, DatabaseError> {
        let rows: Vec<Component> = self.working.components.values().cloned().collect();
        Ok(filter
            .apply(&rows)
            .iter()
            .map(|c| self.working.with_chart(c))
            .collect())
    }

    async fn find_component(&mut self, id: i64, _lock: bool) -> Result<Option<Component>, DatabaseError> {
        Ok(self.working.components.get(&id).map(|c| self.working.with_chart(c)))
    }

    async fn component_index_exists(&mut self, index: &str) -> Result<bool, DatabaseError> {
        Ok(self.working.components.values().any(|c| c.index == index))
    }

    async fn insert_component(
        &mut self,
        index: &str,
        fields: &ComponentFields,
        map_config_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Component, DatabaseError> {
        if self.working.components.values().any(|c| c.index == index) {
            return Err(DatabaseError::UniqueViolation {
                constraint: COMPONENT_INDEX_KEY.to_string(),
            });
        }
        self.working.last_component_id += 1;
        let component = Component {
            id: self.working.last_component_id,
            index: index.to_string(),
            name: fields.name.clone(),
            history_config: fields.history_config.clone(),
            map_filter: fields.map_filter.clone(),
            time_from: fields.time_from.clone(),
            time_to: fields.time_to.clone(),
            update_freq: fields.update_freq,
            update_freq_unit: fields.update_freq_unit.clone(),
            source: fields.source.clone(),
            short_desc: fields.short_desc.clone(),
            long_desc: fields.long_desc.clone(),
            use_case: fields.use_case.clone(),
            links: fields.links.clone(),
            contributors: fields.contributors.clone(),
            map_config_ids: map_config_ids.to_vec(),
            created_at: now,
            updated_at: now,
            chart_config: None,
        };
        self.working.components.insert(component.id, component.clone());
        Ok(self.working.with_chart(&component))
    }

    async fn update_component(
        &mut self,
        id: i64,
        fields: &ComponentFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Component>, DatabaseError> {
        let Some(component) = self.working.components.get_mut(&id) else {
            return Ok(None);
        };
        component.name = fields.name.clone();
        component.history_config = fields.history_config.clone();
        component.map_filter = fields.map_filter.clone();
        component.time_from = fields.time_from.clone();
        component.time_to = fields.time_to.clone();
        component.update_freq = fields.update_freq;
        component.update_freq_unit = fields.update_freq_unit.clone();
        component.source = fields.source.clone();
        component.short_desc = fields.short_desc.clone();
        component.long_desc = fields.long_desc.clone();
        component.use_case = fields.use_case.clone();
        component.links = fields.links.clone();
        component.contributors = fields.contributors.clone();
        component.updated_at = now;

        let updated = component.clone();
        Ok(Some(self.working.with_chart(&updated)))
    }

    async fn touch_component(&mut self, id: i64, now: DateTime<Utc>) -> Result<(), DatabaseError> {
        if let Some(component) = self.working.components.get_mut(&id) {
            component.updated_at = now;
        }
        Ok(())
    }

    async fn delete_component(&mut self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.working.components.remove(&id).is_some())
    }

    async fn upsert_chart_config(&mut self, index: &str, fields: &ChartConfigFields) -> Result<(), DatabaseError> {
        self.working
            .charts
            .insert(index.to_string(), fields.clone().into_config(index));
        Ok(())
    }

    async fn delete_chart_config(&mut self, index: &str) -> Result<bool, DatabaseError> {
        Ok(self.working.charts.remove(index).is_some())
    }

    async fn lock_map_config(&mut self, id: i64, _exclusive: bool) -> Result<Option<MapConfig>, DatabaseError> {
        Ok(self.working.maps.get(&id).cloned())
    }

    async fn insert_map_config(&mut self, fields: &MapConfigFields) -> Result<MapConfig, DatabaseError> {
        self.working.last_map_id += 1;
        let map = fields.clone().into_config(self.working.last_map_id);
        self.working.maps.insert(map.id, map.clone());
        Ok(map)
    }

    async fn update_map_config(&mut self, id: i64, fields: &MapConfigFields) -> Result<Option<MapConfig>, DatabaseError> {
        let Some(existing) = self.working.maps.get_mut(&id) else {
            return Ok(None);
        };
        *existing = fields.clone().into_config(id);
        Ok(Some(existing.clone()))
    }

    async fn count_map_config_referrers(
        &mut self,
        map_config_id: i64,
        excluding_component_id: i64,
    ) -> Result<i64, DatabaseError> {
        let count = self
            .working
            .components
            .values()
            .filter(|c| c.id != excluding_component_id && c.map_config_ids.contains(&map_config_id))
            .count();
        Ok(count as i64)
    }

    async fn delete_map_config(&mut self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.working.maps.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
