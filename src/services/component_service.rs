use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use super::reference_resolver::resolve_and_maybe_delete;
use crate::database::models::{
    ChartConfig, ChartConfigFields, Component, ComponentFields, MapConfig, MapConfigFields, NewComponent, COMPONENTS,
    COMPONENT_INDEX_KEY,
};
use crate::database::{DatabaseError, Store};
use crate::events::{ComponentEvent, EventBus, LifecycleEvent};
use crate::filter::{Filter, FilterError, ListQuery};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Component index '{0}' already exists")]
    DuplicateIndex(String),

    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl From<FilterError> for ServiceError {
    fn from(error: FilterError) -> Self {
        ServiceError::Validation(ValidationError::Filter(error))
    }
}

impl ServiceError {
    fn component_not_found(id: i64) -> Self {
        ServiceError::NotFound(format!("Component {} not found", id))
    }

    fn map_config_not_found(id: i64) -> Self {
        ServiceError::NotFound(format!("Map config {} not found", id))
    }
}

/// One page of a component listing
#[derive(Debug, Clone, Serialize)]
pub struct ListPage {
    pub rows: Vec<Component>,
    /// All components, ignoring filters
    pub total: i64,
    /// Components satisfying the predicate, before pagination
    pub matched: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub chart_deleted: bool,
    pub map_deleted: bool,
}

/// Query and lifecycle operations over components. Every operation runs in
/// a single store transaction; lifecycle events are published only after a
/// successful commit.
pub struct ComponentService {
    store: Arc<dyn Store>,
    events: EventBus,
}

impl ComponentService {
    pub fn new(store: Arc<dyn Store>, events: EventBus) -> Self {
        Self { store, events }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListPage, ServiceError> {
        let filter = Filter::from_query(&COMPONENTS, query)?;
        let everything = Filter::new(&COMPONENTS);

        let mut tx = self.store.begin().await?;
        let total = tx.count_components(&everything).await?;
        let matched = tx.count_components(&filter).await?;
        let rows = tx.find_components(&filter).await?;
        tx.commit().await?;

        Ok(ListPage { rows, total, matched })
    }

    pub async fn get(&self, id: i64) -> Result<Component, ServiceError> {
        let mut tx = self.store.begin().await?;
        let component = tx
            .find_component(id, false)
            .await?
            .ok_or_else(|| ServiceError::component_not_found(id))?;
        tx.commit().await?;
        Ok(component)
    }

    pub async fn create(&self, new: NewComponent) -> Result<Component, ServiceError> {
        if new.index.trim().is_empty() {
            return Err(ValidationError::EmptyField("index").into());
        }
        validate_fields(&new.fields)?;

        let mut tx = self.store.begin().await?;
        if tx.component_index_exists(&new.index).await? {
            return Err(ValidationError::DuplicateIndex(new.index).into());
        }

        let mut referenced = new.map_config_ids.clone();
        referenced.sort_unstable();
        referenced.dedup();
        for &map_id in &referenced {
            // Shared lock keeps a concurrent delete from removing it before we commit
            if tx.lock_map_config(map_id, false).await?.is_none() {
                return Err(ServiceError::map_config_not_found(map_id));
            }
        }

        let mut map_config_ids = new.map_config_ids.clone();
        for fields in &new.map_configs {
            let map = tx.insert_map_config(fields).await?;
            map_config_ids.push(map.id);
        }

        // A concurrent create can still win between the check above and this insert
        let inserted = tx
            .insert_component(&new.index, &new.fields, &map_config_ids, Utc::now())
            .await
            .map_err(|e| duplicate_index_or_storage(e, &new.index))?;
        if let Some(chart) = &new.chart_config {
            tx.upsert_chart_config(&inserted.index, chart).await?;
        }
        let component = tx
            .find_component(inserted.id, false)
            .await?
            .ok_or_else(|| ServiceError::component_not_found(inserted.id))?;
        tx.commit().await?;

        tracing::info!("Created component {} ({})", component.id, component.index);
        self.events.publish(LifecycleEvent::new(ComponentEvent::Created {
            id: component.id,
            index: component.index.clone(),
        }));
        Ok(component)
    }

    /// Replace every mutable metadata field. Never creates a row.
    pub async fn update(&self, id: i64, fields: ComponentFields) -> Result<Component, ServiceError> {
        validate_fields(&fields)?;

        let mut tx = self.store.begin().await?;
        let component = tx
            .update_component(id, &fields, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::component_not_found(id))?;
        tx.commit().await?;

        self.events.publish(LifecycleEvent::new(ComponentEvent::Updated { id }));
        Ok(component)
    }

    /// Upsert the chart owned by a component, keyed by the component's index
    pub async fn update_chart_config(
        &self,
        component_id: i64,
        fields: ChartConfigFields,
    ) -> Result<ChartConfig, ServiceError> {
        let mut tx = self.store.begin().await?;
        let component = tx
            .find_component(component_id, true)
            .await?
            .ok_or_else(|| ServiceError::component_not_found(component_id))?;

        tx.upsert_chart_config(&component.index, &fields).await?;
        tx.touch_component(component_id, Utc::now()).await?;
        tx.commit().await?;

        self.events.publish(LifecycleEvent::new(ComponentEvent::ChartUpdated {
            id: component_id,
            index: component.index.clone(),
        }));
        Ok(fields.into_config(&component.index))
    }

    /// Mutate a shared map config in place; every referrer sees the change
    pub async fn update_map_config(&self, map_config_id: i64, fields: MapConfigFields) -> Result<MapConfig, ServiceError> {
        let mut tx = self.store.begin().await?;
        let map = tx
            .update_map_config(map_config_id, &fields)
            .await?
            .ok_or_else(|| ServiceError::map_config_not_found(map_config_id))?;
        tx.commit().await?;

        self.events
            .publish(LifecycleEvent::new(ComponentEvent::MapConfigUpdated { map_config_id }));
        Ok(map)
    }

    /// Delete a component, its chart, and any map config it was the last
    /// referrer of.
    pub async fn delete(&self, id: i64) -> Result<DeleteOutcome, ServiceError> {
        let mut tx = self.store.begin().await?;
        let component = tx
            .find_component(id, true)
            .await?
            .ok_or_else(|| ServiceError::component_not_found(id))?;

        let chart_deleted = tx.delete_chart_config(&component.index).await?;

        let mut deleted_map_config_ids = Vec::new();
        for map_id in component.distinct_map_config_ids() {
            if resolve_and_maybe_delete(tx.as_mut(), map_id, id).await? {
                deleted_map_config_ids.push(map_id);
            }
        }

        tx.delete_component(id).await?;
        tx.commit().await?;

        let outcome = DeleteOutcome {
            chart_deleted,
            map_deleted: !deleted_map_config_ids.is_empty(),
        };
        tracing::info!(
            "Deleted component {} (chart_deleted={}, map configs removed={:?})",
            id,
            outcome.chart_deleted,
            deleted_map_config_ids
        );
        self.events.publish(LifecycleEvent::new(ComponentEvent::Deleted {
            id,
            index: component.index,
            chart_deleted,
            deleted_map_config_ids,
        }));
        Ok(outcome)
    }
}

fn validate_fields(fields: &ComponentFields) -> Result<(), ValidationError> {
    if fields.name.trim().is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }
    Ok(())
}

fn duplicate_index_or_storage(err: DatabaseError, index: &str) -> ServiceError {
    if err.is_unique_violation(COMPONENT_INDEX_KEY) {
        ValidationError::DuplicateIndex(index.to_string()).into()
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn service() -> ComponentService {
        ComponentService::new(Arc::new(MemoryStore::new()), EventBus::new())
    }

    fn new_component(index: &str) -> NewComponent {
        NewComponent {
            index: index.to_string(),
            fields: ComponentFields { name: format!("{} widget", index), ..Default::default() },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_index() {
        let svc = service();
        svc.create(new_component("rain")).await.unwrap();
        let err = svc.create(new_component("rain")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::DuplicateIndex(ref i)) if i == "rain"
        ));
    }

    #[test]
    fn index_constraint_violation_becomes_duplicate_index() {
        let err = duplicate_index_or_storage(
            DatabaseError::UniqueViolation { constraint: COMPONENT_INDEX_KEY.into() },
            "rain",
        );
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::DuplicateIndex(ref i)) if i == "rain"
        ));

        let other = duplicate_index_or_storage(
            DatabaseError::UniqueViolation { constraint: "component_maps_pkey".into() },
            "rain",
        );
        assert!(matches!(other, ServiceError::Storage(DatabaseError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn create_rejects_unknown_map_reference() {
        let svc = service();
        let mut new = new_component("rain");
        new.map_config_ids = vec![42];
        assert!(matches!(svc.create(new).await, Err(ServiceError::NotFound(_))));
        assert_eq!(svc.list(&ListQuery::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_touching_store() {
        let svc = service();
        let created = svc.create(new_component("rain")).await.unwrap();
        let err = svc
            .update(created.id, ComponentFields { name: "  ".into(), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyField("name"))));
    }

    #[tokio::test]
    async fn invalid_filter_mode_is_a_validation_error() {
        let svc = service();
        let err = svc
            .list(&ListQuery {
                filterby: Some("index".into()),
                filtermode: Some("xyz".into()),
                filtervalue: Some("a".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::Filter(FilterError::InvalidFilterMode(_)))
        ));
    }
}
