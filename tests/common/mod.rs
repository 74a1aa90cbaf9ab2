#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use dashboard_api_rust::app::{router, AppState};
use dashboard_api_rust::config::AppConfig;
use dashboard_api_rust::database::models::{ComponentFields, MapConfig, MapConfigFields, NewComponent};
use dashboard_api_rust::database::{MemoryStore, Store};
use dashboard_api_rust::events::EventBus;
use dashboard_api_rust::services::ComponentService;

/// Service and router wired to a fresh in-memory store
pub struct TestApp {
    pub store: MemoryStore,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_events(EventBus::new())
    }

    pub fn with_events(events: EventBus) -> Self {
        let store = MemoryStore::new();
        let service = ComponentService::new(Arc::new(store.clone()), events);
        Self { store, state: AppState::new(service) }
    }

    pub fn service(&self) -> &ComponentService {
        &self.state.components
    }

    pub fn router(&self) -> Router {
        router(self.state.clone(), &AppConfig::development())
    }

    /// Insert a standalone map config directly through the store
    pub async fn seed_map(&self, index: &str) -> Result<MapConfig> {
        let mut tx = self.store.begin().await?;
        let map = tx.insert_map_config(&map_fields(index)).await?;
        tx.commit().await?;
        Ok(map)
    }

    /// Create a component via the service
    pub async fn seed_component(&self, index: &str, name: &str, map_config_ids: &[i64]) -> Result<i64> {
        let mut new = new_component(index, name);
        new.map_config_ids = map_config_ids.to_vec();
        Ok(self.service().create(new).await?.id)
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok((status, body))
    }

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.send(Request::get(uri).body(Body::empty())?).await
    }

    pub async fn delete(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.send(Request::delete(uri).body(Body::empty())?).await
    }

    pub async fn patch_json(&self, uri: &str, body: &Value) -> Result<(StatusCode, Value)> {
        self.send(
            Request::patch(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body)?))?,
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> Result<(StatusCode, Value)> {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body)?))?,
        )
        .await
    }
}

pub fn new_component(index: &str, name: &str) -> NewComponent {
    NewComponent {
        index: index.to_string(),
        fields: ComponentFields {
            name: name.to_string(),
            source: Some("Transport Bureau".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn map_fields(index: &str) -> MapConfigFields {
    MapConfigFields {
        index: index.to_string(),
        title: format!("{} layer", index),
        map_type: "circle".to_string(),
        source: "geojson".to_string(),
        ..Default::default()
    }
}
