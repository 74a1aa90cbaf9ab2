// handlers/health.rs - GET /health handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let store = state.components.store();
    store.health_check().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("Store unavailable")
    })?;
    Ok(ApiResponse::success(json!({
        "status": "ok",
        "store": store.backend_name(),
    })))
}
