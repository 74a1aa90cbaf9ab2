// handlers/component/update.rs - PATCH /api/v1/component/:id handler

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{json_body, parse_id};
use crate::app::AppState;
use crate::database::models::{Component, ComponentFields};
use crate::middleware::{ApiResponse, ApiResult};

/// Replaces all mutable metadata fields of the component
pub async fn component_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ComponentFields>, JsonRejection>,
) -> ApiResult<Component> {
    let id = parse_id(&id, "component")?;
    if payload.is_err() {
        // Unknown component wins over a bad body
        state.components.get(id).await?;
    }
    let fields = json_body(payload)?;
    let component = state.components.update(id, fields).await?;
    Ok(ApiResponse::success(component))
}
