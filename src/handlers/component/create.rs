// handlers/component/create.rs - POST /api/v1/component handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use super::json_body;
use crate::app::AppState;
use crate::database::models::{Component, NewComponent};
use crate::middleware::{ApiResponse, ApiResult};

pub async fn component_create(
    State(state): State<AppState>,
    payload: Result<Json<NewComponent>, JsonRejection>,
) -> ApiResult<Component> {
    let new = json_body(payload)?;
    let component = state.components.create(new).await?;
    Ok(ApiResponse::created(component))
}
