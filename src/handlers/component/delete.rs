// handlers/component/delete.rs - DELETE /api/v1/component/:id handler

use axum::extract::{Path, State};

use super::parse_id;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::DeleteOutcome;

pub async fn component_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<DeleteOutcome> {
    let id = parse_id(&id, "component")?;
    let outcome = state.components.delete(id).await?;
    Ok(ApiResponse::success(outcome))
}
