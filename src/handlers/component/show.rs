// handlers/component/show.rs - GET /api/v1/component/:id handler

use axum::extract::{Path, State};

use super::parse_id;
use crate::app::AppState;
use crate::database::models::Component;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn component_show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Component> {
    let id = parse_id(&id, "component")?;
    let component = state.components.get(id).await?;
    Ok(ApiResponse::success(component))
}
