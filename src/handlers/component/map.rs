// handlers/component/map.rs - PATCH /api/v1/component/:id/map handler
//
// `:id` here is the map config id, not a component id. Map configs are
// shared, so the change is visible to every component referencing it.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{json_body, parse_id};
use crate::app::AppState;
use crate::database::models::{MapConfig, MapConfigFields};
use crate::middleware::{ApiResponse, ApiResult};

pub async fn component_map_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MapConfigFields>, JsonRejection>,
) -> ApiResult<MapConfig> {
    let id = parse_id(&id, "map config")?;
    let fields = json_body(payload)?;
    let map = state.components.update_map_config(id, fields).await?;
    Ok(ApiResponse::success(map))
}
