// handlers/component/chart.rs - PATCH /api/v1/component/:id/chart handler

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{json_body, parse_id};
use crate::app::AppState;
use crate::database::models::{ChartConfig, ChartConfigFields};
use crate::middleware::{ApiResponse, ApiResult};

/// Creates or replaces the chart config of the component at `:id`
pub async fn component_chart_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ChartConfigFields>, JsonRejection>,
) -> ApiResult<ChartConfig> {
    let id = parse_id(&id, "component")?;
    if payload.is_err() {
        // Unknown component wins over a bad body
        state.components.get(id).await?;
    }
    let fields = json_body(payload)?;
    let chart = state.components.update_chart_config(id, fields).await?;
    Ok(ApiResponse::success(chart))
}
