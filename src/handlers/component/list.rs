// handlers/component/list.rs - GET /api/v1/component handler

use axum::extract::{rejection::QueryRejection, Query, State};

use crate::app::AppState;
use crate::database::models::Component;
use crate::error::ApiError;
use crate::filter::ListQuery;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn component_list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<Component>> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let page = state.components.list(&query).await?;
    Ok(ApiResponse::paged(page.rows, page.total, page.matched))
}
