// handlers/component/mod.rs - Component configuration handlers
//
// Thin adapters over ComponentService: parse path/query/body, call the
// service, wrap the result in the response envelope.

use crate::error::ApiError;

pub mod chart;    // PATCH /api/v1/component/:id/chart
pub mod create;   // POST /api/v1/component
pub mod delete;   // DELETE /api/v1/component/:id
pub mod list;     // GET /api/v1/component
pub mod map;      // PATCH /api/v1/component/:id/map
pub mod show;     // GET /api/v1/component/:id
pub mod update;   // PATCH /api/v1/component/:id

pub use chart::component_chart_update;
pub use create::component_create;
pub use delete::component_delete;
pub use list::component_list;
pub use map::component_map_update;
pub use show::component_show;
pub use update::component_update;

/// Path ids arrive as strings so a malformed id maps to our own 400 body
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid {} ID", what)))
}

pub(crate) fn json_body<T>(
    payload: Result<axum::Json<T>, axum::extract::rejection::JsonRejection>,
) -> Result<T, ApiError> {
    payload
        .map(|axum::Json(body)| body)
        .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids() {
        assert_eq!(parse_id("42", "component").unwrap(), 42);
        let err = parse_id("abc", "component").unwrap_err();
        assert_eq!(err.message(), "Invalid component ID");
        assert_eq!(err.status_code(), 400);
    }
}
