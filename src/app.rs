use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers;
use crate::services::ComponentService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub components: Arc<ComponentService>,
}

impl AppState {
    pub fn new(components: ComponentService) -> Self {
        Self { components: Arc::new(components) }
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .merge(component_routes())
        .with_state(state);

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn component_routes() -> Router<AppState> {
    use handlers::component;

    Router::new()
        // Collection
        .route(
            "/api/v1/component",
            get(component::component_list).post(component::component_create),
        )
        // Single component
        .route(
            "/api/v1/component/:id",
            get(component::component_show)
                .patch(component::component_update)
                .delete(component::component_delete),
        )
        // Sub-configurations
        .route("/api/v1/component/:id/chart", patch(component::component_chart_update))
        .route("/api/v1/component/:id/map", patch(component::component_map_update))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}
