//! Router configuration for the API.

use std::time::Duration;

use axum::{Json, Router, extract::DefaultBodyLimit, middleware, routing::get};
use tower_http::{compression::CompressionLayer, cors::CorsLayer};
use utoipa::OpenApi;

use crate::api::doc::{ApiDoc, OPENAPI_PATH};
use crate::api::handlers::{health::health_routes, ncm::ncm_routes};
use crate::api::middleware::{
    global_error_handler, logging_middleware, request_id_middleware, request_timeout_layer,
};
use crate::config::ServerConfig;
use crate::state::AppState;

/// Builds the application router.
///
/// # Middleware Order
/// Layers run outermost first:
/// 1. CORS
/// 2. Request ID, so every later layer can read it
/// 3. Logging
/// 4. Compression
/// 5. Error body rewriting, which needs the uncompressed body
/// 6. Request timeout
/// 7. Body size limit
///
/// # Example
/// ```ignore
/// let router = create_router(AppState::new(pool), &settings.server);
/// ```
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(ncm_routes())
        .route(OPENAPI_PATH, get(openapi_json))
        .layer(DefaultBodyLimit::max(server.body_limit))
        .layer(request_timeout_layer(Duration::from_secs(
            server.request_timeout,
        )))
        .layer(middleware::from_fn(global_error_handler))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
