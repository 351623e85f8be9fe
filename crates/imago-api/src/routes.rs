//! Router assembly and middleware stack.

use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use imago_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// Headroom for multipart framing on top of the configured file size cap.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit =
        DefaultBodyLimit::max(state.config.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/api/v1/images", post(handlers::upload::upload_image))
        .route(
            "/api/v1/images/{name}",
            get(handlers::get::get_image).delete(handlers::delete::delete_image),
        )
        .route(
            "/api/v1/images/{name}/file",
            get(handlers::download::download_image),
        )
        .route(
            "/api/v1/images/{name}/transformations",
            post(handlers::transform::transform_image),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(body_limit)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
