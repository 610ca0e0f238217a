use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use prlens_review::pipeline::Analyzer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;

use crate::handlers::{analyze, health, list_prs};

/// CORS policy admitting the configured front-end origins with credentials.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn app(analyzer: Arc<Analyzer>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/list-prs", post(list_prs))
        .route("/health", get(health))
        .layer(cors_layer(allowed_origins))
        .with_state(analyzer)
}
