//! Route definitions for the guild auth API

mod auth;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

pub use auth::auth_routes;

use crate::config::Config;
use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the full application router with its middleware stack
pub fn create_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .merge(auth_routes(&config.rate_limits, config.environment))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(middleware::request_tracing))
                .layer(from_fn(middleware::security_headers))
                .layer(configure_cors(config.cors_allowed_origins.as_deref())),
        );

    if config.environment.is_production() {
        router.layer(from_fn(middleware::hsts_header))
    } else {
        router
    }
}

async fn root() -> &'static str {
    "Guild Auth API Server"
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let Some(allowed_origins) = allowed_origins else {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::RETRY_AFTER])
}
