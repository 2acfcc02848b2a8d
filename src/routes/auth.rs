//! Authentication routes

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};

use crate::config::{Environment, RateLimitConfig};
use crate::handlers::auth;
use crate::middleware::{rate_limit_layer, RateLimiter};
use crate::state::AppState;

/// Create authentication routes
///
/// Challenge, verify and refresh each carry their own per-client budget.
pub fn auth_routes(limits: &RateLimitConfig, environment: Environment) -> Router<AppState> {
    let challenge_limiter = RateLimiter::per_minute(limits.challenge_per_minute);
    let verify_limiter = RateLimiter::per_minute(limits.verify_per_minute);
    let refresh_limiter = RateLimiter::per_minute(limits.refresh_per_minute);

    let router = Router::new()
        .route(
            "/auth/challenge",
            post(auth::request_challenge).layer(from_fn(rate_limit_layer(challenge_limiter))),
        )
        .route(
            "/auth/verify",
            post(auth::verify_signature).layer(from_fn(rate_limit_layer(verify_limiter))),
        )
        .route(
            "/auth/refresh",
            post(auth::refresh_token).layer(from_fn(rate_limit_layer(refresh_limiter))),
        )
        .route("/auth/validate", post(auth::validate_token))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_session));

    if environment.is_development() {
        router.route("/auth/debug", get(auth::debug_challenges))
    } else {
        router
    }
}
