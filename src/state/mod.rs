//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::config::Environment;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub environment: Environment,
    /// "postgres" or "memory"
    pub storage_backend: &'static str,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        environment: Environment,
        storage_backend: &'static str,
    ) -> Self {
        Self {
            auth_service,
            environment,
            storage_backend,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
