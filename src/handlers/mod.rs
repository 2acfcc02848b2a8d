//! API handlers for the guild auth service

pub mod auth;
pub mod health;

pub use auth::*;
pub use health::health_check;

// Re-export extractors from middleware for handler use
pub use crate::middleware::auth::{AuthenticatedWallet, OptionalWallet};
