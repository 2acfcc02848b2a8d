//! Middleware for the guild auth API
//!
//! This module provides middleware for request tracing, rate limiting,
//! security headers, and authentication.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

pub use auth::{AuthenticatedWallet, OptionalWallet};
pub use rate_limiter::{extract_client_ip, rate_limit_layer, RateLimitDecision, RateLimiter};
pub use security::{hsts_header, security_headers};
pub use self::tracing::{request_tracing, REQUEST_ID_HEADER};
