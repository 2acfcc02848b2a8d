//! Rate limiting middleware

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{collections::HashMap, sync::Arc, time::Duration, time::Instant};
use tokio::sync::RwLock;

use crate::error::ApiError;

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Buckets above this count trigger a sweep of idle clients
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Token bucket for rate limiting
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(max_tokens: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_update: Instant::now(),
        }
    }

    fn try_consume(&mut self, tokens_per_second: f64, max_tokens: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * tokens_per_second).min(max_tokens);
        self.last_update = now;

        // Try to consume a token
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the next token, when denied
    pub retry_after: u64,
}

/// Rate limiter state
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<RwLock<HashMap<String, TokenBucket>>>,
    tokens_per_second: f64,
    max_tokens: f64,
    limit: u32,
}

impl RateLimiter {
    /// Allow `requests_per_minute` per client, all of which may arrive as one burst
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let limit = requests_per_minute.max(1);
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            tokens_per_second: limit as f64 / 60.0,
            max_tokens: limit as f64,
            limit,
        }
    }

    /// Check if a request is allowed
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let mut buckets = self.buckets.write().await;

        if buckets.len() >= MAX_TRACKED_CLIENTS {
            let now = Instant::now();
            let idle = Duration::from_secs(120);
            buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < idle);
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.max_tokens));

        let allowed = bucket.try_consume(self.tokens_per_second, self.max_tokens);
        let retry_after = if allowed {
            0
        } else {
            ((1.0 - bucket.tokens) / self.tokens_per_second).ceil().max(1.0) as u64
        };

        RateLimitDecision {
            allowed,
            limit: self.limit,
            remaining: bucket.tokens.floor().max(0.0) as u32,
            retry_after,
        }
    }

}

/// Create rate limiting middleware layer
pub fn rate_limit_layer(
    rate_limiter: RateLimiter,
) -> impl Fn(
    Request<Body>,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Response> + Send>>
       + Clone
       + Send {
    move |request: Request<Body>, next: Next| {
        let rate_limiter = rate_limiter.clone();
        Box::pin(async move {
            let client_key = extract_client_ip(&request);
            let decision = rate_limiter.check(&client_key).await;

            let mut response = if decision.allowed {
                next.run(request).await
            } else {
                tracing::warn!(
                    client = %client_key,
                    path = %request.uri().path(),
                    "Rate limit exceeded"
                );
                let mut response = ApiError::TooManyRequests.into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(decision.retry_after));
                response
            };

            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));

            response
        })
    }
}

/// Extract client IP from request headers
pub fn extract_client_ip(request: &Request<Body>) -> String {
    // Try X-Forwarded-For first
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(s) = forwarded.to_str() {
            if let Some(ip) = s.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }

    // Try X-Real-IP
    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(s) = real_ip.to_str() {
            return s.to_string();
        }
    }

    "unknown".to_string()
}
