//! Authentication middleware
//!
//! Extractors for bearer-token verification on protected routes.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{AuthError, AuthService, JwtError, WalletAddress};

/// Wallet extracted from a valid bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedWallet {
    pub address: WalletAddress,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthRejection {
    error: AuthRejectionDetails,
}

#[derive(Debug, Serialize)]
struct AuthRejectionDetails {
    code: String,
    message: String,
}

impl AuthRejection {
    fn new(code: &str, message: &str) -> Self {
        Self {
            error: AuthRejectionDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Extractor for authenticated wallets
///
/// Verifies the bearer token from the Authorization header.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(wallet: AuthenticatedWallet) -> impl IntoResponse {
///     format!("Hello, {}", wallet.address)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedWallet
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthRejection::new(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = auth_service.validate(bearer.token()).map_err(|e| {
            let (code, message) = match e {
                AuthError::InvalidToken(JwtError::TokenExpired) => {
                    ("TOKEN_EXPIRED", "Token has expired")
                }
                _ => ("INVALID_TOKEN", "Invalid token"),
            };
            AuthRejection::new(code, message).into_response()
        })?;

        Ok(AuthenticatedWallet {
            address: claims.address,
            issued_at: claims.issued_at,
            expires_at: claims.expires_at,
        })
    }
}

/// Optional authenticated wallet extractor
///
/// Attempts to authenticate but doesn't fail if no valid token is present.
#[derive(Debug, Clone)]
pub struct OptionalWallet(pub Option<AuthenticatedWallet>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalWallet
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthenticatedWallet::from_request_parts(parts, state).await {
            Ok(wallet) => Ok(OptionalWallet(Some(wallet))),
            Err(_) => Ok(OptionalWallet(None)),
        }
    }
}
