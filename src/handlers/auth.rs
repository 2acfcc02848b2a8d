//! Authentication HTTP handlers
//!
//! Endpoints for wallet-based authentication.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::{AuthenticatedWallet, OptionalWallet};
use crate::auth::EXPIRING_SOON_THRESHOLD_MS;
use crate::error::ApiError;
use crate::models::{
    AuthTokensResponse, ChallengeDebugResponse, ChallengeRequest, ChallengeResponse,
    ChallengeSummary, LogoutResponse, RefreshTokenRequest, SessionResponse, ValidateTokenRequest,
    ValidateTokenResponse, VerifyRequest,
};
use crate::state::AppState;

/// Unwrap a JSON body and run its field validation
fn validated<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    body.validate()?;
    Ok(body)
}

/// POST /auth/challenge - Request a challenge message to sign
pub async fn request_challenge(
    State(state): State<AppState>,
    payload: Result<Json<ChallengeRequest>, JsonRejection>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let req = validated(payload)?;

    let challenge = state.auth_service.request_challenge(&req.address).await?;

    Ok(Json(ChallengeResponse {
        message: challenge.message,
        nonce: challenge.nonce,
        timestamp: challenge.timestamp,
    }))
}

/// POST /auth/verify - Verify a signed challenge and issue tokens
pub async fn verify_signature(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    let req = validated(payload)?;

    let tokens = state
        .auth_service
        .verify(&req.address, &req.signature, &req.message)
        .await?;

    Ok(Json(tokens))
}

/// POST /auth/refresh - Rotate the token pair using a refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    let req = validated(payload)?;

    let tokens = state.auth_service.refresh(&req.refresh_token).await?;

    Ok(Json(tokens))
}

/// POST /auth/validate - Check a token without requiring it as a header
pub async fn validate_token(
    State(state): State<AppState>,
    payload: Result<Json<ValidateTokenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ValidateTokenResponse>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let response = match state.auth_service.validate(&req.token) {
        Ok(claims) => (
            StatusCode::OK,
            Json(ValidateTokenResponse {
                valid: true,
                address: Some(claims.address),
                error: None,
            }),
        ),
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(ValidateTokenResponse {
                valid: false,
                address: None,
                error: Some("Invalid or expired token".to_string()),
            }),
        ),
    };

    Ok(response)
}

/// POST /auth/logout - Tokens are stateless, so the client simply discards them
pub async fn logout(OptionalWallet(wallet): OptionalWallet) -> Json<LogoutResponse> {
    if let Some(wallet) = wallet {
        tracing::info!(address = %wallet.address, "Wallet logged out");
    }

    Json(LogoutResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    })
}

/// GET /auth/me - Describe the session behind the bearer token
pub async fn get_current_session(
    State(state): State<AppState>,
    wallet: AuthenticatedWallet,
) -> Json<SessionResponse> {
    let now = state.auth_service.now_ms();

    Json(SessionResponse {
        expiring_soon: wallet.expires_at - now < EXPIRING_SOON_THRESHOLD_MS,
        address: wallet.address,
        issued_at: wallet.issued_at,
        expires_at: wallet.expires_at,
    })
}

/// GET /auth/debug - Stored challenges, development only
pub async fn debug_challenges(
    State(state): State<AppState>,
) -> Result<Json<ChallengeDebugResponse>, ApiError> {
    if !state.environment.is_development() {
        return Err(ApiError::NotFound("/auth/debug".to_string()));
    }

    let now = state.auth_service.now_ms();
    let challenges = state.auth_service.challenge_store().list().await?;

    let challenges: Vec<ChallengeSummary> = challenges
        .into_iter()
        .map(|c| ChallengeSummary {
            age: c.age_ms(now),
            address: c.address,
            timestamp: c.timestamp,
        })
        .collect();

    Ok(Json(ChallengeDebugResponse {
        total_challenges: challenges.len(),
        current_time: now,
        challenges,
    }))
}
