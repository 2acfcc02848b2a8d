//! Authentication request/response bodies
//!
//! Field names are camelCase on the wire to match the web client.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::WalletAddress;

// ============================================================================
// Request DTOs
// ============================================================================

/// Request for authentication challenge
#[derive(Debug, Deserialize, Validate)]
pub struct ChallengeRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
}

/// Request to verify a signed challenge
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    /// Hex-encoded 65-byte signature
    #[serde(default)]
    #[validate(length(min = 1, message = "Signature is required"))]
    pub signature: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token validation request
///
/// A missing or empty token is answered like any other invalid token.
#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    #[serde(default)]
    pub token: String,
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Response containing the authentication challenge
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub message: String,
    pub nonce: String,
    pub timestamp: i64,
}

/// Auth tokens response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokensResponse {
    pub success: bool,
    pub token: String,
    pub refresh_token: String,
    pub address: WalletAddress,
    /// Bearer token expiry, ms since epoch
    pub expires_at: i64,
}

/// Token validation outcome
#[derive(Debug, Serialize)]
pub struct ValidateTokenResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<WalletAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Current session, as seen by a protected endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub address: WalletAddress,
    pub issued_at: i64,
    pub expires_at: i64,
    pub expiring_soon: bool,
}

/// Development-only view of a stored challenge
#[derive(Debug, Serialize)]
pub struct ChallengeSummary {
    pub address: WalletAddress,
    pub timestamp: i64,
    pub age: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDebugResponse {
    pub total_challenges: usize,
    pub current_time: i64,
    pub challenges: Vec<ChallengeSummary>,
}
