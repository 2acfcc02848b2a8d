//! Authentication service
//!
//! Drives the wallet proof-of-ownership protocol:
//! challenge -> wallet signature -> verification -> bearer/refresh tokens,
//! plus token refresh and validation.

use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;

use crate::models::{AuthTokensResponse, Challenge, ReplayRecord};
use crate::store::{ChallengeStore, ReplayGuardStore, StoreError};
use crate::time::TimeSource;

use super::address::{AddressError, WalletAddress};
use super::challenge::ChallengeService;
use super::crypto::{verify_personal_signature, CryptoError};
use super::jwt::{JwtError, TokenClaims, TokenIssuer};
use super::locks::AddressLocks;

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("No challenge found for this address. Please request a new challenge.")]
    NoChallengeFound,

    #[error("Challenge has expired. Please request a new challenge.")]
    ChallengeExpired,

    #[error("Message does not match challenge")]
    MessageMismatch,

    #[error("This challenge has already been used")]
    ReplayDetected,

    #[error("Invalid signature: {0}")]
    InvalidSignature(#[from] CryptoError),

    #[error("Invalid or expired token: {0}")]
    InvalidToken(JwtError),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::EncodingFailed(msg) => AuthError::TokenError(msg),
            other => AuthError::InvalidToken(other),
        }
    }
}

/// Protocol timings
#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    /// Challenges older than this are never accepted
    pub challenge_ttl: Duration,
    /// Re-requests younger than this get the same challenge back
    pub challenge_reuse_window: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            challenge_ttl: Duration::minutes(30),
            challenge_reuse_window: Duration::seconds(60),
        }
    }
}

/// Authentication service
pub struct AuthService {
    challenges: Arc<dyn ChallengeStore>,
    replay_guard: Arc<dyn ReplayGuardStore>,
    challenge_service: ChallengeService,
    tokens: TokenIssuer,
    time: Arc<dyn TimeSource>,
    locks: AddressLocks,
    settings: AuthSettings,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        challenges: Arc<dyn ChallengeStore>,
        replay_guard: Arc<dyn ReplayGuardStore>,
        tokens: TokenIssuer,
        time: Arc<dyn TimeSource>,
        app_name: &str,
        settings: AuthSettings,
    ) -> Self {
        let challenge_service = ChallengeService::new(
            challenges.clone(),
            time.clone(),
            app_name,
            settings.challenge_reuse_window,
        );

        Self {
            challenges,
            replay_guard,
            challenge_service,
            tokens,
            time,
            locks: AddressLocks::new(),
            settings,
        }
    }

    /// Issue (or re-serve) the challenge for `address`
    pub async fn request_challenge(&self, address: &str) -> Result<Challenge, AuthError> {
        let address = WalletAddress::parse(address)?;
        Ok(self.challenge_service.request_challenge(&address).await?)
    }

    /// Verify a signed challenge and issue tokens
    pub async fn verify(
        &self,
        address: &str,
        signature: &str,
        message: &str,
    ) -> Result<AuthTokensResponse, AuthError> {
        let address = WalletAddress::parse(address)?;
        let _guard = self.locks.acquire(&address).await;

        let challenge = self
            .challenges
            .get(&address)
            .await?
            .ok_or_else(|| {
                tracing::info!(address = %address, "Verification without a stored challenge");
                AuthError::NoChallengeFound
            })?;

        let now = self.time.now_ms();
        let age = challenge.age_ms(now);

        if age > self.settings.challenge_ttl.num_milliseconds() {
            tracing::info!(address = %address, age_ms = age, "Challenge expired");
            self.discard(&challenge).await?;
            return Err(AuthError::ChallengeExpired);
        }

        if message != challenge.message {
            tracing::info!(
                address = %address,
                expected_len = challenge.message.len(),
                received_len = message.len(),
                "Message does not match stored challenge"
            );
            self.discard(&challenge).await?;
            return Err(AuthError::MessageMismatch);
        }

        let fingerprint = challenge.fingerprint();
        if let Some(last) = self.replay_guard.last_verified(&address).await? {
            if last.last_verified_challenge_hash == fingerprint {
                tracing::warn!(address = %address, timestamp = now, "Replay attempt detected");
                self.discard(&challenge).await?;
                return Err(AuthError::ReplayDetected);
            }
        }

        // The challenge survives a bad signature so the user can sign again
        if let Err(e) = verify_personal_signature(&address, message, signature) {
            tracing::warn!(address = %address, timestamp = now, error = %e, "Signature rejected");
            return Err(AuthError::InvalidSignature(e));
        }

        if !self.challenges.take_if_matches(&challenge).await? {
            // Consumed by a concurrent request on another instance
            tracing::warn!(address = %address, timestamp = now, "Challenge consumed concurrently");
            return Err(AuthError::NoChallengeFound);
        }

        self.replay_guard
            .record_verification(
                &address,
                ReplayRecord {
                    last_verified_challenge_hash: fingerprint,
                    last_verified_at: now,
                },
            )
            .await?;

        tracing::info!(address = %address, "Wallet authenticated");

        self.issue_tokens(address)
    }

    /// Exchange a refresh token for a new bearer/refresh pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokensResponse, AuthError> {
        let claims = self.tokens.validate(refresh_token).map_err(|e| {
            tracing::info!(error = %e, "Refresh token rejected");
            AuthError::from(e)
        })?;

        tracing::info!(address = %claims.address, "Tokens refreshed");

        self.issue_tokens(claims.address)
    }

    /// Validate a bearer (or refresh) token
    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        Ok(self.tokens.validate(token)?)
    }

    pub fn now_ms(&self) -> i64 {
        self.time.now_ms()
    }

    pub fn challenge_store(&self) -> &Arc<dyn ChallengeStore> {
        &self.challenges
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Drop `challenge` unless a newer one has replaced it since it was read
    async fn discard(&self, challenge: &Challenge) -> Result<(), AuthError> {
        if !self.challenges.take_if_matches(challenge).await? {
            tracing::debug!(address = %challenge.address, "Challenge already replaced");
        }
        Ok(())
    }

    fn issue_tokens(&self, address: WalletAddress) -> Result<AuthTokensResponse, AuthError> {
        let pair = self.tokens.issue_pair(&address)?;

        Ok(AuthTokensResponse {
            success: true,
            token: pair.bearer.token,
            refresh_token: pair.refresh.token,
            address,
            expires_at: pair.bearer.expires_at,
        })
    }
}
