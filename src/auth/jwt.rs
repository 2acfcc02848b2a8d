//! JWT token generation and validation
//!
//! Bearer and refresh tokens share one format and one HMAC secret; they only
//! differ in lifetime. Tokens are self-contained, nothing is stored server-side.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::address::WalletAddress;
use crate::time::TimeSource;

/// Remaining lifetime under which a token counts as expiring soon
pub const EXPIRING_SOON_THRESHOLD_MS: i64 = 60 * 60 * 1000;

/// JWT-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (lowercased wallet address)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Unique token id, keeps rotated tokens distinct
    pub jti: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
    /// Issued at, ms since epoch
    pub iat_ms: i64,
    /// Expiration, ms since epoch
    pub exp_ms: i64,
}

/// Token kind, only selects the lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Bearer,
    Refresh,
}

/// A freshly minted token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Bearer plus refresh token
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub bearer: IssuedToken,
    pub refresh: IssuedToken,
}

/// Decoded, validated token contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub address: WalletAddress,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl TokenClaims {
    /// True when less than an hour of validity remains at `now_ms`
    pub fn is_expiring_soon(&self, now_ms: i64) -> bool {
        self.expires_at - now_ms < EXPIRING_SOON_THRESHOLD_MS
    }
}

/// Mints and validates signed tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    bearer_ttl: Duration,
    refresh_ttl: Duration,
    time: Arc<dyn TimeSource>,
}

impl TokenIssuer {
    pub fn new(
        secret: &str,
        issuer: impl Into<String>,
        bearer_ttl: Duration,
        refresh_ttl: Duration,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            bearer_ttl,
            refresh_ttl,
            time,
        }
    }

    pub fn bearer_ttl(&self) -> Duration {
        self.bearer_ttl
    }

    pub fn issue_bearer(&self, address: &WalletAddress) -> Result<IssuedToken, JwtError> {
        self.issue(address, TokenKind::Bearer)
    }

    pub fn issue_refresh(&self, address: &WalletAddress) -> Result<IssuedToken, JwtError> {
        self.issue(address, TokenKind::Refresh)
    }

    pub fn issue_pair(&self, address: &WalletAddress) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            bearer: self.issue_bearer(address)?,
            refresh: self.issue_refresh(address)?,
        })
    }

    pub fn issue(&self, address: &WalletAddress, kind: TokenKind) -> Result<IssuedToken, JwtError> {
        let ttl = match kind {
            TokenKind::Bearer => self.bearer_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let now = self.time.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| JwtError::EncodingFailed("token lifetime out of range".to_string()))?;
        self.mint(address, now, expires_at)
    }

    /// Sign a token with explicit issue and expiry instants
    pub fn mint(
        &self,
        address: &WalletAddress,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let claims = Claims {
            sub: address.to_string(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iat_ms: issued_at.timestamp_millis(),
            exp_ms: expires_at.timestamp_millis(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            issued_at: claims.iat_ms,
            expires_at: claims.exp_ms,
        })
    }

    /// Verify signature, issuer and expiry, returning the bound address
    pub fn validate(&self, token: &str) -> Result<TokenClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // Expiry is checked below against the injected clock, to the millisecond
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;
        let claims = data.claims;

        if claims.exp_ms <= self.time.now_ms() {
            return Err(JwtError::TokenExpired);
        }

        let address = WalletAddress::parse(&claims.sub)
            .map_err(|e| JwtError::InvalidToken(format!("bad subject: {}", e)))?;

        // Subject is minted lowercase; anything else was not issued here
        if address.as_str() != claims.sub {
            return Err(JwtError::InvalidToken("non-canonical subject".to_string()));
        }

        Ok(TokenClaims {
            address,
            issued_at: claims.iat_ms,
            expires_at: claims.exp_ms,
        })
    }
}
