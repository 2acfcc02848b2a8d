//! Data models for the guild auth service

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::auth::WalletAddress;

pub mod auth;
pub use auth::*;

/// A challenge a wallet must sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub address: WalletAddress,
    /// Exact text the wallet signs
    pub message: String,
    /// Hex nonce embedded in `message`
    pub nonce: String,
    /// Issuance time, ms since epoch
    pub timestamp: i64,
}

impl Challenge {
    /// Age in milliseconds at `now_ms`
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.timestamp
    }

    /// SHA-256 of `message || timestamp`, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.message.as_bytes());
        hasher.update(self.timestamp.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Last successful verification for an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRecord {
    pub last_verified_challenge_hash: String,
    /// ms since epoch
    pub last_verified_at: i64,
}
