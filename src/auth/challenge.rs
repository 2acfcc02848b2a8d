//! Challenge issuance
//!
//! A client asks for a challenge, shows the message in its wallet and later
//! submits the signature. Re-requests inside the reuse window return the same
//! challenge so a retry cannot invalidate a signature prompt already open.

use std::sync::Arc;

use chrono::Duration;
use rand::RngCore;

use super::address::WalletAddress;
use crate::models::Challenge;
use crate::store::{ChallengeStore, StoreError};
use crate::time::TimeSource;

/// Random bytes in a nonce (hex encoded to twice this length)
pub const NONCE_BYTES: usize = 16;

/// Build the exact text a wallet is asked to sign
pub fn compose_message(app_name: &str, address: &WalletAddress, nonce: &str, timestamp: i64) -> String {
    format!(
        "Welcome to {}!\n\nPlease sign this message to authenticate.\n\nAddress: {}\nNonce: {}\nTimestamp: {}\n\nThis request will not trigger a blockchain transaction or cost any gas fees.",
        app_name, address, nonce, timestamp
    )
}

/// Generate a cryptographically secure nonce
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Creates challenges and applies the reuse window
#[derive(Clone)]
pub struct ChallengeService {
    store: Arc<dyn ChallengeStore>,
    time: Arc<dyn TimeSource>,
    app_name: String,
    reuse_window: Duration,
}

impl ChallengeService {
    pub fn new(
        store: Arc<dyn ChallengeStore>,
        time: Arc<dyn TimeSource>,
        app_name: impl Into<String>,
        reuse_window: Duration,
    ) -> Self {
        Self {
            store,
            time,
            app_name: app_name.into(),
            reuse_window,
        }
    }

    /// Return the live challenge for `address`, issuing a new one if needed
    pub async fn request_challenge(&self, address: &WalletAddress) -> Result<Challenge, StoreError> {
        let now = self.time.now_ms();

        if let Some(existing) = self.store.get(address).await? {
            let age = existing.age_ms(now);
            if (0..self.reuse_window.num_milliseconds()).contains(&age) {
                tracing::debug!(address = %address, age_ms = age, "Returning existing challenge");
                return Ok(existing);
            }
        }

        let nonce = generate_nonce();
        let challenge = Challenge {
            address: address.clone(),
            message: compose_message(&self.app_name, address, &nonce, now),
            nonce,
            timestamp: now,
        };

        self.store.put(challenge.clone()).await?;
        tracing::info!(address = %address, timestamp = now, "Challenge issued");

        Ok(challenge)
    }
}
