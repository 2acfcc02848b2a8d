//! Background sweep of expired challenges
//!
//! Expiry is enforced at verification time; this only reclaims storage.

use std::sync::Arc;

use chrono::Duration;

use crate::store::{ChallengeStore, StoreError};
use crate::time::TimeSource;

pub struct ChallengeSweeper {
    store: Arc<dyn ChallengeStore>,
    time: Arc<dyn TimeSource>,
    challenge_ttl: Duration,
    interval: std::time::Duration,
}

impl ChallengeSweeper {
    pub fn new(
        store: Arc<dyn ChallengeStore>,
        time: Arc<dyn TimeSource>,
        challenge_ttl: Duration,
        interval: std::time::Duration,
    ) -> Self {
        Self {
            store,
            time,
            challenge_ttl,
            interval,
        }
    }

    /// Run forever, sweeping every `interval`
    pub async fn start(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Challenge sweeper started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep_once().await {
                tracing::error!("Error sweeping expired challenges: {}", e);
            }
        }
    }

    /// Delete challenges past their expiry, returning how many were removed
    pub async fn sweep_once(&self) -> Result<u64, StoreError> {
        let cutoff = self.time.now_ms() - self.challenge_ttl.num_milliseconds();
        let removed = self.store.purge_expired(cutoff).await?;

        if removed > 0 {
            tracing::info!(removed, "Cleaned expired challenges");
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::WalletAddress;
    use crate::models::Challenge;
    use crate::store::MemoryStore;
    use crate::time::TimeSourceStub;

    #[tokio::test]
    async fn test_sweep_once() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(TimeSourceStub::new());
        let now = clock.now_ms();

        for (byte, age) in [(1u8, Duration::minutes(31)), (2, Duration::minutes(29))] {
            store
                .put(Challenge {
                    address: WalletAddress::from_bytes(&[byte; 20]),
                    message: "m".to_string(),
                    nonce: "n".to_string(),
                    timestamp: now - age.num_milliseconds(),
                })
                .await
                .unwrap();
        }

        let sweeper = ChallengeSweeper::new(
            store.clone(),
            clock,
            Duration::minutes(30),
            std::time::Duration::from_secs(300),
        );

        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);

        let remaining = store.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].address, WalletAddress::from_bytes(&[2; 20]));
    }
}
