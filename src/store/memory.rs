//! In-process store
//!
//! Suitable for a single server instance. State is lost on restart, which
//! only forces clients to request a new challenge.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ChallengeStore, ReplayGuardStore, StoreError};
use crate::auth::WalletAddress;
use crate::models::{Challenge, ReplayRecord};

#[derive(Debug, Default)]
pub struct MemoryStore {
    challenges: RwLock<HashMap<WalletAddress, Challenge>>,
    replay: RwLock<HashMap<WalletAddress, ReplayRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn put(&self, challenge: Challenge) -> Result<(), StoreError> {
        let mut challenges = self.challenges.write().await;
        challenges.insert(challenge.address.clone(), challenge);
        Ok(())
    }

    async fn get(&self, address: &WalletAddress) -> Result<Option<Challenge>, StoreError> {
        Ok(self.challenges.read().await.get(address).cloned())
    }

    async fn delete(&self, address: &WalletAddress) -> Result<(), StoreError> {
        self.challenges.write().await.remove(address);
        Ok(())
    }

    async fn take_if_matches(&self, expected: &Challenge) -> Result<bool, StoreError> {
        let mut challenges = self.challenges.write().await;

        match challenges.get(&expected.address) {
            Some(current)
                if current.message == expected.message
                    && current.timestamp == expected.timestamp =>
            {
                challenges.remove(&expected.address);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_expired(&self, cutoff_ms: i64) -> Result<u64, StoreError> {
        let mut challenges = self.challenges.write().await;
        let before = challenges.len();

        challenges.retain(|_, challenge| challenge.timestamp >= cutoff_ms);

        Ok((before - challenges.len()) as u64)
    }

    async fn list(&self) -> Result<Vec<Challenge>, StoreError> {
        let mut all: Vec<Challenge> = self.challenges.read().await.values().cloned().collect();
        all.sort_by_key(|c| c.timestamp);
        Ok(all)
    }
}

#[async_trait]
impl ReplayGuardStore for MemoryStore {
    async fn last_verified(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<ReplayRecord>, StoreError> {
        Ok(self.replay.read().await.get(address).cloned())
    }

    async fn record_verification(
        &self,
        address: &WalletAddress,
        record: ReplayRecord,
    ) -> Result<(), StoreError> {
        self.replay.write().await.insert(address.clone(), record);
        Ok(())
    }
}
