//! Storage for challenges and replay-guard records
//!
//! The auth flow only talks to these traits. [`MemoryStore`] serves a single
//! process; [`PgStore`] is the shared backend for multi-instance deployments.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::WalletAddress;
use crate::models::{Challenge, ReplayRecord};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record for {address}: {reason}")]
    Corrupt { address: String, reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Single live challenge per address
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Store `challenge`, replacing any previous one for the same address
    async fn put(&self, challenge: Challenge) -> Result<(), StoreError>;

    async fn get(&self, address: &WalletAddress) -> Result<Option<Challenge>, StoreError>;

    async fn delete(&self, address: &WalletAddress) -> Result<(), StoreError>;

    /// Remove the stored challenge only if it is still exactly `expected`
    ///
    /// Returns `false` when the record was already consumed or replaced.
    /// At most one of several concurrent callers observes `true`.
    async fn take_if_matches(&self, expected: &Challenge) -> Result<bool, StoreError>;

    /// Delete every challenge issued before `cutoff_ms`, returning how many went
    async fn purge_expired(&self, cutoff_ms: i64) -> Result<u64, StoreError>;

    /// All stored challenges, oldest first
    async fn list(&self) -> Result<Vec<Challenge>, StoreError>;

    /// Backend reachability
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Last successfully verified challenge per address
#[async_trait]
pub trait ReplayGuardStore: Send + Sync {
    async fn last_verified(&self, address: &WalletAddress)
        -> Result<Option<ReplayRecord>, StoreError>;

    async fn record_verification(
        &self,
        address: &WalletAddress,
        record: ReplayRecord,
    ) -> Result<(), StoreError>;
}
