//! Per-address critical sections
//!
//! Verification of one address is serialised inside this process so two
//! duplicate submits cannot both pass the replay check. Cross-instance
//! exclusion comes from the store's compare-and-delete.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::address::WalletAddress;

/// Entries above this count trigger pruning of idle locks
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct AddressLocks {
    locks: Mutex<HashMap<WalletAddress, Arc<Mutex<()>>>>,
}

impl AddressLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `address`
    pub async fn acquire(&self, address: &WalletAddress) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;

            if locks.len() >= PRUNE_THRESHOLD {
                // Only the map holds an idle lock
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }

            locks.entry(address.clone()).or_default().clone()
        };

        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
