//! Wallet address canonicalisation
//!
//! Accounts are identified by `0x` followed by 40 hex digits. Checksummed
//! (mixed-case) input is accepted and folded to lowercase, which is the only
//! form used as a storage key or token subject.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Address validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address is required")]
    Empty,

    #[error("Invalid address format: expected 0x followed by 40 hex characters")]
    InvalidFormat,
}

/// Lowercased account address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Validate and canonicalise an address string
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        if raw.is_empty() {
            return Err(AddressError::Empty);
        }

        let digits = raw.strip_prefix("0x").ok_or(AddressError::InvalidFormat)?;
        if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidFormat);
        }

        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Build from raw 20 address bytes
    pub fn from_bytes(bytes: &[u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
