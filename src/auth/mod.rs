//! Authentication module for the guild
//!
//! Provides wallet-based authentication for Ethereum-style accounts.
//! - Challenge-response authentication with nonces
//! - EIP-191 personal_sign signature recovery
//! - Bearer and refresh token generation and validation

mod address;
mod challenge;
mod crypto;
mod jwt;
mod locks;
mod service;
pub mod sweeper;

pub use address::{AddressError, WalletAddress};
pub use challenge::{compose_message, generate_nonce, ChallengeService, NONCE_BYTES};
pub use crypto::{personal_message_hash, recover_signer, verify_personal_signature, CryptoError};
pub use jwt::{
    Claims, IssuedToken, JwtError, TokenClaims, TokenIssuer, TokenKind, TokenPair,
    EXPIRING_SOON_THRESHOLD_MS,
};
pub use locks::AddressLocks;
pub use service::{AuthError, AuthService, AuthSettings};
