//! Ethereum personal_sign signature verification
//!
//! Recovers the signing account from an EIP-191 personal-sign signature, the
//! scheme browser wallets use for `personal_sign` / `signMessage`.

use alloy_primitives::{keccak256, Signature, B256};
use thiserror::Error;

use super::address::WalletAddress;

/// Errors that can occur during signature verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signature does not match the claimed address")]
    SignerMismatch,
}

/// Hash a message the way wallets do before signing it
///
/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`
pub fn personal_message_hash(message: &str) -> B256 {
    let mut prefixed = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    prefixed.extend_from_slice(message.as_bytes());
    keccak256(prefixed)
}

/// Recover the address that produced `signature_hex` over `message`
///
/// # Arguments
/// * `message` - The exact text that was shown to and signed by the wallet
/// * `signature_hex` - 65-byte `r || s || v` signature, hex encoded, `0x` optional
pub fn recover_signer(message: &str, signature_hex: &str) -> Result<WalletAddress, CryptoError> {
    let trimmed = signature_hex.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    let bytes = hex::decode(digits)
        .map_err(|e| CryptoError::MalformedSignature(format!("invalid hex: {}", e)))?;

    if bytes.len() != 65 {
        return Err(CryptoError::MalformedSignature(format!(
            "expected 65 bytes, got {}",
            bytes.len()
        )));
    }

    let signature = Signature::try_from(bytes.as_slice())
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;

    let recovered = signature
        .recover_address_from_prehash(&personal_message_hash(message))
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;

    Ok(WalletAddress::from_bytes(&recovered.0.0))
}

/// Check that `signature_hex` over `message` was produced by `claimed`
pub fn verify_personal_signature(
    claimed: &WalletAddress,
    message: &str,
    signature_hex: &str,
) -> Result<(), CryptoError> {
    let recovered = recover_signer(message, signature_hex)?;

    // Both sides are canonical lowercase
    if &recovered != claimed {
        return Err(CryptoError::SignerMismatch);
    }

    Ok(())
}
