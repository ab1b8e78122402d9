//! Credential generation for provider API keys.
//!
//! Rotation replaces both of a provider's credentials with fresh 32-byte
//! secrets drawn from the operating system CSPRNG, encoded as lowercase hex.
//! Generation is fallible: if the random source errors the rotation must
//! abort before any state is touched, leaving the old keys authoritative.

use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

/// Entropy per generated credential.
pub const API_KEY_BYTES: usize = 32;

/// Crypto error types.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("secure random source failed: {0}")]
    RandomSource(#[from] rand::Error),
}

/// Generates one hex-encoded API credential.
pub fn generate_api_key() -> Result<String, CryptoError> {
    let mut bytes = [0u8; API_KEY_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}
