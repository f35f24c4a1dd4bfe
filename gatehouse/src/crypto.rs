//! Argon2id password hashing and verification.
//!
//! Hashes are serialized in the PHC-style form
//! `$argon2id$v=19$m=65536,t=1,p=4$<salt>$<hash>` with unpadded standard
//! base64 for the salt and hash segments. Parameters are fixed: there is no
//! per-hash negotiation, so the verification path never branches on policy.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Argon2id iteration count.
const ARGON_TIME: u32 = 1;
/// Argon2id memory cost in KiB (64 MiB).
const ARGON_MEMORY: u32 = 64 * 1024;
/// Argon2id lane count.
const ARGON_LANES: u32 = 4;
/// Derived key length in bytes.
const ARGON_KEY_LEN: usize = 32;
/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The stored hash string does not match the expected PHC form
    #[error("invalid argon2id hash format")]
    InvalidHash,

    /// The OS random source failed while drawing a salt
    #[error("failed to generate salt: {0}")]
    Rng(rand::Error),

    /// The Argon2id computation itself failed
    #[error("argon2 computation failed")]
    Hashing,
}

fn argon2() -> Result<Argon2<'static>, CryptoError> {
    let params = Params::new(ARGON_MEMORY, ARGON_TIME, ARGON_LANES, Some(ARGON_KEY_LEN))
        .map_err(|_| CryptoError::Hashing)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with a fresh 16-byte salt.
///
/// Deterministic in everything except the salt. Returns the PHC-style
/// serialized string.
///
/// # Errors
///
/// * `CryptoError::Rng` - OS random source failed
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut salt).map_err(CryptoError::Rng)?;

    let mut hash = [0u8; ARGON_KEY_LEN];
    argon2()?
        .hash_password_into(password.as_bytes(), &salt, &mut hash)
        .map_err(|_| CryptoError::Hashing)?;

    Ok(encode_hash(&salt, &hash))
}

/// Verify a password against a stored PHC-style hash.
///
/// Recomputes Argon2id with the embedded salt and compares the 32-byte
/// outputs in constant time, so a mismatch never short-circuits on the
/// first differing byte.
///
/// # Errors
///
/// * `CryptoError::InvalidHash` - stored hash is malformed
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, CryptoError> {
    let (salt, expected) = decode_hash(stored_hash)?;

    let mut hash = [0u8; ARGON_KEY_LEN];
    argon2()?
        .hash_password_into(password.as_bytes(), &salt, &mut hash)
        .map_err(|_| CryptoError::Hashing)?;

    Ok(hash[..].ct_eq(&expected[..]).into())
}

fn encode_hash(salt: &[u8], hash: &[u8]) -> String {
    format!(
        "$argon2id$v={}$m={},t={},p={}${}${}",
        Version::V0x13 as u32,
        ARGON_MEMORY,
        ARGON_TIME,
        ARGON_LANES,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash),
    )
}

fn decode_hash(encoded: &str) -> Result<([u8; SALT_LEN], [u8; ARGON_KEY_LEN]), CryptoError> {
    // Expected: ["", "argon2id", "v=19", "m=65536,t=1,p=4", "<salt>", "<hash>"]
    let parts: Vec<&str> = encoded.split('$').collect();
    if parts.len() != 6 {
        return Err(CryptoError::InvalidHash);
    }
    if parts[1] != "argon2id" {
        return Err(CryptoError::InvalidHash);
    }

    let salt_bytes = STANDARD_NO_PAD
        .decode(parts[4])
        .map_err(|_| CryptoError::InvalidHash)?;
    let hash_bytes = STANDARD_NO_PAD
        .decode(parts[5])
        .map_err(|_| CryptoError::InvalidHash)?;

    let salt: [u8; SALT_LEN] = salt_bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidHash)?;
    let hash: [u8; ARGON_KEY_LEN] = hash_bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidHash)?;

    Ok((salt, hash))
}
