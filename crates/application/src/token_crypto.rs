use std::fmt::Write;

use pls_core::{AppError, AppResult};
use sha2::{Digest, Sha256};

/// Generates a random API token secret and its SHA-256 hash.
///
/// Returns `(raw_secret_hex, sha256_hash_hex)`.
pub(crate) fn generate_token() -> AppResult<(String, String)> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate api token: {error}")))?;

    let raw_secret = to_hex(&bytes);
    let hash = hash_token(&raw_secret);
    Ok((raw_secret, hash))
}

/// Computes the storage hash of a raw token secret.
#[must_use]
pub fn hash_token(raw_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_secret.as_bytes());
    to_hex(&hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
