//! Content checksums for blob integrity.
//!
//! Checksums are SHA-256 digests rendered as 64-character lowercase hex.
//! They are computed at write time and stored next to the file metadata;
//! reads may re-verify and must report a mismatch instead of silently
//! correcting it.

use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::result::AppResult;

/// Compute the SHA-256 digest of `data` as a lowercase hex string.
pub fn digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Whether `data` digests to `expected`.
pub fn matches(expected: &str, data: &[u8]) -> bool {
    digest(data) == expected
}

/// Verify `data` against a stored checksum.
pub fn verify(expected: &str, data: &[u8]) -> AppResult<()> {
    let actual = digest(data);
    if actual == expected {
        Ok(())
    } else {
        Err(AppError::integrity(format!(
            "Checksum mismatch: stored {expected}, content digests to {actual}"
        )))
    }
}
