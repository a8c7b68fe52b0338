//! Content fingerprinting for duplicate-upload detection.

use sha2::{Digest, Sha256};

/// SHA-256 of the raw track text as a lowercase hex string.
///
/// Byte-for-byte identical uploads always fingerprint identically, which is
/// what the store keys duplicate rejection on. Pure and deterministic.
pub fn content_fingerprint(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}
