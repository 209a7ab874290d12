//! Canonical content hashing of models and contexts.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 over a canonical JSON rendering of `value`.
///
/// The value is first lifted into `serde_json::Value`, whose object maps
/// are key-sorted, so two semantically identical documents hash
/// identically regardless of key insertion order, and any content change
/// changes the digest.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_string(&serde_json::to_value(value)?)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
