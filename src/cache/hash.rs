//! Content hashing for node identity and cache keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::ModelResult;

/// Compute SHA256 hash of a serializable value.
///
/// The value is serialized to JSON before hashing, ensuring deterministic output.
/// Returns a 64-character lowercase hexadecimal string.
///
/// # Errors
/// Returns `Serialization` if the value cannot be serialized to JSON.
pub fn compute_hash<T: Serialize>(value: &T) -> ModelResult<String> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
