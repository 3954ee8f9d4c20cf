//! Hashing System - SHA-256 for Bundle Identity
//!
//! Seeds and checksums are pure functions of their inputs.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

/// Hex characters kept from the prompt hash as the seed.
pub const SEED_HEX_LEN: usize = 32;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// seed = first 32 hex chars of sha256(prompt_text)
pub fn derive_seed(prompt_text: &str) -> String {
    let mut digest = sha256_hex(prompt_text.as_bytes());
    digest.truncate(SEED_HEX_LEN);
    digest
}

/// inputs_checksum = sha256(canonical_json(spec snapshot))
pub fn inputs_checksum<T: Serialize>(spec: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(spec)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
