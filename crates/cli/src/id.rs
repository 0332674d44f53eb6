// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Collision suffixes tried before giving up.
const MAX_SUFFIX: u32 = 1000;

/// Default prefix for draft ids when none is configured.
pub const DEFAULT_PREFIX: &str = "ds";

/// Generate a draft ID from prefix, payload, and timestamp.
/// Format: {prefix}-{hash} where hash is first 8 hex chars of SHA256(payload + timestamp)
pub fn generate_id(prefix: &str, payload: &serde_json::Value, created_at: &DateTime<Utc>) -> String {
    let input = format!("{}{}", payload, created_at.to_rfc3339());
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..4]);
    format!("{}-{}", prefix, short_hash)
}

/// Generate a unique ID, handling collisions by appending an incrementing suffix.
pub fn generate_unique_id<F>(
    prefix: &str,
    payload: &serde_json::Value,
    created_at: &DateTime<Utc>,
    exists: F,
) -> Result<String>
where
    F: Fn(&str) -> Result<bool>,
{
    let base_id = generate_id(prefix, payload, created_at);

    if !exists(&base_id)? {
        return Ok(base_id);
    }

    for suffix in 2..=MAX_SUFFIX {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id)? {
            return Ok(id);
        }
    }
    Err(Error::IdGenerationFailed)
}

/// Validate that a prefix is valid (2+ lowercase alphanumeric with at least one letter)
pub fn validate_prefix(prefix: &str) -> bool {
    prefix.len() >= 2
        && prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && prefix.chars().any(|c| c.is_ascii_lowercase())
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
