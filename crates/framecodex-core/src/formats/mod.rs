//! # Output Formats
//!
//! Byte-stable serialization shared by reports, receipts and the CLI.
//!
//! Format: JSON with every object's keys sorted, compact separators
//! (`,` and `:`), non-ASCII characters kept as UTF-8, and exactly one
//! trailing newline. Two runs over the same input produce the same bytes,
//! so report files can be diffed and hashed.
//!
//! Hashes are lowercase hex SHA-256.

use crate::types::FrameError;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

// =============================================================================
// HASHING
// =============================================================================

/// Hex SHA-256 of raw bytes.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hex SHA-256 of a string's UTF-8 bytes.
#[must_use]
pub fn sha256_text(s: &str) -> String {
    sha256_hex(s.as_bytes())
}

// =============================================================================
// STABLE JSON
// =============================================================================

/// Rebuild a value with every object's keys in sorted order.
///
/// Maps keep insertion order, so sorting has to happen on the value itself
/// rather than in the serializer.
#[must_use]
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key, canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serialize to stable JSON text.
pub fn stable_json<T: Serialize + ?Sized>(value: &T) -> Result<String, FrameError> {
    let value = serde_json::to_value(value)
        .map_err(|e| FrameError::SerializationError(e.to_string()))?;
    let text = serde_json::to_string(&canonicalize(value))
        .map_err(|e| FrameError::SerializationError(e.to_string()))?;
    Ok(text + "\n")
}

/// Serialize to indented JSON with sorted keys, for human-facing files
/// such as DocIR dumps.
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, FrameError> {
    let value = serde_json::to_value(value)
        .map_err(|e| FrameError::SerializationError(e.to_string()))?;
    let text = serde_json::to_string_pretty(&canonicalize(value))
        .map_err(|e| FrameError::SerializationError(e.to_string()))?;
    Ok(text + "\n")
}

/// Hex SHA-256 of a value's stable JSON.
pub fn stable_sha256<T: Serialize + ?Sized>(value: &T) -> Result<String, FrameError> {
    Ok(sha256_text(&stable_json(value)?))
}

// =============================================================================
// TESTS
// =============================================================================
