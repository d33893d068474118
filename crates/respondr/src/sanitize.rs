//! Helpers for sanitizing data before it enters tracing span attributes.
//!
//! Object keys usually start with an organization id and may contain
//! personal names; spans only ever carry the final path segment or a hash.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Returns only the final segment of an object key.
pub fn redact_key(key: &str) -> String {
    match key.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "<unknown>".to_string(),
    }
}

/// Returns a short deterministic hash of a key for correlating log lines
/// about the same object.
pub fn hash_key(key: &str) -> String {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
