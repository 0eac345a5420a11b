//! Options bundle hashing
//!
//! The hash is a SHA-256 over the serialized bundle followed by a schema
//! tag. Bumping the tag changes every hash even when the data is identical,
//! which invalidates client caches across bundle layout changes.

use sha2::{Digest, Sha256};

/// Schema tag mixed into every options hash
pub const OPTIONS_HASH_VERSION: &str = "Options Hash V1";

/// Hex SHA-256 of `content` followed by `tag`.
pub fn compute_tagged_hash(content: &str, tag: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(tag.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash of a serialized options bundle.
pub fn compute_options_hash(json: &str) -> String {
    compute_tagged_hash(json, OPTIONS_HASH_VERSION)
}
