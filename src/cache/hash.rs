//! Hashing for cache keys.

use sha2::{Digest, Sha256};

/// SHA-256 of a metadata source identity as 64 lowercase hex characters.
///
/// Source identities may embed credentials (query-string tokens, user info
/// in URLs), so only the digest is ever written to the cache.
pub fn hash_source(source_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    format!("{:x}", hasher.finalize())
}
