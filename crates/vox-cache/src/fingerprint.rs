//! Content fingerprints and `If-None-Match` evaluation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Strong validator over an ordered list of identity fields.
///
/// Fields are length-prefixed before hashing so `["ab", "c"]` and
/// `["a", "bc"]` never collide. The result is a quoted HTTP entity tag.
pub fn fingerprint<S: AsRef<str>>(fields: &[S]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        let bytes = field.as_ref().as_bytes();
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(bytes);
    }
    quote(&hasher.finalize())
}

/// Strong validator over raw bytes.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    quote(&Sha256::digest(bytes))
}

fn quote(digest: &[u8]) -> String {
    format!("\"{}\"", URL_SAFE_NO_PAD.encode(digest))
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Accepts a comma-separated list, weak (`W/`) tags on either side, and `*`.
pub fn validator_matches(if_none_match: &str, etag: &str) -> bool {
    let wanted = strip_weak(etag.trim());
    if_none_match
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .any(|candidate| candidate == "*" || strip_weak(candidate) == wanted)
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}
