//! Canonical key: the deterministic string identity of an announcement URL.

use sha2::{Digest, Sha256};

/// A canonical, order-independent identity string for an announcement URL.
///
/// Keys take the form `domain|<body>`, where the body is derived either from
/// a configured extraction rule or from the fallback normalizer. For a fixed
/// rule and fixed effective parameter values the key is byte-identical
/// regardless of how the original URL was formatted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Builds a key from a domain and a pre-canonicalized body.
    pub fn new(domain: &str, body: &str) -> Self {
        Self(format!("{domain}|{body}"))
    }

    /// Identity for a URL that could not be parsed at all.
    ///
    /// The raw URL string is the only stable identity available, so
    /// byte-identical resubmissions dedupe while distinct unparsable URLs
    /// never merge.
    pub fn from_raw_url(url: &str) -> Self {
        Self(format!("unparsed|{url}"))
    }

    /// The key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Content hash of the key, used as the physical uniqueness constraint.
    ///
    /// Equivalent keys always hash identically; the hash is derived, never
    /// set independently.
    pub fn hash(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(digest)
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CanonicalKey> for String {
    fn from(key: CanonicalKey) -> Self {
        key.0
    }
}
