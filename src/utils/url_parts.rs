//! URL decomposition into the pieces key extraction works with.
//!
//! Splits an announcement URL into a lowercase host, a path, and the decoded
//! query pairs in their original order. All downstream canonicalization
//! (rule-based and fallback) starts from this structure.

use url::Url;

/// Errors raised when a URL cannot be decomposed at all.
#[derive(Debug, thiserror::Error)]
pub enum MalformedUrl {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,
}

/// The structural pieces of a parsed announcement URL.
///
/// `query` preserves the original parameter order; canonical ordering is the
/// responsibility of the extraction and fallback layers, not the parser.
/// Parameters with blank values are retained.
#[derive(Debug, Clone)]
pub struct UrlParts {
    /// Lowercase host, without port.
    pub domain: String,
    /// URL path, `/` for bare domains.
    pub path: String,
    /// Decoded `(name, value)` query pairs in document order.
    pub query: Vec<(String, String)>,
}

impl UrlParts {
    /// Looks up the first query parameter with the given name.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if the path carries information beyond the root.
    pub fn has_meaningful_path(&self) -> bool {
        !self.path.is_empty() && self.path != "/"
    }
}

/// Decomposes a URL into domain, path, and query pairs.
///
/// # Normalization Rules
///
/// 1. **Protocol**: Only HTTP and HTTPS are accepted
/// 2. **Host**: Converted to lowercase; the port is dropped (identity does
///    not depend on it)
/// 3. **Query**: Percent-decoded, original order preserved, blank values kept
/// 4. **Fragments**: Ignored
///
/// # Errors
///
/// Returns [`MalformedUrl`] for URLs that cannot be parsed, carry a
/// non-HTTP(S) scheme, or have no host. Callers treat this as the
/// "structurally unparsable" case and fall through to raw-URL identity.
pub fn parse_url_parts(input: &str) -> Result<UrlParts, MalformedUrl> {
    let url = Url::parse(input).map_err(|e| MalformedUrl::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(MalformedUrl::UnsupportedProtocol),
    }

    let domain = url
        .host_str()
        .ok_or(MalformedUrl::MissingHost)?
        .to_ascii_lowercase();

    let query = url
        .query_pairs()
        .map(|(n, v)| (n.into_owned(), v.into_owned()))
        .collect();

    Ok(UrlParts {
        domain,
        path: url.path().to_string(),
        query,
    })
}
