//! Fallback normalization for URLs with no configured extraction rule.
//!
//! Produces a best-effort canonical key through deterministic parameter
//! filtering and alphabetical sorting. This is the guaranteed floor beneath
//! rule-based extraction: it never fails for a URL that parsed.

use crate::domain::entities::CanonicalKey;
use crate::utils::deny_list::DenyList;
use crate::utils::url_parts::UrlParts;

/// Builds a canonical key for a URL without (or after a failed) rule.
///
/// # Derivation
///
/// 1. Drop every query parameter whose name is on the deny-list
///    (pagination/search/sort/view noise). Blank values survive filtering.
/// 2. If parameters remain: sort `(name, value)` pairs alphabetically and
///    join as `name=value&...`, so keys are identical regardless of
///    original parameter order.
/// 3. If nothing remains but the path is non-root: `domain|path=<path>`.
/// 4. Otherwise: `domain|no_params`.
pub fn normalize(parts: &UrlParts, deny: &DenyList) -> CanonicalKey {
    let mut kept: Vec<&(String, String)> = parts
        .query
        .iter()
        .filter(|(name, _)| !deny.contains(name))
        .collect();

    if !kept.is_empty() {
        kept.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        let joined = kept
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        return CanonicalKey::new(&parts.domain, &joined);
    }

    if parts.has_meaningful_path() {
        return CanonicalKey::new(&parts.domain, &format!("path={}", parts.path));
    }

    CanonicalKey::new(&parts.domain, "no_params")
}
