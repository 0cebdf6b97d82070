//! Per-domain extraction rules loaded from the configuration store.

use regex::Regex;

/// How a rule derives the canonical key body from a URL.
///
/// A closed tagged union: each method carries exactly the data it needs, so
/// a rule can never be half-configured (a `QueryParams` rule without
/// parameters, a `PathPattern` rule without a pattern).
#[derive(Debug, Clone)]
pub enum ExtractionMethod {
    /// Identity lives in named query parameters, joined in the configured
    /// priority order.
    QueryParams { key_params: Vec<String> },
    /// Identity lives in the URL path; capture groups are joined with `_`.
    PathPattern { pattern: Regex },
    /// Both: path-derived and query-derived parts concatenated.
    Mixed { key_params: Vec<String>, pattern: Regex },
}

impl ExtractionMethod {
    /// Storage label for audit rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryParams { .. } => "query_params",
            Self::PathPattern { .. } => "path_pattern",
            Self::Mixed { .. } => "mixed",
        }
    }
}

/// One extraction rule scoped to a domain and optionally to a path.
///
/// A domain may have several active rules, one per path scope; lookup always
/// prefers a path-scoped rule over a domain-wide one.
#[derive(Debug, Clone)]
pub struct DomainRule {
    pub id: i64,
    /// Exact lowercase host this rule applies to.
    pub domain: String,
    /// Advisory site namespace from the config row.
    pub site_code: Option<String>,
    /// Raw `path_pattern` column value. Scope restriction for every method;
    /// also the capture pattern for `PathPattern`/`Mixed`.
    pub path_pattern: Option<String>,
    pub method: ExtractionMethod,
    pub is_active: bool,
}

impl DomainRule {
    /// Returns true if this rule's scope covers the given path.
    ///
    /// Domain-wide rules (no `path_pattern`) match every path. For
    /// `QueryParams` rules the pattern is a plain prefix; for regex-based
    /// methods the compiled pattern decides.
    pub fn matches_path(&self, path: &str) -> bool {
        let Some(raw) = &self.path_pattern else {
            return true;
        };
        match &self.method {
            ExtractionMethod::QueryParams { .. } => path.starts_with(raw.as_str()),
            ExtractionMethod::PathPattern { pattern }
            | ExtractionMethod::Mixed { pattern, .. } => pattern.is_match(path),
        }
    }

    /// Returns true if the rule is path-scoped (and therefore more specific
    /// than a domain-wide rule).
    pub fn is_path_scoped(&self) -> bool {
        self.path_pattern.is_some()
    }

    /// Specificity weight used to break ties among path-scoped matches:
    /// longer patterns are considered more specific.
    pub fn specificity(&self) -> usize {
        self.path_pattern.as_deref().map_or(0, str::len)
    }
}
