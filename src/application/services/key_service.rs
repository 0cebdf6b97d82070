//! Canonical key extraction: rule-based with guaranteed fallback.

use std::sync::Arc;

use metrics::counter;

use crate::application::services::RuleService;
use crate::domain::entities::{AttemptStatus, CanonicalKey, DomainRule, ExtractionMethod};
use crate::domain::repositories::RuleRepository;
use crate::error::RegistryError;
use crate::utils::deny_list::DenyList;
use crate::utils::fallback;
use crate::utils::url_parts::{parse_url_parts, UrlParts};

/// Why rule-based extraction could not produce a key.
///
/// Recovered locally by falling back to the normalizer; visible only in the
/// audit trail, never thrown to collector callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// A required query parameter was absent or blank. Partial keys are
    /// never produced; a silent partial identity is worse than an explicit
    /// failure.
    MissingRequiredParameter { param: String },
    /// The path capture pattern did not match the URL path.
    PatternMismatch,
}

impl ExtractionFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequiredParameter { .. } => "missing_required_parameter",
            Self::PatternMismatch => "pattern_mismatch",
        }
    }
}

/// How a resolved key was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOrigin {
    /// A configured rule produced the key.
    Rule,
    /// No rule covers the domain; the fallback normalizer produced the key.
    Fallback,
    /// A rule matched but failed; the fallback normalizer produced the key.
    FallbackAfterFailure(ExtractionFailure),
    /// The URL did not parse; no key exists.
    Unparsable,
}

/// The result of composite key resolution for one URL.
#[derive(Debug, Clone)]
pub struct KeyResolution {
    /// `None` only for structurally unparsable URLs.
    pub key: Option<CanonicalKey>,
    pub origin: KeyOrigin,
    /// Domain of the URL, when it parsed.
    pub domain: Option<String>,
    /// Id of the rule that matched, whether or not it succeeded.
    pub rule_id: Option<i64>,
}

impl KeyResolution {
    /// True when a configured rule covered the URL's domain and path.
    pub fn domain_had_rule(&self) -> bool {
        self.rule_id.is_some()
    }

    /// Attempt-log status label for this resolution.
    pub fn attempt_status(&self) -> AttemptStatus {
        match self.origin {
            KeyOrigin::Rule => AttemptStatus::RuleKey,
            KeyOrigin::Fallback => AttemptStatus::FallbackKey,
            KeyOrigin::FallbackAfterFailure(_) => AttemptStatus::FallbackAfterRuleFailure,
            KeyOrigin::Unparsable => AttemptStatus::NoKey,
        }
    }
}

/// Service turning raw announcement URLs into canonical keys.
///
/// The composite resolution almost always returns *some* key: rule-based
/// extraction where configured, the deterministic fallback everywhere else.
/// Only a structurally unparsable URL yields no key, and even that case is
/// reported, not raised.
pub struct KeyService<R: RuleRepository> {
    rules: Arc<RuleService<R>>,
    deny_list: DenyList,
}

impl<R: RuleRepository> KeyService<R> {
    /// Creates a key service over the given rule store.
    pub fn new(rules: Arc<RuleService<R>>, deny_list: DenyList) -> Self {
        Self { rules, deny_list }
    }

    /// Resolves a URL to its canonical key with full provenance.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LookupFailed`] only when the rule store
    /// itself fails; extraction problems fall back and are reported in the
    /// resolution's [`KeyOrigin`].
    pub async fn resolve(
        &self,
        url: &str,
        site_code: &str,
    ) -> Result<KeyResolution, RegistryError> {
        let parts = match parse_url_parts(url) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::debug!(url, site_code, error = %e, "URL did not parse; no key");
                counter!("dedup_keys_total", "origin" => "unparsable").increment(1);
                return Ok(KeyResolution {
                    key: None,
                    origin: KeyOrigin::Unparsable,
                    domain: None,
                    rule_id: None,
                });
            }
        };

        let rule = self.rules.get_rule(&parts.domain, &parts.path).await?;

        let resolution = match rule {
            Some(rule) => match extract_with_rule(&parts, &rule) {
                Ok(key) => KeyResolution {
                    key: Some(key),
                    origin: KeyOrigin::Rule,
                    domain: Some(parts.domain.clone()),
                    rule_id: Some(rule.id),
                },
                Err(failure) => {
                    tracing::debug!(
                        url,
                        rule_id = rule.id,
                        failure = failure.as_str(),
                        "Rule extraction failed; using fallback key"
                    );
                    KeyResolution {
                        key: Some(fallback::normalize(&parts, &self.deny_list)),
                        origin: KeyOrigin::FallbackAfterFailure(failure),
                        domain: Some(parts.domain.clone()),
                        rule_id: Some(rule.id),
                    }
                }
            },
            None => KeyResolution {
                key: Some(fallback::normalize(&parts, &self.deny_list)),
                origin: KeyOrigin::Fallback,
                domain: Some(parts.domain.clone()),
                rule_id: None,
            },
        };

        counter!("dedup_keys_total", "origin" => origin_label(&resolution.origin)).increment(1);
        Ok(resolution)
    }

    /// Public composite operation: the canonical key string for a URL, or
    /// `None` for an unparsable URL.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LookupFailed`] when the rule store fails.
    pub async fn extract_url_key(
        &self,
        url: &str,
        site_code: &str,
    ) -> Result<Option<String>, RegistryError> {
        Ok(self.resolve(url, site_code).await?.key.map(String::from))
    }

    /// Batch key extraction for diagnostics and reprocessing sweeps.
    ///
    /// There is no per-item error channel, so a rule-store failure degrades
    /// to the fallback key with a warning instead of poisoning the batch.
    pub async fn bulk_extract(&self, urls: &[String]) -> Vec<(String, Option<String>)> {
        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            let key = match self.resolve(url, "").await {
                Ok(resolution) => resolution.key.map(String::from),
                Err(e) => {
                    tracing::warn!(url, error = %e, "Rule lookup failed; using fallback key");
                    parse_url_parts(url)
                        .ok()
                        .map(|parts| fallback::normalize(&parts, &self.deny_list).into())
                }
            };
            results.push((url.clone(), key));
        }
        results
    }
}

fn origin_label(origin: &KeyOrigin) -> &'static str {
    match origin {
        KeyOrigin::Rule => "rule",
        KeyOrigin::Fallback => "fallback",
        KeyOrigin::FallbackAfterFailure(_) => "fallback_after_failure",
        KeyOrigin::Unparsable => "unparsable",
    }
}

/// Applies a rule to a parsed URL.
fn extract_with_rule(
    parts: &UrlParts,
    rule: &DomainRule,
) -> Result<CanonicalKey, ExtractionFailure> {
    let body = match &rule.method {
        ExtractionMethod::QueryParams { key_params } => query_body(parts, key_params)?,
        ExtractionMethod::PathPattern { pattern } => path_body(parts, pattern)?,
        ExtractionMethod::Mixed { key_params, pattern } => {
            match (path_body(parts, pattern), query_body(parts, key_params)) {
                (Ok(path_part), Ok(query_part)) => format!("{path_part}&{query_part}"),
                (Ok(path_part), Err(_)) => path_part,
                (Err(_), Ok(query_part)) => query_part,
                (Err(failure), Err(_)) => return Err(failure),
            }
        }
    };

    Ok(CanonicalKey::new(&parts.domain, &body))
}

/// Joins the configured parameters as `name=value` pairs in the configured
/// priority order (deliberately not sorted; this order is the rule
/// author's, unlike the alphabetical fallback path).
fn query_body(parts: &UrlParts, key_params: &[String]) -> Result<String, ExtractionFailure> {
    let mut pairs = Vec::with_capacity(key_params.len());
    for name in key_params {
        match parts.query_value(name) {
            Some(value) if !value.is_empty() => pairs.push(format!("{name}={value}")),
            _ => {
                return Err(ExtractionFailure::MissingRequiredParameter {
                    param: name.clone(),
                })
            }
        }
    }
    Ok(pairs.join("&"))
}

/// Joins the pattern's capture groups with `_`; a pattern without capture
/// groups contributes its whole match.
fn path_body(parts: &UrlParts, pattern: &regex::Regex) -> Result<String, ExtractionFailure> {
    let captures = pattern
        .captures(&parts.path)
        .ok_or(ExtractionFailure::PatternMismatch)?;

    let groups: Vec<&str> = captures
        .iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str())
        .collect();

    if groups.is_empty() {
        return Ok(captures
            .get(0)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default());
    }

    Ok(groups.join("_"))
}
