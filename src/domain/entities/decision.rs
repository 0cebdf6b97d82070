//! Audit entities: extraction attempts and arbitration decisions.

use serde_json::Value;

use super::source_type::SourceType;

/// Final classification of one registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    /// Fresh insert under a rule-derived key.
    NewInserted,
    /// Collision; the new, higher-priority data replaced the stored row.
    Replaced,
    /// Collision; the stored row outranked the new data, which was discarded.
    KeptExisting,
    /// Collision between equal-priority sources; most recent write applied.
    SameTypeDuplicate,
    /// Fresh insert under a fallback key because no rule covers the domain.
    UnconfiguredDomain,
    /// Fresh insert after rule extraction failed or the URL was unparsable.
    ExtractionFailed,
    /// Arbitration could not complete even after the retry.
    ArbitrationError,
}

impl DecisionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewInserted => "new_inserted",
            Self::Replaced => "replaced",
            Self::KeptExisting => "kept_existing",
            Self::SameTypeDuplicate => "same_type_duplicate",
            Self::UnconfiguredDomain => "unconfigured_domain",
            Self::ExtractionFailed => "extraction_failed",
            Self::ArbitrationError => "arbitration_error",
        }
    }
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit entry for one arbitration outcome.
///
/// Created once per registration attempt and never mutated or deleted; the
/// decision log, not exceptions, is how operators learn why a record was
/// replaced or kept.
#[derive(Debug, Clone)]
pub struct ConflictDecision {
    pub site_code: String,
    pub key_hash: Option<String>,
    pub kind: DecisionKind,
    pub new_source_type: SourceType,
    pub existing_source_type: Option<SourceType>,
    pub new_priority: i16,
    pub existing_priority: Option<i16>,
    /// Domain of the submitted URL; empty when the URL did not parse.
    pub domain: String,
    pub domain_had_rule: bool,
    /// Structured, human-auditable explanation of the outcome.
    pub reasoning: Value,
}

/// How the canonical key for an attempt was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    /// A configured rule produced the key.
    RuleKey,
    /// No rule covers the domain; the fallback normalizer produced the key.
    FallbackKey,
    /// A rule matched but extraction failed; fallback produced the key.
    FallbackAfterRuleFailure,
    /// The URL did not parse; no key could be derived.
    NoKey,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RuleKey => "rule_key",
            Self::FallbackKey => "fallback_key",
            Self::FallbackAfterRuleFailure => "fallback_after_rule_failure",
            Self::NoKey => "no_key",
        }
    }
}

/// Fine-grained audit entry for one extraction+upsert attempt.
///
/// Written even when no key could be derived; used for operational
/// debugging, not compliance review.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub url: String,
    pub site_code: String,
    pub canonical_key: Option<String>,
    pub status: AttemptStatus,
    pub metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_kind_labels_are_distinct() {
        let kinds = [
            DecisionKind::NewInserted,
            DecisionKind::Replaced,
            DecisionKind::KeptExisting,
            DecisionKind::SameTypeDuplicate,
            DecisionKind::UnconfiguredDomain,
            DecisionKind::ExtractionFailed,
            DecisionKind::ArbitrationError,
        ];
        let labels: std::collections::HashSet<_> = kinds.iter().map(|k| k.as_str()).collect();
        assert_eq!(labels.len(), kinds.len());
    }

    #[test]
    fn test_attempt_status_labels() {
        assert_eq!(AttemptStatus::RuleKey.as_str(), "rule_key");
        assert_eq!(AttemptStatus::NoKey.as_str(), "no_key");
    }
}
