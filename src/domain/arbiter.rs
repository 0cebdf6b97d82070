//! Conflict arbitration between competing writes for one canonical key.
//!
//! Pure logic, no I/O: replaying the same comparison twice yields the same
//! decision, which is what makes the registry's retry-on-conflict safe.

use serde_json::json;

use crate::domain::entities::{DecisionKind, NewRecord, RegistryRecord};

/// Outcome of comparing a new write against the stored row it collided with.
#[derive(Debug, Clone)]
pub struct Arbitration {
    pub kind: DecisionKind,
    /// When true, the new data replaces the stored row.
    pub apply_new: bool,
    /// Structured explanation for the decision log.
    pub reasoning: serde_json::Value,
}

/// Decides whether a colliding write replaces the stored record.
///
/// Ranking comes from the total order on
/// [`crate::domain::entities::SourceType`]:
///
/// - strictly higher new priority: replace (`Replaced`)
/// - equal priority: replace, most-recent-wins (`SameTypeDuplicate`)
/// - strictly lower: keep the stored row untouched (`KeptExisting`)
pub fn arbitrate(new: &NewRecord, existing: &RegistryRecord) -> Arbitration {
    let new_priority = new.source_type.priority();
    let existing_priority = existing.source_type.priority();

    let (kind, apply_new, summary) = match new_priority.cmp(&existing_priority) {
        std::cmp::Ordering::Greater => (
            DecisionKind::Replaced,
            true,
            "new source outranks stored source",
        ),
        std::cmp::Ordering::Equal => (
            DecisionKind::SameTypeDuplicate,
            true,
            "equal trust; most recent write wins",
        ),
        std::cmp::Ordering::Less => (
            DecisionKind::KeptExisting,
            false,
            "stored source outranks new source",
        ),
    };

    Arbitration {
        kind,
        apply_new,
        reasoning: json!({
            "summary": summary,
            "new_source_type": new.source_type.as_str(),
            "existing_source_type": existing.source_type.as_str(),
            "new_priority": new_priority,
            "existing_priority": existing_priority,
            "existing_record_id": existing.id,
            "new_origin_url": new.origin_url,
            "existing_origin_url": existing.origin_url,
        }),
    }
}

/// Cross-source suppression predicate.
///
/// True when an existing, strictly higher-trust record already lists the new
/// write's origin URL as its secondary URL: an aggregator re-surfacing a
/// URL a direct scraper captured. Such writes are discarded outright,
/// regardless of the ranking above, so a trusted primary capture is never
/// displaced by a redundant discovery path.
pub fn is_suppressed_by(new: &NewRecord, existing: &RegistryRecord) -> bool {
    existing.source_type > new.source_type
        && existing
            .secondary_url
            .as_deref()
            .is_some_and(|secondary| secondary == new.origin_url)
}
