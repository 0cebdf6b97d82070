//! Registration service: identity resolution, atomic upsert, arbitration,
//! and audit logging for one collector submission.

use std::sync::Arc;

use metrics::counter;
use serde_json::json;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use crate::application::services::key_service::{KeyOrigin, KeyResolution, KeyService};
use crate::domain::arbiter;
use crate::domain::entities::{
    CanonicalKey, ConflictDecision, DecisionKind, ExtractionAttempt, NewAnnouncement, NewRecord,
    RegistryRecord, UpsertOutcome,
};
use crate::domain::repositories::{AuditRepository, RegistryRepository, RuleRepository};
use crate::error::RegistryError;

/// Delay before the single conflict retry.
const RETRY_DELAY_MS: u64 = 25;

/// What a registration attempt did, as reported to the collector.
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    /// True when the submitted data is now the stored version.
    pub accepted: bool,
    pub decision: DecisionKind,
    /// Id of the row holding the identity after this call.
    pub record_id: Option<i64>,
    /// Id of the pre-existing row, on collision or suppression, so the
    /// caller can cross-reference.
    pub existing_record_id: Option<i64>,
}

/// One settled registration, before audit logging.
struct Settled {
    kind: DecisionKind,
    accepted: bool,
    record_id: i64,
    existing: Option<RegistryRecord>,
    reasoning: serde_json::Value,
}

/// Orchestrates the full dedup write path.
///
/// Per submission: resolve the canonical key, log the attempt, check
/// cross-source suppression, run the atomic upsert, arbitrate on collision,
/// apply or discard, and append the decision to the audit ledger. Audit
/// failures never disturb the registry write; persistence conflicts are
/// retried exactly once (the upsert is idempotent per key and arbitration
/// is deterministic, so a replay converges).
pub struct RegistryService<R, G, A>
where
    R: RuleRepository,
    G: RegistryRepository,
    A: AuditRepository,
{
    keys: Arc<KeyService<R>>,
    registry: Arc<G>,
    audit: Arc<A>,
}

impl<R, G, A> RegistryService<R, G, A>
where
    R: RuleRepository,
    G: RegistryRepository,
    A: AuditRepository,
{
    /// Creates a registration service.
    pub fn new(keys: Arc<KeyService<R>>, registry: Arc<G>, audit: Arc<A>) -> Self {
        Self {
            keys,
            registry,
            audit,
        }
    }

    /// Registers one collector submission.
    ///
    /// Data is never silently dropped: even an unparsable URL is stored
    /// under a raw-URL identity and tagged in the audit trail. Lower-trust
    /// collisions are discarded loudly (decision log), not errored.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LookupFailed`] when the rule store is down,
    /// [`RegistryError::Storage`] when the registry write fails, and
    /// [`RegistryError::Arbitration`] when a persistence conflict survives
    /// the retry. Extraction-level problems are not errors.
    pub async fn register(
        &self,
        submission: NewAnnouncement,
    ) -> Result<RegisterOutcome, RegistryError> {
        let resolution = self
            .keys
            .resolve(&submission.url, &submission.site_code)
            .await?;

        let key = resolution
            .key
            .clone()
            .unwrap_or_else(|| CanonicalKey::from_raw_url(&submission.url));
        let record = NewRecord::from_submission(submission, &key);

        self.log_attempt(&record, &resolution).await;

        if let Some(existing) = self
            .registry
            .find_by_secondary_url(&record.site_code, &record.origin_url)
            .await?
        {
            if arbiter::is_suppressed_by(&record, &existing) {
                return Ok(self.settle_suppressed(&record, &resolution, existing).await);
            }
        }

        let strategy = FixedInterval::from_millis(RETRY_DELAY_MS).take(1);
        let attempt = RetryIf::spawn(
            strategy,
            || self.register_once(&record, &resolution),
            RegistryError::is_persistence_conflict,
        )
        .await;

        match attempt {
            Ok(settled) => {
                self.log_decision(&record, &resolution, &settled).await;
                counter!("dedup_decisions_total", "kind" => settled.kind.as_str()).increment(1);
                Ok(RegisterOutcome {
                    accepted: settled.accepted,
                    decision: settled.kind,
                    record_id: Some(settled.record_id),
                    existing_record_id: settled.existing.map(|e| e.id),
                })
            }
            Err(RegistryError::PersistenceConflict(message)) => {
                let settled = Settled {
                    kind: DecisionKind::ArbitrationError,
                    accepted: false,
                    record_id: 0,
                    existing: None,
                    reasoning: json!({
                        "summary": "persistence conflict survived the retry",
                        "conflict": message,
                    }),
                };
                self.log_decision(&record, &resolution, &settled).await;
                counter!("dedup_decisions_total", "kind" => "arbitration_error").increment(1);
                Err(RegistryError::arbitration(
                    "persistence conflict survived the retry",
                    json!({ "conflict": message, "key_hash": record.key_hash }),
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// One upsert + arbitration pass. Retried by `register` when it hits a
    /// persistence conflict.
    async fn register_once(
        &self,
        record: &NewRecord,
        resolution: &KeyResolution,
    ) -> Result<Settled, RegistryError> {
        match self.registry.upsert(record).await? {
            UpsertOutcome::Inserted(stored) => Ok(Settled {
                kind: insert_kind(&resolution.origin),
                accepted: true,
                record_id: stored.id,
                existing: None,
                reasoning: json!({
                    "summary": "no existing row for this identity",
                    "key_origin": origin_label(&resolution.origin),
                }),
            }),
            UpsertOutcome::Collided { existing } => {
                let arbitration = arbiter::arbitrate(record, &existing);
                let record_id = if arbitration.apply_new {
                    // Conditional on the state arbitration compared
                    // against; a concurrent commit fails it and the retry
                    // re-arbitrates against the fresh row.
                    self.registry
                        .replace(existing.id, existing.source_type, record)
                        .await?
                        .id
                } else {
                    existing.id
                };
                Ok(Settled {
                    kind: arbitration.kind,
                    accepted: arbitration.apply_new,
                    record_id,
                    existing: Some(existing),
                    reasoning: arbitration.reasoning,
                })
            }
        }
    }

    /// Settles a write discarded by the cross-source suppression rule.
    async fn settle_suppressed(
        &self,
        record: &NewRecord,
        resolution: &KeyResolution,
        existing: RegistryRecord,
    ) -> RegisterOutcome {
        tracing::debug!(
            site_code = %record.site_code,
            origin_url = %record.origin_url,
            existing_id = existing.id,
            "Suppressed: origin URL already captured as a higher-trust secondary URL"
        );
        let settled = Settled {
            kind: DecisionKind::KeptExisting,
            accepted: false,
            record_id: existing.id,
            existing: Some(existing),
            reasoning: json!({
                "summary": "origin URL equals the secondary URL of a higher-trust record",
                "suppression": "secondary_url",
            }),
        };
        self.log_decision(record, resolution, &settled).await;
        counter!("dedup_decisions_total", "kind" => "suppressed").increment(1);
        RegisterOutcome {
            accepted: false,
            decision: DecisionKind::KeptExisting,
            record_id: Some(settled.record_id),
            existing_record_id: settled.existing.map(|e| e.id),
        }
    }

    /// Appends to the attempt log; failures are logged and swallowed.
    async fn log_attempt(&self, record: &NewRecord, resolution: &KeyResolution) {
        let attempt = ExtractionAttempt {
            url: record.origin_url.clone(),
            site_code: record.site_code.clone(),
            canonical_key: resolution.key.as_ref().map(|k| k.as_str().to_string()),
            status: resolution.attempt_status(),
            metadata: json!({
                "source_type": record.source_type.as_str(),
                "rule_id": resolution.rule_id,
                "key_origin": origin_label(&resolution.origin),
            }),
        };
        if let Err(e) = self.audit.append_attempt(&attempt).await {
            counter!("dedup_audit_write_failures_total", "stream" => "attempt").increment(1);
            tracing::error!(url = %attempt.url, error = %e, "Attempt log write failed");
        }
    }

    /// Appends to the decision log; failures are logged and swallowed.
    /// Observability must never roll back the registry write.
    async fn log_decision(
        &self,
        record: &NewRecord,
        resolution: &KeyResolution,
        settled: &Settled,
    ) {
        let decision = ConflictDecision {
            site_code: record.site_code.clone(),
            key_hash: Some(record.key_hash.clone()),
            kind: settled.kind,
            new_source_type: record.source_type,
            existing_source_type: settled.existing.as_ref().map(|e| e.source_type),
            new_priority: record.source_type.priority(),
            existing_priority: settled.existing.as_ref().map(|e| e.source_type.priority()),
            domain: resolution.domain.clone().unwrap_or_default(),
            domain_had_rule: resolution.domain_had_rule(),
            reasoning: settled.reasoning.clone(),
        };
        if let Err(e) = self.audit.append_decision(&decision).await {
            counter!("dedup_audit_write_failures_total", "stream" => "decision").increment(1);
            tracing::error!(
                site_code = %decision.site_code,
                kind = decision.kind.as_str(),
                error = %e,
                "Decision log write failed"
            );
        }
    }
}

/// Decision kind for a fresh insert, tagged by how the key was obtained so
/// operators can find identities worth a proper rule.
fn insert_kind(origin: &KeyOrigin) -> DecisionKind {
    match origin {
        KeyOrigin::Rule => DecisionKind::NewInserted,
        KeyOrigin::Fallback => DecisionKind::UnconfiguredDomain,
        KeyOrigin::FallbackAfterFailure(_) | KeyOrigin::Unparsable => {
            DecisionKind::ExtractionFailed
        }
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
