#![allow(dead_code)]

//! In-memory repository fakes mirroring the PostgreSQL semantics, so the
//! end-to-end flows run hermetically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use announce_dedup::domain::entities::{
    ConflictDecision, DomainRule, ExtractionAttempt, ExtractionMethod, NewAnnouncement, NewRecord,
    RegistryRecord, SourceType, UpsertOutcome,
};
use announce_dedup::domain::repositories::{AuditRepository, RegistryRepository, RuleRepository};
use announce_dedup::error::RegistryError;
use announce_dedup::prelude::{KeyService, RegistryService, RuleService};
use announce_dedup::utils::deny_list::DenyList;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

/// Rule store fake: domain → active rules, swappable mid-test.
#[derive(Default)]
pub struct MemRuleRepository {
    rules: Mutex<HashMap<String, Vec<DomainRule>>>,
}

impl MemRuleRepository {
    pub fn with_rules(rules: Vec<DomainRule>) -> Self {
        let mut map: HashMap<String, Vec<DomainRule>> = HashMap::new();
        for rule in rules {
            map.entry(rule.domain.clone()).or_default().push(rule);
        }
        Self {
            rules: Mutex::new(map),
        }
    }

    pub fn replace_rules(&self, rules: Vec<DomainRule>) {
        let mut map: HashMap<String, Vec<DomainRule>> = HashMap::new();
        for rule in rules {
            map.entry(rule.domain.clone()).or_default().push(rule);
        }
        *self.rules.lock() = map;
    }
}

#[async_trait]
impl RuleRepository for MemRuleRepository {
    async fn fetch_rules(&self, domain: &str) -> Result<Vec<DomainRule>, RegistryError> {
        Ok(self.rules.lock().get(domain).cloned().unwrap_or_default())
    }
}

/// Registry fake with the same insert-or-collide semantics as the
/// `(site_code, key_hash)` unique constraint.
#[derive(Default)]
pub struct MemRegistryRepository {
    rows: Mutex<HashMap<(String, String), RegistryRecord>>,
    next_id: AtomicI64,
}

impl MemRegistryRepository {
    pub fn rows(&self) -> Vec<RegistryRecord> {
        self.rows.lock().values().cloned().collect()
    }

    pub fn row_for_key(&self, site_code: &str, key_hash: &str) -> Option<RegistryRecord> {
        self.rows
            .lock()
            .get(&(site_code.to_string(), key_hash.to_string()))
            .cloned()
    }
}

#[async_trait]
impl RegistryRepository for MemRegistryRepository {
    async fn upsert(&self, record: &NewRecord) -> Result<UpsertOutcome, RegistryError> {
        let mut rows = self.rows.lock();
        let key = (record.site_code.clone(), record.key_hash.clone());
        if let Some(existing) = rows.get(&key) {
            return Ok(UpsertOutcome::Collided {
                existing: existing.clone(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = RegistryRecord {
            id,
            site_code: record.site_code.clone(),
            source_type: record.source_type,
            origin_url: record.origin_url.clone(),
            secondary_url: record.secondary_url.clone(),
            canonical_key: record.canonical_key.clone(),
            key_hash: record.key_hash.clone(),
            payload_ref: record.payload_ref.clone(),
            collected_at: record.collected_at,
            updated_at: Utc::now(),
        };
        rows.insert(key, stored.clone());
        Ok(UpsertOutcome::Inserted(stored))
    }

    async fn replace(
        &self,
        id: i64,
        expected: SourceType,
        record: &NewRecord,
    ) -> Result<RegistryRecord, RegistryError> {
        let mut rows = self.rows.lock();
        let row = rows
            .values_mut()
            .find(|r| r.id == id && r.source_type == expected)
            .ok_or_else(|| {
                RegistryError::PersistenceConflict(format!(
                    "replacement target {id} changed concurrently or no longer exists"
                ))
            })?;

        row.source_type = record.source_type;
        row.origin_url = record.origin_url.clone();
        row.secondary_url = record.secondary_url.clone();
        row.payload_ref = record.payload_ref.clone();
        row.collected_at = record.collected_at;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn find_by_key(
        &self,
        site_code: &str,
        key_hash: &str,
    ) -> Result<Option<RegistryRecord>, RegistryError> {
        Ok(self.row_for_key(site_code, key_hash))
    }

    async fn find_by_secondary_url(
        &self,
        site_code: &str,
        url: &str,
    ) -> Result<Option<RegistryRecord>, RegistryError> {
        Ok(self
            .rows
            .lock()
            .values()
            .filter(|r| r.site_code == site_code && r.secondary_url.as_deref() == Some(url))
            .max_by_key(|r| r.updated_at)
            .cloned())
    }
}

/// Audit fake capturing both append-only streams for assertions.
#[derive(Default)]
pub struct MemAuditRepository {
    pub attempts: Mutex<Vec<ExtractionAttempt>>,
    pub decisions: Mutex<Vec<ConflictDecision>>,
}

impl MemAuditRepository {
    pub fn decision_kinds(&self) -> Vec<&'static str> {
        self.decisions.lock().iter().map(|d| d.kind.as_str()).collect()
    }

    pub fn attempt_statuses(&self) -> Vec<&'static str> {
        self.attempts.lock().iter().map(|a| a.status.as_str()).collect()
    }
}

#[async_trait]
impl AuditRepository for MemAuditRepository {
    async fn append_attempt(&self, attempt: &ExtractionAttempt) -> Result<(), RegistryError> {
        self.attempts.lock().push(attempt.clone());
        Ok(())
    }

    async fn append_decision(&self, decision: &ConflictDecision) -> Result<(), RegistryError> {
        self.decisions.lock().push(decision.clone());
        Ok(())
    }
}

/// Honors `RUST_LOG` when debugging a failing flow; a no-op by default.
fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fully wired service graph over the in-memory fakes.
pub struct TestEngine {
    pub rules: Arc<MemRuleRepository>,
    pub registry: Arc<MemRegistryRepository>,
    pub audit: Arc<MemAuditRepository>,
    pub rule_service: Arc<RuleService<MemRuleRepository>>,
    pub key_service: Arc<KeyService<MemRuleRepository>>,
    pub service: RegistryService<MemRuleRepository, MemRegistryRepository, MemAuditRepository>,
}

pub fn test_engine(rules: Vec<DomainRule>) -> TestEngine {
    init_tracing();

    let rules = Arc::new(MemRuleRepository::with_rules(rules));
    let registry = Arc::new(MemRegistryRepository::default());
    let audit = Arc::new(MemAuditRepository::default());

    let rule_service = Arc::new(RuleService::new(rules.clone(), 64));
    let key_service = Arc::new(KeyService::new(rule_service.clone(), DenyList::default()));
    let service = RegistryService::new(key_service.clone(), registry.clone(), audit.clone());

    TestEngine {
        rules,
        registry,
        audit,
        rule_service,
        key_service,
        service,
    }
}

/// Rule requiring the given query parameters, scoped to the whole domain.
pub fn query_rule(id: i64, domain: &str, params: &[&str]) -> DomainRule {
    DomainRule {
        id,
        domain: domain.to_string(),
        site_code: None,
        path_pattern: None,
        method: ExtractionMethod::QueryParams {
            key_params: params.iter().map(|p| p.to_string()).collect(),
        },
        is_active: true,
    }
}

pub fn submission(url: &str, site_code: &str, source_type: SourceType) -> NewAnnouncement {
    NewAnnouncement {
        url: url.to_string(),
        site_code: site_code.to_string(),
        source_type,
        secondary_url: None,
        payload_ref: None,
        collected_at: None,
    }
}
