//! PostgreSQL implementation of the append-only audit repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{ConflictDecision, ExtractionAttempt};
use crate::domain::repositories::AuditRepository;
use crate::error::RegistryError;

/// PostgreSQL repository for the two audit streams.
///
/// Only `INSERT` statements exist here; the tables have no update or delete
/// path through this crate.
pub struct PgAuditRepository {
    pool: Arc<PgPool>,
}

impl PgAuditRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn append_attempt(&self, attempt: &ExtractionAttempt) -> Result<(), RegistryError> {
        sqlx::query(
            r#"
            INSERT INTO url_key_attempt_log (url, site_code, canonical_key, status, metadata)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&attempt.url)
        .bind(&attempt.site_code)
        .bind(&attempt.canonical_key)
        .bind(attempt.status.as_str())
        .bind(&attempt.metadata)
        .execute(self.pool.as_ref())
        .await
        .map_err(RegistryError::Storage)?;

        Ok(())
    }

    async fn append_decision(&self, decision: &ConflictDecision) -> Result<(), RegistryError> {
        sqlx::query(
            r#"
            INSERT INTO conflict_decision_log
                (site_code, key_hash, decision_kind, new_source_type, existing_source_type,
                 new_priority, existing_priority, domain, domain_had_rule, reasoning)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&decision.site_code)
        .bind(&decision.key_hash)
        .bind(decision.kind.as_str())
        .bind(decision.new_source_type.as_str())
        .bind(decision.existing_source_type.map(|s| s.as_str()))
        .bind(decision.new_priority)
        .bind(decision.existing_priority)
        .bind(&decision.domain)
        .bind(decision.domain_had_rule)
        .bind(&decision.reasoning)
        .execute(self.pool.as_ref())
        .await
        .map_err(RegistryError::Storage)?;

        Ok(())
    }
}
