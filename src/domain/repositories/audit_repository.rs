//! Repository trait for the append-only audit streams.

use crate::domain::entities::{ConflictDecision, ExtractionAttempt};
use crate::error::RegistryError;
use async_trait::async_trait;

/// Append-only access to the two audit streams.
///
/// No update or delete operations exist, by design. Callers (the registry
/// service) swallow write failures: observability must never become a
/// single point of failure for data durability.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAuditRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one row to the fine-grained attempt log.
    ///
    /// Written for every extraction+upsert attempt, including attempts that
    /// produced no key at all.
    async fn append_attempt(&self, attempt: &ExtractionAttempt) -> Result<(), RegistryError>;

    /// Appends one row to the decision log.
    ///
    /// Written once per final arbitration outcome, with structured
    /// reasoning suitable for later review.
    async fn append_decision(&self, decision: &ConflictDecision) -> Result<(), RegistryError>;
}
