//! Error taxonomy for the deduplication engine.
//!
//! Extraction-level conditions (missing parameters, unconfigured domains,
//! malformed URLs) are recovered locally through fallback normalization and
//! surface only in the audit trail; they are *not* represented here.
//! [`RegistryError`] covers the persistence-level failures a collector
//! caller genuinely needs to see.

use serde_json::Value;

/// Persistence-level failures surfaced to collector callers.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The rule configuration store failed during a cache miss. Never
    /// conflated with "no rule configured".
    #[error("Domain rule lookup failed: {0}")]
    LookupFailed(#[source] sqlx::Error),

    /// A registry or audit write failed at the storage layer.
    #[error("Registry storage error: {0}")]
    Storage(#[source] sqlx::Error),

    /// A uniqueness race beyond what the atomic upsert absorbs, or a
    /// replacement target that vanished mid-arbitration. Retried once
    /// before escalating to [`RegistryError::Arbitration`].
    #[error("Persistence conflict: {0}")]
    PersistenceConflict(String),

    /// Arbitration could not complete even after the retry.
    #[error("Arbitration failed: {message}")]
    Arbitration { message: String, details: Value },
}

impl RegistryError {
    pub fn arbitration(message: impl Into<String>, details: Value) -> Self {
        Self::Arbitration {
            message: message.into(),
            details,
        }
    }

    /// Returns true for the transient conflict class that warrants the
    /// single retry.
    pub fn is_persistence_conflict(&self) -> bool {
        matches!(self, Self::PersistenceConflict(_))
    }
}

/// Maps a raw sqlx error from a registry write.
///
/// Unique violations indicate a constraint race the atomic upsert should
/// have absorbed, so they come back as the retriable conflict class rather
/// than a plain storage error.
pub fn map_registry_write_error(e: sqlx::Error) -> RegistryError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return RegistryError::PersistenceConflict(format!(
                "unique constraint race on {}",
                db.constraint().unwrap_or("unknown constraint")
            ));
        }
    }

    RegistryError::Storage(e)
}
