//! Repository trait for the announcement identity registry.

use crate::domain::entities::{NewRecord, RegistryRecord, SourceType, UpsertOutcome};
use crate::error::RegistryError;
use async_trait::async_trait;

/// Persistence interface for registry rows, unique per
/// `(site_code, key_hash)`.
///
/// Only insert-or-collide, targeted replacement, and read-by-key are
/// exposed; rows are never deleted through this interface.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRegistryRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryRepository: Send + Sync {
    /// Atomically inserts the record or reports the row it collided with.
    ///
    /// Must be a single atomic statement against the unique constraint so
    /// that two writers racing on the same key can never both observe
    /// [`UpsertOutcome::Inserted`]. A collision leaves the stored row
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::PersistenceConflict`] for constraint races
    /// beyond what the statement absorbs (retried once by the service), and
    /// [`RegistryError::Storage`] for other database failures.
    async fn upsert(&self, record: &NewRecord) -> Result<UpsertOutcome, RegistryError>;

    /// Overwrites the row with `id` with the new record's data, but only
    /// while the row still holds `expected` as its source type.
    ///
    /// Used after arbitration decides the new write is authoritative. The
    /// condition makes the correction write atomic with respect to the
    /// collision read it is based on: if a concurrent writer committed in
    /// between, the row no longer matches what arbitration compared
    /// against, this statement touches nothing, and the caller re-runs
    /// upsert+arbitration against the fresh row. Two writers can therefore
    /// never overwrite each other's corrections out of priority order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::PersistenceConflict`] if the target row
    /// changed concurrently or no longer exists (the service retries the
    /// whole upsert+arbitrate sequence once).
    async fn replace(
        &self,
        id: i64,
        expected: SourceType,
        record: &NewRecord,
    ) -> Result<RegistryRecord, RegistryError>;

    /// Reads the row holding an identity, if any.
    async fn find_by_key(
        &self,
        site_code: &str,
        key_hash: &str,
    ) -> Result<Option<RegistryRecord>, RegistryError>;

    /// Finds a record in the site namespace whose `secondary_url` equals
    /// the given URL.
    ///
    /// Backs the cross-source suppression check: an aggregator URL that a
    /// direct scraper already recorded as its secondary URL.
    async fn find_by_secondary_url(
        &self,
        site_code: &str,
        url: &str,
    ) -> Result<Option<RegistryRecord>, RegistryError>;
}
