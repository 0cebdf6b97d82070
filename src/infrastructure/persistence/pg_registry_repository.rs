//! PostgreSQL implementation of the registry repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewRecord, RegistryRecord, SourceType, UpsertOutcome};
use crate::domain::repositories::RegistryRepository;
use crate::error::{map_registry_write_error, RegistryError};

#[derive(Debug, sqlx::FromRow)]
struct RegistryRow {
    id: i64,
    site_code: String,
    source_type: String,
    origin_url: String,
    secondary_url: Option<String>,
    canonical_key: String,
    key_hash: String,
    payload_ref: Option<String>,
    collected_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RegistryRow> for RegistryRecord {
    fn from(row: RegistryRow) -> Self {
        Self {
            id: row.id,
            site_code: row.site_code,
            source_type: SourceType::parse(&row.source_type),
            origin_url: row.origin_url,
            secondary_url: row.secondary_url,
            canonical_key: row.canonical_key,
            key_hash: row.key_hash,
            payload_ref: row.payload_ref,
            collected_at: row.collected_at,
            updated_at: row.updated_at,
        }
    }
}

/// Upsert result row: the record plus whether this statement created it.
#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    record: RegistryRow,
    inserted: bool,
}

const RECORD_COLUMNS: &str = "id, site_code, source_type, origin_url, secondary_url, \
     canonical_key, key_hash, payload_ref, collected_at, updated_at";

/// PostgreSQL repository for the `announcement_registry` table.
///
/// The insert-or-collide write is one statement against the
/// `(site_code, key_hash)` unique constraint: `ON CONFLICT` with a no-op
/// update makes the statement return the existing row untouched, and
/// `xmax = 0` distinguishes a fresh insert from a collision. Two writers
/// racing on the same key can never both observe a fresh insert.
///
/// The correction write is likewise a single conditional statement
/// (`WHERE id AND source_type`), so an upsert, a collision read, and the
/// correction based on it commit as an atomic sequence: a row changed by
/// a concurrent commit fails the condition instead of being overwritten.
pub struct PgRegistryRepository {
    pool: Arc<PgPool>,
}

impl PgRegistryRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistryRepository for PgRegistryRepository {
    async fn upsert(&self, record: &NewRecord) -> Result<UpsertOutcome, RegistryError> {
        let row: UpsertRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO announcement_registry
                (site_code, source_type, origin_url, secondary_url,
                 canonical_key, key_hash, payload_ref, collected_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            ON CONFLICT (site_code, key_hash)
                DO UPDATE SET key_hash = announcement_registry.key_hash
            RETURNING {RECORD_COLUMNS}, (xmax = 0) AS inserted
            "#
        ))
        .bind(&record.site_code)
        .bind(record.source_type.as_str())
        .bind(&record.origin_url)
        .bind(&record.secondary_url)
        .bind(&record.canonical_key)
        .bind(&record.key_hash)
        .bind(&record.payload_ref)
        .bind(record.collected_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_registry_write_error)?;

        if row.inserted {
            Ok(UpsertOutcome::Inserted(row.record.into()))
        } else {
            Ok(UpsertOutcome::Collided {
                existing: row.record.into(),
            })
        }
    }

    async fn replace(
        &self,
        id: i64,
        expected: SourceType,
        record: &NewRecord,
    ) -> Result<RegistryRecord, RegistryError> {
        let row: Option<RegistryRow> = sqlx::query_as(&format!(
            r#"
            UPDATE announcement_registry
            SET source_type = $3,
                origin_url = $4,
                secondary_url = $5,
                payload_ref = $6,
                collected_at = $7,
                updated_at = now()
            WHERE id = $1 AND source_type = $2
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(record.source_type.as_str())
        .bind(&record.origin_url)
        .bind(&record.secondary_url)
        .bind(&record.payload_ref)
        .bind(record.collected_at)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(map_registry_write_error)?;

        row.map(RegistryRecord::from).ok_or_else(|| {
            RegistryError::PersistenceConflict(format!(
                "replacement target {id} changed concurrently or no longer exists"
            ))
        })
    }

    async fn find_by_key(
        &self,
        site_code: &str,
        key_hash: &str,
    ) -> Result<Option<RegistryRecord>, RegistryError> {
        let row: Option<RegistryRow> = sqlx::query_as(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM announcement_registry
            WHERE site_code = $1 AND key_hash = $2
            "#
        ))
        .bind(site_code)
        .bind(key_hash)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(RegistryError::Storage)?;

        Ok(row.map(RegistryRecord::from))
    }

    async fn find_by_secondary_url(
        &self,
        site_code: &str,
        url: &str,
    ) -> Result<Option<RegistryRecord>, RegistryError> {
        let row: Option<RegistryRow> = sqlx::query_as(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM announcement_registry
            WHERE site_code = $1 AND secondary_url = $2
            ORDER BY updated_at DESC
            LIMIT 1
            "#
        ))
        .bind(site_code)
        .bind(url)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(RegistryError::Storage)?;

        Ok(row.map(RegistryRecord::from))
    }
}
