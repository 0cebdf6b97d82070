//! Registry entities: one row per distinct announcement identity.

use chrono::{DateTime, Utc};

use super::canonical_key::CanonicalKey;
use super::source_type::SourceType;

/// A stored announcement identity, unique per `(site_code, key_hash)`.
#[derive(Debug, Clone)]
pub struct RegistryRecord {
    pub id: i64,
    pub site_code: String,
    pub source_type: SourceType,
    /// The URL the collector fetched.
    pub origin_url: String,
    /// A secondary URL the collector knows for the same announcement
    /// (e.g. the landing page behind a portal detail view).
    pub secondary_url: Option<String>,
    pub canonical_key: String,
    pub key_hash: String,
    /// Opaque pointer to the collector's materialized content.
    pub payload_ref: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input data for a registry write, with the identity already resolved.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub site_code: String,
    pub source_type: SourceType,
    pub origin_url: String,
    pub secondary_url: Option<String>,
    pub canonical_key: String,
    pub key_hash: String,
    pub payload_ref: Option<String>,
    pub collected_at: DateTime<Utc>,
}

impl NewRecord {
    /// Builds the write input from a submission and its resolved key.
    pub fn from_submission(submission: NewAnnouncement, key: &CanonicalKey) -> Self {
        Self {
            site_code: submission.site_code,
            source_type: submission.source_type,
            origin_url: submission.url,
            secondary_url: submission.secondary_url,
            canonical_key: key.as_str().to_string(),
            key_hash: key.hash(),
            payload_ref: submission.payload_ref,
            collected_at: submission.collected_at.unwrap_or_else(Utc::now),
        }
    }
}

/// A collector submission before identity resolution.
#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    /// The URL the collector used to reach the announcement.
    pub url: String,
    pub site_code: String,
    pub source_type: SourceType,
    pub secondary_url: Option<String>,
    pub payload_ref: Option<String>,
    /// Collection timestamp; defaults to now when absent.
    pub collected_at: Option<DateTime<Utc>>,
}

/// Result of an atomic insert-or-collide write.
#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    /// No row existed for `(site_code, key_hash)`; this write created it.
    Inserted(RegistryRecord),
    /// A row already held the identity; `existing` is the prior row,
    /// untouched by the upsert itself.
    Collided { existing: RegistryRecord },
}
