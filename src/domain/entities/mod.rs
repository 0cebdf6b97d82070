//! Core domain entities representing the deduplication data model.
//!
//! Entities are plain data structures without I/O. The "New Type" pattern
//! from the storage layer applies throughout: `NewAnnouncement` is the
//! collector submission, `NewRecord` the resolved write input, and
//! `RegistryRecord` the stored row.
//!
//! # Entity Types
//!
//! - [`DomainRule`] / [`ExtractionMethod`] - Per-domain key extraction config
//! - [`CanonicalKey`] - Deterministic URL identity string
//! - [`SourceType`] - Collector trust class with a total priority order
//! - [`RegistryRecord`] - One row per announcement identity
//! - [`ConflictDecision`] / [`ExtractionAttempt`] - Append-only audit entries

pub mod canonical_key;
pub mod decision;
pub mod domain_rule;
pub mod registry_record;
pub mod source_type;

pub use canonical_key::CanonicalKey;
pub use decision::{AttemptStatus, ConflictDecision, DecisionKind, ExtractionAttempt};
pub use domain_rule::{DomainRule, ExtractionMethod};
pub use registry_record::{NewAnnouncement, NewRecord, RegistryRecord, UpsertOutcome};
pub use source_type::SourceType;
