//! Domain layer containing the deduplication data model and pure logic.
//!
//! # Architecture
//!
//! - [`entities`] - Core data structures (rules, keys, records, audit rows)
//! - [`repositories`] - Data access trait definitions
//! - [`arbiter`] - Pure conflict arbitration between competing writes
//!
//! # Design Principles
//!
//! - The domain layer has no dependencies on infrastructure concerns
//! - Repository traits define contracts implemented by the infrastructure layer
//! - Arbitration is deterministic and idempotent: replaying the same
//!   comparison yields the same decision, which is what makes storage-level
//!   retries safe

pub mod arbiter;
pub mod entities;
pub mod repositories;
