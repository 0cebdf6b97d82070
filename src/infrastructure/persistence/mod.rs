//! PostgreSQL repository implementations.
//!
//! Concrete implementations of the domain repository traits using SQLx.
//! Queries are runtime-bound (`sqlx::query_as`) so the crate builds without
//! a live database.
//!
//! # Repositories
//!
//! - [`PgRuleRepository`] - Domain extraction rule reads
//! - [`PgRegistryRepository`] - Atomic identity upsert and replacement
//! - [`PgAuditRepository`] - Append-only attempt and decision streams

pub mod pg_audit_repository;
pub mod pg_registry_repository;
pub mod pg_rule_repository;

pub use pg_audit_repository::PgAuditRepository;
pub use pg_registry_repository::PgRegistryRepository;
pub use pg_rule_repository::PgRuleRepository;
