//! Repository trait definitions for the domain layer.
//!
//! Traits define the contracts for data access; concrete implementations
//! live in `crate::infrastructure::persistence`. Mock implementations are
//! auto-generated via `mockall` for service unit tests.
//!
//! # Available Repositories
//!
//! - [`RuleRepository`] - Domain extraction rule reads
//! - [`RegistryRepository`] - Identity upsert, replacement, and lookup
//! - [`AuditRepository`] - Append-only attempt and decision streams

pub mod audit_repository;
pub mod registry_repository;
pub mod rule_repository;

pub use audit_repository::AuditRepository;
pub use registry_repository::RegistryRepository;
pub use rule_repository::RuleRepository;

#[cfg(test)]
pub use audit_repository::MockAuditRepository;
#[cfg(test)]
pub use registry_repository::MockRegistryRepository;
#[cfg(test)]
pub use rule_repository::MockRuleRepository;
