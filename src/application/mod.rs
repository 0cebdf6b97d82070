//! Application layer services implementing the deduplication flow.
//!
//! This layer orchestrates domain operations by coordinating repository
//! calls, caching, and arbitration. Services consume repository traits and
//! expose the engine's in-process API.
//!
//! # Available Services
//!
//! - [`services::rule_service::RuleService`] - Cached domain-rule lookup
//! - [`services::key_service::KeyService`] - Canonical key extraction with fallback
//! - [`services::registry_service::RegistryService`] - Registration, arbitration, audit

pub mod services;
