//! Business logic services for the application layer.

pub mod key_service;
pub mod registry_service;
pub mod rule_service;

pub use key_service::{ExtractionFailure, KeyOrigin, KeyResolution, KeyService};
pub use registry_service::{RegisterOutcome, RegistryService};
pub use rule_service::RuleService;
