//! Repository trait for domain extraction rule access.

use crate::domain::entities::DomainRule;
use crate::error::RegistryError;
use async_trait::async_trait;

/// Read-only access to the `domain_key_config` store.
///
/// One call per cache miss: implementations return *all* active rules for a
/// domain in one round trip; rule selection (path scoping, specificity)
/// happens in the service layer.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRuleRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Fetches every active rule configured for a domain.
    ///
    /// Returns an empty vector for unconfigured domains; that is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LookupFailed`] when the backing store is
    /// unreachable. Callers must not treat that as "no rule".
    async fn fetch_rules(&self, domain: &str) -> Result<Vec<DomainRule>, RegistryError>;
}
