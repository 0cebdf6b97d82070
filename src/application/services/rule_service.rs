//! Cached domain-rule lookup service.

use std::sync::Arc;

use crate::domain::entities::DomainRule;
use crate::domain::repositories::RuleRepository;
use crate::error::RegistryError;
use crate::infrastructure::cache::RuleCache;

/// The rule store: cached, most-specific-rule lookup over the
/// `domain_key_config` table.
///
/// Each instance owns its cache; hosts inject the service wherever rules
/// are needed rather than sharing process-wide state. A cache miss costs one
/// repository read which fetches *all* active rules for the domain, so an
/// unconfigured domain is cached too (as an empty rule set) and does not
/// hit the store again until [`RuleService::clear_cache`].
pub struct RuleService<R: RuleRepository> {
    repository: Arc<R>,
    cache: RuleCache,
}

impl<R: RuleRepository> RuleService<R> {
    /// Creates a rule service with a bounded cache of `cache_capacity`
    /// domains.
    pub fn new(repository: Arc<R>, cache_capacity: usize) -> Self {
        Self {
            repository,
            cache: RuleCache::new(cache_capacity),
        }
    }

    /// Returns the most specific active rule for a domain and path.
    ///
    /// Among the domain's rules, a path-scoped rule matching the path wins
    /// over a domain-wide rule; ties between path-scoped matches go to the
    /// longer pattern.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LookupFailed`] if the backing store fails
    /// during a cache miss. A store failure is never treated as "no rule";
    /// nothing is cached for the domain in that case.
    pub async fn get_rule(
        &self,
        domain: &str,
        path: &str,
    ) -> Result<Option<DomainRule>, RegistryError> {
        let rules = match self.cache.get(domain) {
            Some(cached) => cached,
            None => {
                let fetched = Arc::new(self.repository.fetch_rules(domain).await?);
                tracing::debug!(domain, rules = fetched.len(), "Rule cache miss");
                self.cache.insert(domain, fetched.clone());
                fetched
            }
        };

        Ok(select_rule(&rules, path))
    }

    /// Drops every cached rule set. Called after operators edit the config
    /// store.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Rule cache cleared");
    }
}

/// Picks the most specific rule whose scope covers `path`.
fn select_rule<'a>(rules: &'a [DomainRule], path: &str) -> Option<DomainRule> {
    let mut best: Option<&'a DomainRule> = None;
    for rule in rules.iter().filter(|r| r.is_active) {
        if !rule.matches_path(path) {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => {
                (rule.is_path_scoped(), rule.specificity())
                    > (current.is_path_scoped(), current.specificity())
            }
        };
        if better {
            best = Some(rule);
        }
    }
    best.cloned()
}
