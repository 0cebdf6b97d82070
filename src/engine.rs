//! Engine composition root: pool construction and service wiring.
//!
//! The deduplication engine is consumed as a library; this module is the
//! single place where concrete PostgreSQL repositories are assembled into
//! the service graph collectors talk to.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::application::services::{KeyService, RegisterOutcome, RegistryService, RuleService};
use crate::config::Config;
use crate::domain::entities::{DomainRule, NewAnnouncement};
use crate::error::RegistryError;
use crate::infrastructure::persistence::{
    PgAuditRepository, PgRegistryRepository, PgRuleRepository,
};
use crate::utils::deny_list::DenyList;

/// The URL identity & deduplication engine.
///
/// Wraps the rule store, key extraction, and conflict-arbitrated
/// registration behind the four operations collectors and post-processing
/// pipelines use. Cheap to clone-share via `Arc` across collector tasks.
pub struct DedupEngine {
    rules: Arc<RuleService<PgRuleRepository>>,
    keys: Arc<KeyService<PgRuleRepository>>,
    registry: Arc<RegistryService<PgRuleRepository, PgRegistryRepository, PgAuditRepository>>,
}

impl DedupEngine {
    /// Connects to PostgreSQL, applies migrations, and wires the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or migrations fail.
    pub async fn connect(config: &Config) -> Result<Self> {
        let connect_options: PgConnectOptions = config.database_url.parse()?;
        let connect_options = connect_options.options([(
            "statement_timeout",
            config.db_statement_timeout_ms.to_string(),
        )]);

        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
            .idle_timeout(Duration::from_secs(config.db_idle_timeout))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime))
            .connect_with(connect_options)
            .await?;
        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::with_pool(Arc::new(pool), config))
    }

    /// Wires the engine over an existing pool (no migration run).
    pub fn with_pool(pool: Arc<PgPool>, config: &Config) -> Self {
        let rules = Arc::new(RuleService::new(
            Arc::new(PgRuleRepository::new(pool.clone())),
            config.rule_cache_capacity,
        ));
        let keys = Arc::new(KeyService::new(
            rules.clone(),
            DenyList::with_extra(&config.extra_deny_params),
        ));
        let registry = Arc::new(RegistryService::new(
            keys.clone(),
            Arc::new(PgRegistryRepository::new(pool.clone())),
            Arc::new(PgAuditRepository::new(pool)),
        ));

        Self {
            rules,
            keys,
            registry,
        }
    }

    /// Canonical key for a URL, or `None` when the URL is unparsable.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LookupFailed`] when the rule store fails.
    pub async fn extract_url_key(
        &self,
        url: &str,
        site_code: &str,
    ) -> Result<Option<String>, RegistryError> {
        self.keys.extract_url_key(url, site_code).await
    }

    /// The most specific active extraction rule for a domain and path.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LookupFailed`] when the rule store fails.
    pub async fn get_domain_config(
        &self,
        domain: &str,
        path: &str,
    ) -> Result<Option<DomainRule>, RegistryError> {
        self.rules.get_rule(domain, path).await
    }

    /// Registers a collector submission with conflict arbitration.
    ///
    /// # Errors
    ///
    /// See [`RegistryService::register`].
    pub async fn register(
        &self,
        submission: NewAnnouncement,
    ) -> Result<RegisterOutcome, RegistryError> {
        self.registry.register(submission).await
    }

    /// Batch key extraction for diagnostics and reprocessing sweeps.
    pub async fn bulk_extract(&self, urls: &[String]) -> Vec<(String, Option<String>)> {
        self.keys.bulk_extract(urls).await
    }

    /// Drops every cached rule set, forcing fresh config-store reads.
    pub fn clear_rule_cache(&self) {
        self.rules.clear_cache();
    }
}
