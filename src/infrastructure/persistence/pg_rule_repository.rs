//! PostgreSQL implementation of the rule repository.

use async_trait::async_trait;
use regex::Regex;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{DomainRule, ExtractionMethod};
use crate::domain::repositories::RuleRepository;
use crate::error::RegistryError;

/// Raw `domain_key_config` row before method validation.
#[derive(Debug, sqlx::FromRow)]
struct RuleRow {
    id: i64,
    domain: String,
    site_code: Option<String>,
    extraction_method: String,
    key_params: Option<serde_json::Value>,
    path_pattern: Option<String>,
    is_active: bool,
}

impl RuleRow {
    /// Validates the loosely-typed config row into the closed
    /// [`ExtractionMethod`] union.
    ///
    /// Returns `None` (with a warning) for rows that are internally
    /// inconsistent: a `query_params` rule without parameters, or a
    /// `path_pattern` rule whose pattern does not compile. A broken row
    /// must degrade to "unconfigured", never to a bogus identity.
    fn into_rule(self) -> Option<DomainRule> {
        let key_params = self.key_params.as_ref().and_then(parse_key_params);
        let regex = self.path_pattern.as_deref().and_then(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(
                    rule_id = self.id,
                    domain = %self.domain,
                    pattern = %p,
                    error = %e,
                    "Skipping rule with invalid path pattern"
                );
                None
            }
        });

        let method = match self.extraction_method.as_str() {
            "query_params" => ExtractionMethod::QueryParams {
                key_params: non_empty(key_params, self.id, &self.domain)?,
            },
            "path_pattern" => ExtractionMethod::PathPattern { pattern: regex? },
            "mixed" => ExtractionMethod::Mixed {
                key_params: non_empty(key_params, self.id, &self.domain)?,
                pattern: regex?,
            },
            other => {
                tracing::warn!(
                    rule_id = self.id,
                    domain = %self.domain,
                    method = %other,
                    "Skipping rule with unknown extraction method"
                );
                return None;
            }
        };

        Some(DomainRule {
            id: self.id,
            domain: self.domain,
            site_code: self.site_code,
            path_pattern: self.path_pattern,
            method,
            is_active: self.is_active,
        })
    }
}

fn parse_key_params(value: &serde_json::Value) -> Option<Vec<String>> {
    let array = value.as_array()?;
    let params: Vec<String> = array
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect();
    (params.len() == array.len()).then_some(params)
}

fn non_empty(params: Option<Vec<String>>, rule_id: i64, domain: &str) -> Option<Vec<String>> {
    match params {
        Some(p) if !p.is_empty() => Some(p),
        _ => {
            tracing::warn!(
                rule_id,
                domain = %domain,
                "Skipping query-param rule without key_params"
            );
            None
        }
    }
}

/// PostgreSQL repository for the `domain_key_config` table.
pub struct PgRuleRepository {
    pool: Arc<PgPool>,
}

impl PgRuleRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleRepository for PgRuleRepository {
    async fn fetch_rules(&self, domain: &str) -> Result<Vec<DomainRule>, RegistryError> {
        let rows: Vec<RuleRow> = sqlx::query_as(
            r#"
            SELECT id, domain, site_code, extraction_method, key_params, path_pattern, is_active
            FROM domain_key_config
            WHERE domain = $1 AND is_active = TRUE
            ORDER BY id
            "#,
        )
        .bind(domain)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(RegistryError::LookupFailed)?;

        Ok(rows.into_iter().filter_map(RuleRow::into_rule).collect())
    }
}
