//! End-to-end registration flows over in-memory repositories: priority
//! arbitration, idempotency, suppression, and the audit trail.

mod common;

use announce_dedup::prelude::*;

use common::{query_rule, submission, test_engine};

const SITE: &str = "KR-001";

#[tokio::test]
async fn test_high_trust_first_low_trust_discarded() {
    let engine = test_engine(vec![query_rule(1, "www.example.gov", &["pbancSn"])]);

    let first = engine
        .service
        .register(submission(
            "https://www.example.gov/biz.do?pbancSn=172173",
            SITE,
            SourceType::SiteScraper,
        ))
        .await
        .unwrap();
    assert!(first.accepted);
    assert_eq!(first.decision, DecisionKind::NewInserted);

    // Same announcement through an aggregator, parameters reordered.
    let second = engine
        .service
        .register(submission(
            "https://www.example.gov/biz.do?utm_source=feed&pbancSn=172173",
            SITE,
            SourceType::Aggregator,
        ))
        .await
        .unwrap();
    assert!(!second.accepted);
    assert_eq!(second.decision, DecisionKind::KeptExisting);
    assert_eq!(second.existing_record_id, first.record_id);

    let rows = engine.registry.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source_type, SourceType::SiteScraper);

    assert_eq!(
        engine.audit.decision_kinds(),
        vec!["new_inserted", "kept_existing"]
    );
}

#[tokio::test]
async fn test_low_trust_first_high_trust_replaces() {
    let engine = test_engine(vec![query_rule(1, "www.example.gov", &["pbancSn"])]);

    let first = engine
        .service
        .register(submission(
            "https://www.example.gov/biz.do?pbancSn=9",
            SITE,
            SourceType::Aggregator,
        ))
        .await
        .unwrap();
    assert!(first.accepted);

    let mut high = submission(
        "https://www.example.gov/biz.do?pbancSn=9",
        SITE,
        SourceType::SiteScraper,
    );
    high.payload_ref = Some("s3://raw/9-direct".to_string());

    let second = engine.service.register(high).await.unwrap();
    assert!(second.accepted);
    assert_eq!(second.decision, DecisionKind::Replaced);
    // The identity row is reused, not duplicated.
    assert_eq!(second.record_id, first.record_id);

    let rows = engine.registry.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source_type, SourceType::SiteScraper);
    assert_eq!(rows[0].payload_ref.as_deref(), Some("s3://raw/9-direct"));
}

#[tokio::test]
async fn test_equal_trust_duplicate_keeps_latest_payload() {
    let engine = test_engine(vec![query_rule(1, "www.example.gov", &["pbancSn"])]);

    let mut first = submission(
        "https://www.example.gov/biz.do?pbancSn=9",
        SITE,
        SourceType::SiteScraper,
    );
    first.payload_ref = Some("s3://raw/9-v1".to_string());
    engine.service.register(first).await.unwrap();

    let mut second = submission(
        "https://www.example.gov/biz.do?pbancSn=9",
        SITE,
        SourceType::SiteScraper,
    );
    second.payload_ref = Some("s3://raw/9-v2".to_string());

    let outcome = engine.service.register(second).await.unwrap();
    assert!(outcome.accepted);
    assert_eq!(outcome.decision, DecisionKind::SameTypeDuplicate);

    let rows = engine.registry.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].payload_ref.as_deref(), Some("s3://raw/9-v2"));
}

#[tokio::test]
async fn test_same_key_in_other_site_is_independent() {
    let engine = test_engine(vec![query_rule(1, "www.example.gov", &["pbancSn"])]);

    let url = "https://www.example.gov/biz.do?pbancSn=9";
    engine
        .service
        .register(submission(url, "KR-001", SourceType::SiteScraper))
        .await
        .unwrap();
    let other = engine
        .service
        .register(submission(url, "KR-002", SourceType::SiteScraper))
        .await
        .unwrap();

    assert!(other.accepted);
    assert_eq!(other.decision, DecisionKind::NewInserted);
    assert_eq!(engine.registry.rows().len(), 2);
}

#[tokio::test]
async fn test_unparsable_url_stored_not_dropped() {
    let engine = test_engine(vec![]);

    let outcome = engine
        .service
        .register(submission("", SITE, SourceType::PortalScraper))
        .await
        .unwrap();

    assert!(outcome.accepted);
    assert_eq!(outcome.decision, DecisionKind::ExtractionFailed);

    let rows = engine.registry.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].canonical_key, "unparsed|");

    assert_eq!(engine.audit.attempt_statuses(), vec!["no_key"]);
    assert_eq!(engine.audit.decision_kinds(), vec!["extraction_failed"]);
}

#[tokio::test]
async fn test_fallback_insert_flagged_as_unconfigured_domain() {
    let engine = test_engine(vec![]);

    let outcome = engine
        .service
        .register(submission(
            "https://unconfigured.example.com/view?nttId=5&page=2",
            SITE,
            SourceType::SiteScraper,
        ))
        .await
        .unwrap();

    assert!(outcome.accepted);
    assert_eq!(outcome.decision, DecisionKind::UnconfiguredDomain);

    let rows = engine.registry.rows();
    // Noise parameter filtered by the fallback normalizer.
    assert_eq!(rows[0].canonical_key, "unconfigured.example.com|nttId=5");

    let decisions = engine.audit.decisions.lock();
    assert!(!decisions[0].domain_had_rule);
    assert_eq!(decisions[0].domain, "unconfigured.example.com");
}

#[tokio::test]
async fn test_secondary_url_suppresses_aggregator_write() {
    let engine = test_engine(vec![]);

    // Direct scraper registers the announcement and records the landing
    // page it links to.
    let mut direct = submission(
        "https://www.example.gov/detail?id=44",
        SITE,
        SourceType::SiteScraper,
    );
    direct.secondary_url = Some("https://portal.example.org/item/44".to_string());
    let first = engine.service.register(direct).await.unwrap();
    assert!(first.accepted);

    // The aggregator later arrives at that landing page directly.
    let suppressed = engine
        .service
        .register(submission(
            "https://portal.example.org/item/44",
            SITE,
            SourceType::Aggregator,
        ))
        .await
        .unwrap();

    assert!(!suppressed.accepted);
    assert_eq!(suppressed.decision, DecisionKind::KeptExisting);
    assert_eq!(suppressed.existing_record_id, first.record_id);
    // No second identity row was created.
    assert_eq!(engine.registry.rows().len(), 1);
}

#[tokio::test]
async fn test_suppression_ignored_when_existing_is_not_higher_trust() {
    let engine = test_engine(vec![]);

    let mut aggregated = submission(
        "https://feed.example.org/entry/44",
        SITE,
        SourceType::Aggregator,
    );
    aggregated.secondary_url = Some("https://www.example.gov/detail?id=44".to_string());
    engine.service.register(aggregated).await.unwrap();

    // A direct scraper hitting the same URL outranks the aggregator row,
    // so its write proceeds under its own identity.
    let direct = engine
        .service
        .register(submission(
            "https://www.example.gov/detail?id=44",
            SITE,
            SourceType::SiteScraper,
        ))
        .await
        .unwrap();

    assert!(direct.accepted);
    assert_eq!(engine.registry.rows().len(), 2);
}

#[tokio::test]
async fn test_every_registration_leaves_one_attempt_and_one_decision() {
    let engine = test_engine(vec![query_rule(1, "www.example.gov", &["pbancSn"])]);

    let urls = [
        "https://www.example.gov/biz.do?pbancSn=1",
        "https://www.example.gov/biz.do?pbancSn=1",
        "https://other.example.com/view?id=2",
        "not a url",
    ];
    for url in urls {
        engine
            .service
            .register(submission(url, SITE, SourceType::PortalScraper))
            .await
            .unwrap();
    }

    assert_eq!(engine.audit.attempts.lock().len(), urls.len());
    assert_eq!(engine.audit.decisions.lock().len(), urls.len());
    assert_eq!(
        engine.audit.attempt_statuses(),
        vec!["rule_key", "rule_key", "fallback_key", "no_key"]
    );
}

#[tokio::test]
async fn test_decision_log_records_both_priorities() {
    let engine = test_engine(vec![query_rule(1, "www.example.gov", &["pbancSn"])]);

    engine
        .service
        .register(submission(
            "https://www.example.gov/biz.do?pbancSn=7",
            SITE,
            SourceType::SiteScraper,
        ))
        .await
        .unwrap();
    engine
        .service
        .register(submission(
            "https://www.example.gov/biz.do?pbancSn=7",
            SITE,
            SourceType::Aggregator,
        ))
        .await
        .unwrap();

    let decisions = engine.audit.decisions.lock();
    let collision = &decisions[1];
    assert_eq!(collision.kind, DecisionKind::KeptExisting);
    assert_eq!(collision.new_source_type, SourceType::Aggregator);
    assert_eq!(collision.existing_source_type, Some(SourceType::SiteScraper));
    assert!(collision.existing_priority.unwrap() > collision.new_priority);
    assert!(collision.domain_had_rule);
    assert!(collision.reasoning.get("summary").is_some());
}
