//! Source type: the trust class of the collector that produced a record.

use serde::{Deserialize, Serialize};

/// The category of collector that captured an announcement.
///
/// The variant order *is* the trust ranking: `derive(Ord)` ranks later
/// variants above earlier ones, so `SiteScraper > PortalScraper >
/// Aggregator > Unknown`. Adding a new source type forces an explicit
/// placement in this order at compile time; an unrecognized database value
/// parses as [`SourceType::Unknown`] and therefore ranks lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Source that could not be classified.
    Unknown,
    /// Third-party aggregation feed re-surfacing announcements.
    Aggregator,
    /// Scraper for a shared civic portal hosting many organizations.
    PortalScraper,
    /// Scraper written for one specific announcing site.
    SiteScraper,
}

impl SourceType {
    /// Numeric priority used in audit rows; higher wins arbitration.
    pub fn priority(self) -> i16 {
        match self {
            Self::Unknown => 0,
            Self::Aggregator => 1,
            Self::PortalScraper => 2,
            Self::SiteScraper => 3,
        }
    }

    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Aggregator => "aggregator",
            Self::PortalScraper => "portal_scraper",
            Self::SiteScraper => "site_scraper",
        }
    }

    /// Parses a storage value; anything unrecognized is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value {
            "site_scraper" => Self::SiteScraper,
            "portal_scraper" => Self::PortalScraper,
            "aggregator" => Self::Aggregator,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_total_order() {
        assert!(SourceType::SiteScraper > SourceType::PortalScraper);
        assert!(SourceType::PortalScraper > SourceType::Aggregator);
        assert!(SourceType::Aggregator > SourceType::Unknown);
    }

    #[test]
    fn test_ord_matches_numeric_priority() {
        let all = [
            SourceType::Unknown,
            SourceType::Aggregator,
            SourceType::PortalScraper,
            SourceType::SiteScraper,
        ];
        for a in all {
            for b in all {
                assert_eq!(a.cmp(&b), a.priority().cmp(&b.priority()));
            }
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for st in [
            SourceType::Unknown,
            SourceType::Aggregator,
            SourceType::PortalScraper,
            SourceType::SiteScraper,
        ] {
            assert_eq!(SourceType::parse(st.as_str()), st);
        }
    }

    #[test]
    fn test_unrecognized_parses_as_unknown() {
        assert_eq!(SourceType::parse("rss_feed"), SourceType::Unknown);
        assert_eq!(SourceType::parse(""), SourceType::Unknown);
    }
}
