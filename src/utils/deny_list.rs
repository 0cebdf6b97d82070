//! Deny-list of query parameters that never contribute to identity.
//!
//! Pagination, search, sort, and view-state parameters vary freely across
//! visits to the same announcement, so the fallback normalizer strips them
//! before building a key. The list is data, not code: the built-in set below
//! is versioned with the crate, and deployments extend it through
//! [`crate::config::Config::extra_deny_params`] without a code change.

use std::collections::HashSet;

/// Built-in noise parameters, v1.
///
/// Covers the common pagination/search/sort/view parameters plus the
/// site-specific variants seen on Korean civic portals (`pageUnit`,
/// `searchCnd`, `bbsId`-style boards keep their id params; those are not
/// listed here).
pub const DEFAULT_DENY_PARAMS: &[&str] = &[
    // pagination
    "page",
    "pageNo",
    "pageIndex",
    "pageUnit",
    "pageSize",
    "currentPage",
    "currentPageNo",
    "offset",
    "limit",
    "start",
    "cp",
    // search
    "searchWord",
    "searchType",
    "searchKeyword",
    "searchCnd",
    "searchCondition",
    "keyword",
    "query",
    "q",
    // sort
    "sort",
    "order",
    "orderBy",
    "sortOrder",
    // view state
    "view",
    "viewType",
    "listType",
    "tab",
];

/// Case-insensitive membership set over deny-listed parameter names.
///
/// Matching is case-insensitive because collectors are not consistent about
/// parameter casing (`pageno` vs `pageNo`).
#[derive(Debug, Clone)]
pub struct DenyList {
    names: HashSet<String>,
}

impl DenyList {
    /// Builds a deny-list from an explicit set of names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Builds the built-in list extended with deployment-specific names.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for name in extra {
            list.names.insert(name.as_ref().to_ascii_lowercase());
        }
        list
    }

    /// Returns true if the parameter name is noise.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    /// Number of deny-listed names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for DenyList {
    fn default() -> Self {
        Self::new(DEFAULT_DENY_PARAMS.iter().copied())
    }
}
