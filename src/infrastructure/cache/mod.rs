//! In-process caching for the rule store.
//!
//! A single bounded LRU implementation; there is deliberately no TTL and no
//! external cache tier. Invalidation is explicit via
//! [`RuleCache::clear`].

pub mod rule_cache;

pub use rule_cache::RuleCache;
