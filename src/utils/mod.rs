//! Utility functions for URL decomposition and fallback canonicalization.
//!
//! This module provides the pure building blocks beneath the key services:
//!
//! - [`url_parts`] - URL decomposition into domain/path/query
//! - [`deny_list`] - Noise query parameters excluded from identity
//! - [`fallback`] - Best-effort canonical keys when no rule applies

pub mod deny_list;
pub mod fallback;
pub mod url_parts;
