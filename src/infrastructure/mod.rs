//! Infrastructure layer for storage and caching.
//!
//! Implements the interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`cache`] - Bounded in-process rule cache
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod persistence;
