//! # Seine
//!
//! A multi-type search orchestration and ranking engine for Rust.
//!
//! Seine takes one logical search request, fans it out across several
//! resource-type partitions of an external full-text index, merges and
//! globally re-ranks the combined hits, merges per-type facets into global
//! facets, and applies caching, pagination and export formatting. A failing
//! partition never fails the whole request.
//!
//! ## Features
//!
//! - Parallel per-partition execution with partial-failure isolation
//! - Deterministic global relevance ranking with type-priority tie-breaks
//! - Count-summing facet merging across partitions
//! - Deterministic request fingerprinting with a TTL cache
//! - Bounded pagination and per-type export formatting

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod query;
pub mod search;
pub mod types;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
