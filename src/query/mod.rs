//! Query construction for partition searches.

pub mod builder;

pub use builder::{DEFAULT_FACETS, build_search_body, build_type_distribution_body};
