//! Core domain types shared across the crate.

pub mod request;
pub mod resource_type;
pub mod results;

pub use request::{
    DateRange, DistanceUnit, Filters, GeoFilter, MultiTypeSearchRequest, Pagination, PriceRange,
    SearchRequest, SortField, SortOrder, SortSpec,
};
pub use resource_type::{Plan, ResourceType, TypeProfile};
pub use results::{
    CategoryRef, Contact, FacetBucket, Facets, Hit, HitLocation, MultiTypeResult, PerTypeResult,
    SearchMetadata, SearchResults,
};
