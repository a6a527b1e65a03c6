//! Search request parameters.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::resource_type::{Plan, ResourceType};

/// Field a result list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Relevance,
    Name,
    CreatedAt,
    UpdatedAt,
    Distance,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Sort specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

/// Pagination parameters. `page` is 1-based; an explicit `offset` overrides
/// the page-derived one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Pagination {
    /// Effective offset into the result list.
    pub fn effective_offset(&self, default_limit: u32) -> usize {
        match self.offset {
            Some(offset) => offset as usize,
            None => {
                let page = self.page.unwrap_or(1).max(1) as usize;
                let limit = self.limit.unwrap_or(default_limit) as usize;
                (page - 1) * limit
            }
        }
    }

    /// Effective page size.
    pub fn effective_limit(&self, default_limit: u32) -> usize {
        self.limit.unwrap_or(default_limit) as usize
    }
}

/// Geographic distance filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFilter {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in `unit`; falls back to the configured default when absent.
    pub radius: Option<f64>,
    #[serde(default)]
    pub unit: DistanceUnit,
}

/// Distance unit for geo filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Km,
    Mi,
}

impl DistanceUnit {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
        }
    }
}

/// Inclusive price bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
}

/// Creation-date window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Structured filters. Every field is optional; absence means the dimension
/// is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<ResourceType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plans: Vec<Plan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl Filters {
    /// True when no dimension is constrained.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.resource_types.is_empty()
            && self.plans.is_empty()
            && self.location.is_none()
            && self.price_range.is_none()
            && self.verified.is_none()
            && self.city.is_none()
            && self.region.is_none()
            && self.country.is_none()
            && self.tags.is_empty()
            && self.date_range.is_none()
    }
}

/// One logical search request. Immutable for the lifetime of an
/// orchestration call; the engine clones and narrows it per partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Already-validated free-text query, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub filters: Filters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Facet dimensions to aggregate; the engine supplies a default set
    /// when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Preferred content language hint (e.g. "fr", "en").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Parameters for a multi-type orchestration call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiTypeSearchRequest {
    #[serde(flatten)]
    pub search: SearchRequest,
    /// Resource types to include; empty means all known types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_types: Vec<ResourceType>,
    /// Keep per-type hit lists separate instead of interleaving them.
    #[serde(default)]
    pub group_by_type: bool,
    /// Rank the combined list by global relevance.
    #[serde(default)]
    pub global_relevance_sort: bool,
    /// Per-type result caps, overriding the configured defaults.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub limits_per_type: HashMap<ResourceType, u32>,
}

impl MultiTypeSearchRequest {
    /// The resource types this request targets, sorted and deduplicated so
    /// that logically identical requests behave identically.
    pub fn resolved_types(&self) -> Vec<ResourceType> {
        if self.include_types.is_empty() {
            return ResourceType::ALL.to_vec();
        }
        let mut types = self.include_types.clone();
        types.sort();
        types.dedup();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offsets() {
        let p = Pagination {
            page: Some(3),
            limit: Some(10),
            offset: None,
        };
        assert_eq!(p.effective_offset(20), 20);
        assert_eq!(p.effective_limit(20), 10);

        let explicit = Pagination {
            page: Some(3),
            limit: Some(10),
            offset: Some(5),
        };
        assert_eq!(explicit.effective_offset(20), 5);

        let defaults = Pagination::default();
        assert_eq!(defaults.effective_offset(20), 0);
        assert_eq!(defaults.effective_limit(20), 20);
    }

    #[test]
    fn test_deep_pagination_does_not_overflow() {
        // page * limit exceeds u32::MAX; the offset must still be exact.
        let p = Pagination {
            page: Some(500_000),
            limit: Some(10_000),
            offset: None,
        };
        assert_eq!(p.effective_offset(20), 4_999_990_000);
    }

    #[test]
    fn test_resolved_types_default_and_dedup() {
        let req = MultiTypeSearchRequest::default();
        assert_eq!(req.resolved_types(), ResourceType::ALL.to_vec());

        let req = MultiTypeSearchRequest {
            include_types: vec![
                ResourceType::Data,
                ResourceType::Api,
                ResourceType::Api,
            ],
            ..Default::default()
        };
        assert_eq!(
            req.resolved_types(),
            vec![ResourceType::Api, ResourceType::Data]
        );
    }

    #[test]
    fn test_empty_filters() {
        assert!(Filters::default().is_empty());
        let filters = Filters {
            verified: Some(true),
            ..Default::default()
        };
        assert!(!filters.is_empty());
    }
}
