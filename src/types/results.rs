//! Search result types: hits, facets, per-type and multi-type bundles.

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::request::{Filters, Pagination};
use crate::types::resource_type::{Plan, ResourceType};

/// Category reference carried on every hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// Geographic location of a hit, with the computed distance when the
/// request carried a geo filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Distance from the query point, in the filter's unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// Contact details carried through to export rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resource_type: ResourceType,
    pub category: CategoryRef,
    pub plan: Plan,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<HitLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Opaque relevance score from the index.
    pub score: f32,
    /// Highlighted snippets keyed by field name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub highlight: HashMap<String, Vec<String>>,
}

/// One bucket of a facet dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetBucket {
    pub key: String,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

impl FacetBucket {
    pub fn new<K: Into<String>>(key: K, count: u64) -> Self {
        FacetBucket {
            key: key.into(),
            count,
            label: None,
            selected: false,
        }
    }

    pub fn with_label<L: Into<String>>(mut self, label: L) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Facet buckets grouped by dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<FacetBucket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<FacetBucket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plans: Vec<FacetBucket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cities: Vec<FacetBucket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<FacetBucket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verified: Vec<FacetBucket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<FacetBucket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub price_ranges: Vec<FacetBucket>,
}

impl Facets {
    /// True when every dimension is empty.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.resource_types.is_empty()
            && self.plans.is_empty()
            && self.cities.is_empty()
            && self.regions.is_empty()
            && self.verified.is_empty()
            && self.tags.is_empty()
            && self.price_ranges.is_empty()
    }

    /// Visit each dimension's bucket list, in a fixed dimension order.
    pub fn dimensions(&self) -> [(&'static str, &Vec<FacetBucket>); 8] {
        [
            ("categories", &self.categories),
            ("resourceTypes", &self.resource_types),
            ("plans", &self.plans),
            ("cities", &self.cities),
            ("regions", &self.regions),
            ("verified", &self.verified),
            ("tags", &self.tags),
            ("priceRanges", &self.price_ranges),
        ]
    }

    /// Mutable access to each dimension, in the same fixed order.
    pub fn dimensions_mut(&mut self) -> [(&'static str, &mut Vec<FacetBucket>); 8] {
        [
            ("categories", &mut self.categories),
            ("resourceTypes", &mut self.resource_types),
            ("plans", &mut self.plans),
            ("cities", &mut self.cities),
            ("regions", &mut self.regions),
            ("verified", &mut self.verified),
            ("tags", &mut self.tags),
            ("priceRanges", &mut self.price_ranges),
        ]
    }

    /// Mutable access to one dimension by its wire name.
    pub fn dimension_mut(&mut self, name: &str) -> Option<&mut Vec<FacetBucket>> {
        match name {
            "categories" => Some(&mut self.categories),
            "resourceTypes" => Some(&mut self.resource_types),
            "plans" => Some(&mut self.plans),
            "cities" => Some(&mut self.cities),
            "regions" => Some(&mut self.regions),
            "verified" => Some(&mut self.verified),
            "tags" => Some(&mut self.tags),
            "priceRanges" => Some(&mut self.price_ranges),
            _ => None,
        }
    }
}

/// Hits, total and facets for one resource-type partition.
///
/// A failed partition is represented by `PerTypeResult::default()` — zero
/// hits, zero total, empty facets — so downstream aggregation stays uniform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerTypeResult {
    #[serde(default)]
    pub hits: Vec<Hit>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub facets: Facets,
}

/// Results of a single-partition search, as returned by
/// [`search_single_type`](crate::search::MultiTypeSearchEngine::search_single_type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub hits: Vec<Hit>,
    pub total: u64,
    pub facets: Facets,
    pub took_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Request metadata echoed back with every multi-type result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub filters: Filters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Per-type totals, failed partitions reported as zero.
    #[serde(default)]
    pub type_distribution: BTreeMap<ResourceType, u64>,
    #[serde(default)]
    pub searched_types: Vec<ResourceType>,
    #[serde(default)]
    pub group_by_type: bool,
    #[serde(default)]
    pub global_relevance_sort: bool,
}

/// The complete outcome of one multi-type orchestration call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiTypeResult {
    /// Results grouped by resource type; every queried type is present.
    pub results_by_type: BTreeMap<ResourceType, PerTypeResult>,
    /// Combined hit list, globally ranked and paginated.
    pub combined_results: Vec<Hit>,
    /// Sum of per-type totals over all queried types.
    pub total_across_types: u64,
    pub global_facets: Facets,
    pub took_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    pub has_more: bool,
    pub metadata: SearchMetadata,
}

impl MultiTypeResult {
    /// Structural validation used when rehydrating cache entries: per-type
    /// totals must still sum to the recorded global total.
    pub fn is_consistent(&self) -> bool {
        let sum: u64 = self.results_by_type.values().map(|r| r.total).sum();
        sum == self.total_across_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_facets() {
        assert!(Facets::default().is_empty());
        let facets = Facets {
            cities: vec![FacetBucket::new("paris", 3)],
            ..Default::default()
        };
        assert!(!facets.is_empty());
    }

    #[test]
    fn test_dimension_lookup() {
        let mut facets = Facets::default();
        facets
            .dimension_mut("resourceTypes")
            .unwrap()
            .push(FacetBucket::new("API", 7));
        assert_eq!(facets.resource_types.len(), 1);
        assert!(facets.dimension_mut("unknown").is_none());
    }

    #[test]
    fn test_consistency_check() {
        let mut results_by_type = BTreeMap::new();
        results_by_type.insert(
            ResourceType::Api,
            PerTypeResult {
                total: 15,
                ..Default::default()
            },
        );
        results_by_type.insert(ResourceType::Service, PerTypeResult::default());

        let result = MultiTypeResult {
            results_by_type,
            combined_results: Vec::new(),
            total_across_types: 15,
            global_facets: Facets::default(),
            took_ms: 0,
            page: None,
            limit: None,
            has_more: false,
            metadata: SearchMetadata::default(),
        };
        assert!(result.is_consistent());

        let mut broken = result.clone();
        broken.total_across_types = 99;
        assert!(!broken.is_consistent());
    }
}
