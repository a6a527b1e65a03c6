//! Search backend abstraction.
//!
//! The engine talks to its index through the [`SearchBackend`] trait: one
//! partition name plus a JSON query body in, a [`BackendResponse`] out. The
//! trait keeps the orchestration layer independent of any concrete index
//! service; [`MemoryBackend`] is the in-process implementation used by tests
//! and small deployments.

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SeineError};
use crate::types::{CategoryRef, Contact, Hit, HitLocation, Plan, ResourceType};

pub use memory::MemoryBackend;

/// A single raw hit returned by a backend.
#[derive(Debug, Clone)]
pub struct BackendHit {
    pub id: String,
    pub score: f32,
    /// The stored document.
    pub source: Value,
    /// Sort values, when the query carried a sort clause. For geo sorts the
    /// first value is the distance.
    pub sort: Vec<Value>,
    pub highlight: HashMap<String, Vec<String>>,
}

/// One bucket of a backend aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AggBucket {
    pub key: String,
    pub doc_count: u64,
}

/// Raw response from one partition search.
#[derive(Debug, Clone, Default)]
pub struct BackendResponse {
    pub hits: Vec<BackendHit>,
    pub total: u64,
    /// Aggregation buckets keyed by aggregation name.
    pub aggregations: HashMap<String, Vec<AggBucket>>,
    pub took_ms: u64,
}

impl Default for BackendHit {
    fn default() -> Self {
        Self {
            id: String::new(),
            score: 0.0,
            source: Value::Null,
            sort: Vec::new(),
            highlight: HashMap::new(),
        }
    }
}

/// Pluggable search index.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute one query body against one partition.
    async fn search(&self, partition: &str, body: &Value) -> Result<BackendResponse>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceAddress {
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceLocation {
    lat: f64,
    lon: f64,
}

/// Stored-document shape shared by all partitions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HitSource {
    name: String,
    description: Option<String>,
    resource_type: ResourceType,
    #[serde(default)]
    category: CategoryRef,
    #[serde(default)]
    plan: Plan,
    #[serde(default)]
    verified: bool,
    location: Option<SourceLocation>,
    address: Option<SourceAddress>,
    contact: Option<Contact>,
    #[serde(default)]
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Convert one raw backend hit into a domain [`Hit`].
///
/// `geo_sorted` tells the conversion that the query carried a
/// `_geo_distance` sort, in which case the first sort value is the distance;
/// under any other sort the slot holds a score or field value and is ignored.
///
/// Fails with [`SeineError::Backend`] when the stored document does not match
/// the expected shape; the caller decides whether that fails the partition.
pub fn convert_hit(raw: BackendHit, geo_sorted: bool) -> Result<Hit> {
    let source: HitSource = serde_json::from_value(raw.source)
        .map_err(|e| SeineError::backend(format!("malformed document {}: {e}", raw.id)))?;

    let distance = if geo_sorted {
        raw.sort.first().and_then(Value::as_f64)
    } else {
        None
    };

    let location = match (source.location, source.address) {
        (Some(point), address) => {
            let address = address.as_ref();
            Some(HitLocation {
                latitude: point.lat,
                longitude: point.lon,
                city: address.and_then(|a| a.city.clone()),
                region: address.and_then(|a| a.region.clone()),
                country: address.and_then(|a| a.country.clone()),
                distance,
            })
        }
        (None, Some(address)) if address.city.is_some() || address.region.is_some() => {
            Some(HitLocation {
                latitude: 0.0,
                longitude: 0.0,
                city: address.city,
                region: address.region,
                country: address.country,
                distance: None,
            })
        }
        _ => None,
    };

    Ok(Hit {
        id: raw.id,
        name: source.name,
        description: source.description,
        resource_type: source.resource_type,
        category: source.category,
        plan: source.plan,
        verified: source.verified,
        location,
        contact: source.contact,
        tags: source.tags,
        created_at: source.created_at,
        updated_at: source.updated_at,
        score: raw.score,
        highlight: raw.highlight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_hit_full_document() {
        let raw = BackendHit {
            id: "api-1".to_string(),
            score: 2.5,
            source: json!({
                "name": "Weather API",
                "description": "Forecasts",
                "resourceType": "API",
                "category": { "id": "cat-1", "name": "Weather", "slug": "weather" },
                "plan": "premium",
                "verified": true,
                "location": { "lat": 48.85, "lon": 2.35 },
                "address": { "city": "Paris", "region": "IDF", "country": "FR" },
                "tags": ["weather", "rest"],
                "createdAt": "2024-01-10T00:00:00Z",
                "updatedAt": "2024-06-01T00:00:00Z"
            }),
            sort: vec![json!(3.2)],
            highlight: HashMap::new(),
        };

        let hit = convert_hit(raw, true).unwrap();
        assert_eq!(hit.resource_type, ResourceType::Api);
        assert_eq!(hit.plan, Plan::Premium);
        let location = hit.location.unwrap();
        assert_eq!(location.city.as_deref(), Some("Paris"));
        assert_eq!(location.distance, Some(3.2));
    }

    #[test]
    fn test_convert_hit_ignores_score_sort_value() {
        let raw = BackendHit {
            id: "api-2".to_string(),
            score: 3.0,
            source: json!({
                "name": "Payment API",
                "description": "Billing",
                "resourceType": "API",
                "verified": false,
                "location": { "lat": 45.76, "lon": 4.83 },
                "createdAt": "2024-01-10T00:00:00Z",
                "updatedAt": "2024-06-01T00:00:00Z"
            }),
            sort: vec![json!(3.0)],
            highlight: HashMap::new(),
        };

        // Relevance sort puts the score in the sort slot; it is not a distance.
        let hit = convert_hit(raw, false).unwrap();
        assert_eq!(hit.location.unwrap().distance, None);
    }

    #[test]
    fn test_convert_hit_rejects_malformed_source() {
        let raw = BackendHit {
            id: "bad-1".to_string(),
            source: json!({ "name": "incomplete" }),
            ..Default::default()
        };
        assert!(convert_hit(raw, false).is_err());
    }
}
