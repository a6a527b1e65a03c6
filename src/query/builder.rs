//! Translation of search requests into backend query bodies.
//!
//! The builder emits a JSON query document in the bool/must/filter dialect
//! understood by [`SearchBackend`](crate::backend::SearchBackend)
//! implementations. Relevance boosts come from the per-type
//! [`TypeProfile`](crate::types::TypeProfile), so the same request produces
//! differently weighted queries per partition.

use serde_json::{Map, Value, json};

use crate::config::EngineConfig;
use crate::types::{
    Filters, ResourceType, SearchRequest, SortField, SortOrder, SortSpec, TypeProfile,
};

/// Facet dimensions requested by default when the caller asks for facets
/// without naming them.
pub const DEFAULT_FACETS: &[&str] = &["categories", "resourceTypes", "plans", "verified"];

/// Price bucket boundaries for the `priceRanges` facet.
const PRICE_BUCKETS: &[(&str, Option<f64>, Option<f64>)] = &[
    ("free", None, Some(0.01)),
    ("low", Some(0.01), Some(10.0)),
    ("medium", Some(10.0), Some(50.0)),
    ("high", Some(50.0), Some(200.0)),
    ("premium", Some(200.0), None),
];

/// Build the query body for one resource-type partition.
pub fn build_search_body(
    request: &SearchRequest,
    ty: ResourceType,
    size: u32,
    from: u32,
    config: &EngineConfig,
) -> Value {
    let profile = ty.profile();
    let mut body = Map::new();

    body.insert("query".to_string(), build_query(request, profile, config));
    body.insert("from".to_string(), json!(from));
    body.insert("size".to_string(), json!(size));
    body.insert("track_total_hits".to_string(), json!(true));

    if let Some(sort) = build_sort(request) {
        body.insert("sort".to_string(), sort);
    }

    let requested: Vec<&str> = if request.facets.is_empty() {
        DEFAULT_FACETS.to_vec()
    } else {
        request.facets.iter().map(String::as_str).collect()
    };
    body.insert("aggs".to_string(), build_aggregations(&requested));

    if config.enable_highlighting && request.query.as_deref().is_some_and(|q| !q.is_empty()) {
        body.insert(
            "highlight".to_string(),
            json!({
                "fields": {
                    "name": {},
                    "description": { "fragment_size": 150, "number_of_fragments": 2 }
                }
            }),
        );
    }

    Value::Object(body)
}

/// Build a size-zero body whose only purpose is the per-type count
/// aggregation, used for type distribution.
pub fn build_type_distribution_body(request: &SearchRequest, config: &EngineConfig) -> Value {
    json!({
        "query": build_query(request, ResourceType::Api.profile(), config),
        "size": 0,
        "track_total_hits": true,
        "aggs": {
            "resourceTypes": {
                "terms": { "field": "resourceType", "size": 10 }
            }
        }
    })
}

fn build_query(request: &SearchRequest, profile: &TypeProfile, config: &EngineConfig) -> Value {
    let must = match request.query.as_deref() {
        Some(q) if !q.is_empty() => json!([{
            "multi_match": {
                "query": q,
                "fields": [
                    format!("name^{}", profile.name_boost),
                    format!("description^{}", profile.description_boost),
                    format!("category.name^{}", profile.category_boost),
                    format!("tags^{}", profile.tags_boost),
                ],
                "type": "best_fields",
                "fuzziness": "AUTO"
            }
        }]),
        _ => json!([{ "match_all": {} }]),
    };

    let filter = build_filters(&request.filters, config);

    json!({
        "bool": {
            "must": must,
            "filter": filter
        }
    })
}

fn build_filters(filters: &Filters, config: &EngineConfig) -> Value {
    let mut clauses: Vec<Value> = Vec::new();

    if !filters.categories.is_empty() {
        clauses.push(json!({ "terms": { "category.id": filters.categories } }));
    }

    if !filters.resource_types.is_empty() {
        let wire: Vec<&str> = filters
            .resource_types
            .iter()
            .map(|t| t.as_wire_str())
            .collect();
        clauses.push(json!({ "terms": { "resourceType": wire } }));
    }

    if !filters.plans.is_empty() {
        let wire: Vec<&str> = filters.plans.iter().map(|p| p.as_wire_str()).collect();
        clauses.push(json!({ "terms": { "plan": wire } }));
    }

    if let Some(verified) = filters.verified {
        clauses.push(json!({ "term": { "verified": verified } }));
    }

    if let Some(city) = &filters.city {
        clauses.push(json!({ "term": { "address.city.keyword": city } }));
    }

    if let Some(region) = &filters.region {
        clauses.push(json!({ "term": { "address.region.keyword": region } }));
    }

    if let Some(country) = &filters.country {
        clauses.push(json!({ "term": { "address.country.keyword": country } }));
    }

    if let Some(geo) = &filters.location {
        let radius = geo.radius.unwrap_or(config.default_geo_radius_km);
        let unit = geo.unit.as_wire_str();
        clauses.push(json!({
            "geo_distance": {
                "distance": format!("{radius}{unit}"),
                "location": { "lat": geo.latitude, "lon": geo.longitude }
            }
        }));
    }

    if let Some(price) = &filters.price_range {
        let mut range = Map::new();
        if let Some(min) = price.min {
            range.insert("gte".to_string(), json!(min));
        }
        if let Some(max) = price.max {
            range.insert("lte".to_string(), json!(max));
        }
        if !range.is_empty() {
            clauses.push(json!({ "range": { "pricing.basePrice": Value::Object(range) } }));
        }
    }

    if let Some(dates) = &filters.date_range {
        let mut range = Map::new();
        if let Some(from) = dates.from {
            range.insert("gte".to_string(), json!(from.to_rfc3339()));
        }
        if let Some(to) = dates.to {
            range.insert("lte".to_string(), json!(to.to_rfc3339()));
        }
        if !range.is_empty() {
            clauses.push(json!({ "range": { "createdAt": Value::Object(range) } }));
        }
    }

    // Tags combine conjunctively: a resource must carry every requested tag.
    for tag in &filters.tags {
        clauses.push(json!({ "term": { "tags.keyword": tag } }));
    }

    Value::Array(clauses)
}

fn build_sort(request: &SearchRequest) -> Option<Value> {
    let SortSpec { field, order } = request.sort.as_ref()?;
    let order_str = match order {
        SortOrder::Asc => "asc",
        SortOrder::Desc => "desc",
    };

    let clause = match field {
        SortField::Relevance => json!({ "_score": { "order": order_str } }),
        SortField::Name => json!({ "name.keyword": { "order": order_str } }),
        SortField::CreatedAt => json!({ "createdAt": { "order": order_str } }),
        SortField::UpdatedAt => json!({ "updatedAt": { "order": order_str } }),
        SortField::Distance => {
            let geo = request.filters.location.as_ref()?;
            json!({
                "_geo_distance": {
                    "location": { "lat": geo.latitude, "lon": geo.longitude },
                    "order": order_str,
                    "unit": geo.unit.as_wire_str()
                }
            })
        }
    };

    Some(json!([clause]))
}

fn build_aggregations(requested: &[&str]) -> Value {
    let mut aggs = Map::new();

    for name in requested {
        let agg = match *name {
            "categories" => json!({ "terms": { "field": "category.id", "size": 20 } }),
            "resourceTypes" => json!({ "terms": { "field": "resourceType", "size": 10 } }),
            "plans" => json!({ "terms": { "field": "plan", "size": 10 } }),
            "verified" => json!({ "terms": { "field": "verified", "size": 2 } }),
            "cities" => json!({ "terms": { "field": "address.city.keyword", "size": 20 } }),
            "regions" => json!({ "terms": { "field": "address.region.keyword", "size": 20 } }),
            "tags" => json!({ "terms": { "field": "tags.keyword", "size": 30 } }),
            "priceRanges" => {
                let ranges: Vec<Value> = PRICE_BUCKETS
                    .iter()
                    .map(|(key, from, to)| {
                        let mut bucket = Map::new();
                        bucket.insert("key".to_string(), json!(key));
                        if let Some(from) = from {
                            bucket.insert("from".to_string(), json!(from));
                        }
                        if let Some(to) = to {
                            bucket.insert("to".to_string(), json!(to));
                        }
                        Value::Object(bucket)
                    })
                    .collect();
                json!({ "range": { "field": "pricing.basePrice", "ranges": ranges } })
            }
            _ => continue,
        };
        aggs.insert((*name).to_string(), agg);
    }

    Value::Object(aggs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DistanceUnit, GeoFilter, Pagination, Plan};

    fn base_request(query: &str) -> SearchRequest {
        SearchRequest {
            query: Some(query.to_string()),
            pagination: Some(Pagination {
                page: Some(1),
                limit: Some(10),
                offset: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_multi_match_uses_type_boosts() {
        let request = base_request("weather");
        let body = build_search_body(&request, ResourceType::Api, 10, 0, &EngineConfig::default());

        let fields = &body["query"]["bool"]["must"][0]["multi_match"]["fields"];
        assert_eq!(fields[0], "name^3");
        assert_eq!(fields[1], "description^2");
        assert_eq!(body["query"]["bool"]["must"][0]["multi_match"]["fuzziness"], "AUTO");
    }

    #[test]
    fn test_empty_query_matches_all() {
        let mut request = base_request("");
        request.query = None;
        let body = build_search_body(&request, ResourceType::Data, 10, 0, &EngineConfig::default());
        assert!(body["query"]["bool"]["must"][0]["match_all"].is_object());
    }

    #[test]
    fn test_filters_become_filter_clauses() {
        let mut request = base_request("payments");
        request.filters.plans = vec![Plan::Premium];
        request.filters.verified = Some(true);
        request.filters.tags = vec!["rest".to_string(), "json".to_string()];

        let body = build_search_body(&request, ResourceType::Api, 10, 0, &EngineConfig::default());
        let filter = body["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filter.len(), 4);
        assert_eq!(filter[0]["terms"]["plan"][0], "premium");
        assert_eq!(filter[1]["term"]["verified"], true);
        assert_eq!(filter[2]["term"]["tags.keyword"], "rest");
        assert_eq!(filter[3]["term"]["tags.keyword"], "json");
    }

    #[test]
    fn test_geo_filter_defaults_radius() {
        let mut request = base_request("");
        request.filters.location = Some(GeoFilter {
            latitude: 48.85,
            longitude: 2.35,
            radius: None,
            unit: DistanceUnit::Km,
        });

        let body = build_search_body(&request, ResourceType::Business, 10, 0, &EngineConfig::default());
        let filter = body["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filter[0]["geo_distance"]["distance"], "25km");
    }

    #[test]
    fn test_default_facet_set() {
        let request = base_request("weather");
        let body = build_search_body(&request, ResourceType::Api, 10, 0, &EngineConfig::default());
        let aggs = body["aggs"].as_object().unwrap();
        assert!(aggs.contains_key("categories"));
        assert!(aggs.contains_key("resourceTypes"));
        assert!(aggs.contains_key("plans"));
        assert!(aggs.contains_key("verified"));
        assert!(!aggs.contains_key("priceRanges"));
    }

    #[test]
    fn test_price_range_buckets() {
        let mut request = base_request("weather");
        request.facets = vec!["priceRanges".to_string()];

        let body = build_search_body(&request, ResourceType::Api, 10, 0, &EngineConfig::default());
        let ranges = body["aggs"]["priceRanges"]["range"]["ranges"]
            .as_array()
            .unwrap();
        assert_eq!(ranges.len(), 5);
        assert_eq!(ranges[0]["key"], "free");
        assert_eq!(ranges[4]["key"], "premium");
    }
}
