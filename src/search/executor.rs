//! Fan-out execution of per-type partition searches.

use std::sync::Arc;

use futures::future::join_all;

use crate::backend::{SearchBackend, convert_hit};
use crate::config::EngineConfig;
use crate::error::{Result, SeineError};
use crate::query::build_search_body;
use crate::types::{
    FacetBucket, Facets, PerTypeResult, ResourceType, SearchRequest, SortField,
};

/// Outcome of one partition search. Failures are carried, not raised, so the
/// engine can degrade to partial results.
#[derive(Debug)]
pub struct TypeOutcome {
    pub resource_type: ResourceType,
    pub result: Result<PerTypeResult>,
}

/// Executes partition searches against the backend, one task per type.
pub struct SearchExecutor {
    backend: Arc<dyn SearchBackend>,
    config: Arc<EngineConfig>,
}

impl SearchExecutor {
    pub fn new(backend: Arc<dyn SearchBackend>, config: Arc<EngineConfig>) -> Self {
        Self { backend, config }
    }

    /// Search one resource-type partition, fetching up to `limit` hits.
    pub async fn search_type(
        &self,
        ty: ResourceType,
        request: &SearchRequest,
        limit: u32,
        from: u32,
    ) -> Result<PerTypeResult> {
        // Narrow the request to this partition's type.
        let mut scoped = request.clone();
        scoped.filters.resource_types = vec![ty];

        let body = build_search_body(&scoped, ty, limit, from, &self.config);
        let partition = self.config.partition_for(ty);
        let response = self.backend.search(&partition, &body).await?;

        // Only a distance sort over a geo filter puts a distance in the sort slot.
        let geo_sorted = scoped
            .sort
            .is_some_and(|s| s.field == SortField::Distance)
            && scoped.filters.location.is_some();

        let mut hits = Vec::with_capacity(response.hits.len());
        for raw in response.hits {
            hits.push(convert_hit(raw, geo_sorted)?);
        }

        Ok(PerTypeResult {
            hits,
            total: response.total,
            facets: facets_from_aggregations(&response.aggregations),
        })
    }

    /// Search every requested type concurrently. Each task is bounded by the
    /// per-type timeout; a timed-out, panicked or failed task yields an `Err`
    /// outcome for its type while the others proceed.
    pub async fn search_types(
        &self,
        types: &[ResourceType],
        request: &SearchRequest,
        limit_for: impl Fn(ResourceType) -> u32,
    ) -> Vec<TypeOutcome> {
        let tasks: Vec<_> = types
            .iter()
            .map(|&ty| {
                let backend = Arc::clone(&self.backend);
                let config = Arc::clone(&self.config);
                let request = request.clone();
                let limit = limit_for(ty);
                let timeout = config.per_type_timeout;

                let handle = tokio::spawn(async move {
                    let executor = SearchExecutor::new(backend, config);
                    tokio::time::timeout(timeout, executor.search_type(ty, &request, limit, 0))
                        .await
                        .unwrap_or_else(|_| {
                            Err(SeineError::timeout(format!(
                                "partition search for {ty} exceeded {timeout:?}"
                            )))
                        })
                });
                (ty, handle)
            })
            .collect();

        join_all(tasks.into_iter().map(|(ty, handle)| async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(SeineError::internal(format!(
                    "partition task for {ty} aborted: {join_err}"
                ))),
            };
            TypeOutcome {
                resource_type: ty,
                result,
            }
        }))
        .await
    }
}

/// Map raw aggregation buckets onto the known facet dimensions. Unknown
/// aggregation names are dropped.
pub fn facets_from_aggregations(
    aggregations: &std::collections::HashMap<String, Vec<crate::backend::AggBucket>>,
) -> Facets {
    let mut facets = Facets::default();
    for (name, buckets) in aggregations {
        if let Some(dimension) = facets.dimension_mut(name) {
            *dimension = buckets
                .iter()
                .map(|b| FacetBucket::new(b.key.clone(), b.doc_count))
                .collect();
        }
    }
    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendResponse, MemoryBackend};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    fn doc(name: &str, ty: &str) -> Value {
        json!({
            "name": name,
            "description": format!("{name} description"),
            "resourceType": ty,
            "category": { "id": "cat-1", "name": "General", "slug": "general" },
            "plan": "free",
            "verified": true,
            "tags": [],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-06-01T00:00:00Z"
        })
    }

    fn executor_with(backend: Arc<dyn SearchBackend>) -> SearchExecutor {
        SearchExecutor::new(backend, Arc::new(EngineConfig::default()))
    }

    #[tokio::test]
    async fn test_search_type_converts_hits() {
        let backend = Arc::new(MemoryBackend::new());
        backend.add_document("marketplace_api", "a1", doc("Weather API", "API"));

        let executor = executor_with(backend);
        let request = SearchRequest {
            query: Some("weather".to_string()),
            ..Default::default()
        };

        let result = executor
            .search_type(ResourceType::Api, &request, 10, 0)
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.hits[0].resource_type, ResourceType::Api);
    }

    #[tokio::test]
    async fn test_relevance_sort_leaves_distance_unset() {
        let backend = Arc::new(MemoryBackend::new());
        let mut source = doc("Weather API", "API");
        source["location"] = json!({ "lat": 48.85, "lon": 2.35 });
        backend.add_document("marketplace_api", "a1", source);

        let executor = executor_with(backend);
        let request = SearchRequest {
            query: Some("weather".to_string()),
            ..Default::default()
        };

        let result = executor
            .search_type(ResourceType::Api, &request, 10, 0)
            .await
            .unwrap();
        // The sort slot holds the score here, not a distance.
        let location = result.hits[0].location.as_ref().unwrap();
        assert_eq!(location.distance, None);
    }

    #[tokio::test]
    async fn test_failed_partition_is_carried_not_raised() {
        // Only the API partition exists; the SERVICE search must fail alone.
        let backend = Arc::new(MemoryBackend::new());
        backend.add_document("marketplace_api", "a1", doc("Weather API", "API"));

        let executor = executor_with(backend);
        let request = SearchRequest::default();
        let outcomes = executor
            .search_types(
                &[ResourceType::Api, ResourceType::Service],
                &request,
                |_| 10,
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());
    }

    struct HangingBackend;

    #[async_trait]
    impl SearchBackend for HangingBackend {
        async fn search(&self, _partition: &str, _body: &Value) -> Result<BackendResponse> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_slow_partition_times_out() {
        let config = EngineConfig::default()
            .with_per_type_timeout(std::time::Duration::from_millis(20));
        let executor = SearchExecutor::new(Arc::new(HangingBackend), Arc::new(config));

        let outcomes = executor
            .search_types(&[ResourceType::Api], &SearchRequest::default(), |_| 10)
            .await;
        let err = outcomes[0].result.as_ref().unwrap_err();
        assert!(matches!(err, SeineError::Timeout(_)));
    }
}
