//! Result caching for multi-type searches.
//!
//! Cache keys are derived from every request dimension that affects the
//! response, so logically identical requests share an entry and any change in
//! query, filters, types, grouping, pagination or sort produces a distinct
//! key. Stored entries are validated on the way out; a malformed or
//! inconsistent entry is treated as a miss rather than served.

pub mod store;

use std::sync::Arc;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::types::{MultiTypeResult, MultiTypeSearchRequest, ResourceType};

pub use store::{CacheStore, MemoryCacheStore};

/// Keys longer than this are compacted to a prefix plus a checksum, keeping
/// them valid for stores with key length limits.
const MAX_KEY_LEN: usize = 100;
const KEY_PREFIX_LEN: usize = 50;

/// Typed facade over a [`CacheStore`] for multi-type search results.
pub struct SearchCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl SearchCache {
    pub fn new(store: Arc<dyn CacheStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            ttl: config.cache_ttl,
        }
    }

    /// Deterministic cache key for one orchestration request.
    pub fn request_key(request: &MultiTypeSearchRequest, types: &[ResourceType]) -> String {
        let search = &request.search;
        let query = search.query.as_deref().filter(|q| !q.is_empty()).unwrap_or("empty");
        let filters = serde_json::to_string(&search.filters).unwrap_or_default();
        let types_part: Vec<&str> = types.iter().map(|t| t.as_wire_str()).collect();
        let grouping = if request.group_by_type { "grouped" } else { "combined" };
        let ranking = if request.global_relevance_sort { "global" } else { "type" };
        let pagination = search
            .pagination
            .map(|p| serde_json::to_string(&p).unwrap_or_default())
            .unwrap_or_default();
        let sort = search
            .sort
            .map(|s| serde_json::to_string(&s).unwrap_or_default())
            .unwrap_or_default();

        let key = [
            "multitype",
            query,
            &filters,
            &types_part.join(","),
            grouping,
            ranking,
            &pagination,
            &sort,
        ]
        .join(":");

        compact_key(&key)
    }

    /// Look up a cached result. Malformed or inconsistent entries are purged
    /// and reported as misses.
    pub async fn get(&self, key: &str) -> Result<Option<MultiTypeResult>> {
        let Some(bytes) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<MultiTypeResult>(&bytes) {
            Ok(result) if result.is_consistent() => Ok(Some(result)),
            Ok(_) => {
                tracing::debug!(key, "discarding inconsistent cache entry");
                self.store.remove(key).await?;
                Ok(None)
            }
            Err(e) => {
                tracing::debug!(key, error = %e, "discarding malformed cache entry");
                self.store.remove(key).await?;
                Ok(None)
            }
        }
    }

    pub async fn put(&self, key: &str, result: &MultiTypeResult) -> Result<()> {
        let bytes = serde_json::to_vec(result)?;
        self.store.set(key, bytes, self.ttl).await
    }
}

/// Compact long keys to `{prefix}:{crc32 of the full key}`.
fn compact_key(key: &str) -> String {
    if key.len() <= MAX_KEY_LEN {
        return key.to_string();
    }
    let checksum = crc32fast::hash(key.as_bytes());
    let boundary = key
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= KEY_PREFIX_LEN)
        .last()
        .unwrap_or(0);
    format!("{}:{checksum:08x}", &key[..boundary])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Pagination, SearchRequest};

    fn request(query: &str) -> MultiTypeSearchRequest {
        MultiTypeSearchRequest {
            search: SearchRequest {
                query: Some(query.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_identical_requests_share_a_key() {
        let types = [ResourceType::Api, ResourceType::Service];
        assert_eq!(
            SearchCache::request_key(&request("weather"), &types),
            SearchCache::request_key(&request("weather"), &types)
        );
    }

    #[test]
    fn test_request_dimensions_change_the_key() {
        let types = [ResourceType::Api];
        let base = SearchCache::request_key(&request("weather"), &types);

        assert_ne!(base, SearchCache::request_key(&request("payments"), &types));

        let mut grouped = request("weather");
        grouped.group_by_type = true;
        assert_ne!(base, SearchCache::request_key(&grouped, &types));

        let mut paged = request("weather");
        paged.search.pagination = Some(Pagination {
            page: Some(2),
            limit: Some(10),
            offset: None,
        });
        assert_ne!(base, SearchCache::request_key(&paged, &types));
    }

    #[test]
    fn test_empty_query_uses_placeholder() {
        let key = SearchCache::request_key(&request(""), &[ResourceType::Api]);
        assert!(key.starts_with("multitype:empty:"));
    }

    #[test]
    fn test_long_keys_are_compacted() {
        let long = "x".repeat(300);
        let compacted = compact_key(&long);
        assert!(compacted.len() <= MAX_KEY_LEN);
        assert_ne!(compacted, compact_key(&format!("{long}y")));
    }

    #[tokio::test]
    async fn test_inconsistent_entry_is_a_miss() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = SearchCache::new(store.clone(), &EngineConfig::default());

        let mut broken = MultiTypeResult {
            results_by_type: Default::default(),
            combined_results: Vec::new(),
            total_across_types: 42,
            global_facets: Default::default(),
            took_ms: 0,
            page: None,
            limit: None,
            has_more: false,
            metadata: Default::default(),
        };
        broken.total_across_types = 42;
        cache.put("k", &broken).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());

        broken.total_across_types = 0;
        cache.put("k", &broken).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_some());
    }
}
