//! Multi-type search orchestration.
//!
//! `MultiTypeSearchEngine` fans one request out across the resource-type
//! partitions, tolerates individual partition failures, re-ranks the union
//! globally, merges facets, paginates the combined list and caches the final
//! bundle. It is the crate's main entry point.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use crate::backend::SearchBackend;
use crate::cache::{CacheStore, SearchCache};
use crate::config::EngineConfig;
use crate::error::{Result, SeineError};
use crate::query::build_type_distribution_body;
use crate::search::executor::{SearchExecutor, TypeOutcome};
use crate::search::export::{ExportBundle, ExportFormat, ExportOutcome, to_rows};
use crate::search::facets::merge_facets;
use crate::search::pagination::paginate;
use crate::search::ranker::sort_by_global_relevance;
use crate::types::{
    Facets, MultiTypeResult, MultiTypeSearchRequest, PerTypeResult, ResourceType, SearchMetadata,
    SearchRequest, SearchResults,
};

/// Orchestrates fan-out search across resource-type partitions.
pub struct MultiTypeSearchEngine {
    executor: SearchExecutor,
    cache: Option<SearchCache>,
    config: Arc<EngineConfig>,
    backend: Arc<dyn SearchBackend>,
}

impl MultiTypeSearchEngine {
    /// Create an engine without result caching.
    pub fn new(backend: Arc<dyn SearchBackend>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        Ok(Self {
            executor: SearchExecutor::new(Arc::clone(&backend), Arc::clone(&config)),
            cache: None,
            config,
            backend,
        })
    }

    /// Create an engine that caches result bundles in `store`.
    pub fn with_cache(
        backend: Arc<dyn SearchBackend>,
        config: EngineConfig,
        store: Arc<dyn CacheStore>,
    ) -> Result<Self> {
        let mut engine = Self::new(backend, config)?;
        if engine.config.enable_caching {
            engine.cache = Some(SearchCache::new(store, &engine.config));
        }
        Ok(engine)
    }

    /// Search every requested type, interleave and rank the union, and
    /// return one combined, paginated bundle.
    ///
    /// Partition failures degrade the result instead of failing it: the
    /// failed type contributes an empty slice and a zero in the type
    /// distribution. Only orchestration-level problems (invalid request,
    /// whole-request timeout) surface as errors.
    pub async fn search_all_types(
        &self,
        request: &MultiTypeSearchRequest,
    ) -> Result<MultiTypeResult> {
        let started = Instant::now();
        let types = request.resolved_types();

        let cache_key = self
            .cache
            .as_ref()
            .map(|_| SearchCache::request_key(request, &types));

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key)
            && let Some(hit) = cache.get(key).await?
        {
            tracing::debug!(key, "serving multi-type search from cache");
            return Ok(hit);
        }

        let outcomes = tokio::time::timeout(
            self.config.request_timeout,
            self.executor.search_types(&types, &request.search, |ty| {
                request
                    .limits_per_type
                    .get(&ty)
                    .copied()
                    .unwrap_or(self.config.per_type_limit)
            }),
        )
        .await
        .map_err(|_| {
            SeineError::timeout(format!(
                "multi-type search exceeded {:?}",
                self.config.request_timeout
            ))
        })?;

        let mut result = self.aggregate(request, &types, outcomes);
        result.took_ms = started.elapsed().as_millis() as u64;

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key)
            && let Err(e) = cache.put(key, &result).await
        {
            tracing::warn!(error = %e, "failed to cache multi-type result");
        }

        Ok(result)
    }

    /// Search with per-type grouping: hit lists stay separate per type and
    /// no global re-ranking is applied.
    pub async fn search_with_type_grouping(
        &self,
        request: &MultiTypeSearchRequest,
    ) -> Result<MultiTypeResult> {
        let mut grouped = request.clone();
        grouped.group_by_type = true;
        grouped.global_relevance_sort = false;
        self.search_all_types(&grouped).await
    }

    /// Search one partition only. Unlike the multi-type paths this
    /// propagates backend failures, since there is nothing to degrade to.
    pub async fn search_single_type(
        &self,
        ty: ResourceType,
        request: &SearchRequest,
    ) -> Result<SearchResults> {
        let started = Instant::now();
        let default_limit = self.config.default_page_size;
        let (from, size, page, limit) = match &request.pagination {
            Some(p) => (
                u32::try_from(p.effective_offset(default_limit)).unwrap_or(u32::MAX),
                p.effective_limit(default_limit) as u32,
                Some(p.page.unwrap_or(1).max(1)),
                Some(p.effective_limit(default_limit) as u32),
            ),
            None => (0, default_limit, None, None),
        };

        let per_type = self.executor.search_type(ty, request, size, from).await?;
        Ok(SearchResults {
            hits: per_type.hits,
            total: per_type.total,
            facets: per_type.facets,
            took_ms: started.elapsed().as_millis() as u64,
            page,
            limit,
        })
    }

    /// Count matches per resource type without fetching hits.
    pub async fn type_distribution(
        &self,
        request: &SearchRequest,
    ) -> Result<BTreeMap<ResourceType, u64>> {
        let body = build_type_distribution_body(request, &self.config);
        let partition = self.config.all_types_partition();
        let response = self.backend.search(&partition, &body).await?;

        let mut distribution: BTreeMap<ResourceType, u64> =
            ResourceType::ALL.iter().map(|&ty| (ty, 0)).collect();
        if let Some(buckets) = response.aggregations.get("resourceTypes") {
            for bucket in buckets {
                if let Some(ty) = ResourceType::from_wire_str(&bucket.key) {
                    distribution.insert(ty, bucket.doc_count);
                }
            }
        }
        Ok(distribution)
    }

    /// Export matches per type in the requested format. An explicit `types`
    /// slice selects the partitions to export; when empty, the request's
    /// include list applies. Types whose fetch fails are listed in the
    /// outcome instead of failing the export.
    pub async fn export_by_type(
        &self,
        request: &MultiTypeSearchRequest,
        types: &[ResourceType],
        format: ExportFormat,
    ) -> Result<ExportOutcome> {
        let types = if types.is_empty() {
            request.resolved_types()
        } else {
            let mut types = types.to_vec();
            types.sort();
            types.dedup();
            types
        };

        let fetches = types.iter().map(|&ty| {
            let search = &request.search;
            let page_size = request
                .limits_per_type
                .get(&ty)
                .copied()
                .unwrap_or(self.config.export_page_size);
            async move {
                (
                    ty,
                    self.executor.search_type(ty, search, page_size, 0).await,
                )
            }
        });

        let mut bundles = Vec::new();
        let mut failed_types = Vec::new();
        for (ty, fetched) in join_all(fetches).await {
            match fetched {
                Ok(per_type) => {
                    let rows = to_rows(&per_type.hits, format);
                    bundles.push(ExportBundle {
                        resource_type: ty,
                        format,
                        count: rows.len(),
                        rows,
                        exported_at: chrono::Utc::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!(resource_type = %ty, error = %e, "export fetch failed");
                    failed_types.push(ty);
                }
            }
        }

        Ok(ExportOutcome {
            bundles,
            failed_types,
        })
    }

    /// Fold per-type outcomes into the combined result bundle.
    fn aggregate(
        &self,
        request: &MultiTypeSearchRequest,
        types: &[ResourceType],
        outcomes: Vec<TypeOutcome>,
    ) -> MultiTypeResult {
        let mut results_by_type: BTreeMap<ResourceType, PerTypeResult> = BTreeMap::new();
        for outcome in outcomes {
            let per_type = match outcome.result {
                Ok(per_type) => per_type,
                Err(e) => {
                    tracing::warn!(
                        resource_type = %outcome.resource_type,
                        error = %e,
                        "partition search failed, substituting empty result"
                    );
                    PerTypeResult::default()
                }
            };
            results_by_type.insert(outcome.resource_type, per_type);
        }

        let total_across_types: u64 = results_by_type.values().map(|r| r.total).sum();
        let type_distribution: BTreeMap<ResourceType, u64> = results_by_type
            .iter()
            .map(|(&ty, r)| (ty, r.total))
            .collect();

        let per_type_facets: Vec<&Facets> =
            results_by_type.values().map(|r| &r.facets).collect();
        let global_facets = merge_facets(per_type_facets);

        let mut all_hits: Vec<_> = results_by_type
            .values()
            .flat_map(|r| r.hits.iter().cloned())
            .collect();
        if request.global_relevance_sort {
            sort_by_global_relevance(&mut all_hits);
        }

        let page = paginate(
            all_hits,
            request.search.pagination.as_ref(),
            self.config.default_page_size,
        );

        MultiTypeResult {
            results_by_type,
            combined_results: page.hits,
            total_across_types,
            global_facets,
            took_ms: 0,
            page: page.page,
            limit: page.limit,
            has_more: page.has_more,
            metadata: SearchMetadata {
                query: request.search.query.clone(),
                filters: request.search.filters.clone(),
                pagination: request.search.pagination,
                type_distribution,
                searched_types: types.to_vec(),
                group_by_type: request.group_by_type,
                global_relevance_sort: request.global_relevance_sort,
            },
        }
    }
}
