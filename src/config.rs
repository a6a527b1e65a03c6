//! Configuration for the multi-type search engine.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ResourceType;

/// Configuration for the multi-type search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Prefix applied to all partition names.
    pub index_prefix: String,

    /// Explicit partition name per resource type; types not listed fall
    /// back to `{index_prefix}_{type}`.
    pub partition_aliases: BTreeMap<ResourceType, String>,

    /// Alias covering all resource types, used for type distribution.
    pub all_types_alias: Option<String>,

    /// Default geo radius in kilometers when a geo filter omits one.
    pub default_geo_radius_km: f64,

    /// Default page size when the request omits pagination.
    pub default_page_size: u32,

    /// Maximum hits fetched per type before global re-ranking.
    pub per_type_limit: u32,

    /// Page size for export batches.
    pub export_page_size: u32,

    /// Timeout for a single partition search.
    pub per_type_timeout: Duration,

    /// Overall timeout for the entire orchestration.
    pub request_timeout: Duration,

    /// Time-to-live for cached result bundles.
    pub cache_ttl: Duration,

    /// Enable result caching.
    pub enable_caching: bool,

    /// Request highlighted snippets when a text query is present.
    pub enable_highlighting: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_prefix: "marketplace".to_string(),
            partition_aliases: BTreeMap::new(),
            all_types_alias: None,
            default_geo_radius_km: 25.0,
            default_page_size: 20,
            per_type_limit: 100,
            export_page_size: 1000,
            per_type_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
            enable_caching: true,
            enable_highlighting: true,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the partition name prefix.
    pub fn with_index_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.index_prefix = prefix.into();
        self
    }

    /// Override the partition name for one resource type.
    pub fn with_partition_alias<S: Into<String>>(mut self, ty: ResourceType, name: S) -> Self {
        self.partition_aliases.insert(ty, name.into());
        self
    }

    /// Set the maximum hits fetched per type before re-ranking.
    pub fn with_per_type_limit(mut self, limit: u32) -> Self {
        self.per_type_limit = limit;
        self
    }

    /// Set the per-partition search timeout.
    pub fn with_per_type_timeout(mut self, timeout: Duration) -> Self {
        self.per_type_timeout = timeout;
        self
    }

    /// Set the cache time-to-live.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Enable or disable result caching.
    pub fn with_caching(mut self, enable: bool) -> Self {
        self.enable_caching = enable;
        self
    }

    /// Resolve the partition name for a resource type.
    pub fn partition_for(&self, ty: ResourceType) -> String {
        match self.partition_aliases.get(&ty) {
            Some(name) => name.clone(),
            None => format!("{}_{}", self.index_prefix, ty.as_partition_segment()),
        }
    }

    /// Resolve the alias that spans every resource type.
    pub fn all_types_partition(&self) -> String {
        match &self.all_types_alias {
            Some(name) => name.clone(),
            None => format!("{}_resources", self.index_prefix),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SeineError;

        if self.index_prefix.is_empty() {
            return Err(SeineError::config("index prefix must not be empty"));
        }

        if self.per_type_limit == 0 {
            return Err(SeineError::config(
                "per-type limit must be greater than 0",
            ));
        }

        if self.default_page_size == 0 {
            return Err(SeineError::config(
                "default page size must be greater than 0",
            ));
        }

        if !(self.default_geo_radius_km > 0.0) {
            return Err(SeineError::config(format!(
                "default geo radius must be positive, got {}",
                self.default_geo_radius_km
            )));
        }

        if self.per_type_timeout > self.request_timeout {
            return Err(SeineError::config(
                "per-type timeout must not exceed the request timeout",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partition_resolution() {
        let config = EngineConfig::new()
            .with_index_prefix("romapi")
            .with_partition_alias(ResourceType::Api, "romapi_apis_v2");

        assert_eq!(config.partition_for(ResourceType::Api), "romapi_apis_v2");
        assert_eq!(
            config.partition_for(ResourceType::Business),
            "romapi_business"
        );
        assert_eq!(config.all_types_partition(), "romapi_resources");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::new().with_per_type_limit(0);
        assert!(config.validate().is_err());

        let config = EngineConfig {
            per_type_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
