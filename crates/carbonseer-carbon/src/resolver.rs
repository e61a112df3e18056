//! Carbon intensity resolver — cache, provider chain, fallback table.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info};

use carbonseer_core::ControllerConfig;

use crate::cache::{CacheLookup, CarbonCache};
use crate::error::ProviderResult;
use crate::provider::{CarbonProvider, build_providers};

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarbonSource {
    /// Fresh cache entry (resolved earlier or pushed).
    Cache,
    /// Named provider.
    Provider(String),
    /// Last value pushed through ingestion.
    Pushed,
    /// Static `carbon_map` entry.
    Map,
    /// Global `default_carbon`.
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: f64,
    pub source: CarbonSource,
}

pub struct CarbonResolver {
    cache: CarbonCache,
    providers: Vec<Box<dyn CarbonProvider>>,
    carbon_map: HashMap<String, f64>,
    default_carbon: f64,
    ttl: Duration,
}

impl CarbonResolver {
    pub fn new(
        cache: CarbonCache,
        providers: Vec<Box<dyn CarbonProvider>>,
        carbon_map: HashMap<String, f64>,
        default_carbon: f64,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            providers,
            carbon_map,
            default_carbon,
            ttl,
        }
    }

    /// Build the resolver and its provider chain from config.
    pub fn from_config(config: &ControllerConfig, cache: CarbonCache) -> ProviderResult<Self> {
        let providers = build_providers(&config.provider_specs(), config.provider_timeout())?;
        info!(
            providers = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            ttl_secs = config.cache_ttl_seconds,
            "carbon resolver initialized"
        );
        Ok(Self::new(
            cache,
            providers,
            config.carbon_map.clone(),
            config.default_carbon,
            config.cache_ttl(),
        ))
    }

    pub fn cache(&self) -> &CarbonCache {
        &self.cache
    }

    /// Resolve the intensity for `region`. Never fails.
    pub async fn resolve(&self, region: &str) -> f64 {
        self.resolve_detailed(region).await.value
    }

    /// Resolve and report which source answered.
    pub async fn resolve_detailed(&self, region: &str) -> Resolution {
        let seen = match self.cache.lookup(region, self.ttl).await {
            CacheLookup::Hit(value) => {
                return Resolution {
                    value,
                    source: CarbonSource::Cache,
                };
            }
            CacheLookup::Miss { revision } => revision,
        };

        let resolution = match self.from_providers(region).await {
            Some(resolution) => resolution,
            None => self.fallback(region).await,
        };

        let held = self
            .cache
            .store_resolved(region, resolution.value, seen)
            .await;
        if held != resolution.value {
            // A push won the race; report what the cache now holds.
            return Resolution {
                value: held,
                source: CarbonSource::Cache,
            };
        }

        debug!(%region, value = resolution.value, source = ?resolution.source, "carbon intensity resolved");
        resolution
    }

    async fn from_providers(&self, region: &str) -> Option<Resolution> {
        for provider in &self.providers {
            if let Some(value) = provider.fetch(region).await {
                return Some(Resolution {
                    value,
                    source: CarbonSource::Provider(provider.name().to_string()),
                });
            }
        }
        None
    }

    async fn fallback(&self, region: &str) -> Resolution {
        if let Some(value) = self.cache.pushed_value(region).await {
            return Resolution {
                value,
                source: CarbonSource::Pushed,
            };
        }
        match self.carbon_map.get(region) {
            Some(&value) => Resolution {
                value,
                source: CarbonSource::Map,
            },
            None => Resolution {
                value: self.default_carbon,
                source: CarbonSource::Default,
            },
        }
    }
}
