//! Shared per-region carbon cache.
//!
//! One mutex guards the whole map. Both the resolver (read, then write
//! after a provider fetch) and the ingestion endpoint (write) go through
//! it, and every access is a single critical section.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Last known intensity for a region. Last write wins.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub region: String,
    /// gCO2eq/kWh.
    pub value: f64,
    pub observed_at: Instant,
    /// Bumped on every write to the region. Lets the resolver detect a
    /// push that landed while it was talking to providers.
    pub revision: u64,
}

/// Outcome of a freshness check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheLookup {
    /// Entry is younger than the TTL.
    Hit(f64),
    /// No entry, or a stale one. Carries the revision seen, if any.
    Miss { revision: Option<u64> },
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    /// Values pushed through ingestion, kept as the region's fallback
    /// once the cache entry itself goes stale.
    pushed: HashMap<String, f64>,
    next_revision: u64,
}

impl Inner {
    fn write(&mut self, region: &str, value: f64) -> CacheEntry {
        self.next_revision += 1;
        let entry = CacheEntry {
            region: region.to_string(),
            value,
            observed_at: Instant::now(),
            revision: self.next_revision,
        };
        self.entries.insert(region.to_string(), entry.clone());
        entry
    }
}

/// Cloneable handle to the shared cache.
#[derive(Debug, Clone, Default)]
pub struct CarbonCache {
    inner: Arc<Mutex<Inner>>,
}

impl CarbonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value if it is younger than `ttl`.
    ///
    /// A zero TTL never hits.
    pub async fn lookup(&self, region: &str, ttl: Duration) -> CacheLookup {
        let inner = self.inner.lock().await;
        match inner.entries.get(region) {
            Some(entry) if entry.observed_at.elapsed() < ttl => CacheLookup::Hit(entry.value),
            Some(entry) => CacheLookup::Miss {
                revision: Some(entry.revision),
            },
            None => CacheLookup::Miss { revision: None },
        }
    }

    /// Store a resolved value unless the region was written since `seen`
    /// was observed. Returns the value now held for the region.
    pub async fn store_resolved(&self, region: &str, value: f64, seen: Option<u64>) -> f64 {
        let mut inner = self.inner.lock().await;
        let current = inner.entries.get(region).map(|e| (e.revision, e.value));
        match current {
            Some((revision, newer)) if Some(revision) != seen => {
                debug!(%region, kept = newer, discarded = value, "region updated during resolution");
                newer
            }
            _ => inner.write(region, value).value,
        }
    }

    /// Record an externally pushed reading. Overrides whatever is cached
    /// and becomes the region's fallback value.
    pub async fn push(&self, region: &str, value: f64) -> CacheEntry {
        let mut inner = self.inner.lock().await;
        inner.pushed.insert(region.to_string(), value);
        inner.write(region, value)
    }

    /// Last value pushed for a region, if any.
    pub async fn pushed_value(&self, region: &str) -> Option<f64> {
        self.inner.lock().await.pushed.get(region).copied()
    }

    pub async fn get(&self, region: &str) -> Option<CacheEntry> {
        self.inner.lock().await.entries.get(region).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn empty_cache_misses() {
        let cache = CarbonCache::new();
        assert_eq!(
            cache.lookup("eu", TTL).await,
            CacheLookup::Miss { revision: None }
        );
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_hits_until_ttl_elapses() {
        let cache = CarbonCache::new();
        cache.store_resolved("eu", 120.0, None).await;

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.lookup("eu", TTL).await, CacheLookup::Hit(120.0));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(matches!(
            cache.lookup("eu", TTL).await,
            CacheLookup::Miss { revision: Some(_) }
        ));
    }

    #[tokio::test]
    async fn zero_ttl_never_hits() {
        let cache = CarbonCache::new();
        cache.push("eu", 50.0).await;
        assert!(matches!(
            cache.lookup("eu", Duration::ZERO).await,
            CacheLookup::Miss { .. }
        ));
    }

    #[tokio::test]
    async fn push_overrides_cached_value() {
        let cache = CarbonCache::new();
        cache.store_resolved("eu", 400.0, None).await;
        let entry = cache.push("eu", 50.0).await;

        assert_eq!(entry.value, 50.0);
        assert_eq!(cache.lookup("eu", TTL).await, CacheLookup::Hit(50.0));
        assert_eq!(cache.pushed_value("eu").await, Some(50.0));
        assert_eq!(cache.pushed_value("us").await, None);
    }

    #[tokio::test]
    async fn resolved_write_does_not_clobber_concurrent_push() {
        let cache = CarbonCache::new();
        let seen = match cache.lookup("eu", TTL).await {
            CacheLookup::Miss { revision } => revision,
            CacheLookup::Hit(_) => panic!("unexpected hit"),
        };

        // A push lands while the resolver is fetching.
        cache.push("eu", 50.0).await;

        let held = cache.store_resolved("eu", 700.0, seen).await;
        assert_eq!(held, 50.0);
        assert_eq!(cache.get("eu").await.unwrap().value, 50.0);
    }

    #[tokio::test]
    async fn resolved_write_replaces_stale_entry_it_saw() {
        let cache = CarbonCache::new();
        cache.store_resolved("eu", 400.0, None).await;
        let seen = cache.get("eu").await.map(|e| e.revision);

        let held = cache.store_resolved("eu", 410.0, seen).await;
        assert_eq!(held, 410.0);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn revisions_increase_per_write() {
        let cache = CarbonCache::new();
        let a = cache.push("eu", 1.0).await.revision;
        let b = cache.push("us", 2.0).await.revision;
        let c = cache.push("eu", 3.0).await.revision;
        assert!(a < b && b < c);
    }
}
