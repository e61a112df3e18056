//! carbonseer-carbon — carbon intensity resolution.
//!
//! Resolves a gCO2eq/kWh value for a region. The resolver never fails:
//! it walks cache, provider chain and fallback table until one yields.
//!
//! # Resolution order
//!
//! ```text
//! cache entry younger than TTL        → return it
//! providers in priority order         → first value wins
//! value last pushed via ingestion     → fallback override
//! carbon_map[region]                  → static table
//! default_carbon                      → global default
//! ```
//!
//! Whatever is obtained is written back to the cache with the current
//! time, so even a fallback lookup is repeated at most once per TTL.
//!
//! The cache is shared with the ingestion endpoint, which writes pushed
//! readings into it concurrently.

pub mod cache;
pub mod electricitymap;
pub mod error;
pub mod provider;
pub mod resolver;
pub mod watttime;

pub use cache::{CacheEntry, CacheLookup, CarbonCache};
pub use error::{ProviderError, ProviderResult};
pub use provider::{CarbonProvider, build_providers};
pub use resolver::{CarbonResolver, CarbonSource, Resolution};
