//! Forecast service: fetch, normalize and cache.
//!
//! Every method here swallows errors: failures are logged and surface as
//! `None` or an empty list, which callers render as "no data".

use chrono::{Duration, Utc};
use tenki_core::{ApiConfig, Config};

use crate::cache::ForecastCache;
use crate::client::JmaClient;
use crate::error::ForecastResult;
use crate::types::{ForecastRecord, Region};

/// The cache's SQLite connection is borrowed across `.await`, so these
/// futures are not `Send`. Drive them on the current task (`block_on`,
/// `#[tokio::main]`), never through `tokio::spawn`.
pub struct ForecastService {
    client: JmaClient,
    cache: Option<ForecastCache>,
    ttl: Duration,
    icon_url_base: String,
}

impl ForecastService {
    /// Service backed by the SQLite cache at `config.db_path()`.
    pub fn new(config: &Config) -> ForecastResult<Self> {
        let cache = ForecastCache::new(config.db_path())?;
        let client = JmaClient::new(&config.api)?;
        Ok(Self::with_parts(
            client,
            Some(cache),
            Duration::minutes(i64::from(config.cache.cache_ttl_minutes)),
            &config.api.icon_url_base,
        ))
    }

    /// Service that always goes to the network.
    pub fn without_cache(api: &ApiConfig) -> ForecastResult<Self> {
        let client = JmaClient::new(api)?;
        Ok(Self::with_parts(client, None, Duration::zero(), &api.icon_url_base))
    }

    pub fn with_parts(
        client: JmaClient,
        cache: Option<ForecastCache>,
        ttl: Duration,
        icon_url_base: &str,
    ) -> Self {
        Self {
            client,
            cache,
            ttl,
            icon_url_base: icon_url_base.to_string(),
        }
    }

    pub fn cache(&self) -> Option<&ForecastCache> {
        self.cache.as_ref()
    }

    /// Refresh the region catalog and return it.
    ///
    /// With a cache, fetched regions are stored first and the list is read
    /// back from the cache, so a failed fetch still yields earlier regions.
    pub async fn regions(&self) -> Vec<Region> {
        let fetched = match self.client.fetch_regions().await {
            Ok(regions) => regions,
            Err(e) => {
                tracing::warn!("Failed to fetch region catalog: {}", e);
                Vec::new()
            }
        };

        let Some(cache) = &self.cache else {
            return fetched;
        };

        if !fetched.is_empty() {
            match cache.store_regions(&fetched) {
                Ok(n) => tracing::debug!("Cached {} new regions", n),
                Err(e) => tracing::warn!("Failed to cache regions: {}", e),
            }
        }

        match cache.list_regions() {
            Ok(regions) => regions,
            Err(e) => {
                tracing::warn!("Failed to read cached regions: {}", e);
                fetched
            }
        }
    }

    /// Cached display name for a region code.
    pub fn region_name(&self, code: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.region_name(code) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("Failed to read region name for {}: {}", code, e);
                None
            }
        }
    }

    /// Fetch a forecast from the network, bypassing the cache.
    pub async fn fetch_fresh(&self, code: &str) -> Option<ForecastRecord> {
        match self.client.fetch_forecast(code).await {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Failed to fetch forecast for {}: {}", code, e);
                None
            }
        }
    }

    /// Current forecast for a region code.
    ///
    /// A cached row younger than the TTL is returned as is. Otherwise a
    /// fresh forecast is fetched and appended. If that fetch fails the
    /// stale row is still returned.
    pub async fn forecast(&self, code: &str) -> Option<ForecastRecord> {
        let Some(cache) = &self.cache else {
            return self.fetch_fresh(code).await;
        };

        let cached = match cache.latest_forecast(code) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Failed to read cached forecast for {}: {}", code, e);
                None
            }
        };

        let stale = match cached {
            Some(c) if !c.is_stale(self.ttl, Utc::now()) => {
                tracing::debug!("Using cached forecast for {}", code);
                return Some(c.record);
            }
            other => other,
        };

        match self.fetch_and_store(cache, code).await {
            Some(record) => Some(record),
            None => stale.map(|c| {
                tracing::warn!(
                    "Serving stale forecast for {} fetched at {}",
                    code,
                    c.fetched_at
                );
                c.record
            }),
        }
    }

    /// Fetch and cache a forecast regardless of cache age.
    pub async fn refresh(&self, code: &str) -> Option<ForecastRecord> {
        match &self.cache {
            Some(cache) => self.fetch_and_store(cache, code).await,
            None => self.fetch_fresh(code).await,
        }
    }

    /// One record per forecast day, straight from the network.
    pub async fn daily(&self, code: &str) -> Vec<ForecastRecord> {
        match self.client.fetch_daily(code).await {
            Ok(days) => days,
            Err(e) => {
                tracing::warn!("Failed to fetch daily forecast for {}: {}", code, e);
                Vec::new()
            }
        }
    }

    pub fn icon_url(&self, record: &ForecastRecord) -> Option<String> {
        record.icon_url(&self.icon_url_base)
    }

    async fn fetch_and_store(&self, cache: &ForecastCache, code: &str) -> Option<ForecastRecord> {
        let record = self.fetch_fresh(code).await?;
        if let Err(e) = cache.store_forecast(&record) {
            tracing::warn!("Failed to cache forecast for {}: {}", code, e);
        }
        Some(record)
    }
}
