//! JMA bosai API client.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tenki_core::ApiConfig;
use tracing::instrument;

use crate::error::{ForecastError, ForecastResult};
use crate::normalize::{normalize, normalize_daily};
use crate::types::{AreaCatalog, ForecastRecord, Region};

const USER_AGENT: &str = concat!("tenki/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct JmaClient {
    client: Client,
    area_url: String,
    forecast_url_base: String,
}

impl JmaClient {
    pub fn new(api: &ApiConfig) -> ForecastResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            area_url: api.area_url.clone(),
            forecast_url_base: api.forecast_url_base.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the forecast document for a region code. The code is not
    /// validated, only percent-encoded.
    pub fn forecast_url(&self, region_code: &str) -> String {
        format!(
            "{}/{}.json",
            self.forecast_url_base,
            urlencoding::encode(region_code)
        )
    }

    /// Fetch the region catalog, sorted by code.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_regions(&self) -> ForecastResult<Vec<Region>> {
        let body = self.get_text(&self.area_url).await?;
        let catalog: AreaCatalog = serde_json::from_str(&body)
            .map_err(|e| ForecastError::parse(format!("area catalog: {}", e)))?;

        let regions = catalog.into_regions();
        tracing::debug!("Fetched {} regions", regions.len());
        Ok(regions)
    }

    /// Fetch the raw forecast document for a region code.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast_raw(&self, region_code: &str) -> ForecastResult<Value> {
        let url = self.forecast_url(region_code);
        let body = self.get_text(&url).await?;
        serde_json::from_str(&body)
            .map_err(|e| ForecastError::parse(format!("forecast {}: {}", region_code, e)))
    }

    /// Fetch and normalize the forecast for the report day.
    pub async fn fetch_forecast(&self, region_code: &str) -> ForecastResult<ForecastRecord> {
        let doc = self.fetch_forecast_raw(region_code).await?;
        normalize(region_code, &doc)
    }

    /// Fetch and normalize one record per forecast day.
    pub async fn fetch_daily(&self, region_code: &str) -> ForecastResult<Vec<ForecastRecord>> {
        let doc = self.fetch_forecast_raw(region_code).await?;
        normalize_daily(region_code, &doc)
    }

    async fn get_text(&self, url: &str) -> ForecastResult<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ForecastError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
