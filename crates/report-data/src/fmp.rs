//! Financial Modeling Prep API client

use crate::error::{DataError, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const BASE_URL_V3: &str = "https://financialmodelingprep.com/api/v3";
const BASE_URL_V4: &str = "https://financialmodelingprep.com/api/v4";
const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Market-data provider consumed by the report tasks
///
/// Kept as a trait so the pipeline receives an injected client and tests
/// substitute doubles with scripted payloads.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Company profile list for a symbol
    async fn company_profile(&self, symbol: &str) -> Result<Value>;

    /// Full historical price series
    async fn historical_prices(&self, symbol: &str) -> Result<Value>;

    /// Key metrics statements
    async fn key_metrics(&self, symbol: &str) -> Result<Value>;

    /// Income statements
    async fn income_statement(&self, symbol: &str) -> Result<Value>;

    /// Balance sheet statements
    async fn balance_sheet(&self, symbol: &str) -> Result<Value>;

    /// Cash flow statements
    async fn cash_flow_statement(&self, symbol: &str) -> Result<Value>;

    /// Piotroski score endpoint
    async fn piotroski_score(&self, symbol: &str) -> Result<Value>;

    /// Product revenue segmentation
    async fn revenue_product_segmentation(&self, symbol: &str) -> Result<Value>;
}

/// API version selector
#[derive(Debug, Clone, Copy)]
enum ApiVersion {
    V3,
    V4,
}

/// Financial Modeling Prep HTTP client
#[derive(Debug, Clone)]
pub struct FmpClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl FmpClient {
    /// Create a new client with an API key and rate limit (requests/minute)
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(DataError::Config("API key must be provided".to_string()));
        }

        let quota = Quota::per_minute(
            NonZeroU32::new(rate_limit)
                .unwrap_or_else(|| NonZeroU32::new(DEFAULT_RATE_LIMIT_PER_MINUTE).expect("nonzero")),
        );
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            rate_limiter,
        })
    }

    /// Create from the FMP_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("FMP_API_KEY").map_err(|_| {
            DataError::Config("FMP_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key, DEFAULT_RATE_LIMIT_PER_MINUTE)
    }

    async fn request(&self, version: ApiVersion, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let base = match version {
            ApiVersion::V3 => BASE_URL_V3,
            ApiVersion::V4 => BASE_URL_V4,
        };
        let url = format!("{base}/{path}");
        debug!(%url, "FMP request");

        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("apikey", self.api_key.as_str()));

        let response = self.client.get(&url).query(&query).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(DataError::RateLimited {
                provider: "Financial Modeling Prep".to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::Api(format!("HTTP error: {status}")));
        }

        let data: Value = response.json().await?;

        // FMP signals errors inside a 200 body
        if let Some(message) = data.get("Error Message").and_then(Value::as_str) {
            return Err(DataError::Api(message.to_string()));
        }

        Ok(data)
    }
}

#[async_trait]
impl MarketData for FmpClient {
    async fn company_profile(&self, symbol: &str) -> Result<Value> {
        self.request(ApiVersion::V3, &format!("profile/{symbol}"), &[]).await
    }

    async fn historical_prices(&self, symbol: &str) -> Result<Value> {
        self.request(ApiVersion::V3, &format!("historical-price-full/{symbol}"), &[])
            .await
    }

    async fn key_metrics(&self, symbol: &str) -> Result<Value> {
        self.request(ApiVersion::V3, &format!("key-metrics/{symbol}"), &[]).await
    }

    async fn income_statement(&self, symbol: &str) -> Result<Value> {
        self.request(ApiVersion::V3, &format!("income-statement/{symbol}"), &[])
            .await
    }

    async fn balance_sheet(&self, symbol: &str) -> Result<Value> {
        self.request(ApiVersion::V3, &format!("balance-sheet-statement/{symbol}"), &[])
            .await
    }

    async fn cash_flow_statement(&self, symbol: &str) -> Result<Value> {
        self.request(ApiVersion::V3, &format!("cash-flow-statement/{symbol}"), &[])
            .await
    }

    async fn piotroski_score(&self, symbol: &str) -> Result<Value> {
        self.request(ApiVersion::V4, "score", &[("symbol", symbol)]).await
    }

    async fn revenue_product_segmentation(&self, symbol: &str) -> Result<Value> {
        self.request(ApiVersion::V4, "revenue-product-segmentation", &[("symbol", symbol)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        let err = FmpClient::new("", 5).unwrap_err();
        assert!(matches!(err, DataError::Config(_)));
    }

    #[test]
    fn test_client_construction() {
        let client = FmpClient::new("demo", 5).expect("client");
        assert_eq!(client.api_key, "demo");
    }
}
