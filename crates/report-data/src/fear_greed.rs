//! CNN fear & greed index client

use crate::error::{DataError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

const GRAPH_DATA_URL: &str = "https://production.dataviz.cnn.io/index/fearandgreed/graphdata";
const REFERER: &str = "https://edition.cnn.com/markets/fear-and-greed";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Fear & greed index feed
#[async_trait]
pub trait FearGreedFeed: Send + Sync {
    /// Graph data for a date (YYYY-MM-DD); `None` when the feed has no
    /// data for that date or rejects the request
    async fn graph_data(&self, date: &str) -> Result<Option<Value>>;
}

/// CNN dataviz endpoint client
///
/// The endpoint sits behind bot detection, so requests carry browser-like
/// headers; an HTTP 418 is reported as a bot-detection error.
#[derive(Debug, Clone)]
pub struct CnnFearGreedClient {
    client: Client,
}

impl CnnFearGreedClient {
    /// Create a new client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FearGreedFeed for CnnFearGreedClient {
    async fn graph_data(&self, date: &str) -> Result<Option<Value>> {
        let url = format!("{GRAPH_DATA_URL}/{date}");
        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Referer", REFERER)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        match response.status().as_u16() {
            200 => Ok(Some(response.json().await?)),
            418 => Err(DataError::BotDetection { url }),
            status => {
                warn!(%url, status, "fear & greed feed returned non-success");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        assert!(CnnFearGreedClient::new().is_ok());
    }

    #[test]
    fn test_bot_detection_display() {
        let err = DataError::BotDetection {
            url: format!("{GRAPH_DATA_URL}/2026-08-07"),
        };
        assert!(err.to_string().contains("bot detection"));
    }
}
