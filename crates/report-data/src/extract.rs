//! LLM-extraction scraper client
//!
//! The crawler itself is an external service: it loads a page, runs an
//! LLM extraction strategy against a JSON schema and an instruction, and
//! returns structured JSON. This module wraps its HTTP API and provides
//! the normalization helpers the tasks share.

use crate::error::{DataError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// One extraction call: page, target schema, instruction
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRequest {
    /// Page to crawl
    pub url: String,
    /// JSON schema the extraction must conform to
    pub schema: Value,
    /// Natural-language extraction instruction
    pub instruction: String,
    /// Ask the crawler to extract over the markdown rendering
    pub markdown: bool,
}

impl ExtractionRequest {
    /// Create a request with markdown rendering disabled
    pub fn new(url: impl Into<String>, schema: Value, instruction: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            schema,
            instruction: instruction.into(),
            markdown: false,
        }
    }

    /// Enable markdown rendering
    pub fn markdown(mut self) -> Self {
        self.markdown = true;
        self
    }
}

/// Extraction-capable scraper collaborator
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Run one extraction and return the structured content
    async fn extract(&self, request: ExtractionRequest) -> Result<Value>;
}

/// HTTP client for a deployed extraction service
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    client: Client,
    endpoint: Url,
    api_token: Option<String>,
}

impl HttpExtractor {
    /// Create a client for the service at `endpoint`
    pub fn new(endpoint: &str, api_token: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| DataError::Config(format!("invalid extractor endpoint: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_token,
        })
    }

    /// Create from EXTRACTOR_URL and optional EXTRACTOR_API_TOKEN
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("EXTRACTOR_URL").map_err(|_| {
            DataError::Config("EXTRACTOR_URL environment variable not set".to_string())
        })?;
        let api_token = std::env::var("EXTRACTOR_API_TOKEN").ok();
        Self::new(&endpoint, api_token)
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, request: ExtractionRequest) -> Result<Value> {
        debug!(url = %request.url, "extraction request");

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DataError::Extraction(format!("HTTP {status}: {detail}")));
        }

        let body: Value = response.json().await?;
        match body {
            Value::Null => Err(DataError::Extraction(format!(
                "no content extracted from {}",
                request.url
            ))),
            other => Ok(coerce_json(other)),
        }
    }
}

/// Parse string payloads that carry JSON, pass everything else through
pub fn coerce_json(value: Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

/// Reduce a list payload to its first object entry
///
/// Extraction output is frequently a one-element array; an empty list or
/// a list of non-objects reduces to `Null`.
pub fn first_entry(value: Value) -> Value {
    match value {
        Value::Array(mut entries) => {
            if entries.is_empty() {
                Value::Null
            } else {
                entries.swap_remove(0)
            }
        }
        other => other,
    }
}
