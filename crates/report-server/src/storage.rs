//! Object-store collaborator and CDN URL rewriting

use crate::store::StoreError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const DEFAULT_GCS_BASE_URL: &str = "https://storage.googleapis.com";
const UPLOAD_TIMEOUT_SECS: u64 = 300;

/// Cloud object storage: upload bytes, get back a public URL
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload an object and return its public (CDN-rewritten) URL
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError>;
}

/// GCS JSON-API client
#[derive(Debug, Clone)]
pub struct GcsClient {
    client: Client,
    bucket: String,
    access_token: Option<String>,
    base_url: String,
    cdn_base_url: Option<String>,
}

impl GcsClient {
    /// Create a client for the given bucket
    pub fn new(
        bucket: impl Into<String>,
        access_token: Option<String>,
        cdn_base_url: Option<String>,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self {
            client,
            bucket: bucket.into(),
            access_token,
            base_url: DEFAULT_GCS_BASE_URL.to_string(),
            cdn_base_url,
        })
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={path}",
            self.base_url, self.bucket
        );
        debug!(%path, size = bytes.len(), "uploading object");

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", content_type)
            .body(bytes);
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!("upload failed: HTTP {status}: {detail}")));
        }

        let public_url = format!("{}/{}/{path}", self.base_url, self.bucket);
        Ok(swap_cdn_url(&public_url, &self.base_url, self.cdn_base_url.as_deref()))
    }
}

/// Object store stand-in for deployments without a bucket configured
pub struct DisabledObjectStore;

#[async_trait]
impl ObjectStore for DisabledObjectStore {
    async fn upload(&self, _: &str, _: Vec<u8>, _: &str) -> Result<String, StoreError> {
        Err(StoreError::Backend("object storage not configured".to_string()))
    }
}

/// Swap a storage base URL for the CDN base URL, preserving the path
///
/// With no CDN base configured the URL is returned unchanged.
pub fn swap_cdn_url(url: &str, old_base_url: &str, cdn_base_url: Option<&str>) -> String {
    let Some(new_base_url) = cdn_base_url else {
        return url.to_string();
    };

    let pattern = format!("{}/[^\\s]+", regex::escape(old_base_url));
    let Ok(re) = Regex::new(&pattern) else {
        return url.to_string();
    };

    re.replace_all(url, |captures: &regex::Captures<'_>| {
        captures[0].replacen(old_base_url, new_base_url, 1)
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_cdn_url_replaces_base() {
        let url = "https://storage.googleapis.com/bucket/runs/r-1.json";
        let swapped = swap_cdn_url(url, "https://storage.googleapis.com", Some("https://cdn.example.com"));
        assert_eq!(swapped, "https://cdn.example.com/bucket/runs/r-1.json");
    }

    #[test]
    fn test_swap_cdn_url_without_cdn_is_identity() {
        let url = "https://storage.googleapis.com/bucket/runs/r-1.json";
        assert_eq!(swap_cdn_url(url, "https://storage.googleapis.com", None), url);
    }

    #[test]
    fn test_swap_cdn_url_leaves_other_hosts() {
        let url = "https://other.example.com/bucket/file";
        let swapped = swap_cdn_url(url, "https://storage.googleapis.com", Some("https://cdn.example.com"));
        assert_eq!(swapped, url);
    }
}
