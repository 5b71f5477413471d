//! Server configuration from the environment

use report_tasks::ReportConfig;
use report_utils::{optional_var, require_var};
use std::time::Duration;

/// Everything the server needs to construct its collaborators
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Market-data API key
    pub fmp_api_key: String,

    /// Default narrative model
    pub model: String,

    /// Extraction service endpoint
    pub extractor_url: String,

    /// Optional extraction service token
    pub extractor_token: Option<String>,

    /// JWT signing secret
    pub jwt_secret: String,

    /// Object-store bucket, uploads disabled when absent
    pub bucket: Option<String>,

    /// Object-store bearer token
    pub storage_token: Option<String>,

    /// CDN base URL for rewriting public object URLs
    pub cdn_base_url: Option<String>,

    /// Pipeline limits
    pub report: ReportConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// `OPENAI_API_KEY` is read separately by the provider constructor.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut report = ReportConfig::default();
        if let Some(timeout) = optional_var("TASK_TIMEOUT_SECS") {
            report.task_timeout = Duration::from_secs(timeout.parse()?);
        }
        if let Some(deadline) = optional_var("REQUEST_DEADLINE_SECS") {
            report.request_deadline = Some(Duration::from_secs(deadline.parse()?));
        }

        Ok(Self {
            fmp_api_key: require_var("FMP_API_KEY")?,
            model: optional_var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            extractor_url: require_var("EXTRACTOR_URL")?,
            extractor_token: optional_var("EXTRACTOR_API_TOKEN"),
            jwt_secret: require_var("JWT_SECRET_KEY")?,
            bucket: optional_var("BUCKET_NAME"),
            storage_token: optional_var("GCS_ACCESS_TOKEN"),
            cdn_base_url: optional_var("CDN_BASE_URL"),
            report,
        })
    }
}
