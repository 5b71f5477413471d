//! Injected collaborators and pipeline configuration

use report_core::TaskError;
use report_data::{DataCache, DataError, Extractor, FearGreedFeed, MarketData};
use report_llm::{AnalysisEngine, LlmError};
use std::sync::Arc;
use std::time::Duration;

/// Pipeline limits and knobs
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Per-task timeout for fetch tasks
    pub task_timeout: Duration,

    /// Optional request-level deadline for the fetch stages
    pub request_deadline: Option<Duration>,

    /// Max simultaneous narrative-generation calls
    pub summary_concurrency: usize,

    /// Per-call timeout for the summarization stage
    pub summary_timeout: Duration,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(30),
            request_deadline: None,
            summary_concurrency: 2,
            summary_timeout: Duration::from_secs(120),
        }
    }
}

/// Collaborators every task callable draws from
///
/// All clients are constructed by the caller and injected; tasks never
/// build their own. Cloning is cheap (everything is shared).
#[derive(Clone)]
pub struct TaskContext {
    /// Market-data provider (profiles, statements, prices)
    pub market: Arc<dyn MarketData>,
    /// Extraction-capable scraper
    pub extractor: Arc<dyn Extractor>,
    /// Narrative-generation engine
    pub engine: AnalysisEngine,
    /// Fear & greed feed
    pub fear_greed: Arc<dyn FearGreedFeed>,
    /// Statements cache
    pub cache: DataCache,
    /// Pipeline configuration
    pub config: ReportConfig,
}

impl TaskContext {
    /// Create a context from injected collaborators with default config
    pub fn new(
        market: Arc<dyn MarketData>,
        extractor: Arc<dyn Extractor>,
        engine: AnalysisEngine,
        fear_greed: Arc<dyn FearGreedFeed>,
        cache: DataCache,
    ) -> Self {
        Self {
            market,
            extractor,
            engine,
            fear_greed,
            cache,
            config: ReportConfig::default(),
        }
    }

    /// Replace the pipeline configuration
    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }
}

/// Map a data-provider failure to the uniform task error kind
pub(crate) fn data_err(error: DataError) -> TaskError {
    match error {
        DataError::Extraction(message) => TaskError::Extraction(message),
        DataError::BotDetection { url } => {
            TaskError::Extraction(format!("blocked by bot detection: {url}"))
        }
        DataError::Json(inner) => TaskError::Serialization(inner),
        other => TaskError::Provider(other.to_string()),
    }
}

/// Map an LLM failure to the uniform task error kind
pub(crate) fn llm_err(error: LlmError) -> TaskError {
    TaskError::Llm(error.to_string())
}
