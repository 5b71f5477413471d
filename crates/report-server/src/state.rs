//! Application state: injected collaborators

use crate::auth::AuthVerifier;
use crate::config::ServerConfig;
use crate::storage::{DisabledObjectStore, GcsClient, ObjectStore};
use crate::store::{DocumentStore, MemoryStore};
use report_data::{CnnFearGreedClient, DataCache, FmpClient, HttpExtractor};
use report_llm::{AnalysisEngine, OpenAiProvider};
use report_tasks::{TaskContext, fundamentals::STATEMENTS_CACHE_TTL};
use std::sync::Arc;

/// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    /// Pipeline collaborators
    pub tasks: TaskContext,
    /// Agent configs and run records
    pub store: Arc<dyn DocumentStore>,
    /// Object uploads for oversized run outputs
    pub storage: Arc<dyn ObjectStore>,
    /// Bearer-token verifier
    pub auth: AuthVerifier,
}

impl AppState {
    /// Construct state from pre-built collaborators
    pub fn new(
        tasks: TaskContext,
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn ObjectStore>,
        auth: AuthVerifier,
    ) -> Self {
        Self {
            tasks,
            store,
            storage,
            auth,
        }
    }

    /// Build production collaborators from configuration
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let market = Arc::new(FmpClient::new(&config.fmp_api_key, 300)?);
        let extractor = Arc::new(HttpExtractor::new(
            &config.extractor_url,
            config.extractor_token.clone(),
        )?);
        let provider = Arc::new(OpenAiProvider::from_env()?);
        let engine = AnalysisEngine::new(provider, config.model.clone());
        let fear_greed = Arc::new(CnnFearGreedClient::new()?);
        let cache = DataCache::new(STATEMENTS_CACHE_TTL);

        let tasks = TaskContext::new(market, extractor, engine, fear_greed, cache)
            .with_config(config.report.clone());

        let storage: Arc<dyn ObjectStore> = match &config.bucket {
            Some(bucket) => Arc::new(GcsClient::new(
                bucket,
                config.storage_token.clone(),
                config.cdn_base_url.clone(),
            )?),
            None => Arc::new(DisabledObjectStore),
        };

        Ok(Self {
            tasks,
            store: Arc::new(MemoryStore::new()),
            storage,
            auth: AuthVerifier::new(&config.jwt_secret),
        })
    }
}
