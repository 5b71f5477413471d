//! Shared collaborator doubles for the HTTP tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use report_data::{DataCache, DataError, ExtractionRequest, Extractor, FearGreedFeed, MarketData};
use report_llm::{AnalysisEngine, CompletionRequest, LlmError, LlmProvider};
use report_server::auth::AuthVerifier;
use report_server::state::AppState;
use report_server::storage::DisabledObjectStore;
use report_server::store::MemoryStore;
use report_tasks::fundamentals::STATEMENTS_CACHE_TTL;
use report_tasks::{ReportConfig, TaskContext};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

pub const JWT_SECRET: &str = "test-secret";

/// Market-data double; `empty_profile` simulates an unknown symbol
pub struct StubMarket {
    pub empty_profile: bool,
}

#[async_trait]
impl MarketData for StubMarket {
    async fn company_profile(&self, symbol: &str) -> Result<Value, DataError> {
        if self.empty_profile {
            return Ok(json!([]));
        }
        Ok(json!([{
            "symbol": symbol,
            "companyName": format!("{symbol} Inc."),
            "sector": "Technology",
            "industry": "Consumer Electronics",
            "price": 227.5,
            "mktCap": 3_400_000_000_000_u64,
            "dcf": 210.0,
            "image": format!("https://images.example.com/{symbol}.png"),
        }]))
    }

    async fn historical_prices(&self, symbol: &str) -> Result<Value, DataError> {
        Ok(json!({
            "symbol": symbol,
            "historical": [{"date": "2026-08-06", "close": 227.5}],
        }))
    }

    async fn key_metrics(&self, _symbol: &str) -> Result<Value, DataError> {
        Ok(json!([{
            "peRatio": 34.2,
            "netIncomePerShare": 6.11,
            "debtToEquity": 1.45,
        }]))
    }

    async fn income_statement(&self, _symbol: &str) -> Result<Value, DataError> {
        Ok(json!([{
            "date": "2025-09-27",
            "revenue": 391_000_000_000_u64,
            "grossProfit": 180_600_000_000_u64,
            "netIncome": 93_700_000_000_u64,
            "eps": 6.11,
        }]))
    }

    async fn balance_sheet(&self, _symbol: &str) -> Result<Value, DataError> {
        let date = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        Ok(json!([{
            "date": date,
            "totalLiabilities": 308_000_000_000_u64,
            "totalStockholdersEquity": 57_000_000_000_u64,
            "totalAssets": 365_000_000_000_u64,
            "retainedEarnings": 1_000_000_000_u64,
        }]))
    }

    async fn cash_flow_statement(&self, _symbol: &str) -> Result<Value, DataError> {
        Ok(json!([{"date": "2025-09-27", "freeCashFlow": 108_000_000_000_u64}]))
    }

    async fn piotroski_score(&self, symbol: &str) -> Result<Value, DataError> {
        Ok(json!([{"symbol": symbol, "score": 7}]))
    }

    async fn revenue_product_segmentation(&self, _symbol: &str) -> Result<Value, DataError> {
        Ok(json!([{"product": "iPhone", "revenuePercentage": 51.4}]))
    }
}

/// Extractor double: every page extracts to a single empty object
pub struct StubExtractor;

#[async_trait]
impl Extractor for StubExtractor {
    async fn extract(&self, _request: ExtractionRequest) -> Result<Value, DataError> {
        Ok(json!([{}]))
    }
}

/// Provider double: valid JSON in JSON mode, fixed text otherwise
pub struct StubLlm;

#[async_trait]
impl LlmProvider for StubLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        if request.json_mode {
            Ok(r#"{"ok": true}"#.to_string())
        } else {
            Ok("stub insight".to_string())
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Fear & greed double with an optional artificial delay
pub struct StubFeed {
    pub delay: Option<Duration>,
}

#[async_trait]
impl FearGreedFeed for StubFeed {
    async fn graph_data(&self, _date: &str) -> Result<Option<Value>, DataError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Some(json!({
            "fear_and_greed": {"score": 62.4, "previous_1_week": 58.0}
        })))
    }
}

/// Build app state over the doubles
pub fn test_state(
    empty_profile: bool,
    feed_delay: Option<Duration>,
    config: ReportConfig,
) -> (AppState, Arc<MemoryStore>) {
    let engine = AnalysisEngine::new(Arc::new(StubLlm), "gpt-4o");
    let tasks = TaskContext::new(
        Arc::new(StubMarket { empty_profile }),
        Arc::new(StubExtractor),
        engine,
        Arc::new(StubFeed { delay: feed_delay }),
        DataCache::new(STATEMENTS_CACHE_TTL),
    )
    .with_config(config);

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        tasks,
        store.clone(),
        Arc::new(DisabledObjectStore),
        AuthVerifier::new(JWT_SECRET),
    );
    (state, store)
}

/// Signed bearer token for the test secret
pub fn auth_token(user_id: &str) -> String {
    let exp = Utc::now().timestamp() + 3600;
    let claims = json!({"sub": {"user_id": user_id}, "exp": exp});
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("token")
}
