//! Scripted collaborator doubles shared by the task tests

use crate::context::{ReportConfig, TaskContext};
use async_trait::async_trait;
use chrono::Utc;
use report_data::{DataCache, DataError, ExtractionRequest, Extractor, FearGreedFeed, MarketData};
use report_llm::{AnalysisEngine, CompletionRequest, LlmError, LlmProvider};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Market-data double with canned FMP-shaped payloads
pub struct MockMarket {
    empty_profile: bool,
    piotroski_error: bool,
    segmentation_error: bool,
    profile_calls: AtomicUsize,
    statement_calls: AtomicUsize,
}

impl MockMarket {
    pub fn for_ticker(_symbol: &str) -> Self {
        Self {
            empty_profile: false,
            piotroski_error: false,
            segmentation_error: false,
            profile_calls: AtomicUsize::new(0),
            statement_calls: AtomicUsize::new(0),
        }
    }

    pub fn unknown_ticker() -> Self {
        Self {
            empty_profile: true,
            ..Self::for_ticker("ZZZZ")
        }
    }

    pub fn without_piotroski(mut self) -> Self {
        self.piotroski_error = true;
        self
    }

    pub fn without_segmentation(mut self) -> Self {
        self.segmentation_error = true;
        self
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub fn statement_calls(&self) -> usize {
        self.statement_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketData for MockMarket {
    async fn company_profile(&self, symbol: &str) -> Result<Value, DataError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
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
            "historical": [
                {"date": "2026-08-06", "open": 225.1, "close": 227.5, "volume": 41_000_000},
                {"date": "2026-08-05", "open": 223.0, "close": 225.0, "volume": 39_500_000},
            ]
        }))
    }

    async fn key_metrics(&self, _symbol: &str) -> Result<Value, DataError> {
        self.statement_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!([{
            "peRatio": 34.2,
            "netIncomePerShare": 6.11,
            "freeCashFlowPerShare": 6.8,
            "sharesOutstanding": 15_200_000_000_u64,
            "debtToEquity": 1.45,
            "totalAssets": 365_000_000_000_u64,
            "totalLiabilities": 308_000_000_000_u64,
        }]))
    }

    async fn income_statement(&self, _symbol: &str) -> Result<Value, DataError> {
        self.statement_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!([{
            "date": "2025-09-27",
            "revenue": 391_000_000_000_u64,
            "grossProfit": 180_600_000_000_u64,
            "operatingIncome": 123_200_000_000_u64,
            "netIncome": 93_700_000_000_u64,
            "sellingGeneralAndAdministrativeExpenses": 26_000_000_000_u64,
            "depreciationAndAmortization": 11_400_000_000_u64,
            "interestExpense": 3_900_000_000_u64,
            "eps": 6.11,
        }]))
    }

    async fn balance_sheet(&self, _symbol: &str) -> Result<Value, DataError> {
        self.statement_calls.fetch_add(1, Ordering::SeqCst);
        let date = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        Ok(json!([{
            "date": date,
            "totalLiabilities": 308_000_000_000_u64,
            "totalStockholdersEquity": 57_000_000_000_u64,
            "retainedEarnings": -19_000_000_000_i64,
            "totalAssets": 365_000_000_000_u64,
        }]))
    }

    async fn cash_flow_statement(&self, _symbol: &str) -> Result<Value, DataError> {
        self.statement_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!([{
            "date": "2025-09-27",
            "freeCashFlow": 108_800_000_000_u64,
        }]))
    }

    async fn piotroski_score(&self, symbol: &str) -> Result<Value, DataError> {
        if self.piotroski_error {
            return Err(DataError::Api("score endpoint requires a higher plan".to_string()));
        }
        Ok(json!([{"symbol": symbol, "score": 7}]))
    }

    async fn revenue_product_segmentation(&self, _symbol: &str) -> Result<Value, DataError> {
        if self.segmentation_error {
            return Err(DataError::Api("segmentation unavailable".to_string()));
        }
        Ok(json!([
            {"product": "iPhone", "revenuePercentage": 51.4},
            {"product": "Services", "revenuePercentage": 24.6},
            {"product": "Wearables", "revenuePercentage": 9.3},
            {"product": "Mac", "revenuePercentage": 8.0},
            {"product": "iPad", "revenuePercentage": 6.7},
        ]))
    }
}

/// Extractor double routed by URL substring
pub struct StaticExtractor {
    urls: Mutex<Vec<String>>,
    fail_matching: Vec<String>,
}

impl StaticExtractor {
    pub fn happy() -> Self {
        Self {
            urls: Mutex::new(Vec::new()),
            fail_matching: Vec::new(),
        }
    }

    pub fn failing_for(mut self, substring: &str) -> Self {
        self.fail_matching.push(substring.to_string());
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("urls lock").clone()
    }
}

#[async_trait]
impl Extractor for StaticExtractor {
    async fn extract(&self, request: ExtractionRequest) -> Result<Value, DataError> {
        self.urls.lock().expect("urls lock").push(request.url.clone());
        if self
            .fail_matching
            .iter()
            .any(|substring| request.url.contains(substring))
        {
            return Err(DataError::Extraction(format!(
                "fixture failure for {}",
                request.url
            )));
        }

        let url = request.url.as_str();
        if url.contains("slickcharts") {
            return Ok(json!([
                {"name": "Dow Jones Industrial Average", "last": 44_520.3, "change": 118.2, "change_percent": "0.27%"},
                {"name": "NASDAQ Composite Index", "last": 21_980.1, "change": -54.7, "change_percent": "-0.25%"},
                {"name": "S&P 500 Index", "last": 6_310.8, "change": 12.4, "change_percent": "0.20%"},
            ]));
        }
        if url.contains("stockanalysis.com") {
            return Ok(json!([{
                "price_targets": {
                    "low": 180.0, "average": 250.0, "median": 245.0, "high": 310.0,
                    "low_change": "-20.9%", "average_change": "9.9%",
                    "median_change": "7.7%", "high_change": "36.3%"
                },
                "analyst_ratings": {
                    "current_analyst_consensus": "Buy",
                    "months": [
                        {"month": "Jul '26", "strong_buy": 18, "buy": 10, "hold": 8, "sell": 1, "strong_sell": 0, "total_analysts": 37}
                    ]
                },
                "financial_forecast": {
                    "revenue_this_year": 410_000_000_000.0,
                    "revenue_next_year": 448_000_000_000.0,
                    "revenue_growth_this_year": 4.8,
                    "revenue_growth_next_year": 9.3,
                    "eps_this_year": 7.31,
                    "eps_next_year": 8.02,
                    "eps_growth_this_year": 8.9,
                    "eps_growth_next_year": 9.7,
                    "forward_pe": 28.4
                },
                "revenue_forecast": {
                    "revenue_avg": {"2026": 410_000_000_000.0, "2027": 448_000_000_000.0, "2028": 471_000_000_000.0}
                },
                "eps_forecast": {
                    "eps_avg": {"2026": 7.31, "2027": 8.02, "2028": 8.54}
                }
            }]));
        }
        if url.contains("tradingster") {
            return Ok(json!([{
                "open_interest": 251_400,
                "change_in_open_interest": -3_200,
                "non_commercial_long": 61_000,
                "non_commercial_short": 74_500,
                "commercial_long": 150_200,
                "commercial_short": 131_800,
                "total_long": 211_200,
                "total_short": 206_300,
                "non_reportable_long": 40_200,
                "non_reportable_short": 45_100,
                "percent_open_interest": {"non_commercial_long": 24.3},
                "traders_count": {"total": 312}
            }]));
        }
        if url.contains("market-bulls") {
            return Ok(json!([{
                "date": "2026-08-04",
                "commercial_long": 150_200,
                "commercial_short": 131_800,
                "large_speculators_long": 61_000,
                "large_speculators_short": 74_500,
                "small_traders_long": 40_200,
                "small_traders_short": 45_100,
                "net_positions": 4_900,
                "percent_open_interest": {"commercial": 56.1},
                "trader_sentiment": {"asset_manager": "bullish"}
            }]));
        }
        if url.contains("optioncharts") {
            return Ok(json!([{
                "option_overview": "Put volume modestly elevated versus the 30-day average.",
                "implied_volatility_30d": 27.4,
                "iv_rank": 38.0,
                "iv_percentile": 54.0,
                "historical_volatility": 24.8,
                "iv_high": 61.2, "iv_high_date": "2026-04-07",
                "iv_low": 18.9, "iv_low_date": "2026-01-15",
                "open_interest_today": 4_100_000,
                "put_call_open_interest_ratio": 1.08,
                "put_open_interest": 2_130_000,
                "call_open_interest": 1_970_000,
                "open_interest_avg_30d": 3_900_000,
                "open_interest_vs_30d_avg": 105.1,
                "volume_today": 910_000,
                "put_call_volume_ratio": 0.92,
                "put_volume": 436_000,
                "call_volume": 474_000,
                "volume_avg_30d": 870_000,
                "volume_vs_30d_avg": 104.6
            }]));
        }
        if url.contains("news.google") {
            return Ok(json!([
                {"title": "Earnings beat expectations", "summary": "Strong quarter on services growth.", "sentiment": "Positive", "source": "CNBC", "url": "https://news.example.com/1"},
                {"title": "Supply chain concerns linger", "summary": "Component costs remain elevated.", "sentiment": "Negative", "source": "Bloomberg", "url": "https://news.example.com/2"},
                {"title": "Product event scheduled", "summary": "Fall lineup announcement expected.", "sentiment": "Neutral", "source": "MarketWatch", "url": "https://news.example.com/3"},
            ]));
        }
        if url.contains("altindex") {
            return Ok(json!([{
                "sentiment_score": 72,
                "sentiment_status": "Bullish",
                "industry_percentile": 85,
                "monthly_trends": [
                    {"score": 72, "month": "Jul", "change": 3},
                    {"score": 69, "month": "Jun", "change": -1}
                ]
            }]));
        }
        if url.contains("macroaxis") {
            return Ok(json!([{
                "score": 65,
                "explanation": "Confidence supported by the latest earnings beat."
            }]));
        }
        if url.contains("finance.yahoo") {
            return Ok(json!([{
                "pe_ratio": 34.5,
                "forward_pe_ratio": 28.4,
                "peg_ratio": 2.4,
                "price_to_sales_ratio": 8.6,
                "price_to_book_ratio": 48.2,
                "enterprise_value_ebitda": 24.9
            }]));
        }
        if url.contains("worldperatio") {
            return Ok(json!([{
                "sector": "Technology",
                "sector_pe": 30.1,
                "pe_5_year": 27.0,
                "pe_10_year": 24.5,
                "pe_20_year": 22.0,
                "sp500_pe": 25.4
            }]));
        }
        if url.contains("fullratio") {
            return Ok(json!([{
                "industry_name": "Consumer Electronics",
                "avg_debt_equity_ratio": 1.1
            }]));
        }

        Err(DataError::Extraction(format!("no fixture for {url}")))
    }
}

/// LLM double routed by prompt substring
pub struct ScriptedLlm {
    prompts: Mutex<Vec<String>>,
    fail_matching: Vec<String>,
}

impl ScriptedLlm {
    pub fn happy() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail_matching: Vec::new(),
        }
    }

    pub fn failing_for(mut self, substring: &str) -> Self {
        self.fail_matching.push(substring.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(request.prompt.clone());
        if self
            .fail_matching
            .iter()
            .any(|substring| request.prompt.contains(substring))
        {
            return Err(LlmError::Api("rate limited".to_string()));
        }

        // summarization prompts carry the whole report as context, so
        // they must be matched before any term the report itself contains
        let prompt = request.prompt.as_str();
        if prompt.contains("risk categories") {
            return Ok(json!({
                "key_external_risks": ["Rate-sensitive demand", "FX headwinds", "Tariff exposure"],
                "customer_supplier_geographic_risks": ["Supplier concentration", "China revenue share"],
                "legal_environmental_reputational_risks": ["Antitrust scrutiny"],
                "financial_market_risks": ["Multiple compression"],
                "operational_risks": ["Launch execution"]
            })
            .to_string());
        }
        if prompt.contains("JSON summary for an investor") {
            return Ok(json!({
                "market_conditions": {"points": ["Indices mixed"], "ai_insight": "Neutral backdrop."},
                "investment_strategy_options": {"points": ["Stagger entries"], "ai_insight": "Prefer pullbacks."},
                "financial_health_check": {"points": ["Buffett screen mostly passes"], "ai_insight": "Solid."},
                "valuation_analyst_ratings": {"points": ["Modestly above fair value"], "ai_insight": "Hold."},
                "market_sentiment": {"points": ["Greed territory"], "ai_insight": "Crowded."},
                "official_risk_disclosures": {"points": ["See 10-K"], "ai_insight": "Standard."}
            })
            .to_string());
        }
        if prompt.contains("competitors") && prompt.contains("ticker symbol") {
            return Ok(r#"{"competitors": ["MSFT", "GOOGL", "DELL"]}"#.to_string());
        }
        if prompt.contains("classification and reasoning") {
            return Ok(
                r#"{"classification": "Stable Company", "reasoning": "Consistent revenue and large market cap."}"#
                    .to_string(),
            );
        }
        if prompt.contains("Piotroski") {
            return Ok(r#"{"Piotroski_F_Score": 6}"#.to_string());
        }
        if prompt.contains("social sentiment score") {
            return Ok(r#"{"social_sentiment_score": 24}"#.to_string());
        }
        if prompt.contains("buzzwords") {
            return Ok(r#"{"buzzwords": ["services growth", "AI features", "supply chain"]}"#.to_string());
        }
        if prompt.contains("Predict the sector") || prompt.contains("Predict the most relevant industry") {
            return Ok("Technology".to_string());
        }
        if prompt.contains("revenue breakdown") {
            return Ok(r#"{"iPhone": 51.4, "Services": 24.6, "Mac": 8.0}"#.to_string());
        }

        Ok("Synthesized insight over the supplied context.".to_string())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Fear & greed feed double
pub struct StaticFeed {
    payload: Option<Value>,
    delay: Option<Duration>,
}

impl StaticFeed {
    pub fn ok() -> Self {
        Self {
            payload: Some(json!({
                "fear_and_greed": {
                    "score": 62.4,
                    "previous_1_week": 58.0,
                    "previous_1_month": 51.2,
                    "previous_1_year": 44.9
                }
            })),
            delay: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            payload: None,
            delay: None,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::ok()
        }
    }
}

#[async_trait]
impl FearGreedFeed for StaticFeed {
    async fn graph_data(&self, _date: &str) -> Result<Option<Value>, DataError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.payload.clone())
    }
}

/// Context builder over the doubles above
pub struct ContextBuilder {
    market: Arc<dyn MarketData>,
    extractor: Arc<dyn Extractor>,
    provider: Arc<dyn LlmProvider>,
    feed: Arc<dyn FearGreedFeed>,
    config: ReportConfig,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            market: Arc::new(MockMarket::for_ticker("AAPL")),
            extractor: Arc::new(StaticExtractor::happy()),
            provider: Arc::new(ScriptedLlm::happy()),
            feed: Arc::new(StaticFeed::ok()),
            config: ReportConfig::default(),
        }
    }

    pub fn market(mut self, market: Arc<dyn MarketData>) -> Self {
        self.market = market;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn feed(mut self, feed: Arc<dyn FearGreedFeed>) -> Self {
        self.feed = feed;
        self
    }

    pub fn config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TaskContext {
        let engine = AnalysisEngine::new(self.provider, "gpt-4o");
        TaskContext::new(
            self.market,
            self.extractor,
            engine,
            self.feed,
            DataCache::new(crate::fundamentals::STATEMENTS_CACHE_TTL),
        )
        .with_config(self.config)
    }
}

/// Shorthand: default doubles with a custom market client
pub fn test_context(market: Arc<dyn MarketData>) -> TaskContext {
    ContextBuilder::new().market(market).build()
}
