//! Summarization Stage-3 tasks over the assembled report

use crate::context::{TaskContext, llm_err};
use report_core::TaskError;
use report_llm::AnalysisRequest;
use serde_json::Value;

/// Generate categorized investor risk bullets from the report
pub async fn ai_risk_analysis(ctx: TaskContext, report: Value) -> Result<Value, TaskError> {
    let prompt = "Given the following structured stock report, generate 3-5 bullet points for each of these \
        risk categories, from the perspective of an investor in this company.\n\
        1. Key External Risks\n\
        2. Customer, Supplier, & Geographic Risks\n\
        3. Legal, Environmental, and Reputational Risks\n\
        4. Financial Market Risks\n\
        5. Operational Risks\n\
        For each subtopic, use company-specific data and context. Format as a json output with keys: \
        'key_external_risks', 'customer_supplier_geographic_risks', 'legal_environmental_reputational_risks', \
        'financial_market_risks', 'operational_risks'. Each value should be a list of 3-5 concise bullet points.";

    ctx.engine
        .generate_json(AnalysisRequest::new(prompt).context(report).model("gpt-4.1"))
        .await
        .map_err(llm_err)
}

/// Generate the per-section investor overview from the report
pub async fn ai_overview(ctx: TaskContext, report: Value) -> Result<Value, TaskError> {
    let prompt = "Given the following structured stock report, generate a JSON summary for an investor.\n\
        Include these sections (add more if relevant):\n\
        - Market Conditions (with date if available)\n\
        - Investment Strategy Options (with 2-3 actionable strategies)\n\
        - Financial Health Check (Buffett Test, Piotroski Score, etc.)\n\
        - Valuation & Analyst Ratings (Fair Value, Analyst Coverage)\n\
        - Market Sentiment (Fear & Greed, Social, Put/Call, News, Buzzwords)\n\
        - Official Risk Disclosures (SEC 10-K, etc.)\n\
        For each section, use company-specific and market data from the report.\n\
        For each section, return a JSON object with:\n\
        - 'points': a list of 3-5 concise bullet points for the section\n\
        - 'ai_insight': a concise summary/insight for the section\n\
        Format the output as a JSON object with keys for each section, each containing 'points' and 'ai_insight'.";

    ctx.engine
        .generate_json(AnalysisRequest::new(prompt).context(report).model("gpt-4.1"))
        .await
        .map_err(llm_err)
}
