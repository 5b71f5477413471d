//! Competitor and revenue-segmentation Stage-1 tasks

use crate::context::{TaskContext, llm_err};
use crate::fundamentals::{fetch_fundamentals, profile_entry};
use report_core::TaskError;
use serde_json::{Map, Value, json};
use tracing::warn;

/// Compare the target stock against provider-suggested competitors
///
/// The narrative provider proposes three competitor tickers in the same
/// sector or industry; each competitor's fundamentals are fetched and
/// reduced to a standard comparison row, target company first. A
/// competitor whose fetch fails is skipped.
pub async fn competitor_analysis(ctx: TaskContext, ticker: String) -> Result<Value, TaskError> {
    let fundamentals = fetch_fundamentals(ctx.clone(), ticker.clone()).await?;
    let profile = profile_entry(&fundamentals);
    let sector = profile.get("sector").and_then(Value::as_str).unwrap_or("");
    let industry = profile.get("industry").and_then(Value::as_str).unwrap_or("");

    let prompt = format!(
        "List 3 major public company competitors (Same country-listed if possible) for {ticker} \
         in the same sector ('{sector}') or industry ('{industry}'). \
         For each, provide only the stock ticker symbol. Respond in the json format \
         {{\"competitors\": [ticker1, ticker2, ticker3]}}."
    );
    let context = json!({"company_profile": profile});

    let response = ctx
        .engine
        .analyze_json(&prompt, Some(&context))
        .await
        .map_err(llm_err)?;

    let competitor_tickers: Vec<String> = response
        .get("competitors")
        .and_then(Value::as_array)
        .map(|tickers| {
            tickers
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut rows = vec![standard_row(&fundamentals)];
    for competitor in competitor_tickers {
        match fetch_fundamentals(ctx.clone(), competitor.clone()).await {
            Ok(competitor_data) => rows.push(standard_row(&competitor_data)),
            Err(error) => {
                warn!(%competitor, %error, "skipping competitor");
            }
        }
    }

    Ok(Value::Array(rows))
}

/// Standard comparison row from a fundamentals bundle
fn standard_row(fundamentals: &Value) -> Value {
    let profile = profile_entry(fundamentals);
    let income = &fundamentals["income_statement"];
    let field = |source: &Value, key: &str| source.get(key).cloned().unwrap_or(Value::Null);

    json!({
        "ticker": field(&profile, "symbol"),
        "name": field(&profile, "companyName"),
        "price": field(&profile, "price"),
        "market_cap": field(&profile, "mktCap"),
        "revenue": field(income, "revenue"),
        "net_income": field(income, "netIncome"),
        "eps": field(income, "eps"),
    })
}

/// Product-wise revenue share, provider API first with an LLM fallback
///
/// Returns a map of product/service name to percentage share, capped at
/// six entries.
pub async fn revenue_segmentation(ctx: TaskContext, ticker: String) -> Result<Value, TaskError> {
    if let Ok(segmentation) = ctx.market.revenue_product_segmentation(&ticker).await {
        if let Some(breakdown) = breakdown_from_api(&segmentation) {
            return Ok(breakdown);
        }
    }
    warn!(%ticker, "segmentation endpoint unusable, falling back to model estimate");

    let fundamentals = fetch_fundamentals(ctx.clone(), ticker.clone()).await?;
    let prompt = format!(
        "Based on all available company data and public sources, provide a product/service-wise revenue breakdown \
         for the last fiscal year for {ticker}. List the top 5-6 products or services and their estimated percentage \
         share of total revenue. Respond as a JSON object with product/service names as keys and their % revenue \
         share as values."
    );

    let response = ctx
        .engine
        .generate_json(
            report_llm::AnalysisRequest::new(prompt)
                .context(fundamentals)
                .model("gpt-4.1"),
        )
        .await
        .map_err(llm_err)?;

    match response {
        Value::Object(breakdown) => Ok(Value::Object(cap_entries(breakdown, 6))),
        _ => Ok(json!({})),
    }
}

/// Reduce the provider's segmentation payload to a capped breakdown map
fn breakdown_from_api(segmentation: &Value) -> Option<Value> {
    let entries = segmentation.as_array()?;
    if entries.is_empty() || entries[0].get("Error Message").is_some() {
        return None;
    }

    let mut breakdown: Map<String, Value> = Map::new();
    for entry in entries.iter().take(6) {
        let product = entry
            .get("product")
            .or_else(|| entry.get("segment"))
            .or_else(|| entry.get("name"))
            .and_then(Value::as_str);
        let percent = entry
            .get("revenuePercentage")
            .or_else(|| entry.get("percentage"))
            .or_else(|| entry.get("revenue_percent"))
            .filter(|percent| !percent.is_null());
        if let (Some(product), Some(percent)) = (product, percent) {
            breakdown.insert(product.to_string(), percent.clone());
        }
    }

    if breakdown.is_empty() {
        None
    } else {
        Some(Value::Object(breakdown))
    }
}

fn cap_entries(map: Map<String, Value>, limit: usize) -> Map<String, Value> {
    map.into_iter().take(limit).collect()
}
