//! Piotroski F-Score Stage-1 task

use crate::context::{TaskContext, llm_err};
use crate::fundamentals::fetch_fundamentals;
use report_core::TaskError;
use report_data::first_entry;
use serde_json::{Value, json};
use tracing::debug;

/// Resolve the Piotroski F-Score for a ticker
///
/// Tier 1 is the market-data provider's score endpoint. When that is
/// unavailable (plan-gated on most keys), tier 2 hands the raw
/// statements to the narrative provider for an estimate. Both tiers
/// failing yields a null score rather than a task failure.
pub async fn piotroski_score(ctx: TaskContext, ticker: String) -> Result<Value, TaskError> {
    if let Ok(result) = ctx.market.piotroski_score(&ticker).await {
        let entry = first_entry(result);
        if let Some(score) = entry.get("score").filter(|score| !score.is_null()) {
            return Ok(json!({"Piotroski_F_Score": score}));
        }
    }
    debug!(%ticker, "score endpoint unavailable, estimating from statements");

    let fundamentals = fetch_fundamentals(ctx.clone(), ticker.clone()).await?;
    let income = &fundamentals["income_statement"];
    let balance = &fundamentals["balance_sheet"];
    let cash = &fundamentals["cash_flow"];

    if income.is_null() || balance.is_null() || cash.is_null() {
        return Ok(json!({"Piotroski_F_Score": null}));
    }

    let prompt = format!(
        "Estimate the Piotroski F-Score (0-9) for stock {ticker} using the following financials. \
         Respond as a JSON object: {{\"Piotroski_F_Score\": <score as integer>}}. \
         If you cannot calculate, make a best guess based on profitability, leverage, and efficiency."
    );
    let context = json!({
        "income_statement": income,
        "balance_sheet": balance,
        "cash_flow": cash,
    });

    let estimate = ctx
        .engine
        .analyze_json(&prompt, Some(&context))
        .await
        .map_err(llm_err)?;

    let score = estimate
        .get("Piotroski_F_Score")
        .cloned()
        .unwrap_or(Value::Null);
    Ok(json!({"Piotroski_F_Score": score}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ContextBuilder, MockMarket};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_score_from_provider() {
        let ctx = ContextBuilder::new().build();
        let value = piotroski_score(ctx, "AAPL".to_string()).await.expect("score");
        assert_eq!(value["Piotroski_F_Score"], 7);
    }

    #[tokio::test]
    async fn test_fallback_to_llm_estimate() {
        let market = Arc::new(MockMarket::for_ticker("AAPL").without_piotroski());
        let ctx = ContextBuilder::new()
            .market(market as Arc<dyn report_data::MarketData>)
            .build();

        let value = piotroski_score(ctx, "AAPL".to_string()).await.expect("score");
        assert_eq!(value["Piotroski_F_Score"], 6);
    }
}
