//! Market-wide Stage-1 tasks: indices, fear & greed, COT, put/call

use crate::context::{TaskContext, data_err};
use crate::schemas;
use chrono::Utc;
use report_core::TaskError;
use report_data::{ExtractionRequest, first_entry};
use serde_json::{Value, json};
use tracing::warn;

const SLICKCHARTS_URL: &str = "https://www.slickcharts.com/sp500";
const TRADINGSTER_URL: &str = "https://www.tradingster.com/cot/legacy-futures/20974";
const MARKET_BULLS_URL: &str = "http://market-bulls.com/cot-report-nasdaq-100/";

/// Extract the headline US market indices
pub async fn market_indices(ctx: TaskContext) -> Result<Value, TaskError> {
    let instruction = "From the crawled content, extract only the following US market indices and their respective details:\n\
        - Dow Jones Industrial Average\n\
        - NASDAQ Composite Index\n\
        - S&P 500 Index\n\
        Extract the Name, Last recorded value, Change, and Percentage Change accurately.";

    let result = ctx
        .extractor
        .extract(
            ExtractionRequest::new(SLICKCHARTS_URL, schemas::market_indices(), instruction)
                .markdown(),
        )
        .await
        .map_err(data_err)?;

    // unwrap the {"indices": [...]} envelope when the extractor returns it
    let result = match result {
        Value::Object(mut fields) if fields.contains_key("indices") => {
            fields.remove("indices").unwrap_or(Value::Null)
        }
        other => other,
    };

    let entries = match result {
        Value::Array(entries) => entries,
        Value::Object(fields) => vec![Value::Object(fields)],
        _ => Vec::new(),
    };

    let indices: Vec<Value> = entries
        .iter()
        .map(|index| {
            json!({
                "name": index.get("name").cloned().unwrap_or(Value::Null),
                "last": index.get("last").cloned().unwrap_or(Value::Null),
                "change": index.get("change").cloned().unwrap_or(Value::Null),
                "change_percent": index.get("change_percent").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    Ok(Value::Array(indices))
}

/// Fetch the CNN fear & greed index, falling back to yesterday's data
pub async fn fear_and_greed(ctx: TaskContext) -> Result<Value, TaskError> {
    let now = Utc::now();
    let today = now.format("%Y-%m-%d").to_string();
    let yesterday = (now - chrono::Duration::days(1)).format("%Y-%m-%d").to_string();

    let data = match ctx.fear_greed.graph_data(&today).await.map_err(data_err)? {
        Some(data) => Some(data),
        None => ctx
            .fear_greed
            .graph_data(&yesterday)
            .await
            .map_err(data_err)?,
    };

    let empty = json!({
        "current_index": null,
        "past_week_index": null,
        "past_month_index": null,
        "past_year_index": null,
    });

    let Some(data) = data else {
        warn!("failed to retrieve fear & greed index data");
        return Ok(empty);
    };
    let fg = &data["fear_and_greed"];
    if fg.is_null() {
        warn!("fear & greed payload missing index block");
        return Ok(empty);
    }

    Ok(json!({
        "current_index": fg.get("score").cloned().unwrap_or(Value::Null),
        "past_week_index": fg.get("previous_1_week").cloned().unwrap_or(Value::Null),
        "past_month_index": fg.get("previous_1_month").cloned().unwrap_or(Value::Null),
        "past_year_index": fg.get("previous_1_year").cloned().unwrap_or(Value::Null),
    }))
}

/// Scrape both COT sources and synthesize an insight
pub async fn cot_report(ctx: TaskContext) -> Result<Value, TaskError> {
    let instruction_tradingster = "Extract the following data from Tradingster's COT Legacy Futures Report:\n\
        - Open Interest & Change in Open Interest.\n\
        - Long, Short, Spread positions for Non-Commercial, Commercial, Total, and Non-Reportable Traders.\n\
        - Percentage of Open Interest for each category.\n\
        - Number of Traders in each category.";
    let instruction_market_bulls = "Extract the following data from Market Bulls' Nasdaq 100 COT Report:\n\
        - Commercial, Large Speculators, and Small Traders positions.\n\
        - Net Positions & Percentage of Open Interest.\n\
        - Sentiment analysis based on trader categories:\n\
        - Dealer Intermediary, Asset Manager, Leveraged Funds, Other Reportables, Non-Reportable Traders.";

    let tradingster = first_entry(
        ctx.extractor
            .extract(ExtractionRequest::new(
                TRADINGSTER_URL,
                schemas::cot_legacy_futures(),
                instruction_tradingster,
            ))
            .await
            .map_err(data_err)?,
    );
    let market_bulls = first_entry(
        ctx.extractor
            .extract(
                ExtractionRequest::new(
                    MARKET_BULLS_URL,
                    schemas::cot_market_bulls(),
                    instruction_market_bulls,
                )
                .markdown(),
            )
            .await
            .map_err(data_err)?,
    );

    let cot_data = json!({
        "tradingster_cot_report": tradingster,
        "market_bulls_cot_report": market_bulls,
    });

    let prompt = "Based on the following Commitment of Traders (COT) data, generate a concise, actionable insight (max 500 words) \
        summarizing the current market sentiment, key trader positioning, and any notable shifts or risks. \
        Focus on what the data means for market direction and trader behavior. \
        Do not repeat the raw data, but synthesize the implications for investors and traders.";

    let cot_insights = match ctx.engine.analyze(prompt, Some(&cot_data)).await {
        Ok(insights) => Value::String(insights),
        Err(error) => {
            warn!(%error, "cot insight generation failed");
            Value::Null
        }
    };

    Ok(json!({"cot_insights": cot_insights}))
}

/// Scrape option-chain data and reduce it to a put/call ratio
pub async fn put_call_ratios(ctx: TaskContext, ticker: String) -> Result<Value, TaskError> {
    let url = format!("https://optioncharts.io/options/{ticker}");
    let instruction = "Extract the following data from the page:\n\
        1. Implied Volatility Data: 30-day Implied Volatility (%), IV Rank, IV Percentile (%), \
        Historical Volatility (%), IV High (Value & Date), IV Low (Value & Date).\n\
        2. Open Interest Data: Today's Open Interest, Put-Call Open Interest Ratio, Put Open Interest, \
        Call Open Interest, 30-day Average Open Interest, Today's Open Interest vs 30-day Average (%).\n\
        3. Option Volume Data: Today's Volume, Put-Call Volume Ratio, Put Volume, Call Volume, \
        30-day Average Volume, Today's Volume as % of 30-day Average.\n\
        Ensure extracted values are correctly formatted as numbers where applicable.";

    let chain = first_entry(
        ctx.extractor
            .extract(ExtractionRequest::new(url, schemas::option_chain(), instruction))
            .await
            .map_err(data_err)?,
    );

    // volume ratio preferred, open-interest ratio as fallback
    let put_call_ratio = chain
        .get("put_call_volume_ratio")
        .filter(|ratio| !ratio.is_null())
        .or_else(|| chain.get("put_call_open_interest_ratio").filter(|r| !r.is_null()))
        .cloned()
        .unwrap_or(Value::Null);

    Ok(json!({
        "put_call_ratio": put_call_ratio,
        "put_call_ratio_insights": chain.get("option_overview").cloned().unwrap_or(Value::Null),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ContextBuilder, StaticExtractor, StaticFeed};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_market_indices_fixed_fields() {
        let ctx = ContextBuilder::new().build();
        let indices = market_indices(ctx).await.expect("indices");

        let entries = indices.as_array().expect("array");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["name"], "Dow Jones Industrial Average");
        assert_eq!(entries[2]["change_percent"], "0.20%");
    }

    #[tokio::test]
    async fn test_market_indices_extraction_failure_is_error() {
        let ctx = ContextBuilder::new()
            .extractor(Arc::new(StaticExtractor::happy().failing_for("slickcharts")))
            .build();
        let err = market_indices(ctx).await.unwrap_err();
        assert!(matches!(err, TaskError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_fear_and_greed_maps_scores() {
        let ctx = ContextBuilder::new().build();
        let value = fear_and_greed(ctx).await.expect("fear & greed");
        assert_eq!(value["current_index"], 62.4);
        assert_eq!(value["past_year_index"], 44.9);
    }

    #[tokio::test]
    async fn test_fear_and_greed_empty_feed_yields_nulls() {
        let ctx = ContextBuilder::new().feed(Arc::new(StaticFeed::empty())).build();
        let value = fear_and_greed(ctx).await.expect("fear & greed");
        assert!(value["current_index"].is_null());
        assert!(value["past_week_index"].is_null());
    }

    #[tokio::test]
    async fn test_cot_report_insight() {
        let ctx = ContextBuilder::new().build();
        let value = cot_report(ctx).await.expect("cot");
        assert!(value["cot_insights"].as_str().expect("insight").contains("insight"));
    }

    #[tokio::test]
    async fn test_cot_insight_failure_degrades_to_null() {
        let ctx = ContextBuilder::new()
            .provider(Arc::new(
                crate::testutil::ScriptedLlm::happy().failing_for("Commitment of Traders"),
            ))
            .build();
        let value = cot_report(ctx).await.expect("cot");
        assert!(value["cot_insights"].is_null());
    }

    #[tokio::test]
    async fn test_put_call_prefers_volume_ratio() {
        let ctx = ContextBuilder::new().build();
        let value = put_call_ratios(ctx, "AAPL".to_string()).await.expect("ratios");
        assert_eq!(value["put_call_ratio"], 0.92);
        assert!(
            value["put_call_ratio_insights"]
                .as_str()
                .expect("insights")
                .contains("Put volume")
        );
    }
}
