//! Social/news sentiment Stage-1 task

use crate::context::{TaskContext, data_err};
use crate::schemas;
use report_core::TaskError;
use report_data::{ExtractionRequest, first_entry};
use serde_json::{Value, json};
use tracing::warn;

/// Scrape sentiment sources and synthesize scores and insights
///
/// Combines news articles (with per-article sentiment labels), investor
/// sentiment tracking, and a panic/confidence reading, then asks the
/// narrative provider for a numeric composite, a summary, and trending
/// buzzwords. Provider-side analysis failures degrade to nulls; only the
/// scraping calls can fail the task.
pub async fn social_sentiment(ctx: TaskContext, ticker: String) -> Result<Value, TaskError> {
    let articles = fetch_news(&ctx, &ticker).await?;
    let avg_news_sentiment = label_average(&articles);

    let investor = fetch_investor_sentiment(&ctx, &ticker).await?;
    let panic = fetch_panic_confidence(&ctx, &ticker).await?;

    let social_sentiment_score = {
        let prompt = format!(
            "Given the following data for stock {ticker}, provide a single numeric social sentiment score \
             from -100 (very negative) to +100 (very positive). Consider news sentiment, investor sentiment, \
             and panic vs confidence. Respond with a JSON object: {{\"social_sentiment_score\": <number>}}."
        );
        let context = json!({
            "news_sentiment_avg": avg_news_sentiment,
            "investor_sentiment_score": investor.get("sentiment_score").cloned().unwrap_or(Value::Null),
            "panic_vs_confidence_score": panic.get("score").cloned().unwrap_or(Value::Null),
        });
        match ctx.engine.analyze_json(&prompt, Some(&context)).await {
            Ok(response) => response
                .get("social_sentiment_score")
                .cloned()
                .unwrap_or(Value::Null),
            Err(error) => {
                warn!(%error, "social sentiment scoring failed");
                Value::Null
            }
        }
    };

    let ai_sentiment_insights = {
        let prompt = format!(
            "Summarize the overall sentiment for stock {ticker} based on news, investor sentiment, and \
             panic vs confidence. Highlight the main drivers and give a short actionable summary."
        );
        let context = json!({
            "news_sentiment": articles,
            "investor_sentiment": investor,
            "panic_confidence": panic,
        });
        match ctx.engine.analyze(&prompt, Some(&context)).await {
            Ok(insights) => Value::String(insights),
            Err(error) => {
                warn!(%error, "sentiment insight generation failed");
                Value::Null
            }
        }
    };

    let trending_buzzwords = extract_buzzwords(&ctx, &articles).await;

    let news_articles: Vec<Value> = articles
        .iter()
        .take(5)
        .map(|article| {
            json!({
                "title": article.get("title").cloned().unwrap_or(Value::Null),
                "summary": article.get("summary").cloned().unwrap_or(Value::Null),
                "sentiment": article.get("sentiment").cloned().unwrap_or(Value::Null),
                "source": article.get("source").cloned().unwrap_or(Value::Null),
                "url": article.get("url").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    // a zero panic score reads as "no reading", not a real value
    let panic_confidence = match panic.get("score") {
        Some(score) if !score.is_null() && score.as_f64() != Some(0.0) => json!({
            "score": score,
            "explanation": panic.get("explanation").cloned().unwrap_or(Value::Null),
        }),
        _ => Value::Null,
    };

    Ok(json!({
        "ticker": ticker,
        "news_articles": news_articles,
        "overall_sentiment_score": investor.get("sentiment_score").cloned().unwrap_or(Value::Null),
        "sentiment_status": investor.get("sentiment_status").cloned().unwrap_or(Value::Null),
        "social_sentiment": investor.get("industry_percentile").cloned().unwrap_or(Value::Null),
        "social_sentiment_score": social_sentiment_score,
        "monthly_trends": investor.get("monthly_trends").cloned().unwrap_or_else(|| json!([])),
        "ai_sentiment_insights": ai_sentiment_insights,
        "panic_confidence": panic_confidence,
        "trending_buzzwords": trending_buzzwords,
    }))
}

async fn fetch_news(ctx: &TaskContext, ticker: &str) -> Result<Vec<Value>, TaskError> {
    let url = format!("https://news.google.com/search?q={ticker}");
    let instruction = "Extract stock-related news articles:\n\
        - Title\n\
        - Summary\n\
        - Source (CNBC, Bloomberg, MarketWatch, etc.)\n\
        - URL\n\
        - Apply sentiment analysis to classify each article as Positive, Neutral, or Negative.";

    let result = ctx
        .extractor
        .extract(ExtractionRequest::new(url, schemas::news_sentiment(), instruction))
        .await
        .map_err(data_err)?;

    let result = match result {
        Value::Object(mut fields) if fields.contains_key("articles") => {
            fields.remove("articles").unwrap_or(Value::Null)
        }
        other => other,
    };

    Ok(match result {
        Value::Array(articles) => articles,
        Value::Object(fields) => vec![Value::Object(fields)],
        _ => Vec::new(),
    })
}

async fn fetch_investor_sentiment(ctx: &TaskContext, ticker: &str) -> Result<Value, TaskError> {
    let url = format!("https://altindex.com/ticker/{ticker}/sentiment");
    let instruction = "Extract the following investor sentiment data:\n\
        - Overall sentiment score (0-100).\n\
        - 30-day sentiment change.\n\
        - Industry percentile ranking.\n\
        - Month-over-month sentiment trend (last 6 months).";

    Ok(first_entry(
        ctx.extractor
            .extract(ExtractionRequest::new(url, schemas::sentiment_tracking(), instruction))
            .await
            .map_err(data_err)?,
    ))
}

async fn fetch_panic_confidence(ctx: &TaskContext, ticker: &str) -> Result<Value, TaskError> {
    let url = format!("https://www.macroaxis.com/news/{ticker}");
    let instruction = "Extract:\n\
        - Current Panic vs Confidence Score.\n\
        - Explanation of why the score is at its current level.\n\
        - Market conditions influencing investor behavior.";

    Ok(first_entry(
        ctx.extractor
            .extract(ExtractionRequest::new(url, schemas::panic_confidence(), instruction))
            .await
            .map_err(data_err)?,
    ))
}

/// Average of per-article sentiment labels mapped to [-1, 1]
fn label_average(articles: &[Value]) -> f64 {
    let scores: Vec<f64> = articles
        .iter()
        .filter_map(|article| article.get("sentiment").and_then(Value::as_str))
        .map(|label| match label.to_lowercase().as_str() {
            "positive" => 1.0,
            "negative" => -1.0,
            _ => 0.0,
        })
        .collect();

    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Ask the provider for trending buzzwords over the top articles
async fn extract_buzzwords(ctx: &TaskContext, articles: &[Value]) -> Value {
    let prompt = "Given the following news articles, extract a concise list of 5-10 trending buzzwords or topics \
        that are most relevant to the stock's current sentiment and discussion. \
        Return only a JSON list of buzzwords.";
    let context = json!({"news_articles": articles.iter().take(5).collect::<Vec<_>>()});

    match ctx.engine.analyze_json(prompt, Some(&context)).await {
        Ok(Value::Array(buzzwords)) => Value::Array(buzzwords),
        Ok(Value::Object(mut fields)) => fields.remove("buzzwords").unwrap_or_else(|| json!([])),
        Ok(_) | Err(_) => json!([]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ContextBuilder, ScriptedLlm, StaticExtractor};
    use std::sync::Arc;

    #[test]
    fn test_label_average() {
        let articles = vec![
            json!({"sentiment": "Positive"}),
            json!({"sentiment": "Negative"}),
            json!({"sentiment": "Neutral"}),
            json!({"sentiment": "Positive"}),
        ];
        assert!((label_average(&articles) - 0.25).abs() < f64::EPSILON);
        assert!((label_average(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_sentiment_output_shape() {
        let ctx = ContextBuilder::new().build();
        let value = social_sentiment(ctx, "AAPL".to_string()).await.expect("sentiment");

        assert_eq!(value["ticker"], "AAPL");
        assert_eq!(value["news_articles"].as_array().expect("articles").len(), 3);
        assert_eq!(value["overall_sentiment_score"], 72);
        assert_eq!(value["social_sentiment"], 85);
        assert_eq!(value["social_sentiment_score"], 24);
        assert_eq!(value["panic_confidence"]["score"], 65);
        assert_eq!(
            value["trending_buzzwords"].as_array().expect("buzzwords").len(),
            3
        );
    }

    #[tokio::test]
    async fn test_llm_failures_degrade_to_nulls() {
        let provider = ScriptedLlm::happy()
            .failing_for("social sentiment score")
            .failing_for("Summarize the overall sentiment")
            .failing_for("buzzwords");
        let ctx = ContextBuilder::new().provider(Arc::new(provider)).build();

        let value = social_sentiment(ctx, "AAPL".to_string()).await.expect("sentiment");
        assert!(value["social_sentiment_score"].is_null());
        assert!(value["ai_sentiment_insights"].is_null());
        assert_eq!(value["trending_buzzwords"], json!([]));
    }

    #[tokio::test]
    async fn test_news_extraction_failure_is_task_error() {
        let ctx = ContextBuilder::new()
            .extractor(Arc::new(StaticExtractor::happy().failing_for("news.google")))
            .build();
        let err = social_sentiment(ctx, "AAPL".to_string()).await.unwrap_err();
        assert!(matches!(err, TaskError::Extraction(_)));
    }
}
