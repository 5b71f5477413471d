//! Deterministic report assembly
//!
//! Maps the completed task results into the fixed `slide_1`..`slide_5`
//! layout (the two Stage-3 slots are inserted after summarization).
//! Every declared key is always present; a failed or absent task leaves
//! its field null.

use crate::fundamentals::{company_overview, latest_price_bar, profile_entry};
use report_core::GraphRun;
use serde_json::{Value, json};

/// Assemble the fetch-stage report from the graph run
pub fn assemble_report(fundamentals: &Value, run: &GraphRun) -> Value {
    let profile = profile_entry(fundamentals);
    let (analyst_ratings, forecast) = split_ratings(run.value("analyst_forecast"));

    json!({
        "slide_1": {
            "company_overview": company_overview(&profile),
            "market_indices": run.value("market_indices"),
            "analyst_ratings": analyst_ratings,
            "price_data": latest_price_bar(fundamentals),
            "competitors": run.value("competitor_data"),
            "revenue_segmentation": run.value("revenue_segmentation"),
        },
        "slide_2": {
            "fair_value": run.value("fair_value"),
            "forecast": forecast,
        },
        "slide_3": {
            "sentiment_analysis": {
                "fear_and_greed_index": run.value("fear_and_greed"),
                "commitments_of_traders_cot_report": run.value("cot_report"),
                "put_call_ratio": run.value("put_call_ratio"),
                "news_sentiment": run.value("social_sentiment"),
            },
        },
        "slide_4": {
            "investment_frameworks": {
                "piotroski_score": run.value("piotroski_score"),
                "buffet_table": run.value("buffet"),
            },
        },
        "slide_5": {
            "pe_ratios": run.value("pe_ratios_val"),
            "debt_equity_ratio": run.value("debt_equity_ratio_val"),
        },
    })
}

/// Split `analyst_ratings` out of the forecast payload
///
/// The ratings get their own slide-1 slot; the rest of the forecast
/// lands on slide 2. A failed forecast yields a null ratings slot and an
/// empty forecast object.
fn split_ratings(forecast: Value) -> (Value, Value) {
    match forecast {
        Value::Object(mut fields) => {
            let ratings = fields.remove("analyst_ratings").unwrap_or(Value::Null);
            (ratings, Value::Object(fields))
        }
        _ => (Value::Null, json!({})),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::{ErrorLedger, GraphRun, TaskResult};
    use std::collections::BTreeMap;

    fn run_with(results: Vec<TaskResult>) -> GraphRun {
        let mut ledger = ErrorLedger::default();
        let mut map = BTreeMap::new();
        for result in results {
            if let Some(error) = &result.error {
                ledger.record(&result.key, error.clone());
            }
            map.insert(result.key.clone(), result);
        }
        GraphRun {
            results: map,
            ledger,
        }
    }

    fn fundamentals() -> Value {
        json!({
            "company_profile": [{
                "companyName": "Apple Inc.",
                "sector": "Technology",
                "industry": "Consumer Electronics",
                "price": 227.5,
                "image": "https://images.example.com/AAPL.png",
            }],
            "price_data": {"historical": [{"date": "2026-08-06", "close": 227.5}]},
        })
    }

    #[test]
    fn test_fixed_key_layout_with_failures() {
        // only two tasks succeeded; every declared key must still exist
        let run = run_with(vec![
            TaskResult::ok("market_indices", json!([{"name": "S&P 500 Index"}])),
            TaskResult::err("fear_and_greed", "task timed out after 30s"),
        ]);
        let report = assemble_report(&fundamentals(), &run);

        assert_eq!(report["slide_1"]["company_overview"]["name"], "Apple Inc.");
        assert_eq!(report["slide_1"]["market_indices"][0]["name"], "S&P 500 Index");
        assert!(report["slide_1"]["competitors"].is_null());
        assert!(report["slide_2"]["fair_value"].is_null());
        assert!(report["slide_3"]["sentiment_analysis"]["fear_and_greed_index"].is_null());
        assert!(report["slide_4"]["investment_frameworks"]["piotroski_score"].is_null());
        assert!(report["slide_5"]["pe_ratios"].is_null());
    }

    #[test]
    fn test_analyst_ratings_split() {
        let run = run_with(vec![TaskResult::ok(
            "analyst_forecast",
            json!({
                "revenue_this_year": 410.0,
                "analyst_ratings": {"current_analyst_consensus": "Buy"},
            }),
        )]);
        let report = assemble_report(&fundamentals(), &run);

        assert_eq!(
            report["slide_1"]["analyst_ratings"]["current_analyst_consensus"],
            "Buy"
        );
        assert_eq!(report["slide_2"]["forecast"]["revenue_this_year"], 410.0);
        assert!(report["slide_2"]["forecast"].get("analyst_ratings").is_none());
    }

    #[test]
    fn test_failed_forecast_yields_empty_forecast_object() {
        let run = run_with(vec![TaskResult::err("analyst_forecast", "extraction error")]);
        let report = assemble_report(&fundamentals(), &run);

        assert!(report["slide_1"]["analyst_ratings"].is_null());
        assert_eq!(report["slide_2"]["forecast"], json!({}));
    }

    #[test]
    fn test_assembly_ignores_result_insertion_order() {
        let forward = run_with(vec![
            TaskResult::ok("market_indices", json!([1])),
            TaskResult::ok("piotroski_score", json!({"Piotroski_F_Score": 7})),
        ]);
        let reversed = run_with(vec![
            TaskResult::ok("piotroski_score", json!({"Piotroski_F_Score": 7})),
            TaskResult::ok("market_indices", json!([1])),
        ]);

        assert_eq!(
            assemble_report(&fundamentals(), &forward),
            assemble_report(&fundamentals(), &reversed)
        );
    }
}
