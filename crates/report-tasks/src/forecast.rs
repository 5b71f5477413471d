//! Analyst forecast Stage-1 task

use crate::context::{TaskContext, data_err};
use crate::schemas;
use report_core::TaskError;
use report_data::{ExtractionRequest, first_entry};
use serde_json::{Value, json};

/// Scrape the analyst forecast page and flatten it for the report
///
/// The extraction returns price targets, monthly analyst ratings, and
/// revenue/EPS projections; this maps the yearly projection maps onto
/// this-year / next-year / year-after slots and keeps `analyst_ratings`
/// intact so the aggregator can split it into its own slide slot.
pub async fn analyst_forecast(ctx: TaskContext, ticker: String) -> Result<Value, TaskError> {
    let url = format!("https://stockanalysis.com/stocks/{ticker}/forecast/");
    let instruction = "Extract the following data:\n\
        1. Price Targets: Low, Average, Median, High price targets and corresponding percentage changes.\n\
        2. Analyst Ratings: Strong Buy, Buy, Hold, Sell, Strong Sell ratings for the past 6 months and total analysts.\n\
        3. Financial Forecast: Revenue this year and next year with percentage growth from last year to this year \
        and percentage growth from this year to next year. EPS this year and next year with percentage growth. \
        Forward P/E ratio.\n\
        4. Revenue Forecast (Yearly projections): Revenue estimates for future years (High, Avg, Low) and revenue \
        growth estimates for future years.\n\
        5. EPS Forecast (Yearly projections): EPS estimates for future years (High, Avg, Low) and EPS growth \
        estimates for future years.\n\
        Ensure the data is accurately extracted and structured properly.";

    let forecast = first_entry(
        ctx.extractor
            .extract(ExtractionRequest::new(url, schemas::stock_forecast(), instruction).markdown())
            .await
            .map_err(data_err)?,
    );

    let financial = forecast.get("financial_forecast").cloned().unwrap_or(Value::Null);
    let revenue = forecast.get("revenue_forecast").cloned().unwrap_or(Value::Null);
    let targets = forecast.get("price_targets").cloned().unwrap_or(Value::Null);
    let analyst_ratings = forecast.get("analyst_ratings").cloned().unwrap_or(Value::Null);

    // map the avg revenue projections onto this year / next / year after
    let (revenue_this_year, revenue_next_year, revenue_next_to_next_year) =
        yearly_projection(&revenue["revenue_avg"]);

    let field = |source: &Value, key: &str| source.get(key).cloned().unwrap_or(Value::Null);

    let price_targets = json!({
        "low": field(&targets, "low"),
        "average": field(&targets, "average"),
        "median": field(&targets, "median"),
        "high": field(&targets, "high"),
        "low_change": field(&targets, "low_change"),
        "average_change": field(&targets, "average_change"),
        "median_change": field(&targets, "median_change"),
        "high_change": field(&targets, "high_change"),
    });

    Ok(json!({
        "revenue_this_year": revenue_this_year,
        "revenue_next_year": revenue_next_year,
        "revenue_next_to_next_year": revenue_next_to_next_year,
        "revenue_growth_this_year_pct": field(&financial, "revenue_growth_this_year"),
        "revenue_growth_next_year_pct": field(&financial, "revenue_growth_next_year"),
        "eps_this_year": field(&financial, "eps_this_year"),
        "eps_next_year": field(&financial, "eps_next_year"),
        "eps_growth_this_year_pct": field(&financial, "eps_growth_this_year"),
        "eps_growth_next_year_pct": field(&financial, "eps_growth_next_year"),
        "price_targets": price_targets,
        "analyst_ratings": analyst_ratings,
    }))
}

/// First three values of a year-keyed projection map, in year order
fn yearly_projection(projection: &Value) -> (Value, Value, Value) {
    let Some(map) = projection.as_object() else {
        return (Value::Null, Value::Null, Value::Null);
    };

    let mut years: Vec<&String> = map.keys().collect();
    years.sort();

    let at = |index: usize| {
        years
            .get(index)
            .and_then(|year| map.get(*year))
            .cloned()
            .unwrap_or(Value::Null)
    };
    (at(0), at(1), at(2))
}
