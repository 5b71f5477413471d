//! Stock-report endpoints

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use report_tasks::scores::piotroski_score;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stock-report", get(stock_report))
        .route("/try", get(try_piotroski))
}

#[derive(Debug, Deserialize)]
struct TickerQuery {
    ticker: Option<String>,
}

/// `GET /stock/stock-report?ticker=SYM`
///
/// 200 with the report (plus an `errors` ledger when any task failed),
/// 400 without a ticker, 404 when the company profile cannot be
/// resolved, 500 on unexpected failure.
async fn stock_report(
    State(state): State<AppState>,
    Query(query): Query<TickerQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(ticker) = query.ticker.filter(|ticker| !ticker.is_empty()) else {
        return Err(ApiError::BadRequest("ticker_symbol_required".to_string()));
    };
    let ticker = ticker.to_uppercase();
    info!(%ticker, "stock report requested");

    // Coerce the borrowing future to a boxed `dyn Future + Send` so its
    // `Send` bound is checked at a concrete lifetime here, rather than
    // leaking a higher-ranked requirement into the axum handler's `Send`
    // check (which fails with "implementation of `Send` is not general
    // enough").
    let report = report_tasks::generate_stock_report(&state.tasks, &ticker).await?;

    let mut response = json!({"status": "success", "data": report.data});
    if !report.errors.is_empty() {
        response["errors"] = report.errors.to_value();
    }
    Ok(Json(response))
}

/// `GET /stock/try?ticker=SYM`: piotroski-only debug endpoint
async fn try_piotroski(
    State(state): State<AppState>,
    Query(query): Query<TickerQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(ticker) = query.ticker.filter(|ticker| !ticker.is_empty()) else {
        return Err(ApiError::BadRequest("Ticker symbol is required".to_string()));
    };
    let ticker = ticker.to_uppercase();

    let score = piotroski_score(state.tasks.clone(), ticker)
        .await
        .map_err(|error| ApiError::Internal(error.to_string()))?;
    Ok(Json(json!({"piotroski_score": score})))
}
