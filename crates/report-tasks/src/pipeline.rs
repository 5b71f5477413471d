//! The stock-report pipeline
//!
//! Builds the two-level task graph for a ticker, runs it, assembles the
//! report, and appends the summarization sections.

use crate::context::TaskContext;
use crate::fundamentals::{fetch_fundamentals, profile_entry};
use crate::report::assemble_report;
use crate::{competitors, forecast, health, market, ratios, scores, sentiment, summary, valuation};
use report_core::{
    ErrorLedger, GraphConfig, GraphError, TaskError, TaskFuture, TaskGraph, TaskSpec, run_bounded,
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

/// Pipeline failures that map to non-200 responses
#[derive(Debug, Error)]
pub enum ReportError {
    /// The required fetch returned no usable company profile
    #[error("company_profile_not_found")]
    CompanyProfileNotFound,

    /// The required fetch failed outright
    #[error("required fetch failed: {0}")]
    RequiredFetch(String),

    /// Graph construction or another unexpected failure
    #[error("internal error: {0}")]
    Internal(String),
}

/// A generated report plus its error ledger
#[derive(Debug, Serialize)]
pub struct StockReport {
    /// The `slide_1`..`slide_6` report structure
    pub data: Value,
    /// Per-task error messages for failed tasks
    pub errors: ErrorLedger,
}

/// Generate the full stock report for a ticker
///
/// Stage 1 and Stage 2 run through the task graph; Stage 3 runs over
/// the assembled report with bounded concurrency and its failures
/// degrade to null sections without touching the ledger.
pub async fn generate_stock_report(
    ctx: &TaskContext,
    ticker: &str,
) -> Result<StockReport, ReportError> {
    // Delegate to an owned-argument implementation. An `async fn` with
    // borrowed parameters leaves those lifetimes late-bound, and the
    // future's auto-`Send` check is then generalized over all lifetimes and
    // fails ("implementation of `Send` is not general enough") when the
    // future is used as an axum handler. Cloning the (cheap, all-`Arc`)
    // context and the ticker before the `await` means no borrow is held
    // across it, so the awaited future is `'static` and plainly `Send`.
    generate_stock_report_owned(ctx.clone(), ticker.to_string()).await
}

async fn generate_stock_report_owned(
    ctx: TaskContext,
    ticker: String,
) -> Result<StockReport, ReportError> {
    let graph =
        build_graph(&ctx, &ticker).map_err(|error| ReportError::Internal(error.to_string()))?;

    let mut config = GraphConfig::default().with_task_timeout(ctx.config.task_timeout);
    if let Some(deadline) = ctx.config.request_deadline {
        config = config.with_deadline(deadline);
    }

    let run = match graph.run(&config).await {
        Ok(run) => run,
        Err(GraphError::RequiredTaskFailed { error, .. }) => {
            return Err(match error {
                TaskError::MissingData(_) => ReportError::CompanyProfileNotFound,
                other => ReportError::RequiredFetch(other.to_string()),
            });
        }
        Err(other) => return Err(ReportError::Internal(other.to_string())),
    };

    let fundamentals = run.value("fundamentals");
    let mut report = assemble_report(&fundamentals, &run);
    info!(%ticker, failed_tasks = run.ledger.len(), "fetch stages complete");

    let summaries: Vec<(String, TaskFuture)> = vec![
        (
            "ai_risks".to_string(),
            Box::pin(summary::ai_risk_analysis(ctx.clone(), report.clone())),
        ),
        (
            "ai_overview".to_string(),
            Box::pin(summary::ai_overview(ctx.clone(), report.clone())),
        ),
    ];
    let summary_results = run_bounded(
        summaries,
        ctx.config.summary_concurrency,
        ctx.config.summary_timeout,
    )
    .await;

    let mut ai_risks = Value::Null;
    let mut ai_overview = Value::Null;
    for result in summary_results {
        match result.key.as_str() {
            "ai_risks" => ai_risks = result.value_or_null(),
            "ai_overview" => ai_overview = result.value_or_null(),
            _ => {}
        }
    }
    report["slide_6"] = json!({"ai_risks": ai_risks});
    report["slide_1"]["ai_overview"] = ai_overview;

    Ok(StockReport {
        data: report,
        errors: run.ledger,
    })
}

/// Declare the two-level task graph for a ticker
fn build_graph(ctx: &TaskContext, ticker: &str) -> Result<TaskGraph, GraphError> {
    TaskGraph::builder()
        .task({
            let (ctx, ticker) = (ctx.clone(), ticker.to_string());
            TaskSpec::new("fundamentals", move |_| fetch_fundamentals(ctx, ticker)).required()
        })
        .task({
            let ctx = ctx.clone();
            TaskSpec::new("market_indices", move |_| market::market_indices(ctx))
        })
        .task({
            let (ctx, ticker) = (ctx.clone(), ticker.to_string());
            TaskSpec::new("analyst_forecast", move |_| {
                forecast::analyst_forecast(ctx, ticker)
            })
        })
        .task({
            let ctx = ctx.clone();
            TaskSpec::new("fear_and_greed", move |_| market::fear_and_greed(ctx))
        })
        .task({
            let ctx = ctx.clone();
            TaskSpec::new("cot_report", move |_| market::cot_report(ctx))
        })
        .task({
            let (ctx, ticker) = (ctx.clone(), ticker.to_string());
            TaskSpec::new("put_call_ratio", move |_| {
                market::put_call_ratios(ctx, ticker)
            })
        })
        .task({
            let (ctx, ticker) = (ctx.clone(), ticker.to_string());
            TaskSpec::new("social_sentiment", move |_| {
                sentiment::social_sentiment(ctx, ticker)
            })
        })
        .task({
            let (ctx, ticker) = (ctx.clone(), ticker.to_string());
            TaskSpec::new("competitor_data", move |_| {
                competitors::competitor_analysis(ctx, ticker)
            })
        })
        .task({
            let (ctx, ticker) = (ctx.clone(), ticker.to_string());
            TaskSpec::new("revenue_segmentation", move |_| {
                competitors::revenue_segmentation(ctx, ticker)
            })
        })
        .task({
            let (ctx, ticker) = (ctx.clone(), ticker.to_string());
            TaskSpec::new("piotroski_score", move |_| {
                scores::piotroski_score(ctx, ticker)
            })
        })
        .task({
            let ctx = ctx.clone();
            TaskSpec::new("fair_value", move |mut inputs| {
                let fundamentals = inputs.take("fundamentals");
                let profile = profile_entry(&fundamentals);
                let income = fundamentals["income_statement"].clone();
                let balance = fundamentals["balance_sheet"].clone();
                let metrics = fundamentals["financial_metrics"].clone();
                valuation::determine_fair_value(ctx, profile, income, balance, metrics)
            })
            .depends_on(["fundamentals"])
        })
        .task(
            TaskSpec::new("buffet", move |mut inputs| {
                let fundamentals = inputs.take("fundamentals");
                async move {
                    let statements = json!({
                        "income_statement": fundamentals["income_statement"],
                        "balance_sheet": fundamentals["balance_sheet"],
                        "cash_flow_statement": fundamentals["cash_flow"],
                    });
                    Ok(health::compute_financial_health(&statements))
                }
            })
            .depends_on(["fundamentals"]),
        )
        .task({
            let (ctx, ticker) = (ctx.clone(), ticker.to_string());
            TaskSpec::new("pe_ratios_val", move |mut inputs| {
                let fundamentals = inputs.take("fundamentals");
                let sector = profile_entry(&fundamentals)
                    .get("sector")
                    .and_then(Value::as_str)
                    .map(ToString::to_string);
                ratios::pe_ratios(ctx, ticker, sector)
            })
            .depends_on(["fundamentals"])
        })
        .task({
            let ctx = ctx.clone();
            TaskSpec::new("debt_equity_ratio_val", move |mut inputs| {
                let fundamentals = inputs.take("fundamentals");
                let profile = profile_entry(&fundamentals);
                let metrics = fundamentals["financial_metrics"].clone();
                ratios::debt_equity_ratio(ctx, metrics, profile)
            })
            .depends_on(["fundamentals"])
        })
        .build()
}
