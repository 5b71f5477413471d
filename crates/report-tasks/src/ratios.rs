//! Ratio-comparison Stage-2 tasks: P/E and debt/equity

use crate::context::{TaskContext, data_err};
use crate::schemas;
use report_core::TaskError;
use report_data::{ExtractionRequest, first_entry};
use serde_json::{Value, json};
use tracing::warn;

const WORLD_PE_URL: &str = "https://worldperatio.com/sp-500-sectors/";
const FULL_RATIO_URL: &str = "https://fullratio.com/debt-to-equity-by-industry";

/// Compare the stock's P/E against sector and S&P 500 averages
///
/// A missing sector is predicted via the narrative provider before the
/// sector-average lookup; scrape failures on either side degrade that
/// side to nulls rather than failing the task.
pub async fn pe_ratios(
    ctx: TaskContext,
    ticker: String,
    sector: Option<String>,
) -> Result<Value, TaskError> {
    let yahoo_url = format!("https://finance.yahoo.com/quote/{ticker}/key-statistics/");
    let instruction_stock = format!(
        "Extract the following valuation metrics for stock {ticker}:\n\
         - Price-to-Earnings (P/E) Ratio\n\
         - Forward P/E Ratio\n\
         - Price/Earnings-to-Growth (PEG) Ratio\n\
         - Price-to-Sales (P/S) Ratio\n\
         - Price-to-Book (P/B) Ratio\n\
         - Enterprise Value / EBITDA"
    );

    let stock_pe_data = match ctx
        .extractor
        .extract(ExtractionRequest::new(yahoo_url, schemas::stock_pe(), instruction_stock))
        .await
    {
        Ok(data) => first_entry(data),
        Err(error) => {
            warn!(%error, "stock P/E extraction failed");
            Value::Null
        }
    };

    let sector = match sector.filter(|sector| !sector.is_empty()) {
        Some(sector) => sector,
        None => predict_sector(&ctx, &ticker).await,
    };

    let instruction_sector = format!(
        "Extract the following P/E ratios for the {sector} sector:\n\
         - Current Industry P/E\n\
         - 5-year average P/E\n\
         - 10-year average P/E\n\
         - 20-year average P/E\n\
         - Current S&P 500 P/E Ratio"
    );

    let sector_pe_data = match ctx
        .extractor
        .extract(ExtractionRequest::new(WORLD_PE_URL, schemas::sector_pe(), instruction_sector))
        .await
    {
        Ok(data) => first_entry(data),
        Err(error) => {
            warn!(%error, "sector P/E extraction failed");
            Value::Null
        }
    };

    let stock_pe = float(&stock_pe_data, "pe_ratio");
    let sector_pe = float(&sector_pe_data, "sector_pe");
    let sector_pe_5 = float(&sector_pe_data, "pe_5_year");
    let sector_pe_10 = float(&sector_pe_data, "pe_10_year");
    let sector_pe_20 = float(&sector_pe_data, "pe_20_year");
    let sp500_pe = float(&sector_pe_data, "sp500_pe");

    Ok(json!({
        "sector": {
            "pe_5_year": sector_pe_5,
            "pe_10_year": sector_pe_10,
            "pe_20_year": sector_pe_20,
            "current_pe": sector_pe,
        },
        "stock": {
            "pe_5_year": compare_pe(stock_pe, sector_pe_5),
            "pe_10_year": compare_pe(stock_pe, sector_pe_10),
            "pe_20_year": compare_pe(stock_pe, sector_pe_20),
            "current_pe": stock_pe,
        },
        "sp500": {
            "pe": sp500_pe,
        },
        "sector_vs_sp500": {
            "pe_5_year": compare_sector_vs_sp(sector_pe_5, sp500_pe),
            "pe_10_year": compare_sector_vs_sp(sector_pe_10, sp500_pe),
            "pe_20_year": compare_sector_vs_sp(sector_pe_20, sp500_pe),
            "current_pe": compare_sector_vs_sp(sector_pe, sp500_pe),
        },
    }))
}

/// Compare the stock's D/E ratio against its industry average
pub async fn debt_equity_ratio(
    ctx: TaskContext,
    financial_metrics: Value,
    company_profile: Value,
) -> Result<Value, TaskError> {
    let Some(stock_de_ratio) = financial_metrics.get("debtToEquity").and_then(Value::as_f64)
    else {
        return Err(TaskError::MissingData(
            "debtToEquity not present in key metrics".to_string(),
        ));
    };

    let industry = match company_profile.get("industry").and_then(Value::as_str) {
        Some(industry) if !industry.is_empty() => industry.to_string(),
        _ => predict_industry(&ctx, &company_profile).await,
    };

    let instruction = format!(
        "Extract the Debt-to-Equity Ratio for the {industry} industry or the closest related industry."
    );
    let industry_data = first_entry(
        ctx.extractor
            .extract(ExtractionRequest::new(
                FULL_RATIO_URL,
                schemas::industry_debt_equity(),
                instruction,
            ))
            .await
            .map_err(data_err)?,
    );

    let industry_de_ratio = industry_data
        .get("avg_debt_equity_ratio")
        .and_then(Value::as_f64);

    let comparison = match industry_de_ratio {
        None => json!({
            "Industry Name": industry,
            "Stock Debt-to-Equity Ratio": stock_de_ratio,
            "Industry Average D/E Ratio": null,
            "Leverage Analysis": null,
            "Risk Assessment": null,
        }),
        Some(industry_de) => json!({
            "Industry Name": industry,
            "Stock Debt-to-Equity Ratio": stock_de_ratio,
            "Industry Average D/E Ratio": industry_de,
            "Leverage Analysis": if stock_de_ratio > industry_de { "Higher Leverage" } else { "Lower Leverage" },
            "Risk Assessment": if stock_de_ratio > industry_de * 1.5 {
                "Risky"
            } else if stock_de_ratio > industry_de {
                "Moderate"
            } else {
                "Safe"
            },
        }),
    };

    Ok(json!({
        "Stock D/E Ratio": stock_de_ratio,
        "Industry D/E Ratio": industry_de_ratio,
        "Comparison": comparison,
    }))
}

/// Label the stock's P/E against a sector average at a ±10% band
fn compare_pe(stock: Option<f64>, sector: Option<f64>) -> Value {
    match (stock, sector) {
        (Some(stock), Some(sector)) => {
            if stock > sector * 1.1 {
                json!("overpriced")
            } else if stock < sector * 0.9 {
                json!("undervalued")
            } else {
                json!("fair")
            }
        }
        _ => Value::Null,
    }
}

/// Label the sector's P/E against the S&P 500 at a ±10% band
fn compare_sector_vs_sp(sector: Option<f64>, sp: Option<f64>) -> Value {
    match (sector, sp) {
        (Some(sector), Some(sp)) => {
            if sector > sp * 1.1 {
                json!("expensive")
            } else if sector < sp * 0.9 {
                json!("cheap")
            } else {
                json!("fair")
            }
        }
        _ => Value::Null,
    }
}

/// Predict a sector when the profile carries none
async fn predict_sector(ctx: &TaskContext, ticker: &str) -> String {
    let prompt = format!(
        "Predict the sector for stock {ticker} based on:\n\
         - Stock name\n\
         - Company description\n\
         - Business model\n\
         - Competitor analysis\n\n\
         Return only the industry name."
    );
    match ctx.engine.analyze(&prompt, Some(&json!({"ticker": ticker}))).await {
        Ok(sector) => sector.trim().to_string(),
        Err(error) => {
            warn!(%error, "sector prediction failed");
            "Unknown".to_string()
        }
    }
}

/// Predict an industry when the profile carries none
async fn predict_industry(ctx: &TaskContext, company_profile: &Value) -> String {
    let prompt = "Predict the most relevant industry for the company based on:\n\
         - Business description\n\
         - Competitor analysis\n\
         - Sector classification\n\n\
         Return only the industry name.";
    match ctx
        .engine
        .analyze(prompt, Some(&json!({"company_profile": company_profile})))
        .await
    {
        Ok(industry) => industry.trim().to_string(),
        Err(error) => {
            warn!(%error, "industry prediction failed");
            "Unknown".to_string()
        }
    }
}

fn float(source: &Value, key: &str) -> Option<f64> {
    source.get(key).and_then(Value::as_f64)
}
