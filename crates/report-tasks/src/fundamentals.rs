//! Required Stage-1 task: company profile, prices, and statements

use crate::context::{TaskContext, data_err};
use chrono::{NaiveDate, Utc};
use report_core::TaskError;
use report_data::{CacheKey, first_entry};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// TTL for cached statements
pub const STATEMENTS_CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 90);

/// A cached balance sheet older than this is refetched
const STATEMENT_FRESH_DAYS: i64 = 365;

/// Fetch the fundamentals bundle for a ticker
///
/// The profile and price series are always fetched live; the four
/// statements are served from cache while the cached balance-sheet date
/// is recent enough. An empty profile list is a hard failure; the whole
/// request aborts on it.
pub async fn fetch_fundamentals(ctx: TaskContext, ticker: String) -> Result<Value, TaskError> {
    let cache_key = CacheKey::new(&ticker, "statements");
    let cached = ctx.cache.get(&cache_key).await;
    let use_cache = cached.as_ref().is_some_and(statements_are_fresh);

    let profile = ctx
        .market
        .company_profile(&ticker)
        .await
        .map_err(data_err)?;
    if !has_profile(&profile) {
        return Err(TaskError::MissingData("company_profile".to_string()));
    }

    let price_data = ctx
        .market
        .historical_prices(&ticker)
        .await
        .map_err(data_err)?;

    let statements = match cached {
        Some(statements) if use_cache => {
            debug!(%ticker, "serving statements from cache");
            statements
        }
        _ => {
            let financial_metrics =
                first_entry(ctx.market.key_metrics(&ticker).await.map_err(data_err)?);
            let income_statement =
                first_entry(ctx.market.income_statement(&ticker).await.map_err(data_err)?);
            let balance_sheet =
                first_entry(ctx.market.balance_sheet(&ticker).await.map_err(data_err)?);
            let cash_flow = first_entry(
                ctx.market
                    .cash_flow_statement(&ticker)
                    .await
                    .map_err(data_err)?,
            );

            let statements = json!({
                "financial_metrics": financial_metrics,
                "income_statement": income_statement,
                "balance_sheet": balance_sheet,
                "cash_flow": cash_flow,
            });
            ctx.cache.insert(cache_key, statements.clone()).await;
            debug!(%ticker, "statements fetched and cached");
            statements
        }
    };

    Ok(json!({
        "company_profile": profile,
        "price_data": price_data,
        "financial_metrics": statements["financial_metrics"],
        "income_statement": statements["income_statement"],
        "balance_sheet": statements["balance_sheet"],
        "cash_flow": statements["cash_flow"],
    }))
}

/// Whether a cached statements bundle is still usable
fn statements_are_fresh(cached: &Value) -> bool {
    cached["balance_sheet"]["date"]
        .as_str()
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .is_some_and(|date| (Utc::now().date_naive() - date).num_days() <= STATEMENT_FRESH_DAYS)
}

/// Whether a profile payload carries at least one entry
pub fn has_profile(profile: &Value) -> bool {
    profile.as_array().is_some_and(|entries| !entries.is_empty())
}

/// The first profile entry of a fundamentals bundle
pub fn profile_entry(fundamentals: &Value) -> Value {
    first_entry(fundamentals["company_profile"].clone())
}

/// Fixed company-overview block for slide 1
pub fn company_overview(profile: &Value) -> Value {
    json!({
        "name": profile.get("companyName").cloned().unwrap_or(Value::Null),
        "sector": profile.get("sector").cloned().unwrap_or(Value::Null),
        "industry": profile.get("industry").cloned().unwrap_or(Value::Null),
        "current_stock_price": profile.get("price").cloned().unwrap_or(Value::Null),
        "image": profile.get("image").cloned().unwrap_or(Value::Null),
    })
}

/// Most recent historical price bar, `Null` when absent
pub fn latest_price_bar(fundamentals: &Value) -> Value {
    fundamentals["price_data"]["historical"]
        .as_array()
        .and_then(|bars| bars.first().cloned())
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockMarket, test_context};
    use std::sync::Arc;

    #[test]
    fn test_statements_freshness() {
        let recent = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert!(statements_are_fresh(
            &json!({"balance_sheet": {"date": recent}})
        ));
        assert!(!statements_are_fresh(
            &json!({"balance_sheet": {"date": "2019-09-28"}})
        ));
        assert!(!statements_are_fresh(&json!({"balance_sheet": {}})));
    }

    #[test]
    fn test_company_overview_mapping() {
        let profile = json!({
            "companyName": "Apple Inc.",
            "sector": "Technology",
            "industry": "Consumer Electronics",
            "price": 227.5,
            "image": "https://example.com/AAPL.png",
            "mktCap": 1_000_000
        });
        let overview = company_overview(&profile);
        assert_eq!(overview["name"], "Apple Inc.");
        assert_eq!(overview["current_stock_price"], 227.5);
        assert!(overview.get("mktCap").is_none());
    }

    #[test]
    fn test_latest_price_bar() {
        let fundamentals = json!({
            "price_data": {"historical": [{"close": 1.0}, {"close": 2.0}]}
        });
        assert_eq!(latest_price_bar(&fundamentals)["close"], 1.0);
        assert_eq!(latest_price_bar(&json!({})), Value::Null);
    }

    #[tokio::test]
    async fn test_fetch_uses_cache_for_statements() {
        let market = Arc::new(MockMarket::for_ticker("AAPL"));
        let ctx = test_context(Arc::clone(&market) as Arc<dyn report_data::MarketData>);

        let first = fetch_fundamentals(ctx.clone(), "AAPL".to_string())
            .await
            .expect("first fetch");
        assert!(has_profile(&first["company_profile"]));
        assert_eq!(market.statement_calls(), 4);

        // statements come from cache, profile and prices refetch
        let second = fetch_fundamentals(ctx, "AAPL".to_string())
            .await
            .expect("second fetch");
        assert_eq!(market.statement_calls(), 4);
        assert_eq!(market.profile_calls(), 2);
        assert_eq!(first["income_statement"], second["income_statement"]);
    }

    #[tokio::test]
    async fn test_empty_profile_is_missing_data() {
        let market = Arc::new(MockMarket::unknown_ticker());
        let ctx = test_context(market as Arc<dyn report_data::MarketData>);

        let err = fetch_fundamentals(ctx, "ZZZZ".to_string()).await.unwrap_err();
        assert!(matches!(err, TaskError::MissingData(field) if field == "company_profile"));
    }
}
