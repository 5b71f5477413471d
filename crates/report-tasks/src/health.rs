//! Financial-health Stage-2 task (Buffett-style screen)

use serde_json::{Map, Value, json};

/// Benchmark ranges a metric must fall inside to pass
const BENCHMARKS: &[(&str, f64, f64)] = &[
    ("Gross Margin", 0.40, 0.9),
    ("SG&A Margin", 0.0, 0.30),
    ("R&D Margin", 0.0, 0.30),
    ("Depreciation Margin", 0.0, 0.10),
    ("Interest Expense Margin", 0.0, 0.15),
    ("Net Margin", 0.20, 0.8),
    ("Debt-to-Equity Ratio", 0.0, 0.8),
];

/// Compute financial-health metrics and compare against benchmarks
///
/// Pure over the statements bundle; missing figures default to zero so
/// the screen always produces a full table.
pub fn compute_financial_health(financial_data: &Value) -> Value {
    let income = &financial_data["income_statement"];
    let balance = &financial_data["balance_sheet"];

    let revenue = num(income, "revenue");
    let gross_profit = num(income, "grossProfit");
    let operating_income = num(income, "operatingIncome");
    let net_income = num(income, "netIncome");
    let sga_expense = num(income, "sellingGeneralAndAdministrativeExpenses");
    let depreciation = num(income, "depreciationAndAmortization");
    let interest_expense = num(income, "interestExpense");

    let total_liabilities = num(balance, "totalLiabilities");
    let shareholders_equity = num(balance, "totalStockholdersEquity");
    let retained_earnings = num(balance, "retainedEarnings");

    let ratio = |numerator: f64, denominator: f64| {
        if denominator == 0.0 { 0.0 } else { numerator / denominator }
    };

    let mut computed: Vec<(&str, Value)> = vec![
        ("Gross Margin", json!(ratio(gross_profit, revenue))),
        ("SG&A Margin", json!(ratio(sga_expense, gross_profit))),
        ("Operating Margin", json!(ratio(operating_income, revenue))),
        ("Depreciation Margin", json!(ratio(depreciation, gross_profit))),
        ("Interest Expense Margin", json!(ratio(interest_expense, operating_income))),
        ("Net Margin", json!(ratio(net_income, revenue))),
        ("Debt-to-Equity Ratio", json!(ratio(total_liabilities, shareholders_equity))),
    ];
    computed.push((
        "Retained Earnings Growth",
        json!(if retained_earnings > 0.0 { "Positive" } else { "Negative" }),
    ));

    let mut comparison: Map<String, Value> = Map::new();
    for (metric, value) in &computed {
        let entry = match value.as_f64() {
            None => json!({"value": value, "benchmark": "N/A", "status": "N/A"}),
            Some(number) => match BENCHMARKS.iter().find(|(name, _, _)| name == metric) {
                Some((_, low, high)) => json!({
                    "value": format!("{:.2}%", number * 100.0),
                    "benchmark": [low, high],
                    "status": if *low <= number && number <= *high { "Pass" } else { "Fail" },
                }),
                None => json!({
                    "value": format!("{:.2}%", number * 100.0),
                    "benchmark": "N/A",
                    "status": "No Benchmark",
                }),
            },
        };
        comparison.insert((*metric).to_string(), entry);
    }

    let computed_metrics: Map<String, Value> = computed
        .into_iter()
        .map(|(metric, value)| (metric.to_string(), value))
        .collect();

    json!({
        "computed_metrics": computed_metrics,
        "comparison_results": comparison,
    })
}

fn num(source: &Value, key: &str) -> f64 {
    source.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}
