//! Extraction schemas for the scraping collaborator
//!
//! Each schema mirrors the structure the extraction service must return
//! for a given page; field descriptions guide the LLM extraction.

use serde_json::{Value, json};

/// US market indices list (slickcharts)
pub fn market_indices() -> Value {
    json!({
        "type": "object",
        "properties": {
            "indices": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "Name of the US market index (Dow Jones, NASDAQ Composite, or S&P 500)."},
                        "last": {"type": "number", "description": "Last recorded value of the index."},
                        "change": {"type": "number", "description": "Change in the index value."},
                        "change_percent": {"type": "string", "description": "Percentage change in the index."}
                    },
                    "required": ["name", "last", "change", "change_percent"]
                }
            }
        },
        "required": ["indices"]
    })
}

/// Full analyst forecast (stockanalysis.com)
pub fn stock_forecast() -> Value {
    json!({
        "type": "object",
        "properties": {
            "price_targets": {
                "type": "object",
                "properties": {
                    "low": {"type": "number", "description": "Lowest price target."},
                    "average": {"type": "number", "description": "Average price target."},
                    "median": {"type": "number", "description": "Median price target."},
                    "high": {"type": "number", "description": "Highest price target."},
                    "low_change": {"type": "string", "description": "Percentage change for the lowest target."},
                    "average_change": {"type": "string", "description": "Percentage change for the average target."},
                    "median_change": {"type": "string", "description": "Percentage change for the median target."},
                    "high_change": {"type": "string", "description": "Percentage change for the highest target."}
                }
            },
            "analyst_ratings": {
                "type": "object",
                "properties": {
                    "current_analyst_consensus": {"type": "string", "description": "Overall latest analyst consensus (e.g., Buy, Hold, Sell)."},
                    "months": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "month": {"type": "string", "description": "Month and year of the rating (e.g., Oct '24)."},
                                "strong_buy": {"type": "integer"},
                                "buy": {"type": "integer"},
                                "hold": {"type": "integer"},
                                "sell": {"type": "integer"},
                                "strong_sell": {"type": "integer"},
                                "total_analysts": {"type": "integer", "description": "Total number of analysts providing ratings."}
                            }
                        }
                    }
                }
            },
            "financial_forecast": {
                "type": "object",
                "properties": {
                    "revenue_this_year": {"type": "number", "description": "Revenue forecast for this year."},
                    "revenue_next_year": {"type": "number", "description": "Revenue forecast for next year."},
                    "revenue_growth_this_year": {"type": "number", "description": "Percentage change in revenue this year."},
                    "revenue_growth_next_year": {"type": "number", "description": "Percentage change in revenue next year."},
                    "eps_this_year": {"type": "number", "description": "Earnings per share (EPS) forecast for this year."},
                    "eps_next_year": {"type": "number", "description": "Earnings per share (EPS) forecast for next year."},
                    "eps_growth_this_year": {"type": "number", "description": "Percentage change in EPS this year."},
                    "eps_growth_next_year": {"type": "number", "description": "Percentage change in EPS next year."},
                    "forward_pe": {"type": "number", "description": "Forward P/E ratio for the stock."}
                }
            },
            "revenue_forecast": {
                "type": "object",
                "properties": {
                    "revenue_high": {"type": "object", "description": "Revenue high estimates for future years."},
                    "revenue_avg": {"type": "object", "description": "Revenue average estimates for future years."},
                    "revenue_low": {"type": "object", "description": "Revenue low estimates for future years."},
                    "revenue_growth_high": {"type": "object"},
                    "revenue_growth_avg": {"type": "object"},
                    "revenue_growth_low": {"type": "object"}
                }
            },
            "eps_forecast": {
                "type": "object",
                "properties": {
                    "eps_high": {"type": "object", "description": "EPS high estimates for future years."},
                    "eps_avg": {"type": "object", "description": "EPS average estimates for future years."},
                    "eps_low": {"type": "object", "description": "EPS low estimates for future years."},
                    "eps_growth_high": {"type": "object"},
                    "eps_growth_avg": {"type": "object"},
                    "eps_growth_low": {"type": "object"}
                }
            }
        }
    })
}

/// Legacy futures COT report (Tradingster)
pub fn cot_legacy_futures() -> Value {
    json!({
        "type": "object",
        "properties": {
            "open_interest": {"type": "integer", "description": "Total open interest for the asset."},
            "change_in_open_interest": {"type": "integer", "description": "Change in open interest."},
            "non_commercial_long": {"type": "integer", "description": "Non-commercial traders holding long positions."},
            "non_commercial_short": {"type": "integer", "description": "Non-commercial traders holding short positions."},
            "commercial_long": {"type": "integer", "description": "Commercial traders holding long positions."},
            "commercial_short": {"type": "integer", "description": "Commercial traders holding short positions."},
            "total_long": {"type": "integer", "description": "Total long positions (Commercial + Non-Commercial)."},
            "total_short": {"type": "integer", "description": "Total short positions (Commercial + Non-Commercial)."},
            "non_reportable_long": {"type": "integer", "description": "Non-reportable traders' long positions."},
            "non_reportable_short": {"type": "integer", "description": "Non-reportable traders' short positions."},
            "percent_open_interest": {"type": "object", "description": "Percentage of open interest by category."},
            "traders_count": {"type": "object", "description": "Number of traders in each category."}
        }
    })
}

/// NASDAQ-100 COT report (Market Bulls)
pub fn cot_market_bulls() -> Value {
    json!({
        "type": "object",
        "properties": {
            "date": {"type": "string", "description": "Date of the COT report."},
            "commercial_long": {"type": "integer", "description": "Long positions held by commercial traders."},
            "commercial_short": {"type": "integer", "description": "Short positions held by commercial traders."},
            "large_speculators_long": {"type": "integer", "description": "Long positions held by large speculators."},
            "large_speculators_short": {"type": "integer", "description": "Short positions held by large speculators."},
            "small_traders_long": {"type": "integer", "description": "Long positions held by small traders."},
            "small_traders_short": {"type": "integer", "description": "Short positions held by small traders."},
            "net_positions": {"type": "integer", "description": "Net positions (Long - Short)."},
            "percent_open_interest": {"type": "object", "description": "Percentage of open interest by category."},
            "trader_sentiment": {"type": "object", "description": "Trader sentiment for different trader categories."}
        }
    })
}

/// Option chain overview (optioncharts.io)
pub fn option_chain() -> Value {
    json!({
        "type": "object",
        "properties": {
            "option_overview": {"type": "string", "description": "Option Overview"},
            "implied_volatility_30d": {"type": "number", "description": "30-day Implied Volatility (%)"},
            "iv_rank": {"type": "number", "description": "IV Rank"},
            "iv_percentile": {"type": "number", "description": "IV Percentile (%)"},
            "historical_volatility": {"type": "number", "description": "Historical Volatility (%)"},
            "iv_high": {"type": "number", "description": "Highest IV recorded (%)"},
            "iv_high_date": {"type": "string", "description": "Date of highest IV recorded"},
            "iv_low": {"type": "number", "description": "Lowest IV recorded (%)"},
            "iv_low_date": {"type": "string", "description": "Date of lowest IV recorded"},
            "open_interest_today": {"type": "integer", "description": "Total Open Interest for today"},
            "put_call_open_interest_ratio": {"type": "number", "description": "Put/Call Open Interest Ratio"},
            "put_open_interest": {"type": "integer", "description": "Total Put Open Interest"},
            "call_open_interest": {"type": "integer", "description": "Total Call Open Interest"},
            "open_interest_avg_30d": {"type": "integer", "description": "30-day Average Open Interest"},
            "open_interest_vs_30d_avg": {"type": "number", "description": "Today's Open Interest as % of 30-day Average"},
            "volume_today": {"type": "integer", "description": "Total Option Volume for today"},
            "put_call_volume_ratio": {"type": "number", "description": "Put/Call Volume Ratio"},
            "put_volume": {"type": "integer", "description": "Total Put Option Volume"},
            "call_volume": {"type": "integer", "description": "Total Call Option Volume"},
            "volume_avg_30d": {"type": "integer", "description": "30-day Average Volume"},
            "volume_vs_30d_avg": {"type": "number", "description": "Today's Volume as % of 30-day Average"}
        }
    })
}

/// Stock news articles with sentiment labels (Google News)
pub fn news_sentiment() -> Value {
    json!({
        "type": "object",
        "properties": {
            "articles": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string", "description": "Title of the news article."},
                        "summary": {"type": "string", "description": "Summary of the news article."},
                        "sentiment": {"type": "string", "description": "Sentiment classification (Positive, Neutral, Negative)."},
                        "source": {"type": "string", "description": "Source of the news article (e.g., CNBC, Bloomberg)."},
                        "url": {"type": "string", "description": "URL of the news article."}
                    },
                    "required": ["title", "sentiment"]
                }
            }
        },
        "required": ["articles"]
    })
}

/// Investor sentiment tracking (altindex)
pub fn sentiment_tracking() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sentiment_score": {"type": "integer", "description": "Overall sentiment score (0-100)."},
            "sentiment_status": {"type": "string"},
            "industry_percentile": {"type": "integer", "description": "Industry percentile ranking."},
            "monthly_trends": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "score": {"type": "integer"},
                        "month": {"type": "string"},
                        "change": {"type": "integer"}
                    }
                }
            }
        }
    })
}

/// Panic vs confidence score (macroaxis)
pub fn panic_confidence() -> Value {
    json!({
        "type": "object",
        "properties": {
            "score": {"type": "integer", "description": "Current Panic vs Confidence Score."},
            "explanation": {"type": "string", "description": "Why the score is at its current level."}
        }
    })
}

/// Stock valuation multiples (Yahoo Finance key statistics)
pub fn stock_pe() -> Value {
    json!({
        "type": "object",
        "properties": {
            "pe_ratio": {"type": "number", "description": "Price-to-Earnings (P/E) ratio of the stock."},
            "forward_pe_ratio": {"type": "number", "description": "Forward P/E ratio based on projected earnings."},
            "peg_ratio": {"type": "number", "description": "Price/Earnings-to-Growth (PEG) ratio."},
            "price_to_sales_ratio": {"type": "number", "description": "Price-to-Sales (P/S) ratio."},
            "price_to_book_ratio": {"type": "number", "description": "Price-to-Book (P/B) ratio."},
            "enterprise_value_ebitda": {"type": "number", "description": "Enterprise Value to EBITDA ratio."}
        }
    })
}

/// Sector P/E averages (worldperatio)
pub fn sector_pe() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sector": {"type": "string", "description": "Sector name for the stock."},
            "sector_pe": {"type": "number", "description": "Current PE ratio of the stock's sector."},
            "pe_5_year": {"type": "number", "description": "5-year average PE ratio for the sector."},
            "pe_10_year": {"type": "number", "description": "10-year average PE ratio for the sector."},
            "pe_20_year": {"type": "number", "description": "20-year average PE ratio for the sector."},
            "sp500_pe": {"type": "number", "description": "Current PE ratio of the S&P 500 index."}
        }
    })
}

/// Industry-average debt/equity ratio (fullratio)
pub fn industry_debt_equity() -> Value {
    json!({
        "type": "object",
        "properties": {
            "industry_name": {"type": "string", "description": "Industry name from the FullRatio website."},
            "avg_debt_equity_ratio": {"type": "number", "description": "Industry-average Debt-to-Equity (D/E) Ratio."}
        },
        "required": ["industry_name", "avg_debt_equity_ratio"]
    })
}
