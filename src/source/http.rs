//! Quote API data source
//!
//! Pulls closing-price history from the Yahoo Finance download endpoint and
//! beta, sector and market cap from its quote-summary endpoint. The summary
//! response answers three of the trait's questions, so it is fetched once
//! per symbol and cached for the life of the source.

use chrono::{NaiveDate, Utc};
use hashbrown::HashMap;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{Result, RiskRankError};
use crate::source::MarketDataSource;
use crate::types::{Close, MarketCap, Symbol};

const DOWNLOAD_BASE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/download";
const SUMMARY_BASE_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";

/// Calendar years of history to request. Comfortably covers the ten
/// trading years the return calculator wants.
const HISTORY_CALENDAR_YEARS: i64 = 15;

/// Market data source backed by a public quote API
pub struct HttpSource {
    client: Client,
    summaries: Mutex<HashMap<Symbol, SymbolSummary>>,
}

#[derive(Debug, Clone, Default)]
struct SymbolSummary {
    beta: Option<f64>,
    sector: Option<String>,
    market_cap: Option<MarketCap>,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Close")]
    close: String,
}

impl HttpSource {
    /// Create a new source with a 30 second request timeout
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| {
                RiskRankError::DataSource(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            summaries: Mutex::new(HashMap::new()),
        })
    }

    fn fetch_summary(&self, symbol: &str) -> Result<SymbolSummary> {
        if let Some(cached) = self.cached_summary(symbol) {
            return Ok(cached);
        }

        let url = format!(
            "{}/{}?modules=summaryDetail,assetProfile,price",
            SUMMARY_BASE_URL, symbol
        );
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| RiskRankError::DataSource(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RiskRankError::DataSource(format!(
                "quote API returned {} for {}",
                response.status(),
                symbol
            )));
        }

        let body: Value = response
            .json()
            .map_err(|e| RiskRankError::DataSource(format!("failed to read response: {}", e)))?;

        let summary = extract_summary(&body);
        self.store_summary(symbol, summary.clone());
        Ok(summary)
    }

    fn cached_summary(&self, symbol: &str) -> Option<SymbolSummary> {
        self.summaries
            .lock()
            .ok()
            .and_then(|cache| cache.get(symbol).cloned())
    }

    fn store_summary(&self, symbol: &str, summary: SymbolSummary) {
        if let Ok(mut cache) = self.summaries.lock() {
            cache.insert(symbol.to_string(), summary);
        }
    }
}

impl MarketDataSource for HttpSource {
    fn price_history(&self, symbol: &str) -> Result<Vec<Close>> {
        let now = Utc::now();
        let period2 = now.timestamp();
        let period1 = period2 - HISTORY_CALENDAR_YEARS * 365 * 24 * 60 * 60;

        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            DOWNLOAD_BASE_URL, symbol, period1, period2
        );

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| RiskRankError::DataSource(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RiskRankError::DataSource(format!(
                "history download returned {} for {}",
                response.status(),
                symbol
            )));
        }

        let text = response
            .text()
            .map_err(|e| RiskRankError::DataSource(format!("failed to read response: {}", e)))?;

        parse_history_csv(&text)
    }

    fn beta(&self, symbol: &str) -> Result<Option<f64>> {
        Ok(self.fetch_summary(symbol)?.beta)
    }

    fn sector(&self, symbol: &str) -> Result<Option<String>> {
        Ok(self.fetch_summary(symbol)?.sector)
    }

    fn market_cap(&self, symbol: &str) -> Result<Option<MarketCap>> {
        Ok(self.fetch_summary(symbol)?.market_cap)
    }
}

fn parse_history_csv(text: &str) -> Result<Vec<Close>> {
    let mut rdr = csv::Reader::from_reader(text.as_bytes());
    let mut closes = Vec::new();

    for row in rdr.deserialize() {
        let row: HistoryRow =
            row.map_err(|e| RiskRankError::Parse(format!("history CSV: {}", e)))?;

        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").ok();
        let price = row
            .close
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite());

        // The API marks untraded days with literal "null" cells.
        if let (Some(date), Some(price)) = (date, price) {
            closes.push(Close::new(date, price));
        }
    }

    closes.sort_by_key(|c| c.date);
    Ok(closes)
}

fn extract_summary(body: &Value) -> SymbolSummary {
    let result = body.pointer("/quoteSummary/result/0");

    let beta = result
        .and_then(|r| r.pointer("/summaryDetail/beta/raw"))
        .and_then(Value::as_f64)
        .filter(|b| b.is_finite());

    let sector = result
        .and_then(|r| r.pointer("/assetProfile/sector"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let market_cap = result
        .and_then(|r| r.pointer("/price/marketCap/raw"))
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u64);

    SymbolSummary {
        beta,
        sector,
        market_cap,
    }
}
