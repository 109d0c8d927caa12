//! Market data sources
//!
//! A [`MarketDataSource`] answers four questions about a ticker: its closing
//! price history, its beta, its sector and its market capitalization. The
//! pipeline treats history and beta as required and the rest as optional
//! enrichment, so implementations report "unknown" as `Ok(None)` rather
//! than an error.
//!
//! [`CsvDirSource`] reads a local directory of per-symbol CSV files;
//! [`HttpSource`] (feature `http`) pulls the same facts from a quote API.

use hashbrown::HashMap;

use crate::error::{Result, RiskRankError};
use crate::types::{Close, MarketCap, Symbol};

pub mod local;

#[cfg(feature = "http")]
pub mod http;

pub use local::CsvDirSource;

#[cfg(feature = "http")]
pub use http::HttpSource;

/// Provider of per-ticker market data
pub trait MarketDataSource: Send + Sync {
    /// Daily closing prices, sorted ascending by date
    fn price_history(&self, symbol: &str) -> Result<Vec<Close>>;

    /// Published or estimated beta, `None` when the source has none
    fn beta(&self, symbol: &str) -> Result<Option<f64>>;

    /// Sector classification, if known
    fn sector(&self, symbol: &str) -> Result<Option<String>>;

    /// Market capitalization, if known
    fn market_cap(&self, symbol: &str) -> Result<Option<MarketCap>>;
}

/// Fixed in-memory source, used by tests and benchmarks
#[derive(Debug, Default)]
pub struct StaticDataSource {
    closes: HashMap<Symbol, Vec<Close>>,
    betas: HashMap<Symbol, f64>,
    sectors: HashMap<Symbol, String>,
    market_caps: HashMap<Symbol, MarketCap>,
}

impl StaticDataSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closing-price history for a symbol
    pub fn add_history(&mut self, symbol: impl Into<Symbol>, closes: Vec<Close>) {
        self.closes.insert(symbol.into(), closes);
    }

    /// Register a beta for a symbol
    pub fn add_beta(&mut self, symbol: impl Into<Symbol>, beta: f64) {
        self.betas.insert(symbol.into(), beta);
    }

    /// Register a sector for a symbol
    pub fn add_sector(&mut self, symbol: impl Into<Symbol>, sector: impl Into<String>) {
        self.sectors.insert(symbol.into(), sector.into());
    }

    /// Register a market cap for a symbol
    pub fn add_market_cap(&mut self, symbol: impl Into<Symbol>, cap: MarketCap) {
        self.market_caps.insert(symbol.into(), cap);
    }
}

impl MarketDataSource for StaticDataSource {
    fn price_history(&self, symbol: &str) -> Result<Vec<Close>> {
        self.closes
            .get(symbol)
            .cloned()
            .ok_or_else(|| RiskRankError::DataSource(format!("no price history for {}", symbol)))
    }

    fn beta(&self, symbol: &str) -> Result<Option<f64>> {
        Ok(self.betas.get(symbol).copied())
    }

    fn sector(&self, symbol: &str) -> Result<Option<String>> {
        Ok(self.sectors.get(symbol).cloned())
    }

    fn market_cap(&self, symbol: &str) -> Result<Option<MarketCap>> {
        Ok(self.market_caps.get(symbol).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_static_source_round_trip() {
        let mut source = StaticDataSource::new();
        source.add_history(
            "AAPL",
            vec![Close::new(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(), 300.0)],
        );
        source.add_beta("AAPL", 1.2);
        source.add_sector("AAPL", "Technology");
        source.add_market_cap("AAPL", 2_000_000_000_000);

        assert_eq!(source.price_history("AAPL").unwrap().len(), 1);
        assert_eq!(source.beta("AAPL").unwrap(), Some(1.2));
        assert_eq!(
            source.sector("AAPL").unwrap().as_deref(),
            Some("Technology")
        );
        assert_eq!(
            source.market_cap("AAPL").unwrap(),
            Some(2_000_000_000_000)
        );
    }

    #[test]
    fn test_unknown_symbol() {
        let source = StaticDataSource::new();
        assert!(source.price_history("NOPE").is_err());
        assert_eq!(source.beta("NOPE").unwrap(), None);
        assert_eq!(source.sector("NOPE").unwrap(), None);
        assert_eq!(source.market_cap("NOPE").unwrap(), None);
    }
}
