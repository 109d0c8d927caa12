//! Local CSV data directory
//!
//! Reads market data from a flat directory: one `<SYMBOL>.csv` price file
//! per ticker with `Date` and `Close` columns, plus an optional
//! `fundamentals.csv` carrying `Ticker`, `Beta`, `Sector` and `Market Cap`
//! columns. When a ticker has no published beta and a benchmark symbol is
//! configured, beta is estimated from daily returns against the benchmark.

use chrono::NaiveDate;
use csv::ReaderBuilder;
use hashbrown::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, RiskRankError};
use crate::source::MarketDataSource;
use crate::stats::BetaEstimator;
use crate::types::{Close, MarketCap, Symbol};

/// File holding per-ticker fundamentals, relative to the data directory
const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

#[derive(Debug, Clone, Default)]
struct Fundamentals {
    beta: Option<f64>,
    sector: Option<String>,
    market_cap: Option<MarketCap>,
}

/// Market data source backed by a directory of CSV files
#[derive(Debug)]
pub struct CsvDirSource {
    dir: PathBuf,
    fundamentals: HashMap<Symbol, Fundamentals>,
    benchmark: Option<(Symbol, Vec<Close>)>,
    estimator: BetaEstimator,
}

impl CsvDirSource {
    /// Open a data directory, loading `fundamentals.csv` if present
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let fundamentals_path = dir.join(FUNDAMENTALS_FILE);
        let fundamentals = if fundamentals_path.exists() {
            load_fundamentals(&fundamentals_path)?
        } else {
            HashMap::new()
        };

        log::debug!(
            "opened data dir {} with {} fundamentals rows",
            dir.display(),
            fundamentals.len()
        );

        Ok(Self {
            dir,
            fundamentals,
            benchmark: None,
            estimator: BetaEstimator::default(),
        })
    }

    /// Estimate missing betas against this benchmark symbol. Loads the
    /// benchmark's price file up front so misconfiguration fails here, not
    /// once per ticker.
    pub fn with_benchmark(mut self, symbol: impl Into<Symbol>) -> Result<Self> {
        let symbol = symbol.into();
        let closes = self.load_closes(&symbol)?;
        self.benchmark = Some((symbol, closes));
        Ok(self)
    }

    /// Replace the default beta estimator
    pub fn with_estimator(mut self, estimator: BetaEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    fn load_closes(&self, symbol: &str) -> Result<Vec<Close>> {
        let path = self.dir.join(format!("{}.csv", symbol));
        let mut rdr = ReaderBuilder::new().from_path(&path).map_err(|e| {
            RiskRankError::DataSource(format!("no local data for {}: {}", symbol, e))
        })?;

        let headers = rdr.headers()?.clone();
        let date_idx = find_column(&headers, "Date").ok_or_else(|| {
            RiskRankError::DataSource(format!("{}: no Date column", path.display()))
        })?;
        let close_idx = find_column(&headers, "Close").ok_or_else(|| {
            RiskRankError::DataSource(format!("{}: no Close column", path.display()))
        })?;

        let mut closes = Vec::new();
        for row in rdr.records() {
            let row = row?;
            let date = row
                .get(date_idx)
                .and_then(|c| NaiveDate::parse_from_str(c.trim(), "%Y-%m-%d").ok());
            let price = row
                .get(close_idx)
                .and_then(|c| c.trim().parse::<f64>().ok())
                .filter(|p| p.is_finite());

            // Rows a vendor export left unfilled are dropped, not fatal.
            if let (Some(date), Some(price)) = (date, price) {
                closes.push(Close::new(date, price));
            }
        }

        closes.sort_by_key(|c| c.date);
        Ok(closes)
    }
}

impl MarketDataSource for CsvDirSource {
    fn price_history(&self, symbol: &str) -> Result<Vec<Close>> {
        self.load_closes(symbol)
    }

    fn beta(&self, symbol: &str) -> Result<Option<f64>> {
        if let Some(beta) = self.fundamentals.get(symbol).and_then(|f| f.beta) {
            return Ok(Some(beta));
        }

        match &self.benchmark {
            Some((_, benchmark_closes)) => {
                let closes = self.load_closes(symbol)?;
                Ok(self.estimator.estimate(&closes, benchmark_closes))
            }
            None => Ok(None),
        }
    }

    fn sector(&self, symbol: &str) -> Result<Option<String>> {
        Ok(self
            .fundamentals
            .get(symbol)
            .and_then(|f| f.sector.clone()))
    }

    fn market_cap(&self, symbol: &str) -> Result<Option<MarketCap>> {
        Ok(self.fundamentals.get(symbol).and_then(|f| f.market_cap))
    }
}

fn load_fundamentals(path: &Path) -> Result<HashMap<Symbol, Fundamentals>> {
    let mut rdr = ReaderBuilder::new().from_path(path).map_err(|e| {
        RiskRankError::DataSource(format!("cannot open {}: {}", path.display(), e))
    })?;

    let headers = rdr.headers()?.clone();
    let ticker_idx = find_column(&headers, "Ticker").ok_or_else(|| {
        RiskRankError::DataSource(format!("{}: no Ticker column", path.display()))
    })?;
    let beta_idx = find_column(&headers, "Beta");
    let sector_idx = find_column(&headers, "Sector");
    let cap_idx = find_column(&headers, "Market Cap");

    let mut out = HashMap::new();
    for row in rdr.records() {
        let row = row?;
        let ticker = match row.get(ticker_idx).map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => continue,
        };

        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(str::trim);

        let beta = cell(beta_idx)
            .and_then(|c| c.parse::<f64>().ok())
            .filter(|b| b.is_finite());
        let sector = cell(sector_idx)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let market_cap = cell(cap_idx)
            .and_then(|c| c.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u64);

        out.insert(
            ticker,
            Fundamentals {
                beta,
                sector,
                market_cap,
            },
        );
    }

    Ok(out)
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;
    use std::fs;
    use tempfile::TempDir;

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, 4).unwrap() + Duration::days(i as i64)
    }

    fn write_price_file(dir: &TempDir, symbol: &str, rows: &[(NaiveDate, f64)]) {
        let mut text = String::from("Date,Open,Close\n");
        for (date, close) in rows {
            text.push_str(&format!("{},0.0,{}\n", date.format("%Y-%m-%d"), close));
        }
        fs::write(dir.path().join(format!("{}.csv", symbol)), text).unwrap();
    }

    fn write_series_from_returns(dir: &TempDir, symbol: &str, start: f64, returns: &[f64]) {
        let mut rows = vec![(day(0), start)];
        let mut price = start;
        for (i, r) in returns.iter().enumerate() {
            price *= 1.0 + r;
            rows.push((day(i + 1), price));
        }
        write_price_file(dir, symbol, &rows);
    }

    #[test]
    fn test_price_history_is_sorted_ascending() {
        let dir = TempDir::new().unwrap();
        // Vendor export in reverse chronological order.
        write_price_file(
            &dir,
            "AAPL",
            &[(day(2), 102.0), (day(0), 100.0), (day(1), 101.0)],
        );

        let source = CsvDirSource::open(dir.path()).unwrap();
        let closes = source.price_history("AAPL").unwrap();
        assert_eq!(closes.len(), 3);
        assert!(closes.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(closes[0].price, 100.0);
    }

    #[test]
    fn test_unfilled_rows_are_dropped() {
        let dir = TempDir::new().unwrap();
        let text = "Date,Close\n2021-01-04,100.0\n2021-01-05,null\nnot-a-date,101.0\n2021-01-06,102.0\n";
        fs::write(dir.path().join("AAPL.csv"), text).unwrap();

        let source = CsvDirSource::open(dir.path()).unwrap();
        let closes = source.price_history("AAPL").unwrap();
        assert_eq!(closes.len(), 2);
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("AAPL.csv"), "date,close\n2021-01-04,100.0\n").unwrap();

        let source = CsvDirSource::open(dir.path()).unwrap();
        assert_eq!(source.price_history("AAPL").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_symbol_errors() {
        let dir = TempDir::new().unwrap();
        let source = CsvDirSource::open(dir.path()).unwrap();
        assert!(source.price_history("NOPE").is_err());
    }

    #[test]
    fn test_missing_close_column_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("AAPL.csv"), "Date,Open\n2021-01-04,100.0\n").unwrap();

        let source = CsvDirSource::open(dir.path()).unwrap();
        assert!(source.price_history("AAPL").is_err());
    }

    #[test]
    fn test_fundamentals_lookup() {
        let dir = TempDir::new().unwrap();
        let text = "Ticker,Beta,Sector,Market Cap\nAAPL,1.25,Technology,2.5e12\nODDCO,,,\n";
        fs::write(dir.path().join("fundamentals.csv"), text).unwrap();

        let source = CsvDirSource::open(dir.path()).unwrap();
        assert_eq!(source.beta("AAPL").unwrap(), Some(1.25));
        assert_eq!(source.sector("AAPL").unwrap().as_deref(), Some("Technology"));
        assert_eq!(source.market_cap("AAPL").unwrap(), Some(2_500_000_000_000));

        assert_eq!(source.beta("ODDCO").unwrap(), None);
        assert_eq!(source.sector("ODDCO").unwrap(), None);
        assert_eq!(source.market_cap("ODDCO").unwrap(), None);

        assert_eq!(source.beta("UNLISTED").unwrap(), None);
    }

    #[test]
    fn test_fundamentals_with_partial_columns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fundamentals.csv"), "Ticker,Beta\nAAPL,1.1\n").unwrap();

        let source = CsvDirSource::open(dir.path()).unwrap();
        assert_eq!(source.beta("AAPL").unwrap(), Some(1.1));
        assert_eq!(source.sector("AAPL").unwrap(), None);
        assert_eq!(source.market_cap("AAPL").unwrap(), None);
    }

    #[test]
    fn test_fundamentals_requires_ticker_column() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fundamentals.csv"), "Symbol,Beta\nAAPL,1.1\n").unwrap();
        assert!(CsvDirSource::open(dir.path()).is_err());
    }

    #[test]
    fn test_beta_estimated_against_benchmark() {
        let dir = TempDir::new().unwrap();
        let market: Vec<f64> = (0..40)
            .map(|i| 0.01 * ((i % 7) as f64 - 3.0) / 3.0)
            .collect();
        let levered: Vec<f64> = market.iter().map(|r| 2.0 * r).collect();
        write_series_from_returns(&dir, "SPY", 400.0, &market);
        write_series_from_returns(&dir, "AAPL", 150.0, &levered);

        let source = CsvDirSource::open(dir.path())
            .unwrap()
            .with_benchmark("SPY")
            .unwrap()
            .with_estimator(BetaEstimator::new(20));

        let beta = source.beta("AAPL").unwrap().unwrap();
        assert_relative_eq!(beta, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_published_beta_wins_over_estimation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fundamentals.csv"), "Ticker,Beta\nAAPL,1.6\n").unwrap();
        write_price_file(&dir, "SPY", &[(day(0), 400.0), (day(1), 401.0)]);

        let source = CsvDirSource::open(dir.path())
            .unwrap()
            .with_benchmark("SPY")
            .unwrap();
        assert_eq!(source.beta("AAPL").unwrap(), Some(1.6));
    }

    #[test]
    fn test_missing_benchmark_file_fails_at_setup() {
        let dir = TempDir::new().unwrap();
        let source = CsvDirSource::open(dir.path()).unwrap();
        assert!(source.with_benchmark("SPY").is_err());
    }

    #[test]
    fn test_beta_none_without_benchmark_or_fundamentals() {
        let dir = TempDir::new().unwrap();
        write_price_file(&dir, "AAPL", &[(day(0), 100.0)]);
        let source = CsvDirSource::open(dir.path()).unwrap();
        assert_eq!(source.beta("AAPL").unwrap(), None);
    }
}
