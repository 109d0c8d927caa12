//! Benchmark beta estimation
//!
//! Estimates an asset's market beta by regressing its daily returns against
//! a benchmark series over the date-aligned overlap of the two. Used when a
//! data source has no published beta for a ticker.

use chrono::NaiveDate;
use hashbrown::HashMap;
use statrs::statistics::{Data, Distribution};

use crate::types::{simple_return, Close};

/// Minimum overlapping daily returns for a usable estimate (one trading year)
pub const DEFAULT_MIN_OBSERVATIONS: usize = 252;

/// Estimates beta from two closing-price series
#[derive(Debug, Clone)]
pub struct BetaEstimator {
    min_observations: usize,
}

impl BetaEstimator {
    /// Create an estimator requiring at least `min_observations` overlapping
    /// daily returns
    pub fn new(min_observations: usize) -> Self {
        Self { min_observations }
    }

    /// Estimate beta of `asset` against `benchmark`.
    ///
    /// Both series must be sorted ascending by date. Only dates present in
    /// both series contribute. Returns `None` when the overlap is shorter
    /// than the minimum, the benchmark shows no variance, or the estimate is
    /// not finite.
    pub fn estimate(&self, asset: &[Close], benchmark: &[Close]) -> Option<f64> {
        let benchmark_by_date: HashMap<NaiveDate, f64> =
            benchmark.iter().map(|c| (c.date, c.price)).collect();

        let aligned: Vec<(f64, f64)> = asset
            .iter()
            .filter_map(|c| benchmark_by_date.get(&c.date).map(|&b| (c.price, b)))
            .collect();

        let mut asset_returns = Vec::with_capacity(aligned.len().saturating_sub(1));
        let mut market_returns = Vec::with_capacity(aligned.len().saturating_sub(1));
        for pair in aligned.windows(2) {
            let (prev_a, prev_m) = pair[0];
            let (cur_a, cur_m) = pair[1];
            if prev_a <= 0.0 || prev_m <= 0.0 {
                continue;
            }
            asset_returns.push(simple_return(prev_a, cur_a));
            market_returns.push(simple_return(prev_m, cur_m));
        }

        let n = asset_returns.len();
        if n < self.min_observations.max(2) {
            return None;
        }

        let asset_data = Data::new(asset_returns.clone());
        let market_data = Data::new(market_returns.clone());
        let asset_mean = asset_data.mean().unwrap_or(0.0);
        let market_mean = market_data.mean().unwrap_or(0.0);

        let covariance: f64 = asset_returns
            .iter()
            .zip(market_returns.iter())
            .map(|(&ai, &mi)| (ai - asset_mean) * (mi - market_mean))
            .sum::<f64>()
            / (n - 1) as f64;

        let market_variance: f64 = market_returns
            .iter()
            .map(|&mi| (mi - market_mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;

        if market_variance == 0.0 {
            return None;
        }

        let beta = covariance / market_variance;
        beta.is_finite().then_some(beta)
    }
}

impl Default for BetaEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_OBSERVATIONS)
    }
}
