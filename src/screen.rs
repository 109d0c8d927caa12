//! Screening and ranking
//!
//! Applies the risk-adjusted screen to a batch of asset records and ranks
//! the survivors. Thresholds live in [`ScreenCriteria`] so a config file can
//! override any of them.
//!
//! The market-cap floor is only enforced when at least one record in the
//! batch carries a cap at all. A result set written without fundamentals
//! data would otherwise never match anything.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::record::AssetRecord;
use crate::types::{MarketCap, Rate};

/// Thresholds a record must clear to be ranked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenCriteria {
    /// Minimum annualized historical return (inclusive)
    pub min_avg_return: Rate,
    /// Minimum CAPM expected return (inclusive)
    pub min_expected_return: Rate,
    /// Maximum beta (exclusive)
    pub max_beta: f64,
    /// Minimum market capitalization (inclusive), enforced only when the
    /// batch carries market-cap data
    pub min_market_cap: MarketCap,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            min_avg_return: 0.11,
            min_expected_return: 0.115,
            max_beta: 2.35,
            min_market_cap: 100_000_000,
        }
    }
}

impl ScreenCriteria {
    /// Whether a record clears every threshold.
    ///
    /// `NaN` metrics fail their comparisons and so never match. A record
    /// without a risk-adjusted return cannot be ranked and never matches.
    pub fn matches(&self, record: &AssetRecord, enforce_market_cap: bool) -> bool {
        let clears = record.avg_return >= self.min_avg_return
            && record.expected_return >= self.min_expected_return
            && record.beta < self.max_beta
            && record.risk_adj_20y.is_some();

        if !clears {
            return false;
        }

        if enforce_market_cap {
            record
                .market_cap
                .map_or(false, |cap| cap >= self.min_market_cap)
        } else {
            true
        }
    }
}

/// Outcome of ranking a batch
#[derive(Debug, Clone, PartialEq)]
pub struct TopSelection {
    /// The highest-ranked matching records, at most the requested limit
    pub top: Vec<AssetRecord>,
    /// How many records matched before truncation
    pub matched: usize,
}

/// Screen `records` and return the top `limit` by risk-adjusted return.
///
/// Ranking is descending and stable: records with equal risk-adjusted
/// returns keep their input order.
pub fn select_top(
    records: &[AssetRecord],
    limit: usize,
    criteria: &ScreenCriteria,
) -> TopSelection {
    let enforce_market_cap = records.iter().any(|r| r.market_cap.is_some());

    let mut matched: Vec<AssetRecord> = records
        .iter()
        .filter(|r| criteria.matches(r, enforce_market_cap))
        .cloned()
        .collect();

    matched.sort_by(|a, b| {
        let ra = a.risk_adj_20y.unwrap_or(f64::NEG_INFINITY);
        let rb = b.risk_adj_20y.unwrap_or(f64::NEG_INFINITY);
        rb.partial_cmp(&ra).unwrap_or(Ordering::Equal)
    });

    let total = matched.len();
    matched.truncate(limit);

    TopSelection {
        top: matched,
        matched: total,
    }
}
