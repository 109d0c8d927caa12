//! Computed per-ticker records
//!
//! An [`AssetRecord`] is created once per successfully processed ticker and
//! never mutated afterwards. The average historical return and beta are
//! mandatory; a ticker missing either is skipped by the pipeline rather than
//! recorded with placeholders.

use crate::types::{MarketCap, Rate, Symbol};
use serde::{Deserialize, Serialize};

/// One row of the computed record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Ticker symbol
    pub ticker: Symbol,
    /// Annualized average historical return (fractional)
    pub avg_return: Rate,
    /// CAPM expected annual return (fractional)
    pub expected_return: Rate,
    /// Market beta
    pub beta: f64,
    /// 20-year nominal compounded return. Always set at creation but not part
    /// of the persisted schema, so it is `None` after a CSV round trip.
    pub return_20y: Option<Rate>,
    /// 20-year risk-adjusted return. `None` only for rows read back from a
    /// record set whose cell is empty or non-finite.
    pub risk_adj_20y: Option<Rate>,
    /// Market capitalization in whole currency units, when known
    pub market_cap: Option<MarketCap>,
    /// Sector label, when known
    pub sector: Option<String>,
}
