//! Core types and aliases

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ticker symbol for assets
pub type Symbol = String;

/// Price type (using f64 for precision)
pub type Price = f64;

/// Fractional rate of return (0.10 = 10%)
pub type Rate = f64;

/// Market capitalization in whole currency units
pub type MarketCap = u64;

/// A single daily close: date plus adjusted closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Close {
    pub date: NaiveDate,
    pub price: Price,
}

impl Close {
    /// Create a new close
    pub fn new(date: NaiveDate, price: Price) -> Self {
        Self { date, price }
    }
}

/// Simple return between two closes: (later / earlier) - 1
pub fn simple_return(earlier: Price, later: Price) -> Rate {
    (later - earlier) / earlier
}
