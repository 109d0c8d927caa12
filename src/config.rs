//! Model configuration
//!
//! All rates and horizons are explicit call-time configuration rather than
//! ambient state, so the same process can run several differently tuned
//! batches side by side.

use crate::types::Rate;
use serde::{Deserialize, Serialize};

/// Configuration for return derivation (CAPM rates, windows, horizon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Annual risk-free rate (fractional)
    pub risk_free_rate: Rate,
    /// Long-run annual market return (fractional)
    pub market_return: Rate,
    /// Projection horizon in years
    pub horizon_years: u32,
    /// Preferred lookback window for the historical average, in years
    pub lookback_years: u32,
    /// Fallback lookback window when the preferred one is not covered
    pub fallback_years: u32,
    /// Trading days per calendar year
    pub trading_days_per_year: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.045,
            market_return: 0.102,
            horizon_years: 20,
            lookback_years: 10,
            fallback_years: 7,
            trading_days_per_year: 252,
        }
    }
}

impl ModelConfig {
    /// Closes required for the preferred lookback window
    pub fn lookback_closes(&self) -> usize {
        self.lookback_years as usize * self.trading_days_per_year
    }

    /// Closes required for the fallback window
    pub fn fallback_closes(&self) -> usize {
        self.fallback_years as usize * self.trading_days_per_year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        let config = ModelConfig::default();
        assert_eq!(config.lookback_closes(), 2520);
        assert_eq!(config.fallback_closes(), 1764);
    }

    #[test]
    fn test_partial_deserialization_keeps_defaults() {
        let config: ModelConfig = serde_json::from_str(r#"{"risk_free_rate": 0.05}"#).unwrap();
        assert_eq!(config.risk_free_rate, 0.05);
        assert_eq!(config.market_return, 0.102);
        assert_eq!(config.horizon_years, 20);
    }
}
