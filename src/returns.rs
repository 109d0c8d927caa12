//! Return derivation
//!
//! Derives annualized historical returns from closing-price series and
//! projects CAPM expected returns over a long horizon. All rates come from
//! an explicit [`ModelConfig`]; there is no ambient state.

use crate::config::ModelConfig;
use crate::error::{Result, RiskRankError};
use crate::types::{Close, Rate};

/// Derives historical and projected returns for a single ticker
#[derive(Debug, Clone)]
pub struct ReturnCalculator {
    config: ModelConfig,
}

impl ReturnCalculator {
    /// Create a calculator with the given model configuration
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// The model configuration in use
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Annualized average return over the trailing lookback window.
    ///
    /// Uses the last `lookback_years * trading_days` closes when the series
    /// covers them, else falls back to the shorter fallback window, else
    /// fails with `InsufficientHistory`. Annualization divides by the years
    /// of whichever window was actually taken.
    pub fn average_historical_return(&self, closes: &[Close]) -> Result<Rate> {
        let preferred = self.config.lookback_closes();
        let fallback = self.config.fallback_closes();

        let (window_len, window_years) = if preferred > 0 && closes.len() >= preferred {
            (preferred, self.config.lookback_years)
        } else if fallback > 0 && closes.len() >= fallback {
            (fallback, self.config.fallback_years)
        } else {
            return Err(RiskRankError::InsufficientHistory {
                have: closes.len(),
                need: fallback.max(1),
            });
        };

        let window = &closes[closes.len() - window_len..];
        let first = window[0].price;
        let last = window[window_len - 1].price;
        let total_return = (last - first) / first;
        let annualized = (1.0 + total_return).powf(1.0 / f64::from(window_years)) - 1.0;

        if !annualized.is_finite() {
            return Err(RiskRankError::DataSource(format!(
                "degenerate price window of {} closes cannot be annualized",
                window_len
            )));
        }

        Ok(annualized)
    }

    /// CAPM expected annual return: `rf + beta * (market - rf)`
    pub fn expected_return(&self, beta: f64) -> Rate {
        self.config.risk_free_rate + beta * (self.config.market_return - self.config.risk_free_rate)
    }

    /// Nominal compounded return over the configured horizon
    pub fn horizon_return(&self, expected_return: Rate) -> Rate {
        (1.0 + expected_return).powi(self.config.horizon_years as i32) - 1.0
    }

    /// Horizon return in excess of compounded risk-free growth, per unit of
    /// beta. Errors on a beta of exactly zero rather than dividing by it.
    pub fn risk_adjusted_horizon_return(&self, expected_return: Rate, beta: f64) -> Result<Rate> {
        if beta == 0.0 {
            return Err(RiskRankError::ZeroBeta);
        }
        let risk_free_growth =
            (1.0 + self.config.risk_free_rate).powi(self.config.horizon_years as i32);
        Ok((self.horizon_return(expected_return) - risk_free_growth) / beta)
    }
}

impl Default for ReturnCalculator {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}
