//! Screening pipeline
//!
//! Walks a ticker universe against a market data source and derives one
//! [`AssetRecord`] per usable ticker. A ticker that cannot be evaluated is
//! skipped with a recorded reason rather than aborting the batch. The walk
//! is strictly sequential, reports progress after every ticker, and can be
//! cancelled between tickers from another thread.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ModelConfig;
use crate::error::RiskRankError;
use crate::record::AssetRecord;
use crate::returns::ReturnCalculator;
use crate::source::MarketDataSource;
use crate::types::Symbol;

/// Cooperative cancellation flag, shared across threads
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The pipeline stops before its next ticker.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Position within a batch, emitted after each ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Tickers handled so far, skips included
    pub completed: usize,
    /// Universe size
    pub total: usize,
}

/// Why a ticker produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Too few closes for even the fallback window
    InsufficientHistory { closes: usize },
    /// The source knows no usable beta
    MissingBeta,
    /// A beta of exactly zero cannot be risk-adjusted
    ZeroBeta,
    /// The source failed outright
    Source(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientHistory { closes } => {
                write!(f, "insufficient history ({} closes)", closes)
            }
            Self::MissingBeta => write!(f, "no beta available"),
            Self::ZeroBeta => write!(f, "beta is zero"),
            Self::Source(msg) => write!(f, "{}", msg),
        }
    }
}

/// A ticker the batch could not evaluate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTicker {
    pub symbol: Symbol,
    pub reason: SkipReason,
}

/// Everything a batch run produced
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Records for tickers that evaluated cleanly, in universe order
    pub records: Vec<AssetRecord>,
    /// Tickers skipped, with reasons, in universe order
    pub skipped: Vec<SkippedTicker>,
    /// True when the run stopped early on a cancel request
    pub cancelled: bool,
}

/// Derives risk and return metrics for a universe of tickers
#[derive(Debug, Clone, Default)]
pub struct MetricsPipeline {
    calculator: ReturnCalculator,
}

impl MetricsPipeline {
    /// Create a pipeline with the given model configuration
    pub fn new(config: ModelConfig) -> Self {
        Self {
            calculator: ReturnCalculator::new(config),
        }
    }

    /// Run a batch with no cancellation or progress reporting
    pub fn run(&self, source: &dyn MarketDataSource, universe: &[Symbol]) -> BatchOutcome {
        self.run_with(source, universe, &CancelToken::new(), |_| {})
    }

    /// Run a batch, honoring `cancel` between tickers and calling
    /// `on_progress` after every ticker, skipped or not
    pub fn run_with(
        &self,
        source: &dyn MarketDataSource,
        universe: &[Symbol],
        cancel: &CancelToken,
        mut on_progress: impl FnMut(Progress),
    ) -> BatchOutcome {
        let total = universe.len();
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        log::info!("screening {} tickers", total);

        for (done, symbol) in universe.iter().enumerate() {
            if cancel.is_cancelled() {
                log::warn!("cancelled after {} of {} tickers", done, total);
                return BatchOutcome {
                    records,
                    skipped,
                    cancelled: true,
                };
            }

            match self.evaluate(source, symbol) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    log::warn!("skipping {}: {}", symbol, reason);
                    skipped.push(SkippedTicker {
                        symbol: symbol.clone(),
                        reason,
                    });
                }
            }

            on_progress(Progress {
                completed: done + 1,
                total,
            });
        }

        log::info!(
            "screen complete: {} records, {} skipped",
            records.len(),
            skipped.len()
        );

        BatchOutcome {
            records,
            skipped,
            cancelled: false,
        }
    }

    fn evaluate(
        &self,
        source: &dyn MarketDataSource,
        symbol: &str,
    ) -> std::result::Result<AssetRecord, SkipReason> {
        let closes = source
            .price_history(symbol)
            .map_err(|e| SkipReason::Source(e.to_string()))?;

        let avg_return = match self.calculator.average_historical_return(&closes) {
            Ok(avg) => avg,
            Err(RiskRankError::InsufficientHistory { have, .. }) => {
                return Err(SkipReason::InsufficientHistory { closes: have })
            }
            Err(e) => return Err(SkipReason::Source(e.to_string())),
        };

        let beta = match source.beta(symbol) {
            Ok(Some(beta)) if beta.is_finite() => beta,
            Ok(_) => return Err(SkipReason::MissingBeta),
            Err(e) => return Err(SkipReason::Source(e.to_string())),
        };

        let expected_return = self.calculator.expected_return(beta);
        let return_20y = self.calculator.horizon_return(expected_return);
        let risk_adj_20y = self
            .calculator
            .risk_adjusted_horizon_return(expected_return, beta)
            .map_err(|_| SkipReason::ZeroBeta)?;

        // An absurd beta can push the compounded projection out of range.
        if !expected_return.is_finite() || !return_20y.is_finite() || !risk_adj_20y.is_finite() {
            return Err(SkipReason::Source(format!(
                "beta {} projects to non-finite metrics",
                beta
            )));
        }

        // Enrichment is best effort: a failed lookup leaves the field empty.
        let market_cap = source.market_cap(symbol).unwrap_or_else(|e| {
            log::debug!("no market cap for {}: {}", symbol, e);
            None
        });
        let sector = source.sector(symbol).unwrap_or_else(|e| {
            log::debug!("no sector for {}: {}", symbol, e);
            None
        });

        Ok(AssetRecord {
            ticker: symbol.to_string(),
            avg_return,
            expected_return,
            beta,
            return_20y: Some(return_20y),
            risk_adj_20y: Some(risk_adj_20y),
            market_cap,
            sector,
        })
    }
}
