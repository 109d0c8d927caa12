//! # RiskRank
//!
//! A risk-adjusted return screener for equity tickers.
//!
//! RiskRank walks a universe of tickers, derives each one's annualized
//! historical return and CAPM expected return, projects the expected return
//! over a 20-year horizon, and ranks the survivors of a screening filter by
//! risk-adjusted return. Result sets persist as CSV so a screen can be
//! re-ranked later without refetching data.
//!
//! ## Example
//!
//! ```rust,no_run
//! use riskrank::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let source = CsvDirSource::open("data")?;
//!     let universe = load_universe("tickers.txt")?;
//!
//!     let outcome = MetricsPipeline::default().run(&source, &universe);
//!     let selection = select_top(&outcome.records, 10, &ScreenCriteria::default());
//!
//!     println!("{} assets met the criteria", selection.matched);
//!     for record in &selection.top {
//!         println!("{}: {:?}", record.ticker, record.risk_adj_20y);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod returns;
pub mod screen;
pub mod source;
pub mod stats;
pub mod store;
pub mod types;
pub mod universe;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::ModelConfig;
    pub use crate::error::{Result, RiskRankError};
    pub use crate::pipeline::{
        BatchOutcome, CancelToken, MetricsPipeline, Progress, SkipReason, SkippedTicker,
    };
    pub use crate::record::AssetRecord;
    pub use crate::returns::ReturnCalculator;
    pub use crate::screen::{select_top, ScreenCriteria, TopSelection};
    #[cfg(feature = "http")]
    pub use crate::source::HttpSource;
    pub use crate::source::{CsvDirSource, MarketDataSource, StaticDataSource};
    pub use crate::stats::BetaEstimator;
    pub use crate::store::{read_records, write_records};
    pub use crate::types::*;
    pub use crate::universe::load_universe;
}
