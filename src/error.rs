//! Error types for riskrank

use thiserror::Error;

/// Main error type for riskrank
#[derive(Error, Debug)]
pub enum RiskRankError {
    #[error("insufficient history: {have} closes, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("no beta available for {0}")]
    MissingBeta(String),

    #[error("data source failure: {0}")]
    DataSource(String),

    #[error("missing columns in record set: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("beta is zero, risk-adjusted return is undefined")]
    ZeroBeta,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for riskrank operations
pub type Result<T> = std::result::Result<T, RiskRankError>;
