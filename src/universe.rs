//! Ticker universe loading
//!
//! A universe is a plain text file with one symbol per line. Order is
//! preserved so scan output and progress reporting follow the file.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::types::Symbol;

/// Parse universe text: one symbol per line, trimmed, blanks skipped
pub fn parse_universe(text: &str) -> Vec<Symbol> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Load a universe file from disk
pub fn load_universe(path: impl AsRef<Path>) -> Result<Vec<Symbol>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_universe(&text))
}
