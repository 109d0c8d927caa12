//! Result set persistence
//!
//! Reads and writes the screener's CSV result sets. The column set is fixed
//! and header matching on read is exact (case and spelling), so a file
//! produced by one run is always consumable by a later screening run.
//! Individual cells are parsed leniently: a numeric cell that does not
//! parse becomes `NaN` (and so fails every screen comparison), optional
//! cells that are empty or unusable become `None`.

use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::{Result, RiskRankError};
use crate::record::AssetRecord;

/// Persisted column names, in file order
pub const HEADERS: [&str; 7] = [
    "Ticker",
    "Avg Return",
    "Expected Return",
    "Beta",
    "20-Year Risk adj",
    "Market Cap",
    "Sector",
];

/// Write records as CSV to a writer, header row first
pub fn write_records_to<W: Write>(writer: W, records: &[AssetRecord]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADERS)?;

    for record in records {
        wtr.write_record([
            record.ticker.clone(),
            record.avg_return.to_string(),
            record.expected_return.to_string(),
            record.beta.to_string(),
            record
                .risk_adj_20y
                .map(|v| v.to_string())
                .unwrap_or_default(),
            record
                .market_cap
                .map(|v| v.to_string())
                .unwrap_or_default(),
            record.sector.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write records as CSV to a file path
pub fn write_records(path: impl AsRef<Path>, records: &[AssetRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_records_to(file, records)
}

/// Read records from a CSV reader.
///
/// Fails with `MissingColumns` naming every required column the header row
/// lacks. Extra columns (such as a frame index) are ignored. The 20-year
/// nominal return is not persisted and comes back as `None`.
pub fn read_records_from<R: Read>(reader: R) -> Result<Vec<AssetRecord>> {
    let mut rdr = ReaderBuilder::new().from_reader(reader);
    let headers = rdr.headers()?.clone();
    let idx = find_columns(&headers)?;

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let cell = |i: usize| row.get(idx[i]).unwrap_or("");

        records.push(AssetRecord {
            ticker: cell(0).trim().to_string(),
            avg_return: parse_rate(cell(1)),
            expected_return: parse_rate(cell(2)),
            beta: parse_rate(cell(3)),
            return_20y: None,
            risk_adj_20y: parse_optional_rate(cell(4)),
            market_cap: parse_market_cap(cell(5)),
            sector: parse_sector(cell(6)),
        });
    }

    Ok(records)
}

/// Read records from a CSV file path
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<AssetRecord>> {
    let file = std::fs::File::open(path)?;
    read_records_from(file)
}

/// Locate each required column, exact match only
fn find_columns(headers: &csv::StringRecord) -> Result<[usize; 7]> {
    let mut indices = [0usize; 7];
    let mut missing = Vec::new();

    for (slot, name) in indices.iter_mut().zip(HEADERS) {
        match headers.iter().position(|h| h == name) {
            Some(i) => *slot = i,
            None => missing.push(name.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(RiskRankError::MissingColumns(missing))
    }
}

fn parse_rate(cell: &str) -> f64 {
    cell.trim().parse().unwrap_or(f64::NAN)
}

fn parse_optional_rate(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

fn parse_market_cap(cell: &str) -> Option<u64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    let value: f64 = cell.parse().ok()?;
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}

fn parse_sector(cell: &str) -> Option<String> {
    let cell = cell.trim();
    (!cell.is_empty()).then(|| cell.to_string())
}
