//! Integration tests for riskrank
//!
//! Drives the whole flow the CLI uses: universe -> pipeline -> persisted
//! result set -> screen, against an in-memory data source.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use riskrank::{
    config::ModelConfig,
    pipeline::{CancelToken, MetricsPipeline, SkipReason},
    screen::{select_top, ScreenCriteria},
    source::StaticDataSource,
    store,
    types::Close,
};
use tempfile::NamedTempFile;

/// Ten trading years of geometric growth hitting `annualized` per year
fn growth_history(annualized: f64) -> Vec<Close> {
    let n = 2520;
    let total = (1.0 + annualized).powi(10) - 1.0;
    let start = NaiveDate::from_ymd_opt(2014, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let fraction = i as f64 / (n - 1) as f64;
            let price = 100.0 * (1.0 + total).powf(fraction);
            Close::new(start + Duration::days(i as i64), price)
        })
        .collect()
}

fn screened_source() -> StaticDataSource {
    let mut source = StaticDataSource::new();

    // Clears every threshold, mid-pack risk-adjusted return.
    source.add_history("WIN1", growth_history(0.13));
    source.add_beta("WIN1", 1.3);
    source.add_market_cap("WIN1", 500_000_000);
    source.add_sector("WIN1", "Technology");

    // Clears every threshold with a higher risk-adjusted return.
    source.add_history("WIN2", growth_history(0.18));
    source.add_beta("WIN2", 2.0);
    source.add_market_cap("WIN2", 2_000_000_000);
    source.add_sector("WIN2", "Healthcare");

    // Beta at the ceiling and above it.
    source.add_history("HOTBETA", growth_history(0.20));
    source.add_beta("HOTBETA", 2.5);
    source.add_market_cap("HOTBETA", 900_000_000);

    // Strong beta, weak history.
    source.add_history("FLAT", growth_history(0.05));
    source.add_beta("FLAT", 1.5);
    source.add_market_cap("FLAT", 900_000_000);

    // Clears the metric thresholds but is too small once caps are in play.
    source.add_history("MICRO", growth_history(0.20));
    source.add_beta("MICRO", 1.5);
    source.add_market_cap("MICRO", 50_000_000);

    // Not enough history to evaluate at all.
    source.add_history("IPO", growth_history(0.30)[..500].to_vec());
    source.add_beta("IPO", 1.0);

    source
}

fn universe() -> Vec<String> {
    ["WIN1", "WIN2", "HOTBETA", "FLAT", "MICRO", "IPO"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[test]
fn test_scan_store_screen_flow() {
    let source = screened_source();
    let outcome = MetricsPipeline::default().run(&source, &universe());

    assert!(!outcome.cancelled);
    assert_eq!(outcome.records.len(), 5);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].symbol, "IPO");
    assert_eq!(
        outcome.skipped[0].reason,
        SkipReason::InsufficientHistory { closes: 500 }
    );

    // Derived metrics land where the model says they should.
    let win1 = outcome
        .records
        .iter()
        .find(|r| r.ticker == "WIN1")
        .unwrap();
    assert_relative_eq!(win1.avg_return, 0.13, epsilon = 1e-9);
    assert_relative_eq!(win1.expected_return, 0.045 + 1.3 * 0.057, epsilon = 1e-12);
    let expected_risk_adj =
        ((1.0 + win1.expected_return).powi(20) - 1.0 - 1.045f64.powi(20)) / 1.3;
    assert_relative_eq!(win1.risk_adj_20y.unwrap(), expected_risk_adj, epsilon = 1e-9);

    // Persist, reload, rank.
    let file = NamedTempFile::new().unwrap();
    store::write_records(file.path(), &outcome.records).unwrap();
    let reloaded = store::read_records(file.path()).unwrap();
    assert_eq!(reloaded.len(), 5);
    assert!(reloaded.iter().all(|r| r.return_20y.is_none()));
    assert!(reloaded.iter().all(|r| r.risk_adj_20y.is_some()));

    let selection = select_top(&reloaded, 10, &ScreenCriteria::default());
    assert_eq!(selection.matched, 2);
    let order: Vec<&str> = selection.top.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(order, vec!["WIN2", "WIN1"]);

    // Metadata survives the disk round trip.
    assert_eq!(selection.top[0].sector.as_deref(), Some("Healthcare"));
    assert_eq!(selection.top[0].market_cap, Some(2_000_000_000));
}

#[test]
fn test_limit_truncates_ranked_output() {
    let source = screened_source();
    let outcome = MetricsPipeline::default().run(&source, &universe());

    let selection = select_top(&outcome.records, 1, &ScreenCriteria::default());
    assert_eq!(selection.matched, 2);
    assert_eq!(selection.top.len(), 1);
    assert_eq!(selection.top[0].ticker, "WIN2");
}

#[test]
fn test_cancelled_scan_keeps_partial_results() {
    let mut source = StaticDataSource::new();
    let universe: Vec<String> = (0..5).map(|i| format!("T{}", i)).collect();
    for symbol in &universe {
        source.add_history(symbol.clone(), growth_history(0.14));
        source.add_beta(symbol.clone(), 1.4);
    }

    let cancel = CancelToken::new();
    let outcome = MetricsPipeline::default().run_with(&source, &universe, &cancel, |p| {
        if p.completed == 2 {
            cancel.cancel();
        }
    });

    assert!(outcome.cancelled);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[0].ticker, "T0");
    assert_eq!(outcome.records[1].ticker, "T1");

    // A partial result set is still a valid result set.
    let file = NamedTempFile::new().unwrap();
    store::write_records(file.path(), &outcome.records).unwrap();
    let reloaded = store::read_records(file.path()).unwrap();
    let selection = select_top(&reloaded, 10, &ScreenCriteria::default());
    assert_eq!(selection.matched, 2);
}

#[test]
fn test_model_config_flows_through_pipeline() {
    let config = ModelConfig {
        risk_free_rate: 0.03,
        market_return: 0.08,
        horizon_years: 10,
        ..ModelConfig::default()
    };

    let mut source = StaticDataSource::new();
    source.add_history("AAPL", growth_history(0.12));
    source.add_beta("AAPL", 2.0);

    let outcome = MetricsPipeline::new(config).run(&source, &["AAPL".to_string()]);
    let record = &outcome.records[0];

    assert_relative_eq!(record.expected_return, 0.13, epsilon = 1e-12);
    assert_relative_eq!(
        record.return_20y.unwrap(),
        1.13f64.powi(10) - 1.0,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        record.risk_adj_20y.unwrap(),
        (1.13f64.powi(10) - 1.0 - 1.03f64.powi(10)) / 2.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_batch_without_caps_ranks_without_the_gate() {
    let mut source = StaticDataSource::new();
    source.add_history("NOCAP", growth_history(0.15));
    source.add_beta("NOCAP", 1.5);

    let outcome = MetricsPipeline::default().run(&source, &["NOCAP".to_string()]);
    assert_eq!(outcome.records[0].market_cap, None);

    let selection = select_top(&outcome.records, 10, &ScreenCriteria::default());
    assert_eq!(selection.matched, 1);
}
