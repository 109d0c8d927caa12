//! riskrank CLI - Command-line screener for risk-adjusted returns
//!
//! Provides commands for scanning a ticker universe and ranking the
//! resulting records.
//!
//! ## Example Usage
//!
//! ```bash
//! # Screen a universe from a local data directory
//! riskrank scan tickers.txt --data-dir ./data --output asset_results.csv
//!
//! # Estimate missing betas against a benchmark
//! riskrank scan tickers.txt --benchmark SPY
//!
//! # Rank a previously written result set
//! riskrank top asset_results.csv --limit 10
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use riskrank::config::ModelConfig;
use riskrank::pipeline::{BatchOutcome, CancelToken, MetricsPipeline};
use riskrank::record::AssetRecord;
use riskrank::screen::{select_top, ScreenCriteria};
use riskrank::source::{CsvDirSource, MarketDataSource};
use riskrank::store;
use riskrank::universe::load_universe;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// riskrank: risk-adjusted return screener
#[derive(Parser)]
#[command(name = "riskrank")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Risk-adjusted return screener for equity tickers", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a ticker universe and write a result set
    Scan {
        /// Newline-delimited ticker file
        #[arg(value_name = "UNIVERSE")]
        universe: PathBuf,

        /// Directory of per-symbol CSV price files
        #[arg(short = 'd', long, default_value = "data")]
        data_dir: PathBuf,

        /// Output CSV for the result set
        #[arg(short = 'o', long, default_value = "asset_results.csv")]
        output: PathBuf,

        /// Benchmark symbol for estimating missing betas
        #[arg(short = 'b', long)]
        benchmark: Option<String>,

        /// Fetch data from the quote API instead of the local directory
        #[arg(long)]
        remote: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Rank a previously written result set
    Top {
        /// Result set CSV written by scan
        #[arg(value_name = "RESULTS")]
        results: PathBuf,

        /// How many assets to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        /// Write the ranked selection as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the ranked selection as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Config {
    #[serde(default)]
    model: ModelConfig,
    #[serde(default)]
    screen: ScreenCriteria,
}

impl Config {
    fn load(path: Option<&Path>) -> Self {
        if let Some(config_path) = path {
            if config_path.exists() {
                match fs::read_to_string(config_path) {
                    Ok(contents) => match toml::from_str(&contents) {
                        Ok(config) => return config,
                        Err(e) => {
                            eprintln!("{} Failed to parse config: {}", "Warning:".yellow(), e);
                        }
                    },
                    Err(e) => {
                        eprintln!("{} Failed to read config: {}", "Warning:".yellow(), e);
                    }
                }
            }
        } else if let Some(home) = dirs::home_dir() {
            let default_config = home.join(".riskrank").join("config.toml");
            if default_config.exists() {
                if let Ok(contents) = fs::read_to_string(&default_config) {
                    if let Ok(config) = toml::from_str(&contents) {
                        return config;
                    }
                }
            }
        }

        Config::default()
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref());

    if cli.verbose {
        println!(
            "{} v{}",
            "riskrank".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
    }

    let result = match cli.command {
        Commands::Scan {
            universe,
            data_dir,
            output,
            benchmark,
            remote,
            no_progress,
        } => run_scan(ScanArgs {
            universe,
            data_dir,
            output,
            benchmark,
            remote,
            no_progress,
            verbose: cli.verbose,
            config,
        }),

        Commands::Top {
            results,
            limit,
            json,
            csv,
        } => run_top(TopArgs {
            results,
            limit,
            json,
            csv,
            config,
        }),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

struct ScanArgs {
    universe: PathBuf,
    data_dir: PathBuf,
    output: PathBuf,
    benchmark: Option<String>,
    remote: bool,
    no_progress: bool,
    verbose: bool,
    config: Config,
}

struct TopArgs {
    results: PathBuf,
    limit: usize,
    json: Option<PathBuf>,
    csv: Option<PathBuf>,
    config: Config,
}

fn run_scan(args: ScanArgs) -> anyhow::Result<()> {
    let universe = load_universe(&args.universe)
        .with_context(|| format!("cannot load universe {}", args.universe.display()))?;
    if universe.is_empty() {
        bail!("universe {} has no tickers", args.universe.display());
    }

    println!(
        "{}",
        format!("Screening {} tickers...", universe.len())
            .cyan()
            .bold()
    );
    if args.verbose {
        println!("  {} {}", "Universe:".bold(), args.universe.display());
        println!("  {} {}", "Output:".bold(), args.output.display());
        println!(
            "  {} {:.1}% risk-free, {:.1}% market",
            "Model:".bold(),
            args.config.model.risk_free_rate * 100.0,
            args.config.model.market_return * 100.0
        );
    }
    println!();

    let source = build_source(&args)?;
    let pipeline = MetricsPipeline::new(args.config.model);

    let outcome = if args.no_progress {
        pipeline.run(source.as_ref(), &universe)
    } else {
        let pb = ProgressBar::new(universe.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )?
                .progress_chars("#>-"),
        );

        let outcome = pipeline.run_with(source.as_ref(), &universe, &CancelToken::new(), |p| {
            pb.set_position(p.completed as u64);
        });
        pb.finish_and_clear();
        outcome
    };

    report_scan(&outcome, args.verbose);

    store::write_records(&args.output, &outcome.records)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!(
        "{} Results saved to: {}",
        "✓".green().bold(),
        args.output.display()
    );

    Ok(())
}

fn build_source(args: &ScanArgs) -> anyhow::Result<Box<dyn MarketDataSource>> {
    if args.remote {
        #[cfg(feature = "http")]
        {
            let source = riskrank::source::HttpSource::new()?;
            return Ok(Box::new(source));
        }

        #[cfg(not(feature = "http"))]
        bail!("this build has no HTTP support; rebuild with --features http");
    }

    let mut source = CsvDirSource::open(&args.data_dir)
        .with_context(|| format!("cannot open data directory {}", args.data_dir.display()))?;
    if let Some(benchmark) = &args.benchmark {
        source = source
            .with_benchmark(benchmark.clone())
            .with_context(|| format!("cannot load benchmark {}", benchmark))?;
    }

    Ok(Box::new(source))
}

fn report_scan(outcome: &BatchOutcome, verbose: bool) {
    if outcome.cancelled {
        println!("{}", "Scan cancelled before completion.".yellow());
    }

    println!(
        "  {} {}   {} {}",
        "Records:".bold(),
        outcome.records.len().to_string().bright_green(),
        "Skipped:".bold(),
        outcome.skipped.len()
    );

    if verbose && !outcome.skipped.is_empty() {
        println!();
        println!("{}", "Skipped tickers".yellow().bold());
        for skip in &outcome.skipped {
            println!("  {:<8} {}", skip.symbol, skip.reason);
        }
    }
    println!();
}

fn run_top(args: TopArgs) -> anyhow::Result<()> {
    let records = store::read_records(&args.results)
        .with_context(|| format!("cannot read {}", args.results.display()))?;

    let selection = select_top(&records, args.limit, &args.config.screen);

    println!(
        "{}",
        format!("{} assets met the criteria", selection.matched)
            .green()
            .bold()
    );
    println!();

    if selection.top.is_empty() {
        println!("{}", "  Nothing cleared the screen.".dimmed());
        println!();
    } else {
        print_table(&selection.top);
    }

    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&selection.top)?;
        fs::write(path, json)
            .with_context(|| format!("cannot write {}", path.display()))?;
        println!(
            "{} Selection saved to: {}",
            "✓".green().bold(),
            path.display()
        );
    }

    if let Some(path) = &args.csv {
        store::write_records(path, &selection.top)
            .with_context(|| format!("cannot write {}", path.display()))?;
        println!(
            "{} Selection saved to: {}",
            "✓".green().bold(),
            path.display()
        );
    }

    Ok(())
}

fn print_table(records: &[AssetRecord]) {
    println!(
        "  {} {} {} {} {} {}  {}",
        format!("{:<8}", "Ticker").bold(),
        format!("{:>11}", "Avg Return").bold(),
        format!("{:>11}", "Expected").bold(),
        format!("{:>6}", "Beta").bold(),
        format!("{:>13}", "20y Risk adj").bold(),
        format!("{:>10}", "Mkt Cap").bold(),
        "Sector".bold()
    );

    for record in records {
        let risk_adj = record
            .risk_adj_20y
            .map(|v| format!("{:.3}", v))
            .unwrap_or_else(|| "-".to_string());
        let cap = record
            .market_cap
            .map(format_market_cap)
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {} {:>11} {:>11} {:>6.2} {:>13} {:>10}  {}",
            format!("{:<8}", record.ticker).bright_green().bold(),
            format_percent(record.avg_return),
            format_percent(record.expected_return),
            record.beta,
            risk_adj,
            cap,
            record.sector.as_deref().unwrap_or("-").dimmed()
        );
    }
    println!();
}

fn format_percent(value: f64) -> String {
    format!("{:+.2}%", value * 100.0)
}

fn format_market_cap(cap: u64) -> String {
    let cap = cap as f64;
    if cap >= 1e12 {
        format!("{:.2}T", cap / 1e12)
    } else if cap >= 1e9 {
        format!("{:.2}B", cap / 1e9)
    } else if cap >= 1e6 {
        format!("{:.1}M", cap / 1e6)
    } else {
        format!("{:.0}", cap)
    }
}
