//! Institutional footprint scan
//!
//! Reads a JSON array of per-instrument tables, runs the feature pipeline on
//! each and writes the scan result as JSON.
//!
//! Usage:
//!   cargo run --bin footprint-scan -- --input tables.json --config scan.json --month 2024-02

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use footprint_core::{Config, TimeSeriesTable};
use footprint_ingestion::{align_to_calendar, get_trading_days};
use footprint_scanner::MarketScanner;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "footprint-scan")]
#[command(about = "Scan instrument tables for institutional accumulation patterns")]
struct Args {
    /// JSON file holding an array of instrument tables
    #[arg(long)]
    input: PathBuf,

    /// JSON configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON file (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Align every table to the trading days of this month (YYYY-MM)
    #[arg(long)]
    month: Option<String>,

    /// Number of instruments in the top-composite list
    #[arg(long, default_value = "10")]
    top: usize,

    /// Worker threads (overrides the config; 0 = auto)
    #[arg(long)]
    workers: Option<usize>,
}

/// Parse `YYYY-MM`.
fn parse_month(s: &str) -> Result<(i32, u32)> {
    let (year, month) = s
        .split_once('-')
        .ok_or_else(|| anyhow!("expected YYYY-MM, got {:?}", s))?;
    Ok((
        year.parse().with_context(|| format!("bad year in {:?}", s))?,
        month.parse().with_context(|| format!("bad month in {:?}", s))?,
    ))
}

/// Load the input array, skipping entries that are not valid tables.
fn load_tables(path: &PathBuf) -> Result<Vec<TimeSeriesTable>> {
    let file = File::open(path).with_context(|| format!("opening {:?}", path))?;
    let entries: Vec<serde_json::Value> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {:?}", path))?;

    let mut tables = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<TimeSeriesTable>(entry) {
            Ok(table) => tables.push(table),
            Err(e) => warn!(index, error = %e, "skipping invalid table"),
        }
    }
    Ok(tables)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(
            tracing::level_filters::LevelFilter::INFO.into(),
        ))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_path(path).with_context(|| format!("loading {:?}", path))?,
        None => Config::default(),
    };
    if let Some(workers) = args.workers {
        config.scan.workers = workers;
    }

    let mut tables = load_tables(&args.input)?;
    info!(tables = tables.len(), input = ?args.input, "loaded instrument tables");

    if let Some(month) = &args.month {
        let (year, month) = parse_month(month)?;
        let days = get_trading_days(year, month)?;
        tables = tables
            .into_iter()
            .map(|table| match align_to_calendar(&table, &days) {
                Ok(aligned) => aligned,
                Err(e) => {
                    warn!(instrument = table.instrument(), error = %e, "calendar alignment skipped");
                    table
                }
            })
            .collect();
    }

    let scanner = MarketScanner::new(&config)?.with_top_n(args.top);
    let result = scanner.scan(&tables)?;
    let json = result.to_json()?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {:?}", path))?;
            info!(output = ?path, "scan result written");
        }
        None => println!("{}", json),
    }

    Ok(())
}
