// src/cli.rs
use crate::models::Candle;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "market-structure")]
#[command(about = "Market structure analysis for OHLCV candle series", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every analyzer and print the full report
    Analyze {
        /// JSON file holding an array of candles
        #[arg(short, long)]
        input: PathBuf,

        /// Current price (defaults to the last close)
        #[arg(short, long)]
        price: Option<f64>,

        /// Reference time as unix seconds (defaults to now)
        #[arg(long)]
        now: Option<i64>,

        /// Settings file overriding the default weights
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Worker threads (defaults to the number of CPUs)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the indicator snapshot for the last candle
    Indicators {
        /// JSON file holding an array of candles
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List swing pivots
    Pivots {
        /// JSON file holding an array of candles
        #[arg(short, long)]
        input: PathBuf,

        /// Candles on each side a pivot must dominate
        #[arg(short, long, default_value = "5")]
        window: usize,
    },
}

/// Read a JSON array of candles from disk
pub fn load_candles(path: &Path) -> Result<Vec<Candle>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read candle file {}", path.display()))?;
    let candles: Vec<Candle> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse candles from {}", path.display()))?;
    Ok(candles)
}

/// Parse a unix timestamp in seconds, falling back to the current time
pub fn resolve_now(timestamp: Option<i64>) -> Result<DateTime<Utc>> {
    match timestamp {
        Some(ts) => DateTime::<Utc>::from_timestamp(ts, 0)
            .with_context(|| format!("Timestamp {} is out of range", ts)),
        None => Ok(Utc::now()),
    }
}

pub fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
