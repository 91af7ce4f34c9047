// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use market_structure_engine::analyzers::PivotDetector;
use market_structure_engine::cli::{load_candles, print_json, resolve_now, Cli, Commands};
use market_structure_engine::indicators::IndicatorBank;
use market_structure_engine::{AnalysisEngine, CandleData, EngineSettings};
use tracing::info;

fn main() -> Result<()> {
    // Initialize environment
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Execute command
    match cli.command {
        Commands::Analyze { input, price, now, config, threads, pretty } => {
            let candles = load_candles(&input)?;
            let settings = EngineSettings::load(config.as_deref())
                .context("Failed to load engine settings")?;
            let now = resolve_now(now)?;
            let price = match price {
                Some(p) => p,
                None => candles.last().map(|c| c.close).context("Candle file is empty")?,
            };

            let threads = threads.unwrap_or_else(num_cpus::get).max(1);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context("Failed to build worker pool")?;
            info!("Running analysis on {} candles with {} threads", candles.len(), threads);

            let engine = AnalysisEngine::new(settings);
            let report = pool.install(|| engine.run(&candles, price, now))?;
            print_json(&report, pretty)?;
        },
        Commands::Indicators { input } => {
            let candles = load_candles(&input)?;
            let data = CandleData::from_candles(&candles)?;
            print_json(&IndicatorBank::new(&data).analyze(), true)?;
        },
        Commands::Pivots { input, window } => {
            let candles = load_candles(&input)?;
            let data = CandleData::from_candles(&candles)?;
            let pivots = PivotDetector::with_window(window).detect(&data);
            info!("Found {} pivots with window {}", pivots.len(), window);
            print_json(&pivots, true)?;
        },
    }

    Ok(())
}
