// Export all necessary modules
pub mod analyzers;
pub mod cli;
pub mod config;
pub mod error;
pub mod indicators;
pub mod models;
pub mod processor;
pub mod utils;

pub use crate::config::EngineSettings;
pub use crate::error::{AnalysisError, Result};
pub use crate::models::{Candle, CandleData, Outcome};
pub use crate::processor::{AnalysisEngine, AnalysisReport};
