// src/error.rs
use thiserror::Error;

/// Structural input errors. Everything numeric that goes wrong inside an
/// analyzer is reported as a degraded outcome instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("candle series is empty")]
    EmptySeries,

    #[error("candle {index} has time {current} which is not after the previous time {previous}")]
    NonMonotonicTime {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("candle {index} has a non-finite {field}")]
    NonFiniteValue { index: usize, field: &'static str },

    #[error("candle {index} has high {high} below low {low}")]
    InvertedRange { index: usize, high: f64, low: f64 },

    #[error("candle {index} has negative volume {volume}")]
    NegativeVolume { index: usize, volume: f64 },

    #[error("current price must be finite and positive, got {0}")]
    InvalidPrice(f64),

    #[error("invalid engine settings: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
