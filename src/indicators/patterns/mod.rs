// Module exports
mod double_candle;
mod recognizer;
mod single_candle;
mod triple_candle;
mod utils;

use crate::models::Bias;
use serde::Serialize;
use std::fmt;

// Public exports
pub use recognizer::PatternRecognizer;
pub use single_candle::{is_pin_bar, pin_bar_bias};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandlePattern {
    Marubozu,
    Engulfing,
    PinBar,
    InsideBar,
    MorningStar,
    EveningStar,
}

impl CandlePattern {
    /// Three-candle reversals carry extra weight in strength scoring.
    pub fn is_star(&self) -> bool {
        matches!(self, CandlePattern::MorningStar | CandlePattern::EveningStar)
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandlePattern::Marubozu => write!(f, "MARUBOZU"),
            CandlePattern::Engulfing => write!(f, "ENGULFING"),
            CandlePattern::PinBar => write!(f, "PIN_BAR"),
            CandlePattern::InsideBar => write!(f, "INSIDE_BAR"),
            CandlePattern::MorningStar => write!(f, "MORNING_STAR"),
            CandlePattern::EveningStar => write!(f, "EVENING_STAR"),
        }
    }
}

/// A raw detection: which pattern completed on which candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternMatch {
    pub index: usize,
    pub pattern: CandlePattern,
    pub bias: Bias,
}

impl PatternMatch {
    pub fn new(index: usize, pattern: CandlePattern, bias: Bias) -> Self {
        Self {
            index,
            pattern,
            bias,
        }
    }
}
