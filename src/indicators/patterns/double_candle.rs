use crate::indicators::patterns::utils::*;
use crate::indicators::patterns::{CandlePattern, PatternMatch};
use crate::models::{Bias, Candle};

// Check for Engulfing pattern
pub fn check_engulfing(candles: &[Candle], index: usize, patterns: &mut Vec<PatternMatch>) {
    if index < 1 {
        return;
    }

    let current = &candles[index];
    let previous = &candles[index - 1];

    // Body must clearly dominate the previous one and reverse its colour
    if current.body() > previous.body() * ENGULFING_BODY_FACTOR && opposite_colors(current, previous) {
        patterns.push(PatternMatch::new(index, CandlePattern::Engulfing, body_bias(current)));
    }
}

// Check for Inside Bar pattern
pub fn check_inside_bar(candles: &[Candle], index: usize, patterns: &mut Vec<PatternMatch>) {
    if index < 1 {
        return;
    }

    let current = &candles[index];
    let previous = &candles[index - 1];

    if current.high <= previous.high && current.low >= previous.low {
        patterns.push(PatternMatch::new(index, CandlePattern::InsideBar, Bias::Neutral));
    }
}
