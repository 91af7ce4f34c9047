use crate::indicators::patterns::utils::*;
use crate::indicators::patterns::{CandlePattern, PatternMatch};
use crate::models::{Bias, Candle};

// Check for Marubozu: a candle that is almost all body
pub fn check_marubozu(candles: &[Candle], index: usize, patterns: &mut Vec<PatternMatch>) {
    let candle = &candles[index];

    let ratio = match body_to_range_ratio(candle) {
        Some(ratio) => ratio,
        None => return,
    };

    let bias = body_bias(candle);
    if ratio >= MARUBOZU_MIN_BODY_TO_RANGE && bias != Bias::Neutral {
        patterns.push(PatternMatch::new(index, CandlePattern::Marubozu, bias));
    }
}

/// True when one wick is long (> 2x body), the body is small (< 30% of the
/// range) and the wick opposite the long one is short (< 20% of the range).
pub fn is_pin_bar(candle: &Candle) -> bool {
    let range = candle.range();
    if range <= 0.0 {
        return false;
    }

    let body = candle.body();
    let upper = candle.upper_wick();
    let lower = candle.lower_wick();

    if body >= range * PIN_MAX_BODY_TO_RANGE {
        return false;
    }

    let long_lower = lower > body * PIN_WICK_TO_BODY && upper < range * PIN_MAX_OPPOSITE_WICK_TO_RANGE;
    let long_upper = upper > body * PIN_WICK_TO_BODY && lower < range * PIN_MAX_OPPOSITE_WICK_TO_RANGE;

    long_lower || long_upper
}

pub fn pin_bar_bias(candle: &Candle) -> Bias {
    if candle.lower_wick() > candle.upper_wick() {
        Bias::Bullish
    } else {
        Bias::Bearish
    }
}

// Check for Pin Bar pattern
pub fn check_pin_bar(candles: &[Candle], index: usize, patterns: &mut Vec<PatternMatch>) {
    let candle = &candles[index];

    if is_pin_bar(candle) {
        patterns.push(PatternMatch::new(index, CandlePattern::PinBar, pin_bar_bias(candle)));
    }
}
