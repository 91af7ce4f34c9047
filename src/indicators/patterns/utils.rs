use crate::models::{Bias, Candle};

// Pin bar thresholds
pub const PIN_WICK_TO_BODY: f64 = 2.0;
pub const PIN_MAX_BODY_TO_RANGE: f64 = 0.3;
pub const PIN_MAX_OPPOSITE_WICK_TO_RANGE: f64 = 0.2;

// Engulfing body must exceed the previous one by this factor
pub const ENGULFING_BODY_FACTOR: f64 = 1.5;

// Star middle candle body relative to the first candle body
pub const STAR_MAX_MIDDLE_BODY: f64 = 0.3;

// Marubozu body share of the full range
pub const MARUBOZU_MIN_BODY_TO_RANGE: f64 = 0.95;

pub fn body_bias(candle: &Candle) -> Bias {
    if candle.is_bullish() {
        Bias::Bullish
    } else if candle.is_bearish() {
        Bias::Bearish
    } else {
        Bias::Neutral
    }
}

pub fn opposite_colors(current: &Candle, previous: &Candle) -> bool {
    (current.is_bullish() && previous.is_bearish())
        || (current.is_bearish() && previous.is_bullish())
}

pub fn body_to_range_ratio(candle: &Candle) -> Option<f64> {
    let range = candle.range();
    if range <= 0.0 {
        return None;
    }
    Some(candle.body() / range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_bias_and_colors() {
        let up = Candle::new(0, 10.0, 12.0, 9.0, 11.0, 0.0);
        let down = Candle::new(1, 11.0, 12.0, 9.0, 10.0, 0.0);
        let flat = Candle::new(2, 10.0, 10.0, 10.0, 10.0, 0.0);

        assert_eq!(body_bias(&up), Bias::Bullish);
        assert_eq!(body_bias(&down), Bias::Bearish);
        assert_eq!(body_bias(&flat), Bias::Neutral);
        assert!(opposite_colors(&up, &down));
        assert!(!opposite_colors(&up, &flat));
        assert_eq!(body_to_range_ratio(&flat), None);
        assert_eq!(body_to_range_ratio(&up), Some(1.0 / 3.0));
    }
}
