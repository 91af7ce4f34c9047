use crate::indicators::patterns::utils::*;
use crate::indicators::patterns::{CandlePattern, PatternMatch};
use crate::models::{Bias, Candle};

// Check for Morning Star pattern
pub fn check_morning_star(candles: &[Candle], index: usize, patterns: &mut Vec<PatternMatch>) {
    if index < 2 {
        return;
    }

    let first = &candles[index - 2];
    let second = &candles[index - 1];
    let third = &candles[index];

    // Morning Star criteria:
    // 1. First candle is bearish
    // 2. Second candle is a small-bodied star
    // 3. Third candle is bullish
    let star_is_small = second.body() < first.body() * STAR_MAX_MIDDLE_BODY;

    if first.is_bearish() && star_is_small && third.is_bullish() {
        patterns.push(PatternMatch::new(index, CandlePattern::MorningStar, Bias::Bullish));
    }
}

// Check for Evening Star pattern
pub fn check_evening_star(candles: &[Candle], index: usize, patterns: &mut Vec<PatternMatch>) {
    if index < 2 {
        return;
    }

    let first = &candles[index - 2];
    let second = &candles[index - 1];
    let third = &candles[index];

    let star_is_small = second.body() < first.body() * STAR_MAX_MIDDLE_BODY;

    if first.is_bullish() && star_is_small && third.is_bearish() {
        patterns.push(PatternMatch::new(index, CandlePattern::EveningStar, Bias::Bearish));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morning_star() {
        let candles = [
            Candle::new(0, 110.0, 111.0, 99.0, 100.0, 0.0),
            Candle::new(1, 99.0, 100.0, 97.0, 99.5, 0.0),
            Candle::new(2, 100.0, 108.0, 99.5, 107.0, 0.0),
        ];
        let mut patterns = Vec::new();
        check_morning_star(&candles, 2, &mut patterns);
        check_evening_star(&candles, 2, &mut patterns);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern, CandlePattern::MorningStar);
        assert_eq!(patterns[0].bias, Bias::Bullish);
    }

    #[test]
    fn test_evening_star() {
        let candles = [
            Candle::new(0, 100.0, 111.0, 99.0, 110.0, 0.0),
            Candle::new(1, 110.5, 112.0, 109.0, 111.0, 0.0),
            Candle::new(2, 110.0, 110.5, 102.0, 103.0, 0.0),
        ];
        let mut patterns = Vec::new();
        check_morning_star(&candles, 2, &mut patterns);
        check_evening_star(&candles, 2, &mut patterns);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern, CandlePattern::EveningStar);
    }

    #[test]
    fn test_large_middle_body_is_not_a_star() {
        let candles = [
            Candle::new(0, 110.0, 111.0, 99.0, 100.0, 0.0),
            Candle::new(1, 100.0, 100.5, 94.0, 95.0, 0.0),
            Candle::new(2, 95.0, 104.0, 94.5, 103.0, 0.0),
        ];
        let mut patterns = Vec::new();
        check_morning_star(&candles, 2, &mut patterns);
        assert!(patterns.is_empty());
    }
}
