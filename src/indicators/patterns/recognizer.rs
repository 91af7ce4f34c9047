use crate::indicators::patterns::{double_candle, single_candle, triple_candle, PatternMatch};
use crate::models::Candle;
use tracing::debug;

pub struct PatternRecognizer;

impl PatternRecognizer {
    /// Scan every candle of the slice for known patterns.
    ///
    /// Detections come back in candle order; within one candle, single-candle
    /// shapes precede the multi-candle ones so the most specific pattern is
    /// last.
    pub fn scan(candles: &[Candle]) -> Vec<PatternMatch> {
        let mut patterns = Vec::new();

        for i in 0..candles.len() {
            // Single candle patterns. Marubozu sits outside the four classic
            // price action shapes; without it a steady full-body trend
            // yields no pattern and so never a BUY or SELL signal.
            single_candle::check_marubozu(candles, i, &mut patterns);

            // Double candle patterns
            double_candle::check_engulfing(candles, i, &mut patterns);

            single_candle::check_pin_bar(candles, i, &mut patterns);
            double_candle::check_inside_bar(candles, i, &mut patterns);

            // Triple candle patterns
            triple_candle::check_morning_star(candles, i, &mut patterns);
            triple_candle::check_evening_star(candles, i, &mut patterns);
        }

        debug!("Recognized {} candle patterns over {} candles", patterns.len(), candles.len());
        patterns
    }
}
