use crate::models::{CandleData, FibonacciLevel, LevelType};

/// Candles used for the reference high/low range.
pub const FIBONACCI_LOOKBACK: usize = 100;

pub const RETRACEMENT_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

/// Retracement levels across the high/low range of the trailing
/// [`FIBONACCI_LOOKBACK`] candles, ascending by price. Levels above
/// `reference_price` are resistance, the rest support.
pub fn range_retracements(data: &CandleData, reference_price: f64) -> Vec<FibonacciLevel> {
    let (high, low) = data.tail_extremes(FIBONACCI_LOOKBACK);
    let range = high - low;

    RETRACEMENT_RATIOS
        .iter()
        .map(|&level| {
            let price = low + range * level;
            FibonacciLevel {
                level,
                price,
                level_type: if price > reference_price {
                    LevelType::Resistance
                } else {
                    LevelType::Support
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;

    #[test]
    fn test_levels_span_recent_range() {
        let candles: Vec<Candle> = (0..150)
            .map(|i| {
                let c = 100.0 + i as f64;
                Candle::new(i, c, c + 1.0, c - 1.0, c, 1.0)
            })
            .collect();
        let data = CandleData::from_candles(&candles).unwrap();
        let levels = range_retracements(&data, 200.0);

        assert_eq!(levels.len(), 7);
        // last 100 candles: lows from 149, highs up to 250
        assert_eq!(levels[0].price, 149.0);
        assert_eq!(levels[6].price, 250.0);
        assert!((levels[3].price - 199.5).abs() < 1e-9);
        assert_eq!(levels[3].level_type, LevelType::Support);
        assert_eq!(levels[4].level_type, LevelType::Resistance);
        assert!(levels.windows(2).all(|w| w[0].price <= w[1].price));
    }
}
