use crate::models::CandleData;
use serde::Serialize;

/// Look-back and look-ahead used for pivot confirmation.
pub const PIVOT_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PivotKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PivotPoint {
    pub price: f64,
    pub time: i64,
    #[serde(rename = "type")]
    pub kind: PivotKind,
}

/// Symmetric-window swing detector.
///
/// Candle `i` is a pivot high when its high is >= every high in the `window`
/// candles on either side (ties allowed, so neighbouring equal highs can both
/// qualify). Pivot lows mirror this on lows. Candles closer than `window` to
/// either end of the series are never pivots.
#[derive(Debug, Clone, Copy)]
pub struct PivotDetector {
    window: usize,
}

impl Default for PivotDetector {
    fn default() -> Self {
        Self {
            window: PIVOT_WINDOW,
        }
    }
}

impl PivotDetector {
    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Indices of swing highs and swing lows, each ascending.
    pub fn swing_indices(&self, data: &CandleData) -> (Vec<usize>, Vec<usize>) {
        let w = self.window;
        let mut highs = Vec::new();
        let mut lows = Vec::new();

        if data.len() < 2 * w + 1 {
            return (highs, lows);
        }

        for i in w..data.len() - w {
            let mut neighbours = (i - w..i).chain(i + 1..=i + w);

            if neighbours.clone().all(|j| data.high[j] <= data.high[i]) {
                highs.push(i);
            }
            if neighbours.all(|j| data.low[j] >= data.low[i]) {
                lows.push(i);
            }
        }

        (highs, lows)
    }

    /// Pivots ordered by time; a candle that is both a swing high and a swing
    /// low yields the high first.
    pub fn detect(&self, data: &CandleData) -> Vec<PivotPoint> {
        let (highs, lows) = self.swing_indices(data);
        let mut pivots = Vec::with_capacity(highs.len() + lows.len());

        let (mut h, mut l) = (0, 0);
        while h < highs.len() || l < lows.len() {
            let take_high = match (highs.get(h), lows.get(l)) {
                (Some(&hi), Some(&lo)) => hi <= lo,
                (Some(_), None) => true,
                _ => false,
            };

            if take_high {
                let i = highs[h];
                pivots.push(PivotPoint {
                    price: data.high[i],
                    time: data.time[i],
                    kind: PivotKind::High,
                });
                h += 1;
            } else {
                let i = lows[l];
                pivots.push(PivotPoint {
                    price: data.low[i],
                    time: data.time[i],
                    kind: PivotKind::Low,
                });
                l += 1;
            }
        }

        pivots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;

    fn make_data(closes: &[f64]) -> CandleData {
        let candles: Vec<Candle> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(i as i64, c, c + 0.5, c - 0.5, c, 1.0))
            .collect();
        CandleData::from_candles(&candles).unwrap()
    }

    #[test]
    fn test_single_peak_is_only_pivot_high_in_its_neighbourhood() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 10.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        let data = make_data(&closes);
        let pivots = PivotDetector::default().detect(&data);

        let highs: Vec<&PivotPoint> = pivots.iter().filter(|p| p.kind == PivotKind::High).collect();
        assert_eq!(highs.len(), 1);
        assert_eq!(highs[0].time, 6);
        assert_eq!(highs[0].price, 10.5);
        assert!(pivots.iter().all(|p| p.kind == PivotKind::High || (p.time - 6).abs() > 5));
    }

    #[test]
    fn test_boundary_candles_never_pivot() {
        let closes = [10.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 10.0];
        let data = make_data(&closes);
        let (highs, _) = PivotDetector::default().swing_indices(&data);
        assert!(highs.iter().all(|&i| i >= 5 && i < closes.len() - 5));
        assert!(!highs.contains(&0));
        assert!(!highs.contains(&11));
    }

    #[test]
    fn test_ties_allow_adjacent_pivots() {
        let closes = [1.0, 1.0, 1.0, 1.0, 1.0, 5.0, 5.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let data = make_data(&closes);
        let (highs, _) = PivotDetector::default().swing_indices(&data);
        assert_eq!(highs, vec![5, 6]);
    }

    #[test]
    fn test_short_series_has_no_pivots() {
        let data = make_data(&[1.0, 2.0, 3.0]);
        assert!(PivotDetector::default().detect(&data).is_empty());
    }

    #[test]
    fn test_pivots_sorted_by_time() {
        let closes: Vec<f64> = (0..60).map(|i| (i as f64 * 0.4).sin() * 10.0 + 50.0).collect();
        let data = make_data(&closes);
        let pivots = PivotDetector::default().detect(&data);

        assert!(!pivots.is_empty());
        assert!(pivots.windows(2).all(|w| w[0].time <= w[1].time));
    }
}
