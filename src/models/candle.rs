use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// A single OHLCV bar. `time` is a unix timestamp in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn midpoint(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Validated, column-oriented candle series. The only way to build one is
/// through [`CandleData::from_candles`], so every analyzer can rely on a
/// non-empty, strictly time-ordered series of finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleData {
    pub time: Vec<i64>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl CandleData {
    pub fn from_candles(candles: &[Candle]) -> Result<Self> {
        if candles.is_empty() {
            return Err(AnalysisError::EmptySeries);
        }

        let mut data = Self {
            time: Vec::with_capacity(candles.len()),
            open: Vec::with_capacity(candles.len()),
            high: Vec::with_capacity(candles.len()),
            low: Vec::with_capacity(candles.len()),
            close: Vec::with_capacity(candles.len()),
            volume: Vec::with_capacity(candles.len()),
        };

        for (index, candle) in candles.iter().enumerate() {
            validate_candle(index, candle)?;

            if let Some(&previous) = data.time.last() {
                if candle.time <= previous {
                    return Err(AnalysisError::NonMonotonicTime {
                        index,
                        previous,
                        current: candle.time,
                    });
                }
            }

            data.time.push(candle.time);
            data.open.push(candle.open);
            data.high.push(candle.high);
            data.low.push(candle.low);
            data.close.push(candle.close);
            data.volume.push(candle.volume);
        }

        Ok(data)
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    /// Always false for validated data; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn candle(&self, index: usize) -> Candle {
        Candle {
            time: self.time[index],
            open: self.open[index],
            high: self.high[index],
            low: self.low[index],
            close: self.close[index],
            volume: self.volume[index],
        }
    }

    pub fn candles(&self) -> impl Iterator<Item = Candle> + '_ {
        (0..self.len()).map(move |i| self.candle(i))
    }

    pub fn last_close(&self) -> f64 {
        self.close[self.len() - 1]
    }

    /// The trailing `period` closes, or all of them if the series is shorter.
    pub fn tail_closes(&self, period: usize) -> &[f64] {
        let start = self.len().saturating_sub(period);
        &self.close[start..]
    }

    /// Highest high and lowest low over the trailing `period` candles.
    pub fn tail_extremes(&self, period: usize) -> (f64, f64) {
        let start = self.len().saturating_sub(period);
        let highest = self.high[start..]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let lowest = self.low[start..]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        (highest, lowest)
    }
}

fn validate_candle(index: usize, candle: &Candle) -> Result<()> {
    let fields = [
        ("open", candle.open),
        ("high", candle.high),
        ("low", candle.low),
        ("close", candle.close),
        ("volume", candle.volume),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(AnalysisError::NonFiniteValue { index, field });
        }
    }

    if candle.high < candle.low {
        return Err(AnalysisError::InvertedRange {
            index,
            high: candle.high,
            low: candle.low,
        });
    }

    if candle.volume < 0.0 {
        return Err(AnalysisError::NegativeVolume {
            index,
            volume: candle.volume,
        });
    }

    Ok(())
}
