use crate::indicators::ta::{ExponentialMovingAverage, Next, RelativeStrengthIndex};
use crate::models::{CandleData, Outcome};
use crate::utils::math::{mean, std_dev};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_MA_PERIOD: usize = 20;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const MACD_FAST_PERIOD: usize = 12;
pub const MACD_SLOW_PERIOD: usize = 26;
pub const MACD_SIGNAL_PERIOD: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEV: f64 = 2.0;
pub const STOCHASTIC_PERIOD: usize = 14;
pub const STOCHASTIC_D_PERIOD: usize = 3;

/// RSI reported when there are not enough candles for a single reading.
pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovingAverages {
    pub sma: f64,
    pub ema: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdOutput {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochasticOutput {
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(rename = "D")]
    pub d: f64,
}

/// Latest value of every classic indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub moving_averages: MovingAverages,
    pub rsi: f64,
    pub macd: MacdOutput,
    pub bollinger_bands: BollingerBands,
    pub stochastic: StochasticOutput,
}

/// Classic indicators evaluated on the most recent candle of a series.
///
/// Every function tolerates series shorter than its period and falls back to
/// the available window (or a neutral value for RSI).
pub struct IndicatorBank<'a> {
    data: &'a CandleData,
}

impl<'a> IndicatorBank<'a> {
    pub fn new(data: &'a CandleData) -> Self {
        Self { data }
    }

    /// Mean of the last `period` closes.
    pub fn sma(&self, period: usize) -> f64 {
        mean(self.data.tail_closes(period.max(1)))
    }

    /// EMA seeded with the first close and run across the whole series.
    pub fn ema(&self, period: usize) -> f64 {
        let mut ema = match ExponentialMovingAverage::new(period.max(1)) {
            Ok(ema) => ema,
            Err(_) => return self.data.last_close(),
        };
        let mut value = self.data.close[0];
        for &price in &self.data.close {
            value = ema.next(price);
        }
        value
    }

    /// Wilder RSI over the whole series; 50 when fewer than `period + 1`
    /// candles are available, 100 when there were no losses.
    pub fn rsi(&self, period: usize) -> f64 {
        if period == 0 || self.data.len() < period + 1 {
            return NEUTRAL_RSI;
        }

        let mut rsi = match RelativeStrengthIndex::new(period) {
            Ok(rsi) => rsi,
            Err(_) => return NEUTRAL_RSI,
        };
        let mut value = NEUTRAL_RSI;
        for &price in &self.data.close {
            value = rsi.next(price);
        }

        if value.is_nan() {
            NEUTRAL_RSI
        } else {
            value
        }
    }

    /// MACD line from EMA(12) - EMA(26). The signal line blends the MACD value
    /// with the 9-period EMA of price rather than smoothing the MACD series.
    pub fn macd(&self) -> MacdOutput {
        let macd = self.ema(MACD_FAST_PERIOD) - self.ema(MACD_SLOW_PERIOD);
        let signal = macd * 0.2 + self.ema(MACD_SIGNAL_PERIOD) * 0.8;

        MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
        }
    }

    pub fn bollinger_bands(&self, period: usize) -> BollingerBands {
        let window = self.data.tail_closes(period.max(1));
        let middle = mean(window);
        let deviation = std_dev(window);

        BollingerBands {
            upper: middle + deviation * BOLLINGER_STD_DEV,
            middle,
            lower: middle - deviation * BOLLINGER_STD_DEV,
        }
    }

    /// %K over the trailing window; %D is the 3-period SMA of closes.
    pub fn stochastic(&self, period: usize) -> StochasticOutput {
        let (highest_high, lowest_low) = self.data.tail_extremes(period.max(1));
        let range = highest_high - lowest_low;

        let k = if range > 0.0 {
            (self.data.last_close() - lowest_low) / range * 100.0
        } else {
            50.0
        };

        StochasticOutput {
            k,
            d: self.sma(STOCHASTIC_D_PERIOD),
        }
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            moving_averages: MovingAverages {
                sma: self.sma(DEFAULT_MA_PERIOD),
                ema: self.ema(DEFAULT_MA_PERIOD),
            },
            rsi: self.rsi(DEFAULT_RSI_PERIOD),
            macd: self.macd(),
            bollinger_bands: self.bollinger_bands(BOLLINGER_PERIOD),
            stochastic: self.stochastic(STOCHASTIC_PERIOD),
        }
    }

    /// Snapshot of all indicators, degraded when the series is shorter than
    /// the longest period in use.
    pub fn analyze(&self) -> Outcome<IndicatorSnapshot> {
        let snapshot = self.snapshot();
        let required = MACD_SLOW_PERIOD;

        if self.data.len() < required {
            debug!(
                "Indicator bank running on {} candles, {} required for full accuracy",
                self.data.len(),
                required
            );
            return Outcome::degraded(
                snapshot,
                format!(
                    "Only {} candles available, {} needed for every indicator period",
                    self.data.len(),
                    required
                ),
            );
        }

        Outcome::Ok(snapshot)
    }
}
