// Streaming indicator primitives used by the indicator bank

/// The `Next` trait is used for indicators that consume one value at a time
pub trait Next<T> {
    type Output;
    fn next(&mut self, input: T) -> Self::Output;
}

/// Exponential Moving Average seeded with the very first input.
///
/// Unlike the SMA-seeded variant, the first value becomes the initial EMA and
/// the recurrence `ema = (price - ema) * alpha + ema` runs over every input.
pub struct ExponentialMovingAverage {
    alpha: f64,
    value: Option<f64>,
}

impl ExponentialMovingAverage {
    pub fn new(period: usize) -> anyhow::Result<Self> {
        if period == 0 {
            return Err(anyhow::anyhow!("Period must be greater than 0"));
        }

        Ok(Self {
            alpha: 2.0 / (period as f64 + 1.0),
            value: None,
        })
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl Next<f64> for ExponentialMovingAverage {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        let ema = match self.value {
            None => input,
            Some(prev) => (input - prev) * self.alpha + prev,
        };
        self.value = Some(ema);
        ema
    }
}

/// Relative Strength Index with Wilder smoothing.
///
/// Emits NaN until `period` deltas (period + 1 inputs) have been seen.
pub struct RelativeStrengthIndex {
    period: usize,
    prev_value: Option<f64>,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: Option<f64>,
    avg_loss: Option<f64>,
    index: usize,
}

impl RelativeStrengthIndex {
    pub fn new(period: usize) -> anyhow::Result<Self> {
        if period == 0 {
            return Err(anyhow::anyhow!("Period must be greater than 0"));
        }

        Ok(Self {
            period,
            prev_value: None,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: None,
            avg_loss: None,
            index: 0,
        })
    }
}

impl Next<f64> for RelativeStrengthIndex {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        if let Some(prev) = self.prev_value {
            let change = input - prev;
            let (gain, loss) = if change >= 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            };

            match (self.avg_gain, self.avg_loss) {
                (Some(avg_gain), Some(avg_loss)) => {
                    let period = self.period as f64;
                    self.avg_gain = Some((avg_gain * (period - 1.0) + gain) / period);
                    self.avg_loss = Some((avg_loss * (period - 1.0) + loss) / period);
                }
                _ => {
                    // Initial period - collecting deltas
                    self.gain_sum += gain;
                    self.loss_sum += loss;

                    if self.index == self.period - 1 {
                        self.avg_gain = Some(self.gain_sum / self.period as f64);
                        self.avg_loss = Some(self.loss_sum / self.period as f64);
                    }
                }
            }

            self.index += 1;
        }

        self.prev_value = Some(input);

        match (self.avg_gain, self.avg_loss) {
            // No losses at all: RS is undefined, report maximal overbought
            (Some(_), Some(avg_loss)) if avg_loss == 0.0 => 100.0,
            (Some(avg_gain), Some(avg_loss)) => {
                let rs = avg_gain / avg_loss;
                100.0 - (100.0 / (1.0 + rs))
            }
            _ => f64::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seeded_with_first_value() {
        let mut ema = ExponentialMovingAverage::new(3).unwrap();
        assert_eq!(ema.next(10.0), 10.0);
        // alpha = 0.5
        assert_eq!(ema.next(20.0), 15.0);
        assert_eq!(ema.next(15.0), 15.0);
        assert_eq!(ema.value(), Some(15.0));
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(ExponentialMovingAverage::new(0).is_err());
        assert!(RelativeStrengthIndex::new(0).is_err());
    }

    #[test]
    fn test_rsi_warmup_and_wilder_smoothing() {
        let mut rsi = RelativeStrengthIndex::new(2).unwrap();
        assert!(rsi.next(10.0).is_nan());
        assert!(rsi.next(11.0).is_nan());
        // deltas +1, -1 -> avg gain 0.5, avg loss 0.5
        assert!((rsi.next(10.0) - 50.0).abs() < 1e-9);
        // +2 -> gain (0.5 + 2) / 2 = 1.25, loss 0.25 -> RS 5
        let value = rsi.next(12.0);
        assert!((value - (100.0 - 100.0 / 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let mut rsi = RelativeStrengthIndex::new(3).unwrap();
        let mut last = f64::NAN;
        for price in [1.0, 2.0, 3.0, 4.0, 5.0] {
            last = rsi.next(price);
        }
        assert_eq!(last, 100.0);
    }
}
