use crate::analyzers::elliott::ElliottResult;
use crate::analyzers::gann::GannResult;
use crate::analyzers::price_action::{Action, PriceActionResult, Trend};
use crate::indicators::IndicatorSnapshot;
use crate::models::{Bias, Direction};
use crate::utils::math::unit;
use serde::Serialize;
use tracing::debug;

/// Weights for Elliott confidence, price action confidence, Gann confidence,
/// Gann angle strength, inverse volatility, momentum/trend agreement and
/// key-level proximity, in that order.
pub const DEFAULT_WEIGHTS: [f64; 7] = [0.25, 0.20, 0.20, 0.15, 0.10, 0.05, 0.05];

const AGREEMENT_SCORE: f64 = 0.8;
const DISAGREEMENT_SCORE: f64 = 0.2;
const NEAR_LEVEL_SCORE: f64 = 0.7;
const FAR_LEVEL_SCORE: f64 = 0.3;
const NEAR_LEVEL_DISTANCE: f64 = 0.01;

// Sentiment vote thresholds
const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const STOCHASTIC_OVERSOLD: f64 = 20.0;
const STOCHASTIC_OVERBOUGHT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceScore {
    pub score: u8,
    pub factors: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoteDistribution {
    pub bullish: f64,
    pub bearish: f64,
    pub neutral: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub sentiment: Bias,
    pub strength: f64,
    pub distribution: VoteDistribution,
}

/// Everything the aggregator reads, borrowed from the analyzer results.
pub struct AnalysisInputs<'a> {
    pub current_price: f64,
    pub indicators: &'a IndicatorSnapshot,
    pub elliott: &'a ElliottResult,
    pub gann: &'a GannResult,
    pub price_action: &'a PriceActionResult,
}

#[derive(Debug, Clone)]
pub struct ConfidenceAggregator {
    weights: Vec<f64>,
}

impl Default for ConfidenceAggregator {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.to_vec(),
        }
    }
}

impl ConfidenceAggregator {
    pub fn new(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Individual signals, each in [0, 1], in weight order.
    pub fn factors(inputs: &AnalysisInputs) -> Vec<f64> {
        let gann = inputs.gann;
        let price_action = inputs.price_action;

        let momentum = gann.predictions.market_position.momentum;
        let agreement = match price_action.trend.direction {
            Trend::Up if momentum > 0.0 => AGREEMENT_SCORE,
            Trend::Down if momentum < 0.0 => AGREEMENT_SCORE,
            _ => DISAGREEMENT_SCORE,
        };

        let price = inputs.current_price;
        let near_level = price > 0.0
            && price_action
                .trend
                .key_levels
                .iter()
                .any(|level| (price - level).abs() / price <= NEAR_LEVEL_DISTANCE);

        vec![
            inputs.elliott.current_wave.as_ref().map_or(0.0, |w| w.confidence),
            price_action.signals.primary.confidence,
            gann.predictions.price.confidence,
            gann.angles.strength,
            1.0 - gann.predictions.market_position.volatility,
            agreement,
            if near_level { NEAR_LEVEL_SCORE } else { FAR_LEVEL_SCORE },
        ]
        .into_iter()
        .map(unit)
        .collect()
    }

    pub fn score(&self, inputs: &AnalysisInputs) -> ConfidenceScore {
        let factors = Self::factors(inputs);
        let weighted: f64 = factors
            .iter()
            .zip(self.weights.iter())
            .map(|(f, w)| f * w)
            .sum();
        let score = (weighted * 100.0).round().clamp(0.0, 100.0) as u8;

        debug!("Confidence factors {:?} -> score {}", factors, score);

        ConfidenceScore { score, factors }
    }
}

/// Majority vote over the oscillators, the Elliott projection and the price
/// action signal.
pub fn sentiment(inputs: &AnalysisInputs) -> SentimentSummary {
    let mut votes: Vec<Bias> = Vec::with_capacity(5);
    let indicators = inputs.indicators;

    votes.push(if indicators.rsi < RSI_OVERSOLD {
        Bias::Bullish
    } else if indicators.rsi > RSI_OVERBOUGHT {
        Bias::Bearish
    } else {
        Bias::Neutral
    });

    votes.push(if indicators.macd.histogram > 0.0 {
        Bias::Bullish
    } else {
        Bias::Bearish
    });

    let k = indicators.stochastic.k;
    votes.push(if k < STOCHASTIC_OVERSOLD {
        Bias::Bullish
    } else if k > STOCHASTIC_OVERBOUGHT {
        Bias::Bearish
    } else {
        Bias::Neutral
    });

    if let Some(next_move) = &inputs.elliott.next_move {
        votes.push(match next_move.direction {
            Direction::Up => Bias::Bullish,
            Direction::Down => Bias::Bearish,
            Direction::Neutral => Bias::Neutral,
        });
    }

    votes.push(match inputs.price_action.signals.primary.action {
        Action::Buy => Bias::Bullish,
        Action::Sell => Bias::Bearish,
        Action::Hold => Bias::Neutral,
    });

    let total = votes.len() as f64;
    let share = |bias: Bias| votes.iter().filter(|&&v| v == bias).count() as f64 / total * 100.0;
    let bullish = share(Bias::Bullish);
    let bearish = share(Bias::Bearish);

    SentimentSummary {
        sentiment: if bullish > bearish {
            Bias::Bullish
        } else if bearish > bullish {
            Bias::Bearish
        } else {
            Bias::Neutral
        },
        strength: (bullish - bearish).abs() / 100.0,
        distribution: VoteDistribution {
            bullish,
            bearish,
            neutral: 100.0 - bullish - bearish,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::elliott::{CurrentWave, WaveDegree, WaveKind, WavePhase, WaveProjection};
    use crate::indicators::bank::{BollingerBands, MacdOutput, MovingAverages, StochasticOutput};
    use chrono::{TimeZone, Utc};

    fn snapshot(rsi: f64, histogram: f64, k: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            moving_averages: MovingAverages { sma: 100.0, ema: 100.0 },
            rsi,
            macd: MacdOutput {
                macd: 0.0,
                signal: 0.0,
                histogram,
            },
            bollinger_bands: BollingerBands {
                upper: 101.0,
                middle: 100.0,
                lower: 99.0,
            },
            stochastic: StochasticOutput { k, d: 100.0 },
        }
    }

    fn elliott(confidence: f64, direction: Direction) -> ElliottResult {
        let mut result = ElliottResult::empty();
        result.current_wave = Some(CurrentWave {
            number: 3,
            kind: WaveKind::Impulse,
            degree: WaveDegree::Minor,
            phase: WavePhase::Middle,
            confidence,
        });
        result.next_move = Some(WaveProjection {
            direction,
            target: 120.0,
        });
        result
    }

    fn gann() -> GannResult {
        let mut result = GannResult::neutral(100.0, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        result.predictions.price.confidence = 0.6;
        result.angles.strength = 0.5;
        result.predictions.market_position.volatility = 0.02;
        result.predictions.market_position.momentum = 0.1;
        result
    }

    fn price_action(trend: Trend, action: Action, confidence: f64, levels: Vec<f64>) -> PriceActionResult {
        let mut result = PriceActionResult::empty();
        result.trend.direction = trend;
        result.trend.key_levels.supports = levels;
        result.signals.primary.action = action;
        result.signals.primary.confidence = confidence;
        result
    }

    #[test]
    fn test_factors_and_weighted_score() {
        let indicators = snapshot(50.0, 1.0, 50.0);
        let elliott = elliott(0.6, Direction::Up);
        let gann = gann();
        let pa = price_action(Trend::Up, Action::Buy, 0.96, vec![99.5]);
        let inputs = AnalysisInputs {
            current_price: 100.0,
            indicators: &indicators,
            elliott: &elliott,
            gann: &gann,
            price_action: &pa,
        };

        let factors = ConfidenceAggregator::factors(&inputs);
        assert_eq!(factors.len(), 7);
        assert_eq!(factors[5], 0.8);
        assert_eq!(factors[6], 0.7);

        // .15 + .192 + .12 + .075 + .098 + .04 + .035 = .71
        let score = ConfidenceAggregator::default().score(&inputs);
        assert_eq!(score.score, 71);
    }

    #[test]
    fn test_disagreement_and_distant_levels() {
        let indicators = snapshot(50.0, 1.0, 50.0);
        let elliott = ElliottResult::empty();
        let gann = gann();
        let pa = price_action(Trend::Down, Action::Hold, 0.0, vec![80.0]);
        let inputs = AnalysisInputs {
            current_price: 100.0,
            indicators: &indicators,
            elliott: &elliott,
            gann: &gann,
            price_action: &pa,
        };

        let factors = ConfidenceAggregator::factors(&inputs);
        assert_eq!(factors[0], 0.0);
        assert_eq!(factors[5], 0.2);
        assert_eq!(factors[6], 0.3);
    }

    #[test]
    fn test_score_stays_in_range_with_extreme_inputs() {
        let indicators = snapshot(50.0, 1.0, 50.0);
        let elliott = elliott(1.0, Direction::Up);
        let mut gann = gann();
        gann.predictions.market_position.volatility = -3.0;
        gann.angles.strength = 7.0;
        let pa = price_action(Trend::Up, Action::Buy, 1.0, vec![100.0]);
        let inputs = AnalysisInputs {
            current_price: 100.0,
            indicators: &indicators,
            elliott: &elliott,
            gann: &gann,
            price_action: &pa,
        };

        assert!(ConfidenceAggregator::factors(&inputs).iter().all(|f| (0.0..=1.0).contains(f)));
        let score = ConfidenceAggregator::new(vec![1.0; 7]).score(&inputs);
        assert_eq!(score.score, 100);
    }

    #[test]
    fn test_short_weight_list_truncates() {
        let indicators = snapshot(50.0, 1.0, 50.0);
        let elliott = elliott(1.0, Direction::Up);
        let gann = gann();
        let pa = price_action(Trend::Up, Action::Buy, 0.0, Vec::new());
        let inputs = AnalysisInputs {
            current_price: 100.0,
            indicators: &indicators,
            elliott: &elliott,
            gann: &gann,
            price_action: &pa,
        };

        let score = ConfidenceAggregator::new(vec![0.5]).score(&inputs);
        assert_eq!(score.score, 50);
    }

    #[test]
    fn test_sentiment_votes() {
        let indicators = snapshot(25.0, 1.0, 50.0);
        let elliott = elliott(0.5, Direction::Down);
        let gann = gann();
        let pa = price_action(Trend::Up, Action::Buy, 0.9, Vec::new());
        let inputs = AnalysisInputs {
            current_price: 100.0,
            indicators: &indicators,
            elliott: &elliott,
            gann: &gann,
            price_action: &pa,
        };

        // RSI, MACD and price action bullish, Elliott bearish, stochastic neutral
        let summary = sentiment(&inputs);
        assert_eq!(summary.sentiment, Bias::Bullish);
        assert!((summary.distribution.bullish - 60.0).abs() < 1e-9);
        assert!((summary.distribution.bearish - 20.0).abs() < 1e-9);
        assert!((summary.distribution.neutral - 20.0).abs() < 1e-9);
        assert!((summary.strength - 0.4).abs() < 1e-9);
    }
}
