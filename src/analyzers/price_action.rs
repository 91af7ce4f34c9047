use crate::analyzers::fibonacci::range_retracements;
use crate::analyzers::pivots::{PivotDetector, PivotKind, PivotPoint};
use crate::indicators::patterns::{PatternMatch, PatternRecognizer};
use crate::models::{Bias, Candle, CandleData, FibonacciLevel, Outcome};
use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;
use tracing::debug;

const KEY_LEVEL_PIVOTS: usize = 20;
const KEY_LEVEL_COUNT: usize = 3;
const PATTERN_LOOKBACK: usize = 100;
const TREND_LOOKBACK: usize = 20;
const SIDEWAYS_MARGIN: usize = 5;
const RECENT_PATTERNS: usize = 3;
const CONFIRMATION_CANDLES: usize = 3;

// Strength scoring
const BASE_STRENGTH: f64 = 0.5;
const KEY_LEVEL_BONUS: f64 = 0.2;
const KEY_LEVEL_TOLERANCE: f64 = 0.002;
const FULL_BODY_BONUS: f64 = 0.2;
const FULL_BODY_RATIO: f64 = 0.7;
const TREND_BONUS: f64 = 0.1;
const STAR_MULTIPLIER: f64 = 1.2;
const ALIGNED_SIGNAL_MULTIPLIER: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Sideways => write!(f, "sideways"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePattern {
    #[serde(rename = "type")]
    pub bias: Bias,
    pub name: String,
    pub strength: f64,
    pub confirmation: bool,
}

impl PricePattern {
    pub fn none() -> Self {
        Self {
            bias: Bias::Neutral,
            name: "NO_PATTERN".to_string(),
            strength: 0.0,
            confirmation: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSummary {
    pub current: PricePattern,
    pub recent: Vec<PricePattern>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KeyLevels {
    pub supports: Vec<f64>,
    pub resistances: Vec<f64>,
}

impl KeyLevels {
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.supports.iter().chain(self.resistances.iter()).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub direction: Trend,
    pub strength: f64,
    pub key_levels: KeyLevels,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub action: Action,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signals {
    pub primary: Signal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retracements {
    pub retracements: Vec<FibonacciLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceActionResult {
    pub pattern: PatternSummary,
    pub trend: TrendSummary,
    pub signals: Signals,
    pub fibonacci: Retracements,
}

impl PriceActionResult {
    pub fn empty() -> Self {
        Self {
            pattern: PatternSummary {
                current: PricePattern::none(),
                recent: Vec::new(),
            },
            trend: TrendSummary {
                direction: Trend::Sideways,
                strength: 0.0,
                key_levels: KeyLevels::default(),
            },
            signals: Signals {
                primary: Signal {
                    action: Action::Hold,
                    confidence: 0.0,
                    reason: no_pattern_reason(),
                },
            },
            fibonacci: Retracements {
                retracements: Vec::new(),
            },
        }
    }
}

fn no_pattern_reason() -> String {
    "No clear pattern".to_string()
}

/// Nearest swing lows below and swing highs above `price`, taken from the
/// last [`KEY_LEVEL_PIVOTS`] pivots.
pub fn key_levels(pivots: &[PivotPoint], price: f64) -> KeyLevels {
    let recent = &pivots[pivots.len().saturating_sub(KEY_LEVEL_PIVOTS)..];

    let mut supports: Vec<f64> = recent
        .iter()
        .filter(|p| p.kind == PivotKind::Low && p.price < price)
        .map(|p| p.price)
        .collect();
    supports.sort_by(|a, b| b.total_cmp(a));
    supports.truncate(KEY_LEVEL_COUNT);

    let mut resistances: Vec<f64> = recent
        .iter()
        .filter(|p| p.kind == PivotKind::High && p.price > price)
        .map(|p| p.price)
        .collect();
    resistances.sort_by(f64::total_cmp);
    resistances.truncate(KEY_LEVEL_COUNT);

    KeyLevels {
        supports,
        resistances,
    }
}

/// Up and down moves over the trailing closes.
fn tally_moves(closes: &[f64]) -> (usize, usize) {
    closes.windows(2).fold((0, 0), |(up, down), w| {
        if w[1] > w[0] {
            (up + 1, down)
        } else if w[1] < w[0] {
            (up, down + 1)
        } else {
            (up, down)
        }
    })
}

pub fn trend(closes: &[f64]) -> Trend {
    let (up, down) = tally_moves(closes);
    if up.abs_diff(down) < SIDEWAYS_MARGIN {
        Trend::Sideways
    } else if up > down {
        Trend::Up
    } else {
        Trend::Down
    }
}

pub fn trend_strength(closes: &[f64]) -> f64 {
    if closes.is_empty() {
        return 0.0;
    }
    let (up, down) = tally_moves(closes);
    up.abs_diff(down) as f64 / closes.len() as f64
}

fn pattern_strength(candle: &Candle, levels: &KeyLevels, trend: Trend) -> f64 {
    let mut strength = BASE_STRENGTH;

    let midpoint = candle.midpoint();
    let tolerance = midpoint * KEY_LEVEL_TOLERANCE;
    if levels.iter().any(|level| (midpoint - level).abs() < tolerance) {
        strength += KEY_LEVEL_BONUS;
    }

    if candle.range() > 0.0 && candle.body() >= candle.range() * FULL_BODY_RATIO {
        strength += FULL_BODY_BONUS;
    }

    let aligned = (trend == Trend::Up && candle.is_bullish())
        || (trend == Trend::Down && candle.is_bearish());
    if aligned {
        strength += TREND_BONUS;
    }

    strength
}

/// Whether any of the candles following `index` closes in the pattern's direction.
fn is_confirmed(candles: &[Candle], index: usize, bias: Bias) -> bool {
    let mut following = candles.iter().skip(index + 1).take(CONFIRMATION_CANDLES);
    match bias {
        Bias::Bullish => following.any(Candle::is_bullish),
        Bias::Bearish => following.any(Candle::is_bearish),
        Bias::Neutral => false,
    }
}

fn score_pattern(detection: &PatternMatch, candles: &[Candle], levels: &KeyLevels, trend: Trend) -> PricePattern {
    let mut strength = pattern_strength(&candles[detection.index], levels, trend);
    if detection.pattern.is_star() {
        strength *= STAR_MULTIPLIER;
    }

    PricePattern {
        bias: detection.bias,
        name: detection.pattern.to_string(),
        strength: strength.min(1.0),
        confirmation: is_confirmed(candles, detection.index, detection.bias),
    }
}

pub fn primary_signal(pattern: Option<&PricePattern>, trend: Trend) -> Signal {
    let pattern = match pattern {
        Some(p) => p,
        None => {
            return Signal {
                action: Action::Hold,
                confidence: 0.0,
                reason: no_pattern_reason(),
            }
        }
    };

    let action = match (pattern.bias, trend) {
        (Bias::Bullish, Trend::Up) => Action::Buy,
        (Bias::Bearish, Trend::Down) => Action::Sell,
        _ => Action::Hold,
    };
    let confidence = if action == Action::Hold {
        pattern.strength
    } else {
        pattern.strength * ALIGNED_SIGNAL_MULTIPLIER
    };

    Signal {
        action,
        confidence: confidence.min(1.0),
        reason: format!(
            "{} pattern gives a {} signal. Trend is {}.",
            pattern.name,
            pattern.bias.to_string().to_lowercase(),
            trend
        ),
    }
}

pub struct PriceActionAnalyzer;

impl PriceActionAnalyzer {
    /// Patterns, trend and signal over the series; key levels and
    /// retracements are placed around the caller's `price`.
    pub fn analyze(data: &CandleData, price: f64) -> Outcome<PriceActionResult> {
        Outcome::from_result(Self::compute(data, price), PriceActionResult::empty)
    }

    fn compute(data: &CandleData, price: f64) -> Result<PriceActionResult> {
        if data.is_empty() {
            bail!("No candles to analyze");
        }
        if !price.is_finite() {
            bail!("Current price must be finite, got {}", price);
        }

        let levels = key_levels(&PivotDetector::default().detect(data), price);

        let closes = data.tail_closes(TREND_LOOKBACK);
        let direction = trend(closes);

        let start = data.len().saturating_sub(PATTERN_LOOKBACK);
        let recent: Vec<Candle> = data.candles().skip(start).collect();
        let patterns: Vec<PricePattern> = PatternRecognizer::scan(&recent)
            .iter()
            .map(|m| score_pattern(m, &recent, &levels, direction))
            .collect();

        debug!(
            "Price action: {} patterns over {} candles, trend {}",
            patterns.len(),
            recent.len(),
            direction
        );

        let primary = primary_signal(patterns.last(), direction);

        Ok(PriceActionResult {
            pattern: PatternSummary {
                current: patterns.last().cloned().unwrap_or_else(PricePattern::none),
                recent: patterns[patterns.len().saturating_sub(RECENT_PATTERNS)..].to_vec(),
            },
            trend: TrendSummary {
                direction,
                strength: trend_strength(closes),
                key_levels: levels,
            },
            signals: Signals { primary },
            fibonacci: Retracements {
                retracements: range_retracements(data, price),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::patterns::CandlePattern;
    use crate::models::LevelType;

    fn rising_marubozu(n: usize) -> CandleData {
        let candles: Vec<Candle> = (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                Candle::new(i as i64, close - 1.0, close, close - 1.0, close, 5.0)
            })
            .collect();
        CandleData::from_candles(&candles).unwrap()
    }

    fn pivot(price: f64, kind: PivotKind) -> PivotPoint {
        PivotPoint { price, time: 0, kind }
    }

    #[test]
    fn test_rising_series_gives_buy() {
        let result = PriceActionAnalyzer::analyze(&rising_marubozu(20), 119.0).into_result();

        assert_eq!(result.trend.direction, Trend::Up);
        assert!((result.trend.strength - 0.95).abs() < 1e-12);
        assert_eq!(result.pattern.current.name, "MARUBOZU");
        assert_eq!(result.pattern.current.bias, Bias::Bullish);
        assert_eq!(result.pattern.recent.len(), 3);

        let signal = &result.signals.primary;
        assert_eq!(signal.action, Action::Buy);
        assert!((signal.confidence - 0.96).abs() < 1e-9);
        assert_eq!(signal.reason, "MARUBOZU pattern gives a bullish signal. Trend is up.");
    }

    #[test]
    fn test_levels_follow_the_given_price() {
        // swing highs at 110 and 130, swing lows at 90 and 70
        let closes = [100.0, 110.0, 90.0, 130.0, 70.0, 100.0];
        let mut candles = Vec::new();
        for pair in closes.windows(2) {
            for k in 0..10 {
                let p = pair[0] + (pair[1] - pair[0]) * k as f64 / 10.0;
                candles.push(Candle::new(candles.len() as i64, p, p + 0.5, p - 0.5, p, 1.0));
            }
        }
        let data = CandleData::from_candles(&candles).unwrap();

        let near = PriceActionAnalyzer::analyze(&data, 100.0).into_result();
        assert_eq!(near.trend.key_levels.supports, vec![89.5, 69.5]);
        assert_eq!(near.trend.key_levels.resistances, vec![110.5, 130.5]);

        let high = PriceActionAnalyzer::analyze(&data, 120.0).into_result();
        assert_eq!(high.trend.key_levels.supports, vec![89.5, 69.5]);
        assert_eq!(high.trend.key_levels.resistances, vec![130.5]);
        let supports = |r: &PriceActionResult| {
            r.fibonacci
                .retracements
                .iter()
                .filter(|l| l.level_type == LevelType::Support)
                .count()
        };
        // range 69.5..130.5: four levels at or below 100, six below 120
        assert_eq!(supports(&near), 4);
        assert_eq!(supports(&high), 6);
    }

    #[test]
    fn test_flat_candle_gets_no_body_bonus() {
        let flat = Candle::new(0, 100.0, 100.0, 100.0, 100.0, 0.0);
        assert_eq!(pattern_strength(&flat, &KeyLevels::default(), Trend::Sideways), 0.5);

        let full = Candle::new(0, 100.0, 104.0, 99.5, 103.8, 0.0);
        assert!((pattern_strength(&full, &KeyLevels::default(), Trend::Sideways) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_key_levels_nearest_first() {
        let pivots = vec![
            pivot(90.0, PivotKind::Low),
            pivot(95.0, PivotKind::Low),
            pivot(97.0, PivotKind::Low),
            pivot(99.0, PivotKind::Low),
            pivot(105.0, PivotKind::Low),
            pivot(110.0, PivotKind::High),
            pivot(103.0, PivotKind::High),
            pivot(98.0, PivotKind::High),
        ];
        let levels = key_levels(&pivots, 100.0);
        assert_eq!(levels.supports, vec![99.0, 97.0, 95.0]);
        assert_eq!(levels.resistances, vec![103.0, 110.0]);
    }

    #[test]
    fn test_trend_tally() {
        let flat = [1.0; 20];
        assert_eq!(trend(&flat), Trend::Sideways);
        assert_eq!(trend_strength(&flat), 0.0);

        let falling: Vec<f64> = (0..20).map(|i| 50.0 - i as f64).collect();
        assert_eq!(trend(&falling), Trend::Down);
    }

    #[test]
    fn test_confirmation_looks_three_candles_ahead() {
        let candles = vec![
            Candle::new(0, 10.0, 11.0, 9.0, 10.5, 0.0),
            Candle::new(1, 10.5, 11.0, 9.0, 10.0, 0.0),
            Candle::new(2, 10.0, 11.0, 9.0, 9.5, 0.0),
            Candle::new(3, 9.5, 11.0, 9.0, 9.0, 0.0),
            Candle::new(4, 9.0, 11.0, 8.0, 10.0, 0.0),
        ];
        // the bullish candle at 4 is beyond the three-candle window
        assert!(!is_confirmed(&candles, 0, Bias::Bullish));
        assert!(is_confirmed(&candles, 1, Bias::Bullish));
        assert!(is_confirmed(&candles, 0, Bias::Bearish));
        assert!(!is_confirmed(&candles, 0, Bias::Neutral));
    }

    #[test]
    fn test_misaligned_signal_holds() {
        let bearish = PricePattern {
            bias: Bias::Bearish,
            name: "ENGULFING".to_string(),
            strength: 0.7,
            confirmation: false,
        };
        let signal = primary_signal(Some(&bearish), Trend::Up);
        assert_eq!(signal.action, Action::Hold);
        assert_eq!(signal.confidence, 0.7);

        let signal = primary_signal(Some(&bearish), Trend::Down);
        assert_eq!(signal.action, Action::Sell);
        assert!((signal.confidence - 0.84).abs() < 1e-9);

        let none = primary_signal(None, Trend::Up);
        assert_eq!(none.action, Action::Hold);
        assert_eq!(none.confidence, 0.0);
    }

    #[test]
    fn test_star_strength_is_boosted_and_capped() {
        let candles = vec![
            Candle::new(0, 110.0, 111.0, 99.0, 100.0, 0.0),
            Candle::new(1, 99.0, 100.0, 97.0, 99.5, 0.0),
            Candle::new(2, 100.0, 108.0, 99.5, 107.0, 0.0),
        ];
        let star = PatternMatch::new(2, CandlePattern::MorningStar, Bias::Bullish);
        // body 7 of range 8.5 -> 0.5 + 0.2, sideways trend, no levels
        let scored = score_pattern(&star, &candles, &KeyLevels::default(), Trend::Sideways);
        assert!((scored.strength - 0.84).abs() < 1e-9);

        let scored = score_pattern(&star, &candles, &KeyLevels::default(), Trend::Up);
        assert!((scored.strength - 0.96).abs() < 1e-9);
        let levels = KeyLevels {
            supports: vec![103.75],
            resistances: Vec::new(),
        };
        let scored = score_pattern(&star, &candles, &levels, Trend::Up);
        assert_eq!(scored.strength, 1.0);
    }
}
