use crate::analyzers::fibonacci::range_retracements;
use crate::models::{CandleData, Direction, FibonacciLevel, Outcome};
use crate::utils::math::{simple_returns, std_dev};
use crate::utils::time::{add_days, days_since, format_time};
use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Candles needed for the 20-period angle and phase windows.
pub const MIN_CANDLES: usize = 20;

const ANGLE_PERIODS: usize = 20;
const DIRECTION_THRESHOLD_DEGREES: f64 = 15.0;
const ANGLE_SLOPES: [u32; 5] = [1, 2, 3, 4, 8];
const SQUARE_ROOT_OF_NINE: f64 = 3.0;
const CYCLE_DAYS: [i64; 9] = [21, 34, 55, 89, 144, 233, 377, 610, 987];
const MAJOR_CYCLE_DAYS: [i64; 3] = [89, 144, 233];
const MASTER_CYCLE_DAYS: i64 = 144;
const CYCLE_LOOKBACK: usize = 89;
const MOMENTUM_LOOKBACK: usize = 10;
const TREND_LOOKBACK: usize = 5;

const MIN_CONFIDENCE: f64 = 0.35;
const MAX_CONFIDENCE: f64 = 0.85;

/// Weights of the factors blended into the Gann price confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GannWeights {
    pub trend: f64,
    pub volatility: f64,
    pub momentum: f64,
    pub cycle: f64,
    pub fibonacci: f64,
}

impl Default for GannWeights {
    fn default() -> Self {
        Self {
            trend: 0.3,
            volatility: 0.2,
            momentum: 0.2,
            cycle: 0.2,
            fibonacci: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketPhase {
    #[serde(rename = "ACCUMULATION")]
    Accumulation,
    #[serde(rename = "DISTRIBUTION")]
    Distribution,
    #[serde(rename = "MARK UP")]
    MarkUp,
    #[serde(rename = "MARK DOWN")]
    MarkDown,
    #[serde(rename = "CONSOLIDATION")]
    Consolidation,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MarketPhase::Accumulation => "ACCUMULATION",
            MarketPhase::Distribution => "DISTRIBUTION",
            MarketPhase::MarkUp => "MARK UP",
            MarketPhase::MarkDown => "MARK DOWN",
            MarketPhase::Consolidation => "CONSOLIDATION",
            MarketPhase::Unknown => "UNKNOWN",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeFrame {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneType {
    Major,
    Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AngleLevel {
    pub angle: f64,
    pub price: f64,
    #[serde(rename = "type")]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GannAngles {
    pub current: f64,
    pub direction: Direction,
    pub strength: f64,
    pub levels: Vec<AngleLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardinalPoint {
    pub price: f64,
    pub angle: f64,
    pub significance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GannSquares {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
    pub next_target: f64,
    pub fibonacci_levels: Vec<FibonacciLevel>,
    pub cardinal_points: Vec<CardinalPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibonacciTimeZone {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalPattern {
    pub pattern: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub historical_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeCycles {
    pub current_phase: MarketPhase,
    pub next_turning_point: DateTime<Utc>,
    pub cycle_strength: f64,
    pub fibonacci_time_zones: Vec<FibonacciTimeZone>,
    pub seasonal_patterns: Vec<SeasonalPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePrediction {
    pub next: f64,
    pub target: f64,
    pub stop: f64,
    pub confidence: f64,
    pub time_frame: TimeFrame,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reversal {
    pub date: DateTime<Utc>,
    pub probability: f64,
    pub expected_direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePrediction {
    pub critical_dates: Vec<DateTime<Utc>>,
    pub cycle_completion: f64,
    pub next_reversal: Reversal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketPosition {
    pub current_phase: MarketPhase,
    pub strength: f64,
    pub momentum: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GannPredictions {
    pub price: PricePrediction,
    pub time: TimePrediction,
    pub market_position: MarketPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GannResult {
    pub angles: GannAngles,
    pub squares: GannSquares,
    pub time_cycles: TimeCycles,
    pub predictions: GannPredictions,
}

impl GannResult {
    /// Neutral result built around `price` with no derived levels.
    pub fn neutral(price: f64, now: DateTime<Utc>) -> Self {
        Self {
            angles: GannAngles {
                current: 0.0,
                direction: Direction::Neutral,
                strength: 0.0,
                levels: Vec::new(),
            },
            squares: GannSquares {
                support: vec![price * 0.95, price * 0.90],
                resistance: vec![price * 1.05, price * 1.10],
                next_target: price,
                fibonacci_levels: Vec::new(),
                cardinal_points: Vec::new(),
            },
            time_cycles: TimeCycles {
                current_phase: MarketPhase::Unknown,
                next_turning_point: now,
                cycle_strength: 0.0,
                fibonacci_time_zones: Vec::new(),
                seasonal_patterns: Vec::new(),
            },
            predictions: GannPredictions {
                price: PricePrediction {
                    next: price,
                    target: price,
                    stop: price * 0.95,
                    confidence: 0.0,
                    time_frame: TimeFrame::Short,
                },
                time: TimePrediction {
                    critical_dates: Vec::new(),
                    cycle_completion: 0.0,
                    next_reversal: Reversal {
                        date: now,
                        probability: 0.0,
                        expected_direction: Direction::Neutral,
                    },
                },
                market_position: MarketPosition {
                    current_phase: MarketPhase::Unknown,
                    strength: 0.0,
                    momentum: 0.0,
                    volatility: 0.0,
                },
            },
        }
    }
}

/// Angle in degrees of a move of `end - start` over `periods`, within [-90, 90].
pub fn gann_angle(start: f64, end: f64, periods: f64) -> f64 {
    (end - start).atan2(periods).to_degrees().clamp(-90.0, 90.0)
}

pub fn angle_direction(angle: f64) -> Direction {
    if angle > DIRECTION_THRESHOLD_DEGREES {
        Direction::Up
    } else if angle < -DIRECTION_THRESHOLD_DEGREES {
        Direction::Down
    } else {
        Direction::Neutral
    }
}

pub fn angle_levels(price: f64) -> Vec<AngleLevel> {
    ANGLE_SLOPES
        .iter()
        .map(|&slope| AngleLevel {
            angle: (slope as f64).atan().to_degrees(),
            price: price * (1.0 + slope as f64 / 100.0),
            label: format!("{}x1", slope),
        })
        .collect()
}

/// Square of nine levels around `base`, ascending.
pub fn square_of_nine(base: f64) -> Vec<f64> {
    (1..=9)
        .map(|i| base * (1.0 + (i as f64).sqrt() * SQUARE_ROOT_OF_NINE / 100.0))
        .collect()
}

pub fn cardinal_points(price: f64) -> Vec<CardinalPoint> {
    [90.0, 180.0, 270.0, 360.0]
        .iter()
        .map(|&angle: &f64| {
            let radius = (angle / 90.0).sqrt();
            CardinalPoint {
                price: price * (1.0 + radius * SQUARE_ROOT_OF_NINE / 100.0),
                angle,
                significance: if angle == 180.0 || angle == 360.0 { 1.0 } else { 0.8 },
            }
        })
        .collect()
}

/// Next square-of-nine level in the direction of the last one-period move.
pub fn next_target(price: f64, previous_close: f64, levels: &[f64]) -> f64 {
    match angle_direction(gann_angle(previous_close, price, 1.0)) {
        Direction::Up => levels
            .iter()
            .copied()
            .find(|&l| l > price)
            .unwrap_or(price * 1.05),
        Direction::Down => levels
            .iter()
            .rev()
            .copied()
            .find(|&l| l < price)
            .unwrap_or(price * 0.95),
        Direction::Neutral => price,
    }
}

fn days_after(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    add_days(now, days)
        .ok_or_else(|| anyhow!("{} days after {} is out of the date range", days, format_time(&now)))
}

pub fn fibonacci_time_zones(now: DateTime<Utc>) -> Result<Vec<FibonacciTimeZone>> {
    CYCLE_DAYS
        .iter()
        .map(|&days| {
            Ok(FibonacciTimeZone {
                date: days_after(now, days)?,
                zone_type: if days >= 89 { ZoneType::Major } else { ZoneType::Minor },
                probability: if MAJOR_CYCLE_DAYS.contains(&days) { 0.8 } else { 0.5 },
            })
        })
        .collect()
}

pub fn seasonal_patterns(now: DateTime<Utc>) -> Vec<SeasonalPattern> {
    const SEASONS: [(&str, u32, u32, f64); 4] = [
        ("Spring Rally", 3, 4, 0.65),
        ("Summer Consolidation", 6, 8, 0.55),
        ("Fall Decline", 9, 10, 0.60),
        ("Year-End Rally", 11, 12, 0.70),
    ];
    let year = now.year();

    SEASONS
        .iter()
        .filter_map(|&(name, first, last, accuracy)| {
            let start_date = Utc.with_ymd_and_hms(year, first, 1, 0, 0, 0).single()?;
            let end_date = Utc.with_ymd_and_hms(year, last, 30, 0, 0, 0).single()?;
            Some(SeasonalPattern {
                pattern: name.to_string(),
                start_date,
                end_date,
                historical_accuracy: accuracy,
            })
        })
        .collect()
}

/// Phase of the trailing 20 closes.
pub fn market_phase(closes: &[f64]) -> MarketPhase {
    let (first, last) = match (closes.first(), closes.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return MarketPhase::Unknown,
    };
    let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = closes.iter().copied().fold(f64::INFINITY, f64::min);

    if last > first && last >= max * 0.95 {
        MarketPhase::Accumulation
    } else if last < first && last <= min * 1.05 {
        MarketPhase::Distribution
    } else if last > first {
        MarketPhase::MarkUp
    } else if last < first {
        MarketPhase::MarkDown
    } else {
        MarketPhase::Consolidation
    }
}

/// Share of moves that continue the direction of the move before them.
pub fn cycle_strength(closes: &[f64]) -> f64 {
    let n = closes.len() as f64;
    let mut strength = 0.0;
    let mut previous: Option<bool> = None;

    for w in closes.windows(2) {
        let up = w[1] > w[0];
        if previous == Some(up) {
            strength += 1.0 / n;
        }
        previous = Some(up);
    }

    strength.min(1.0)
}

pub fn momentum(closes: &[f64]) -> f64 {
    simple_returns(closes).iter().sum::<f64>().clamp(-1.0, 1.0)
}

pub fn volatility(closes: &[f64]) -> f64 {
    std_dev(&simple_returns(closes))
}

fn trend_consistency(closes: &[f64]) -> f64 {
    let moves: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    if moves.iter().all(|&m| m > 0.0) || moves.iter().all(|&m| m < 0.0) {
        0.8
    } else {
        0.4
    }
}

fn fibonacci_proximity(price: f64, levels: &[FibonacciLevel]) -> f64 {
    let nearest = levels
        .iter()
        .map(|l| (l.price - price).abs() / price)
        .fold(f64::INFINITY, f64::min);
    1.0 - (nearest * 10.0).min(1.0)
}

fn time_frame(cycle_strength: f64) -> TimeFrame {
    if cycle_strength > 0.7 {
        TimeFrame::Long
    } else if cycle_strength > 0.4 {
        TimeFrame::Medium
    } else {
        TimeFrame::Short
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GannAnalyzer {
    weights: GannWeights,
}

impl GannAnalyzer {
    pub fn new(weights: GannWeights) -> Self {
        Self { weights }
    }

    pub fn analyze(
        &self,
        data: &CandleData,
        current_price: f64,
        now: DateTime<Utc>,
    ) -> Outcome<GannResult> {
        Outcome::from_result(self.compute(data, current_price, now), || {
            GannResult::neutral(current_price, now)
        })
    }

    fn compute(&self, data: &CandleData, price: f64, now: DateTime<Utc>) -> Result<GannResult> {
        let n = data.len();
        if n < MIN_CANDLES {
            bail!("Gann analysis needs {} candles, found {}", MIN_CANDLES, n);
        }
        if !(price.is_finite() && price > 0.0) {
            bail!("Current price must be positive, got {}", price);
        }
        if data.tail_closes(CYCLE_LOOKBACK).iter().any(|&c| c == 0.0) {
            bail!("Zero close price in the analysis window");
        }

        let last_close = data.last_close();
        let previous_close = data.close[n - 2];

        let current_angle = gann_angle(data.close[n - ANGLE_PERIODS], price, ANGLE_PERIODS as f64);
        let angles = GannAngles {
            current: current_angle,
            direction: angle_direction(current_angle),
            strength: (current_angle.abs() / 90.0).min(1.0),
            levels: angle_levels(price),
        };

        let levels = square_of_nine(price);
        let fibonacci_levels = range_retracements(data, price);
        let squares = GannSquares {
            support: levels.iter().copied().filter(|&l| l < price).collect(),
            resistance: levels.iter().copied().filter(|&l| l > price).collect(),
            next_target: next_target(price, previous_close, &levels),
            cardinal_points: cardinal_points(price),
            fibonacci_levels,
        };

        let phase = market_phase(data.tail_closes(ANGLE_PERIODS));
        let strength = cycle_strength(data.tail_closes(CYCLE_LOOKBACK));
        let volatility = volatility(data.tail_closes(ANGLE_PERIODS));
        let momentum = momentum(data.tail_closes(MOMENTUM_LOOKBACK));
        if !volatility.is_finite() || !momentum.is_finite() {
            return Err(anyhow!("Non-finite volatility or momentum"));
        }

        let elapsed = days_since(data.time[0], now);
        let turning_days = CYCLE_DAYS
            .iter()
            .copied()
            .find(|&d| d > elapsed)
            .unwrap_or(CYCLE_DAYS[0]);
        let next_turning_point = days_after(now, turning_days)?;
        let fibonacci_time_zones = fibonacci_time_zones(now)?;
        let critical_dates = CYCLE_DAYS[..3]
            .iter()
            .map(|&d| days_after(now, d))
            .collect::<Result<Vec<_>>>()?;

        let w = &self.weights;
        let raw_confidence = trend_consistency(data.tail_closes(TREND_LOOKBACK)) * w.trend
            + (1.0 - volatility) * w.volatility
            + momentum.abs() * w.momentum
            + strength * w.cycle
            + fibonacci_proximity(price, &squares.fibonacci_levels) * w.fibonacci;
        // max/min rather than clamp so a NaN blend lands on the floor
        let confidence = raw_confidence.max(MIN_CONFIDENCE).min(MAX_CONFIDENCE);

        let one_period = angle_direction(gann_angle(previous_close, last_close, 1.0));

        debug!(
            "Gann angle {:.2} ({}), phase {}, cycle strength {:.3}, confidence {:.3}",
            current_angle, angles.direction, phase, strength, confidence
        );

        Ok(GannResult {
            angles,
            squares,
            time_cycles: TimeCycles {
                current_phase: phase,
                next_turning_point,
                cycle_strength: strength,
                fibonacci_time_zones,
                seasonal_patterns: seasonal_patterns(now),
            },
            predictions: GannPredictions {
                price: PricePrediction {
                    next: price,
                    target: next_target(last_close, previous_close, &square_of_nine(last_close)),
                    stop: last_close * (1.0 - 2.0 * volatility),
                    confidence,
                    time_frame: time_frame(strength),
                },
                time: TimePrediction {
                    critical_dates,
                    cycle_completion: elapsed.rem_euclid(MASTER_CYCLE_DAYS) as f64
                        / MASTER_CYCLE_DAYS as f64
                        * 100.0,
                    next_reversal: Reversal {
                        date: next_turning_point,
                        probability: confidence,
                        expected_direction: if one_period == Direction::Up {
                            Direction::Down
                        } else {
                            Direction::Up
                        },
                    },
                },
                market_position: MarketPosition {
                    current_phase: phase,
                    strength,
                    momentum,
                    volatility,
                },
            },
        })
    }
}
