use crate::analyzers::fibonacci::{range_retracements, FIBONACCI_LOOKBACK};
use crate::analyzers::pivots::PivotDetector;
use crate::models::{Bias, CandleData, FibonacciLevel, Outcome};
use crate::utils::math::{relative_ratio, unit};
use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Swing confirmation window for XABCD candidates.
pub const SWING_WINDOW: usize = 20;
pub const MIN_CANDLES: usize = 2 * SWING_WINDOW + 1;
pub const DEFAULT_TOLERANCE: f64 = 0.1;

const PROJECTION_RATIOS: [f64; 9] = [0.236, 0.382, 0.5, 0.618, 0.786, 1.0, 1.272, 1.618, 2.618];
const PROJECTION_ANCHOR: f64 = 0.618;
const REVERSAL_ZONE_MIN_CONFIDENCE: f64 = 0.5;
const REVERSAL_ZONE_COUNT: usize = 3;
const STOP_DISTANCE: f64 = 0.1;
const FALLBACK_STOP: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmonicKind {
    Gartley,
    Bat,
    Butterfly,
    Crab,
    Abcd,
}

impl HarmonicKind {
    pub const ALL: [HarmonicKind; 5] = [
        HarmonicKind::Gartley,
        HarmonicKind::Bat,
        HarmonicKind::Butterfly,
        HarmonicKind::Crab,
        HarmonicKind::Abcd,
    ];

    /// Ideal XA, AB, BC, CD and AD ratios.
    pub fn template(&self) -> [f64; 5] {
        match self {
            HarmonicKind::Gartley => [1.0, 0.618, 0.382, 1.272, 0.786],
            HarmonicKind::Bat => [1.0, 0.382, 0.886, 2.618, 0.886],
            HarmonicKind::Butterfly => [1.0, 0.786, 0.382, 1.618, 1.27],
            HarmonicKind::Crab => [1.0, 0.382, 0.886, 3.618, 1.618],
            HarmonicKind::Abcd => [1.0, 0.618, 0.382, 1.618, 1.0],
        }
    }

    pub fn ideal_cd(&self) -> f64 {
        self.template()[3]
    }

    fn reversal_multiplier(&self) -> f64 {
        match self {
            HarmonicKind::Gartley | HarmonicKind::Abcd => 0.786,
            HarmonicKind::Bat => 0.886,
            HarmonicKind::Butterfly => 1.27,
            HarmonicKind::Crab => 1.618,
        }
    }
}

impl fmt::Display for HarmonicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarmonicKind::Gartley => write!(f, "GARTLEY"),
            HarmonicKind::Bat => write!(f, "BAT"),
            HarmonicKind::Butterfly => write!(f, "BUTTERFLY"),
            HarmonicKind::Crab => write!(f, "CRAB"),
            HarmonicKind::Abcd => write!(f, "ABCD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct XabcdPoints {
    pub x: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl XabcdPoints {
    pub fn from_slice(points: &[f64; 5]) -> Self {
        Self {
            x: points[0],
            a: points[1],
            b: points[2],
            c: points[3],
            d: points[4],
        }
    }

    /// Actual XA, AB, BC, CD and AD ratios, in template order.
    pub fn ratios(&self) -> [f64; 5] {
        [
            relative_ratio(self.x, self.a),
            relative_ratio(self.a, self.b),
            relative_ratio(self.b, self.c),
            relative_ratio(self.c, self.d),
            relative_ratio(self.a, self.d),
        ]
    }

    pub fn range(&self) -> f64 {
        (self.d - self.x).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct LegRatios {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xa: Option<f64>,
    pub ab: f64,
    pub bc: f64,
    pub cd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonicPattern {
    #[serde(rename = "type")]
    pub kind: HarmonicKind,
    pub points: XabcdPoints,
    pub ratios: LegRatios,
    pub direction: Bias,
    pub completion: f64,
    pub confidence: f64,
    pub potential_reversal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibonacciProjection {
    pub level: f64,
    pub price: f64,
    pub significance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonicFibonacci {
    pub retracements: Vec<FibonacciLevel>,
    pub projections: Vec<FibonacciProjection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReversalZone {
    pub price: f64,
    pub strength: f64,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonicPredictions {
    pub reversal_zones: Vec<ReversalZone>,
    pub next_target: f64,
    pub stop_loss: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonicResult {
    pub current_pattern: Option<HarmonicPattern>,
    pub active_patterns: Vec<HarmonicPattern>,
    pub fibonacci: HarmonicFibonacci,
    pub predictions: HarmonicPredictions,
}

impl HarmonicResult {
    pub fn empty(price: f64) -> Self {
        Self {
            current_pattern: None,
            active_patterns: Vec::new(),
            fibonacci: HarmonicFibonacci {
                retracements: Vec::new(),
                projections: Vec::new(),
            },
            predictions: HarmonicPredictions {
                reversal_zones: Vec::new(),
                next_target: price,
                stop_loss: price * FALLBACK_STOP,
                confidence: 0.0,
            },
        }
    }
}

/// Highest confidence pattern; on ties the later one wins.
pub fn strongest(patterns: &[HarmonicPattern]) -> Option<&HarmonicPattern> {
    patterns.iter().reduce(|best, p| {
        if best.confidence > p.confidence {
            best
        } else {
            p
        }
    })
}

/// Up to three reversal targets from confident patterns, nearest to `price` first.
pub fn reversal_zones(patterns: &[HarmonicPattern], price: f64) -> Vec<ReversalZone> {
    let mut zones: Vec<ReversalZone> = patterns
        .iter()
        .filter(|p| p.confidence > REVERSAL_ZONE_MIN_CONFIDENCE)
        .map(|p| {
            let offset = p.points.range() * p.kind.ideal_cd();
            ReversalZone {
                price: if p.direction == Bias::Bullish {
                    price + offset
                } else {
                    price - offset
                },
                strength: p.confidence,
                pattern: format!("{} {}", p.kind, p.direction),
            }
        })
        .collect();

    zones.sort_by(|a, b| (a.price - price).abs().total_cmp(&(b.price - price).abs()));
    zones.truncate(REVERSAL_ZONE_COUNT);
    zones
}

pub fn stop_loss(pattern: Option<&HarmonicPattern>, price: f64) -> f64 {
    match pattern {
        Some(p) => {
            let distance = p.points.range() * STOP_DISTANCE;
            if p.direction == Bias::Bullish {
                p.points.d - distance
            } else {
                p.points.d + distance
            }
        }
        None => price * FALLBACK_STOP,
    }
}

pub fn fibonacci_projections(data: &CandleData, price: f64) -> Vec<FibonacciProjection> {
    let (high, low) = data.tail_extremes(FIBONACCI_LOOKBACK);
    let range = high - low;

    PROJECTION_RATIOS
        .iter()
        .map(|&level| FibonacciProjection {
            level,
            price: price + range * level,
            significance: 1.0 - (PROJECTION_ANCHOR - level).abs(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct HarmonicPatternAnalyzer {
    tolerance: f64,
}

impl Default for HarmonicPatternAnalyzer {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl HarmonicPatternAnalyzer {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Every template the five points satisfy, with completion measured
    /// against `price`.
    pub fn match_points(&self, points: &[f64; 5], price: f64) -> Vec<HarmonicPattern> {
        let points = XabcdPoints::from_slice(points);
        let actual = points.ratios();

        HarmonicKind::ALL
            .iter()
            .filter(|kind| {
                actual
                    .iter()
                    .zip(kind.template().iter())
                    .all(|(a, ideal)| (a - ideal).abs() <= self.tolerance)
            })
            .map(|&kind| build_pattern(kind, points, actual, price))
            .collect()
    }

    /// Swing highs and lows, merged and sorted by price.
    pub fn swing_prices(data: &CandleData) -> Vec<f64> {
        let (highs, lows) = PivotDetector::with_window(SWING_WINDOW).swing_indices(data);
        let mut prices: Vec<f64> = highs
            .iter()
            .map(|&i| data.high[i])
            .chain(lows.iter().map(|&i| data.low[i]))
            .collect();
        prices.sort_by(f64::total_cmp);
        prices
    }

    /// Scan the series for XABCD structures, measuring completion, reversal
    /// zones and projections against the caller's `price`.
    pub fn analyze(&self, data: &CandleData, price: f64) -> Outcome<HarmonicResult> {
        Outcome::from_result(self.compute(data, price), || HarmonicResult::empty(price))
    }

    fn compute(&self, data: &CandleData, price: f64) -> Result<HarmonicResult> {
        if !price.is_finite() {
            bail!("Current price must be finite, got {}", price);
        }
        if data.len() < MIN_CANDLES {
            bail!(
                "Harmonic scan needs {} candles for swing detection, found {}",
                MIN_CANDLES,
                data.len()
            );
        }

        let swings = Self::swing_prices(data);
        let patterns: Vec<HarmonicPattern> = swings
            .windows(5)
            .flat_map(|w| self.match_points(&[w[0], w[1], w[2], w[3], w[4]], price))
            .collect();

        debug!(
            "Harmonic scan: {} swings, {} pattern matches",
            swings.len(),
            patterns.len()
        );

        let current = strongest(&patterns).cloned();
        let predictions = HarmonicPredictions {
            reversal_zones: reversal_zones(&patterns, price),
            next_target: current.as_ref().map_or(price, |p| p.potential_reversal),
            stop_loss: stop_loss(current.as_ref(), price),
            confidence: current.as_ref().map_or(0.0, |p| p.confidence),
        };

        Ok(HarmonicResult {
            current_pattern: current,
            active_patterns: patterns,
            fibonacci: HarmonicFibonacci {
                retracements: range_retracements(data, price),
                projections: fibonacci_projections(data, price),
            },
            predictions,
        })
    }
}

fn build_pattern(kind: HarmonicKind, points: XabcdPoints, actual: [f64; 5], price: f64) -> HarmonicPattern {
    let template = kind.template();
    let mean_deviation = actual
        .iter()
        .zip(template.iter())
        .map(|(a, ideal)| (a - ideal).abs() / ideal)
        .sum::<f64>()
        / template.len() as f64;

    let range = points.range();
    let completion = if range > 0.0 {
        ((range - (price - points.d).abs()) / range * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let (direction, sign) = if points.d > points.x {
        (Bias::Bullish, 1.0)
    } else {
        (Bias::Bearish, -1.0)
    };

    HarmonicPattern {
        kind,
        points,
        ratios: LegRatios {
            xa: Some(actual[0]),
            ab: actual[1],
            bc: actual[2],
            cd: actual[3],
            xd: None,
        },
        direction,
        completion,
        confidence: unit(1.0 - mean_deviation),
        potential_reversal: points.d + sign * range * kind.reversal_multiplier(),
    }
}
