use crate::analyzers::pivots::PivotPoint;
use crate::models::{Direction, Outcome};
use crate::utils::time::SECONDS_PER_DAY;
use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::debug;

pub const RETRACEMENT_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];
pub const EXTENSION_RATIOS: [f64; 3] = [1.618, 2.618, 4.236];

const PRIMARY_MIN_LENGTH: f64 = 1000.0;
const PRIMARY_MIN_SECONDS: i64 = 30 * SECONDS_PER_DAY;
const INTERMEDIATE_MIN_LENGTH: f64 = 500.0;
const INTERMEDIATE_MIN_SECONDS: i64 = 7 * SECONDS_PER_DAY;

const IMPULSE_PROJECTION: f64 = 1.618;
const CORRECTIVE_PROJECTION: f64 = 0.618;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaveKind {
    Impulse,
    Corrective,
}

impl WaveKind {
    pub fn wave_count(&self) -> u8 {
        match self {
            WaveKind::Impulse => 5,
            WaveKind::Corrective => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaveDegree {
    Primary,
    Intermediate,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WavePhase {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WavePoint {
    pub price: f64,
    pub time: i64,
}

impl From<&PivotPoint> for WavePoint {
    fn from(pivot: &PivotPoint) -> Self {
        Self {
            price: pivot.price,
            time: pivot.time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveFibonacci {
    pub retracement: Vec<f64>,
    pub extension: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wave {
    pub start: WavePoint,
    pub end: WavePoint,
    #[serde(rename = "type")]
    pub kind: WaveKind,
    pub degree: WaveDegree,
    pub number: u8,
    pub fibonacci: WaveFibonacci,
}

impl Wave {
    pub fn length(&self) -> f64 {
        (self.end.price - self.start.price).abs()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWave {
    pub number: u8,
    #[serde(rename = "type")]
    pub kind: WaveKind,
    pub degree: WaveDegree,
    pub phase: WavePhase,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WavePattern {
    #[serde(rename = "type")]
    pub label: String,
    pub completion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveProjection {
    pub direction: Direction,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElliottResult {
    pub current_wave: Option<CurrentWave>,
    pub pattern: Option<WavePattern>,
    pub next_move: Option<WaveProjection>,
    pub fibonacci: Option<WaveFibonacci>,
    pub waves: Vec<Wave>,
}

impl ElliottResult {
    pub fn empty() -> Self {
        Self {
            current_wave: None,
            pattern: None,
            next_move: None,
            fibonacci: None,
            waves: Vec::new(),
        }
    }
}

/// Retracement and extension prices of a move from `start` to `end`.
pub fn wave_fibonacci(start: f64, end: f64) -> WaveFibonacci {
    let diff = (end - start).abs();
    let direction = if end > start { 1.0 } else { -1.0 };

    WaveFibonacci {
        retracement: RETRACEMENT_RATIOS
            .iter()
            .map(|r| end - diff * r * direction)
            .collect(),
        extension: EXTENSION_RATIOS
            .iter()
            .map(|e| end + diff * (e - 1.0) * direction)
            .collect(),
    }
}

pub fn wave_degree(start: &WavePoint, end: &WavePoint) -> WaveDegree {
    let length = (end.price - start.price).abs();
    let elapsed = end.time - start.time;

    if length > PRIMARY_MIN_LENGTH && elapsed > PRIMARY_MIN_SECONDS {
        WaveDegree::Primary
    } else if length > INTERMEDIATE_MIN_LENGTH && elapsed > INTERMEDIATE_MIN_SECONDS {
        WaveDegree::Intermediate
    } else {
        WaveDegree::Minor
    }
}

/// Wave labelling over the pivot sequence.
pub struct WaveCounter {
    waves: Vec<Wave>,
    number: u8,
    kind: WaveKind,
    candidates: usize,
}

impl Default for WaveCounter {
    fn default() -> Self {
        Self {
            waves: Vec::new(),
            number: 1,
            kind: WaveKind::Impulse,
            candidates: 0,
        }
    }
}

impl WaveCounter {
    /// Offer the segment `start -> end` as the next wave. Returns whether it
    /// was accepted; a rejected segment leaves the count unchanged.
    pub fn push(&mut self, start: WavePoint, end: WavePoint) -> bool {
        self.candidates += 1;

        if !self.is_valid(&start, &end) {
            return false;
        }

        self.waves.push(Wave {
            start,
            end,
            kind: self.kind,
            degree: wave_degree(&start, &end),
            number: self.number,
            fibonacci: wave_fibonacci(start.price, end.price),
        });

        if self.number == self.kind.wave_count() {
            self.number = 1;
            self.kind = match self.kind {
                WaveKind::Impulse => WaveKind::Corrective,
                WaveKind::Corrective => WaveKind::Impulse,
            };
        } else {
            self.number += 1;
        }

        true
    }

    fn wave_back(&self, n: usize) -> Option<&Wave> {
        self.waves.len().checked_sub(n).and_then(|i| self.waves.get(i))
    }

    fn is_valid(&self, start: &WavePoint, end: &WavePoint) -> bool {
        if self.kind != WaveKind::Impulse {
            return true;
        }

        match self.number {
            // Wave 2 never retraces below the start of wave 1
            2 => self.wave_back(1).map_or(false, |w1| end.price > w1.start.price),
            // Wave 3 must be longer than wave 1
            3 => self
                .wave_back(2)
                .map_or(false, |w1| (end.price - start.price).abs() > w1.length()),
            // Wave 4 never enters wave 1's territory
            4 => self
                .wave_back(3)
                .map_or(false, |w1| end.price > w1.start.price.max(w1.end.price)),
            _ => true,
        }
    }

    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    /// Share of offered segments that were accepted as waves.
    pub fn acceptance_rate(&self) -> f64 {
        if self.candidates == 0 {
            return 0.0;
        }
        self.waves.len() as f64 / self.candidates as f64
    }

    pub fn into_waves(self) -> Vec<Wave> {
        self.waves
    }
}

pub struct ElliottWaveAnalyzer;

impl ElliottWaveAnalyzer {
    pub fn analyze(pivots: &[PivotPoint]) -> Outcome<ElliottResult> {
        Outcome::from_result(Self::compute(pivots), ElliottResult::empty)
    }

    fn compute(pivots: &[PivotPoint]) -> Result<ElliottResult> {
        if pivots.len() < 2 {
            return Err(anyhow!(
                "Need at least 2 pivots to form a wave, found {}",
                pivots.len()
            ));
        }

        let mut counter = WaveCounter::default();
        for pair in pivots.windows(2) {
            counter.push(WavePoint::from(&pair[0]), WavePoint::from(&pair[1]));
        }

        let confidence = counter.acceptance_rate();
        let waves = counter.into_waves();
        let current = waves
            .last()
            .cloned()
            .ok_or_else(|| anyhow!("No pivot segment satisfied the wave rules"))?;

        debug!(
            "Elliott count accepted {} of {} segments, current wave {} {:?}",
            waves.len(),
            pivots.len() - 1,
            current.number,
            current.kind
        );

        let mean_length = waves.iter().map(Wave::length).sum::<f64>() / waves.len() as f64;
        let progress = if mean_length > 0.0 {
            current.length() / mean_length
        } else {
            0.0
        };
        let phase = if progress < 0.3 {
            WavePhase::Start
        } else if progress > 0.7 {
            WavePhase::End
        } else {
            WavePhase::Middle
        };

        let pattern = WavePattern {
            label: match current.kind {
                WaveKind::Impulse => "5-3".to_string(),
                WaveKind::Corrective => "3-3".to_string(),
            },
            completion: current.number as f64 / current.kind.wave_count() as f64 * 100.0,
        };

        let even = current.number % 2 == 0;
        let multiplier = match current.kind {
            WaveKind::Impulse => IMPULSE_PROJECTION,
            WaveKind::Corrective => CORRECTIVE_PROJECTION,
        };
        let sign = if even { -1.0 } else { 1.0 };
        let next_move = WaveProjection {
            direction: if even { Direction::Down } else { Direction::Up },
            target: current.end.price + current.length() * multiplier * sign,
        };

        Ok(ElliottResult {
            current_wave: Some(CurrentWave {
                number: current.number,
                kind: current.kind,
                degree: current.degree,
                phase,
                confidence,
            }),
            pattern: Some(pattern),
            next_move: Some(next_move),
            fibonacci: Some(current.fibonacci.clone()),
            waves,
        })
    }
}
