use crate::analyzers::confidence::{sentiment, AnalysisInputs};
use crate::analyzers::{
    ConfidenceAggregator, ConfidenceScore, ElliottResult, ElliottWaveAnalyzer, GannAnalyzer,
    GannResult, HarmonicPatternAnalyzer, HarmonicResult, PivotDetector, PriceActionAnalyzer,
    PriceActionResult, SentimentSummary,
};
use crate::config::EngineSettings;
use crate::error::{AnalysisError, Result};
use crate::indicators::{IndicatorBank, IndicatorSnapshot};
use crate::models::{Candle, CandleData, Outcome};
use crate::processor::job::AnalyzerKind;
use crate::utils::time::{format_time, format_timestamp};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Full output of one engine run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub current_price: f64,
    pub generated_at: DateTime<Utc>,
    pub candle_count: usize,
    pub indicators: Outcome<IndicatorSnapshot>,
    pub elliott: Outcome<ElliottResult>,
    pub gann: Outcome<GannResult>,
    pub harmonic: Outcome<HarmonicResult>,
    pub price_action: Outcome<PriceActionResult>,
    pub confidence: ConfidenceScore,
    pub sentiment: SentimentSummary,
}

impl AnalysisReport {
    /// Analyzers that fell back to their default result, with the reason.
    pub fn degraded(&self) -> Vec<(AnalyzerKind, &str)> {
        let reasons = [
            (AnalyzerKind::Indicators, self.indicators.reason()),
            (AnalyzerKind::Elliott, self.elliott.reason()),
            (AnalyzerKind::Gann, self.gann.reason()),
            (AnalyzerKind::Harmonic, self.harmonic.reason()),
            (AnalyzerKind::PriceAction, self.price_action.reason()),
        ];
        reasons
            .into_iter()
            .filter_map(|(kind, reason)| reason.map(|r| (kind, r)))
            .collect()
    }
}

pub struct AnalysisEngine {
    settings: EngineSettings,
    aggregator: ConfidenceAggregator,
    gann: GannAnalyzer,
    harmonic: HarmonicPatternAnalyzer,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl AnalysisEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            aggregator: ConfidenceAggregator::new(settings.aggregator_weights.clone()),
            gann: GannAnalyzer::new(settings.gann),
            harmonic: HarmonicPatternAnalyzer::with_tolerance(settings.harmonic_tolerance),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Validate the series and run every analyzer over it. Only structural
    /// input problems are errors; analyzers that cannot produce a full result
    /// are reported as degraded inside the report.
    #[instrument(skip(self, candles), fields(candles = candles.len()))]
    pub fn run(
        &self,
        candles: &[Candle],
        current_price: f64,
        now: DateTime<Utc>,
    ) -> Result<AnalysisReport> {
        if !(current_price.is_finite() && current_price > 0.0) {
            return Err(AnalysisError::InvalidPrice(current_price));
        }
        let data = CandleData::from_candles(candles)?;

        let ((indicators, elliott), (gann, (harmonic, price_action))) = rayon::join(
            || {
                rayon::join(
                    || IndicatorBank::new(&data).analyze(),
                    || ElliottWaveAnalyzer::analyze(&PivotDetector::default().detect(&data)),
                )
            },
            || {
                rayon::join(
                    || self.gann.analyze(&data, current_price, now),
                    || {
                        rayon::join(
                            || self.harmonic.analyze(&data, current_price),
                            || PriceActionAnalyzer::analyze(&data, current_price),
                        )
                    },
                )
            },
        );

        let inputs = AnalysisInputs {
            current_price,
            indicators: indicators.result(),
            elliott: elliott.result(),
            gann: gann.result(),
            price_action: price_action.result(),
        };
        let confidence = self.aggregator.score(&inputs);
        let sentiment = sentiment(&inputs);

        let report = AnalysisReport {
            current_price,
            generated_at: now,
            candle_count: data.len(),
            indicators,
            elliott,
            gann,
            harmonic,
            price_action,
            confidence,
            sentiment,
        };

        for (kind, reason) in report.degraded() {
            warn!("{} analysis degraded: {}", kind, reason);
        }
        info!(
            "Analyzed {} candles ({} to {}) at {}: confidence {}, sentiment {}",
            report.candle_count,
            format_timestamp(data.time[0]),
            format_timestamp(data.time[data.len() - 1]),
            format_time(&now),
            report.confidence.score,
            report.sentiment.sentiment
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn series(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.2).sin() * 8.0 + i as f64 * 0.05;
                Candle::new(1_600_000_000 + i as i64 * 3600, c - 0.3, c + 1.0, c - 1.0, c, 50.0)
            })
            .collect()
    }

    #[test]
    fn test_invalid_price_rejected() {
        let engine = AnalysisEngine::default();
        assert!(matches!(
            engine.run(&series(30), f64::NAN, now()),
            Err(AnalysisError::InvalidPrice(_))
        ));
        assert!(matches!(
            engine.run(&series(30), 0.0, now()),
            Err(AnalysisError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_empty_series_rejected() {
        let engine = AnalysisEngine::default();
        assert!(matches!(engine.run(&[], 100.0, now()), Err(AnalysisError::EmptySeries)));
    }

    #[test]
    fn test_short_series_reports_degraded_analyzers() {
        let report = AnalysisEngine::default().run(&series(12), 100.0, now()).unwrap();
        let degraded: Vec<AnalyzerKind> = report.degraded().into_iter().map(|(k, _)| k).collect();

        assert!(degraded.contains(&AnalyzerKind::Indicators));
        assert!(degraded.contains(&AnalyzerKind::Gann));
        assert!(degraded.contains(&AnalyzerKind::Harmonic));
        assert!(!degraded.contains(&AnalyzerKind::PriceAction));
        assert!(report.confidence.score <= 100);
    }

    #[test]
    fn test_long_series_runs_every_analyzer() {
        let report = AnalysisEngine::default().run(&series(240), 101.0, now()).unwrap();
        assert_eq!(report.candle_count, 240);
        assert!(!report.indicators.is_degraded());
        assert!(!report.gann.is_degraded());
        assert!(!report.harmonic.is_degraded());
        assert!(!report.elliott.is_degraded());
        assert_eq!(report.generated_at, now());
    }

    #[test]
    fn test_settings_reach_the_analyzers() {
        let settings = EngineSettings {
            aggregator_weights: vec![0.0; 7],
            ..EngineSettings::default()
        };
        let engine = AnalysisEngine::new(settings);
        let report = engine.run(&series(120), 101.0, now()).unwrap();
        assert_eq!(report.confidence.score, 0);
        assert_eq!(engine.settings().harmonic_tolerance, 0.1);
    }
}
