pub mod confidence;
pub mod elliott;
pub mod fibonacci;
pub mod gann;
pub mod harmonic;
pub mod pivots;
pub mod price_action;

pub use self::confidence::{AnalysisInputs, ConfidenceAggregator, ConfidenceScore, SentimentSummary};
pub use self::elliott::{ElliottResult, ElliottWaveAnalyzer};
pub use self::gann::{GannAnalyzer, GannResult, GannWeights};
pub use self::harmonic::{HarmonicPatternAnalyzer, HarmonicResult};
pub use self::pivots::{PivotDetector, PivotKind, PivotPoint};
pub use self::price_action::{PriceActionAnalyzer, PriceActionResult};
