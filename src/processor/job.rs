use serde::{Deserialize, Serialize};
use std::fmt;

/// The analyzers the engine runs for every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    Indicators,
    Elliott,
    Gann,
    Harmonic,
    PriceAction,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 5] = [
        AnalyzerKind::Indicators,
        AnalyzerKind::Elliott,
        AnalyzerKind::Gann,
        AnalyzerKind::Harmonic,
        AnalyzerKind::PriceAction,
    ];
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerKind::Indicators => write!(f, "indicators"),
            AnalyzerKind::Elliott => write!(f, "elliott"),
            AnalyzerKind::Gann => write!(f, "gann"),
            AnalyzerKind::Harmonic => write!(f, "harmonic"),
            AnalyzerKind::PriceAction => write!(f, "price_action"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_report_keys() {
        let names: Vec<String> = AnalyzerKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["indicators", "elliott", "gann", "harmonic", "price_action"]);
        assert_eq!(serde_json::to_string(&AnalyzerKind::PriceAction).unwrap(), "\"price_action\"");
    }
}
