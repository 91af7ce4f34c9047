use crate::analyzers::confidence::DEFAULT_WEIGHTS;
use crate::analyzers::gann::GannWeights;
use crate::analyzers::harmonic::DEFAULT_TOLERANCE;
use crate::error::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Prefix of environment overrides, e.g. `MSE_HARMONIC_TOLERANCE=0.05` or
/// `MSE_GANN__TREND=0.4`.
pub const ENV_PREFIX: &str = "MSE";

// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub aggregator_weights: Vec<f64>,
    pub gann: GannWeights,
    pub harmonic_tolerance: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            aggregator_weights: DEFAULT_WEIGHTS.to_vec(),
            gann: GannWeights::default(),
            harmonic_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl EngineSettings {
    /// Defaults, overlaid by `path` (any format the `config` crate reads) and
    /// then by `MSE_`-prefixed environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("Loading settings from {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("aggregator_weights"),
        );

        let settings: EngineSettings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.aggregator_weights, vec![0.25, 0.20, 0.20, 0.15, 0.10, 0.05, 0.05]);
        assert_eq!(settings.gann.trend, 0.3);
        assert_eq!(settings.harmonic_tolerance, 0.1);
    }

    #[test]
    fn test_file_overrides_only_named_keys() {
        let path = std::env::temp_dir().join(format!("mse-settings-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{ "harmonic_tolerance": 0.05, "gann": {{ "trend": 0.5 }}, "aggregator_weights": [1.0] }}"#
        )
        .unwrap();

        let settings = EngineSettings::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.harmonic_tolerance, 0.05);
        assert_eq!(settings.gann.trend, 0.5);
        assert_eq!(settings.gann.volatility, 0.2);
        assert_eq!(settings.aggregator_weights, vec![1.0]);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = EngineSettings::load(Some(Path::new("/nonexistent/mse-settings.toml"))).unwrap_err();
        assert!(matches!(err, crate::error::AnalysisError::Config(_)));
    }
}
