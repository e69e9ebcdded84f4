use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to write TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for the aggregation engine and category assignment.
///
/// Every key is optional in the TOML file; missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// A category above this share of total spending (percent) is flagged.
    pub overspend_threshold_pct: f64,
    /// An item costing more than this multiple of the mean item is flagged.
    pub anomaly_multiplier: f64,
    /// Report a collapsed categorization only when more items than this share one label.
    pub single_category_min_items: usize,
    /// Label used when the categorizer has no answer for an item.
    pub fallback_category: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            overspend_threshold_pct: 30.0,
            anomaly_multiplier: 2.0,
            single_category_min_items: 3,
            fallback_category: "General Items".to_string(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("overspend_threshold_pct", self.overspend_threshold_pct),
            ("anomaly_multiplier", self.anomaly_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.fallback_category.trim().is_empty() {
            return Err(ConfigError::Invalid("fallback_category must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.overspend_threshold_pct, 30.0);
        assert_eq!(c.anomaly_multiplier, 2.0);
        assert_eq!(c.single_category_min_items, 3);
        assert_eq!(c.fallback_category, "General Items");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = AnalysisConfig::from_toml("overspend_threshold_pct = 40.0\n").unwrap();
        assert_eq!(c.overspend_threshold_pct, 40.0);
        assert_eq!(c.anomaly_multiplier, 2.0);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(AnalysisConfig::from_toml("").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn rejects_negative_threshold() {
        let err = AnalysisConfig::from_toml("anomaly_multiplier = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_blank_fallback() {
        let err = AnalysisConfig::from_toml("fallback_category = '  '").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            AnalysisConfig::from_toml("overspend_threshold_pct = ="),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "single_category_min_items = 5").unwrap();
        writeln!(file, "fallback_category = \"Misc\"").unwrap();
        let c = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(c.single_category_min_items, 5);
        assert_eq!(c.fallback_category, "Misc");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnalysisConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn toml_output_reloads() {
        let c = AnalysisConfig {
            overspend_threshold_pct: 25.0,
            ..AnalysisConfig::default()
        };
        let text = c.to_toml().unwrap();
        assert_eq!(AnalysisConfig::from_toml(&text).unwrap(), c);
    }
}
