use crate::classify::KeywordTable;
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the analysis engine. Every field has a default, so a config
/// file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Category tier uses a pie chart when `1 < groups < pie_max_groups`
    pub pie_max_groups: usize,
    /// Below this many data rows the report flags a small sample
    pub small_sample_rows: usize,
    /// Above this many data rows the report suggests a pivot table
    pub large_sample_rows: usize,
    pub identity_breakdowns: bool,
    pub numeric_statistics: bool,
    pub keywords: KeywordTable,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pie_max_groups: 7,
            small_sample_rows: 10,
            large_sample_rows: 100,
            identity_breakdowns: true,
            numeric_statistics: true,
            keywords: KeywordTable::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.pie_max_groups < 3 {
            return Err(AnalysisError::Config {
                reason: "pie_max_groups must be at least 3".to_string(),
            });
        }
        if self.large_sample_rows < self.small_sample_rows {
            return Err(AnalysisError::Config {
                reason: "large_sample_rows must not be smaller than small_sample_rows".to_string(),
            });
        }
        Ok(())
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.pie_max_groups, 7);
        assert!(config.identity_breakdowns);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = AnalysisConfig::from_json_str(r#"{"pie_max_groups": 5}"#).unwrap();
        assert_eq!(config.pie_max_groups, 5);
        assert_eq!(config.small_sample_rows, 10);
        assert_eq!(config.keywords, KeywordTable::default());
    }

    #[test]
    fn test_rejects_tiny_pie_bound() {
        let err = AnalysisConfig::from_json_str(r#"{"pie_max_groups": 2}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::Config { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"identity_breakdowns": false}}"#).unwrap();
        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert!(!config.identity_breakdowns);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AnalysisConfig::from_file("/nonexistent/sheet-insight.json").unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
