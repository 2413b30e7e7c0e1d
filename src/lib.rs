//! Final grade prediction using a random forest
//!
//! Offline training over a CSV of student-activity features, plus the
//! load/parse/predict hooks a model hosting runtime calls per request.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Training CSV location inside the hosting container
pub const DEFAULT_TRAINING_PATH: &str = "/opt/ml/input/data/training/training_data.csv";

/// Directory the hosting runtime hands to the loader
pub const DEFAULT_MODEL_DIR: &str = "/opt/ml/model";

/// Application-wide errors
#[derive(Debug, Error)]
pub enum GradeError {
    #[error("Model file not found at {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Missing required field: {key}")]
    MissingField { key: &'static str },

    #[error("Field {key} is not numeric: {value}")]
    InvalidField { key: &'static str, value: String },

    #[error("Missing column in training data: {0}")]
    MissingColumn(String),

    #[error("Invalid value {value:?} in column {column} at line {line}")]
    InvalidCsvValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Training data contains no rows")]
    EmptyDataset,

    #[error("Got {rows} feature rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("Target at row {row} is not a finite number")]
    NonFiniteTarget { row: usize },

    #[error("Feature {column} at row {row} is not a finite number")]
    NonFiniteFeature { row: usize, column: usize },

    #[error("Feature count mismatch: model expects {expected}, got {found}")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("Feature name mismatch at column {index}: model expects {expected}, got {found}")]
    FeatureNameMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GradeError>;

/// Response body for one inference request: the predicted final grades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prediction(pub Vec<f64>);

impl Prediction {
    /// First (and for single-row requests, only) predicted grade
    pub fn value(&self) -> Option<f64> {
        self.0.first().copied()
    }
}

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub n_estimators: usize,
    pub random_state: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    /// Worker threads for tree fitting (0 = all cores, 1 = sequential)
    pub n_jobs: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            n_estimators: 100,
            random_state: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            n_jobs: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub training_path: String,
    pub model_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            training_path: DEFAULT_TRAINING_PATH.to_string(),
            model_dir: DEFAULT_MODEL_DIR.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GradeError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| GradeError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GradeError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_container_layout() {
        let config = Config::default();
        assert_eq!(config.training.n_estimators, 100);
        assert_eq!(config.training.random_state, 42);
        assert!(config.training.bootstrap);
        assert_eq!(config.training.max_depth, None);
        assert_eq!(config.data.training_path, DEFAULT_TRAINING_PATH);
        assert_eq!(config.data.model_dir, DEFAULT_MODEL_DIR);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.training.n_estimators = 7;
        config.training.max_depth = Some(4);
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded.training.n_estimators, 7);
        assert_eq!(loaded.training.max_depth, Some(4));
        assert_eq!(loaded.data.model_dir, DEFAULT_MODEL_DIR);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[training]\nn_estimators = 10\n").unwrap();
        assert_eq!(config.training.n_estimators, 10);
        assert_eq!(config.training.random_state, 42);
        assert_eq!(config.data.training_path, DEFAULT_TRAINING_PATH);
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::load("/nonexistent/config.toml").unwrap_err();
        assert!(matches!(err, GradeError::Config(_)));
    }

    #[test]
    fn test_prediction_serializes_as_array() {
        let pred = Prediction(vec![72.5]);
        assert_eq!(serde_json::to_string(&pred).unwrap(), "[72.5]");
        assert_eq!(pred.value(), Some(72.5));
    }
}
