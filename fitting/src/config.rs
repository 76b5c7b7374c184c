use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::early_stop::{DEFAULT_EPSILON, DEFAULT_PATIENCE};
use crate::error::{FitError, Result};

/// Top-level fit configuration, keyed the same way as the YAML configs
/// (`TRAIN.*`, `DATASET.*`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FitConfig {
    #[serde(default)]
    pub train: TrainConfig,
    pub dataset: DatasetConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TrainConfig {
    /// Upper bound on optimization steps.
    #[serde(default = "default_max_epoch")]
    pub max_epoch: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Let the optimizer update shape coefficients.
    #[serde(default = "default_true")]
    pub optimize_shape: bool,
    /// Let the optimizer update the global scale.
    #[serde(default = "default_true")]
    pub optimize_scale: bool,
    /// Scalar metrics are written every `write` epochs.
    #[serde(default = "default_write")]
    pub write: usize,
    /// Seed for the shape initialization. Unseeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_early_stop_eps")]
    pub early_stop_eps: f64,
    #[serde(default = "default_early_stop_patience")]
    pub early_stop_patience: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DatasetConfig {
    /// (model joint, dataset joint) correspondences.
    pub data_map: Vec<(usize, usize)>,
}

fn default_max_epoch() -> usize {
    500
}

fn default_learning_rate() -> f64 {
    2e-2
}

fn default_true() -> bool {
    true
}

fn default_write() -> usize {
    1
}

fn default_early_stop_eps() -> f64 {
    DEFAULT_EPSILON
}

fn default_early_stop_patience() -> usize {
    DEFAULT_PATIENCE
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_epoch: default_max_epoch(),
            learning_rate: default_learning_rate(),
            optimize_shape: true,
            optimize_scale: true,
            write: default_write(),
            seed: None,
            early_stop_eps: default_early_stop_eps(),
            early_stop_patience: default_early_stop_patience(),
        }
    }
}

impl FitConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.train.validate()?;
        if self.dataset.data_map.is_empty() {
            return Err(FitError::EmptyJointMap);
        }
        Ok(())
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_epoch == 0 {
            return Err(FitError::Config("MAX_EPOCH must be at least 1".into()));
        }
        if self.write == 0 {
            return Err(FitError::Config("WRITE must be at least 1".into()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(FitError::Config(format!(
                "LEARNING_RATE must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = FitConfig::from_json(
            r#"{
                "TRAIN": {
                    "MAX_EPOCH": 1000,
                    "LEARNING_RATE": 0.05,
                    "OPTIMIZE_SHAPE": false,
                    "OPTIMIZE_SCALE": true,
                    "WRITE": 10,
                    "SEED": 7,
                    "EARLY_STOP_EPS": -0.01,
                    "EARLY_STOP_PATIENCE": 4
                },
                "DATASET": { "DATA_MAP": [[0, 1], [2, 3]] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.train.max_epoch, 1000);
        assert_eq!(config.train.learning_rate, 0.05);
        assert!(!config.train.optimize_shape);
        assert!(config.train.optimize_scale);
        assert_eq!(config.train.write, 10);
        assert_eq!(config.train.seed, Some(7));
        assert_eq!(config.train.early_stop_eps, -0.01);
        assert_eq!(config.train.early_stop_patience, 4);
        assert_eq!(config.dataset.data_map, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn test_train_section_defaults() {
        let config = FitConfig::from_json(r#"{ "DATASET": { "DATA_MAP": [[0, 0]] } }"#).unwrap();

        assert_eq!(config.train.max_epoch, 500);
        assert_eq!(config.train.write, 1);
        assert!(config.train.optimize_shape);
        assert!(config.train.optimize_scale);
        assert_eq!(config.train.seed, None);
        assert_eq!(config.train.early_stop_eps, DEFAULT_EPSILON);
        assert_eq!(config.train.early_stop_patience, DEFAULT_PATIENCE);
    }

    #[test]
    fn test_partial_train_section() {
        let config = FitConfig::from_json(
            r#"{ "TRAIN": { "MAX_EPOCH": 20 }, "DATASET": { "DATA_MAP": [[0, 0]] } }"#,
        )
        .unwrap();

        assert_eq!(config.train.max_epoch, 20);
        assert_eq!(config.train.learning_rate, 2e-2);
    }

    #[test]
    fn test_missing_dataset_is_rejected() {
        let result = FitConfig::from_json(r#"{ "TRAIN": {} }"#);
        assert!(matches!(result, Err(FitError::Json(_))));
    }

    #[test]
    fn test_empty_data_map_is_rejected() {
        let result = FitConfig::from_json(r#"{ "DATASET": { "DATA_MAP": [] } }"#);
        assert!(matches!(result, Err(FitError::EmptyJointMap)));
    }

    #[test]
    fn test_zero_write_interval_is_rejected() {
        let result = FitConfig::from_json(
            r#"{ "TRAIN": { "WRITE": 0 }, "DATASET": { "DATA_MAP": [[0, 0]] } }"#,
        );
        assert!(matches!(result, Err(FitError::Config(_))));
    }

    #[test]
    fn test_non_positive_learning_rate_is_rejected() {
        let mut train = TrainConfig::default();
        train.learning_rate = 0.0;
        assert!(train.validate().is_err());

        train.learning_rate = f64::NAN;
        assert!(train.validate().is_err());
    }

    #[test]
    fn test_shipped_identity_config() {
        let config = FitConfig::from_json(include_str!("../configs/identity.json")).unwrap();
        assert_eq!(config.dataset.data_map.len(), body::SMPL_NUM_JOINTS);
        assert!(config.dataset.data_map.iter().all(|(a, b)| a == b));
    }
}
