//! Configuration for the evaluation binary.

use std::path::PathBuf;

use segeval::{DatasetConfig, FcnConfig, CITYSCAPES_CLASSES};
use serde::{Deserialize, Serialize};

/// Configuration for an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationAppConfig {
    /// Model name; the report is written to `<result_dir>/<model>.csv`.
    pub model: String,
    /// Path to the trained weights (`.mpk`).
    pub weights: PathBuf,
    /// Network architecture.
    pub network: FcnConfig,
    /// Test split and class layout.
    pub dataset: DatasetConfig,
    /// Run inference in half precision.
    pub amp_enabled: bool,
    /// Batch size for evaluation.
    pub batch_size: usize,
    /// Number of workers for data loading.
    pub num_workers: usize,
    /// Measure inference throughput.
    pub eval_fps: bool,
    /// Directory receiving the CSV report.
    pub result_dir: PathBuf,
}

impl Default for EvaluationAppConfig {
    fn default() -> Self {
        let num_classes = CITYSCAPES_CLASSES.len();
        Self {
            model: "fcn".to_string(),
            weights: PathBuf::from("checkpoints/fcn.mpk"),
            network: FcnConfig::new(num_classes),
            dataset: DatasetConfig::new(num_classes),
            amp_enabled: false,
            batch_size: 4,
            num_workers: 4,
            eval_fps: true,
            result_dir: PathBuf::from("result"),
        }
    }
}

impl EvaluationAppConfig {
    /// Check the settings that span more than one section.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.model.is_empty() {
            anyhow::bail!("Model name must not be empty");
        }
        if self.batch_size == 0 {
            anyhow::bail!("Batch size must be greater than 0");
        }
        if self.network.num_classes != self.dataset.num_classes {
            anyhow::bail!(
                "Network predicts {} classes but the dataset has {}",
                self.network.num_classes,
                self.dataset.num_classes
            );
        }
        self.network.validate()?;
        self.dataset.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::EvaluationAppConfig;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        let config = EvaluationAppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.result_dir, PathBuf::from("result"));
        assert!(config.eval_fps);
        assert!(!config.amp_enabled);
    }

    #[test]
    fn test_class_count_mismatch() {
        let mut config = EvaluationAppConfig::default();
        config.network.num_classes = 19;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = EvaluationAppConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = EvaluationAppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EvaluationAppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.weights, config.weights);
        assert_eq!(parsed.network.num_classes, config.network.num_classes);
        assert_eq!(parsed.dataset.root, config.dataset.root);
        assert_eq!(parsed.batch_size, config.batch_size);
    }
}
