//! Core configuration structures for evaluation.

use std::path::PathBuf;

use crate::error::{SegEvalError, SegEvalResult};
use burn::prelude::*;

use super::enums::*;

/// Configuration of one evaluation run.
#[derive(Config, Debug)]
pub struct EvaluatorConfig {
    /// Number of classes the model predicts, including the unlabeled class.
    pub num_classes: usize,
    /// Inference precision.
    #[config(default = "Precision::Full")]
    pub precision: Precision,
    /// Time inference and report frames per second. When off, FPS is 0.
    #[config(default = true)]
    pub measure_fps: bool,
    /// Exclude class 0 (unlabeled) from every score.
    #[config(default = true)]
    pub ignore_first_label: bool,
    /// Exclude the last class from every score.
    #[config(default = false)]
    pub ignore_last_label: bool,
    /// Factor that turns normalized `[0, 1]` targets back into class ids.
    #[config(default = 255.0)]
    pub label_scale: f32,
}

impl EvaluatorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> SegEvalResult<()> {
        if self.num_classes == 0 {
            return Err(SegEvalError::InvalidConfiguration {
                reason: "Number of classes must be > 0".to_string(),
            });
        }
        if !(self.label_scale.is_finite() && self.label_scale > 0.0) {
            return Err(SegEvalError::InvalidConfiguration {
                reason: format!("Label scale must be positive, got {}", self.label_scale),
            });
        }
        Ok(())
    }
}

/// Location and layout of the test split.
///
/// Images are read from `<root>/<split>/im` and label maps with the same file
/// stem from `<root>/<split>/gt`.
#[derive(Config, Debug)]
pub struct DatasetConfig {
    /// Number of classes, including the unlabeled class 0.
    pub num_classes: usize,
    /// Root directory of the dataset.
    #[config(default = "PathBuf::from(\"datasets/cityscapes\")")]
    pub root: PathBuf,
    /// Split to evaluate on.
    #[config(default = "String::from(\"test\")")]
    pub split: String,
    /// Resize images and label maps to `[height, width]`. `None` keeps the
    /// original size, which must then agree across a batch.
    #[config(default = "None")]
    pub image_size: Option<[u32; 2]>,
    /// Human-readable class names indexed by class id.
    #[config(default = "None")]
    pub class_names: Option<Vec<String>>,
}

impl DatasetConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> SegEvalResult<()> {
        if self.num_classes == 0 {
            return Err(SegEvalError::InvalidConfiguration {
                reason: "Number of classes must be > 0".to_string(),
            });
        }
        if let Some(names) = &self.class_names {
            if names.len() != self.num_classes {
                return Err(SegEvalError::InvalidConfiguration {
                    reason: format!(
                        "Expected {} class names, got {}",
                        self.num_classes,
                        names.len()
                    ),
                });
            }
        }
        if let Some([height, width]) = self.image_size {
            if height == 0 || width == 0 {
                return Err(SegEvalError::InvalidConfiguration {
                    reason: format!("Image size must be non-zero, got {height}x{width}"),
                });
            }
        }
        Ok(())
    }

    /// Directory holding the split's images.
    pub fn image_dir(&self) -> PathBuf {
        self.root.join(&self.split).join("im")
    }

    /// Directory holding the split's label maps.
    pub fn label_dir(&self) -> PathBuf {
        self.root.join(&self.split).join("gt")
    }
}
