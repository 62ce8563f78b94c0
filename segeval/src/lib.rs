//! # segeval
//!
//! Evaluation of semantic-segmentation models with Burn: per-class
//! Intersection-over-Union, mean IoU, validation loss and inference
//! throughput.
//!
//! The core is [`ConfusionMatrix`], a running count of ground-truth versus
//! predicted classes, and [`Evaluator`], which drives a model over a test set
//! and feeds the matrix batch by batch. Datasets, models, losses and the CSV
//! report are thin collaborators around them.
//!
//! ```rust,ignore
//! use segeval::{Evaluator, EvaluatorConfig, FcnConfig, PixelCrossEntropyLoss};
//!
//! let model = FcnConfig::new(20).load::<B>(&weights, &device)?;
//! let evaluator = Evaluator::new(
//!     model,
//!     PixelCrossEntropyLoss::new(&device),
//!     EvaluatorConfig::new(20),
//!     device,
//! )?;
//! let result = evaluator.evaluate(batches)?;
//! println!("mIoU: {:?}", result.mean_iou());
//! ```

mod classes;
mod config;
mod dataset;
mod error;
mod evaluation;
mod losses;
mod metrics;
mod model;
mod models;
mod report;
mod timing;


pub use classes::{ClassNames, CITYSCAPES_CLASSES};
pub use config::{DatasetConfig, EvaluatorConfig, Precision};
pub use dataset::*;
pub use error::{SegEvalError, SegEvalResult};
pub use evaluation::{EvaluationResult, Evaluator};
pub use losses::{PixelCrossEntropyLoss, PixelCrossEntropyLossConfig, SegmentationLoss};
pub use metrics::{ConfusionMatrix, IouScores, MeanAggregator, SegmentationMetricInput};
#[cfg(feature = "train")]
pub use metrics::{MeanIouMetric, MeanIouMetricConfig};
pub use model::{into_inference_model, SegmentationModel};
pub use models::{ConvBlock, ConvBlockConfig, Fcn, FcnConfig, FcnRecord};
pub use report::{report_path, save_report, write_report};
pub use timing::InferenceTimer;
