//! Metrics for segmentation evaluation.
//!
//! The [`ConfusionMatrix`] accumulator is the source of truth for per-class
//! IoU and mIoU; the remaining types are views and adapters around it.

pub mod aggregator;
pub mod confusion;
pub mod input;
pub mod iou;
#[cfg(feature = "train")]
pub mod miou;

pub use aggregator::*;
pub use confusion::*;
pub use input::*;
pub use iou::*;
#[cfg(feature = "train")]
pub use miou::*;
