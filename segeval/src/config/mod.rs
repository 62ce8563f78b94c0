//! Configuration for segmentation evaluation.
//!
//! - `core`: evaluator and dataset configuration structures
//! - `enums`: enumeration types used in those configurations

pub mod core;
pub mod enums;

pub use self::core::{DatasetConfig, EvaluatorConfig};
pub use enums::Precision;
