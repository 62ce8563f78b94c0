//! Segmentation evaluation applications
//!
//! This crate provides the `segeval` command-line tool, which scores a trained
//! segmentation network on a labelled test split and writes the per-class IoU,
//! mIoU, mean loss and inference FPS to a CSV report.
//!
//! ## Usage
//!
//! ```bash
//! # Evaluate with a JSON configuration
//! cargo run --bin segeval -- evaluate --config eval.json
//!
//! # Show the compiled backend
//! cargo run --bin segeval -- info
//! ```

pub mod common;
pub mod config;

// Re-export commonly used items
pub use common::{
    create_device, get_backend_name, setup_logging, SelectedBackend, SelectedDevice,
    SelectedHalfBackend,
};
pub use config::EvaluationAppConfig;
