//! # Model Architectures
//!
//! - `fcn`: a compact fully-convolutional segmentation network.

pub mod fcn;

pub use fcn::{ConvBlock, ConvBlockConfig, Fcn, FcnConfig, FcnRecord};
