//! Input structures for segmentation metrics.

use burn::{prelude::*, tensor::backend::Backend};

/// Predicted and ground-truth class-id maps for one batch.
///
/// Both tensors are `[batch, height, width]` and hold class ids.
pub struct SegmentationMetricInput<B: Backend> {
    pub predictions: Tensor<B, 3, Int>,
    pub targets: Tensor<B, 3, Int>,
}

impl<B: Backend> SegmentationMetricInput<B> {
    pub const fn new(predictions: Tensor<B, 3, Int>, targets: Tensor<B, 3, Int>) -> Self {
        Self {
            predictions,
            targets,
        }
    }
}
