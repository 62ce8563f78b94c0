//! Loss functions used to report validation loss.
//!
//! The evaluator only needs a scalar per batch, so any type implementing
//! [`SegmentationLoss`] works, closures included.

pub mod classification;

pub use classification::*;

use burn::{
    prelude::*,
    tensor::{backend::Backend, Int, Tensor},
};

/// A loss over per-pixel class scores.
pub trait SegmentationLoss<B: Backend> {
    /// Loss of `scores` `[batch, num_classes, height, width]` against class-id
    /// `targets` `[batch, height, width]`, as a single-element tensor.
    fn forward(&self, scores: Tensor<B, 4>, targets: Tensor<B, 3, Int>) -> Tensor<B, 1>;
}

impl<B, F> SegmentationLoss<B> for F
where
    B: Backend,
    F: Fn(Tensor<B, 4>, Tensor<B, 3, Int>) -> Tensor<B, 1>,
{
    fn forward(&self, scores: Tensor<B, 4>, targets: Tensor<B, 3, Int>) -> Tensor<B, 1> {
        self(scores, targets)
    }
}
