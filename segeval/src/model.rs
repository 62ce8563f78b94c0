//! The inference seam between the evaluator and a segmentation network.

use burn::{
    module::AutodiffModule,
    prelude::*,
    tensor::backend::{AutodiffBackend, Backend},
};

/// A model producing per-class scores for a batch of images.
pub trait SegmentationModel<B: Backend> {
    /// Scores `[batch, num_classes, height, width]` for images
    /// `[batch, channels, height, width]`.
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4>;
}

impl<B, F> SegmentationModel<B> for F
where
    B: Backend,
    F: Fn(Tensor<B, 4>) -> Tensor<B, 4>,
{
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self(images)
    }
}

/// Switch a trained model to inference mode.
///
/// The returned module lives on the inner backend: it records no gradients
/// and training-only layers such as dropout become no-ops. The autodiff
/// model is consumed.
pub fn into_inference_model<B, M>(model: M) -> M::InnerModule
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    model.valid()
}
