//! Pixel-wise cross-entropy for multi-class segmentation.

use burn::{
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    prelude::*,
    tensor::{backend::Backend, Int, Tensor},
};

use super::SegmentationLoss;

/// Configuration for the pixel-wise cross-entropy loss.
#[derive(Config, Debug)]
pub struct PixelCrossEntropyLossConfig {
    /// Label smoothing factor in `[0, 1]`.
    #[config(default = "None")]
    pub smoothing: Option<f32>,
}

/// Cross-entropy averaged over every pixel of the batch.
#[derive(Module, Debug)]
pub struct PixelCrossEntropyLoss<B: Backend> {
    pub ce_loss: CrossEntropyLoss<B>,
}

impl PixelCrossEntropyLossConfig {
    /// Initialize a new pixel-wise cross-entropy loss.
    pub fn init<B: Backend>(&self, device: &B::Device) -> PixelCrossEntropyLoss<B> {
        PixelCrossEntropyLoss {
            ce_loss: CrossEntropyLossConfig::new()
                .with_smoothing(self.smoothing)
                .init(device),
        }
    }
}

impl<B: Backend> PixelCrossEntropyLoss<B> {
    /// Create a new loss with the default configuration.
    pub fn new(device: &B::Device) -> Self {
        PixelCrossEntropyLossConfig::new().init(device)
    }

    /// Calculate the mean cross-entropy over all pixels.
    ///
    /// # Arguments
    /// * `scores` - Unnormalized class scores `[batch, num_classes, height, width]`
    /// * `targets` - Class ids `[batch, height, width]`
    pub fn forward(&self, scores: Tensor<B, 4>, targets: Tensor<B, 3, Int>) -> Tensor<B, 1> {
        let [batch_size, num_classes, height, width] = scores.dims();
        let pixels = batch_size * height * width;

        // [N, C, H, W] -> [N*H*W, C]
        let logits = scores.permute([0, 2, 3, 1]).reshape([pixels, num_classes]);
        let targets = targets.reshape([pixels]);

        self.ce_loss.forward(logits, targets)
    }
}

impl<B: Backend> SegmentationLoss<B> for PixelCrossEntropyLoss<B> {
    fn forward(&self, scores: Tensor<B, 4>, targets: Tensor<B, 3, Int>) -> Tensor<B, 1> {
        Self::forward(self, scores, targets)
    }
}

#[cfg(test)]
mod tests {
    use super::PixelCrossEntropyLoss;
    use crate::losses::SegmentationLoss;
    use burn::backend::ndarray::NdArray;
    use burn::prelude::*;

    type TestBackend = NdArray;

    #[test]
    fn test_uniform_scores_give_log_num_classes() {
        let device = Default::default();
        let loss = PixelCrossEntropyLoss::<TestBackend>::new(&device);

        let scores = Tensor::<TestBackend, 4>::zeros([2, 3, 2, 2], &device);
        let targets = Tensor::<TestBackend, 3, Int>::zeros([2, 2, 2], &device);

        let value: f32 = loss.forward(scores, targets).into_scalar().elem();
        assert!((value - 3f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_confident_correct_scores_give_small_loss() {
        let device = Default::default();
        let loss = PixelCrossEntropyLoss::<TestBackend>::new(&device);

        // Class 1 everywhere, scored far above the others.
        let scores = Tensor::<TestBackend, 4>::from_data(
            [[[[0.0, 0.0]], [[20.0, 20.0]]]],
            &device,
        );
        let targets = Tensor::<TestBackend, 3, Int>::ones([1, 1, 2], &device);

        let value: f32 = SegmentationLoss::forward(&loss, scores, targets)
            .into_scalar()
            .elem();
        assert!(value < 1e-6);
    }
}
