//! The evaluation loop.
//!
//! One pass of a model over a test set: every batch is run through the model,
//! its loss added to a running sum and its argmax map counted into a single
//! [`ConfusionMatrix`]. Batches are consumed strictly in iteration order and
//! the first error aborts the run.

use std::time::Duration;

use burn::{
    prelude::*,
    tensor::{backend::Backend, ElementConversion, Int, Tensor},
};
use tracing::{debug, info, warn};

use crate::{
    config::EvaluatorConfig,
    dataset::SegmentationBatch,
    error::{SegEvalError, SegEvalResult},
    losses::SegmentationLoss,
    metrics::{ConfusionMatrix, IouScores, MeanAggregator},
    model::SegmentationModel,
    timing::InferenceTimer,
};

/// Outcome of one evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    /// Validation loss averaged over batches.
    pub mean_loss: f64,
    /// Per-class IoU (percent) and mIoU.
    pub scores: IouScores,
    /// Inference throughput in samples per second; 0 when not measured.
    pub fps: f64,
    /// Number of batches evaluated.
    pub num_batches: usize,
    /// Number of samples evaluated.
    pub num_samples: usize,
    /// Total time spent in timed inference.
    pub inference_time: Duration,
}

impl EvaluationResult {
    /// Mean IoU over every class with a defined IoU.
    pub const fn mean_iou(&self) -> Option<f64> {
        self.scores.mean_iou()
    }
}

/// Runs a model over a test set and scores it.
///
/// The model must already be in inference mode; see
/// [`into_inference_model`](crate::model::into_inference_model).
pub struct Evaluator<B: Backend, M, L> {
    model: M,
    loss: L,
    config: EvaluatorConfig,
    device: B::Device,
}

impl<B, M, L> Evaluator<B, M, L>
where
    B: Backend,
    M: SegmentationModel<B>,
    L: SegmentationLoss<B>,
{
    /// Create an evaluator running on `device`.
    pub fn new(model: M, loss: L, config: EvaluatorConfig, device: B::Device) -> SegEvalResult<Self> {
        config.validate()?;

        if !config.precision.is_provided_by::<B>() {
            warn!(
                requested = ?config.precision,
                "backend float precision differs from the requested inference precision"
            );
        }

        Ok(Self {
            model,
            loss,
            config,
            device,
        })
    }

    pub const fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Evaluate every batch yielded by `batches`.
    ///
    /// Fails with [`SegEvalError::EmptyDataset`] when no batch is yielded and
    /// with [`SegEvalError::InvalidTensorShape`] when a batch's images and
    /// targets disagree.
    pub fn evaluate<I>(&self, batches: I) -> SegEvalResult<EvaluationResult>
    where
        I: IntoIterator<Item = SegmentationBatch<B>>,
    {
        let mut matrix = ConfusionMatrix::new(self.config.num_classes)?;
        let mut loss = MeanAggregator::new();
        let mut timer = InferenceTimer::new(self.config.measure_fps);
        let mut num_samples = 0;

        for (index, batch) in batches.into_iter().enumerate() {
            let SegmentationBatch { images, targets } = batch;

            let targets = self.target_class_ids(targets, images.dims())?;
            let images = images.to_device(&self.device);
            let targets = targets.to_device(&self.device);
            let batch_size = images.dims()[0];

            let scores = timer.time::<B, _>(&self.device, || self.model.forward(images));

            let batch_loss = self
                .loss
                .forward(scores.clone(), targets.clone())
                .into_scalar()
                .elem::<f64>();
            loss.update(batch_loss);

            let predicted = scores.argmax(1).squeeze::<3>(1);
            matrix.update(targets, predicted)?;

            num_samples += batch_size;
            debug!(batch = index, batch_size, loss = batch_loss, "evaluated batch");
        }

        let mean_loss = loss.mean().ok_or(SegEvalError::EmptyDataset)?;
        let scores = matrix.scores(self.config.ignore_first_label, self.config.ignore_last_label);
        let fps = timer.throughput(num_samples);

        let result = EvaluationResult {
            mean_loss,
            scores,
            fps,
            num_batches: loss.count(),
            num_samples,
            inference_time: timer.elapsed(),
        };

        info!(
            batches = result.num_batches,
            samples = result.num_samples,
            loss = result.mean_loss,
            miou = ?result.mean_iou(),
            fps = result.fps,
            "evaluation completed"
        );
        Ok(result)
    }

    /// Turn normalized `[N, 1, H, W]` targets into `[N, H, W]` class ids.
    fn target_class_ids(
        &self,
        targets: Tensor<B, 4>,
        image_dims: [usize; 4],
    ) -> SegEvalResult<Tensor<B, 3, Int>> {
        let [batch_size, channels, height, width] = targets.dims();
        if channels != 1
            || batch_size != image_dims[0]
            || height != image_dims[2]
            || width != image_dims[3]
        {
            return Err(SegEvalError::InvalidTensorShape {
                expected: format!("[{}, 1, {}, {}]", image_dims[0], image_dims[2], image_dims[3]),
                actual: format!("{:?}", targets.dims()),
            });
        }

        Ok(targets
            .mul_scalar(self.config.label_scale)
            .round()
            .int()
            .squeeze::<3>(1))
    }
}

#[cfg(test)]
mod tests {
    use super::Evaluator;
    use crate::config::{EvaluatorConfig, Precision};
    use crate::dataset::SegmentationBatch;
    use crate::error::SegEvalError;
    use crate::losses::PixelCrossEntropyLoss;
    use burn::backend::ndarray::NdArray;
    use burn::prelude::*;
    use std::cell::Cell;

    type TestBackend = NdArray;

    const NUM_CLASSES: usize = 3;

    /// Scores class `k` as `-(x - k)^2` where `x` is the first image channel,
    /// so the argmax recovers whatever label was written into the image.
    fn label_echo_model(images: Tensor<TestBackend, 4>) -> Tensor<TestBackend, 4> {
        let [n, _, h, w] = images.dims();
        let labels = images.slice([0..n, 0..1, 0..h, 0..w]);
        let scores = (0..NUM_CLASSES)
            .map(|class| {
                labels
                    .clone()
                    .sub_scalar(class as f32)
                    .powf_scalar(2.0)
                    .neg()
            })
            .collect();
        Tensor::cat(scores, 1)
    }

    /// A batch whose images carry `image_labels` and whose targets carry
    /// `target_labels`, both `[n, h, w]` class ids.
    fn batch(
        image_labels: &[f32],
        target_labels: &[f32],
        dims: [usize; 3],
    ) -> SegmentationBatch<TestBackend> {
        let device = Default::default();
        let [n, h, w] = dims;
        let images = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(image_labels.to_vec(), [n, 1, h, w]),
            &device,
        )
        .repeat_dim(1, 3);
        let targets = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(target_labels.to_vec(), [n, 1, h, w]),
            &device,
        )
        .div_scalar(255.0);
        SegmentationBatch::new(images, targets)
    }

    fn zero_loss(
        _scores: Tensor<TestBackend, 4>,
        _targets: Tensor<TestBackend, 3, Int>,
    ) -> Tensor<TestBackend, 1> {
        Tensor::zeros([1], &Default::default())
    }

    #[test]
    fn test_three_class_scenario() {
        let evaluator = Evaluator::new(
            label_echo_model,
            zero_loss,
            EvaluatorConfig::new(NUM_CLASSES),
            Default::default(),
        )
        .unwrap();

        let result = evaluator
            .evaluate(vec![batch(&[0., 1., 2., 2.], &[0., 1., 1., 2.], [1, 2, 2])])
            .unwrap();

        assert_eq!(result.scores.first_class(), 1);
        assert_eq!(result.scores.per_class(), &[Some(50.0), Some(50.0)]);
        assert_eq!(result.mean_iou(), Some(50.0));
        assert_eq!(result.num_batches, 1);
        assert_eq!(result.num_samples, 1);
    }

    #[test]
    fn test_perfect_predictions_score_100() {
        let evaluator = Evaluator::new(
            label_echo_model,
            PixelCrossEntropyLoss::new(&Default::default()),
            EvaluatorConfig::new(NUM_CLASSES).with_measure_fps(false),
            Default::default(),
        )
        .unwrap();

        let labels = [0., 1., 2., 1., 2., 2., 0., 1.];
        let result = evaluator
            .evaluate(vec![batch(&labels, &labels, [2, 2, 2])])
            .unwrap();

        assert_eq!(result.scores.per_class(), &[Some(100.0), Some(100.0)]);
        assert_eq!(result.mean_iou(), Some(100.0));
        assert!(result.mean_loss.is_finite());
    }

    #[test]
    fn test_mean_loss_over_batches() {
        let calls = Cell::new(0usize);
        let losses = [2.0f32, 4.0];
        let loss = |_scores: Tensor<TestBackend, 4>, _targets: Tensor<TestBackend, 3, Int>| {
            let value = losses[calls.get()];
            calls.set(calls.get() + 1);
            Tensor::<TestBackend, 1>::from_floats([value], &Default::default())
        };

        let evaluator = Evaluator::new(
            label_echo_model,
            loss,
            EvaluatorConfig::new(NUM_CLASSES),
            Default::default(),
        )
        .unwrap();

        let labels = [0., 1., 2., 1.];
        let result = evaluator
            .evaluate(vec![
                batch(&labels, &labels, [1, 2, 2]),
                batch(&labels, &labels, [1, 2, 2]),
            ])
            .unwrap();

        assert_eq!(result.mean_loss, 3.0);
        assert_eq!(result.num_batches, 2);
    }

    #[test]
    fn test_fps_is_zero_when_not_measured() {
        let slow_model = |images: Tensor<TestBackend, 4>| {
            std::thread::sleep(std::time::Duration::from_millis(5));
            label_echo_model(images)
        };
        let evaluator = Evaluator::new(
            slow_model,
            zero_loss,
            EvaluatorConfig::new(NUM_CLASSES).with_measure_fps(false),
            Default::default(),
        )
        .unwrap();

        let labels = [0., 1., 2., 1.];
        let result = evaluator
            .evaluate(vec![batch(&labels, &labels, [1, 2, 2])])
            .unwrap();

        assert_eq!(result.fps, 0.0);
        assert_eq!(result.inference_time, std::time::Duration::ZERO);
    }

    #[test]
    fn test_fps_counts_samples_not_batches() {
        let slow_model = |images: Tensor<TestBackend, 4>| {
            std::thread::sleep(std::time::Duration::from_millis(5));
            label_echo_model(images)
        };
        let evaluator = Evaluator::new(
            slow_model,
            zero_loss,
            EvaluatorConfig::new(NUM_CLASSES),
            Default::default(),
        )
        .unwrap();

        let labels = [0., 1., 2., 1., 2., 2., 0., 1.];
        let result = evaluator
            .evaluate(vec![batch(&labels, &labels, [2, 2, 2])])
            .unwrap();

        let expected = 2.0 / result.inference_time.as_secs_f64();
        assert!(result.fps > 0.0);
        assert!((result.fps - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        let evaluator = Evaluator::new(
            label_echo_model,
            zero_loss,
            EvaluatorConfig::new(NUM_CLASSES),
            Default::default(),
        )
        .unwrap();

        assert!(matches!(
            evaluator.evaluate(Vec::new()),
            Err(SegEvalError::EmptyDataset)
        ));
    }

    #[test]
    fn test_target_batch_mismatch_is_an_error() {
        let evaluator = Evaluator::new(
            label_echo_model,
            zero_loss,
            EvaluatorConfig::new(NUM_CLASSES),
            Default::default(),
        )
        .unwrap();

        let device = Default::default();
        let mismatched = SegmentationBatch::new(
            Tensor::<TestBackend, 4>::zeros([2, 3, 2, 2], &device),
            Tensor::<TestBackend, 4>::zeros([1, 1, 2, 2], &device),
        );

        assert!(matches!(
            evaluator.evaluate(vec![mismatched]),
            Err(SegEvalError::InvalidTensorShape { .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = Evaluator::<TestBackend, _, _>::new(
            label_echo_model,
            zero_loss,
            EvaluatorConfig::new(0),
            Default::default(),
        );
        assert!(matches!(result, Err(SegEvalError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_half_precision_request_still_evaluates() {
        let evaluator = Evaluator::new(
            label_echo_model,
            zero_loss,
            EvaluatorConfig::new(NUM_CLASSES).with_precision(Precision::Half),
            Default::default(),
        )
        .unwrap();

        let labels = [0., 1., 2., 1.];
        let result = evaluator
            .evaluate(vec![batch(&labels, &labels, [1, 2, 2])])
            .unwrap();
        assert_eq!(result.mean_iou(), Some(100.0));
    }
}
