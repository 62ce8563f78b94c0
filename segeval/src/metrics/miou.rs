//! Mean IoU as a Burn training metric.
//!
//! Wraps a [`ConfusionMatrix`] so that the same accumulator used by the
//! evaluator can be plugged into a Burn learner's validation step.

use burn::{
    prelude::*,
    tensor::backend::Backend,
    train::metric::{Metric, MetricEntry, MetricMetadata, Numeric},
};
use std::marker::PhantomData;

use crate::{
    error::SegEvalResult,
    metrics::{confusion::ConfusionMatrix, input::SegmentationMetricInput},
};

#[derive(Config, Debug)]
pub struct MeanIouMetricConfig {
    /// Number of classes, including any excluded ones.
    pub num_classes: usize,
    /// Exclude class 0 from scoring.
    #[config(default = true)]
    pub ignore_first_label: bool,
    /// Exclude the last class from scoring.
    #[config(default = false)]
    pub ignore_last_label: bool,
}

#[derive(Debug, Clone)]
pub struct MeanIouMetric<B: Backend> {
    matrix: ConfusionMatrix,
    ignore_first_label: bool,
    ignore_last_label: bool,
    _b: PhantomData<B>,
}

impl MeanIouMetricConfig {
    pub fn init<B: Backend>(&self) -> SegEvalResult<MeanIouMetric<B>> {
        Ok(MeanIouMetric {
            matrix: ConfusionMatrix::new(self.num_classes)?,
            ignore_first_label: self.ignore_first_label,
            ignore_last_label: self.ignore_last_label,
            _b: PhantomData,
        })
    }
}

impl<B: Backend> MeanIouMetric<B> {
    /// The accumulated confusion matrix.
    pub const fn matrix(&self) -> &ConfusionMatrix {
        &self.matrix
    }

    /// Add one batch to the confusion matrix.
    pub fn accumulate(&mut self, item: &SegmentationMetricInput<B>) -> SegEvalResult<()> {
        self.matrix
            .update(item.targets.clone(), item.predictions.clone())
    }

    fn miou_value(&self) -> f64 {
        self.matrix
            .scores(self.ignore_first_label, self.ignore_last_label)
            .mean_iou()
            .unwrap_or(0.0)
    }
}

impl<B: Backend> Metric for MeanIouMetric<B> {
    type Input = SegmentationMetricInput<B>;

    fn name(&self) -> String {
        "mIoU".to_string()
    }

    fn update(&mut self, item: &Self::Input, _metadata: &MetricMetadata) -> MetricEntry {
        if let Err(err) = self.accumulate(item) {
            panic!("mIoU update failed: {err}");
        }
        let value = self.miou_value();
        MetricEntry::new(self.name(), format!("{value:.3}"), format!("{value:.5}"))
    }

    fn clear(&mut self) {
        self.matrix.reset();
    }
}

impl<B: Backend> Numeric for MeanIouMetric<B> {
    fn value(&self) -> f64 {
        self.miou_value()
    }
}

#[cfg(test)]
mod tests {
    use super::MeanIouMetricConfig;
    use crate::metrics::input::SegmentationMetricInput;
    use burn::backend::ndarray::NdArray;
    use burn::prelude::*;
    use burn::train::metric::{Metric, Numeric};

    type TestBackend = NdArray;

    #[test]
    fn test_metric_accumulates_and_clears() {
        let device = Default::default();
        let mut metric = MeanIouMetricConfig::new(3).init::<TestBackend>().unwrap();

        let targets = Tensor::<TestBackend, 3, Int>::from_data([[[0, 1], [1, 2]]], &device);
        let predictions = Tensor::<TestBackend, 3, Int>::from_data([[[0, 1], [2, 2]]], &device);
        let input = SegmentationMetricInput::new(predictions, targets);

        metric.accumulate(&input).unwrap();
        assert_eq!(metric.name(), "mIoU");
        assert!((metric.value() - 50.0).abs() < 1e-9);
        assert_eq!(metric.matrix().total(), 4);

        metric.clear();
        assert_eq!(metric.matrix().total(), 0);
        assert_eq!(metric.value(), 0.0);
    }
}
