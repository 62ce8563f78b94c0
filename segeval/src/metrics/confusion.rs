//! Confusion-matrix accumulator for multi-class segmentation.
//!
//! The matrix is kept on the host as `u64` counts, row-major, with the row
//! indexed by ground-truth class and the column by predicted class. Label maps
//! are pulled off the device once per batch and counted sample by sample.

use burn::tensor::{backend::Backend, Int, Tensor};

use crate::{
    error::{SegEvalError, SegEvalResult},
    metrics::iou::IouScores,
};

/// Running confusion matrix over a fixed label set `[0, num_classes)`.
///
/// Counts only ever grow between [`reset`](Self::reset) calls. Scoring is a
/// read-only view: class exclusions never modify the stored counts, so
/// [`scores`](Self::scores) can be called any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    num_classes: usize,
    counts: Vec<u64>,
}

impl ConfusionMatrix {
    /// Create a zero-filled `num_classes × num_classes` matrix.
    pub fn new(num_classes: usize) -> SegEvalResult<Self> {
        if num_classes == 0 {
            return Err(SegEvalError::InvalidConfiguration {
                reason: "Number of classes must be > 0".to_string(),
            });
        }

        Ok(Self {
            num_classes,
            counts: vec![0; num_classes * num_classes],
        })
    }

    pub const fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Number of pixels with ground truth `ground_truth` predicted as `predicted`.
    ///
    /// # Panics
    ///
    /// Panics if either index is not below `num_classes`.
    pub fn count(&self, ground_truth: usize, predicted: usize) -> u64 {
        assert!(
            ground_truth < self.num_classes && predicted < self.num_classes,
            "cell ({ground_truth}, {predicted}) outside a {n}x{n} matrix",
            n = self.num_classes
        );
        self.counts[ground_truth * self.num_classes + predicted]
    }

    /// Sum of all cells, i.e. the number of counted pixels.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Zero every cell.
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    /// Add the counts of another matrix of the same size.
    pub fn merge(&mut self, other: &Self) -> SegEvalResult<()> {
        if other.num_classes != self.num_classes {
            return Err(SegEvalError::InvalidTensorShape {
                expected: format!("{n}x{n} confusion matrix", n = self.num_classes),
                actual: format!("{n}x{n} confusion matrix", n = other.num_classes),
            });
        }

        for (cell, add) in self.counts.iter_mut().zip(&other.counts) {
            *cell += add;
        }
        Ok(())
    }

    /// Accumulate one sample given as flattened label maps.
    ///
    /// Pixels whose ground truth or prediction falls outside
    /// `[0, num_classes)` are not counted.
    pub fn update_sample(&mut self, ground_truth: &[i64], predicted: &[i64]) -> SegEvalResult<()> {
        if ground_truth.len() != predicted.len() {
            return Err(SegEvalError::InvalidTensorShape {
                expected: format!("{} pixels", ground_truth.len()),
                actual: format!("{} pixels", predicted.len()),
            });
        }

        let n = self.num_classes;
        let mut contribution = vec![0u64; n * n];
        for (&gt, &pred) in ground_truth.iter().zip(predicted) {
            if let (Some(row), Some(col)) = (self.class_index(gt), self.class_index(pred)) {
                contribution[row * n + col] += 1;
            }
        }

        for (cell, add) in self.counts.iter_mut().zip(contribution) {
            *cell += add;
        }
        Ok(())
    }

    /// Accumulate a batch given as flattened, batch-major label maps.
    ///
    /// Both slices hold `batch_size` samples of equal length; each sample is
    /// counted independently and its contribution added to the matrix.
    pub fn update_batch(
        &mut self,
        ground_truth: &[i64],
        predicted: &[i64],
        batch_size: usize,
    ) -> SegEvalResult<()> {
        if ground_truth.len() != predicted.len() {
            return Err(SegEvalError::InvalidTensorShape {
                expected: format!("{} labels", ground_truth.len()),
                actual: format!("{} labels", predicted.len()),
            });
        }
        if batch_size == 0 {
            return if ground_truth.is_empty() {
                Ok(())
            } else {
                Err(SegEvalError::InvalidTensorShape {
                    expected: "an empty batch".to_string(),
                    actual: format!("{} labels", ground_truth.len()),
                })
            };
        }
        if ground_truth.len() % batch_size != 0 {
            return Err(SegEvalError::InvalidTensorShape {
                expected: format!("a multiple of {batch_size} labels"),
                actual: format!("{} labels", ground_truth.len()),
            });
        }

        let sample_len = ground_truth.len() / batch_size;
        if sample_len == 0 {
            return Ok(());
        }

        for (gt, pred) in ground_truth
            .chunks_exact(sample_len)
            .zip(predicted.chunks_exact(sample_len))
        {
            self.update_sample(gt, pred)?;
        }
        Ok(())
    }

    /// Accumulate a batch of `[batch, height, width]` label maps.
    ///
    /// Fails with [`SegEvalError::InvalidTensorShape`] when the two tensors
    /// differ in shape, batch dimension included.
    pub fn update<B: Backend>(
        &mut self,
        ground_truth: Tensor<B, 3, Int>,
        predicted: Tensor<B, 3, Int>,
    ) -> SegEvalResult<()> {
        let gt_dims = ground_truth.dims();
        let pred_dims = predicted.dims();
        if gt_dims != pred_dims {
            return Err(SegEvalError::InvalidTensorShape {
                expected: format!("{gt_dims:?}"),
                actual: format!("{pred_dims:?}"),
            });
        }

        let gt = label_map_to_vec(ground_truth)?;
        let pred = label_map_to_vec(predicted)?;
        self.update_batch(&gt, &pred, gt_dims[0])
    }

    /// Per-class IoU and mean IoU over the current counts.
    ///
    /// `ignore_first_label` drops class 0 from every row and column sum before
    /// scoring; `ignore_last_label` then drops the last remaining class. IoU
    /// for class `k` is `M[k,k] / (colsum_k + rowsum_k - M[k,k]) * 100` over
    /// the reduced matrix.
    pub fn scores(&self, ignore_first_label: bool, ignore_last_label: bool) -> IouScores {
        let start = usize::from(ignore_first_label);
        let mut end = self.num_classes;
        if ignore_last_label && end > start {
            end -= 1;
        }

        let per_class = (start..end)
            .map(|k| {
                let true_positive = self.count(k, k);
                let predicted: u64 = (start..end).map(|row| self.count(row, k)).sum();
                let actual: u64 = (start..end).map(|col| self.count(k, col)).sum();
                let union = predicted + actual - true_positive;

                if union == 0 {
                    None
                } else {
                    Some(true_positive as f64 / union as f64 * 100.0)
                }
            })
            .collect();

        IouScores::new(start, per_class)
    }

    fn class_index(&self, label: i64) -> Option<usize> {
        usize::try_from(label)
            .ok()
            .filter(|&class| class < self.num_classes)
    }
}

fn label_map_to_vec<B: Backend>(labels: Tensor<B, 3, Int>) -> SegEvalResult<Vec<i64>> {
    labels
        .into_data()
        .convert::<i64>()
        .into_vec::<i64>()
        .map_err(|e| SegEvalError::TensorOperationFailed {
            operation: format!("reading label map from device: {e:?}"),
        })
}
