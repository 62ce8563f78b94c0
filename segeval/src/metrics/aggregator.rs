//! Running mean over per-batch scalars.
//!
//! Used for the validation loss: every batch contributes one value and the
//! mean is taken over batches, not samples.

/// Running sum and count of scalar values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeanAggregator {
    sum: f64,
    count: usize,
}

impl MeanAggregator {
    /// Create an empty aggregator.
    pub const fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    /// Add one value.
    pub fn update(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Sum of all values added so far.
    pub const fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of values added so far.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Mean of the values, or `None` before the first update.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Reset the aggregator.
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::MeanAggregator;

    #[test]
    fn test_mean_over_updates() {
        let mut loss = MeanAggregator::new();
        assert_eq!(loss.mean(), None);

        loss.update(2.0);
        loss.update(4.0);
        assert_eq!(loss.count(), 2);
        assert_eq!(loss.sum(), 6.0);
        assert_eq!(loss.mean(), Some(3.0));

        loss.reset();
        assert_eq!(loss, MeanAggregator::default());
    }
}
