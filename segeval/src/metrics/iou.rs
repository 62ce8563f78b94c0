//! Per-class IoU scores derived from a confusion matrix.
//!
//! Scores are a snapshot: they borrow nothing from the accumulator that
//! produced them, so the accumulator can keep counting afterwards.

/// Per-class Intersection-over-Union values, expressed as percentages.
///
/// `per_class[i]` belongs to class id `first_class + i`. A class whose union is
/// empty (no ground-truth and no predicted pixels over the whole run) has no
/// defined IoU and is stored as `None`; such classes do not take part in the
/// mean.
#[derive(Debug, Clone, PartialEq)]
pub struct IouScores {
    first_class: usize,
    per_class: Vec<Option<f64>>,
    mean_iou: Option<f64>,
}

impl IouScores {
    /// Build scores for consecutive class ids starting at `first_class`.
    pub fn new(first_class: usize, per_class: Vec<Option<f64>>) -> Self {
        let defined: Vec<f64> = per_class.iter().flatten().copied().collect();
        let mean_iou = if defined.is_empty() {
            None
        } else {
            Some(defined.iter().sum::<f64>() / defined.len() as f64)
        };

        Self {
            first_class,
            per_class,
            mean_iou,
        }
    }

    /// Id of the first reported class.
    pub const fn first_class(&self) -> usize {
        self.first_class
    }

    /// IoU per reported class, in class-id order.
    pub fn per_class(&self) -> &[Option<f64>] {
        &self.per_class
    }

    /// Mean IoU over every class with a defined IoU.
    pub const fn mean_iou(&self) -> Option<f64> {
        self.mean_iou
    }

    /// Number of reported classes.
    pub fn len(&self) -> usize {
        self.per_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_class.is_empty()
    }

    /// IoU of a class looked up by its absolute id.
    ///
    /// Returns `None` both for excluded classes and for classes without a
    /// defined IoU.
    pub fn get(&self, class_id: usize) -> Option<f64> {
        class_id
            .checked_sub(self.first_class)
            .and_then(|index| self.per_class.get(index).copied().flatten())
    }

    /// Iterate `(class_id, iou)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<f64>)> + '_ {
        self.per_class
            .iter()
            .enumerate()
            .map(move |(index, iou)| (self.first_class + index, *iou))
    }
}

#[cfg(test)]
mod tests {
    use super::IouScores;

    #[test]
    fn test_mean_skips_undefined_classes() {
        let scores = IouScores::new(1, vec![Some(50.0), None, Some(100.0)]);

        assert_eq!(scores.len(), 3);
        assert_eq!(scores.mean_iou(), Some(75.0));
    }

    #[test]
    fn test_all_undefined_has_no_mean() {
        let scores = IouScores::new(0, vec![None, None]);
        assert_eq!(scores.mean_iou(), None);

        let empty = IouScores::new(1, Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.mean_iou(), None);
    }

    #[test]
    fn test_lookup_by_class_id() {
        let scores = IouScores::new(1, vec![Some(10.0), Some(20.0)]);

        assert_eq!(scores.get(0), None);
        assert_eq!(scores.get(1), Some(10.0));
        assert_eq!(scores.get(2), Some(20.0));
        assert_eq!(scores.get(3), None);

        let ids: Vec<usize> = scores.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
