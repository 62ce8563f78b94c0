//! Class-id to class-name lookup.

use crate::{
    config::DatasetConfig,
    error::{SegEvalError, SegEvalResult},
};

/// Cityscapes train-id names with the unlabeled class at id 0.
pub const CITYSCAPES_CLASSES: [&str; 20] = [
    "unlabeled",
    "road",
    "sidewalk",
    "building",
    "wall",
    "fence",
    "pole",
    "traffic light",
    "traffic sign",
    "vegetation",
    "terrain",
    "sky",
    "person",
    "rider",
    "car",
    "truck",
    "bus",
    "train",
    "motorcycle",
    "bicycle",
];

/// Human-readable names indexed by class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn cityscapes() -> Self {
        Self::new(CITYSCAPES_CLASSES.iter().map(ToString::to_string).collect())
    }

    /// Names for a dataset configuration.
    ///
    /// Explicit names win; otherwise the Cityscapes table is used when the
    /// class count matches it, and `class_<id>` placeholders when it does not.
    pub fn for_dataset(config: &DatasetConfig) -> Self {
        match &config.class_names {
            Some(names) => Self::new(names.clone()),
            None if config.num_classes == CITYSCAPES_CLASSES.len() => Self::cityscapes(),
            None => Self::new(
                (0..config.num_classes)
                    .map(|id| format!("class_{id}"))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of `class_id`.
    pub fn get(&self, class_id: usize) -> SegEvalResult<&str> {
        self.names
            .get(class_id)
            .map(String::as_str)
            .ok_or(SegEvalError::MissingClassName { class_id })
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassNames, CITYSCAPES_CLASSES};
    use crate::config::DatasetConfig;
    use crate::error::SegEvalError;

    #[test]
    fn test_cityscapes_default() {
        let names = ClassNames::for_dataset(&DatasetConfig::new(CITYSCAPES_CLASSES.len()));

        assert_eq!(names.len(), 20);
        assert_eq!(names.get(0).unwrap(), "unlabeled");
        assert_eq!(names.get(19).unwrap(), "bicycle");
    }

    #[test]
    fn test_explicit_and_placeholder_names() {
        let config = DatasetConfig::new(2)
            .with_class_names(Some(vec!["background".to_string(), "polyp".to_string()]));
        assert_eq!(ClassNames::for_dataset(&config).get(1).unwrap(), "polyp");

        let names = ClassNames::for_dataset(&DatasetConfig::new(3));
        assert_eq!(names.get(2).unwrap(), "class_2");
        assert!(matches!(
            names.get(3),
            Err(SegEvalError::MissingClassName { class_id: 3 })
        ));
    }
}
