//! Test-set loading for segmentation evaluation.
//!
//! Images are normalized with ImageNet statistics; label maps are stored as
//! 8-bit grayscale PNGs whose pixel value is the class id, and are handed to
//! the evaluator normalized to `[0, 1]` exactly as an image loader would
//! produce them. The evaluator scales them back to class ids.

use burn::tensor::{backend::Backend, Tensor};

#[cfg(feature = "dataset")]
pub use loader::*;

/// A batch of images and their normalized label maps.
#[derive(Debug, Clone)]
pub struct SegmentationBatch<B: Backend> {
    /// Images `[batch, 3, height, width]`.
    pub images: Tensor<B, 4>,
    /// Label maps `[batch, 1, height, width]` with values `class_id / 255`.
    pub targets: Tensor<B, 4>,
}

impl<B: Backend> SegmentationBatch<B> {
    pub const fn new(images: Tensor<B, 4>, targets: Tensor<B, 4>) -> Self {
        Self { images, targets }
    }

    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.images.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(feature = "dataset")]
mod loader {
    use std::path::{Path, PathBuf};

    use burn::data::{dataloader::batcher::Batcher, dataset::Dataset};
    use burn::tensor::{backend::Backend, Tensor, TensorData};
    use image::{imageops::FilterType, DynamicImage};
    use walkdir::WalkDir;

    use super::SegmentationBatch;
    use crate::{
        config::DatasetConfig,
        error::{SegEvalError, SegEvalResult},
    };

    /// ImageNet normalization parameters.
    const NORM_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    const NORM_STD: [f32; 3] = [0.229, 0.224, 0.225];

    const VALID_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "PNG", "JPG"];

    /// A single preprocessed sample, kept as host data until batching.
    #[derive(Debug, Clone)]
    pub struct SegmentationItem {
        /// Normalized image `[3, H, W]`.
        pub image: TensorData,
        /// Label map `[1, H, W]` in `[0, 1]`.
        pub target: TensorData,
    }

    /// Stacks items into a [`SegmentationBatch`] on the requested device.
    #[derive(Clone, Default)]
    pub struct SegmentationBatcher<B: Backend> {
        _phantom: std::marker::PhantomData<B>,
    }

    impl<B: Backend> SegmentationBatcher<B> {
        pub const fn new() -> Self {
            Self {
                _phantom: std::marker::PhantomData,
            }
        }
    }

    impl<B: Backend> Batcher<B, SegmentationItem, SegmentationBatch<B>> for SegmentationBatcher<B> {
        fn batch(&self, items: Vec<SegmentationItem>, device: &B::Device) -> SegmentationBatch<B> {
            let mut images = Vec::with_capacity(items.len());
            let mut targets = Vec::with_capacity(items.len());

            for item in items {
                images.push(Tensor::<B, 3>::from_data(item.image, device));
                targets.push(Tensor::<B, 3>::from_data(item.target, device));
            }

            SegmentationBatch::new(Tensor::stack(images, 0), Tensor::stack(targets, 0))
        }
    }

    /// Image/label-map pairs of one dataset split.
    pub struct SegmentationDataset {
        items: Vec<(PathBuf, PathBuf)>,
        image_size: Option<[u32; 2]>,
    }

    impl SegmentationDataset {
        /// Collect the image/label pairs of the configured split.
        pub fn new(config: &DatasetConfig) -> SegEvalResult<Self> {
            config.validate()?;
            let items = collect_pairs(&config.image_dir(), &config.label_dir())?;

            Ok(Self {
                items,
                image_size: config.image_size,
            })
        }

        /// Image/label path pairs in dataset order.
        pub fn pairs(&self) -> &[(PathBuf, PathBuf)] {
            &self.items
        }

        /// Load and preprocess one pair.
        pub fn load(&self, index: usize) -> SegEvalResult<SegmentationItem> {
            let (image_path, label_path) =
                self.items
                    .get(index)
                    .ok_or_else(|| SegEvalError::DatasetError {
                        message: format!("Index {index} out of range for {} items", self.items.len()),
                    })?;

            let image = open_image(image_path)?;
            let label = open_image(label_path)?;

            let (image, label) = match self.image_size {
                Some([height, width]) => (
                    image.resize_exact(width, height, FilterType::Lanczos3),
                    label.resize_exact(width, height, FilterType::Nearest),
                ),
                None => (image, label),
            };

            if image.width() != label.width() || image.height() != label.height() {
                return Err(SegEvalError::InvalidTensorShape {
                    expected: format!("label map of {}x{}", image.height(), image.width()),
                    actual: format!("{}x{} in {}", label.height(), label.width(), label_path.display()),
                });
            }

            Ok(SegmentationItem {
                image: image_to_data(&image),
                target: label_to_data(&label),
            })
        }
    }

    impl Dataset<SegmentationItem> for SegmentationDataset {
        fn get(&self, index: usize) -> Option<SegmentationItem> {
            match self.load(index) {
                Ok(item) => Some(item),
                Err(err) => {
                    tracing::error!(index, error = %err, "failed to load sample");
                    None
                }
            }
        }

        fn len(&self) -> usize {
            self.items.len()
        }
    }

    fn has_valid_extension(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| VALID_EXTENSIONS.contains(&ext))
    }

    /// Pair every image with the label map sharing its file stem.
    fn collect_pairs(image_root: &Path, label_root: &Path) -> SegEvalResult<Vec<(PathBuf, PathBuf)>> {
        if !image_root.is_dir() {
            return Err(SegEvalError::DatasetError {
                message: format!("Image directory does not exist: {}", image_root.display()),
            });
        }
        if !label_root.is_dir() {
            return Err(SegEvalError::DatasetError {
                message: format!("Label directory does not exist: {}", label_root.display()),
            });
        }

        let mut items = Vec::new();
        for entry in WalkDir::new(image_root).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| SegEvalError::DatasetError {
                message: format!("Failed to read directory entry: {e}"),
            })?;
            let image_path = entry.path();
            if !entry.file_type().is_file() || !has_valid_extension(image_path) {
                continue;
            }

            let Some(stem) = image_path.file_stem() else {
                continue;
            };
            let label_path = VALID_EXTENSIONS
                .iter()
                .map(|ext| label_root.join(format!("{}.{ext}", stem.to_string_lossy())))
                .find(|candidate| candidate.is_file());

            match label_path {
                Some(label_path) => items.push((image_path.to_path_buf(), label_path)),
                None => tracing::warn!(path = %image_path.display(), "no label map found for image"),
            }
        }

        if items.is_empty() {
            return Err(SegEvalError::DatasetError {
                message: format!(
                    "No valid image/label pairs found in {}",
                    image_root.display()
                ),
            });
        }

        tracing::info!(
            count = items.len(),
            path = %image_root.display(),
            "found image/label pairs"
        );
        Ok(items)
    }

    fn open_image(path: &Path) -> SegEvalResult<DynamicImage> {
        image::open(path).map_err(|e| SegEvalError::DatasetError {
            message: format!("Failed to open {}: {e}", path.display()),
        })
    }

    /// RGB image to normalized `[3, H, W]` data.
    fn image_to_data(image: &DynamicImage) -> TensorData {
        let image = image.to_rgb32f();
        let (width, height) = image.dimensions();
        let (width, height) = (width as usize, height as usize);

        // HWC to CHW
        let mut chw = vec![0.0f32; 3 * height * width];
        for (pixel_index, pixel) in image.pixels().enumerate() {
            for channel in 0..3 {
                chw[channel * height * width + pixel_index] =
                    (pixel.0[channel] - NORM_MEAN[channel]) / NORM_STD[channel];
            }
        }
        TensorData::new(chw, [3, height, width])
    }

    /// Grayscale label map to `[1, H, W]` data in `[0, 1]`.
    fn label_to_data(label: &DynamicImage) -> TensorData {
        let label = label.to_luma32f();
        let (width, height) = label.dimensions();
        TensorData::new(label.into_raw(), [1, height as usize, width as usize])
    }

    #[cfg(test)]
    mod tests {
        use super::{SegmentationBatcher, SegmentationDataset, SegmentationItem};
        use crate::config::DatasetConfig;
        use crate::error::SegEvalError;
        use burn::backend::ndarray::NdArray;
        use burn::data::{dataloader::batcher::Batcher, dataset::Dataset};
        use burn::prelude::*;
        use image::{GrayImage, Luma, Rgb, RgbImage};
        use std::path::Path;

        type TestBackend = NdArray;

        fn write_pair(root: &Path, stem: &str, labels: [[u8; 2]; 2]) {
            let image_dir = root.join("test").join("im");
            let label_dir = root.join("test").join("gt");
            std::fs::create_dir_all(&image_dir).unwrap();
            std::fs::create_dir_all(&label_dir).unwrap();

            RgbImage::from_pixel(2, 2, Rgb([128, 64, 32]))
                .save(image_dir.join(format!("{stem}.png")))
                .unwrap();
            let mut label = GrayImage::new(2, 2);
            for (y, row) in labels.iter().enumerate() {
                for (x, value) in row.iter().enumerate() {
                    label.put_pixel(x as u32, y as u32, Luma([*value]));
                }
            }
            label.save(label_dir.join(format!("{stem}.png"))).unwrap();
        }

        #[test]
        fn test_pairs_are_collected_in_name_order() {
            let dir = tempfile::tempdir().unwrap();
            write_pair(dir.path(), "b", [[0, 1], [1, 2]]);
            write_pair(dir.path(), "a", [[2, 2], [0, 0]]);
            // An image without label map is skipped.
            std::fs::copy(
                dir.path().join("test/im/a.png"),
                dir.path().join("test/im/orphan.png"),
            )
            .unwrap();

            let config = DatasetConfig::new(3).with_root(dir.path().to_path_buf());
            let dataset = SegmentationDataset::new(&config).unwrap();

            assert_eq!(dataset.len(), 2);
            assert!(dataset.pairs()[0].0.ends_with("a.png"));
            assert!(dataset.pairs()[1].0.ends_with("b.png"));
        }

        #[test]
        fn test_label_values_are_normalized() {
            let dir = tempfile::tempdir().unwrap();
            write_pair(dir.path(), "sample", [[0, 1], [1, 2]]);

            let config = DatasetConfig::new(3).with_root(dir.path().to_path_buf());
            let dataset = SegmentationDataset::new(&config).unwrap();
            let item = dataset.get(0).unwrap();

            assert_eq!(item.image.shape, vec![3, 2, 2]);
            assert_eq!(item.target.shape, vec![1, 2, 2]);

            let labels: Vec<f32> = item.target.to_vec().unwrap();
            let class_ids: Vec<i64> = labels.iter().map(|v| (v * 255.0).round() as i64).collect();
            assert_eq!(class_ids, vec![0, 1, 1, 2]);
        }

        #[test]
        fn test_resize_to_configured_size() {
            let dir = tempfile::tempdir().unwrap();
            write_pair(dir.path(), "sample", [[0, 1], [1, 2]]);

            let config = DatasetConfig::new(3)
                .with_root(dir.path().to_path_buf())
                .with_image_size(Some([4, 6]));
            let item = SegmentationDataset::new(&config).unwrap().get(0).unwrap();

            assert_eq!(item.image.shape, vec![3, 4, 6]);
            assert_eq!(item.target.shape, vec![1, 4, 6]);
        }

        #[test]
        fn test_missing_split_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let config = DatasetConfig::new(3).with_root(dir.path().to_path_buf());

            assert!(matches!(
                SegmentationDataset::new(&config),
                Err(SegEvalError::DatasetError { .. })
            ));
        }

        #[test]
        fn test_batcher_stacks_items() {
            let device = Default::default();
            let batcher = SegmentationBatcher::<TestBackend>::new();

            let item = SegmentationItem {
                image: TensorData::new(vec![0.5f32; 3 * 4 * 4], [3, 4, 4]),
                target: TensorData::new(vec![1.0f32 / 255.0; 4 * 4], [1, 4, 4]),
            };
            let batch = batcher.batch(vec![item.clone(), item], &device);

            assert_eq!(batch.images.dims(), [2, 3, 4, 4]);
            assert_eq!(batch.targets.dims(), [2, 1, 4, 4]);
            assert_eq!(batch.len(), 2);
        }
    }
}
