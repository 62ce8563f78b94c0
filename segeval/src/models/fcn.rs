//! # Fully-Convolutional Network
//!
//! A small encoder of strided conv blocks followed by a 1x1 classifier and
//! bilinear upsampling back to the input resolution.

use std::path::Path;

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::{
        module::interpolate,
        ops::{InterpolateMode, InterpolateOptions},
    },
};

use crate::{
    error::{SegEvalError, SegEvalResult},
    model::SegmentationModel,
};

/// Configuration for a `ConvBlock`.
#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    in_channels: usize,
    out_channels: usize,
    #[config(default = "1")]
    stride: usize,
}

impl ConvBlockConfig {
    /// Initializes a `ConvBlock` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ConvBlock<B> {
        let conv = Conv2dConfig::new([self.in_channels, self.out_channels], [3, 3])
            .with_stride([self.stride, self.stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        ConvBlock {
            conv,
            norm: BatchNormConfig::new(self.out_channels).init(device),
            activation: Relu::new(),
        }
    }
}

/// 3x3 convolution, batch norm and ReLU.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
    activation: Relu,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.activation.forward(self.norm.forward(self.conv.forward(x)))
    }
}

/// Configuration for the `Fcn` model.
#[derive(Config, Debug)]
pub struct FcnConfig {
    /// Number of output classes.
    pub num_classes: usize,
    /// Number of input image channels.
    #[config(default = "3")]
    pub in_channels: usize,
    /// Channels of the first stage; each later stage doubles them.
    #[config(default = "32")]
    pub hidden_channels: usize,
    /// Number of stride-2 stages.
    #[config(default = "2")]
    pub num_stages: usize,
}

impl FcnConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> SegEvalResult<()> {
        if self.num_classes == 0 || self.in_channels == 0 || self.hidden_channels == 0 {
            return Err(SegEvalError::InvalidConfiguration {
                reason: format!(
                    "Classes and channels must be > 0, got {} classes, {} input and {} hidden channels",
                    self.num_classes, self.in_channels, self.hidden_channels
                ),
            });
        }
        Ok(())
    }

    /// Initializes an `Fcn` module with fresh weights.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SegEvalResult<Fcn<B>> {
        self.validate()?;

        let mut stages = Vec::with_capacity(self.num_stages);
        let mut channels = self.in_channels;
        for stage in 0..self.num_stages {
            let out_channels = self.hidden_channels << stage;
            stages.push(
                ConvBlockConfig::new(channels, out_channels)
                    .with_stride(2)
                    .init(device),
            );
            channels = out_channels;
        }

        let classifier = Conv2dConfig::new([channels, self.num_classes], [1, 1]).init(device);

        Ok(Fcn { stages, classifier })
    }

    /// Initializes an `Fcn` module from a named MessagePack record.
    pub fn load<B: Backend>(&self, path: &Path, device: &Device<B>) -> SegEvalResult<Fcn<B>> {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        self.init(device)?
            .load_file(path.to_path_buf(), &recorder, device)
            .map_err(|e| SegEvalError::WeightLoadingFailed {
                reason: format!("{}: {e:?}", path.display()),
            })
    }
}

/// Fully-convolutional segmentation network.
#[derive(Module, Debug)]
pub struct Fcn<B: Backend> {
    stages: Vec<ConvBlock<B>>,
    classifier: Conv2d<B>,
}

impl<B: Backend> Fcn<B> {
    /// Class scores `[batch, num_classes, height, width]` at input resolution.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, height, width] = images.dims();

        let features = self
            .stages
            .iter()
            .fold(images, |x, stage| stage.forward(x));
        let scores = self.classifier.forward(features);

        let [_, _, out_height, out_width] = scores.dims();
        if out_height == height && out_width == width {
            return scores;
        }
        interpolate(
            scores,
            [height, width],
            InterpolateOptions::new(InterpolateMode::Bilinear),
        )
    }
}

impl<B: Backend> SegmentationModel<B> for Fcn<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        Self::forward(self, images)
    }
}
