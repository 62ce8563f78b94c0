//! Segmentation Model Evaluation
//!
//! Scores a trained network on a labelled test split and writes the per-class
//! IoU, mIoU, mean loss and FPS to `<result_dir>/<model>.csv`.
//!
//! ## Usage
//!
//! ```bash
//! # Evaluate with a configuration file
//! cargo run --bin segeval -- evaluate --config eval.json
//!
//! # Override the weights and skip FPS measurement
//! cargo run --bin segeval -- evaluate --config eval.json --weights fcn.mpk --no-fps
//!
//! # Show backend information
//! cargo run --bin segeval -- info
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use burn::{data::dataloader::DataLoaderBuilder, data::dataset::Dataset, prelude::*};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use segeval::{
    save_report, ClassNames, EvaluatorConfig, Evaluator, PixelCrossEntropyLoss, Precision,
    SegmentationBatcher, SegmentationDataset,
};
use segeval_demos::{
    create_device, get_backend_name, setup_logging, EvaluationAppConfig, SelectedBackend,
    SelectedDevice, SelectedHalfBackend,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a trained model on a test split
    Evaluate {
        /// Configuration file path (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to the model weights, overrides the configuration
        #[arg(short, long)]
        weights: Option<PathBuf>,

        /// Model name used for the report file
        #[arg(short, long)]
        model: Option<String>,

        /// Directory receiving the report
        #[arg(long)]
        result_dir: Option<PathBuf>,

        /// Batch size for evaluation
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Run inference in half precision
        #[arg(long)]
        amp: bool,

        /// Skip FPS measurement
        #[arg(long)]
        no_fps: bool,
    },
    /// Show backend information
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Evaluate {
            config,
            weights,
            model,
            result_dir,
            batch_size,
            amp,
            no_fps,
        } => {
            let mut config = match &config {
                Some(path) => load_config(path)?,
                None => EvaluationAppConfig::default(),
            };

            // Apply command line overrides
            if let Some(weights) = weights {
                config.weights = weights;
            }
            if let Some(model) = model {
                config.model = model;
            }
            if let Some(result_dir) = result_dir {
                config.result_dir = result_dir;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            config.amp_enabled |= amp;
            config.eval_fps &= !no_fps;

            evaluate(&config)
        }
        Commands::Info => {
            println!("Backend: {}", get_backend_name());
            println!("Half-precision backend: {}", std::any::type_name::<SelectedHalfBackend>());
            println!("Device: {:?}", create_device());
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<EvaluationAppConfig> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn evaluate(config: &EvaluationAppConfig) -> Result<()> {
    config.validate()?;
    if !config.weights.exists() {
        anyhow::bail!("Model file does not exist: {}", config.weights.display());
    }

    let device = create_device();
    info!(backend = get_backend_name(), amp = config.amp_enabled, "Using backend");

    match Precision::from_mixed_precision(config.amp_enabled) {
        Precision::Full => run::<SelectedBackend>(config, device),
        Precision::Half => run::<SelectedHalfBackend>(config, device),
    }
}

fn run<B>(config: &EvaluationAppConfig, device: SelectedDevice) -> Result<()>
where
    B: Backend<Device = SelectedDevice>,
{
    let dataset = SegmentationDataset::new(&config.dataset).with_context(|| {
        format!(
            "Failed to open test split: {}",
            config.dataset.image_dir().display()
        )
    })?;
    let num_samples = dataset.len();
    let class_names = ClassNames::for_dataset(&config.dataset);

    let model = config
        .network
        .load::<B>(&config.weights, &device)
        .with_context(|| format!("Failed to load weights: {}", config.weights.display()))?;
    info!(model = %config.model, weights = %config.weights.display(), "Activated model");

    let evaluator_config = EvaluatorConfig::new(config.dataset.num_classes)
        .with_precision(Precision::from_mixed_precision(config.amp_enabled))
        .with_measure_fps(config.eval_fps);
    let loss = PixelCrossEntropyLoss::new(&device);
    let evaluator = Evaluator::new(model, loss, evaluator_config, device)?;

    let dataloader = DataLoaderBuilder::new(SegmentationBatcher::<B>::new())
        .batch_size(config.batch_size)
        .num_workers(config.num_workers)
        .build(dataset);

    let progress = ProgressBar::new(num_samples.div_ceil(config.batch_size) as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({eta})")?
            .progress_chars("=>-"),
    );

    let result = evaluator.evaluate(dataloader.iter().inspect(|_| progress.inc(1)))?;
    progress.finish_and_clear();

    // Samples that fail to load are logged and skipped by the data loader.
    if result.num_samples != num_samples {
        anyhow::bail!(
            "Evaluated {} of {} samples; see the errors above",
            result.num_samples,
            num_samples
        );
    }

    for (class_id, iou) in result.scores.iter() {
        info!(class_id, class = class_names.get(class_id)?, iou = ?iou, "class IoU");
    }
    info!(
        miou = ?result.mean_iou(),
        loss = result.mean_loss,
        fps = result.fps,
        "evaluation summary"
    );

    let path = save_report(&config.result_dir, &config.model, &result, &class_names)?;
    println!("Saved evaluation result. ({})", path.display());
    Ok(())
}
