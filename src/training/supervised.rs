//! End-to-end fine-tuning run
//!
//! Loads the image folder, splits it, fine-tunes the classifier, evaluates on
//! the held-out partition, renders the charts, optionally predicts one image
//! and writes a JSON report into a timestamped run directory.

use std::path::{Path, PathBuf};

use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
};
use chrono::Local;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::{
    split_dataset, ImageFolderDataset, ImageTransform, LeafBatch, LeafBatcher, LeafImageDataset,
    LeafImageItem,
};
use crate::inference::{evaluate, EvaluationReport, PredictionResult, Predictor};
use crate::model::{build_classifier, TrainingConfig};
use crate::training::trainer::{EpochMetrics, Trainer};
use crate::utils::charts::{generate_confusion_heatmap, generate_loss_chart};
use crate::utils::error::{PlantDiseaseError, Result};
use crate::utils::format_duration;

/// File names written into each run directory
pub const LOSS_CURVE_FILE: &str = "loss_curve.svg";
pub const CONFUSION_MATRIX_FILE: &str = "confusion_matrix.svg";
pub const REPORT_FILE: &str = "report.json";
pub const CONFIG_FILE: &str = "config.json";

/// Serializable summary of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_dir: PathBuf,
    pub backend: String,
    pub config: TrainingConfig,
    pub class_names: Vec<String>,
    pub train_size: usize,
    pub test_size: usize,
    pub history: Vec<EpochMetrics>,
    pub evaluation: EvaluationReport,
    pub prediction: Option<PredictionResult>,
}

impl RunReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Create `output_dir/run_<timestamp>`
fn create_run_dir(output_dir: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut run_dir = output_dir.join(format!("run_{}", timestamp));

    // Two runs in the same second get a numeric suffix
    let mut suffix = 1;
    while run_dir.exists() {
        run_dir = output_dir.join(format!("run_{}_{}", timestamp, suffix));
        suffix += 1;
    }

    std::fs::create_dir_all(&run_dir)?;
    Ok(run_dir)
}

/// Run the full pipeline
///
/// # Type Parameters
/// * `B` - The autodiff backend to train on (e.g., `Autodiff<NdArray>`)
pub fn run_training<B: AutodiffBackend>(
    data_dir: &Path,
    config: &TrainingConfig,
    output_dir: &Path,
    predict_image: Option<&Path>,
    device: &B::Device,
) -> Result<RunReport> {
    config.validate()?;

    println!("{}", "Loading Dataset...".cyan());
    let dataset = ImageFolderDataset::new(data_dir)?;
    dataset.stats().print();
    let num_classes = dataset.num_classes();

    println!();
    println!("{}", "Splitting Dataset...".cyan());
    let split = split_dataset(&dataset.samples, &config.split)?;
    if split.train.is_empty() {
        return Err(PlantDiseaseError::Dataset(format!(
            "Train fraction {} of {} samples leaves no training data",
            config.split.train_fraction,
            dataset.len()
        )));
    }
    println!("  🏷️  Training samples: {}", split.train.len());
    println!("  ✅ Test samples:     {}", split.test.len());

    let train_size = split.train.len();
    let test_size = split.test.len();

    let train_batcher =
        LeafBatcher::new(ImageTransform::train(config.image_size, config.augmentation.clone()));
    let mut train_builder = DataLoaderBuilder::<B, LeafImageItem, LeafBatch<B>>::new(train_batcher)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .set_device(device.clone());

    let test_batcher = LeafBatcher::new(ImageTransform::test(config.image_size));
    let mut test_builder =
        DataLoaderBuilder::<B::InnerBackend, LeafImageItem, LeafBatch<B::InnerBackend>>::new(
            test_batcher,
        )
        .batch_size(config.batch_size)
        .set_device(device.clone());

    // Zero workers keeps decoding on the calling thread
    if config.num_workers > 0 {
        train_builder = train_builder.num_workers(config.num_workers);
        test_builder = test_builder.num_workers(config.num_workers);
    }

    let train_loader = train_builder.build(LeafImageDataset::new(split.train));
    let test_loader = test_builder.build(LeafImageDataset::new(split.test));

    println!();
    println!("{}", "Creating Model...".cyan());
    let model = build_classifier::<B>(config.pretrained_weights.as_deref(), num_classes, device)?;

    println!();
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  🔄 Epochs:        {}", config.epochs);
    println!("  📦 Batch size:    {}", config.batch_size);
    println!("  📈 Learning rate: {}", config.learning_rate);
    println!("  🖼️  Image size:    {}x{}", config.image_size, config.image_size);
    println!("  🧠 Device:        {:?}", device);
    println!();

    println!("{}", "Starting Training...".green().bold());
    let trainer = Trainer::new(config.epochs, config.learning_rate, num_classes);
    let (model, history) = trainer.fit(model, train_loader, train_size)?;

    let total_secs: f64 = history.epochs().iter().map(|m| m.duration_secs).sum();
    println!("  ⏱️  Training time: {}", format_duration(total_secs));

    println!();
    println!("{}", "Evaluating on Test Set...".cyan());
    let model_valid = model.valid();
    let evaluation = evaluate(&model_valid, test_loader, test_size, &dataset.class_names)?;

    println!(
        "  {} Test Accuracy: {:.4} | Test F1: {:.4}",
        "→".cyan(),
        evaluation.accuracy,
        evaluation.weighted_f1
    );
    println!(
        "{}",
        evaluation
            .confusion_matrix
            .display(Some(&dataset.class_names))
    );

    let run_dir = create_run_dir(output_dir)?;
    info!("Writing run artifacts to {:?}", run_dir);

    generate_loss_chart(&history.losses(), &run_dir.join(LOSS_CURVE_FILE))?;
    generate_confusion_heatmap(
        &evaluation.confusion_matrix,
        &dataset.class_names,
        &run_dir.join(CONFUSION_MATRIX_FILE),
    )?;
    config.save(&run_dir.join(CONFIG_FILE))?;

    let prediction = match predict_image {
        Some(path) => {
            let predictor = Predictor::<B::InnerBackend>::new(
                model_valid,
                dataset.class_names.clone(),
                config.image_size,
                device.clone(),
            );
            let result = predictor.predict_file(path)?;

            println!("{}", "Prediction:".cyan().bold());
            println!("{}", result.display());
            Some(result)
        }
        None => None,
    };

    let report = RunReport {
        run_dir: run_dir.clone(),
        backend: std::any::type_name::<B>().to_string(),
        config: config.clone(),
        class_names: dataset.class_names.clone(),
        train_size,
        test_size,
        history: history.epochs().to_vec(),
        evaluation,
        prediction,
    };
    report.save(&run_dir.join(REPORT_FILE))?;

    println!("{}", "Run Complete!".green().bold());
    println!("  📈 Loss curve:       {:?}", run_dir.join(LOSS_CURVE_FILE));
    println!("  🟦 Confusion matrix: {:?}", run_dir.join(CONFUSION_MATRIX_FILE));
    println!("  📝 Report:           {:?}", run_dir.join(REPORT_FILE));

    Ok(report)
}
