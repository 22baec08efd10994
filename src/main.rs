//! PlantVillage Transfer Learning CLI
//!
//! Fine-tunes a pretrained ResNet-18 on a folder-per-class leaf image
//! dataset, evaluates it and optionally classifies one image.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use plantvillage_tl::backend::{backend_name, default_device, TrainingBackend};
use plantvillage_tl::dataset::{AugmentationConfig, ImageFolderDataset, SplitConfig};
use plantvillage_tl::training::run_training;
use plantvillage_tl::utils::logging::{init_logging, LogConfig};
use plantvillage_tl::TrainingConfig;

/// PlantVillage Transfer-Learning Plant Disease Classification
///
/// Fine-tunes an ImageNet ResNet-18 with the Burn framework and reports
/// loss, accuracy, weighted F1 and a confusion matrix.
#[derive(Parser, Debug)]
#[command(name = "plantvillage_tl")]
#[command(version = plantvillage_tl::VERSION)]
#[command(about = "Transfer-learning plant disease classification with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fine-tune, evaluate and visualise
    Train {
        /// Path to the dataset directory (one sub-directory per class)
        #[arg(short, long, default_value = "data/plantvillage")]
        data_dir: PathBuf,

        /// Number of training epochs
        #[arg(short, long, default_value = "5")]
        epochs: usize,

        /// Batch size for training and evaluation
        #[arg(short, long, default_value = "32")]
        batch_size: usize,

        /// Adam learning rate
        #[arg(short, long, default_value = "0.001")]
        learning_rate: f64,

        /// Square input resolution in pixels
        #[arg(long, default_value = "128")]
        image_size: u32,

        /// Fraction of samples used for training (rest is the test set)
        #[arg(long, default_value = "0.8")]
        train_fraction: f64,

        /// Random seed for the split and loader shuffling
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Background workers decoding images
        #[arg(long, default_value = "2")]
        num_workers: usize,

        /// ImageNet-pretrained torchvision resnet18 checkpoint (.pth)
        #[arg(long)]
        pretrained: PathBuf,

        /// Classify this image with the fine-tuned model after evaluation
        #[arg(long)]
        predict: Option<PathBuf>,

        /// Disable training-time augmentation
        #[arg(long, default_value = "false")]
        no_augmentation: bool,

        /// Directory receiving the timestamped run folder
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Show dataset statistics
    Stats {
        /// Path to the dataset directory
        #[arg(short, long, default_value = "data/plantvillage")]
        data_dir: PathBuf,

        /// Fraction used to preview the train/test split sizes
        #[arg(long, default_value = "0.8")]
        train_fraction: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    if let Err(e) = init_logging(&log_config) {
        eprintln!("{} {}", "Warning:".yellow(), e);
    }

    print_banner();

    match cli.command {
        Commands::Train {
            data_dir,
            epochs,
            batch_size,
            learning_rate,
            image_size,
            train_fraction,
            seed,
            num_workers,
            pretrained,
            predict,
            no_augmentation,
            output_dir,
        } => {
            let config = TrainingConfig {
                epochs,
                batch_size,
                learning_rate,
                image_size,
                num_workers,
                seed,
                split: SplitConfig::new(train_fraction, seed)?,
                augmentation: if no_augmentation {
                    AugmentationConfig::none()
                } else {
                    AugmentationConfig::default()
                },
                pretrained_weights: Some(pretrained),
            };

            cmd_train(&data_dir, &config, &output_dir, predict.as_deref())?;
        }

        Commands::Stats {
            data_dir,
            train_fraction,
        } => {
            cmd_stats(&data_dir, train_fraction)?;
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔══════════════════════════════════════════════════════════════════════╗
 ║   🌱 PlantVillage Transfer Learning                                  ║
 ║   Plant Disease Classification with Burn + Rust                      ║
 ╚══════════════════════════════════════════════════════════════════════╝
  "#
        .green()
    );
}

fn cmd_train(
    data_dir: &Path,
    config: &TrainingConfig,
    output_dir: &Path,
    predict: Option<&Path>,
) -> Result<()> {
    info!("Training on {:?} with backend {}", data_dir, backend_name());
    println!("  🖥️  Backend: {}", backend_name());
    println!();

    let device = default_device();
    let report = run_training::<TrainingBackend>(data_dir, config, output_dir, predict, &device)?;

    println!();
    println!("{}", "Summary:".cyan().bold());
    if let Some(last) = report.history.last() {
        println!(
            "  Final epoch  | Loss: {:.4} | Acc: {:.4} | F1: {:.4}",
            last.loss, last.accuracy, last.weighted_f1
        );
    }
    println!(
        "  Test set     | Acc: {:.4} | F1: {:.4} ({} samples)",
        report.evaluation.accuracy, report.evaluation.weighted_f1, report.evaluation.num_samples
    );
    if let Some(prediction) = &report.prediction {
        println!(
            "  Prediction   | {} ({:.2}%)",
            prediction.class_name.green().bold(),
            prediction.confidence * 100.0
        );
    }

    Ok(())
}

fn cmd_stats(data_dir: &Path, train_fraction: f64) -> Result<()> {
    info!("Computing dataset statistics for: {:?}", data_dir);

    let dataset = ImageFolderDataset::new(data_dir)?;
    let stats = dataset.stats();
    stats.print();

    let split = SplitConfig::new(train_fraction, 0)?;
    let train = split.train_len(stats.total_samples);

    println!();
    println!("{}", "Split Preview:".yellow().bold());
    println!("  🏷️  Train: {}", train);
    println!("  ✅ Test:  {}", stats.total_samples - train);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_requires_pretrained_weights() {
        let err = Cli::try_parse_from(["plantvillage_tl", "train", "--data-dir", "leaves"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_train_parses_pretrained_path() {
        let cli = Cli::try_parse_from([
            "plantvillage_tl",
            "train",
            "--data-dir",
            "leaves",
            "--pretrained",
            "weights/resnet18.pth",
        ])
        .unwrap();

        match cli.command {
            Commands::Train {
                pretrained, epochs, ..
            } => {
                assert_eq!(pretrained, PathBuf::from("weights/resnet18.pth"));
                assert_eq!(epochs, 5);
            }
            Commands::Stats { .. } => panic!("expected the train subcommand"),
        }
    }
}
