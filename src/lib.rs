//! # PlantVillage Transfer Learning
//!
//! A Rust library for plant disease classification by fine-tuning an
//! ImageNet-pretrained ResNet-18 with the Burn framework.
//!
//! ## Modules
//!
//! - `dataset`: Image folder discovery, train/test split, transforms and Burn data loading
//! - `model`: ResNet architecture, pretrained weight import, run configuration
//! - `training`: Fine-tuning loop and the end-to-end run
//! - `inference`: Held-out evaluation and single-image prediction
//! - `utils`: Logging, metrics, charts, and helper functions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plantvillage_tl::backend::{default_device, TrainingBackend};
//! use plantvillage_tl::training::run_training;
//! use plantvillage_tl::TrainingConfig;
//!
//! let config = TrainingConfig::default();
//! let report = run_training::<TrainingBackend>(
//!     "data/plantvillage".as_ref(),
//!     &config,
//!     "output".as_ref(),
//!     None,
//!     &default_device(),
//! )?;
//! println!("test accuracy: {:.4}", report.evaluation.accuracy);
//! ```

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used items for convenience
pub use dataset::{
    split_dataset, DatasetSplit, ImageFolderDataset, ImageSample, ImageTransform, LeafBatch,
    LeafBatcher, LeafImageDataset, SplitConfig,
};
pub use inference::{evaluate, EvaluationReport, PredictionResult, Predictor};
pub use model::{build_classifier, ResNet, ResNetConfig, TrainingConfig};
pub use training::{run_training, EpochMetrics, RunReport, Trainer, TrainingHistory};
pub use utils::error::{PlantDiseaseError, Result};
pub use utils::metrics::{ConfusionMatrix, Metrics};

/// Default square input resolution
pub const IMAGE_SIZE: usize = 128;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
