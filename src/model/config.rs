//! Run Configuration Module
//!
//! Hyper-parameters and data settings for a training run. Defaults: 5 epochs,
//! batch 32, Adam at 1e-3, 128 px inputs and an 80/20 split.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{AugmentationConfig, SplitConfig};
use crate::utils::error::{PlantDiseaseError, Result};

/// Configuration for a fine-tuning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of passes over the training partition
    pub epochs: usize,

    /// Batch size for training and evaluation
    pub batch_size: usize,

    /// Adam learning rate (constant, no schedule)
    pub learning_rate: f64,

    /// Square input resolution in pixels
    pub image_size: u32,

    /// Background workers decoding batches
    pub num_workers: usize,

    /// Seed for shuffling the training loader
    pub seed: u64,

    /// Train/test partitioning
    pub split: SplitConfig,

    /// Training-time augmentation
    pub augmentation: AugmentationConfig,

    /// torchvision ResNet-18 checkpoint; random init when absent
    pub pretrained_weights: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 5,
            batch_size: 32,
            learning_rate: 1e-3,
            image_size: crate::IMAGE_SIZE as u32,
            num_workers: 2,
            seed: 42,
            split: SplitConfig::default(),
            augmentation: AugmentationConfig::default(),
            pretrained_weights: None,
        }
    }
}

impl TrainingConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(PlantDiseaseError::Config(
                "epochs must be greater than 0".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(PlantDiseaseError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PlantDiseaseError::Config(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }

        // The stem and four strided stages need at least 32 px to keep a 1x1 map
        if self.image_size < 32 {
            return Err(PlantDiseaseError::Config(format!(
                "image_size must be at least 32, got {}",
                self.image_size
            )));
        }

        self.split.validate()?;
        self.augmentation.validate()?;

        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hyperparameters() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, 5);
        assert_eq!(config.batch_size, 32);
        assert!((config.learning_rate - 0.001).abs() < 1e-12);
        assert_eq!(config.image_size, 128);
        assert!((config.split.train_fraction - 0.8).abs() < 1e-12);
        assert_eq!(config.augmentation.rotation_degrees, 20.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad = [
            TrainingConfig {
                epochs: 0,
                ..Default::default()
            },
            TrainingConfig {
                batch_size: 0,
                ..Default::default()
            },
            TrainingConfig {
                learning_rate: -1.0,
                ..Default::default()
            },
            TrainingConfig {
                image_size: 8,
                ..Default::default()
            },
            TrainingConfig {
                split: SplitConfig {
                    train_fraction: 1.0,
                    seed: 1,
                },
                ..Default::default()
            },
        ];

        for config in bad {
            assert!(matches!(config.validate(), Err(PlantDiseaseError::Config(_))));
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = TrainingConfig {
            epochs: 2,
            pretrained_weights: Some(PathBuf::from("weights/resnet18.pth")),
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(TrainingConfig::load(&path).unwrap(), config);
    }
}
