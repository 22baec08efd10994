//! Dataset module for labelled leaf images
//!
//! This module provides functionality for:
//! - Discovering a folder-per-class image tree
//! - Splitting it into train and test partitions
//! - Stage-specific transforms and augmentation
//! - Burn `Dataset`/`Batcher` integration

pub mod augmentation;
pub mod burn_dataset;
pub mod loader;
pub mod split;
pub mod transform;

// Re-export main types for convenience
pub use augmentation::{AugmentationConfig, Augmenter};
pub use burn_dataset::{load_rgb_image, LeafBatch, LeafBatcher, LeafImageDataset, LeafImageItem};
pub use loader::{DatasetStats, ImageFolderDataset, ImageSample};
pub use split::{split_dataset, DatasetSplit, SplitConfig};
pub use transform::ImageTransform;

/// ImageNet per-channel mean (RGB), matching the pretrained weights
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];
