//! Burn Dataset Integration
//!
//! `LeafImageDataset` implements Burn's `Dataset` trait, decoding images
//! lazily from disk. `LeafBatcher` implements `Batcher`, applying the stage
//! transform to each item and stacking the results into tensors.

use std::path::PathBuf;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::{ImageReader, RgbImage};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::error;

use crate::dataset::loader::ImageSample;
use crate::dataset::transform::ImageTransform;
use crate::utils::error::{PlantDiseaseError, Result};

/// Decode an image file and convert it to RGB
pub fn load_rgb_image(path: &std::path::Path) -> Result<RgbImage> {
    let reader = ImageReader::open(path)
        .map_err(|e| PlantDiseaseError::ImageLoad(path.to_path_buf(), e.to_string()))?
        .with_guessed_format()
        .map_err(|e| PlantDiseaseError::ImageLoad(path.to_path_buf(), e.to_string()))?;

    let image = reader
        .decode()
        .map_err(|e| PlantDiseaseError::ImageLoad(path.to_path_buf(), e.to_string()))?;

    Ok(image.to_rgb8())
}

/// A decoded image with its label, not yet resized or normalised
#[derive(Clone)]
pub struct LeafImageItem {
    pub image: RgbImage,
    pub label: usize,
    pub path: PathBuf,
}

impl std::fmt::Debug for LeafImageItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafImageItem")
            .field("label", &self.label)
            .field("path", &self.path)
            .field(
                "image_size",
                &format!("{}x{}", self.image.width(), self.image.height()),
            )
            .finish()
    }
}

/// Lazily-decoded dataset over one partition
#[derive(Debug, Clone)]
pub struct LeafImageDataset {
    samples: Vec<ImageSample>,
}

impl LeafImageDataset {
    pub fn new(samples: Vec<ImageSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[ImageSample] {
        &self.samples
    }
}

impl Dataset<LeafImageItem> for LeafImageDataset {
    fn get(&self, index: usize) -> Option<LeafImageItem> {
        let sample = self.samples.get(index)?;

        match load_rgb_image(&sample.path) {
            Ok(image) => Some(LeafImageItem {
                image,
                label: sample.label,
                path: sample.path.clone(),
            }),
            Err(e) => {
                error!("Skipping unreadable sample #{}: {}", index, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// A batch of images for training or evaluation
#[derive(Clone, Debug)]
pub struct LeafBatch<B: Backend> {
    /// Batch of images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// Batch of labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher that applies a stage transform and stacks the results
#[derive(Clone, Debug)]
pub struct LeafBatcher {
    transform: ImageTransform,
}

impl LeafBatcher {
    pub fn new(transform: ImageTransform) -> Self {
        Self { transform }
    }

    pub fn transform(&self) -> &ImageTransform {
        &self.transform
    }

    /// Transform and stack decoded RGB images into a `[N, 3, H, W]` tensor
    pub fn images_to_tensor<B: Backend>(
        &self,
        images: &[RgbImage],
        rng: &mut ChaCha8Rng,
        device: &B::Device,
    ) -> Tensor<B, 4> {
        let size = self.transform.image_size();
        let mut data = Vec::with_capacity(images.len() * 3 * size * size);

        for image in images {
            data.extend(self.transform.apply(image, rng));
        }

        Tensor::<B, 4>::from_floats(TensorData::new(data, [images.len(), 3, size, size]), device)
    }
}

impl<B: Backend> Batcher<B, LeafImageItem, LeafBatch<B>> for LeafBatcher {
    fn batch(&self, items: Vec<LeafImageItem>, device: &B::Device) -> LeafBatch<B> {
        let batch_size = items.len();

        // Per-batch RNG so worker threads never share state
        let mut rng = ChaCha8Rng::seed_from_u64(rand::random::<u64>());

        let (images, labels): (Vec<RgbImage>, Vec<i64>) = items
            .into_iter()
            .map(|item| (item.image, item.label as i64))
            .unzip();

        let images = self.images_to_tensor::<B>(&images, &mut rng, device);
        let targets = Tensor::<B, 1, Int>::from_data(TensorData::new(labels, [batch_size]), device);

        LeafBatch { images, targets }
    }
}
