//! Data Augmentation Module for Plant Disease Classification
//!
//! On-the-fly augmentations applied to training images only:
//! - Random horizontal flip
//! - Random rotation around the image centre (nearest sampling, black fill)
//!
//! Test and prediction images are never augmented.

use image::{Rgb, RgbImage};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::utils::error::{PlantDiseaseError, Result};

/// Configuration for data augmentation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AugmentationConfig {
    /// Probability of applying horizontal flip (0.0 - 1.0)
    pub horizontal_flip_prob: f32,
    /// Maximum rotation angle in degrees (applies ±rotation_degrees)
    pub rotation_degrees: f32,
    /// Probability of applying rotation
    pub rotation_prob: f32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            horizontal_flip_prob: 0.5,
            rotation_degrees: 20.0,
            rotation_prob: 1.0,
        }
    }
}

impl AugmentationConfig {
    /// Disable all augmentations
    pub fn none() -> Self {
        Self {
            horizontal_flip_prob: 0.0,
            rotation_degrees: 0.0,
            rotation_prob: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, p) in [
            ("horizontal_flip_prob", self.horizontal_flip_prob),
            ("rotation_prob", self.rotation_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(PlantDiseaseError::Config(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, p
                )));
            }
        }
        if !(0.0..=180.0).contains(&self.rotation_degrees) {
            return Err(PlantDiseaseError::Config(format!(
                "rotation_degrees must be between 0 and 180, got {}",
                self.rotation_degrees
            )));
        }
        Ok(())
    }
}

/// Image augmenter that applies random transformations
#[derive(Clone, Debug)]
pub struct Augmenter {
    config: AugmentationConfig,
}

impl Augmenter {
    /// Create a new augmenter with the given configuration
    pub fn new(config: AugmentationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AugmentationConfig {
        &self.config
    }

    /// Apply the configured augmentations randomly to an image
    pub fn augment(&self, img: RgbImage, rng: &mut ChaCha8Rng) -> RgbImage {
        let mut result = img;

        if rng.gen::<f32>() < self.config.horizontal_flip_prob {
            image::imageops::flip_horizontal_in_place(&mut result);
        }

        if self.config.rotation_degrees > 0.0 && rng.gen::<f32>() < self.config.rotation_prob {
            let angle =
                rng.gen_range(-self.config.rotation_degrees..=self.config.rotation_degrees);
            result = rotate(&result, angle);
        }

        result
    }
}

/// Rotate counter-clockwise by `angle_degrees` about the image centre
///
/// Output keeps the input size. Each output pixel takes the nearest source
/// pixel; positions that map outside the source are black.
pub fn rotate(img: &RgbImage, angle_degrees: f32) -> RgbImage {
    let (width, height) = img.dimensions();
    if angle_degrees == 0.0 || width == 0 || height == 0 {
        return img.clone();
    }

    let angle_rad = angle_degrees.to_radians();
    let cos_a = angle_rad.cos();
    let sin_a = angle_rad.sin();

    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    RgbImage::from_fn(width, height, |x, y| {
        // Offsets from the centre, measured at pixel centres
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;

        // Inverse mapping (image y axis points down)
        let src_x = cx + dx * cos_a - dy * sin_a;
        let src_y = cy + dx * sin_a + dy * cos_a;

        if src_x < 0.0 || src_y < 0.0 {
            return Rgb([0, 0, 0]);
        }

        let (sx, sy) = (src_x.floor() as u32, src_y.floor() as u32);
        if sx < width && sy < height {
            *img.get_pixel(sx, sy)
        } else {
            Rgb([0, 0, 0])
        }
    })
}
