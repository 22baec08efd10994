//! Stage-specific image transforms
//!
//! Train: resize → random flip → random rotation → [0, 1] → normalise.
//! Test:  resize → [0, 1] → normalise.
//!
//! Both produce flattened CHW `f32` data of length `3 * size * size`.

use image::imageops::FilterType;
use image::RgbImage;
use rand_chacha::ChaCha8Rng;

use crate::dataset::augmentation::{AugmentationConfig, Augmenter};
use crate::dataset::{IMAGENET_MEAN, IMAGENET_STD};

/// Resize, optionally augment, and normalise an image into tensor data
#[derive(Clone, Debug)]
pub struct ImageTransform {
    image_size: u32,
    augmenter: Option<Augmenter>,
    mean: [f32; 3],
    std: [f32; 3],
}

impl ImageTransform {
    /// Training transform with random augmentation
    pub fn train(image_size: u32, augmentation: AugmentationConfig) -> Self {
        Self {
            image_size,
            augmenter: Some(Augmenter::new(augmentation)),
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    /// Deterministic transform for evaluation and prediction
    pub fn test(image_size: u32) -> Self {
        Self {
            image_size,
            augmenter: None,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    pub fn image_size(&self) -> usize {
        self.image_size as usize
    }

    pub fn is_augmenting(&self) -> bool {
        self.augmenter.is_some()
    }

    /// Resize to `image_size`×`image_size`, then apply the augmenter if any
    pub fn prepare(&self, image: &RgbImage, rng: &mut ChaCha8Rng) -> RgbImage {
        let resized = if image.dimensions() == (self.image_size, self.image_size) {
            image.clone()
        } else {
            image::imageops::resize(image, self.image_size, self.image_size, FilterType::Triangle)
        };

        match &self.augmenter {
            Some(augmenter) => augmenter.augment(resized, rng),
            None => resized,
        }
    }

    /// Full pipeline: returns normalised CHW data `[3 * H * W]`
    pub fn apply(&self, image: &RgbImage, rng: &mut ChaCha8Rng) -> Vec<f32> {
        let prepared = self.prepare(image, rng);
        self.to_tensor_data(&prepared)
    }

    /// Convert to CHW, scale to [0, 1] and normalise per channel
    fn to_tensor_data(&self, img: &RgbImage) -> Vec<f32> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let plane = height * width;
        let mut tensor = vec![0.0f32; 3 * plane];

        for (x, y, pixel) in img.enumerate_pixels() {
            let offset = y as usize * width + x as usize;
            for c in 0..3 {
                let value = pixel[c] as f32 / 255.0;
                tensor[c * plane + offset] = (value - self.mean[c]) / self.std[c];
            }
        }

        tensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::SeedableRng;

    #[test]
    fn test_output_shape_and_resize() {
        let transform = ImageTransform::test(32);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let img = RgbImage::new(100, 60);

        let data = transform.apply(&img, &mut rng);
        assert_eq!(data.len(), 3 * 32 * 32);
    }

    #[test]
    fn test_normalisation_values() {
        let transform = ImageTransform::test(4);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let img = RgbImage::from_pixel(4, 4, Rgb([255, 0, 128]));

        let data = transform.apply(&img, &mut rng);
        let plane = 16;

        let expected_r = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let expected_g = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        let expected_b = (128.0 / 255.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];

        assert!((data[0] - expected_r).abs() < 1e-5);
        assert!((data[plane + 5] - expected_g).abs() < 1e-5);
        assert!((data[2 * plane + 15] - expected_b).abs() < 1e-5);
    }

    #[test]
    fn test_test_transform_is_deterministic() {
        let transform = ImageTransform::test(8);
        assert!(!transform.is_augmenting());

        let img = RgbImage::from_fn(20, 20, |x, y| Rgb([x as u8 * 10, y as u8 * 10, 7]));
        let a = transform.apply(&img, &mut ChaCha8Rng::seed_from_u64(1));
        let b = transform.apply(&img, &mut ChaCha8Rng::seed_from_u64(2));
        assert_eq!(a, b);
    }

    #[test]
    fn test_train_transform_keeps_shape() {
        let transform = ImageTransform::train(16, AugmentationConfig::default());
        assert!(transform.is_augmenting());

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let img = RgbImage::from_pixel(40, 30, Rgb([10, 200, 30]));
        for _ in 0..5 {
            let data = transform.apply(&img, &mut rng);
            assert_eq!(data.len(), 3 * 16 * 16);
            assert!(data.iter().all(|v| v.is_finite()));
        }
    }
}
