//! Inference Predictor Module
//!
//! Single-image prediction with a trained model: decode, apply the
//! deterministic test transform, one forward pass, softmax, argmax.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use burn::tensor::backend::Backend;
use image::RgbImage;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{load_rgb_image, ImageTransform, LeafBatcher};
use crate::model::ResNet;
use crate::utils::error::{PlantDiseaseError, Result};

/// Number of ranked alternatives kept with a prediction
const TOP_K: usize = 5;

/// Result of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Path to the input image (if applicable)
    pub image_path: Option<PathBuf>,

    /// Predicted class index
    pub class_index: usize,

    /// Predicted class name
    pub class_name: String,

    /// Probability of the predicted class
    pub confidence: f32,

    /// Highest-probability classes, best first
    pub top_k: Vec<(usize, String, f32)>,

    /// Inference time in milliseconds
    pub inference_time_ms: f64,
}

impl PredictionResult {
    /// Build a result from a probability distribution over `class_names`
    pub fn new(
        probabilities: &[f32],
        class_names: &[String],
        inference_time: Duration,
        image_path: Option<PathBuf>,
    ) -> Result<Self> {
        if probabilities.len() != class_names.len() || probabilities.is_empty() {
            return Err(PlantDiseaseError::Inference(format!(
                "Model produced {} scores for {} known classes",
                probabilities.len(),
                class_names.len()
            )));
        }

        let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (class_index, confidence) = ranked[0];

        let top_k = ranked
            .iter()
            .take(TOP_K)
            .map(|&(idx, prob)| (idx, class_names[idx].clone(), prob))
            .collect();

        Ok(Self {
            image_path,
            class_index,
            class_name: class_names[class_index].clone(),
            confidence,
            top_k,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        })
    }

    /// Pretty print the prediction result
    pub fn display(&self) -> String {
        let mut output = String::new();

        if let Some(path) = &self.image_path {
            output.push_str(&format!("Image: {:?}\n", path));
        }

        output.push_str(&format!(
            "Prediction: {} (class {})\n",
            self.class_name, self.class_index
        ));
        output.push_str(&format!("Confidence: {:.2}%\n", self.confidence * 100.0));
        output.push_str(&format!("Inference time: {:.2} ms\n", self.inference_time_ms));

        output.push_str(&format!("\nTop-{} predictions:\n", self.top_k.len()));
        for (i, (idx, name, prob)) in self.top_k.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {} (class {}) - {:.2}%\n",
                i + 1,
                name,
                idx,
                prob * 100.0
            ));
        }

        output
    }
}

/// Predictor wrapping an inference-mode model and its label set
pub struct Predictor<B: Backend> {
    model: ResNet<B>,
    class_names: Vec<String>,
    batcher: LeafBatcher,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    pub fn new(
        model: ResNet<B>,
        class_names: Vec<String>,
        image_size: u32,
        device: B::Device,
    ) -> Self {
        Self {
            model,
            class_names,
            batcher: LeafBatcher::new(ImageTransform::test(image_size)),
            device,
        }
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Predict the class of an already decoded image
    pub fn predict_image(&self, image: &RgbImage) -> Result<PredictionResult> {
        let start = Instant::now();

        // The test transform never draws from the RNG
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let input = self
            .batcher
            .images_to_tensor::<B>(std::slice::from_ref(image), &mut rng, &self.device);

        let probabilities: Vec<f32> = self
            .model
            .forward_softmax(input)
            .into_data()
            .iter::<f32>()
            .collect();

        debug!("Class probabilities: {:?}", probabilities);

        PredictionResult::new(&probabilities, &self.class_names, start.elapsed(), None)
    }

    /// Load an image from disk and predict its class
    pub fn predict_file(&self, path: &Path) -> Result<PredictionResult> {
        if !path.exists() {
            return Err(PlantDiseaseError::PathNotFound(path.to_path_buf()));
        }

        let image = load_rgb_image(path)?;
        let mut result = self.predict_image(&image)?;
        result.image_path = Some(path.to_path_buf());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build_classifier;
    use crate::test_support::class_color;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("class_{}", i)).collect()
    }

    #[test]
    fn test_prediction_result_ranks_classes() {
        let result = PredictionResult::new(
            &[0.1, 0.6, 0.3],
            &names(3),
            Duration::from_millis(2),
            None,
        )
        .unwrap();

        assert_eq!(result.class_index, 1);
        assert_eq!(result.class_name, "class_1");
        assert!((result.confidence - 0.6).abs() < 1e-6);
        assert_eq!(result.top_k.len(), 3);
        assert_eq!(result.top_k[1].0, 2);
        assert!(result.display().contains("class_1"));
    }

    #[test]
    fn test_prediction_result_rejects_width_mismatch() {
        let err = PredictionResult::new(&[0.5, 0.5], &names(3), Duration::ZERO, None).unwrap_err();
        assert!(matches!(err, PlantDiseaseError::Inference(_)));
    }

    #[test]
    fn test_predict_file_returns_one_known_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        RgbImage::from_pixel(50, 40, class_color(1)).save(&path).unwrap();

        let device = Default::default();
        let class_names = names(4);
        let model = build_classifier::<TestBackend>(None, class_names.len(), &device).unwrap();
        let predictor = Predictor::new(model, class_names.clone(), 32, device);

        let result = predictor.predict_file(&path).unwrap();

        assert!(result.class_index < 4);
        assert!(class_names.contains(&result.class_name));
        assert!((0.0..=1.0).contains(&result.confidence));
        assert_eq!(result.image_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_predict_missing_file() {
        let device = Default::default();
        let model = build_classifier::<TestBackend>(None, 2, &device).unwrap();
        let predictor = Predictor::new(model, names(2), 32, device);

        let err = predictor.predict_file(Path::new("/no/such/leaf.jpg")).unwrap_err();
        assert!(matches!(err, PlantDiseaseError::PathNotFound(_)));
    }
}
