//! Model module: ResNet backbone, pretrained import and head adaptation
//!
//! The classifier is a ResNet-18 whose ImageNet head is swapped for a fresh
//! linear layer sized to the local label set.

pub mod config;
pub mod pretrained;
pub mod resnet;

use std::path::Path;

use burn::tensor::backend::Backend;
use tracing::{info, warn};

pub use config::TrainingConfig;
pub use pretrained::load_pretrained;
pub use resnet::{BasicBlock, Downsample, ResNet, ResNetConfig, FEATURE_DIM};

use crate::utils::error::{PlantDiseaseError, Result};

/// Build the classifier for `num_classes` labels
///
/// With a weights path the backbone is the pretrained ResNet-18; without one
/// the network starts from random initialisation.
pub fn build_classifier<B: Backend>(
    pretrained_weights: Option<&Path>,
    num_classes: usize,
    device: &B::Device,
) -> Result<ResNet<B>> {
    if num_classes == 0 {
        return Err(PlantDiseaseError::Model(
            "Cannot build a classifier with zero classes".to_string(),
        ));
    }

    let backbone = match pretrained_weights {
        Some(path) => load_pretrained::<B>(path, &ResNetConfig::new(), device)?,
        None => {
            warn!("No pretrained weights configured; training ResNet-18 from random initialisation");
            ResNetConfig::new().init::<B>(device)
        }
    };

    let model = backbone.with_classifier(num_classes, device);
    info!("Classifier head replaced: {} -> {} classes", FEATURE_DIM, num_classes);

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Tensor;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_build_classifier_matches_class_count() {
        let device = Default::default();
        let model = build_classifier::<TestBackend>(None, 5, &device).unwrap();

        assert_eq!(model.num_classes(), 5);
        let logits = model.forward(Tensor::zeros([1, 3, 32, 32], &device));
        assert_eq!(logits.dims(), [1, 5]);
    }

    #[test]
    fn test_zero_classes_rejected() {
        let device = Default::default();
        assert!(build_classifier::<TestBackend>(None, 0, &device).is_err());
    }
}
