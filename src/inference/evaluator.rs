//! Held-out evaluation
//!
//! Runs the model in inference mode over a data loader and aggregates
//! accuracy, weighted F1 and the confusion matrix.

use std::sync::Arc;

use burn::data::dataloader::DataLoader;
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::LeafBatch;
use crate::model::ResNet;
use crate::utils::error::{PlantDiseaseError, Result};
use crate::utils::metrics::{ClassMetrics, ConfusionMatrix, Metrics};

/// Aggregate metrics on the test partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub weighted_f1: f64,
    pub num_samples: usize,
    /// `num_classes × num_classes`, rows = true label, columns = predicted
    pub confusion_matrix: ConfusionMatrix,
    pub per_class: Vec<ClassMetrics>,
}

impl From<Metrics> for EvaluationReport {
    fn from(metrics: Metrics) -> Self {
        Self {
            accuracy: metrics.accuracy,
            weighted_f1: metrics.weighted_f1,
            num_samples: metrics.total_samples,
            confusion_matrix: metrics.confusion_matrix,
            per_class: metrics.per_class,
        }
    }
}

/// Evaluate `model` over every batch of `loader`
///
/// Call with the inference-mode model (`model.valid()`) so no gradients are
/// tracked. `expected_items` is the partition size; a short pass means an
/// image failed to decode and is reported as a dataset error.
pub fn evaluate<B: Backend>(
    model: &ResNet<B>,
    loader: Arc<dyn DataLoader<B, LeafBatch<B>>>,
    expected_items: usize,
    class_names: &[String],
) -> Result<EvaluationReport> {
    let num_classes = class_names.len();
    let mut predictions: Vec<usize> = Vec::with_capacity(expected_items);
    let mut targets: Vec<usize> = Vec::with_capacity(expected_items);

    for batch in loader.iter() {
        let output = model.forward(batch.images);

        predictions.extend(
            output
                .argmax(1)
                .into_data()
                .iter::<i64>()
                .map(|p| p as usize),
        );
        targets.extend(batch.targets.into_data().iter::<i64>().map(|t| t as usize));
    }

    if targets.len() != expected_items {
        return Err(PlantDiseaseError::Dataset(format!(
            "Evaluation saw {} of {} test samples; at least one image could not be decoded",
            targets.len(),
            expected_items
        )));
    }

    let metrics =
        Metrics::from_predictions(&predictions, &targets, num_classes).with_class_names(class_names);

    info!(
        "Evaluated {} samples: accuracy {:.4}, weighted F1 {:.4}",
        metrics.total_samples, metrics.accuracy, metrics.weighted_f1
    );

    Ok(metrics.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{
        ImageFolderDataset, ImageTransform, LeafBatcher, LeafImageDataset, LeafImageItem,
    };
    use crate::model::build_classifier;
    use crate::test_support::write_image_folder;
    use burn::data::dataloader::DataLoaderBuilder;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_confusion_matrix_covers_every_test_sample() {
        let dir = tempfile::tempdir().unwrap();
        write_image_folder(dir.path(), &["early_blight", "healthy", "late_blight"], 3, 32);
        let folder = ImageFolderDataset::new(dir.path()).unwrap();

        let device = Default::default();
        let model = build_classifier::<TestBackend>(None, folder.num_classes(), &device).unwrap();

        let loader = DataLoaderBuilder::<TestBackend, LeafImageItem, LeafBatch<TestBackend>>::new(
            LeafBatcher::new(ImageTransform::test(32)),
        )
        .batch_size(4)
        .build(LeafImageDataset::new(folder.samples.clone()));

        let report = evaluate(&model, loader, folder.len(), &folder.class_names).unwrap();

        assert_eq!(report.num_samples, 9);
        assert_eq!(report.confusion_matrix.num_classes, 3);
        assert_eq!(report.confusion_matrix.rows().len(), 3);
        assert_eq!(report.confusion_matrix.total(), 9);
        assert!((0.0..=1.0).contains(&report.accuracy));
        assert!((0.0..=1.0).contains(&report.weighted_f1));
        assert_eq!(report.per_class[2].class_name.as_deref(), Some("late_blight"));
    }

    #[test]
    fn test_report_from_metrics() {
        let metrics = Metrics::from_predictions(&[0, 1, 1], &[0, 1, 0], 2);
        let report = EvaluationReport::from(metrics);
        assert_eq!(report.num_samples, 3);
        assert_eq!(report.confusion_matrix.get(0, 1), 1);
    }
}
