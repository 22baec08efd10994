//! Supervised fine-tuning loop
//!
//! A custom Burn training loop: for every batch, forward, cross-entropy,
//! backward and one Adam step at a fixed learning rate. Loss, accuracy and
//! weighted F1 are accumulated per epoch.

use std::sync::Arc;

use burn::{
    data::dataloader::DataLoader,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::LeafBatch;
use crate::model::ResNet;
use crate::utils::error::{PlantDiseaseError, Result};
use crate::utils::logging::TrainingLogger;
use crate::utils::metrics::{Metrics, RunningAverage};

/// Adam step-size epsilon, matching `torch.optim.Adam`
const ADAM_EPSILON: f32 = 1e-8;

/// Adam with default betas and no weight decay
pub fn adam_config() -> AdamConfig {
    AdamConfig::new().with_epsilon(ADAM_EPSILON)
}

/// Metrics recorded at the end of one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch number
    pub epoch: usize,
    /// Mean batch loss over the epoch
    pub loss: f64,
    /// Training accuracy over all predictions of the epoch
    pub accuracy: f64,
    /// Support-weighted F1 over all predictions of the epoch
    pub weighted_f1: f64,
    pub duration_secs: f64,
}

/// Per-epoch metrics in order; entries are only ever appended
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, metrics: EpochMetrics) {
        self.epochs.push(metrics);
    }

    pub fn epochs(&self) -> &[EpochMetrics] {
        &self.epochs
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    /// Loss series for plotting
    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.loss).collect()
    }
}

/// Runs the fine-tuning epochs
#[derive(Debug, Clone)]
pub struct Trainer {
    epochs: usize,
    learning_rate: f64,
    num_classes: usize,
}

impl Trainer {
    pub fn new(epochs: usize, learning_rate: f64, num_classes: usize) -> Self {
        Self {
            epochs,
            learning_rate,
            num_classes,
        }
    }

    /// Train `model` for the configured number of epochs
    ///
    /// `expected_items` is the size of the training partition. An epoch that
    /// yields fewer items (an image failed to decode) aborts the run.
    pub fn fit<B: AutodiffBackend>(
        &self,
        mut model: ResNet<B>,
        loader: Arc<dyn DataLoader<B, LeafBatch<B>>>,
        expected_items: usize,
    ) -> Result<(ResNet<B>, TrainingHistory)> {
        let mut optimizer = adam_config().init();
        let mut history = TrainingHistory::new();
        let mut logger = TrainingLogger::new(self.epochs);

        info!(
            "Training for {} epochs on {} samples (lr = {})",
            self.epochs, expected_items, self.learning_rate
        );

        for epoch in 1..=self.epochs {
            logger.start_epoch(epoch);

            let progress = ProgressBar::new(expected_items as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("  {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );

            let mut epoch_loss = RunningAverage::new();
            let mut predictions: Vec<usize> = Vec::with_capacity(expected_items);
            let mut targets: Vec<usize> = Vec::with_capacity(expected_items);

            for batch in loader.iter() {
                let batch_targets: Vec<usize> = batch
                    .targets
                    .clone()
                    .into_data()
                    .iter::<i64>()
                    .map(|t| t as usize)
                    .collect();

                let output = model.forward(batch.images);

                let loss = CrossEntropyLossConfig::new()
                    .init(&output.device())
                    .forward(output.clone(), batch.targets);

                let loss_value: f64 = loss.clone().into_scalar().elem();
                if !loss_value.is_finite() {
                    progress.abandon();
                    return Err(PlantDiseaseError::Training(format!(
                        "Non-finite loss ({}) in epoch {} after {} samples",
                        loss_value,
                        epoch,
                        targets.len()
                    )));
                }
                epoch_loss.add(loss_value);

                predictions.extend(
                    output
                        .argmax(1)
                        .into_data()
                        .iter::<i64>()
                        .map(|p| p as usize),
                );

                // Backward pass and parameter update
                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optimizer.step(self.learning_rate, model, grads);

                progress.inc(batch_targets.len() as u64);
                progress.set_message(format!("loss = {:.4}", loss_value));
                targets.extend(batch_targets);

                debug!("epoch {} batch {}: loss {:.4}", epoch, epoch_loss.count(), loss_value);
            }

            progress.finish_and_clear();

            if targets.len() != expected_items {
                return Err(PlantDiseaseError::Dataset(format!(
                    "Epoch {} saw {} of {} training samples; at least one image could not be decoded",
                    epoch,
                    targets.len(),
                    expected_items
                )));
            }

            let metrics = Metrics::from_predictions(&predictions, &targets, self.num_classes);
            let loss = epoch_loss.average();
            let duration_secs = logger.end_epoch(loss, metrics.accuracy, metrics.weighted_f1);

            println!(
                "{} {} | Loss: {:.4} | Acc: {:.4} | F1: {:.4}",
                "→".cyan(),
                format!("Epoch {}/{}", epoch, self.epochs).yellow().bold(),
                loss,
                metrics.accuracy,
                metrics.weighted_f1
            );

            history.push(EpochMetrics {
                epoch,
                loss,
                accuracy: metrics.accuracy,
                weighted_f1: metrics.weighted_f1,
                duration_secs,
            });
        }

        logger.log_complete(history.last().map(|m| m.accuracy).unwrap_or(0.0));

        Ok((model, history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{
        AugmentationConfig, ImageFolderDataset, ImageTransform, LeafBatcher, LeafImageDataset,
        LeafImageItem,
    };
    use crate::model::build_classifier;
    use crate::test_support::write_image_folder;
    use burn::backend::Autodiff;
    use burn::data::dataloader::DataLoaderBuilder;
    use burn_ndarray::NdArray;

    type TestBackend = Autodiff<NdArray>;

    fn train_loader(
        dataset: LeafImageDataset,
    ) -> Arc<dyn DataLoader<TestBackend, LeafBatch<TestBackend>>> {
        let batcher = LeafBatcher::new(ImageTransform::train(32, AugmentationConfig::default()));
        DataLoaderBuilder::<TestBackend, LeafImageItem, LeafBatch<TestBackend>>::new(batcher)
            .batch_size(4)
            .shuffle(7)
            .num_workers(1)
            .build(dataset)
    }

    #[test]
    fn test_history_appends_in_order() {
        let mut history = TrainingHistory::new();
        for epoch in 1..=3 {
            history.push(EpochMetrics {
                epoch,
                loss: 1.0 / epoch as f64,
                accuracy: 0.5,
                weighted_f1: 0.4,
                duration_secs: 0.1,
            });
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.losses(), vec![1.0, 0.5, 1.0 / 3.0]);
        assert_eq!(history.last().map(|m| m.epoch), Some(3));
    }

    #[test]
    fn test_fit_records_finite_bounded_metrics() {
        let dir = tempfile::tempdir().unwrap();
        write_image_folder(dir.path(), &["blight", "healthy", "rust"], 4, 32);
        let folder = ImageFolderDataset::new(dir.path()).unwrap();

        let device = Default::default();
        let model = build_classifier::<TestBackend>(None, folder.num_classes(), &device).unwrap();
        let loader = train_loader(LeafImageDataset::new(folder.samples.clone()));

        let trainer = Trainer::new(2, 1e-3, folder.num_classes());
        let (model, history) = trainer.fit(model, loader, folder.len()).unwrap();

        assert_eq!(model.num_classes(), 3);
        assert_eq!(history.len(), 2);
        for m in history.epochs() {
            assert!(m.loss.is_finite() && m.loss >= 0.0);
            assert!((0.0..=1.0).contains(&m.accuracy));
            assert!((0.0..=1.0).contains(&m.weighted_f1));
            assert!(m.duration_secs.is_finite() && m.duration_secs > 0.0);
        }
    }

    #[test]
    fn test_adam_uses_torch_epsilon() {
        let config = serde_json::to_value(adam_config()).unwrap();
        let epsilon = config["epsilon"].as_f64().unwrap();
        assert!((epsilon - 1e-8).abs() < 1e-12);
    }

    #[test]
    fn test_fit_fails_when_an_image_cannot_be_decoded() {
        let dir = tempfile::tempdir().unwrap();
        write_image_folder(dir.path(), &["a", "b"], 3, 32);
        std::fs::write(dir.path().join("a").join("zz_broken.png"), b"garbage").unwrap();
        let folder = ImageFolderDataset::new(dir.path()).unwrap();

        let device = Default::default();
        let model = build_classifier::<TestBackend>(None, 2, &device).unwrap();
        let loader = train_loader(LeafImageDataset::new(folder.samples.clone()));

        let err = Trainer::new(1, 1e-3, 2)
            .fit(model, loader, folder.len())
            .unwrap_err();
        assert!(matches!(err, PlantDiseaseError::Dataset(_)));
    }
}
