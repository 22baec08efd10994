//! Train/test partitioning
//!
//! The sample list is permuted with a seeded RNG and cut once at a fixed
//! fraction: `train = floor(fraction * n)`, `test = n - train`. The split is
//! deterministic for a given seed and never changes during a run.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::loader::ImageSample;
use crate::utils::error::{PlantDiseaseError, Result};

/// Configuration for the train/test split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of samples assigned to training, strictly between 0 and 1
    pub train_fraction: f64,
    /// Random seed for the permutation
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn new(train_fraction: f64, seed: u64) -> Result<Self> {
        let config = Self {
            train_fraction,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(PlantDiseaseError::Config(format!(
                "Train fraction must be strictly between 0.0 and 1.0, got {}",
                self.train_fraction
            )));
        }
        Ok(())
    }

    /// Number of training samples for a dataset of `total` samples
    pub fn train_len(&self, total: usize) -> usize {
        ((self.train_fraction * total as f64).floor() as usize).min(total)
    }
}

/// The two disjoint partitions of a run
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Vec<ImageSample>,
    pub test: Vec<ImageSample>,
}

impl DatasetSplit {
    pub fn total(&self) -> usize {
        self.train.len() + self.test.len()
    }
}

/// Randomly partition `samples` into train and test sets
pub fn split_dataset(samples: &[ImageSample], config: &SplitConfig) -> Result<DatasetSplit> {
    config.validate()?;

    let mut shuffled = samples.to_vec();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    shuffled.shuffle(&mut rng);

    let train_len = config.train_len(shuffled.len());
    let test = shuffled.split_off(train_len);
    let train = shuffled;

    info!(
        "Split {} samples into {} train / {} test (seed {})",
        samples.len(),
        train.len(),
        test.len(),
        config.seed
    );

    Ok(DatasetSplit { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn create_test_samples(n: usize) -> Vec<ImageSample> {
        (0..n)
            .map(|i| ImageSample {
                path: PathBuf::from(format!("class_{}/image_{}.jpg", i % 3, i)),
                label: i % 3,
                class_name: format!("Class_{}", i % 3),
            })
            .collect()
    }

    #[test]
    fn test_split_sizes_and_disjointness() {
        for n in [0, 1, 4, 5, 10, 37, 101] {
            let samples = create_test_samples(n);
            let split = split_dataset(&samples, &SplitConfig::default()).unwrap();

            assert_eq!(split.train.len(), (0.8 * n as f64).floor() as usize);
            assert_eq!(split.total(), n);

            let train: HashSet<_> = split.train.iter().map(|s| s.path.clone()).collect();
            let test: HashSet<_> = split.test.iter().map(|s| s.path.clone()).collect();
            assert!(train.is_disjoint(&test));
            assert_eq!(train.len() + test.len(), n);
        }
    }

    #[test]
    fn test_split_is_reproducible() {
        let samples = create_test_samples(50);
        let config = SplitConfig::new(0.8, 7).unwrap();

        let a = split_dataset(&samples, &config).unwrap();
        let b = split_dataset(&samples, &config).unwrap();

        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        assert!(SplitConfig::new(0.0, 1).is_err());
        assert!(SplitConfig::new(1.0, 1).is_err());
        assert!(SplitConfig::new(f64::NAN, 1).is_err());

        let bad = SplitConfig {
            train_fraction: 1.5,
            seed: 0,
        };
        let err = split_dataset(&create_test_samples(4), &bad).unwrap_err();
        assert!(matches!(err, PlantDiseaseError::Config(_)));
    }
}
