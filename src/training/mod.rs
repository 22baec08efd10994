//! Training module
//!
//! - `trainer`: the epoch/batch fine-tuning loop and its per-epoch metrics
//! - `supervised`: the end-to-end run (data, model, training, evaluation,
//!   charts, report)

pub mod supervised;
pub mod trainer;

// Re-export main types for convenience
pub use supervised::{run_training, RunReport};
pub use trainer::{EpochMetrics, Trainer, TrainingHistory};
