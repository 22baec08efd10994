//! Inference module: held-out evaluation and single-image prediction
//!
//! Both run the model in inference mode on the non-autodiff backend.

pub mod evaluator;
pub mod predictor;

// Re-export main types for convenience
pub use evaluator::{evaluate, EvaluationReport};
pub use predictor::{PredictionResult, Predictor};
