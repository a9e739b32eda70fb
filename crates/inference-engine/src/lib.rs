//! Sequence Classifier
//!
//! Adapts smoothed feature windows to an externally trained sequence model
//! (ONNX via tract) and returns alert/drowsy class probabilities.

mod adapter;
mod engine;

pub use adapter::{pad_or_truncate, segment, ClassificationResult, ClassifierAdapter, InputMode};
pub use engine::{MockOutput, MockSequenceModel, SequenceModel, TractSequenceModel};

use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid output shape: expected {expected} values, got {actual}")]
    InvalidOutputShape { expected: usize, actual: usize },
}
