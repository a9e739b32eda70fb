//! Sequence Model Backends

use crate::InferenceError;
use feature_engine::NO_FACE;
use ndarray::{Array3, Axis};
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// An externally trained model over `[batch, steps, features]` windows.
///
/// Implementations return the flattened model output untouched; how the
/// adapter interprets it depends on its input mode.
pub trait SequenceModel: Send {
    /// Run the model on one batch
    fn run(&mut self, input: &Array3<f32>) -> Result<Vec<f32>, InferenceError>;

    /// Human readable identifier for logs
    fn name(&self) -> &str;
}

/// ONNX model executed with tract
pub struct TractSequenceModel {
    path: String,
    plan: TypedRunnableModel<TypedModel>,
}

impl TractSequenceModel {
    /// Load and optimize an ONNX model.
    ///
    /// `input_shape` pins the input fact when the exported graph has
    /// symbolic dimensions; pass `None` to keep what the file declares.
    pub fn load(path: &str, input_shape: Option<[usize; 3]>) -> Result<Self, InferenceError> {
        info!("Loading sequence model from {}", path);

        let plan = Self::build_plan(path, input_shape)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path, e)))?;

        info!("Sequence model loaded successfully");
        Ok(Self {
            path: path.to_string(),
            plan,
        })
    }

    fn build_plan(
        path: &str,
        input_shape: Option<[usize; 3]>,
    ) -> TractResult<TypedRunnableModel<TypedModel>> {
        let mut model = tract_onnx::onnx().model_for_path(path)?;
        if let Some(shape) = input_shape {
            model = model.with_input_fact(0, f32::fact(shape).into())?;
        }
        model.into_optimized()?.into_runnable()
    }

    /// Get model path
    pub fn model_path(&self) -> &str {
        &self.path
    }
}

impl SequenceModel for TractSequenceModel {
    fn run(&mut self, input: &Array3<f32>) -> Result<Vec<f32>, InferenceError> {
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_shape(input.shape(), &data)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".into()))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        Ok(view.iter().copied().collect())
    }

    fn name(&self) -> &str {
        &self.path
    }
}

/// What the mock emits per batch item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutput {
    /// `[p_alert, p_drowsy]` per item (padded mode contract)
    Probabilities,
    /// One raw logit per item (segmented mode contract)
    Logits,
}

/// Deterministic stand-in for development without a trained model.
///
/// Scores each sequence from the rows that carry a face: lower normalized
/// EAR and higher normalized MOE push towards drowsy.
pub struct MockSequenceModel {
    output: MockOutput,
    calls: usize,
}

impl MockSequenceModel {
    /// Create a mock inference model
    pub fn new(output: MockOutput) -> Self {
        info!("Creating mock sequence model ({:?})", output);
        Self { output, calls: 0 }
    }

    /// Number of `run` invocations so far
    pub fn calls(&self) -> usize {
        self.calls
    }

    fn logit(sequence: ndarray::ArrayView2<f32>) -> f32 {
        let mut ear = 0.0;
        let mut moe = 0.0;
        let mut n = 0usize;
        for row in sequence.rows() {
            let padding = row.iter().all(|v| *v == 0.0);
            let no_face = row[0] == NO_FACE as f32;
            if padding || no_face {
                continue;
            }
            ear += row[0];
            moe += row[3];
            n += 1;
        }
        if n == 0 {
            return 0.0;
        }
        let n = n as f32;
        -1.5 * (ear / n) + 0.5 * (moe / n)
    }
}

impl SequenceModel for MockSequenceModel {
    fn run(&mut self, input: &Array3<f32>) -> Result<Vec<f32>, InferenceError> {
        self.calls += 1;
        let mut out = Vec::with_capacity(input.len_of(Axis(0)) * 2);
        for sequence in input.axis_iter(Axis(0)) {
            let z = Self::logit(sequence);
            match self.output {
                MockOutput::Logits => out.push(z),
                MockOutput::Probabilities => {
                    let p = 1.0 / (1.0 + (-z).exp());
                    out.push(1.0 - p);
                    out.push(p);
                }
            }
        }
        debug!("Mock model produced {} values", out.len());
        Ok(out)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
