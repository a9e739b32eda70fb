//! Classifier Adapter
//!
//! Shapes a smoothed feature window into the tensor the trained model
//! expects, runs it, and reads the class probabilities back.

use crate::engine::SequenceModel;
use crate::InferenceError;
use feature_engine::{FeatureWindow, FEATURE_DIMENSION};
use ndarray::{s, Array2, Array3, ArrayView2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// How a window is presented to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputMode {
    /// One `[1, target_len, 4]` sequence, zero padded or truncated.
    /// The model returns `[p_alert, p_drowsy]`.
    Padded { target_len: usize },
    /// Overlapping `[segment_len, 4]` slices batched together. The model
    /// returns one logit per slice; the drowsy probability is the mean sigmoid.
    Segmented { segment_len: usize, stride: usize },
}

impl Default for InputMode {
    fn default() -> Self {
        InputMode::Padded { target_len: 70 }
    }
}

/// Alert/drowsy probabilities for one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// `[p_alert, p_drowsy]`
    pub probabilities: [f64; 2],
}

impl ClassificationResult {
    /// Probability of class 1 (drowsy)
    pub fn drowsiness(&self) -> f64 {
        self.probabilities[1]
    }

    /// Probability of class 0 (alert)
    pub fn alertness(&self) -> f64 {
        self.probabilities[0]
    }
}

/// Right-pad with zero rows or keep the first `target_len` rows.
///
/// # Panics
///
/// If `rows` is not `FEATURE_DIMENSION` columns wide. A window of the wrong
/// width is a programming error, not a runtime condition.
pub fn pad_or_truncate(rows: ArrayView2<f32>, target_len: usize) -> Array2<f32> {
    assert_eq!(
        rows.ncols(),
        FEATURE_DIMENSION,
        "feature window must be {} columns wide",
        FEATURE_DIMENSION
    );

    let mut out = Array2::<f32>::zeros((target_len, FEATURE_DIMENSION));
    let keep = rows.nrows().min(target_len);
    out.slice_mut(s![..keep, ..]).assign(&rows.slice(s![..keep, ..]));
    out
}

/// Cut overlapping slices of `segment_len` rows starting every `stride` rows.
///
/// Only slices that fit entirely are produced; a window shorter than one
/// slice yields a single zero-padded slice.
///
/// # Panics
///
/// On a window of the wrong width, or a zero `segment_len`/`stride`.
pub fn segment(rows: ArrayView2<f32>, segment_len: usize, stride: usize) -> Array3<f32> {
    assert!(segment_len > 0 && stride > 0, "segment length and stride must be positive");
    assert_eq!(
        rows.ncols(),
        FEATURE_DIMENSION,
        "feature window must be {} columns wide",
        FEATURE_DIMENSION
    );

    let n = rows.nrows();
    if n < segment_len {
        let padded = pad_or_truncate(rows, segment_len);
        return padded.insert_axis(ndarray::Axis(0));
    }

    let starts: Vec<usize> = (0..=n - segment_len).step_by(stride).collect();
    let mut out = Array3::<f32>::zeros((starts.len(), segment_len, FEATURE_DIMENSION));
    for (i, start) in starts.into_iter().enumerate() {
        out.slice_mut(s![i, .., ..])
            .assign(&rows.slice(s![start..start + segment_len, ..]));
    }
    out
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Owns the model handle. Not internally synchronized: a single adapter
/// must only ever serve one classification at a time.
pub struct ClassifierAdapter {
    model: Box<dyn SequenceModel>,
    mode: InputMode,
    invocations: u64,
}

impl ClassifierAdapter {
    /// Create a new adapter around a model
    pub fn new(model: Box<dyn SequenceModel>, mode: InputMode) -> Self {
        Self {
            model,
            mode,
            invocations: 0,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Number of completed model invocations
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Classify a smoothed feature window
    pub fn classify(
        &mut self,
        window: &FeatureWindow,
    ) -> Result<ClassificationResult, InferenceError> {
        let rows: Vec<f32> = window
            .to_rows()
            .iter()
            .flat_map(|row| row.iter().map(|v| *v as f32))
            .collect();
        let matrix = ArrayView2::from_shape((window.len(), FEATURE_DIMENSION), &rows)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        self.classify_matrix(matrix)
    }

    /// Classify a raw `[frames, 4]` matrix.
    ///
    /// # Panics
    ///
    /// If the matrix is not four features wide.
    pub fn classify_matrix(
        &mut self,
        rows: ArrayView2<f32>,
    ) -> Result<ClassificationResult, InferenceError> {
        let start = Instant::now();
        let frames = rows.nrows();

        let result = match self.mode {
            InputMode::Padded { target_len } => {
                let input = pad_or_truncate(rows, target_len).insert_axis(ndarray::Axis(0));
                let output = self.model.run(&input)?;
                if output.len() != 2 {
                    return Err(InferenceError::InvalidOutputShape {
                        expected: 2,
                        actual: output.len(),
                    });
                }
                ClassificationResult {
                    probabilities: [output[0] as f64, output[1] as f64],
                }
            }
            InputMode::Segmented { segment_len, stride } => {
                let input = segment(rows, segment_len, stride);
                let segments = input.len_of(ndarray::Axis(0));
                let output = self.model.run(&input)?;
                if output.len() != segments {
                    return Err(InferenceError::InvalidOutputShape {
                        expected: segments,
                        actual: output.len(),
                    });
                }
                let p = output.iter().map(|z| sigmoid(*z as f64)).sum::<f64>() / segments as f64;
                ClassificationResult {
                    probabilities: [1.0 - p, p],
                }
            }
        };

        self.invocations += 1;
        debug!(
            "Classified {} frames with {} in {}ms: p_drowsy={:.3}",
            frames,
            self.model.name(),
            start.elapsed().as_millis(),
            result.drowsiness()
        );
        Ok(result)
    }
}
