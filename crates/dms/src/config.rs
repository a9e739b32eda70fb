//! DMS configuration

use crate::state::LevelThresholds;
use feature_engine::DEFAULT_DECAY;
use inference_engine::InputMode;
use serde::{Deserialize, Serialize};

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// EMA decay for feature smoothing (0.9 = slow, heavy smoothing)
    pub decay: f64,

    /// How windows are fed to the classifier
    pub input_mode: InputMode,

    /// Frames collected per classification request
    pub window_frames: usize,

    /// Frames collected for the initial calibration pass
    pub calibration_frames: usize,

    /// Seed each window's smoothing with the previous window's final state
    pub carry_smoothing: bool,

    /// Score bands for drowsiness levels
    pub thresholds: LevelThresholds,

    /// Sequence classifier model path (mock model when unset)
    pub model_path: Option<String>,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            decay: DEFAULT_DECAY,
            input_mode: InputMode::Padded { target_len: 70 },
            window_frames: 70,
            calibration_frames: 60,
            carry_smoothing: false,
            thresholds: LevelThresholds::default(),
            model_path: None,
        }
    }
}

impl DmsConfig {
    /// 200-frame deployment of the padded classifier
    pub fn long_window() -> Self {
        Self {
            input_mode: InputMode::Padded { target_len: 200 },
            window_frames: 200,
            ..Default::default()
        }
    }

    /// Short overlapping slices (5 frames every 3) over a 20 frame window
    pub fn segmented() -> Self {
        Self {
            input_mode: InputMode::Segmented {
                segment_len: 5,
                stride: 3,
            },
            window_frames: 20,
            ..Default::default()
        }
    }

    /// Input shape to pin on the ONNX graph, when it is fixed by the mode
    pub fn model_input_shape(&self) -> Option<[usize; 3]> {
        match self.input_mode {
            InputMode::Padded { target_len } => Some([1, target_len, 4]),
            InputMode::Segmented { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(DmsConfig::default().model_input_shape(), Some([1, 70, 4]));
        assert_eq!(DmsConfig::long_window().model_input_shape(), Some([1, 200, 4]));
        assert_eq!(DmsConfig::segmented().model_input_shape(), None);
        assert!(!DmsConfig::default().carry_smoothing);
    }
}
