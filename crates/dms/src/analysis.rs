//! DMS classification results

use crate::state::DrowsinessLevel;
use serde::{Deserialize, Serialize};

/// Drowsiness estimate for one classified window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrowsinessEstimate {
    /// Probability of the drowsy class, in [0, 1]
    pub score: f64,

    /// `[p_alert, p_drowsy]` as returned by the classifier
    pub probabilities: [f64; 2],

    /// Banded level for display
    pub level: DrowsinessLevel,

    /// Frames in the window
    pub frames: usize,

    /// Frames where no face was found
    pub frames_without_face: usize,

    /// Wall clock time the estimate was produced (ms since epoch)
    pub timestamp_ms: u64,

    /// Time spent on feature extraction plus model call
    pub latency_ms: u64,
}

impl DrowsinessEstimate {
    /// Score as a 0-100 percentage
    pub fn percentage(&self) -> f64 {
        self.score * 100.0
    }

    /// Whether at least one frame in the window showed a face
    pub fn face_visible(&self) -> bool {
        self.frames_without_face < self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_and_visibility() {
        let estimate = DrowsinessEstimate {
            score: 0.25,
            probabilities: [0.75, 0.25],
            level: DrowsinessLevel::Normal,
            frames: 10,
            frames_without_face: 10,
            timestamp_ms: 0,
            latency_ms: 1,
        };
        assert!((estimate.percentage() - 25.0).abs() < 1e-12);
        assert!(!estimate.face_visible());
    }
}
