//! Facial Feature Engine
//!
//! Turns per-frame face landmarks into drowsiness features:
//! - Eye aspect ratio (EAR), mouth aspect ratio (MAR)
//! - Pupil circularity (PUC) and mouth-over-eye ratio (MOE)
//! - Per-driver calibration baselines
//! - Exponentially smoothed feature windows for sequence classification

mod calibration;
mod features;
mod landmarks;
mod statistics;
mod window;

pub use calibration::{calibrate, CalibrationStats, FeatureStats};
pub use features::{FeatureExtractor, FeatureVector, FEATURE_DIMENSION, NO_FACE};
pub use landmarks::{LandmarkSet, Point3};
pub use statistics::StatisticalFeatures;
pub use window::{build_window, normalize, FeatureWindow, SmoothedState, DEFAULT_DECAY, MIN_STD};

use thiserror::Error;

/// Errors raised by the feature pipeline
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeatureError {
    /// Every calibration frame came back without a face
    #[error("Insufficient calibration data: {discarded} frames supplied, none contained a face")]
    InsufficientCalibrationData { discarded: usize },

    /// Smoothing decay outside [0, 1)
    #[error("Invalid smoothing decay {0}: must lie in [0, 1)")]
    InvalidDecay(f64),
}
