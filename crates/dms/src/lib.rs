//! Driver Monitoring System (DMS)
//!
//! Facial drowsiness scoring for a single driver session:
//! - Landmark detection through a pluggable detector
//! - Per-driver calibration of EAR/MAR/PUC/MOE baselines
//! - Smoothed feature windows classified by a sequence model
//! - A background worker so frame sampling never waits on the model

pub mod analysis;
pub mod config;
pub mod detector;
pub mod state;
pub mod worker;

pub use analysis::DrowsinessEstimate;
pub use config::DmsConfig;
pub use detector::{FrameBatch, LandmarkDetector, Mirrored, ScriptedDetector, UnavailableDetector};
pub use inference_engine::InputMode;
pub use state::{DrowsinessLevel, LevelThresholds};
pub use worker::{ClassificationWorker, SubmitOutcome, WorkerHandle, WorkerStats};

use feature_engine::{
    build_window, calibrate, CalibrationStats, FeatureError, FeatureExtractor, LandmarkSet,
    SmoothedState,
};
use inference_engine::{
    ClassifierAdapter, InferenceError, MockOutput, MockSequenceModel, SequenceModel,
    TractSequenceModel,
};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Feature pipeline failed: {0}")]
    Feature(#[from] FeatureError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Classification worker stopped")]
    WorkerStopped,
}

/// Build the classifier adapter described by the configuration.
///
/// Without a model path a deterministic mock model is used.
pub fn build_adapter(config: &DmsConfig) -> Result<ClassifierAdapter, DmsError> {
    let model: Box<dyn SequenceModel> = match &config.model_path {
        Some(path) => Box::new(
            TractSequenceModel::load(path, config.model_input_shape())
                .map_err(|e| DmsError::ModelLoad(e.to_string()))?,
        ),
        None => {
            warn!("No classifier model path configured. Using mock implementation.");
            let output = match config.input_mode {
                InputMode::Padded { .. } => MockOutput::Probabilities,
                InputMode::Segmented { .. } => MockOutput::Logits,
            };
            Box::new(MockSequenceModel::new(output))
        }
    };
    Ok(ClassifierAdapter::new(model, config.input_mode))
}

/// One driver session: detector, calibration baselines and classifier.
///
/// The only way to obtain a monitor is through calibration (or supplying
/// stats from an earlier calibration), so classification can never run
/// against missing baselines.
pub struct DrowsinessMonitor {
    config: DmsConfig,
    extractor: FeatureExtractor,
    detector: Box<dyn LandmarkDetector>,
    calibration: CalibrationStats,
    adapter: ClassifierAdapter,
    carried: SmoothedState,
    windows_classified: u64,
}

impl DrowsinessMonitor {
    /// Calibrate on the given frames and create the session
    pub fn calibrate(
        config: DmsConfig,
        mut detector: Box<dyn LandmarkDetector>,
        adapter: ClassifierAdapter,
        frames: FrameBatch,
    ) -> Result<Self, DmsError> {
        Self::validate(&config)?;
        info!("Calibrating drowsiness baselines on {} frames", frames.len());

        let extractor = FeatureExtractor::new();
        let landmarks = detect_all(detector.as_mut(), frames);
        let calibration = calibrate(&extractor, &landmarks)?;

        Ok(Self {
            config,
            extractor,
            detector,
            calibration,
            adapter,
            carried: SmoothedState::zero(),
            windows_classified: 0,
        })
    }

    /// Create the session from previously computed baselines
    pub fn with_calibration(
        config: DmsConfig,
        detector: Box<dyn LandmarkDetector>,
        adapter: ClassifierAdapter,
        calibration: CalibrationStats,
    ) -> Result<Self, DmsError> {
        Self::validate(&config)?;
        Ok(Self {
            config,
            extractor: FeatureExtractor::new(),
            detector,
            calibration,
            adapter,
            carried: SmoothedState::zero(),
            windows_classified: 0,
        })
    }

    fn validate(config: &DmsConfig) -> Result<(), DmsError> {
        if !(0.0..1.0).contains(&config.decay) {
            return Err(DmsError::Config(format!(
                "decay must lie in [0, 1), got {}",
                config.decay
            )));
        }
        if config.window_frames == 0 {
            return Err(DmsError::Config("window_frames must be positive".into()));
        }
        match config.input_mode {
            InputMode::Padded { target_len } if target_len == 0 => {
                Err(DmsError::Config("target_len must be positive".into()))
            }
            InputMode::Segmented { segment_len, stride } if segment_len == 0 || stride == 0 => {
                Err(DmsError::Config("segment_len and stride must be positive".into()))
            }
            _ => Ok(()),
        }
    }

    /// Score one window of frames
    pub fn classify(&mut self, frames: FrameBatch) -> Result<DrowsinessEstimate, DmsError> {
        let start = Instant::now();
        let landmarks = detect_all(self.detector.as_mut(), frames);

        let initial = if self.config.carry_smoothing {
            self.carried
        } else {
            SmoothedState::zero()
        };
        let (window, last) = build_window(
            &self.extractor,
            &landmarks,
            &self.calibration,
            self.config.decay,
            initial,
        )?;
        self.carried = last;

        let result = self.adapter.classify(&window)?;
        let score = result.drowsiness().clamp(0.0, 1.0);
        self.windows_classified += 1;

        let estimate = DrowsinessEstimate {
            score,
            probabilities: result.probabilities,
            level: self.config.thresholds.level(score),
            frames: window.len(),
            frames_without_face: window.no_face_count(),
            timestamp_ms: now_ms(),
            latency_ms: start.elapsed().as_millis() as u64,
        };

        debug!(
            "Window {}: drowsiness {:.1}% ({:?}), {} of {} frames without face",
            self.windows_classified,
            estimate.percentage(),
            estimate.level,
            estimate.frames_without_face,
            estimate.frames
        );
        Ok(estimate)
    }

    pub fn calibration(&self) -> &CalibrationStats {
        &self.calibration
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn windows_classified(&self) -> u64 {
        self.windows_classified
    }

    /// Forget carried smoothing state (on driver change or a long gap)
    pub fn reset_smoothing(&mut self) {
        self.carried = SmoothedState::zero();
    }
}

fn detect_all(detector: &mut dyn LandmarkDetector, frames: FrameBatch) -> Vec<Option<LandmarkSet>> {
    match frames {
        FrameBatch::Landmarks(sets) => sets,
        FrameBatch::Images(images) => images.iter().map(|image| detector.detect(image)).collect(),
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
