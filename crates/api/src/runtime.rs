//! Background sampling loops
//!
//! Two periodic loops drive the system: the frame sampler collects frames
//! into windows and hands them to the classification worker, and the risk
//! sampler combines the latest drowsiness score with the current context.

use dms::{
    build_adapter, ClassificationWorker, DmsError, DrowsinessMonitor, FrameBatch, SubmitOutcome,
    UnavailableDetector, WorkerHandle,
};
use feature_engine::LandmarkSet;
use risk_engine::{RiskEngine, RiskError};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::settings::Settings;
use crate::{RiskRequest, SharedState};

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Cannot read frame source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame source line {line} is not a landmark set: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Frame source has {available} frames, {required} needed for calibration")]
    ShortSource { available: usize, required: usize },

    #[error(transparent)]
    Dms(#[from] DmsError),

    #[error(transparent)]
    Risk(#[from] RiskError),
}

/// Build the risk engine from the configured rules, or the bundled ones
pub fn build_risk_engine(settings: &Settings) -> Result<RiskEngine, RiskError> {
    match &settings.risk.rules_path {
        Some(path) => RiskEngine::from_rules_path(path),
        None => RiskEngine::with_default_rules(),
    }
}

/// Read recorded landmarks: one JSON array of `{x, y, z}` points per line,
/// `null` for a frame without a face. Blank lines are skipped.
pub fn load_landmarks(path: impl AsRef<Path>) -> Result<Vec<Option<LandmarkSet>>, RuntimeError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let mut frames = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let frame = serde_json::from_str::<Option<LandmarkSet>>(line)
            .map_err(|source| RuntimeError::Parse { line: i + 1, source })?;
        frames.push(frame);
    }
    info!("Loaded {} recorded frames from {}", frames.len(), path.as_ref().display());
    Ok(frames)
}

/// Replays recorded frames, optionally looping
pub struct FrameReplay {
    frames: Vec<Option<LandmarkSet>>,
    position: usize,
    repeat: bool,
}

impl FrameReplay {
    pub fn new(frames: Vec<Option<LandmarkSet>>, repeat: bool) -> Self {
        Self {
            frames,
            position: 0,
            repeat,
        }
    }

    /// Next frame, `None` once the recording is exhausted
    pub fn next_frame(&mut self) -> Option<Option<LandmarkSet>> {
        if self.position >= self.frames.len() {
            if !self.repeat || self.frames.is_empty() {
                return None;
            }
            debug!("Frame replay restarting");
            self.position = 0;
        }
        let frame = self.frames[self.position].clone();
        self.position += 1;
        Some(frame)
    }
}

/// Calibrate on the head of the recording and start the worker.
/// Returns the worker and the frames left for classification.
pub fn start_classifier(
    settings: &Settings,
    mut frames: Vec<Option<LandmarkSet>>,
) -> Result<(ClassificationWorker, Vec<Option<LandmarkSet>>), RuntimeError> {
    let required = settings.dms.calibration_frames;
    if frames.len() < required {
        return Err(RuntimeError::ShortSource {
            available: frames.len(),
            required,
        });
    }
    let rest = frames.split_off(required);

    let adapter = build_adapter(&settings.dms)?;
    // Frames arrive pre-annotated, so no image detector is needed
    let monitor = DrowsinessMonitor::calibrate(
        settings.dms.clone(),
        Box::new(UnavailableDetector),
        adapter,
        FrameBatch::Landmarks(frames),
    )?;

    Ok((ClassificationWorker::spawn(monitor), rest))
}

/// Pace frames out of the replay and submit each full window
pub async fn frame_sampler(
    handle: WorkerHandle,
    mut replay: FrameReplay,
    window_frames: usize,
    frame_interval: Duration,
) {
    info!(
        "Frame sampler started: {} frames per window, {}ms per frame",
        window_frames,
        frame_interval.as_millis()
    );
    let mut ticker = tokio::time::interval(frame_interval);
    let mut window = Vec::with_capacity(window_frames);

    loop {
        ticker.tick().await;
        let Some(frame) = replay.next_frame() else {
            info!("Frame source exhausted");
            break;
        };
        window.push(frame);
        if window.len() < window_frames {
            continue;
        }

        let batch = FrameBatch::Landmarks(std::mem::take(&mut window));
        match handle.submit(batch) {
            Ok(SubmitOutcome::Accepted) => debug!("Window submitted"),
            Ok(SubmitOutcome::Dropped) => warn!("Classifier busy, window dropped"),
            Err(e) => {
                warn!("Stopping frame sampler: {}", e);
                break;
            }
        }
    }
}

/// Assess risk on a fixed interval and publish the result
pub async fn risk_sampler(state: SharedState, interval: Duration) {
    info!("Risk sampler started: every {}s", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        let assessment = {
            let guard = state.read().await;
            if guard.latest_estimate().is_none() {
                debug!("No drowsiness estimate yet, skipping risk assessment");
                continue;
            }
            guard.assess(&RiskRequest::default())
        };

        match assessment {
            Ok(assessment) => {
                if assessment.level.requires_alert() {
                    warn!(
                        "Driving risk {} (drowsiness {:.0}%, {:.0} km/h)",
                        assessment.level,
                        assessment.inputs.sleep * 100.0,
                        assessment.inputs.speed_kmh
                    );
                } else {
                    info!("Driving risk {}", assessment.level);
                }
                state.write().await.latest_risk = Some(assessment);
            }
            Err(e) => warn!("Risk assessment failed: {}", e),
        }
    }
}
