//! Temporal Smoothing and Window Assembly

use crate::calibration::CalibrationStats;
use crate::features::{FeatureExtractor, FeatureVector, FEATURE_DIMENSION};
use crate::landmarks::LandmarkSet;
use crate::FeatureError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// EMA decay applied per frame
pub const DEFAULT_DECAY: f64 = 0.9;

/// Lower bound on the calibration std used as a z-score divisor
pub const MIN_STD: f64 = 1e-4;

/// Running smoothed features.
///
/// A pass starts from all zeros, so its first valid frame is blended like
/// any other. The sentinel means "no face since last reset"; the first valid
/// frame after a reset is taken as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedState(FeatureVector);

impl SmoothedState {
    /// State at the start of a pass
    pub const fn zero() -> Self {
        Self(FeatureVector::new(0.0, 0.0, 0.0, 0.0))
    }

    /// State after a frame without a face
    pub const fn reset() -> Self {
        Self(FeatureVector::no_face())
    }

    pub fn is_reset(&self) -> bool {
        self.0.is_no_face()
    }

    pub fn features(&self) -> FeatureVector {
        self.0
    }

    /// Fold one normalized vector into the state. The first vector after a
    /// reset is taken as-is.
    pub fn update(&mut self, normalized: FeatureVector, decay: f64) {
        if self.is_reset() {
            self.0 = normalized;
            return;
        }

        let previous = self.0.to_array();
        let incoming = normalized.to_array();
        let mut blended = [0.0; FEATURE_DIMENSION];
        for i in 0..FEATURE_DIMENSION {
            blended[i] = previous[i] * decay + incoming[i] * (1.0 - decay);
        }
        self.0 = FeatureVector::from_array(blended);
    }
}

impl Default for SmoothedState {
    fn default() -> Self {
        Self::zero()
    }
}

/// One smoothed snapshot per input frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureWindow {
    rows: Vec<FeatureVector>,
}

impl FeatureWindow {
    pub fn new(rows: Vec<FeatureVector>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    /// Rows as `[EAR, MAR, PUC, MOE]` arrays, in frame order
    pub fn to_rows(&self) -> Vec<[f64; FEATURE_DIMENSION]> {
        self.rows.iter().map(FeatureVector::to_array).collect()
    }

    /// Frames in the window that had no face
    pub fn no_face_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_no_face()).count()
    }
}

impl From<Vec<FeatureVector>> for FeatureWindow {
    fn from(rows: Vec<FeatureVector>) -> Self {
        Self::new(rows)
    }
}

/// Z-score a raw vector against the calibration baselines
pub fn normalize(raw: &FeatureVector, stats: &CalibrationStats) -> FeatureVector {
    let values = raw.to_array();
    let baselines = stats.as_array();
    let mut out = [0.0; FEATURE_DIMENSION];
    for i in 0..FEATURE_DIMENSION {
        out[i] = (values[i] - baselines[i].mean) / baselines[i].std.max(MIN_STD);
    }
    FeatureVector::from_array(out)
}

/// Build the smoothed feature window for one classification request.
///
/// Pure over its inputs: smoothing starts from `initial` (normally
/// [`SmoothedState::zero`]) and the final state is handed back so a caller may
/// carry it into the next window. A frame without a face resets the state and
/// contributes a sentinel row.
pub fn build_window(
    extractor: &FeatureExtractor,
    frames: &[Option<LandmarkSet>],
    stats: &CalibrationStats,
    decay: f64,
    initial: SmoothedState,
) -> Result<(FeatureWindow, SmoothedState), FeatureError> {
    if !(0.0..1.0).contains(&decay) {
        return Err(FeatureError::InvalidDecay(decay));
    }

    let mut state = initial;
    let mut rows = Vec::with_capacity(frames.len());

    for landmarks in frames {
        let raw = extractor.extract(landmarks.as_ref());
        if raw.is_no_face() {
            state = SmoothedState::reset();
        } else {
            state.update(normalize(&raw, stats), decay);
        }
        rows.push(state.features());
    }

    let window = FeatureWindow::new(rows);
    debug!(
        "Built feature window: {} frames, {} without face",
        window.len(),
        window.no_face_count()
    );
    Ok((window, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::FeatureStats;
    use crate::features::tests::synthetic_face;
    use crate::features::NO_FACE;
    use proptest::prelude::*;

    fn unit_stats() -> CalibrationStats {
        let unit = FeatureStats { mean: 0.0, std: 1.0 };
        CalibrationStats {
            ear: unit,
            mar: unit,
            puc: unit,
            moe: unit,
            frames_used: 1,
            frames_discarded: 0,
        }
    }

    #[test]
    fn test_first_valid_frame_is_not_blended() {
        let mut state = SmoothedState::reset();
        let v = FeatureVector::new(1.0, 2.0, 3.0, 4.0);
        state.update(v, DEFAULT_DECAY);
        assert_eq!(state.features(), v);
    }

    #[test]
    fn test_blend_uses_decay() {
        let mut state = SmoothedState::reset();
        state.update(FeatureVector::new(1.0, 1.0, 1.0, 1.0), 0.9);
        state.update(FeatureVector::new(2.0, 0.0, 1.0, -1.0), 0.9);
        let f = state.features();
        assert!((f.ear - 1.1).abs() < 1e-12);
        assert!((f.mar - 0.9).abs() < 1e-12);
        assert!((f.puc - 1.0).abs() < 1e-12);
        assert!((f.moe - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_missing_face_resets_state() {
        let extractor = FeatureExtractor::new();
        let frames = vec![
            Some(synthetic_face(1.0, 1.0)),
            Some(synthetic_face(0.5, 1.0)),
            None,
            Some(synthetic_face(0.5, 1.0)),
        ];
        let stats = unit_stats();

        let (window, last) =
            build_window(&extractor, &frames, &stats, DEFAULT_DECAY, SmoothedState::zero())
                .unwrap();

        assert_eq!(window.len(), 4);
        assert_eq!(window.rows()[2].to_array(), [NO_FACE; FEATURE_DIMENSION]);
        // After the reset the next face is taken verbatim, not blended
        let fresh = extractor.extract(frames[3].as_ref());
        assert_eq!(window.rows()[3], fresh);
        assert_eq!(last.features(), fresh);
        // Before the reset the second frame was blended with the first
        assert_ne!(window.rows()[1], extractor.extract(frames[1].as_ref()));
        assert_eq!(window.no_face_count(), 1);
    }

    #[test]
    fn test_pass_starts_from_zero() {
        let extractor = FeatureExtractor::new();
        let face = synthetic_face(1.0, 1.0);
        let raw = extractor.extract(Some(&face));

        let (window, _) = build_window(
            &extractor,
            &[Some(face)],
            &unit_stats(),
            DEFAULT_DECAY,
            SmoothedState::default(),
        )
        .unwrap();

        // First frame of a pass is blended into zeros: 0.9 * 0 + 0.1 * normalized
        let row = window.rows()[0].to_array();
        for (got, want) in row.iter().zip(raw.to_array()) {
            assert!((got - 0.1 * want).abs() < 1e-12);
        }
        assert!((row[0] - 0.7 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalization_against_calibration() {
        let extractor = FeatureExtractor::new();
        let face = synthetic_face(1.0, 1.0);
        let stats = calibrate_two(&extractor);

        let (window, _) = build_window(
            &extractor,
            &[Some(face)],
            &stats,
            DEFAULT_DECAY,
            SmoothedState::reset(),
        )
        .unwrap();

        let row = window.rows()[0];
        let expected = (7.0 / 12.0 - stats.ear.mean) / stats.ear.std;
        assert!((row.ear - expected).abs() < 1e-9);
    }

    fn calibrate_two(extractor: &FeatureExtractor) -> CalibrationStats {
        crate::calibration::calibrate(
            extractor,
            &[Some(synthetic_face(1.0, 1.0)), Some(synthetic_face(0.8, 1.2))],
        )
        .unwrap()
    }

    #[test]
    fn test_zero_std_does_not_produce_inf() {
        let extractor = FeatureExtractor::new();
        let stats = crate::calibration::calibrate(&extractor, &[Some(synthetic_face(1.0, 1.0))])
            .unwrap();
        let (window, _) = build_window(
            &extractor,
            &[Some(synthetic_face(0.5, 1.0))],
            &stats,
            DEFAULT_DECAY,
            SmoothedState::reset(),
        )
        .unwrap();
        assert!(window.rows()[0].to_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_carry_over_state() {
        let extractor = FeatureExtractor::new();
        let stats = unit_stats();
        let frames = vec![Some(synthetic_face(1.0, 1.0))];

        let (_, carried) =
            build_window(&extractor, &frames, &stats, DEFAULT_DECAY, SmoothedState::reset())
                .unwrap();
        let (fresh, _) =
            build_window(&extractor, &frames, &stats, DEFAULT_DECAY, SmoothedState::reset())
                .unwrap();
        let (continued, _) =
            build_window(&extractor, &frames, &stats, DEFAULT_DECAY, carried).unwrap();

        // Same frame twice: blending a value with itself leaves it unchanged
        assert!((fresh.rows()[0].ear - continued.rows()[0].ear).abs() < 1e-12);
        assert!(!carried.is_reset());
    }

    #[test]
    fn test_rejects_bad_decay() {
        let extractor = FeatureExtractor::new();
        let err = build_window(&extractor, &[], &unit_stats(), 1.5, SmoothedState::reset())
            .unwrap_err();
        assert_eq!(err, FeatureError::InvalidDecay(1.5));

        // Upper bound is exclusive
        let err = build_window(&extractor, &[], &unit_stats(), 1.0, SmoothedState::zero())
            .unwrap_err();
        assert_eq!(err, FeatureError::InvalidDecay(1.0));
        assert!(build_window(&extractor, &[], &unit_stats(), 0.0, SmoothedState::zero()).is_ok());
    }

    proptest! {
        #[test]
        fn prop_smoothing_is_contraction(
            previous in -10.0f64..10.0,
            incoming in -10.0f64..10.0,
        ) {
            let mut state = SmoothedState::reset();
            let uniform = |v: f64| FeatureVector::new(v, v, v, v);
            state.update(uniform(previous), DEFAULT_DECAY);
            state.update(uniform(incoming), DEFAULT_DECAY);

            let lo = previous.min(incoming);
            let hi = previous.max(incoming);
            for v in state.features().to_array() {
                prop_assert!(v >= lo - 1e-12 && v <= hi + 1e-12);
                if (hi - lo) > 1e-6 {
                    prop_assert!(v > lo && v < hi);
                }
            }
        }

        #[test]
        fn prop_window_length_matches_frames(
            present in prop::collection::vec(any::<bool>(), 0..40),
        ) {
            let extractor = FeatureExtractor::new();
            let frames: Vec<Option<LandmarkSet>> = present
                .iter()
                .map(|&p| p.then(|| synthetic_face(1.0, 1.0)))
                .collect();
            let (window, _) = build_window(
                &extractor,
                &frames,
                &unit_stats(),
                DEFAULT_DECAY,
                SmoothedState::zero(),
            )
            .unwrap();
            prop_assert_eq!(window.len(), frames.len());
            prop_assert_eq!(window.no_face_count(), present.iter().filter(|p| !**p).count());
        }
    }
}
