//! Per-driver Calibration
//!
//! Baselines are computed once from a batch of frames of the driver in an
//! alert state and then used to z-score every later frame.

use crate::features::{FeatureExtractor, FeatureVector, FEATURE_DIMENSION};
use crate::landmarks::LandmarkSet;
use crate::statistics::StatisticalFeatures;
use crate::FeatureError;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Mean and population standard deviation of one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std: f64,
}

impl From<StatisticalFeatures> for FeatureStats {
    fn from(stats: StatisticalFeatures) -> Self {
        Self {
            mean: stats.mean,
            std: stats.std_dev,
        }
    }
}

/// Calibration baselines, one entry per feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationStats {
    pub ear: FeatureStats,
    pub mar: FeatureStats,
    pub puc: FeatureStats,
    pub moe: FeatureStats,
    /// Frames that contributed
    pub frames_used: usize,
    /// Frames dropped because no face was found
    pub frames_discarded: usize,
}

impl CalibrationStats {
    /// Compute baselines from already extracted feature vectors.
    /// Sentinel (no-face) vectors are skipped.
    pub fn from_features(features: &[FeatureVector]) -> Result<Self, FeatureError> {
        let valid: Vec<&FeatureVector> = features.iter().filter(|f| !f.is_no_face()).collect();
        let discarded = features.len() - valid.len();

        if valid.is_empty() {
            return Err(FeatureError::InsufficientCalibrationData { discarded });
        }

        let series = |pick: fn(&FeatureVector) -> f64| -> FeatureStats {
            let values: Vec<f64> = valid.iter().map(|f| pick(f)).collect();
            StatisticalFeatures::compute(&values).into()
        };

        Ok(Self {
            ear: series(|f| f.ear),
            mar: series(|f| f.mar),
            puc: series(|f| f.puc),
            moe: series(|f| f.moe),
            frames_used: valid.len(),
            frames_discarded: discarded,
        })
    }

    /// Stats in feature order (EAR, MAR, PUC, MOE)
    pub fn as_array(&self) -> [FeatureStats; FEATURE_DIMENSION] {
        [self.ear, self.mar, self.puc, self.moe]
    }
}

/// Calibrate from one landmark detection result per calibration frame
pub fn calibrate(
    extractor: &FeatureExtractor,
    frames: &[Option<LandmarkSet>],
) -> Result<CalibrationStats, FeatureError> {
    let features: Vec<FeatureVector> = frames
        .iter()
        .map(|landmarks| extractor.extract(landmarks.as_ref()))
        .collect();

    let stats = CalibrationStats::from_features(&features)?;
    info!(
        "Calibration complete: {} frames used, {} discarded (EAR {:.4}±{:.4}, MAR {:.4}±{:.4})",
        stats.frames_used,
        stats.frames_discarded,
        stats.ear.mean,
        stats.ear.std,
        stats.mar.mean,
        stats.mar.std
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::synthetic_face;
    use proptest::prelude::*;

    fn vector(ear: f64, mar: f64) -> FeatureVector {
        FeatureVector::new(ear, mar, 0.5, mar / ear)
    }

    #[test]
    fn test_calibrate_skips_missing_faces() {
        let extractor = FeatureExtractor::new();
        let frames = vec![
            Some(synthetic_face(1.0, 1.0)),
            None,
            Some(synthetic_face(1.0, 1.0)),
            None,
        ];

        let stats = calibrate(&extractor, &frames).unwrap();
        assert_eq!(stats.frames_used, 2);
        assert_eq!(stats.frames_discarded, 2);
        assert!((stats.ear.mean - 7.0 / 12.0).abs() < 1e-12);
        assert_eq!(stats.ear.std, 0.0);
    }

    #[test]
    fn test_calibrate_without_faces_fails() {
        let extractor = FeatureExtractor::new();
        let err = calibrate(&extractor, &[None, None, None]).unwrap_err();
        assert_eq!(err, FeatureError::InsufficientCalibrationData { discarded: 3 });

        let err = calibrate(&extractor, &[]).unwrap_err();
        assert_eq!(err, FeatureError::InsufficientCalibrationData { discarded: 0 });
    }

    #[test]
    fn test_population_std() {
        let features = vec![vector(0.2, 0.4), vector(0.4, 0.4)];
        let stats = CalibrationStats::from_features(&features).unwrap();
        assert!((stats.ear.mean - 0.3).abs() < 1e-12);
        assert!((stats.ear.std - 0.1).abs() < 1e-12);
        assert_eq!(stats.mar.std, 0.0);
    }

    fn feature_strategy() -> impl Strategy<Value = FeatureVector> {
        (0.05f64..0.6, 0.1f64..1.5, 0.1f64..0.9)
            .prop_map(|(ear, mar, puc)| FeatureVector::new(ear, mar, puc, mar / ear))
    }

    proptest! {
        #[test]
        fn prop_stats_bounded(features in prop::collection::vec(feature_strategy(), 1..64)) {
            let stats = CalibrationStats::from_features(&features).unwrap();
            let series = [
                (stats.ear, features.iter().map(|f| f.ear).collect::<Vec<_>>()),
                (stats.mar, features.iter().map(|f| f.mar).collect::<Vec<_>>()),
                (stats.puc, features.iter().map(|f| f.puc).collect::<Vec<_>>()),
                (stats.moe, features.iter().map(|f| f.moe).collect::<Vec<_>>()),
            ];
            for (s, values) in series {
                let min = values.iter().cloned().fold(f64::MAX, f64::min);
                let max = values.iter().cloned().fold(f64::MIN, f64::max);
                prop_assert!(s.std >= 0.0);
                prop_assert!(s.mean >= min && s.mean <= max);
            }
        }

        #[test]
        fn prop_no_face_frames_do_not_change_stats(
            features in prop::collection::vec(feature_strategy(), 1..32),
            gaps in prop::collection::vec(0usize..32, 0..16),
        ) {
            let baseline = CalibrationStats::from_features(&features).unwrap();

            let mut padded = features.clone();
            for gap in gaps {
                let at = gap.min(padded.len());
                padded.insert(at, FeatureVector::no_face());
            }
            let with_gaps = CalibrationStats::from_features(&padded).unwrap();

            prop_assert_eq!(baseline.as_array(), with_gaps.as_array());
            prop_assert_eq!(baseline.frames_used, with_gaps.frames_used);
        }
    }
}
