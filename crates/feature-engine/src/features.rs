//! Geometric Feature Extraction

use crate::landmarks::LandmarkSet;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::warn;

/// Number of features per frame (EAR, MAR, PUC, MOE)
pub const FEATURE_DIMENSION: usize = 4;

/// Reserved value marking a frame without a usable face
pub const NO_FACE: f64 = -1000.0;

/// Landmark index pairs for one facial region.
/// Pair 0 is horizontal (corners), pairs 1..=3 are vertical.
pub type RegionPairs = [[usize; 2]; 4];

/// MediaPipe Face Mesh indices
pub const RIGHT_EYE: RegionPairs = [[33, 133], [160, 144], [159, 145], [158, 153]];
pub const LEFT_EYE: RegionPairs = [[263, 362], [387, 373], [386, 374], [385, 380]];
pub const MOUTH: RegionPairs = [[61, 291], [39, 181], [0, 17], [269, 405]];

/// Per-frame drowsiness features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Eye aspect ratio (mean of both eyes)
    pub ear: f64,
    /// Mouth aspect ratio
    pub mar: f64,
    /// Pupil circularity (mean of both eyes)
    pub puc: f64,
    /// Mouth over eye (MAR / EAR)
    pub moe: f64,
}

impl FeatureVector {
    pub const fn new(ear: f64, mar: f64, puc: f64, moe: f64) -> Self {
        Self { ear, mar, puc, moe }
    }

    /// Sentinel vector for frames without a face
    pub const fn no_face() -> Self {
        Self::new(NO_FACE, NO_FACE, NO_FACE, NO_FACE)
    }

    pub fn is_no_face(&self) -> bool {
        self.ear == NO_FACE
    }

    pub fn to_array(&self) -> [f64; FEATURE_DIMENSION] {
        [self.ear, self.mar, self.puc, self.moe]
    }

    pub fn from_array(values: [f64; FEATURE_DIMENSION]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::no_face()
    }
}

/// Computes EAR/MAR/PUC/MOE from a landmark set
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    right_eye: RegionPairs,
    left_eye: RegionPairs,
    mouth: RegionPairs,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor {
    /// Create an extractor for the MediaPipe Face Mesh topology
    pub fn new() -> Self {
        Self::with_layout(RIGHT_EYE, LEFT_EYE, MOUTH)
    }

    /// Create an extractor for a custom landmark topology
    pub fn with_layout(right_eye: RegionPairs, left_eye: RegionPairs, mouth: RegionPairs) -> Self {
        Self {
            right_eye,
            left_eye,
            mouth,
        }
    }

    /// Extract the feature vector for one frame.
    ///
    /// `None` (no face detected) yields the sentinel vector. So does a set
    /// that is too short for the layout or whose geometry would divide by zero.
    pub fn extract(&self, landmarks: Option<&LandmarkSet>) -> FeatureVector {
        let Some(landmarks) = landmarks else {
            return FeatureVector::no_face();
        };

        match self.measure(landmarks) {
            Some(features) => features,
            None => {
                warn!(
                    "Unusable landmark set ({} points), treating frame as no-face",
                    landmarks.len()
                );
                FeatureVector::no_face()
            }
        }
    }

    fn measure(&self, landmarks: &LandmarkSet) -> Option<FeatureVector> {
        let ear = (aspect_ratio(landmarks, &self.left_eye)?
            + aspect_ratio(landmarks, &self.right_eye)?)
            / 2.0;
        let mar = aspect_ratio(landmarks, &self.mouth)?;
        let puc = (pupil_circularity(landmarks, &self.left_eye)?
            + pupil_circularity(landmarks, &self.right_eye)?)
            / 2.0;

        if ear <= 0.0 {
            return None;
        }

        Some(FeatureVector {
            ear,
            mar,
            puc,
            moe: mar / ear,
        })
    }
}

fn distance(landmarks: &LandmarkSet, a: usize, b: usize) -> Option<f64> {
    Some(landmarks.get(a)?.distance_xy(landmarks.get(b)?))
}

/// Mean of the three vertical distances over the horizontal one
fn aspect_ratio(landmarks: &LandmarkSet, pairs: &RegionPairs) -> Option<f64> {
    let horizontal = distance(landmarks, pairs[0][0], pairs[0][1])?;
    if horizontal <= f64::EPSILON {
        return None;
    }

    let mut vertical = 0.0;
    for pair in &pairs[1..] {
        vertical += distance(landmarks, pair[0], pair[1])?;
    }

    Some(vertical / (3.0 * horizontal))
}

/// 4πA / P² where A is the disc spanned by the eye opening and P walks the
/// upper lid corner to corner, then the lower lid back.
fn pupil_circularity(landmarks: &LandmarkSet, pairs: &RegionPairs) -> Option<f64> {
    let contour = [
        pairs[0][0],
        pairs[1][0],
        pairs[2][0],
        pairs[3][0],
        pairs[0][1],
        pairs[3][1],
        pairs[2][1],
        pairs[1][1],
    ];

    let mut perimeter = 0.0;
    for (i, &from) in contour.iter().enumerate() {
        let to = contour[(i + 1) % contour.len()];
        perimeter += distance(landmarks, from, to)?;
    }
    if perimeter <= f64::EPSILON {
        return None;
    }

    let radius = distance(landmarks, pairs[1][0], pairs[3][1])? * 0.5;
    let area = PI * radius * radius;

    Some((4.0 * PI * area) / (perimeter * perimeter))
}
