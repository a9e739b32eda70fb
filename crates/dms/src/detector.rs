//! Landmark detection seam
//!
//! Face-mesh detection itself is provided by an external model; the DMS only
//! relies on this contract: image in, ordered landmark set (or nothing) out.

use feature_engine::LandmarkSet;
use image::RgbImage;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Image to landmarks, or `None` when no face is found
pub trait LandmarkDetector: Send {
    fn detect(&mut self, image: &RgbImage) -> Option<LandmarkSet>;

    fn name(&self) -> &str {
        "detector"
    }
}

/// Frames for one calibration or classification request
#[derive(Debug, Clone)]
pub enum FrameBatch {
    /// Raw frames that still need landmark detection
    Images(Vec<RgbImage>),
    /// Frames already annotated by an upstream detector
    Landmarks(Vec<Option<LandmarkSet>>),
}

impl FrameBatch {
    pub fn len(&self) -> usize {
        match self {
            FrameBatch::Images(images) => images.len(),
            FrameBatch::Landmarks(sets) => sets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mirrors each frame horizontally before handing it to the inner detector,
/// for selfie-style cabin cameras.
pub struct Mirrored<D> {
    inner: D,
}

impl<D: LandmarkDetector> Mirrored<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

impl<D: LandmarkDetector> LandmarkDetector for Mirrored<D> {
    fn detect(&mut self, image: &RgbImage) -> Option<LandmarkSet> {
        let flipped = image::imageops::flip_horizontal(image);
        self.inner.detect(&flipped)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Replays a fixed sequence of detection results, ignoring image content.
/// Used for recorded sessions and tests.
pub struct ScriptedDetector {
    script: VecDeque<Option<LandmarkSet>>,
    cycle: bool,
}

impl ScriptedDetector {
    /// Play the script once, then report no face
    pub fn once(script: Vec<Option<LandmarkSet>>) -> Self {
        Self {
            script: script.into(),
            cycle: false,
        }
    }

    /// Play the script in a loop
    pub fn cycling(script: Vec<Option<LandmarkSet>>) -> Self {
        Self {
            script: script.into(),
            cycle: true,
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl LandmarkDetector for ScriptedDetector {
    fn detect(&mut self, _image: &RgbImage) -> Option<LandmarkSet> {
        let Some(next) = self.script.pop_front() else {
            debug!("Detector script exhausted");
            return None;
        };
        if self.cycle {
            self.script.push_back(next.clone());
        }
        next
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Placeholder when no detector is wired in: every frame is face-less
pub struct UnavailableDetector;

impl LandmarkDetector for UnavailableDetector {
    fn detect(&mut self, _image: &RgbImage) -> Option<LandmarkSet> {
        warn!("No landmark detector configured, frame treated as no-face");
        None
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::Point3;

    /// Reports a face only when the top-left pixel is bright
    struct CornerProbe;

    impl LandmarkDetector for CornerProbe {
        fn detect(&mut self, image: &RgbImage) -> Option<LandmarkSet> {
            (image.get_pixel(0, 0)[0] > 128).then(|| LandmarkSet::new(vec![Point3::default()]))
        }
    }

    #[test]
    fn test_mirrored_flips_before_detection() {
        let mut image = RgbImage::new(4, 2);
        image.put_pixel(3, 0, image::Rgb([255, 255, 255]));

        assert!(CornerProbe.detect(&image).is_none());
        assert!(Mirrored::new(CornerProbe).detect(&image).is_some());
    }

    #[test]
    fn test_scripted_once_then_none() {
        let face = LandmarkSet::new(vec![Point3::default()]);
        let mut detector = ScriptedDetector::once(vec![Some(face.clone()), None]);
        let image = RgbImage::new(1, 1);

        assert_eq!(detector.detect(&image), Some(face));
        assert_eq!(detector.detect(&image), None);
        assert_eq!(detector.detect(&image), None);
        assert_eq!(detector.remaining(), 0);
    }

    #[test]
    fn test_scripted_cycling() {
        let face = LandmarkSet::new(vec![Point3::default()]);
        let mut detector = ScriptedDetector::cycling(vec![Some(face.clone()), None]);
        let image = RgbImage::new(1, 1);

        for _ in 0..3 {
            assert!(detector.detect(&image).is_some());
            assert!(detector.detect(&image).is_none());
        }
    }

    #[test]
    fn test_batch_len() {
        assert_eq!(FrameBatch::Landmarks(vec![None, None]).len(), 2);
        assert!(FrameBatch::Images(vec![]).is_empty());
    }
}
