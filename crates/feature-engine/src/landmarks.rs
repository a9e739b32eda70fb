//! Face landmark containers

use serde::{Deserialize, Serialize};

/// A single landmark: x/y in pixels, z as relative depth
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar distance; depth is ignored for all feature metrics
    pub fn distance_xy(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Ordered landmark set produced by a face-mesh detector for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Point3>,
}

impl LandmarkSet {
    /// Wrap already pixel-scaled points
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// Build from detector output normalized to [0, 1], scaling x by the
    /// image width and y by the image height. Depth stays relative.
    pub fn from_normalized(points: &[[f32; 3]], width: u32, height: u32) -> Self {
        let w = width as f64;
        let h = height as f64;
        Self {
            points: points
                .iter()
                .map(|p| Point3::new(p[0] as f64 * w, p[1] as f64 * h, p[2] as f64))
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Point3> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }
}

impl From<Vec<Point3>> for LandmarkSet {
    fn from(points: Vec<Point3>) -> Self {
        Self::new(points)
    }
}
