//! Summary Statistics

use serde::{Deserialize, Serialize};

/// Population statistics for one feature series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalFeatures {
    /// Mean value
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Number of samples
    pub count: usize,
}

impl StatisticalFeatures {
    /// Compute statistics from a slice of values.
    ///
    /// Uses a running (Welford) update so the mean of a constant series is
    /// exactly that constant and never drifts outside `[min, max]`.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut mean = 0.0;
        let mut m2 = 0.0;
        let mut min = f64::MAX;
        let mut max = f64::MIN;

        for (i, &v) in values.iter().enumerate() {
            let delta = v - mean;
            mean += delta / (i + 1) as f64;
            m2 += delta * (v - mean);
            min = min.min(v);
            max = max.max(v);
        }

        let n = values.len() as f64;
        let std_dev = (m2 / n).max(0.0).sqrt();

        Self {
            mean: mean.clamp(min, max),
            std_dev,
            min,
            max,
            count: values.len(),
        }
    }
}
