//! Drowsiness levels

use serde::{Deserialize, Serialize};

/// Drowsiness level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DrowsinessLevel {
    #[default]
    Normal,
    Mild,
    Moderate,
    High,
}

impl DrowsinessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrowsinessLevel::Normal => "normal",
            DrowsinessLevel::Mild => "mild",
            DrowsinessLevel::Moderate => "moderate",
            DrowsinessLevel::High => "high",
        }
    }
}

/// Lower score bounds for each level above `Normal`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelThresholds {
    pub mild: f64,
    pub moderate: f64,
    pub high: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            mild: 0.4,
            moderate: 0.6,
            high: 0.8,
        }
    }
}

impl LevelThresholds {
    /// Map a drowsiness probability to a level
    pub fn level(&self, score: f64) -> DrowsinessLevel {
        if score >= self.high {
            DrowsinessLevel::High
        } else if score >= self.moderate {
            DrowsinessLevel::Moderate
        } else if score >= self.mild {
            DrowsinessLevel::Mild
        } else {
            DrowsinessLevel::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        let t = LevelThresholds::default();
        assert_eq!(t.level(0.1), DrowsinessLevel::Normal);
        assert_eq!(t.level(0.4), DrowsinessLevel::Mild);
        assert_eq!(t.level(0.65), DrowsinessLevel::Moderate);
        assert_eq!(t.level(0.95), DrowsinessLevel::High);
        assert!(DrowsinessLevel::High > DrowsinessLevel::Mild);
    }
}
