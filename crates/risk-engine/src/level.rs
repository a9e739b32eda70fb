//! Risk categories

use crate::RiskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Driving risk category, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// All levels in ascending order (also the output term order)
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::VeryLow,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::VeryHigh,
    ];

    /// Rule-base label
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "very_low",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }

    /// Display asset (gauge image) for the level
    pub fn asset_key(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "risk/very_low.png",
            RiskLevel::Low => "risk/low.png",
            RiskLevel::Medium => "risk/medium.png",
            RiskLevel::High => "risk/high.png",
            RiskLevel::VeryHigh => "risk/very_high.png",
        }
    }

    /// Whether the driver should be warned
    pub fn requires_alert(&self) -> bool {
        *self >= RiskLevel::High
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| RiskError::UnknownLevel(s.to_string()))
    }
}
