//! Weather condition mapping
//!
//! Maps provider condition ids (OpenWeatherMap numbering) onto the three
//! categories the rule base knows about.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

/// Weather category fed to the risk engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Normal,
    Rainy,
    Inclement,
    /// Condition id not covered by any table
    Unknown,
}

impl WeatherCondition {
    /// Numeric code: 0, 1, 2, or -1 for unknown
    pub fn code(&self) -> i8 {
        match self {
            WeatherCondition::Normal => 0,
            WeatherCondition::Rainy => 1,
            WeatherCondition::Inclement => 2,
            WeatherCondition::Unknown => -1,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => WeatherCondition::Normal,
            1 => WeatherCondition::Rainy,
            2 => WeatherCondition::Inclement,
            _ => WeatherCondition::Unknown,
        }
    }
}

/// Condition id ranges per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherTable {
    pub inclement: Vec<RangeInclusive<u32>>,
    pub rainy: Vec<RangeInclusive<u32>>,
    pub normal: Vec<RangeInclusive<u32>>,
}

impl Default for WeatherTable {
    fn default() -> Self {
        Self {
            // Thunderstorm, freezing rain, snow, fog/dust/squalls
            inclement: vec![200..=232, 511..=511, 600..=622, 701..=781],
            // Drizzle, rain, showers
            rainy: vec![300..=321, 500..=504, 520..=531],
            // Clear, clouds
            normal: vec![800..=804],
        }
    }
}

impl WeatherTable {
    /// Classify a condition id. Tables are checked inclement first, so an id
    /// listed twice takes the more severe category.
    pub fn classify(&self, id: u32) -> WeatherCondition {
        let hit = |ranges: &[RangeInclusive<u32>]| ranges.iter().any(|r| r.contains(&id));

        let condition = if hit(&self.inclement) {
            WeatherCondition::Inclement
        } else if hit(&self.rainy) {
            WeatherCondition::Rainy
        } else if hit(&self.normal) {
            WeatherCondition::Normal
        } else {
            WeatherCondition::Unknown
        };
        debug!("Weather id {} classified as {:?}", id, condition);
        condition
    }
}
