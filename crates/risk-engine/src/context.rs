//! Calendar inputs for the risk engine

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// How weekdays are numbered 0..=6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekdayConvention {
    /// Sunday = 0 ... Saturday = 6
    Gregorian,
    /// Saturday = 0 ... Friday = 6, the numbering the default rule base
    /// assumes for its weekend set
    #[default]
    SolarHijri,
}

impl WeekdayConvention {
    /// Convert a Sunday-based index into this convention
    pub fn from_sunday_index(&self, days_from_sunday: u32) -> u32 {
        match self {
            WeekdayConvention::Gregorian => days_from_sunday % 7,
            WeekdayConvention::SolarHijri => (days_from_sunday + 1) % 7,
        }
    }
}

/// Hour of day and weekday index of a moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarContext {
    pub hour: u32,
    pub week_day: u32,
}

impl CalendarContext {
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>, convention: WeekdayConvention) -> Self {
        Self {
            hour: at.hour(),
            week_day: convention.from_sunday_index(at.weekday().num_days_from_sunday()),
        }
    }

    /// Context for the current local time
    pub fn now(convention: WeekdayConvention) -> Self {
        Self::from_datetime(&Local::now(), convention)
    }
}
