//! Runtime settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `FDMS__`-prefixed environment variables
//! (`FDMS__SERVER__BIND=0.0.0.0:9090`).

use config::{Config, ConfigError, Environment, File};
use dms::DmsConfig;
use risk_engine::{WeatherTable, WeekdayConvention};
use serde::{Deserialize, Serialize};

/// Default settings file, relative to the working directory
pub const DEFAULT_SETTINGS_PATH: &str = "config/fdms.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub dms: DmsConfig,
    pub risk: RiskSettings,
    pub source: SourceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    /// Rule file; the bundled rule base when unset
    pub rules_path: Option<String>,
    pub weekday_convention: WeekdayConvention,
    pub weather: WeatherTable,
    /// Seconds between periodic risk assessments
    pub interval_secs: u64,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            rules_path: None,
            weekday_convention: WeekdayConvention::default(),
            weather: WeatherTable::default(),
            interval_secs: 5,
        }
    }
}

/// Where frames come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Recorded landmarks, one JSON frame per line (`null` for no face).
    /// Without a source the frame sampler is not started.
    pub landmarks_path: Option<String>,
    /// Pause between replayed frames
    pub frame_interval_ms: u64,
    /// Restart the recording when it ends
    pub repeat: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            landmarks_path: None,
            frame_interval_ms: 100,
            repeat: false,
        }
    }
}

impl Settings {
    /// Load settings from `path` (optional) layered over the defaults and
    /// under the environment
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("FDMS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::InputMode;
    use std::sync::Mutex;

    /// Serializes tests that read or write `FDMS__` variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const SHIPPED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/fdms");

    #[test]
    fn test_defaults_without_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let settings = Settings::load("/nonexistent/fdms").unwrap();
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
        assert_eq!(settings.dms.window_frames, 70);
        assert_eq!(settings.risk.interval_secs, 5);
        assert_eq!(settings.risk.weekday_convention, WeekdayConvention::SolarHijri);
        assert!(settings.source.landmarks_path.is_none());
    }

    #[test]
    fn test_shipped_file_loads() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let settings = Settings::load(SHIPPED).unwrap();
        assert_eq!(settings.dms.input_mode, InputMode::Padded { target_len: 70 });
        assert_eq!(settings.risk.weekday_convention, WeekdayConvention::SolarHijri);
        assert_eq!(settings.risk.interval_secs, 5);
    }

    #[test]
    fn test_numeric_env_override() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("FDMS__DMS__INPUT_MODE__TARGET_LEN", "200");
        let loaded = Settings::load(SHIPPED);
        std::env::remove_var("FDMS__DMS__INPUT_MODE__TARGET_LEN");

        let settings = loaded.unwrap();
        assert_eq!(settings.dms.input_mode, InputMode::Padded { target_len: 200 });
    }
}
