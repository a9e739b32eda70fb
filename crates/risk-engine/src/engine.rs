//! Driving risk engine

use crate::level::RiskLevel;
use crate::membership::MembershipFunction as Mf;
use crate::rules::RuleBase;
use crate::system::{FuzzySystem, InferenceResult};
use crate::variable::LinguisticVariable;
use crate::weather::WeatherCondition;
use crate::RiskError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Rule base shipped with the engine
pub const DEFAULT_RULES: &str = include_str!("../rules/default.json");

/// Crisp context for one risk evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    /// Vehicle speed in km/h
    pub speed_kmh: f64,
    /// Weekday index 0..=6
    pub week_day: f64,
    /// Hour of day 0..=24
    pub hour: f64,
    pub weather: WeatherCondition,
    /// Drowsiness score in [0, 1]
    pub sleep: f64,
}

/// Input variables in the order `FuzzySystem::infer` expects values
fn input_variables() -> Vec<LinguisticVariable> {
    vec![
        LinguisticVariable::new("week_day", 0.0, 6.0)
            .with_term("weekday", Mf::piecewise(&[(0.0, 1.0), (3.0, 1.0), (4.0, 0.0)]))
            .with_term("weekend", Mf::piecewise(&[(3.0, 0.0), (4.0, 1.0), (6.0, 1.0)])),
        LinguisticVariable::new("day_hour", 0.0, 24.0)
            .with_term("low", Mf::piecewise(&[(0.0, 1.0), (12.0, 1.0), (13.0, 0.0)]))
            .with_term(
                "moderate",
                Mf::piecewise(&[(13.0, 0.0), (14.0, 1.0), (21.0, 1.0), (22.0, 0.0)]),
            )
            .with_term(
                "high",
                Mf::piecewise(&[
                    (12.0, 0.0),
                    (13.0, 1.0),
                    (14.0, 0.0),
                    (21.0, 0.0),
                    (22.0, 1.0),
                    (24.0, 1.0),
                ]),
            ),
        LinguisticVariable::new("weather", 0.0, 2.0)
            .with_term("normal", Mf::singleton(0.0))
            .with_term("rainy", Mf::singleton(1.0))
            .with_term("inclement", Mf::singleton(2.0)),
        LinguisticVariable::new("speed", 0.0, 120.0)
            .with_term("cautious", Mf::piecewise(&[(65.0, 1.0), (70.0, 0.0)]))
            .with_term("elevated", Mf::piecewise(&[(65.0, 0.0), (75.0, 1.0), (85.0, 0.0)]))
            .with_term("hazardous", Mf::piecewise(&[(80.0, 0.0), (85.0, 1.0), (120.0, 1.0)])),
        LinguisticVariable::new("sleep", 0.0, 1.0)
            .with_term("awake", Mf::triangular(0.0, 0.0, 1.0))
            .with_term("drowsy", Mf::triangular(0.0, 1.0, 1.0)),
    ]
}

/// Output variable; terms follow `RiskLevel::ALL`
fn output_variable() -> LinguisticVariable {
    let shapes = [
        (0.0, 0.0, 1.25),
        (0.0, 1.25, 2.5),
        (1.25, 2.5, 3.75),
        (2.5, 3.75, 5.0),
        (3.75, 5.0, 5.0),
    ];
    RiskLevel::ALL.iter().zip(shapes).fold(
        LinguisticVariable::new("result", 0.0, 5.0),
        |variable, (level, (a, b, c))| variable.with_term(level.as_str(), Mf::triangular(a, b, c)),
    )
}

/// Fuzzy risk estimator. Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    system: FuzzySystem,
}

impl RiskEngine {
    /// Build with a rule file
    pub fn from_rules_path(path: impl AsRef<Path>) -> Result<Self, RiskError> {
        let inputs = input_variables();
        let output = output_variable();
        let rules = RuleBase::from_path(path, &inputs, &output)?;
        Ok(Self::assemble(inputs, output, rules))
    }

    /// Build with a rule set given as JSON text
    pub fn from_rules_json(text: &str) -> Result<Self, RiskError> {
        let inputs = input_variables();
        let output = output_variable();
        let rules = RuleBase::from_json(text, &inputs, &output)?;
        Ok(Self::assemble(inputs, output, rules))
    }

    /// Build with the bundled rule base
    pub fn with_default_rules() -> Result<Self, RiskError> {
        Self::from_rules_json(DEFAULT_RULES)
    }

    fn assemble(
        inputs: Vec<LinguisticVariable>,
        output: LinguisticVariable,
        rules: RuleBase,
    ) -> Self {
        info!(
            "Risk engine ready: {} input variables, {} rules",
            inputs.len(),
            rules.len()
        );
        Self {
            system: FuzzySystem::new(inputs, output, rules),
        }
    }

    pub fn system(&self) -> &FuzzySystem {
        &self.system
    }

    /// Risk category for the given context
    pub fn evaluate(&self, inputs: &RiskInputs) -> Result<RiskLevel, RiskError> {
        let result = self.evaluate_detailed(inputs)?;
        Ok(RiskLevel::ALL[result.winner])
    }

    /// Full inference trace for the given context
    pub fn evaluate_detailed(&self, inputs: &RiskInputs) -> Result<InferenceResult, RiskError> {
        let crisp = self.crisp_inputs(inputs)?;
        Ok(self.system.infer(&crisp))
    }

    fn crisp_inputs(&self, inputs: &RiskInputs) -> Result<[f64; 5], RiskError> {
        let weather = match inputs.weather {
            WeatherCondition::Unknown => return Err(RiskError::UnknownWeather),
            known => known.code() as f64,
        };

        let raw = [
            ("week_day", inputs.week_day),
            ("day_hour", inputs.hour),
            ("weather", weather),
            ("speed", inputs.speed_kmh),
            ("sleep", inputs.sleep),
        ];

        let mut crisp = [0.0; 5];
        for (i, ((name, value), variable)) in raw.iter().zip(self.system.inputs()).enumerate() {
            if value.is_nan() {
                return Err(RiskError::InvalidInput(*name));
            }
            crisp[i] = variable.clamp(*value);
            if crisp[i] != *value {
                debug!("Input {} = {} outside universe, clamped to {}", name, value, crisp[i]);
            }
        }
        Ok(crisp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs(
        speed_kmh: f64,
        hour: f64,
        week_day: f64,
        weather: WeatherCondition,
        sleep: f64,
    ) -> RiskInputs {
        RiskInputs {
            speed_kmh,
            week_day,
            hour,
            weather,
            sleep,
        }
    }

    #[test]
    fn test_drowsy_fast_storm_is_very_high() {
        let engine = RiskEngine::with_default_rules().unwrap();
        let level = engine
            .evaluate(&inputs(100.0, 13.0, 5.0, WeatherCondition::Inclement, 1.0))
            .unwrap();
        assert_eq!(level, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_awake_slow_morning_is_very_low() {
        let engine = RiskEngine::with_default_rules().unwrap();
        let level = engine
            .evaluate(&inputs(30.0, 8.0, 1.0, WeatherCondition::Normal, 0.0))
            .unwrap();
        assert_eq!(level, RiskLevel::VeryLow);
    }

    #[test]
    fn test_tie_resolves_to_lower_level() {
        let engine = RiskEngine::from_rules_json(
            r#"[{"sleep": "drowsy", "result": "very_high"},
                {"sleep": "drowsy", "result": "medium"}]"#,
        )
        .unwrap();
        let level = engine
            .evaluate(&inputs(50.0, 10.0, 2.0, WeatherCondition::Normal, 1.0))
            .unwrap();
        assert_eq!(level, RiskLevel::Medium);
    }

    #[test]
    fn test_unknown_weather_rejected() {
        let engine = RiskEngine::with_default_rules().unwrap();
        let result = engine.evaluate(&inputs(50.0, 10.0, 2.0, WeatherCondition::Unknown, 0.0));
        assert!(matches!(result, Err(RiskError::UnknownWeather)));
    }

    #[test]
    fn test_nan_rejected() {
        let engine = RiskEngine::with_default_rules().unwrap();
        let result = engine.evaluate(&inputs(f64::NAN, 10.0, 2.0, WeatherCondition::Normal, 0.0));
        assert!(matches!(result, Err(RiskError::InvalidInput("speed"))));
    }

    #[test]
    fn test_out_of_universe_clamped() {
        let engine = RiskEngine::with_default_rules().unwrap();
        let over = engine
            .evaluate_detailed(&inputs(180.0, 13.0, 5.0, WeatherCondition::Normal, 1.7))
            .unwrap();
        let edge = engine
            .evaluate_detailed(&inputs(120.0, 13.0, 5.0, WeatherCondition::Normal, 1.0))
            .unwrap();
        assert_eq!(over, edge);
        assert_eq!(over.term, "very_high");
    }

    #[test]
    fn test_detailed_result() {
        let engine = RiskEngine::with_default_rules().unwrap();
        let result = engine
            .evaluate_detailed(&inputs(100.0, 13.0, 5.0, WeatherCondition::Inclement, 1.0))
            .unwrap();
        assert_eq!(result.activations.len(), 5);
        assert_eq!(result.activations[4], ("very_high".to_string(), 1.0));
        assert!(result.centroid.unwrap() > 3.75);
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RiskEngine>();
    }

    #[test]
    fn test_bundled_rules_file_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/rules/default.json");
        let engine = RiskEngine::from_rules_path(path).unwrap();
        assert_eq!(engine.system().rules().len(), 18);
    }

    proptest! {
        #[test]
        fn evaluation_is_total_for_known_weather(
            speed in 0.0f64..150.0,
            hour in 0.0f64..24.0,
            day in 0u8..7,
            weather in 0i64..3,
            sleep in 0.0f64..1.0,
        ) {
            let engine = RiskEngine::with_default_rules().unwrap();
            let weather = WeatherCondition::from_code(weather);
            let context = inputs(speed, hour, day as f64, weather, sleep);
            let level = engine.evaluate(&context).unwrap();
            // Same inputs, same answer
            prop_assert_eq!(engine.evaluate(&context).unwrap(), level);
        }
    }
}
