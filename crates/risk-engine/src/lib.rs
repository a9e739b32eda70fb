//! Fuzzy Risk Engine
//!
//! Combines driving context with the driver's drowsiness into a risk category:
//! - Linguistic variables over day, hour, weather, speed and sleep
//! - Rule base loaded from an external JSON file
//! - Mamdani min/max inference with arg-max defuzzification
//! - Weather id and calendar helpers for building inputs

pub mod context;
mod engine;
mod level;
mod membership;
mod rules;
mod system;
mod variable;
pub mod weather;

pub use context::{CalendarContext, WeekdayConvention};
pub use engine::{RiskEngine, RiskInputs};
pub use level::RiskLevel;
pub use membership::MembershipFunction;
pub use rules::{Rule, RuleBase};
pub use system::{FuzzySystem, InferenceResult};
pub use variable::{LinguisticVariable, Term};
pub use weather::{WeatherCondition, WeatherTable};

use thiserror::Error;

/// Risk engine error types
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Cannot read rule file {path}: {source}")]
    RulesUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rule set: {0}")]
    RulesInvalid(#[from] serde_json::Error),

    #[error("Rule set contains no rules")]
    EmptyRules,

    #[error("Rule {index} has no \"result\" entry")]
    MissingConsequent { index: usize },

    #[error("Rule {index} has no antecedents")]
    NoAntecedents { index: usize },

    #[error("Rule {index} references unknown variable \"{variable}\"")]
    UnknownVariable { index: usize, variable: String },

    #[error("Rule {index} references unknown term \"{term}\" of \"{variable}\"")]
    UnknownTerm {
        index: usize,
        variable: String,
        term: String,
    },

    #[error("Input \"{0}\" is not a number")]
    InvalidInput(&'static str),

    #[error("Unknown weather condition")]
    UnknownWeather,

    #[error("Unknown risk level \"{0}\"")]
    UnknownLevel(String),
}
