//! Rule base loading
//!
//! A rule set is a JSON array of flat string maps. Every key
//! except `result` names an input variable and its required term; `result`
//! names the output term. Conditions within a rule are conjunctive.
//!
//! ```json
//! [{"sleep": "drowsy", "speed": "hazardous", "result": "very_high"}]
//! ```

use crate::variable::LinguisticVariable;
use crate::RiskError;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Reserved key holding the consequent term
pub const RESULT_KEY: &str = "result";

/// Rule as it appears in the rule file
pub type RawRule = BTreeMap<String, String>;

/// Rule resolved against the engine's variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// `(input variable index, term index)` pairs, all required
    pub antecedents: Vec<(usize, usize)>,
    /// Output term index
    pub consequent: usize,
}

/// Ordered rule list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleBase {
    rules: Vec<Rule>,
}

impl RuleBase {
    /// Load and resolve a rule file
    pub fn from_path(
        path: impl AsRef<Path>,
        inputs: &[LinguisticVariable],
        output: &LinguisticVariable,
    ) -> Result<Self, RiskError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RiskError::RulesUnreadable {
            path: path.display().to_string(),
            source,
        })?;
        let rules = Self::from_json(&text, inputs, output)?;
        info!("Loaded {} risk rules from {}", rules.len(), path.display());
        Ok(rules)
    }

    /// Parse and resolve a JSON rule set
    pub fn from_json(
        text: &str,
        inputs: &[LinguisticVariable],
        output: &LinguisticVariable,
    ) -> Result<Self, RiskError> {
        let raw: Vec<RawRule> = serde_json::from_str(text)?;
        Self::resolve(&raw, inputs, output)
    }

    /// Resolve raw rules against the variables
    pub fn resolve(
        raw: &[RawRule],
        inputs: &[LinguisticVariable],
        output: &LinguisticVariable,
    ) -> Result<Self, RiskError> {
        if raw.is_empty() {
            return Err(RiskError::EmptyRules);
        }

        let mut rules = Vec::with_capacity(raw.len());
        for (index, entry) in raw.iter().enumerate() {
            let result = entry
                .get(RESULT_KEY)
                .ok_or(RiskError::MissingConsequent { index })?;
            let consequent = output
                .term_index(result)
                .ok_or_else(|| RiskError::UnknownTerm {
                    index,
                    variable: output.name().to_string(),
                    term: result.clone(),
                })?;

            let mut antecedents = Vec::with_capacity(entry.len() - 1);
            for (variable, term) in entry.iter().filter(|(k, _)| k.as_str() != RESULT_KEY) {
                let var_index = inputs
                    .iter()
                    .position(|v| v.name() == variable)
                    .ok_or_else(|| RiskError::UnknownVariable {
                        index,
                        variable: variable.clone(),
                    })?;
                let term_index =
                    inputs[var_index]
                        .term_index(term)
                        .ok_or_else(|| RiskError::UnknownTerm {
                            index,
                            variable: variable.clone(),
                            term: term.clone(),
                        })?;
                antecedents.push((var_index, term_index));
            }
            if antecedents.is_empty() {
                return Err(RiskError::NoAntecedents { index });
            }

            rules.push(Rule {
                antecedents,
                consequent,
            });
        }

        debug!("Resolved {} rules", rules.len());
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
