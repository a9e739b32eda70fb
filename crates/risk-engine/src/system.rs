//! Mamdani inference

use crate::rules::RuleBase;
use crate::variable::LinguisticVariable;
use serde::Serialize;
use tracing::{debug, warn};

/// Samples used to integrate the output centroid
const CENTROID_SAMPLES: usize = 501;

/// Outcome of one inference pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceResult {
    /// Activation of each output term, in term order
    pub activations: Vec<(String, f64)>,
    /// Index of the winning output term
    pub winner: usize,
    /// Name of the winning output term
    pub term: String,
    /// Centroid of the clipped output sets; `None` if nothing fired
    pub centroid: Option<f64>,
    /// Rules with a non-zero firing strength
    pub rules_fired: usize,
}

/// Input variables, output variable and resolved rules
#[derive(Debug, Clone)]
pub struct FuzzySystem {
    inputs: Vec<LinguisticVariable>,
    output: LinguisticVariable,
    rules: RuleBase,
}

impl FuzzySystem {
    pub fn new(
        inputs: Vec<LinguisticVariable>,
        output: LinguisticVariable,
        rules: RuleBase,
    ) -> Self {
        Self {
            inputs,
            output,
            rules,
        }
    }

    pub fn inputs(&self) -> &[LinguisticVariable] {
        &self.inputs
    }

    pub fn output(&self) -> &LinguisticVariable {
        &self.output
    }

    pub fn rules(&self) -> &RuleBase {
        &self.rules
    }

    /// Run inference on crisp inputs given in input-variable order.
    ///
    /// Rule strength is the minimum of its antecedent degrees, term activation
    /// the maximum over the rules concluding it. The winner is the most
    /// activated term; ties go to the earliest term.
    ///
    /// # Panics
    ///
    /// If `crisp` does not hold one value per input variable.
    pub fn infer(&self, crisp: &[f64]) -> InferenceResult {
        assert_eq!(
            crisp.len(),
            self.inputs.len(),
            "expected one crisp value per input variable"
        );

        let degrees: Vec<Vec<f64>> = self
            .inputs
            .iter()
            .zip(crisp)
            .map(|(variable, x)| variable.fuzzify(*x))
            .collect();

        let mut activations = vec![0.0f64; self.output.terms().len()];
        let mut rules_fired = 0;
        for rule in self.rules.rules() {
            let strength = rule
                .antecedents
                .iter()
                .map(|&(v, t)| degrees[v][t])
                .fold(1.0f64, f64::min);
            if strength > 0.0 {
                rules_fired += 1;
            }
            let slot = &mut activations[rule.consequent];
            *slot = slot.max(strength);
        }

        let mut winner = 0;
        for (i, a) in activations.iter().enumerate() {
            if *a > activations[winner] {
                winner = i;
            }
        }

        if rules_fired == 0 {
            warn!(
                "No risk rule fired for inputs {:?}, defaulting to \"{}\"",
                crisp,
                self.output.terms()[winner].name
            );
        }

        let centroid = self.centroid(&activations);
        debug!(
            "Risk inference: {} rules fired, winner \"{}\", centroid {:?}",
            rules_fired,
            self.output.terms()[winner].name,
            centroid
        );

        InferenceResult {
            activations: self
                .output
                .terms()
                .iter()
                .map(|t| t.name.clone())
                .zip(activations.iter().copied())
                .collect(),
            winner,
            term: self.output.terms()[winner].name.clone(),
            centroid,
            rules_fired,
        }
    }

    fn centroid(&self, activations: &[f64]) -> Option<f64> {
        let (lo, hi) = self.output.universe();
        let step = (hi - lo) / (CENTROID_SAMPLES - 1) as f64;

        let mut weighted = 0.0;
        let mut total = 0.0;
        for i in 0..CENTROID_SAMPLES {
            let x = lo + step * i as f64;
            let mu = self
                .output
                .terms()
                .iter()
                .zip(activations)
                .map(|(term, a)| term.function.degree(x).min(*a))
                .fold(0.0f64, f64::max);
            weighted += x * mu;
            total += mu;
        }

        (total > 0.0).then(|| weighted / total)
    }
}
