//! Linguistic variables

use crate::membership::MembershipFunction;
use serde::{Deserialize, Serialize};

/// Named fuzzy set of a variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub name: String,
    pub function: MembershipFunction,
}

/// Variable with a bounded universe and an ordered list of terms.
/// Term order matters: it is the tie-break order for output variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinguisticVariable {
    name: String,
    universe: (f64, f64),
    terms: Vec<Term>,
}

impl LinguisticVariable {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            universe: (min, max),
            terms: Vec::new(),
        }
    }

    /// Append a term
    pub fn with_term(mut self, name: impl Into<String>, function: MembershipFunction) -> Self {
        self.terms.push(Term {
            name: name.into(),
            function,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn universe(&self) -> (f64, f64) {
        self.universe
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn term_index(&self, name: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.name == name)
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.universe.0 && x <= self.universe.1
    }

    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.universe.0, self.universe.1)
    }

    /// Membership degree of `x` in every term, in term order
    pub fn fuzzify(&self, x: f64) -> Vec<f64> {
        self.terms.iter().map(|t| t.function.degree(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sleep() -> LinguisticVariable {
        LinguisticVariable::new("sleep", 0.0, 1.0)
            .with_term("awake", MembershipFunction::triangular(0.0, 0.0, 1.0))
            .with_term("drowsy", MembershipFunction::triangular(0.0, 1.0, 1.0))
    }

    #[test]
    fn test_fuzzify_in_term_order() {
        let degrees = sleep().fuzzify(0.25);
        assert!((degrees[0] - 0.75).abs() < 1e-12);
        assert!((degrees[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_term_lookup_and_clamp() {
        let v = sleep();
        assert_eq!(v.term_index("drowsy"), Some(1));
        assert_eq!(v.term_index("asleep"), None);
        assert_eq!(v.clamp(3.0), 1.0);
        assert!(!v.contains(-0.1));
    }
}
