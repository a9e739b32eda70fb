//! Fuzzy set membership functions

use serde::{Deserialize, Serialize};

/// Degree of membership of a crisp value in a fuzzy set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipFunction {
    /// Linear interpolation between `(x, degree)` points, sorted by `x`.
    /// The first and last degrees hold outside the points.
    PiecewiseLinear { points: Vec<(f64, f64)> },

    /// Triangle rising from `a` to a peak at `b`, falling to `c`.
    /// `a == b` or `b == c` gives a shoulder at the peak.
    Triangular { a: f64, b: f64, c: f64 },

    /// Full membership at exactly one value
    Singleton { value: f64 },
}

impl MembershipFunction {
    pub fn piecewise(points: &[(f64, f64)]) -> Self {
        Self::PiecewiseLinear {
            points: points.to_vec(),
        }
    }

    pub fn triangular(a: f64, b: f64, c: f64) -> Self {
        Self::Triangular { a, b, c }
    }

    pub fn singleton(value: f64) -> Self {
        Self::Singleton { value }
    }

    /// Membership degree in [0, 1]
    pub fn degree(&self, x: f64) -> f64 {
        match self {
            MembershipFunction::PiecewiseLinear { points } => interpolate(points, x),
            MembershipFunction::Triangular { a, b, c } => triangle(*a, *b, *c, x),
            MembershipFunction::Singleton { value } => {
                if x == *value {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

fn interpolate(points: &[(f64, f64)], x: f64) -> f64 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return 0.0;
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }

    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x >= x0 && x <= x1 {
            if x1 == x0 {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    last.1
}

fn triangle(a: f64, b: f64, c: f64, x: f64) -> f64 {
    if x < a || x > c {
        return 0.0;
    }
    if x <= b {
        if b == a {
            1.0
        } else {
            (x - a) / (b - a)
        }
    } else if c == b {
        1.0
    } else {
        (c - x) / (c - b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_piecewise_holds_end_values() {
        let cautious = MembershipFunction::piecewise(&[(65.0, 1.0), (70.0, 0.0)]);
        assert_eq!(cautious.degree(0.0), 1.0);
        assert_eq!(cautious.degree(65.0), 1.0);
        assert!((cautious.degree(67.5) - 0.5).abs() < 1e-12);
        assert_eq!(cautious.degree(70.0), 0.0);
        assert_eq!(cautious.degree(120.0), 0.0);
    }

    #[test]
    fn test_piecewise_two_plateaus() {
        let high = MembershipFunction::piecewise(&[
            (12.0, 0.0),
            (13.0, 1.0),
            (14.0, 0.0),
            (21.0, 0.0),
            (22.0, 1.0),
            (24.0, 1.0),
        ]);
        assert_eq!(high.degree(8.0), 0.0);
        assert_eq!(high.degree(13.0), 1.0);
        assert_eq!(high.degree(17.0), 0.0);
        assert!((high.degree(21.5) - 0.5).abs() < 1e-12);
        assert_eq!(high.degree(23.0), 1.0);
    }

    #[test]
    fn test_triangle_shoulders() {
        let awake = MembershipFunction::triangular(0.0, 0.0, 1.0);
        let drowsy = MembershipFunction::triangular(0.0, 1.0, 1.0);
        assert_eq!(awake.degree(0.0), 1.0);
        assert!((awake.degree(0.25) - 0.75).abs() < 1e-12);
        assert_eq!(drowsy.degree(1.0), 1.0);
        assert_eq!(drowsy.degree(1.5), 0.0);
    }

    #[test]
    fn test_singleton() {
        let rainy = MembershipFunction::singleton(1.0);
        assert_eq!(rainy.degree(1.0), 1.0);
        assert_eq!(rainy.degree(0.0), 0.0);
        assert_eq!(rainy.degree(2.0), 0.0);
    }

    #[test]
    fn test_serde_shape() {
        let f: MembershipFunction =
            serde_json::from_str(r#"{"kind":"triangular","a":0.0,"b":1.25,"c":2.5}"#).unwrap();
        assert_eq!(f, MembershipFunction::triangular(0.0, 1.25, 2.5));
    }

    proptest! {
        #[test]
        fn degree_stays_in_unit_interval(x in -50.0f64..200.0) {
            let sets = [
                MembershipFunction::piecewise(&[(65.0, 0.0), (75.0, 1.0), (85.0, 0.0)]),
                MembershipFunction::triangular(1.25, 2.5, 3.75),
                MembershipFunction::singleton(2.0),
            ];
            for set in &sets {
                let d = set.degree(x);
                prop_assert!((0.0..=1.0).contains(&d));
            }
        }
    }
}
