//! Mathematical equivalence grading.
//!
//! A candidate answer matches the ground truth when both reduce to the
//! same value, not merely the same string: `0.5` matches `\frac{1}{2}`,
//! `2\sqrt{3}` matches `\sqrt{12}`. Comparison runs as a ladder per
//! scalar:
//!
//! 1. canonical text equality (fast path, catches pure formatting);
//! 2. exact polynomial normal forms from [`crate::expr`];
//! 3. `f64` evaluation within a relative tolerance;
//! 4. otherwise not equivalent.
//!
//! Structured answers (tuples, intervals, sets, matrices) recurse
//! element-wise after shape classification.

use tracing::trace;

use crate::answer::{self, Shape};
use crate::error::{EvalError, EvalResult};
use crate::expr;
use crate::latex;

pub const DEFAULT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct EquivalenceGrader {
    tolerance: f64,
}

impl Default for EquivalenceGrader {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl EquivalenceGrader {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Grade a candidate against the ground truth. A missing candidate
    /// (no box extracted) is simply wrong; a ground truth that cannot
    /// be interpreted at all is an error, since every attempt at that
    /// problem would be meaningless.
    pub fn equivalent(&self, candidate: Option<&str>, truth: &str) -> EvalResult<bool> {
        let truth_norm = latex::normalize(truth);
        if truth_norm.is_empty() {
            return Err(EvalError::GroundTruth("empty ground truth".into()));
        }
        if !braces_balanced(&truth_norm) {
            return Err(EvalError::GroundTruth(format!(
                "unbalanced braces in ground truth: {truth}"
            )));
        }
        let Some(candidate) = candidate else {
            return Ok(false);
        };
        let cand_norm = latex::normalize(candidate);
        if cand_norm.is_empty() || !braces_balanced(&cand_norm) {
            return Ok(false);
        }
        let matched =
            self.shapes_match(&answer::classify(&cand_norm), &answer::classify(&truth_norm));
        trace!(candidate = %cand_norm, truth = %truth_norm, matched, "compared answers");
        Ok(matched)
    }

    fn shapes_match(&self, cand: &Shape, truth: &Shape) -> bool {
        match (cand, truth) {
            (Shape::Scalar(a), Shape::Scalar(b)) => self.scalar_eq(a, b),
            (
                Shape::Tuple {
                    style: sa,
                    elems: ea,
                },
                Shape::Tuple {
                    style: sb,
                    elems: eb,
                },
            ) => {
                sa == sb
                    && ea.len() == eb.len()
                    && ea
                        .iter()
                        .zip(eb)
                        .all(|(a, b)| self.shapes_match(&answer::classify(a), &answer::classify(b)))
            }
            (
                Shape::Interval {
                    lo: la,
                    hi: ha,
                    open_lo: ola,
                    open_hi: oha,
                },
                Shape::Interval {
                    lo: lb,
                    hi: hb,
                    open_lo: olb,
                    open_hi: ohb,
                },
            ) => ola == olb && oha == ohb && self.scalar_eq(la, lb) && self.scalar_eq(ha, hb),
            (Shape::Set(ea), Shape::Set(eb)) => self.multisets_match(ea, eb),
            (
                Shape::Matrix { env: va, rows: ra },
                Shape::Matrix { env: vb, rows: rb },
            ) => {
                va == vb
                    && ra.len() == rb.len()
                    && ra.iter().zip(rb).all(|(rowa, rowb)| {
                        rowa.len() == rowb.len()
                            && rowa.iter().zip(rowb).all(|(a, b)| self.scalar_eq(a, b))
                    })
            }
            _ => false,
        }
    }

    /// Unordered comparison with multiplicity: every candidate element
    /// must pair off with a distinct truth element.
    fn multisets_match(&self, cand: &[String], truth: &[String]) -> bool {
        if cand.len() != truth.len() {
            return false;
        }
        let mut used = vec![false; truth.len()];
        for c in cand {
            let c_shape = answer::classify(c);
            let mut found = false;
            for (i, t) in truth.iter().enumerate() {
                if !used[i] && self.shapes_match(&c_shape, &answer::classify(t)) {
                    used[i] = true;
                    found = true;
                    break;
                }
            }
            if !found {
                return false;
            }
        }
        true
    }

    fn scalar_eq(&self, a: &str, b: &str) -> bool {
        if latex::canonical_text(a) == latex::canonical_text(b) {
            return true;
        }
        let ea = expr::parse(a);
        let eb = expr::parse(b);
        if let (Some(ea), Some(eb)) = (&ea, &eb) {
            if let (Some(pa), Some(pb)) = (ea.to_poly(), eb.to_poly()) {
                if pa == pb {
                    return true;
                }
            }
            // Exact forms disagree or are unavailable; a decimal
            // approximation of an exact value (pi vs 3.14159265359)
            // still counts within tolerance.
            if let (Some(va), Some(vb)) = (ea.eval_f64(), eb.eval_f64()) {
                return self.close(va, vb);
            }
        }
        false
    }

    fn close(&self, a: f64, b: f64) -> bool {
        let diff = (a - b).abs();
        diff <= self.tolerance || diff <= self.tolerance * a.abs().max(b.abs())
    }
}

fn braces_balanced(s: &str) -> bool {
    let mut depth = 0i32;
    for c in s.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(cand: &str, truth: &str) -> bool {
        EquivalenceGrader::default()
            .equivalent(Some(cand), truth)
            .unwrap()
    }

    #[test]
    fn test_identical_strings() {
        assert!(grade("42", "42"));
        assert!(grade("\\frac{1}{2}", "\\frac{1}{2}"));
    }

    #[test]
    fn test_formatting_differences() {
        assert!(grade("$\\frac{1}{2}$", "\\frac{1}{2}"));
        assert!(grade("\\left(1, 2\\right)", "(1,2)"));
        assert!(grade("\\dfrac{3}{4}", "\\frac{3}{4}"));
    }

    #[test]
    fn test_numeric_equivalence() {
        assert!(grade("0.5", "\\frac{1}{2}"));
        assert!(grade("6", "6.0"));
        assert!(grade("1/6", "\\frac{\\frac{1}{2}}{3}"));
    }

    #[test]
    fn test_radical_equivalence() {
        assert!(grade("2\\sqrt{3}", "\\sqrt{12}"));
        assert!(grade("\\frac{\\sqrt{3}}{3}", "\\frac{1}{\\sqrt{3}}"));
        // Squared radicals next to a free variable have no numeric
        // fallback; the exact reduction must carry them.
        assert!(grade("(\\sqrt{2})^2 x", "2x"));
        assert!(!grade("(\\sqrt{2})^2 x", "4x"));
    }

    #[test]
    fn test_pi_answers() {
        assert!(grade("-\\frac{\\pi}{6}", "-\\pi/6"));
        assert!(!grade("\\frac{\\pi}{6}", "-\\frac{\\pi}{6}"));
    }

    #[test]
    fn test_symbolic_expansion() {
        assert!(grade("2(k+1)", "2k+2"));
        assert!(!grade("2k+1", "2k+2"));
    }

    #[test]
    fn test_plain_inequality() {
        assert!(!grade("3", "4"));
        assert!(!grade("0.5", "0.6"));
        assert!(!grade("88.5", "29"));
    }

    #[test]
    fn test_decimal_approximation_of_pi() {
        assert!(grade("3.14159265359", "\\pi"));
        assert!(!grade("3.14", "\\pi"));
    }

    #[test]
    fn test_tuple_with_symbolic_elements() {
        assert!(grade("(3, \\pi/2)", "(3, \\frac{\\pi}{2})"));
        assert!(!grade("(1, 6)", "(6, 1)"));
    }

    #[test]
    fn test_tuple_order_matters() {
        assert!(grade("(1, 2)", "(1,2)"));
        assert!(!grade("(2, 1)", "(1,2)"));
    }

    #[test]
    fn test_tuple_style_matters() {
        assert!(!grade("[1, 2]", "(1,2)"));
    }

    #[test]
    fn test_set_order_does_not_matter() {
        assert!(grade("{3, -1}", "{-1, 3}"));
        assert!(grade("3, -1", "-1, 3"));
    }

    #[test]
    fn test_set_multiplicity() {
        assert!(!grade("{1, 1, 2}", "{1, 2, 2}"));
    }

    #[test]
    fn test_interval() {
        assert!(grade("x \\in [2, 5)", "[2,5)"));
        assert!(!grade("[2, 5)", "(2,5)"));
        assert!(!grade("[2, 5)", "[2,5]"));
    }

    #[test]
    fn test_matrix() {
        let a = "\\begin{pmatrix} 1 & 0.5 \\\\ 3 & 4 \\end{pmatrix}";
        let b = "\\begin{pmatrix} 1 & \\frac{1}{2} \\\\ 3 & 4 \\end{pmatrix}";
        assert!(grade(a, b));
        let c = "\\begin{bmatrix} 1 & \\frac{1}{2} \\\\ 3 & 4 \\end{bmatrix}";
        assert!(!grade(a, c));
    }

    #[test]
    fn test_missing_candidate() {
        let grader = EquivalenceGrader::default();
        assert!(!grader.equivalent(None, "42").unwrap());
    }

    #[test]
    fn test_empty_ground_truth_is_error() {
        let grader = EquivalenceGrader::default();
        assert!(matches!(
            grader.equivalent(Some("42"), ""),
            Err(EvalError::GroundTruth(_))
        ));
        assert!(matches!(
            grader.equivalent(Some("42"), "\\frac{1}{2"),
            Err(EvalError::GroundTruth(_))
        ));
    }

    #[test]
    fn test_malformed_candidate_is_just_wrong() {
        let grader = EquivalenceGrader::default();
        assert!(!grader.equivalent(Some("\\frac{1}{2"), "42").unwrap());
    }

    #[test]
    fn test_unsupported_text_falls_back_to_canonical() {
        // Neither side parses as an expression, but they agree textually.
        assert!(grade("\\text{even}", "even"));
        assert!(!grade("odd", "even"));
    }
}
