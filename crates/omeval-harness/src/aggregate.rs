//! Run-level statistics.
//!
//! Outcomes fold into buckets keyed by level and problem type. Errored
//! problems are counted but excluded from accuracy denominators: a
//! transport failure says nothing about the model. Accuracy over an
//! empty denominator is `None`, never NaN.

use std::collections::BTreeMap;

use serde::Serialize;

use omeval_core::ProblemOutcome;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Bucket {
    pub total: usize,
    pub correct: usize,
    pub errored: usize,
    pub attempts_used: u64,
}

impl Bucket {
    fn record(&mut self, outcome: &ProblemOutcome) {
        self.total += 1;
        if outcome.is_correct() {
            self.correct += 1;
        }
        if outcome.is_errored() {
            self.errored += 1;
        } else {
            self.attempts_used += u64::from(outcome.final_attempt_index);
        }
    }

    pub fn graded(&self) -> usize {
        self.total - self.errored
    }

    pub fn accuracy(&self) -> Option<f64> {
        let graded = self.graded();
        (graded > 0).then(|| self.correct as f64 / graded as f64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregateStats {
    pub overall: Bucket,
    pub by_level: BTreeMap<u8, Bucket>,
    pub by_type: BTreeMap<String, Bucket>,
}

impl AggregateStats {
    pub fn fold<'a>(outcomes: impl IntoIterator<Item = &'a ProblemOutcome>) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            stats.record(outcome);
        }
        stats
    }

    pub fn record(&mut self, outcome: &ProblemOutcome) {
        self.overall.record(outcome);
        self.by_level
            .entry(outcome.problem.level)
            .or_default()
            .record(outcome);
        self.by_type
            .entry(outcome.problem.problem_type.clone())
            .or_default()
            .record(outcome);
    }

    pub fn summarize(&self) -> Summary {
        Summary {
            total: self.overall.total,
            correct: self.overall.correct,
            errored: self.overall.errored,
            accuracy: self.overall.accuracy(),
            mean_attempts: (self.overall.graded() > 0)
                .then(|| self.overall.attempts_used as f64 / self.overall.graded() as f64),
            by_level: self
                .by_level
                .iter()
                .map(|(level, b)| (*level, GroupSummary::from(b)))
                .collect(),
            by_type: self
                .by_type
                .iter()
                .map(|(ty, b)| (ty.clone(), GroupSummary::from(b)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub total: usize,
    pub correct: usize,
    pub errored: usize,
    pub accuracy: Option<f64>,
}

impl From<&Bucket> for GroupSummary {
    fn from(b: &Bucket) -> Self {
        Self {
            total: b.total,
            correct: b.correct,
            errored: b.errored,
            accuracy: b.accuracy(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total: usize,
    pub correct: usize,
    pub errored: usize,
    pub accuracy: Option<f64>,
    pub mean_attempts: Option<f64>,
    pub by_level: BTreeMap<u8, GroupSummary>,
    pub by_type: BTreeMap<String, GroupSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use omeval_core::{Attempt, OutcomeStatus, Problem};

    fn make_outcome(
        id: &str,
        level: u8,
        problem_type: &str,
        status: OutcomeStatus,
        final_attempt: u32,
    ) -> ProblemOutcome {
        let mut problem = Problem::new(id.into(), "statement".into(), "1".into());
        problem.level = level;
        problem.problem_type = problem_type.into();
        let attempts = (1..=final_attempt)
            .map(|i| Attempt {
                index: i,
                raw_text: String::new(),
                extracted: None,
                is_correct: i == final_attempt && matches!(status, OutcomeStatus::Correct),
            })
            .collect();
        ProblemOutcome {
            problem,
            attempts,
            final_attempt_index: final_attempt,
            status,
        }
    }

    #[test]
    fn test_overall_accuracy() {
        let outcomes = vec![
            make_outcome("a", 1, "algebra", OutcomeStatus::Correct, 1),
            make_outcome("b", 1, "algebra", OutcomeStatus::Incorrect, 5),
            make_outcome("c", 2, "geometry", OutcomeStatus::Correct, 3),
        ];
        let summary = AggregateStats::fold(&outcomes).summarize();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.correct, 2);
        assert!((summary.accuracy.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((summary.mean_attempts.unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_errored_excluded_from_accuracy() {
        let outcomes = vec![
            make_outcome("a", 1, "algebra", OutcomeStatus::Correct, 1),
            make_outcome(
                "b",
                1,
                "algebra",
                OutcomeStatus::Errored {
                    reason: "backend returned status 500".into(),
                },
                1,
            ),
        ];
        let summary = AggregateStats::fold(&outcomes).summarize();
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.accuracy, Some(1.0));
    }

    #[test]
    fn test_group_breakdowns() {
        let outcomes = vec![
            make_outcome("a", 1, "algebra", OutcomeStatus::Correct, 1),
            make_outcome("b", 1, "geometry", OutcomeStatus::Incorrect, 5),
            make_outcome("c", 3, "algebra", OutcomeStatus::Incorrect, 5),
        ];
        let summary = AggregateStats::fold(&outcomes).summarize();
        assert_eq!(summary.by_level[&1].total, 2);
        assert_eq!(summary.by_level[&3].correct, 0);
        assert_eq!(summary.by_type["algebra"].total, 2);
        assert_eq!(summary.by_type["algebra"].correct, 1);
    }

    #[test]
    fn test_empty_run() {
        let summary = AggregateStats::fold(std::iter::empty::<&ProblemOutcome>()).summarize();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.accuracy, None);
        assert_eq!(summary.mean_attempts, None);
    }

    #[test]
    fn test_all_errored_accuracy_is_none() {
        let outcomes = vec![make_outcome(
            "a",
            1,
            "algebra",
            OutcomeStatus::Errored {
                reason: "timeout".into(),
            },
            1,
        )];
        let summary = AggregateStats::fold(&outcomes).summarize();
        assert_eq!(summary.accuracy, None);
    }
}
