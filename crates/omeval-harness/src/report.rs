//! Serializable run report.
//!
//! One JSON document per run: identity (ulid + timestamps + model),
//! per-problem records mirroring what the sampling loop saw, and the
//! aggregate summary. Rendering to other formats is left to consumers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use omeval_core::Attempt;

use crate::aggregate::{AggregateStats, Summary};
use crate::controller::SamplingConfig;
use crate::pool::{PoolOutput, RunFailure};

/// Echo of the sampling knobs a run used, so a report is
/// self-describing without the config file that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct SamplingEcho {
    pub max_attempts: u32,
    pub temperature: f32,
    pub base_seed: u64,
    pub max_tokens: u32,
}

impl From<&SamplingConfig> for SamplingEcho {
    fn from(c: &SamplingConfig) -> Self {
        Self {
            max_attempts: c.max_attempts,
            temperature: c.temperature,
            base_seed: c.base_seed,
            max_tokens: c.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProblemReport {
    pub problem_id: String,
    pub level: u8,
    pub problem_type: String,
    pub statement: String,
    pub ground_truth: String,
    pub attempts: Vec<Attempt>,
    pub final_answer: Option<String>,
    pub is_correct: bool,
    pub errored: bool,
    pub status: String,
    /// Ids of the knowledge entries injected into the prompts,
    /// retrieval order.
    pub symbols_used: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub problem_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub model: String,
    pub sampling: SamplingEcho,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub problems: Vec<ProblemReport>,
    pub failures: Vec<FailureReport>,
    pub summary: Summary,
}

impl RunReport {
    pub fn assemble(
        model: &str,
        sampling: &SamplingConfig,
        started_at: DateTime<Utc>,
        output: &PoolOutput,
    ) -> Self {
        let stats = AggregateStats::fold(output.runs.iter().map(|r| &r.outcome));
        let problems = output
            .runs
            .iter()
            .map(|run| {
                let outcome = &run.outcome;
                ProblemReport {
                    problem_id: outcome.problem.id.clone(),
                    level: outcome.problem.level,
                    problem_type: outcome.problem.problem_type.clone(),
                    statement: outcome.problem.statement.clone(),
                    ground_truth: outcome.problem.ground_truth.clone(),
                    attempts: outcome.attempts.clone(),
                    final_answer: outcome.final_answer().map(str::to_string),
                    is_correct: outcome.is_correct(),
                    errored: outcome.is_errored(),
                    status: outcome.status.to_string(),
                    symbols_used: run
                        .symbols
                        .iter()
                        .map(|s| s.entry.id.clone())
                        .collect(),
                }
            })
            .collect();
        let failures = output
            .failures
            .iter()
            .map(|f: &RunFailure| FailureReport {
                problem_id: f.problem_id.clone(),
                error: f.error.clone(),
            })
            .collect();
        Self {
            run_id: Ulid::new().to_string(),
            model: model.to_string(),
            sampling: SamplingEcho::from(sampling),
            started_at,
            finished_at: Utc::now(),
            problems,
            failures,
            summary: stats.summarize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ProblemRun;
    use omeval_core::{OutcomeStatus, Problem, ProblemOutcome, ScoredSymbol, SymbolEntry};

    fn make_output() -> PoolOutput {
        let problem = Problem::new("math_00000".into(), "1+1".into(), "2".into());
        let outcome = ProblemOutcome {
            problem,
            attempts: vec![Attempt {
                index: 1,
                raw_text: "\\boxed{2}".into(),
                extracted: Some("2".into()),
                is_correct: true,
            }],
            final_attempt_index: 1,
            status: OutcomeStatus::Correct,
        };
        PoolOutput {
            runs: vec![ProblemRun {
                outcome,
                symbols: vec![ScoredSymbol {
                    entry: SymbolEntry::new("arith1:plus", "addition"),
                    score: 1.0,
                }],
            }],
            failures: vec![RunFailure {
                problem_id: "math_00001".into(),
                error: "empty ground truth".into(),
            }],
        }
    }

    #[test]
    fn test_assemble() {
        let report = RunReport::assemble(
            "qwen2.5-math-7b",
            &SamplingConfig::default(),
            Utc::now(),
            &make_output(),
        );
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.problems[0].symbols_used, vec!["arith1:plus"]);
        assert_eq!(report.problems[0].final_answer.as_deref(), Some("2"));
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.sampling.max_attempts, 5);
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_report_serializes() {
        let report = RunReport::assemble("m", &SamplingConfig::default(), Utc::now(), &make_output());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"run_id\""));
        assert!(json.contains("\"accuracy\""));
    }

    #[test]
    fn test_run_ids_unique() {
        let output = make_output();
        let a = RunReport::assemble("m", &SamplingConfig::default(), Utc::now(), &output);
        let b = RunReport::assemble("m", &SamplingConfig::default(), Utc::now(), &output);
        assert_ne!(a.run_id, b.run_id);
    }
}
