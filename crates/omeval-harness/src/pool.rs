//! Bounded worker pool over the problem list.
//!
//! A fixed number of scoped threads pull problem indices from a shared
//! atomic cursor, so work is distributed without a queue and without
//! any unsafe. Results carry their index and are folded back in input
//! order after the join, which keeps the report deterministic no matter
//! how the threads interleave.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{error, info};

use omeval_core::{EquivalenceGrader, InferenceClient, Problem, ProblemOutcome, ScoredSymbol};

use crate::controller::{SamplingConfig, SamplingController};

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub concurrency: usize,
    /// Relative tolerance for the numeric fallback of the grader.
    pub tolerance: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            tolerance: omeval_core::grader::DEFAULT_TOLERANCE,
        }
    }
}

/// One problem's outcome together with the knowledge entries that were
/// injected into its prompts.
#[derive(Debug, Clone)]
pub struct ProblemRun {
    pub outcome: ProblemOutcome,
    pub symbols: Vec<ScoredSymbol>,
}

/// A problem that could not be evaluated at all (ground truth broken).
#[derive(Debug, Clone)]
pub struct RunFailure {
    pub problem_id: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct PoolOutput {
    /// Completed problems, in input order.
    pub runs: Vec<ProblemRun>,
    pub failures: Vec<RunFailure>,
}

pub fn run_pool<F>(
    problems: &[Problem],
    client: &dyn InferenceClient,
    config: &PoolConfig,
    sampling: &SamplingConfig,
    retrieve: F,
    cancel: &AtomicBool,
) -> PoolOutput
where
    F: Fn(&Problem) -> Vec<ScoredSymbol> + Sync,
{
    type Slot = (usize, Result<ProblemRun, RunFailure>);

    let cursor = AtomicUsize::new(0);
    let results: Mutex<Vec<Slot>> = Mutex::new(Vec::with_capacity(problems.len()));
    let workers = config.concurrency.clamp(1, problems.len().max(1));

    info!(problems = problems.len(), workers, "starting evaluation");

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                let grader = EquivalenceGrader::new(config.tolerance);
                let controller = SamplingController::new(client, grader, sampling.clone());
                loop {
                    let i = cursor.fetch_add(1, Ordering::Relaxed);
                    if i >= problems.len() || cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    let problem = &problems[i];
                    let symbols = retrieve(problem);
                    let slot = match controller.run(problem, &symbols, cancel) {
                        Ok(Some(outcome)) => (i, Ok(ProblemRun { outcome, symbols })),
                        Ok(None) => continue,
                        Err(e) => {
                            error!(problem = %problem.id, error = %e, "problem failed");
                            (
                                i,
                                Err(RunFailure {
                                    problem_id: problem.id.clone(),
                                    error: e.to_string(),
                                }),
                            )
                        }
                    };
                    let mut guard = match results.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    guard.push(slot);
                }
            });
        }
    });

    let mut slots = match results.into_inner() {
        Ok(slots) => slots,
        Err(poisoned) => poisoned.into_inner(),
    };
    slots.sort_by_key(|(i, _)| *i);

    let mut output = PoolOutput::default();
    for (_, slot) in slots {
        match slot {
            Ok(run) => output.runs.push(run),
            Err(failure) => output.failures.push(failure),
        }
    }
    info!(
        completed = output.runs.len(),
        failed = output.failures.len(),
        "evaluation finished"
    );
    output
}
