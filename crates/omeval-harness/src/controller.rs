//! Best-of-n sampling loop for a single problem.
//!
//! Prompts are built once per problem and resent verbatim each attempt;
//! only the seed changes, derived deterministically from (base seed,
//! problem id, attempt index). The loop stops at the first correct
//! attempt. Transport failures are retried with linear backoff without
//! consuming grading attempts; when retries run out the problem is
//! recorded as errored rather than incorrect, so transport trouble
//! never masquerades as a wrong answer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use omeval_core::{
    Attempt, EquivalenceGrader, EvalResult, GenerationRequest, InferenceClient, OutcomeStatus,
    Problem, ProblemOutcome, ScoredSymbol, TransportError,
};

use crate::prompt::PromptBuilder;

#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// Grading attempts per problem; 1 disables resampling.
    pub max_attempts: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub base_seed: u64,
    /// Transport tries per attempt before the problem errors out.
    pub transport_retries: u32,
    pub backoff: Duration,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            temperature: 0.6,
            max_tokens: 1024,
            base_seed: 42,
            transport_retries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

pub struct SamplingController<'a> {
    client: &'a dyn InferenceClient,
    grader: EquivalenceGrader,
    config: SamplingConfig,
}

impl<'a> SamplingController<'a> {
    pub fn new(
        client: &'a dyn InferenceClient,
        grader: EquivalenceGrader,
        config: SamplingConfig,
    ) -> Self {
        Self {
            client,
            grader,
            config,
        }
    }

    /// Run the sampling loop for one problem. `Ok(None)` means the run
    /// was cancelled; a partially sampled problem is discarded rather
    /// than folded half-done into the stats. A ground truth that cannot
    /// be graded at all aborts with `EvalError::GroundTruth`; everything
    /// else yields an outcome.
    pub fn run(
        &self,
        problem: &Problem,
        symbols: &[ScoredSymbol],
        cancel: &AtomicBool,
    ) -> EvalResult<Option<ProblemOutcome>> {
        let prompts = PromptBuilder.build(problem, symbols);
        let mut attempts: Vec<Attempt> = Vec::new();

        for attempt_index in 1..=self.config.max_attempts {
            if cancel.load(Ordering::Relaxed) {
                return Ok(None);
            }

            let request = GenerationRequest {
                system_prompt: prompts.system_prompt.clone(),
                user_prompt: prompts.user_prompt.clone(),
                temperature: self.config.temperature,
                seed: derive_seed(self.config.base_seed, &problem.id, attempt_index),
                max_tokens: self.config.max_tokens,
            };

            let raw_text = match self.call_with_retry(&request, &problem.id) {
                Ok(text) => text,
                Err(e) => {
                    warn!(problem = %problem.id, error = %e, "transport exhausted");
                    return Ok(Some(ProblemOutcome {
                        problem: problem.clone(),
                        final_attempt_index: attempt_index,
                        attempts,
                        status: OutcomeStatus::Errored {
                            reason: e.to_string(),
                        },
                    }));
                }
            };

            let extracted = omeval_core::parser::extract(&raw_text);
            let is_correct = self
                .grader
                .equivalent(extracted.as_deref(), &problem.ground_truth)?;
            debug!(
                problem = %problem.id,
                attempt = attempt_index,
                extracted = extracted.as_deref().unwrap_or("<none>"),
                is_correct,
                "graded attempt"
            );
            attempts.push(Attempt {
                index: attempt_index,
                raw_text,
                extracted,
                is_correct,
            });

            if is_correct {
                return Ok(Some(ProblemOutcome {
                    problem: problem.clone(),
                    final_attempt_index: attempt_index,
                    attempts,
                    status: OutcomeStatus::Correct,
                }));
            }
        }

        // Exhausted: the last attempt stands.
        Ok(Some(ProblemOutcome {
            problem: problem.clone(),
            final_attempt_index: self.config.max_attempts,
            attempts,
            status: OutcomeStatus::Incorrect,
        }))
    }

    fn call_with_retry(
        &self,
        request: &GenerationRequest,
        problem_id: &str,
    ) -> Result<String, TransportError> {
        let tries = self.config.transport_retries.max(1);
        let mut last = TransportError::Http("no attempt made".into());
        for try_index in 1..=tries {
            match self.client.generate(request) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(
                        problem = problem_id,
                        try_index,
                        error = %e,
                        "transport failure"
                    );
                    last = e;
                    if try_index < tries {
                        std::thread::sleep(self.config.backoff * try_index);
                    }
                }
            }
        }
        Err(last)
    }
}

/// FNV-1a over (base seed, problem id, attempt index). Stable across
/// builds and platforms, unlike the std hasher.
pub fn derive_seed(base_seed: u64, problem_id: &str, attempt_index: u32) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in base_seed
        .to_le_bytes()
        .iter()
        .chain(problem_id.as_bytes())
        .chain(attempt_index.to_le_bytes().iter())
    {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScriptedClient;
    use omeval_core::EvalError;

    fn make_problem() -> Problem {
        Problem::new("math_00001".into(), "1 + 1 = ?".into(), "2".into())
    }

    fn make_controller<'a>(client: &'a ScriptedClient, config: SamplingConfig) -> SamplingController<'a> {
        SamplingController::new(client, EquivalenceGrader::default(), config)
    }

    fn fast_config() -> SamplingConfig {
        SamplingConfig {
            backoff: Duration::from_millis(0),
            ..SamplingConfig::default()
        }
    }

    #[test]
    fn test_first_attempt_correct() {
        let client = ScriptedClient::always("The sum is \\boxed{2}.");
        let controller = make_controller(&client, fast_config());
        let outcome = controller
            .run(&make_problem(), &[], &AtomicBool::new(false))
            .unwrap()
            .unwrap();
        assert!(outcome.is_correct());
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.final_attempt_index, 1);
    }

    #[test]
    fn test_early_exit_on_third_attempt() {
        let client = ScriptedClient::new(vec![
            Ok("\\boxed{3}".into()),
            Ok("no idea".into()),
            Ok("\\boxed{2}".into()),
        ]);
        let controller = make_controller(&client, fast_config());
        let outcome = controller
            .run(&make_problem(), &[], &AtomicBool::new(false))
            .unwrap()
            .unwrap();
        assert!(outcome.is_correct());
        assert_eq!(outcome.attempts.len(), 3);
        assert_eq!(outcome.final_attempt_index, 3);
        assert!(!outcome.attempts[0].is_correct);
        assert!(outcome.attempts[1].extracted.is_none());
    }

    #[test]
    fn test_exhaustion_reports_last_attempt() {
        let client = ScriptedClient::always("\\boxed{7}");
        let controller = make_controller(&client, fast_config());
        let outcome = controller
            .run(&make_problem(), &[], &AtomicBool::new(false))
            .unwrap()
            .unwrap();
        assert!(!outcome.is_correct());
        assert_eq!(outcome.attempts.len(), 5);
        assert_eq!(outcome.final_attempt_index, 5);
        assert_eq!(outcome.final_answer(), Some("7"));
    }

    #[test]
    fn test_single_attempt_mode() {
        let client = ScriptedClient::always("\\boxed{7}");
        let config = SamplingConfig {
            max_attempts: 1,
            ..fast_config()
        };
        let controller = make_controller(&client, config);
        let outcome = controller
            .run(&make_problem(), &[], &AtomicBool::new(false))
            .unwrap()
            .unwrap();
        assert_eq!(outcome.attempts.len(), 1);
    }

    #[test]
    fn test_transport_retry_then_success() {
        let client = ScriptedClient::new(vec![
            Err(TransportError::Status(503)),
            Err(TransportError::Http("connection reset".into())),
            Ok("\\boxed{2}".into()),
        ]);
        let controller = make_controller(&client, fast_config());
        let outcome = controller
            .run(&make_problem(), &[], &AtomicBool::new(false))
            .unwrap()
            .unwrap();
        // Retries do not consume grading attempts.
        assert!(outcome.is_correct());
        assert_eq!(outcome.attempts.len(), 1);
    }

    #[test]
    fn test_transport_exhaustion_errors_problem() {
        let client = ScriptedClient::new(vec![Err(TransportError::Status(500))]);
        let controller = make_controller(&client, fast_config());
        let outcome = controller
            .run(&make_problem(), &[], &AtomicBool::new(false))
            .unwrap()
            .unwrap();
        assert!(outcome.is_errored());
        assert!(outcome.attempts.is_empty());
    }

    #[test]
    fn test_ground_truth_error_propagates() {
        let client = ScriptedClient::always("\\boxed{2}");
        let controller = make_controller(&client, fast_config());
        let problem = Problem::new("math_00002".into(), "broken".into(), "".into());
        let result = controller.run(&problem, &[], &AtomicBool::new(false));
        assert!(matches!(result, Err(EvalError::GroundTruth(_))));
    }

    #[test]
    fn test_cancel_mid_run_discards_partial_outcome() {
        struct CancellingClient<'a> {
            cancel: &'a AtomicBool,
        }
        impl InferenceClient for CancellingClient<'_> {
            fn generate(&self, _request: &GenerationRequest) -> Result<String, TransportError> {
                self.cancel.store(true, Ordering::Relaxed);
                Ok("\\boxed{3}".into())
            }
        }

        let cancel = AtomicBool::new(false);
        let client = CancellingClient { cancel: &cancel };
        let controller =
            SamplingController::new(&client, EquivalenceGrader::default(), fast_config());
        let outcome = controller.run(&make_problem(), &[], &cancel).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_cancel_before_start() {
        let client = ScriptedClient::always("\\boxed{2}");
        let controller = make_controller(&client, fast_config());
        let outcome = controller
            .run(&make_problem(), &[], &AtomicBool::new(true))
            .unwrap();
        assert!(outcome.is_none());
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_seeds_differ_per_attempt_and_repeat_across_runs() {
        let problem = make_problem();
        for _ in 0..2 {
            let client = ScriptedClient::always("\\boxed{7}");
            let controller = make_controller(&client, fast_config());
            controller
                .run(&problem, &[], &AtomicBool::new(false))
                .unwrap();
            let seen = client.seen.lock().unwrap();
            let seeds: Vec<u64> = seen.iter().map(|r| r.seed).collect();
            assert_eq!(seeds.len(), 5);
            let mut unique = seeds.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), 5);
            assert_eq!(seeds[0], derive_seed(42, "math_00001", 1));
        }
    }

    #[test]
    fn test_prompts_identical_across_attempts() {
        let client = ScriptedClient::always("\\boxed{7}");
        let controller = make_controller(&client, fast_config());
        controller
            .run(&make_problem(), &[], &AtomicBool::new(false))
            .unwrap();
        let seen = client.seen.lock().unwrap();
        assert!(seen
            .windows(2)
            .all(|w| w[0].system_prompt == w[1].system_prompt
                && w[0].user_prompt == w[1].user_prompt));
    }
}
