use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("knowledge base error: {0}")]
    Kb(String),

    /// The canonical answer itself cannot be interpreted. Fatal for the
    /// problem: no attempt against it can be graded.
    #[error("unparsable ground truth: {0}")]
    GroundTruth(String),
}

pub type EvalResult<T> = Result<T, EvalError>;
