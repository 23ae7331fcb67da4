pub mod answer;
pub mod client;
pub mod error;
pub mod expr;
pub mod grader;
pub mod latex;
pub mod parser;
pub mod problem;
pub mod store;

pub use client::{GenerationRequest, InferenceClient, TransportError};
pub use error::{EvalError, EvalResult};
pub use grader::EquivalenceGrader;
pub use problem::{
    Attempt, OutcomeStatus, Problem, ProblemOutcome, ProblemRecord, ScoredSymbol, SymbolEntry,
};
pub use store::SymbolStore;
