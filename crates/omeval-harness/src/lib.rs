//! Evaluation harness: prompt assembly, the best-of-n sampling loop,
//! the HTTP inference transport, the worker pool, and run aggregation.

pub mod aggregate;
pub mod client;
pub mod controller;
pub mod pool;
pub mod prompt;
pub mod report;

pub use aggregate::{AggregateStats, GroupSummary, Summary};
pub use client::HttpClient;
pub use controller::{SamplingConfig, SamplingController};
pub use pool::{run_pool, PoolConfig, PoolOutput, ProblemRun};
pub use prompt::{PromptBuilder, PromptPair};
pub use report::{FailureReport, ProblemReport, RunReport, SamplingEcho};
