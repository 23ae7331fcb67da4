use thiserror::Error;

/// A single, fully specified sampling request. Two requests built from the
/// same (prompts, temperature, seed, max_tokens) are byte-identical; the
/// backend's output at temperature > 0 need not be.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub seed: u64,
    pub max_tokens: u32,
}

/// Transport-level failure of an inference call. All variants are treated
/// as transient by the sampling loop.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("transport failure: {0}")]
    Http(String),

    #[error("backend returned status {0}")]
    Status(u16),

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

pub trait InferenceClient: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String, TransportError>;
}
