//! Blocking HTTP transport to an OpenAI-compatible chat endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use omeval_core::{GenerationRequest, InferenceClient, TransportError};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    seed: u64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct HttpClient {
    agent: ureq::Agent,
    url: String,
    model: String,
    timeout_secs: u64,
}

impl HttpClient {
    pub fn new(endpoint: &str, model: &str, timeout_secs: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build();
        Self {
            agent,
            url: format!("{}/v1/chat/completions", endpoint.trim_end_matches('/')),
            model: model.to_string(),
            timeout_secs,
        }
    }
}

impl InferenceClient for HttpClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, TransportError> {
        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &request.system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.user_prompt,
        });
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            seed: request.seed,
            max_tokens: request.max_tokens,
            stream: false,
        };

        debug!(url = %self.url, seed = request.seed, "inference request");
        let response = self
            .agent
            .post(&self.url)
            .send_json(&body)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => TransportError::Status(code),
                ureq::Error::Transport(t) => {
                    let message = t.to_string();
                    if message.contains("timed out") {
                        TransportError::Timeout(self.timeout_secs)
                    } else {
                        TransportError::Http(message)
                    }
                }
            })?;

        let parsed: ChatResponse = response
            .into_json()
            .map_err(|e| TransportError::Malformed(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::Malformed("empty choices array".into()))?;
        Ok(choice.message.content)
    }
}
