//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `$OMEVAL_CONFIG` environment variable
//! 2. `~/.config/omeval/config.toml`
//! 3. Built-in defaults (everything is optional)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub sampling: SamplingSection,
    pub retrieval: RetrievalConfig,
    pub harness: HarnessConfig,
    pub output: OutputConfig,
}

/// Inference backend settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of an OpenAI-compatible endpoint.
    pub endpoint: String,
    pub name: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Best-of-n sampling settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingSection {
    pub max_attempts: u32,
    pub temperature: f32,
    pub seed: u64,
}

/// Knowledge retrieval settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum knowledge entries injected per prompt.
    pub top_k: usize,
    /// Minimum relevance score for an entry to be injected.
    pub relevance_threshold: f32,
}

/// Worker pool and transport settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub concurrency: usize,
    pub transport_retries: u32,
    pub backoff_ms: u64,
}

/// Report output settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
}

// --- Defaults ---

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".into(),
            name: "qwen2.5-math-7b".into(),
            max_tokens: 1024,
            timeout_secs: 120,
        }
    }
}

impl Default for SamplingSection {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            temperature: 0.6,
            seed: 42,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 20,
            relevance_threshold: 0.3,
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            transport_retries: 3,
            backoff_ms: 500,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "results".into(),
        }
    }
}

/// Load config from disk. Returns defaults if no config file exists.
pub fn load_config() -> Result<Config> {
    let path = config_path();

    if let Some(p) = &path {
        if p.exists() {
            let content =
                std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("parsing {}", p.display()))?;
            return Ok(config);
        }
    }

    Ok(Config::default())
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    // 1. Environment variable
    if let Ok(p) = std::env::var("OMEVAL_CONFIG") {
        return Some(PathBuf::from(p));
    }

    // 2. ~/.config/omeval/config.toml
    if let Some(home) = dirs_home() {
        let p = home.join(".config").join("omeval").join("config.toml");
        return Some(p);
    }

    None
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// Show the active config path (for `omeval config show`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}
