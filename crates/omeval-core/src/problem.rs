use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Problem
// ---------------------------------------------------------------------------

/// A single benchmark problem, immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub statement: String,
    /// Difficulty level, 1..=5.
    pub level: u8,
    /// Category tag, lowercase snake_case (e.g. "precalculus").
    pub problem_type: String,
    /// Canonical correct answer in math notation.
    pub ground_truth: String,
    /// Minimum retrieval score for a knowledge entry to be injected.
    pub relevance_threshold: f32,
}

impl Problem {
    pub fn new(id: String, statement: String, ground_truth: String) -> Self {
        Self {
            id,
            statement,
            level: 1,
            problem_type: "unknown".into(),
            ground_truth,
            relevance_threshold: 0.3,
        }
    }
}

/// Raw benchmark row as it appears in the dataset JSON. Levels come as
/// either `3` or `"Level 3"`; the category field is named `type`,
/// `subject`, or `source_domain` depending on the dataset export.
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemRecord {
    pub problem: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub level: Option<LevelField>,
    #[serde(default, rename = "type", alias = "subject", alias = "source_domain")]
    pub problem_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LevelField {
    Num(u8),
    Text(String),
}

impl LevelField {
    fn as_level(&self) -> u8 {
        match self {
            Self::Num(n) => *n,
            Self::Text(s) => s
                .trim()
                .trim_start_matches("Level")
                .trim()
                .parse()
                .unwrap_or(1),
        }
    }
}

impl ProblemRecord {
    /// Shape a raw row into a `Problem`. When the row has no explicit
    /// answer, the ground truth is the last boxed span of the worked
    /// solution.
    pub fn into_problem(self, idx: usize, relevance_threshold: f32) -> Problem {
        let ground_truth = if self.answer.trim().is_empty() {
            crate::parser::extract(&self.solution).unwrap_or_default()
        } else {
            self.answer.trim().to_string()
        };

        let problem_type = self
            .problem_type
            .as_deref()
            .unwrap_or("unknown")
            .to_lowercase()
            .replace(' ', "_");

        Problem {
            id: format!("math_{idx:05}"),
            statement: self.problem,
            level: self.level.as_ref().map(LevelField::as_level).unwrap_or(1),
            problem_type,
            ground_truth,
            relevance_threshold,
        }
    }
}

// ---------------------------------------------------------------------------
// SymbolEntry
// ---------------------------------------------------------------------------

/// A knowledge-base entry: one named mathematical concept injected into
/// the prompt as domain knowledge. Ids are namespaced `cd:name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolEntry {
    pub id: String,
    pub description: String,
    /// Formal properties, ordered as authored.
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub example: String,
}

impl SymbolEntry {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            properties: Vec::new(),
            example: String::new(),
        }
    }
}

/// One retrieved entry with its relevance score. A retrieval result is an
/// ordered sequence of these, most relevant first.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredSymbol {
    pub entry: SymbolEntry,
    pub score: f32,
}

// ---------------------------------------------------------------------------
// Attempt / ProblemOutcome
// ---------------------------------------------------------------------------

/// One grading attempt. Immutable once recorded.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    /// 1-based attempt index.
    pub index: u32,
    pub raw_text: String,
    pub extracted: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Correct,
    Incorrect,
    /// Transport retries exhausted; never counted as a wrong answer.
    Errored { reason: String },
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Correct => write!(f, "correct"),
            Self::Incorrect => write!(f, "incorrect"),
            Self::Errored { reason } => write!(f, "errored: {reason}"),
        }
    }
}

/// Full record of one best-of-n run over a problem.
///
/// Invariant: `1 <= final_attempt_index <= attempts.len()` whenever any
/// attempt was recorded, and for Correct/Incorrect the status agrees with
/// `attempts[final_attempt_index - 1].is_correct`.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemOutcome {
    pub problem: Problem,
    pub attempts: Vec<Attempt>,
    pub final_attempt_index: u32,
    pub status: OutcomeStatus,
}

impl ProblemOutcome {
    pub fn is_correct(&self) -> bool {
        self.status == OutcomeStatus::Correct
    }

    pub fn is_errored(&self) -> bool {
        matches!(self.status, OutcomeStatus::Errored { .. })
    }

    /// The answer text reported for this problem: whatever the final
    /// attempt extracted, even when earlier attempts looked closer.
    pub fn final_answer(&self) -> Option<&str> {
        self.attempts
            .get(self.final_attempt_index.saturating_sub(1) as usize)
            .and_then(|a| a.extracted.as_deref())
    }
}
