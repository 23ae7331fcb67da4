//! Prompt assembly.
//!
//! The system prompt carries the retrieved knowledge entries in
//! retrieval order; the user prompt is the problem statement followed
//! by the fixed stepwise-reasoning trigger. Both are pure functions of
//! their inputs, so a rebuilt prompt for the same problem is
//! byte-identical across attempts and runs.

use omeval_core::{Problem, ScoredSymbol};

const CONTEXT_HEADER: &str = "## Relevant Mathematical Definitions and Properties";
const EMPTY_CONTEXT: &str = "(No relevant mathematical definitions found.)";
const TRIGGER: &str =
    "Please reason step by step, and put your final answer within \\boxed{}.";

/// Each entry contributes at most this many properties to the prompt.
const MAX_PROPERTIES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(&self, problem: &Problem, symbols: &[ScoredSymbol]) -> PromptPair {
        PromptPair {
            system_prompt: self.system_prompt(symbols),
            user_prompt: format!("{}\n\n{}", problem.statement, TRIGGER),
        }
    }

    fn system_prompt(&self, symbols: &[ScoredSymbol]) -> String {
        if symbols.is_empty() {
            return EMPTY_CONTEXT.to_string();
        }
        let mut lines = vec![CONTEXT_HEADER.to_string(), String::new()];
        for scored in symbols {
            let entry = &scored.entry;
            lines.push(format!("### {}", entry.id));
            let desc = collapse_ws(&entry.description);
            if !desc.is_empty() {
                lines.push(format!("**Description:** {desc}"));
            }
            if !entry.properties.is_empty() {
                lines.push("**Properties:**".to_string());
                for prop in entry.properties.iter().take(MAX_PROPERTIES) {
                    lines.push(format!("  - {}", collapse_ws(prop)));
                }
            }
            if !entry.example.is_empty() {
                lines.push(format!("**Example:** {}", collapse_ws(&entry.example)));
            }
            lines.push(String::new());
        }
        lines.join("\n").trim_end().to_string()
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
