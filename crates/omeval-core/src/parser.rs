//! Final-answer extraction from model completions.
//!
//! Completions are expected to end with `\boxed{...}`; we take the last
//! balanced box in the text so scratch work earlier in the solution
//! cannot shadow the final answer. When no box is present a weaker
//! "the answer is ..." sweep runs before giving up.

const BOX_MACROS: [&str; 2] = ["\\boxed{", "\\fbox{"];
const ANSWER_PHRASES: [&str; 3] = ["answer is", "answer:", "final answer is"];

/// Extract the final answer from a completion. `None` when the text
/// carries no recognizable answer marker.
pub fn extract(text: &str) -> Option<String> {
    if let Some(inner) = last_boxed(text) {
        let trimmed = inner.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    answer_phrase(text)
}

/// Payload of the last balanced `\boxed{}`/`\fbox{}` span.
fn last_boxed(text: &str) -> Option<String> {
    // Both macros are scanned; the span starting latest in the text
    // wins regardless of which macro opened it.
    let mut best: Option<(usize, String)> = None;
    for macro_open in BOX_MACROS {
        let mut search_from = 0;
        while let Some(rel) = text[search_from..].find(macro_open) {
            let pos = search_from + rel;
            let start = pos + macro_open.len();
            if let Some(inner) = balanced_span(&text[start..]) {
                if best.as_ref().map_or(true, |(p, _)| pos > *p) {
                    best = Some((pos, inner));
                }
            }
            search_from = start;
        }
    }
    best.map(|(_, inner)| inner)
}

/// The prefix of `rest` up to the brace that closes an already-open
/// group. `None` when braces never balance.
fn balanced_span(rest: &str) -> Option<String> {
    let mut depth = 1u32;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(rest[..i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Weak fallback: the remainder of the line after the last "answer is"
/// style phrase, stripped of trailing punctuation and `$` fencing.
fn answer_phrase(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let mut best_pos: Option<(usize, usize)> = None;
    for phrase in ANSWER_PHRASES {
        let mut from = 0;
        while let Some(rel) = lower[from..].find(phrase) {
            let pos = from + rel;
            best_pos = Some(match best_pos {
                Some(prev) if prev.0 > pos => prev,
                _ => (pos, pos + phrase.len()),
            });
            from = pos + phrase.len();
        }
    }
    let (_, after) = best_pos?;
    let tail = text[after..].lines().next()?.trim();
    let cleaned = tail
        .trim_end_matches(['.', '!'])
        .trim_matches('$')
        .trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_box() {
        assert_eq!(
            extract("Therefore \\boxed{42}.").as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_last_box_wins() {
        let text = "First we get \\boxed{7}, but correcting: \\boxed{9}";
        assert_eq!(extract(text).as_deref(), Some("9"));
    }

    #[test]
    fn test_nested_braces() {
        let text = "So \\boxed{\\frac{1}{2}} is the value.";
        assert_eq!(extract(text).as_deref(), Some("\\frac{1}{2}"));
    }

    #[test]
    fn test_unbalanced_box_ignored() {
        assert_eq!(extract("\\boxed{\\frac{1}{2}"), None);
    }

    #[test]
    fn test_fbox() {
        assert_eq!(extract("\\fbox{-3}").as_deref(), Some("-3"));
    }

    #[test]
    fn test_last_box_wins_across_macros() {
        assert_eq!(
            extract("\\fbox{1} and finally \\boxed{2}").as_deref(),
            Some("2")
        );
        assert_eq!(
            extract("\\boxed{1} and finally \\fbox{2}").as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_answer_phrase_fallback() {
        let text = "We conclude.\nThe answer is $x = 5$.";
        assert_eq!(extract(text).as_deref(), Some("x = 5"));
    }

    #[test]
    fn test_no_marker() {
        assert_eq!(extract("I could not solve this problem."), None);
        assert_eq!(extract(""), None);
    }

    #[test]
    fn test_empty_box_falls_through() {
        assert_eq!(extract("\\boxed{}"), None);
        assert_eq!(
            extract("\\boxed{} so the answer is 12").as_deref(),
            Some("12")
        );
    }
}
