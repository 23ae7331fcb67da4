//! LaTeX cleanup ahead of structural and symbolic comparison.
//!
//! Normalization is structure-preserving: it strips presentation noise
//! (`$`, `\left`/`\right`, spacing macros, `\dfrac`, unit text, degree
//! marks) without touching the math itself.

/// Strip presentation-only LaTeX noise and collapse whitespace.
pub fn normalize(s: &str) -> String {
    let mut out = s.replace('$', "");

    for cmd in ["\\left", "\\right"] {
        out = out.replace(cmd, "");
    }
    for cmd in ["\\dfrac", "\\tfrac"] {
        out = out.replace(cmd, "\\frac");
    }
    // Spacing macros carry no meaning. `\ ` is handled separately so
    // the `\\` row separator inside matrix bodies stays intact.
    for cmd in ["\\!", "\\,", "\\;", "\\:", "\\quad", "\\qquad"] {
        out = out.replace(cmd, " ");
    }
    out = strip_space_macro(&out);
    // Degree marks and escaped percent signs are formatting, not value.
    out = out.replace("^{\\circ}", "").replace("^\\circ", "");
    out = out.replace("\\%", "");

    out = unwrap_spans(&out, "\\text");
    out = unwrap_spans(&out, "\\mbox");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Loose comparison key: normalized, backslashes and whitespace removed,
/// lowercased. Two answers with equal keys are textually identical up to
/// notation trivia.
pub fn canonical_text(s: &str) -> String {
    normalize(s)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\\')
        .collect::<String>()
        .to_lowercase()
}

/// `\ ` swallows the space, but only when the backslash is not itself
/// the second half of a `\\` row separator.
fn strip_space_macro(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('\\') => {
                chars.next();
                out.push_str("\\\\");
            }
            Some(' ') => {
                chars.next();
                out.push(' ');
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// Replace every `cmd{...}` span (balanced braces) with its content.
/// A span trailing a numeric value is a unit annotation like
/// `12 \text{ cm}` and is dropped instead.
fn unwrap_spans(s: &str, cmd: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find(cmd) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + cmd.len()..];
        let Some(body) = after.strip_prefix('{') else {
            // Not a braced span; keep the command literally.
            out.push_str(cmd);
            rest = after;
            continue;
        };
        let mut depth = 1usize;
        let mut end = None;
        for (i, c) in body.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        match end {
            Some(i) => {
                if !is_unit_position(&out) {
                    out.push_str(&body[..i]);
                }
                rest = &body[i + 1..];
            }
            None => {
                // Unbalanced span; drop the remainder.
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// A text span directly after a number (or a closed group like
/// `\frac{1}{2}`) annotates a unit rather than carrying the answer.
fn is_unit_position(before: &str) -> bool {
    matches!(
        before.trim_end().chars().last(),
        Some(c) if c.is_ascii_digit() || c == '}' || c == ')'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_dollars_and_sizing() {
        assert_eq!(normalize("$\\left(3, 4\\right)$"), "(3, 4)");
    }

    #[test]
    fn test_dfrac_becomes_frac() {
        assert_eq!(normalize("\\dfrac{1}{2}"), "\\frac{1}{2}");
    }

    #[test]
    fn test_strips_unit_text() {
        assert_eq!(normalize("12 \\text{ cm}"), "12");
        assert_eq!(normalize("45^\\circ"), "45");
    }

    #[test]
    fn test_canonical_text_ignores_spacing() {
        assert_eq!(canonical_text("2k + 2"), canonical_text("2k+2"));
        assert_eq!(canonical_text("3\\sqrt{13}"), "3sqrt{13}");
    }

    #[test]
    fn test_nested_text_span() {
        assert_eq!(normalize("5 \\text{m {per} s}"), "5");
    }

    #[test]
    fn test_text_answer_keeps_content() {
        assert_eq!(normalize("\\text{even}"), "even");
        assert_eq!(canonical_text("\\text{even}"), canonical_text("even"));
    }

    #[test]
    fn test_unit_after_fraction_dropped() {
        assert_eq!(normalize("\\frac{1}{2} \\text{ cm}"), "\\frac{1}{2}");
    }

    #[test]
    fn test_row_separator_survives_spacing_strip() {
        assert_eq!(normalize("1 & 2 \\\\ 3 & 4"), "1 & 2 \\\\ 3 & 4");
        assert_eq!(normalize("a\\ b"), "a b");
    }
}
