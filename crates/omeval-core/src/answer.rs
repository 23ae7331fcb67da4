//! Structural classification of final answers.
//!
//! A normalized answer string is split into one of a few shapes before
//! the grader compares scalars pairwise:
//!
//! - `(a, b)` and `[a, b]` — ordered tuples (delimiter style recorded);
//! - `(a, b]` and `[a, b)` — half-open intervals;
//! - `{a, b}` and bare `a, b` — unordered collections;
//! - `\begin{pmatrix}...\end{pmatrix}` — matrices;
//! - everything else — a scalar handled by the expression engine.

/// Bracket style of an ordered tuple. `(1,2)` and `[1,2]` do not match
/// each other even when the elements do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleStyle {
    Round,
    Square,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Scalar(String),
    Tuple {
        style: TupleStyle,
        elems: Vec<String>,
    },
    Interval {
        lo: String,
        hi: String,
        open_lo: bool,
        open_hi: bool,
    },
    /// Unordered multiset: braces or a bare top-level comma list.
    Set(Vec<String>),
    Matrix {
        env: String,
        rows: Vec<Vec<String>>,
    },
}

const MATRIX_ENVS: [&str; 4] = ["pmatrix", "bmatrix", "vmatrix", "matrix"];

/// Classify a normalized answer string.
pub fn classify(s: &str) -> Shape {
    let s = strip_binding_prefix(s.trim());

    if let Some(m) = parse_matrix(s) {
        return m;
    }

    let chars: Vec<char> = s.chars().collect();
    if chars.len() >= 2 {
        let first = chars[0];
        let last = chars[chars.len() - 1];
        let opens = first == '(' || first == '[' || first == '{';
        let closes = last == ')' || last == ']' || last == '}';
        if opens && closes && encloses_all(&chars) {
            let inner: String = chars[1..chars.len() - 1].iter().collect();
            let elems = split_top_level(&inner);
            match (first, last) {
                ('{', '}') => return Shape::Set(trimmed(elems)),
                ('(', ')') if !elems.is_empty() => {
                    return Shape::Tuple {
                        style: TupleStyle::Round,
                        elems: trimmed(elems),
                    }
                }
                ('[', ']') if !elems.is_empty() => {
                    return Shape::Tuple {
                        style: TupleStyle::Square,
                        elems: trimmed(elems),
                    }
                }
                ('(', ']') | ('[', ')') if elems.len() == 2 => {
                    return Shape::Interval {
                        lo: elems[0].trim().to_string(),
                        hi: elems[1].trim().to_string(),
                        open_lo: first == '(',
                        open_hi: last == ')',
                    }
                }
                _ => {}
            }
        }
    }

    let parts = split_top_level(s);
    if parts.len() >= 2 {
        return Shape::Set(trimmed(parts));
    }

    Shape::Scalar(s.to_string())
}

/// Drop a leading variable binding: `x \in [2,5)` and `x = 3` grade by
/// the right-hand side.
fn strip_binding_prefix(s: &str) -> &str {
    for sep in ["\\in", "="] {
        if let Some(idx) = s.find(sep) {
            let head = &s[..idx];
            if !head.is_empty()
                && head.len() <= 12
                && head
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
            {
                return s[idx + sep.len()..].trim_start();
            }
        }
    }
    s
}

/// Whether the opening bracket at index 0 stays open until the final
/// character, so the pair really wraps the whole string.
fn encloses_all(chars: &[char]) -> bool {
    let mut depth = 0i32;
    for (i, c) in chars.iter().enumerate() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 && i != chars.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Split on commas that sit outside every bracket pair.
pub fn split_top_level(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    parts.push(current);
    if parts.iter().any(|p| p.trim().is_empty()) {
        // A dangling comma is not a list.
        return vec![s.to_string()];
    }
    parts
}

fn trimmed(parts: Vec<String>) -> Vec<String> {
    parts.into_iter().map(|p| p.trim().to_string()).collect()
}

fn parse_matrix(s: &str) -> Option<Shape> {
    for env in MATRIX_ENVS {
        let open = format!("\\begin{{{env}}}");
        let close = format!("\\end{{{env}}}");
        if let Some(rest) = s.strip_prefix(open.as_str()) {
            let body = rest.strip_suffix(close.as_str())?.trim();
            let rows = body
                .split("\\\\")
                .map(|row| {
                    row.split('&')
                        .map(|cell| cell.trim().to_string())
                        .collect::<Vec<_>>()
                })
                .filter(|row| !(row.len() == 1 && row[0].is_empty()))
                .collect::<Vec<_>>();
            if rows.is_empty() {
                return None;
            }
            return Some(Shape::Matrix {
                env: env.to_string(),
                rows,
            });
        }
    }
    None
}
