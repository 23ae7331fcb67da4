//! JSON knowledge base with a keyword index.
//!
//! Two files back the store: the knowledge base proper, a `symbols` map
//! keyed by namespaced id (`arith1:gcd`), and an index file with three
//! maps — `index` (keyword → symbol ids), `aliases` (operator glyphs
//! like `+` → symbol ids) and `synonyms` (keyword → index keywords).
//! Both are loaded once; the store is immutable afterwards, which is
//! what makes retrieval a pure function of the problem text.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use omeval_core::{EvalError, EvalResult, SymbolEntry, SymbolStore};

#[derive(Debug, Deserialize)]
struct KbFile {
    #[serde(default)]
    symbols: BTreeMap<String, SymbolEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct IndexFile {
    #[serde(default)]
    index: HashMap<String, Vec<String>>,
    #[serde(default)]
    aliases: HashMap<String, Vec<String>>,
    #[serde(default)]
    synonyms: HashMap<String, Vec<String>>,
}

pub struct JsonStore {
    symbols: BTreeMap<String, SymbolEntry>,
    index: HashMap<String, Vec<String>>,
    aliases: HashMap<String, Vec<String>>,
    synonyms: HashMap<String, Vec<String>>,
}

impl JsonStore {
    pub fn open(kb_path: &Path, index_path: &Path) -> EvalResult<Self> {
        let kb: KbFile = read_json(kb_path)?;
        let idx: IndexFile = read_json(index_path)?;
        let store = Self {
            symbols: kb.symbols,
            index: idx.index,
            aliases: idx.aliases,
            synonyms: idx.synonyms,
        };
        info!(
            symbols = store.symbols.len(),
            keywords = store.index.len(),
            "loaded knowledge base"
        );
        Ok(store)
    }

    /// Assemble a store directly from maps, bypassing the filesystem.
    pub fn from_parts(
        symbols: BTreeMap<String, SymbolEntry>,
        index: HashMap<String, Vec<String>>,
        aliases: HashMap<String, Vec<String>>,
        synonyms: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            symbols,
            index,
            aliases,
            synonyms,
        }
    }

    /// Resolve one lowercase term to symbol ids through the index, then
    /// aliases, then one level of synonym expansion. Order-preserving,
    /// deduplicated.
    fn resolve_term(&self, term: &str) -> Vec<&str> {
        let mut matched: Vec<&str> = Vec::new();
        if let Some(ids) = self.index.get(term) {
            matched.extend(ids.iter().map(String::as_str));
        }
        if let Some(ids) = self.aliases.get(term) {
            matched.extend(ids.iter().map(String::as_str));
        }
        if let Some(targets) = self.synonyms.get(term) {
            for target in targets {
                if let Some(ids) = self.index.get(target) {
                    matched.extend(ids.iter().map(String::as_str));
                }
            }
        }
        let mut seen = std::collections::HashSet::new();
        matched.retain(|id| seen.insert(*id));
        matched
    }
}

impl SymbolStore for JsonStore {
    fn lookup(&self, id: &str) -> Option<SymbolEntry> {
        self.symbols.get(id).cloned()
    }

    /// Count how many distinct query terms each symbol matches, then
    /// normalize by the best count so scores land in (0, 1]. Symbols
    /// with no matching term are omitted entirely.
    fn score_all(&self, problem_text: &str) -> Vec<(String, f32)> {
        let terms = tokenize(problem_text);
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for term in &terms {
            for id in self.resolve_term(term) {
                if self.symbols.contains_key(id) {
                    *counts.entry(id).or_insert(0) += 1;
                }
            }
        }
        let max = counts.values().copied().max().unwrap_or(0);
        if max == 0 {
            return Vec::new();
        }
        counts
            .into_iter()
            .map(|(id, c)| (id.to_string(), c as f32 / max as f32))
            .collect()
    }

    fn len(&self) -> usize {
        self.symbols.len()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> EvalResult<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| EvalError::Kb(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| EvalError::Kb(format!("cannot parse {}: {e}", path.display())))
}

/// Terms that LaTeX commands in a statement stand for. The statement is
/// scanned for these before the command backslashes are discarded.
const LATEX_TERMS: [(&str, &str); 22] = [
    ("\\frac", "fraction"),
    ("\\sqrt", "sqrt"),
    ("\\sin", "sin"),
    ("\\cos", "cos"),
    ("\\tan", "tan"),
    ("\\ln", "ln"),
    ("\\log", "log"),
    ("\\exp", "exp"),
    ("\\sum", "sum"),
    ("\\prod", "product"),
    ("\\int", "integral"),
    ("\\gcd", "gcd"),
    ("\\lim", "limit"),
    ("\\infty", "infinity"),
    ("\\pi", "pi"),
    ("\\cdot", "times"),
    ("\\times", "times"),
    ("\\lfloor", "floor"),
    ("\\lceil", "ceiling"),
    ("\\cup", "union"),
    ("\\cap", "intersection"),
    ("\\binom", "binomial"),
];

/// Multi-word phrases that index as a single underscored keyword.
/// Longest first so "greatest common divisor" wins over "common".
const PHRASES: [&str; 8] = [
    "greatest common divisor",
    "least common multiple",
    "absolute value",
    "square root",
    "cube root",
    "natural logarithm",
    "standard deviation",
    "binomial coefficient",
];

/// Break a problem statement into lowercase query terms: recognized
/// phrases, terms implied by LaTeX commands, bare words, and
/// single-character operator glyphs. Duplicates are kept; a statement
/// that mentions a concept twice should weigh it twice.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let lower = text.to_lowercase();

    let mut remainder = lower.clone();
    for phrase in PHRASES {
        while let Some(pos) = remainder.find(phrase) {
            terms.push(phrase.replace(' ', "_"));
            remainder.replace_range(pos..pos + phrase.len(), " ");
        }
    }
    for (cmd, term) in LATEX_TERMS {
        let mut from = 0;
        while let Some(rel) = remainder[from..].find(cmd) {
            terms.push(term.to_string());
            from += rel + cmd.len();
        }
    }

    let mut word = String::new();
    for c in remainder.chars() {
        if c.is_ascii_alphanumeric() {
            word.push(c);
        } else {
            if word.len() > 1 {
                terms.push(std::mem::take(&mut word));
            } else {
                word.clear();
            }
            if matches!(c, '+' | '-' | '*' | '/' | '^' | '=' | '<' | '>' | '!' | '%') {
                terms.push(c.to_string());
            }
        }
    }
    if word.len() > 1 {
        terms.push(word);
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_store() -> JsonStore {
        let mut symbols = BTreeMap::new();
        for (id, desc) in [
            ("arith1:gcd", "Greatest common divisor of its arguments."),
            ("arith1:plus", "Addition of two or more terms."),
            ("transc1:sin", "The circular trigonometric function sine."),
        ] {
            symbols.insert(id.to_string(), SymbolEntry::new(id, desc));
        }
        let mut index = HashMap::new();
        index.insert("gcd".to_string(), vec!["arith1:gcd".to_string()]);
        index.insert(
            "greatest_common_divisor".to_string(),
            vec!["arith1:gcd".to_string()],
        );
        index.insert("sin".to_string(), vec!["transc1:sin".to_string()]);
        index.insert("sum".to_string(), vec!["arith1:plus".to_string()]);
        let mut aliases = HashMap::new();
        aliases.insert("+".to_string(), vec!["arith1:plus".to_string()]);
        let mut synonyms = HashMap::new();
        synonyms.insert("sine".to_string(), vec!["sin".to_string()]);
        JsonStore::from_parts(symbols, index, aliases, synonyms)
    }

    #[test]
    fn test_tokenize_phrases_and_latex() {
        let terms = tokenize("Find the greatest common divisor of $\\gcd(12, 18)$");
        assert!(terms.contains(&"greatest_common_divisor".to_string()));
        assert!(terms.contains(&"gcd".to_string()));
    }

    #[test]
    fn test_tokenize_operators() {
        let terms = tokenize("compute 3 + 4");
        assert!(terms.contains(&"+".to_string()));
        assert!(terms.contains(&"compute".to_string()));
    }

    #[test]
    fn test_score_all_normalized() {
        let store = make_store();
        let scores = store.score_all("What is the gcd of 12 and 18? Use gcd properties.");
        let gcd = scores.iter().find(|(id, _)| id == "arith1:gcd");
        assert!(gcd.is_some_and(|(_, s)| (*s - 1.0).abs() < f32::EPSILON));
        // No sine mention anywhere, so the symbol never appears.
        assert!(!scores.iter().any(|(id, _)| id == "transc1:sin"));
    }

    #[test]
    fn test_score_all_no_matches() {
        let store = make_store();
        assert!(store.score_all("a problem about nothing indexed").is_empty());
    }

    #[test]
    fn test_synonym_resolution() {
        let store = make_store();
        let scores = store.score_all("the sine of an angle");
        assert!(scores.iter().any(|(id, _)| id == "transc1:sin"));
    }

    #[test]
    fn test_alias_resolution() {
        let store = make_store();
        let scores = store.score_all("evaluate 1 + 2");
        assert!(scores.iter().any(|(id, _)| id == "arith1:plus"));
    }

    #[test]
    fn test_open_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let kb_path = dir.path().join("kb.json");
        let index_path = dir.path().join("index.json");
        let mut kb = std::fs::File::create(&kb_path).unwrap();
        write!(
            kb,
            r#"{{"symbols": {{"arith1:gcd": {{"id": "arith1:gcd", "description": "gcd"}}}}}}"#
        )
        .unwrap();
        let mut idx = std::fs::File::create(&index_path).unwrap();
        write!(idx, r#"{{"index": {{"gcd": ["arith1:gcd"]}}}}"#).unwrap();

        let store = JsonStore::open(&kb_path, &index_path).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.lookup("arith1:gcd").is_some());
        assert!(store.lookup("arith1:times").is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(JsonStore::open(&missing, &missing).is_err());
    }
}
