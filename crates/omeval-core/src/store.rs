use crate::problem::SymbolEntry;

/// Read-only knowledge-base access. Implementations hold an immutable
/// snapshot, so every method is a pure function of (snapshot, input).
pub trait SymbolStore: Send + Sync {
    fn lookup(&self, id: &str) -> Option<SymbolEntry>;

    /// Score every entry against a problem statement. Returns
    /// `(symbol id, score)` pairs with scores in (0, 1]; entries with no
    /// lexical overlap are omitted entirely.
    fn score_all(&self, problem_text: &str) -> Vec<(String, f32)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
