//! Top-K symbol selection over a [`SymbolStore`].

use tracing::debug;

use omeval_core::{Problem, ScoredSymbol, SymbolStore};

#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub symbols: Vec<ScoredSymbol>,
}

impl RetrievalResult {
    pub fn ids(&self) -> Vec<&str> {
        self.symbols.iter().map(|s| s.entry.id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Scores every entry in the store against a problem statement and
/// keeps the K best above the problem's relevance threshold.
///
/// The ordering is total (score descending, then id ascending), so the
/// same (problem, store, k) always yields the same list.
pub struct SymbolRetriever<'a> {
    store: &'a dyn SymbolStore,
}

impl<'a> SymbolRetriever<'a> {
    pub fn new(store: &'a dyn SymbolStore) -> Self {
        Self { store }
    }

    pub fn retrieve(&self, problem: &Problem, k: usize) -> RetrievalResult {
        let mut scored = self.store.score_all(&problem.statement);
        scored.retain(|(_, score)| *score >= problem.relevance_threshold);
        scored.sort_by(|(ida, sa), (idb, sb)| {
            sb.total_cmp(sa).then_with(|| ida.cmp(idb))
        });
        scored.truncate(k);

        let symbols = scored
            .into_iter()
            .filter_map(|(id, score)| {
                self.store
                    .lookup(&id)
                    .map(|entry| ScoredSymbol { entry, score })
            })
            .collect::<Vec<_>>();
        debug!(
            problem = %problem.id,
            retrieved = symbols.len(),
            "symbol retrieval"
        );
        RetrievalResult { symbols }
    }
}
