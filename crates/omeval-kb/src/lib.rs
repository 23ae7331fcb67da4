//! JSON-file-backed symbol knowledge base and keyword retrieval.

pub mod retriever;
pub mod store;

pub use retriever::{RetrievalResult, SymbolRetriever};
pub use store::JsonStore;
