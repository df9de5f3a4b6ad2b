//! Semantic Search Engine for notes
//!
//! Embedder → vector index → engine join with live note content, plus a
//! background worker for callers that must not block.

pub mod artifact;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod memory;
pub mod vectordb;
pub mod worker;

pub use embedding::{Embedder, PositionalEmbedder, EMBEDDING_DIM};
pub use engine::{IndexingStats, SearchEngine, SearchOptions, SearchResult};
pub use error::SearchError;
pub use memory::MemoryVectorIndex;
pub use vectordb::{ScoredNote, SqliteVectorIndex, VectorIndex};
pub use worker::{SearchCommand, SearchMessage, SearchOutcome, SearchWorker};
