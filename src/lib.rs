//! noteseek library
//!
//! Semantic search over personal notes.
//!
//! # Modules
//!
//! - `core`: Note storage, configuration and data paths
//! - `search`: Embedder, vector indexes, search engine and background worker
//! - `notebook`: Note CRUD wired to index maintenance

pub mod core;
pub mod notebook;
pub mod search;

// Re-exports for convenience
pub use core::config::{Config, IndexBackend};
pub use core::note::{Note, NoteDraft, NoteId, NotePreview, NoteSource};
pub use core::paths::DataPaths;
pub use core::store::{NoteStore, StoreError};
pub use notebook::{Notebook, NotebookStatus};
pub use search::{SearchEngine, SearchError, SearchResult};
