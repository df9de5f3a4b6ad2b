use crate::core::db::LockPoisoned;
use crate::core::note::NoteId;
use crate::core::store::StoreError;

/// Failures surfaced by the embedder, the vector index and the engine.
///
/// A missing note or a missing vector is never an error; those are `None`.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Index storage failed: {0}")]
    IndexStorage(#[from] rusqlite::Error),

    #[error("Index lock poisoned")]
    LockPoisoned,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Stored vector for note {id} is corrupt ({bytes} bytes)")]
    CorruptVector { id: NoteId, bytes: usize },

    #[error("Search worker failed: {0}")]
    Worker(String),

    #[error("Note store failed: {0}")]
    NoteStore(#[from] StoreError),
}

impl From<LockPoisoned> for SearchError {
    fn from(_: LockPoisoned) -> Self {
        Self::LockPoisoned
    }
}
