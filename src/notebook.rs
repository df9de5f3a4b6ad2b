//! Notebook - note CRUD with inline index maintenance
//!
//! Builds every component once and keeps the vector index in step with note
//! mutations. Index hooks run synchronously after the note write; if a hook
//! fails the failure is logged and the note change still stands, leaving the
//! index stale until the next [`Notebook::rebuild_index`].

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::core::config::{Config, IndexBackend};
use crate::core::db::Database;
use crate::core::note::{Note, NoteDraft, NoteId, NotePreview};
use crate::core::paths::DataPaths;
use crate::core::store::{NoteStore, StoreError};
use crate::search::{
    Embedder, IndexingStats, MemoryVectorIndex, PositionalEmbedder, SearchEngine, SearchError,
    SearchOptions, SqliteVectorIndex, VectorIndex,
};

const LAST_FULL_INDEX: &str = "last_full_index";

#[derive(Debug, Clone, Serialize)]
pub struct NotebookStatus {
    pub note_count: usize,
    pub indexed_count: usize,
    pub backend: String,
    pub embedder: String,
    pub last_full_index: Option<DateTime<Utc>>,
}

pub struct Notebook {
    store: NoteStore,
    engine: Arc<SearchEngine>,
}

impl Notebook {
    /// Open the on-disk notebook described by `paths` and `config`.
    pub fn open(paths: &DataPaths, config: &Config) -> Result<Self> {
        paths.ensure_dirs()?;
        let db = Database::open(&paths.db)
            .with_context(|| format!("Failed to open {}", paths.db.display()))?;
        Self::with_database(db, config)
    }

    pub fn open_in_memory(config: &Config) -> Result<Self> {
        Self::with_database(Database::open_in_memory()?, config)
    }

    fn with_database(db: Database, config: &Config) -> Result<Self> {
        let store = NoteStore::new(db.clone())?;
        let embedder: Arc<dyn Embedder> = Arc::new(PositionalEmbedder::new());

        let index: Arc<dyn VectorIndex> = match config.search.backend {
            IndexBackend::Sqlite => Arc::new(SqliteVectorIndex::new(db, embedder.dimension())?),
            IndexBackend::Memory => Arc::new(MemoryVectorIndex::new(embedder.dimension())),
        };

        let options = SearchOptions {
            snippet_chars: config.search.snippet_chars,
            over_fetch: config.search.over_fetch,
        };
        let engine = Arc::new(SearchEngine::new(
            embedder,
            index,
            Arc::new(store.clone()),
            options,
        ));

        let notebook = Self { store, engine };
        if notebook.engine.index().is_empty()? && notebook.store.count()? > 0 {
            info!(backend = %config.search.backend, "index empty, building from notes");
            notebook.rebuild_index()?;
        }
        Ok(notebook)
    }

    pub fn engine(&self) -> &Arc<SearchEngine> {
        &self.engine
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn create_note(&self, draft: &NoteDraft) -> Result<Note, StoreError> {
        let note = self.store.create(draft)?;
        self.reindex(&note);
        Ok(note)
    }

    pub fn update_note(&self, id: NoteId, draft: &NoteDraft) -> Result<Note, StoreError> {
        let note = self.store.update(id, draft)?;
        self.reindex(&note);
        Ok(note)
    }

    /// Returns false if the note did not exist.
    pub fn delete_note(&self, id: NoteId) -> Result<bool, StoreError> {
        let existed = self.store.delete(id)?;
        if let Err(e) = self.engine.remove_note(id) {
            warn!(id, error = %e, "failed to remove note from index; run a rebuild");
        }
        Ok(existed)
    }

    pub fn get_note(&self, id: NoteId) -> Result<Option<Note>, StoreError> {
        self.store.get(id)
    }

    pub fn list_notes(&self) -> Result<Vec<NotePreview>, StoreError> {
        self.store.list()
    }

    /// Full re-index; records the completion time.
    pub fn rebuild_index(&self) -> Result<IndexingStats, SearchError> {
        let stats = self.engine.index_all()?;
        self.store
            .database()
            .set_meta(LAST_FULL_INDEX, &Utc::now().timestamp().to_string())?;
        Ok(stats)
    }

    pub fn status(&self) -> Result<NotebookStatus, SearchError> {
        let last_full_index = self
            .store
            .database()
            .get_meta(LAST_FULL_INDEX)?
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(|ts| DateTime::from_timestamp(ts, 0));

        Ok(NotebookStatus {
            note_count: self.store.count()?,
            indexed_count: self.engine.index().len()?,
            backend: self.engine.index().backend().to_string(),
            embedder: self.engine.embedder().name().to_string(),
            last_full_index,
        })
    }

    fn reindex(&self, note: &Note) {
        if let Err(e) = self.engine.index_note(note.id, &note.full_text()) {
            warn!(id = note.id, error = %e, "failed to index note; run a rebuild");
        }
    }
}
