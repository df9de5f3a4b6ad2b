//! Search Engine - combines the embedder, the vector index and the note store
//!
//! The index only knows ids and vectors. Everything shown to the user (title,
//! snippet, tags) is read from the live note at query time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use super::embedding::Embedder;
use super::error::SearchError;
use super::vectordb::VectorIndex;
use crate::core::note::{truncate_chars, Note, NoteId, NoteSource};

/// Search result joined with the note's current content
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: NoteId,
    pub score: f32,
    pub title: String,
    pub snippet: String,
    pub tags: Vec<String>,
}

impl SearchResult {
    fn from_note(note: Note, score: f32, snippet_chars: usize) -> Self {
        Self {
            id: note.id,
            score,
            snippet: truncate_chars(&note.full_text(), snippet_chars),
            title: note.title,
            tags: note.tags,
        }
    }

    fn has_all_tags(&self, required: &[String]) -> bool {
        required.iter().all(|tag| self.tags.contains(tag))
    }
}

/// Indexing statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexingStats {
    pub indexed: usize,
    /// Listed notes that vanished before they could be fetched
    pub skipped: usize,
    /// Index entries removed because their note no longer exists
    pub pruned: usize,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Maximum characters in `SearchResult::snippet`
    pub snippet_chars: usize,
    /// Extra candidates requested from the index to cover vanished notes
    pub over_fetch: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            snippet_chars: 300,
            over_fetch: 5,
        }
    }
}

/// Search engine combining embedder, vector index and note store
pub struct SearchEngine {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    notes: Arc<dyn NoteSource>,
    options: SearchOptions,
}

impl SearchEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        notes: Arc<dyn NoteSource>,
        options: SearchOptions,
    ) -> Self {
        Self {
            embedder,
            index,
            notes,
            options,
        }
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Search for notes similar to query
    ///
    /// Blank queries return nothing without touching the embedder. Candidates
    /// whose note has been deleted are dropped and do not count toward `limit`.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        if query.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_single(query)?;
        let candidates = self
            .index
            .search(&query_embedding, limit.saturating_add(self.options.over_fetch))?;

        let mut results = Vec::with_capacity(limit);
        for candidate in candidates {
            let Some(note) = self.notes.get_note(candidate.id)? else {
                debug!(id = candidate.id, "skipping hit for deleted note");
                continue;
            };
            results.push(SearchResult::from_note(
                note,
                candidate.score,
                self.options.snippet_chars,
            ));
            if results.len() == limit {
                break;
            }
        }

        debug!(query, limit, returned = results.len(), "search complete");
        Ok(results)
    }

    /// Search, then keep only results carrying every tag in `required_tags`.
    ///
    /// Filtering runs after ranking: order and scores are untouched and the
    /// result may be shorter than `limit`.
    pub fn search_with_tag_filter(
        &self,
        query: &str,
        limit: usize,
        required_tags: &[String],
    ) -> Result<Vec<SearchResult>, SearchError> {
        let mut results = self.search(query, limit)?;
        if !required_tags.is_empty() {
            results.retain(|r| r.has_all_tags(required_tags));
        }
        Ok(results)
    }

    /// Embed `text` and store it as the vector for `id`
    pub fn index_note(&self, id: NoteId, text: &str) -> Result<(), SearchError> {
        let embedding = self.embedder.embed_single(text)?;
        self.index.upsert(id, &embedding)
    }

    pub fn remove_note(&self, id: NoteId) -> Result<(), SearchError> {
        self.index.delete(id)
    }

    /// Re-index every note from its full content and drop orphaned vectors.
    ///
    /// Bodies from `list_notes` are previews, so each note is fetched again.
    pub fn index_all(&self) -> Result<IndexingStats, SearchError> {
        let start = Instant::now();
        let mut stats = IndexingStats::default();

        let listed = self.notes.list_notes()?;
        let mut live: HashSet<NoteId> = HashSet::with_capacity(listed.len());

        for preview in listed {
            match self.notes.get_note(preview.id)? {
                Some(note) => {
                    self.index_note(note.id, &note.full_text())?;
                    live.insert(note.id);
                    stats.indexed += 1;
                }
                None => stats.skipped += 1,
            }
        }

        // Notes created after the listing are not in `live`; only drop
        // vectors whose note is really gone.
        for id in self.index.ids()? {
            if live.contains(&id) || self.notes.get_note(id)?.is_some() {
                continue;
            }
            self.index.delete(id)?;
            stats.pruned += 1;
        }

        stats.duration_ms = start.elapsed().as_millis();
        info!(
            indexed = stats.indexed,
            skipped = stats.skipped,
            pruned = stats.pruned,
            backend = self.index.backend(),
            "index rebuilt"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::Database;
    use crate::core::note::{NoteDraft, NotePreview};
    use crate::core::store::{NoteStore, StoreError};
    use crate::search::embedding::{Embedding, PositionalEmbedder, EMBEDDING_DIM};
    use crate::search::memory::MemoryVectorIndex;
    use crate::search::vectordb::SqliteVectorIndex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn memory_engine() -> (NoteStore, SearchEngine) {
        let store = NoteStore::new(Database::open_in_memory().unwrap()).unwrap();
        let engine = SearchEngine::new(
            Arc::new(PositionalEmbedder::new()),
            Arc::new(MemoryVectorIndex::new(EMBEDDING_DIM)),
            Arc::new(store.clone()),
            SearchOptions::default(),
        );
        (store, engine)
    }

    fn sqlite_engine() -> (NoteStore, SearchEngine) {
        let db = Database::open_in_memory().unwrap();
        let store = NoteStore::new(db.clone()).unwrap();
        let engine = SearchEngine::new(
            Arc::new(PositionalEmbedder::new()),
            Arc::new(SqliteVectorIndex::new(db, EMBEDDING_DIM).unwrap()),
            Arc::new(store.clone()),
            SearchOptions::default(),
        );
        (store, engine)
    }

    /// Counts calls and fails on demand.
    struct CountingEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Embedder for CountingEmbedder {
        fn name(&self) -> &str {
            "counting"
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }

        fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SearchError::Embedding("model unavailable".to_string()));
            }
            PositionalEmbedder::new().embed(texts)
        }
    }

    /// Lists notes that `get_note` no longer finds.
    struct VanishingNotes;

    impl NoteSource for VanishingNotes {
        fn get_note(&self, _id: NoteId) -> Result<Option<Note>, StoreError> {
            Ok(None)
        }

        fn list_notes(&self) -> Result<Vec<NotePreview>, StoreError> {
            Ok(vec![NotePreview {
                id: 1,
                title: "ghost".to_string(),
                preview: String::new(),
                tags: Vec::new(),
                updated_at: chrono::Utc::now(),
            }])
        }
    }

    /// Creates and indexes one extra note the first time a note is fetched,
    /// like a create hook running in the middle of a rebuild.
    struct LateArrival {
        store: NoteStore,
        index: Arc<MemoryVectorIndex>,
        arrived: Mutex<Option<NoteId>>,
    }

    impl NoteSource for LateArrival {
        fn get_note(&self, id: NoteId) -> Result<Option<Note>, StoreError> {
            let mut arrived = self.arrived.lock().unwrap();
            if arrived.is_none() {
                let note = self.store.create(&NoteDraft::new("late", "written mid-rebuild"))?;
                let vector = PositionalEmbedder::new().embed_single(&note.full_text()).unwrap();
                self.index.upsert(note.id, &vector).unwrap();
                *arrived = Some(note.id);
            }
            drop(arrived);
            self.store.get(id)
        }

        fn list_notes(&self) -> Result<Vec<NotePreview>, StoreError> {
            self.store.list()
        }
    }

    #[test]
    fn test_scenario_distinct_notes() -> Result<(), SearchError> {
        for (store, engine) in [memory_engine(), sqlite_engine()] {
            let work = store.create(&NoteDraft::new("Work: planning project roadmap", ""))?;
            let groceries = store.create(&NoteDraft::new("Groceries: buy milk eggs bread", ""))?;
            engine.index_note(work.id, &work.full_text())?;
            engine.index_note(groceries.id, &groceries.full_text())?;

            let results = engine.search("Groceries: buy milk eggs bread", 10)?;
            let top: Vec<_> = results.iter().filter(|r| r.id != work.id).collect();
            assert_eq!(top.len(), 1);
            assert_eq!(results[0].id, groceries.id);
            assert!(results[0].score > results[1].score);
        }
        Ok(())
    }

    #[test]
    fn test_scenario_tag_filter() -> Result<(), SearchError> {
        let (store, engine) = memory_engine();
        let a = store.create(&NoteDraft::new("A", "alpha beta gamma").with_tags(["x"]))?;
        let b = store.create(&NoteDraft::new("B", "alpha beta gamma").with_tags(["y"]))?;
        engine.index_all()?;

        let results = engine.search_with_tag_filter("alpha beta gamma", 10, &["x".to_string()])?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, a.id);

        let both = engine.search("alpha beta gamma", 10)?;
        assert!(both.iter().any(|r| r.id == b.id));
        Ok(())
    }

    #[test]
    fn test_scenario_index_then_search() -> Result<(), SearchError> {
        let (store, engine) = sqlite_engine();
        let other = store.create(&NoteDraft::new("Groceries", "buy milk eggs bread"))?;
        let target = store.create(&NoteDraft::new("Greek letters", "ignored by this test"))?;
        engine.index_note(other.id, &other.full_text())?;

        engine.index_note(target.id, "alpha beta gamma")?;
        let results = engine.search("alpha beta gamma", 1)?;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, target.id);
        assert!((results[0].score - 1.0).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_tag_filter_neutral_when_empty() -> Result<(), SearchError> {
        let (store, engine) = memory_engine();
        for title in ["one", "two", "three"] {
            store.create(&NoteDraft::new(title, "shared words").with_tags([title]))?;
        }
        engine.index_all()?;

        let plain: Vec<_> = engine.search("shared", 2)?.iter().map(|r| (r.id, r.score)).collect();
        let filtered: Vec<_> = engine
            .search_with_tag_filter("shared", 2, &[])?
            .iter()
            .map(|r| (r.id, r.score))
            .collect();
        assert_eq!(plain, filtered);
        Ok(())
    }

    #[test]
    fn test_tag_filter_requires_every_tag() -> Result<(), SearchError> {
        let (store, engine) = memory_engine();
        let both = store.create(&NoteDraft::new("both", "text").with_tags(["a", "b"]))?;
        store.create(&NoteDraft::new("one", "text").with_tags(["a"]))?;
        store.create(&NoteDraft::new("upper", "text").with_tags(["A", "b"]))?;
        engine.index_all()?;

        let tags = vec!["a".to_string(), "b".to_string()];
        let results = engine.search_with_tag_filter("text", 10, &tags)?;
        let ids: Vec<_> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![both.id]);
        Ok(())
    }

    #[test]
    fn test_blank_query_skips_embedder() -> Result<(), SearchError> {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let engine = SearchEngine::new(
            embedder.clone(),
            Arc::new(MemoryVectorIndex::new(EMBEDDING_DIM)),
            Arc::new(VanishingNotes),
            SearchOptions::default(),
        );

        assert!(engine.search("", 5)?.is_empty());
        assert!(engine.search("   \t\n", 5)?.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn test_embedder_failure_propagates() -> Result<(), SearchError> {
        let store = NoteStore::new(Database::open_in_memory()?)?;
        store.create(&NoteDraft::new("present", "needs embedding"))?;
        let engine = SearchEngine::new(
            Arc::new(CountingEmbedder {
                calls: AtomicUsize::new(0),
                fail: true,
            }),
            Arc::new(MemoryVectorIndex::new(EMBEDDING_DIM)),
            Arc::new(store),
            SearchOptions::default(),
        );

        assert!(matches!(engine.search("query", 5), Err(SearchError::Embedding(_))));
        assert!(matches!(engine.index_note(1, "text"), Err(SearchError::Embedding(_))));
        assert!(matches!(engine.index_all(), Err(SearchError::Embedding(_))));
        assert!(engine.index().is_empty()?);
        Ok(())
    }

    #[test]
    fn test_vanished_notes_do_not_consume_limit() -> Result<(), SearchError> {
        let (store, engine) = memory_engine();
        let mut ids = Vec::new();
        for i in 0..4 {
            let note = store.create(&NoteDraft::new(format!("note {}", i), "same body"))?;
            engine.index_note(note.id, &note.full_text())?;
            ids.push(note.id);
        }

        // Delete two notes behind the index's back
        store.delete(ids[0])?;
        store.delete(ids[1])?;

        let results = engine.search("note 0\nsame body", 2)?;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.id != ids[0] && r.id != ids[1]));
        Ok(())
    }

    #[test]
    fn test_removed_note_never_surfaces() -> Result<(), SearchError> {
        let (store, engine) = memory_engine();
        let note = store.create(&NoteDraft::new("temporary", "short lived"))?;
        engine.index_note(note.id, &note.full_text())?;

        store.delete(note.id)?;
        engine.remove_note(note.id)?;

        assert_eq!(engine.index().get(note.id)?, None);
        assert!(engine.search("temporary\nshort lived", 10)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_snippet_uses_live_content() -> Result<(), SearchError> {
        let (store, engine) = memory_engine();
        let long_body = "word ".repeat(200);
        let note = store.create(&NoteDraft::new("Draft", "old text"))?;
        engine.index_note(note.id, &note.full_text())?;

        // Edit without re-indexing: the snippet still reflects the new body
        store.update(note.id, &NoteDraft::new("Draft", long_body.clone()))?;

        let results = engine.search("Draft\nold text", 1)?;
        assert_eq!(results[0].snippet.chars().count(), 300);
        assert!(results[0].snippet.starts_with("Draft\nword word"));
        Ok(())
    }

    #[test]
    fn test_index_all_uses_full_body_and_prunes() -> Result<(), SearchError> {
        let (store, engine) = memory_engine();
        let body = "tail ".repeat(100);
        let note = store.create(&NoteDraft::new("Long note", body))?;

        // Orphan vector for a note that never existed
        engine.index_note(9_999, "orphan")?;

        let stats = engine.index_all()?;
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.pruned, 1);

        let expected = engine.embedder().embed_single(&note.full_text())?;
        assert_eq!(engine.index().get(note.id)?, Some(expected));
        assert_eq!(engine.index().get(9_999)?, None);
        Ok(())
    }

    #[test]
    fn test_index_all_keeps_notes_created_during_rebuild() -> Result<(), SearchError> {
        let store = NoteStore::new(Database::open_in_memory()?)?;
        store.create(&NoteDraft::new("existing", "listed before the rebuild"))?;
        let index = Arc::new(MemoryVectorIndex::new(EMBEDDING_DIM));
        let source = Arc::new(LateArrival {
            store: store.clone(),
            index: index.clone(),
            arrived: Mutex::new(None),
        });
        let engine = SearchEngine::new(
            Arc::new(PositionalEmbedder::new()),
            index,
            source.clone(),
            SearchOptions::default(),
        );

        let stats = engine.index_all()?;
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.pruned, 0);

        let late = (*source.arrived.lock().unwrap()).expect("late note created");
        assert!(store.get(late)?.is_some());
        assert!(engine.index().get(late)?.is_some());
        Ok(())
    }

    #[test]
    fn test_index_all_skips_vanished() -> Result<(), SearchError> {
        let engine = SearchEngine::new(
            Arc::new(PositionalEmbedder::new()),
            Arc::new(MemoryVectorIndex::new(EMBEDDING_DIM)),
            Arc::new(VanishingNotes),
            SearchOptions::default(),
        );

        let stats = engine.index_all()?;
        assert_eq!(stats.indexed, 0);
        assert_eq!(stats.skipped, 1);
        assert!(engine.index().is_empty()?);
        Ok(())
    }

    #[test]
    fn test_empty_index_returns_nothing() -> Result<(), SearchError> {
        let (_store, engine) = sqlite_engine();
        assert!(engine.search("anything", 10)?.is_empty());
        Ok(())
    }
}
