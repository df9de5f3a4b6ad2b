//! In-memory vector index
//!
//! Volatile backend: lost on restart and rebuilt from the note store. Both
//! maps sit behind one `RwLock`, so searches share the read lock and every
//! upsert/delete holds the write lock for its whole duration.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::embedding::{cosine_with_norms, l2_norm, Embedding};
use super::error::SearchError;
use super::vectordb::{check_dimension, rank, ScoredNote, VectorIndex};
use crate::core::note::NoteId;

#[derive(Default)]
struct Entries {
    vectors: HashMap<NoteId, Embedding>,
    /// Precomputed L2 norm per vector
    norms: HashMap<NoteId, f32>,
}

pub struct MemoryVectorIndex {
    entries: RwLock<Entries>,
    dimension: usize,
}

impl MemoryVectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            dimension,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Entries>, SearchError> {
        self.entries.read().map_err(|_| SearchError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Entries>, SearchError> {
        self.entries.write().map_err(|_| SearchError::LockPoisoned)
    }
}

impl VectorIndex for MemoryVectorIndex {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn upsert(&self, id: NoteId, vector: &[f32]) -> Result<(), SearchError> {
        check_dimension(self.dimension, vector)?;
        let norm = l2_norm(vector);

        let mut entries = self.write()?;
        entries.vectors.insert(id, vector.to_vec());
        entries.norms.insert(id, norm);
        Ok(())
    }

    fn get(&self, id: NoteId) -> Result<Option<Embedding>, SearchError> {
        Ok(self.read()?.vectors.get(&id).cloned())
    }

    fn delete(&self, id: NoteId) -> Result<(), SearchError> {
        let mut entries = self.write()?;
        entries.vectors.remove(&id);
        entries.norms.remove(&id);
        Ok(())
    }

    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredNote>, SearchError> {
        check_dimension(self.dimension, query)?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query_norm = l2_norm(query);

        let entries = self.read()?;
        let hits = entries
            .vectors
            .iter()
            .map(|(id, vector)| {
                let norm = entries.norms.get(id).copied().unwrap_or_else(|| l2_norm(vector));
                ScoredNote {
                    id: *id,
                    score: cosine_with_norms(query, query_norm, vector, norm),
                }
            })
            .collect();

        Ok(rank(hits, limit))
    }

    fn ids(&self) -> Result<Vec<NoteId>, SearchError> {
        let mut ids: Vec<NoteId> = self.read()?.vectors.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn len(&self) -> Result<usize, SearchError> {
        Ok(self.read()?.vectors.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_last_write_wins() -> Result<(), SearchError> {
        let index = MemoryVectorIndex::new(3);
        index.upsert(1, &[1.0, 0.0, 0.0])?;
        index.upsert(1, &[0.0, 0.0, 2.0])?;

        assert_eq!(index.get(1)?, Some(vec![0.0, 0.0, 2.0]));
        assert_eq!(index.len()?, 1);

        // Stale norm must not survive the replace
        let hits = index.search(&[0.0, 0.0, 1.0], 1)?;
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_delete() -> Result<(), SearchError> {
        let index = MemoryVectorIndex::new(3);
        index.upsert(1, &[1.0, 0.0, 0.0])?;
        index.delete(1)?;
        index.delete(1)?;
        index.delete(99)?;

        assert_eq!(index.get(1)?, None);
        assert!(index.is_empty()?);
        assert!(index.search(&[1.0, 0.0, 0.0], 5)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_search_bounds_and_ties() -> Result<(), SearchError> {
        let index = MemoryVectorIndex::new(2);
        index.upsert(30, &[1.0, 0.0])?;
        index.upsert(10, &[2.0, 0.0])?;
        index.upsert(20, &[0.0, 1.0])?;
        index.upsert(40, &[1.0, 1.0])?;

        let hits = index.search(&[1.0, 0.0], 3)?;
        let ids: Vec<NoteId> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![10, 30, 40]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));

        // Same query, same order
        let again: Vec<NoteId> = index.search(&[1.0, 0.0], 3)?.iter().map(|h| h.id).collect();
        assert_eq!(ids, again);

        assert!(index.search(&[1.0, 0.0], 0)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_zero_vector_scores_zero() -> Result<(), SearchError> {
        let index = MemoryVectorIndex::new(2);
        index.upsert(1, &[0.0, 0.0])?;
        let hits = index.search(&[1.0, 0.0], 1)?;
        assert_eq!(hits[0].score, 0.0);
        Ok(())
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = MemoryVectorIndex::new(3);
        assert!(matches!(
            index.upsert(1, &[1.0]),
            Err(SearchError::DimensionMismatch { expected: 3, got: 1 })
        ));
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let index = Arc::new(MemoryVectorIndex::new(2));
        index.upsert(0, &[1.0, 0.0]).unwrap();

        let writers: Vec<_> = (1..5)
            .map(|t| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    for i in 0..100 {
                        let id = t * 1000 + i;
                        index.upsert(id, &[1.0, i as f32]).unwrap();
                        if i % 2 == 0 {
                            index.delete(id).unwrap();
                        }
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let hits = index.search(&[1.0, 0.0], 5).unwrap();
                        assert!(hits.len() <= 5);
                        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        // 4 writers x 50 surviving odd ids, plus the seed entry
        assert_eq!(index.len().unwrap(), 201);
    }
}
