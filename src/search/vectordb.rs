//! Vector index contract and its SQLite backend
//!
//! Stores embeddings as BLOBs next to the notes they belong to and computes
//! similarity in Rust. This is O(n) per query, fine for a personal notebook.


use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::embedding::{cosine_with_norms, l2_norm, Embedding};
use super::error::SearchError;
use crate::core::db::Database;
use crate::core::note::NoteId;

/// One similarity hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredNote {
    pub id: NoteId,
    pub score: f32,
}

/// Keyed store of one vector per note, with ranked cosine search.
pub trait VectorIndex: Send + Sync {
    /// Short backend name for logs and status output
    fn backend(&self) -> &'static str;

    /// Insert or fully replace the vector for `id`.
    fn upsert(&self, id: NoteId, vector: &[f32]) -> Result<(), SearchError>;

    /// Stored vector, `None` if there is none.
    fn get(&self, id: NoteId) -> Result<Option<Embedding>, SearchError>;

    /// Remove the entry; absent ids are not an error.
    fn delete(&self, id: NoteId) -> Result<(), SearchError>;

    /// At most `limit` hits, highest score first, ties by ascending id.
    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredNote>, SearchError>;

    /// Every indexed note id
    fn ids(&self) -> Result<Vec<NoteId>, SearchError>;

    fn len(&self) -> Result<usize, SearchError>;

    fn is_empty(&self) -> Result<bool, SearchError> {
        Ok(self.len()? == 0)
    }
}

/// Descending score, then ascending id, truncated to `limit`.
///
/// NaN scores (from corrupt vectors) rank below every real score.
pub fn rank(mut hits: Vec<ScoredNote>, limit: usize) -> Vec<ScoredNote> {
    hits.sort_by(|a, b| {
        sort_key(b.score)
            .total_cmp(&sort_key(a.score))
            .then(a.id.cmp(&b.id))
    });
    hits.truncate(limit);
    hits
}

fn sort_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

pub(crate) fn check_dimension(expected: usize, vector: &[f32]) -> Result<(), SearchError> {
    if vector.len() != expected {
        return Err(SearchError::DimensionMismatch {
            expected,
            got: vector.len(),
        });
    }
    Ok(())
}

/// Durable backend: one row per note in `note_embeddings`.
///
/// The row references `notes(id)` with `ON DELETE CASCADE`, so deleting the
/// note row removes its vector in the same statement.
pub struct SqliteVectorIndex {
    db: Database,
    dimension: usize,
}

impl SqliteVectorIndex {
    pub fn new(db: Database, dimension: usize) -> Result<Self, SearchError> {
        db.lock()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS note_embeddings (
                note_id INTEGER PRIMARY KEY,
                embedding BLOB NOT NULL,   -- little-endian f32 components
                indexed_at INTEGER NOT NULL,
                FOREIGN KEY (note_id) REFERENCES notes(id) ON DELETE CASCADE
            );
            "#,
        )?;
        Ok(Self { db, dimension })
    }

    fn decode(&self, id: NoteId, blob: &[u8]) -> Result<Embedding, SearchError> {
        if blob.len() != self.dimension * 4 {
            return Err(SearchError::CorruptVector {
                id,
                bytes: blob.len(),
            });
        }
        Ok(blob_to_embedding(blob))
    }
}

impl VectorIndex for SqliteVectorIndex {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn upsert(&self, id: NoteId, vector: &[f32]) -> Result<(), SearchError> {
        check_dimension(self.dimension, vector)?;
        let blob = embedding_to_blob(vector);
        let now = chrono::Utc::now().timestamp();

        self.db.lock()?.execute(
            r#"
            INSERT INTO note_embeddings (note_id, embedding, indexed_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(note_id) DO UPDATE SET
                embedding = excluded.embedding,
                indexed_at = excluded.indexed_at
            "#,
            params![id, blob, now],
        )?;
        Ok(())
    }

    fn get(&self, id: NoteId) -> Result<Option<Embedding>, SearchError> {
        let blob: Option<Vec<u8>> = self
            .db
            .lock()?
            .query_row(
                "SELECT embedding FROM note_embeddings WHERE note_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        blob.map(|b| self.decode(id, &b)).transpose()
    }

    fn delete(&self, id: NoteId) -> Result<(), SearchError> {
        self.db
            .lock()?
            .execute("DELETE FROM note_embeddings WHERE note_id = ?1", params![id])?;
        Ok(())
    }

    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredNote>, SearchError> {
        check_dimension(self.dimension, query)?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query_norm = l2_norm(query);

        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT note_id, embedding FROM note_embeddings")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, NoteId>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, blob) = row?;
            let embedding = self.decode(id, &blob)?;
            let score = cosine_with_norms(query, query_norm, &embedding, l2_norm(&embedding));
            hits.push(ScoredNote { id, score });
        }

        debug!(candidates = hits.len(), limit, "sqlite index scanned");
        Ok(rank(hits, limit))
    }

    fn ids(&self) -> Result<Vec<NoteId>, SearchError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT note_id FROM note_embeddings ORDER BY note_id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn len(&self) -> Result<usize, SearchError> {
        let count: i64 = self
            .db
            .lock()?
            .query_row("SELECT COUNT(*) FROM note_embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Convert f32 embedding to BLOB
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

/// Convert BLOB to f32 embedding
fn blob_to_embedding(blob: &[u8]) -> Embedding {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
