//! Note CRUD on top of the shared SQLite database

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::db::{Database, LockPoisoned};
use super::note::{truncate_chars, Note, NoteDraft, NoteId, NotePreview, NoteSource, PREVIEW_CHARS};
use super::schema::{validate, NoteViolation};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Malformed tag column: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Note {0} not found")]
    NotFound(NoteId),

    #[error("Invalid note: {}", format_violations(.0))]
    Invalid(Vec<NoteViolation>),

    #[error(transparent)]
    LockPoisoned(#[from] LockPoisoned),
}

fn format_violations(violations: &[NoteViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Note storage; owner of note identities and content.
#[derive(Clone)]
pub struct NoteStore {
    db: Database,
}

impl NoteStore {
    pub fn new(db: Database) -> Result<Self, StoreError> {
        db.lock()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                body TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '[]',  -- JSON array
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_updated ON notes(updated_at);
            "#,
        )?;
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn create(&self, draft: &NoteDraft) -> Result<Note, StoreError> {
        check(draft)?;
        let tags_json = serde_json::to_string(&draft.tags)?;
        let now = Utc::now().timestamp();

        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO notes (title, body, tags, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![draft.title, draft.body, tags_json, now],
        )?;
        let id = conn.last_insert_rowid();

        fetch(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    /// Replace title, body and tags of an existing note.
    pub fn update(&self, id: NoteId, draft: &NoteDraft) -> Result<Note, StoreError> {
        check(draft)?;
        let tags_json = serde_json::to_string(&draft.tags)?;
        let now = Utc::now().timestamp();

        let conn = self.db.lock()?;
        let changed = conn.execute(
            "UPDATE notes SET title = ?2, body = ?3, tags = ?4, updated_at = ?5 WHERE id = ?1",
            params![id, draft.title, draft.body, tags_json, now],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        fetch(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    /// Returns false if the note did not exist.
    pub fn delete(&self, id: NoteId) -> Result<bool, StoreError> {
        let changed = self
            .db
            .lock()?
            .execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn get(&self, id: NoteId) -> Result<Option<Note>, StoreError> {
        let conn = self.db.lock()?;
        fetch(&conn, id)
    }

    /// All notes, most recently updated first, with truncated bodies.
    pub fn list(&self) -> Result<Vec<NotePreview>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, body, tags, created_at, updated_at FROM notes ORDER BY updated_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], read_row)?;

        let mut previews = Vec::new();
        for row in rows {
            let note = decode(row?)?;
            previews.push(NotePreview {
                id: note.id,
                title: note.title,
                preview: truncate_chars(&note.body, PREVIEW_CHARS),
                tags: note.tags,
                updated_at: note.updated_at,
            });
        }
        Ok(previews)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .db
            .lock()?
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl NoteSource for NoteStore {
    fn get_note(&self, id: NoteId) -> Result<Option<Note>, StoreError> {
        self.get(id)
    }

    fn list_notes(&self) -> Result<Vec<NotePreview>, StoreError> {
        self.list()
    }
}

fn check(draft: &NoteDraft) -> Result<(), StoreError> {
    let violations = validate(draft);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Invalid(violations))
    }
}

type RawNote = (NoteId, String, String, String, i64, i64);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawNote> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode((id, title, body, tags_json, created, updated): RawNote) -> Result<Note, StoreError> {
    Ok(Note {
        id,
        title,
        body,
        tags: serde_json::from_str(&tags_json)?,
        created_at: timestamp(created),
        updated_at: timestamp(updated),
    })
}

fn fetch(conn: &Connection, id: NoteId) -> Result<Option<Note>, StoreError> {
    let raw = conn
        .query_row(
            "SELECT id, title, body, tags, created_at, updated_at FROM notes WHERE id = ?1",
            params![id],
            read_row,
        )
        .optional()?;
    raw.map(decode).transpose()
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}
