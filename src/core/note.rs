use chrono::{DateTime, Utc};
use serde::Serialize;

use super::store::StoreError;

/// Note identity, assigned by the note store.
pub type NoteId = i64;

/// Body length kept in list previews.
pub const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Title and body joined by a newline; what gets embedded and snippeted.
    pub fn full_text(&self) -> String {
        match (self.title.is_empty(), self.body.is_empty()) {
            (_, true) => self.title.clone(),
            (true, false) => self.body.clone(),
            (false, false) => format!("{}\n{}", self.title, self.body),
        }
    }
}

/// List entry with a truncated body.
#[derive(Debug, Clone, Serialize)]
pub struct NotePreview {
    pub id: NoteId,
    pub title: String,
    pub preview: String,
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the user when creating or editing a note.
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Read side of the note store, as seen by the search engine.
pub trait NoteSource: Send + Sync {
    /// Full note, or `None` if it does not exist.
    fn get_note(&self, id: NoteId) -> Result<Option<Note>, StoreError>;

    /// Every note, with length-bounded bodies. Never index these bodies.
    fn list_notes(&self) -> Result<Vec<NotePreview>, StoreError>;
}

/// Char-aware truncation (no ellipsis).
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str, body: &str) -> Note {
        let now = Utc::now();
        Note {
            id: 1,
            title: title.to_string(),
            body: body.to_string(),
            tags: vec!["Work".to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_full_text() {
        assert_eq!(note("Groceries", "milk").full_text(), "Groceries\nmilk");
        assert_eq!(note("Groceries", "").full_text(), "Groceries");
        assert_eq!(note("", "milk").full_text(), "milk");
    }

    #[test]
    fn test_truncate_chars_unicode() {
        assert_eq!(truncate_chars("한국어 테스트", 3), "한국어");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
