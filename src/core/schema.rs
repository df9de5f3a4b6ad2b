use super::note::NoteDraft;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_TAGS: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum NoteViolation {
    EmptyTitle,
    TitleTooLong(usize),
    TooManyTags(usize),
    EmptyTag,
    WhitespaceInTag(String),
}

impl std::fmt::Display for NoteViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Title must not be empty"),
            Self::TitleTooLong(n) => {
                write!(f, "Title too long: {} chars (max {})", n, MAX_TITLE_CHARS)
            }
            Self::TooManyTags(n) => write!(f, "Too many tags: {} (max {})", n, MAX_TAGS),
            Self::EmptyTag => write!(f, "Tags must not be empty"),
            Self::WhitespaceInTag(t) => write!(f, "Tag must not contain whitespace: {:?}", t),
        }
    }
}

pub fn validate(draft: &NoteDraft) -> Vec<NoteViolation> {
    let mut violations = Vec::new();

    if draft.title.trim().is_empty() {
        violations.push(NoteViolation::EmptyTitle);
    }
    let title_len = draft.title.chars().count();
    if title_len > MAX_TITLE_CHARS {
        violations.push(NoteViolation::TitleTooLong(title_len));
    }

    if draft.tags.len() > MAX_TAGS {
        violations.push(NoteViolation::TooManyTags(draft.tags.len()));
    }
    for tag in &draft.tags {
        if tag.is_empty() {
            violations.push(NoteViolation::EmptyTag);
        } else if tag.chars().any(char::is_whitespace) {
            violations.push(NoteViolation::WhitespaceInTag(tag.clone()));
        }
    }

    violations
}
