//! Tags command - notes grouped by tag

use std::collections::BTreeMap;

use anyhow::Result;
use colored::Colorize;
use noteseek::{NoteId, NotePreview, Notebook};
use serde::Serialize;

#[derive(Serialize)]
struct TagGroup {
    tag: String,
    notes: Vec<NoteRef>,
}

#[derive(Serialize)]
struct NoteRef {
    id: NoteId,
    title: String,
}

impl From<&NotePreview> for NoteRef {
    fn from(note: &NotePreview) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
        }
    }
}

#[derive(Serialize)]
struct TagIndex {
    tags: Vec<TagGroup>,
    untagged: Vec<NoteRef>,
}

pub fn run(notebook: &Notebook, json: bool) -> Result<()> {
    let index = group_by_tag(&notebook.list_notes()?);

    if json {
        println!("{}", serde_json::to_string_pretty(&index)?);
    } else {
        print_index(&index);
    }
    Ok(())
}

/// Largest groups first; ties in tag order. Notes keep list order.
fn group_by_tag(notes: &[NotePreview]) -> TagIndex {
    let mut groups: BTreeMap<&str, Vec<NoteRef>> = BTreeMap::new();
    let mut untagged = Vec::new();

    for note in notes {
        if note.tags.is_empty() {
            untagged.push(NoteRef::from(note));
        }
        for tag in &note.tags {
            groups.entry(tag.as_str()).or_default().push(NoteRef::from(note));
        }
    }

    let mut tags: Vec<TagGroup> = groups
        .into_iter()
        .map(|(tag, notes)| TagGroup {
            tag: tag.to_string(),
            notes,
        })
        .collect();
    tags.sort_by(|a, b| b.notes.len().cmp(&a.notes.len()));

    TagIndex { tags, untagged }
}

fn print_index(index: &TagIndex) {
    if index.tags.is_empty() && index.untagged.is_empty() {
        println!("{}", "No notes yet.".yellow());
        return;
    }

    for group in &index.tags {
        println!(
            "{} {}",
            format!("#{}", group.tag).cyan().bold(),
            format!("({})", group.notes.len()).dimmed()
        );
        print_refs(&group.notes);
    }

    if !index.untagged.is_empty() {
        println!(
            "{} {}",
            "untagged".yellow().bold(),
            format!("({})", index.untagged.len()).dimmed()
        );
        print_refs(&index.untagged);
    }
}

fn print_refs(notes: &[NoteRef]) {
    for note in notes {
        println!("   {} {}", format!("#{}", note.id).bold(), note.title);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn preview(id: NoteId, title: &str, tags: &[&str]) -> NotePreview {
        NotePreview {
            id,
            title: title.to_string(),
            preview: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_tag() {
        let notes = vec![
            preview(3, "standup", &["work"]),
            preview(2, "milk", &["home", "errand"]),
            preview(1, "roadmap", &["work", "plan"]),
            preview(4, "loose thought", &[]),
        ];
        let index = group_by_tag(&notes);

        let order: Vec<&str> = index.tags.iter().map(|g| g.tag.as_str()).collect();
        assert_eq!(order, vec!["work", "errand", "home", "plan"]);

        let work: Vec<NoteId> = index.tags[0].notes.iter().map(|n| n.id).collect();
        assert_eq!(work, vec![3, 1]);

        assert_eq!(index.untagged.len(), 1);
        assert_eq!(index.untagged[0].title, "loose thought");
    }
}
