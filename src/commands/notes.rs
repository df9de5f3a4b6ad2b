//! Note commands - add, edit, delete, show and list

use anyhow::{bail, Result};
use colored::*;
use noteseek::core::hashtag::merge_tags;
use noteseek::{Note, NoteDraft, NoteId, Notebook};

pub fn add(notebook: &Notebook, title: &str, body: &str, tags: &[String], json: bool) -> Result<()> {
    let draft = NoteDraft::new(title, body).with_tags(merge_tags(tags, body));
    let note = notebook.create_note(&draft)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("{} Created note #{}", "✓".green().bold(), note.id.to_string().cyan());
    }
    Ok(())
}

/// Edit a note; fields left as `None` keep their current value.
pub fn edit(
    notebook: &Notebook,
    id: NoteId,
    title: Option<String>,
    body: Option<String>,
    tags: Option<Vec<String>>,
    json: bool,
) -> Result<()> {
    let Some(current) = notebook.get_note(id)? else {
        bail!("Note #{} not found", id);
    };

    let body = body.unwrap_or(current.body);
    let tags = match tags {
        Some(explicit) => merge_tags(&explicit, &body),
        None => current.tags,
    };
    let draft = NoteDraft {
        title: title.unwrap_or(current.title),
        body,
        tags,
    };
    let note = notebook.update_note(id, &draft)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("{} Updated note #{}", "✓".green().bold(), note.id.to_string().cyan());
    }
    Ok(())
}

pub fn delete(notebook: &Notebook, id: NoteId) -> Result<()> {
    if notebook.delete_note(id)? {
        println!("{} Deleted note #{}", "✓".green().bold(), id.to_string().cyan());
    } else {
        println!("{}", format!("Note #{} not found.", id).yellow());
    }
    Ok(())
}

pub fn show(notebook: &Notebook, id: NoteId, json: bool) -> Result<()> {
    let Some(note) = notebook.get_note(id)? else {
        bail!("Note #{} not found", id);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        print_note(&note);
    }
    Ok(())
}

pub fn list(notebook: &Notebook, json: bool) -> Result<()> {
    let notes = notebook.list_notes()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("{}", "No notes yet.".yellow());
        return Ok(());
    }

    for note in &notes {
        println!("{} {}", format!("#{}", note.id).bold(), note.title.cyan());
        if !note.preview.is_empty() {
            println!("   {}", note.preview.replace('\n', " ").dimmed());
        }
        if !note.tags.is_empty() {
            println!("   tags: {}", note.tags.join(", "));
        }
    }
    Ok(())
}

fn print_note(note: &Note) {
    println!("{} {}", format!("#{}", note.id).bold(), note.title.cyan().bold());
    println!("{}", "=".repeat(60));
    if !note.tags.is_empty() {
        println!("Tags: {}", note.tags.join(", "));
    }
    println!(
        "Updated: {}",
        note.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();
    println!("{}", note.body);
}
