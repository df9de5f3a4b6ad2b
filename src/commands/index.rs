//! Index command - rebuild or inspect the semantic search index

use anyhow::Result;
use colored::Colorize;
use noteseek::Notebook;

/// Run index command
pub fn run(notebook: &Notebook, status_only: bool, rebuild: bool, json: bool) -> Result<()> {
    if status_only || !rebuild {
        return show_status(notebook, json);
    }

    if !json {
        println!("{} Rebuilding search index...", "→".dimmed());
    }

    let stats = notebook.rebuild_index()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!();
        println!(
            "{} Indexed {} notes in {:.2}s",
            "✓".green().bold(),
            stats.indexed.to_string().cyan(),
            stats.duration_ms as f64 / 1000.0
        );
        if stats.skipped > 0 {
            println!(
                "  {} {} notes vanished during the rebuild",
                "→".dimmed(),
                stats.skipped
            );
        }
        if stats.pruned > 0 {
            println!(
                "  {} {} stale vectors removed",
                "→".dimmed(),
                stats.pruned
            );
        }
    }

    Ok(())
}

/// Show index status
fn show_status(notebook: &Notebook, json: bool) -> Result<()> {
    let status = notebook.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Index Status".bold());
    println!();
    println!(
        "  {} {} notes",
        "→".dimmed(),
        status.note_count.to_string().cyan()
    );
    println!(
        "  {} {} vectors ({} backend, {} embedder)",
        "→".dimmed(),
        status.indexed_count.to_string().cyan(),
        status.backend,
        status.embedder
    );
    match status.last_full_index {
        Some(ts) => println!(
            "  {} Last full index: {}",
            "→".dimmed(),
            ts.format("%Y-%m-%d %H:%M:%S")
        ),
        None => println!(
            "  {} Never fully indexed. Run {}",
            "!".yellow(),
            "noteseek index --rebuild".cyan()
        ),
    }
    if status.indexed_count != status.note_count {
        println!(
            "  {} Index and notes differ; a rebuild will repair it",
            "!".yellow()
        );
    }

    Ok(())
}
