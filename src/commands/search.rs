//! Search command - semantic note search with optional tag filter

use anyhow::Result;
use colored::Colorize;
use noteseek::{Notebook, SearchResult};

/// Run semantic search command
pub fn run(notebook: &Notebook, query: &str, limit: usize, tags: &[String], json: bool) -> Result<()> {
    let results = notebook
        .engine()
        .search_with_tag_filter(query, limit, tags)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    print_results(query, &results);
    Ok(())
}

pub fn print_results(query: &str, results: &[SearchResult]) {
    if results.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        return;
    }

    println!(
        "{} {} results for: {}",
        "→".dimmed(),
        results.len(),
        query.cyan()
    );
    println!();

    for (i, result) in results.iter().enumerate() {
        let score_str = format!("{:.2}", result.score);
        let score_colored = if result.score > 0.8 {
            score_str.green()
        } else if result.score > 0.6 {
            score_str.yellow()
        } else {
            score_str.dimmed()
        };

        println!(
            "{}. [{}] #{} {}",
            (i + 1).to_string().bold(),
            score_colored,
            result.id,
            result.title.cyan()
        );

        let body = result
            .snippet
            .strip_prefix(result.title.as_str())
            .unwrap_or(&result.snippet)
            .trim();
        if !body.is_empty() {
            println!("   {}", body.replace('\n', " ").dimmed());
        }
        if !result.tags.is_empty() {
            println!("   tags: {}", result.tags.join(", "));
        }
        println!();
    }
}
