//! Interactive search prompt
//!
//! Each line typed is submitted to the background worker; results are
//! printed when they arrive. Only the latest query's results are shown, and a
//! new query is refused while one is still running.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use noteseek::search::worker::{RequestId, SearchCommand, SearchOutcome, SearchWorker};
use noteseek::Notebook;
use tracing::debug;

use super::search::print_results;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

struct Pending {
    request: RequestId,
    query: String,
}

pub fn run(notebook: &Notebook, limit: usize, tags: Vec<String>) -> Result<()> {
    let mut worker = SearchWorker::new(Arc::clone(notebook.engine()))?;
    let lines = spawn_stdin_reader();

    println!(
        "{} Type a query and press enter. {} to exit.",
        "→".dimmed(),
        ":q".cyan()
    );
    if !tags.is_empty() {
        println!("{} Tag filter: {}", "→".dimmed(), tags.join(", "));
    }
    prompt();

    let mut pending: Option<Pending> = None;

    loop {
        match lines.try_recv() {
            Ok(line) => {
                let query = line.trim().to_string();
                if query == ":q" || query == ":quit" {
                    break;
                }
                if query.is_empty() {
                    prompt();
                } else if let Some(p) = &pending {
                    println!(
                        "{} Still searching for \"{}\"...",
                        "!".yellow(),
                        p.query
                    );
                } else {
                    let request = worker.submit(SearchCommand::Search {
                        query: query.clone(),
                        limit,
                        tags: tags.clone(),
                    });
                    pending = Some(Pending { request, query });
                }
            }
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        while let Some(message) = worker.try_next() {
            let Some(p) = pending.as_ref().filter(|p| p.request == message.request) else {
                debug!(request = message.request, "discarding stale search result");
                continue;
            };

            match message.outcome {
                Ok(SearchOutcome::Results(results)) => print_results(&p.query, &results),
                Ok(_) => {}
                Err(e) => eprintln!("{} {}", "✗".red(), e),
            }
            pending = None;
            prompt();
        }

        thread::sleep(POLL_INTERVAL);
    }

    Ok(())
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn prompt() {
    print!("{} ", "search>".bold());
    let _ = io::stdout().flush();
}
