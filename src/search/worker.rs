//! Background execution of search and indexing calls
//!
//! The interactive loop submits a [`SearchCommand`] and keeps running. The
//! engine call happens on Tokio's blocking pool and its outcome comes back as
//! a [`SearchMessage`] carrying the same request id, to be picked up with
//! [`SearchWorker::try_next`] on the loop's next turn.
//!
//! Requests are neither serialized nor cancelled here. A caller that has moved
//! on simply ignores messages for request ids it no longer cares about.

use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use super::engine::{IndexingStats, SearchEngine, SearchResult};
use super::error::SearchError;
use crate::core::note::NoteId;

pub type RequestId = u64;

#[derive(Debug, Clone)]
pub enum SearchCommand {
    Search {
        query: String,
        limit: usize,
        /// Empty means no tag filter
        tags: Vec<String>,
    },
    IndexNote {
        id: NoteId,
        text: String,
    },
    RemoveNote {
        id: NoteId,
    },
    IndexAll,
}

#[derive(Debug)]
pub enum SearchOutcome {
    Results(Vec<SearchResult>),
    Indexed(IndexingStats),
    Done,
}

#[derive(Debug)]
pub struct SearchMessage {
    pub request: RequestId,
    pub outcome: Result<SearchOutcome, SearchError>,
}

pub struct SearchWorker {
    runtime: Runtime,
    engine: Arc<SearchEngine>,
    tx: UnboundedSender<SearchMessage>,
    rx: UnboundedReceiver<SearchMessage>,
    next_request: RequestId,
}

impl SearchWorker {
    pub fn new(engine: Arc<SearchEngine>) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("noteseek-search")
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            runtime,
            engine,
            tx,
            rx,
            next_request: 1,
        })
    }

    /// Queue `command` and return immediately.
    pub fn submit(&mut self, command: SearchCommand) -> RequestId {
        let request = self.next_request;
        self.next_request += 1;

        let engine = Arc::clone(&self.engine);
        let tx = self.tx.clone();
        debug!(request, ?command, "search command submitted");

        self.runtime.spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || execute(&engine, command))
                .await
                .unwrap_or_else(|e| Err(SearchError::Worker(e.to_string())));

            if tx.send(SearchMessage { request, outcome }).is_err() {
                warn!(request, "search result dropped: receiver closed");
            }
        });

        request
    }

    /// Next finished message, without waiting.
    pub fn try_next(&mut self) -> Option<SearchMessage> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next finished message.
    pub fn next_blocking(&mut self) -> Option<SearchMessage> {
        self.rx.blocking_recv()
    }
}

fn execute(engine: &SearchEngine, command: SearchCommand) -> Result<SearchOutcome, SearchError> {
    match command {
        SearchCommand::Search { query, limit, tags } => engine
            .search_with_tag_filter(&query, limit, &tags)
            .map(SearchOutcome::Results),
        SearchCommand::IndexNote { id, text } => {
            engine.index_note(id, &text).map(|_| SearchOutcome::Done)
        }
        SearchCommand::RemoveNote { id } => engine.remove_note(id).map(|_| SearchOutcome::Done),
        SearchCommand::IndexAll => engine.index_all().map(SearchOutcome::Indexed),
    }
}
