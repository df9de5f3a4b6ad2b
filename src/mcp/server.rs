//! Notes MCP server implementation

use std::sync::Arc;

use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use noteseek::{NoteId, Notebook};

const MAX_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 1000;

/// Parameters for notes_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Natural language search query")]
    pub query: String,
    #[schemars(description = "Maximum number of results (default: 5)")]
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Every listed tag must be present on a result
    #[schemars(description = "Only return notes carrying all of these tags")]
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_limit() -> usize {
    5
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetNoteParams {
    #[schemars(description = "Id of the note to retrieve")]
    pub id: NoteId,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListNotesParams {
    #[schemars(description = "Only return notes carrying this tag")]
    #[serde(default)]
    pub tag: Option<String>,
    #[schemars(description = "Maximum results (default: 50)")]
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

fn default_list_limit() -> usize {
    50
}

#[derive(Clone)]
pub struct NotesService {
    notebook: Arc<Notebook>,
    tool_router: ToolRouter<Self>,
}

impl NotesService {
    pub fn new(notebook: Arc<Notebook>) -> Self {
        Self {
            notebook,
            tool_router: Self::tool_router(),
        }
    }

    /// Run a notebook call on the blocking pool.
    async fn blocking<T, F>(&self, label: &'static str, f: F) -> Result<T, McpError>
    where
        T: Send + 'static,
        F: FnOnce(&Notebook) -> Result<T> + Send + 'static,
    {
        let notebook = Arc::clone(&self.notebook);
        tokio::task::spawn_blocking(move || f(&notebook))
            .await
            .map_err(|e| McpError::internal_error(format!("{} task failed: {}", label, e), None))?
            .map_err(|e| McpError::internal_error(format!("{} failed: {}", label, e), None))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let output = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("JSON serialization failed: {}", e), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(output)]))
}

#[tool_router]
impl NotesService {
    #[tool(description = "Search notes by meaning. Returns the notes most similar to the query, best match first, optionally restricted to notes carrying all given tags.")]
    async fn notes_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let SearchParams { query, limit, tags } = params.0;
        let limit = limit.min(MAX_LIMIT);

        let results = self
            .blocking("Search", move |nb| {
                Ok(nb.engine().search_with_tag_filter(&query, limit, &tags)?)
            })
            .await?;

        to_json(&results)
    }

    #[tool(description = "Get the full content and metadata of a note by id.")]
    async fn notes_get(
        &self,
        params: Parameters<GetNoteParams>,
    ) -> Result<CallToolResult, McpError> {
        let id = params.0.id;
        let note = self
            .blocking("Get note", move |nb| Ok(nb.get_note(id)?))
            .await?;

        match note {
            Some(note) => to_json(&note),
            None => Err(McpError::invalid_params(
                format!("Note #{} not found", id),
                None,
            )),
        }
    }

    #[tool(description = "List notes, most recently updated first, with a short preview of each body.")]
    async fn notes_list(
        &self,
        params: Parameters<ListNotesParams>,
    ) -> Result<CallToolResult, McpError> {
        let ListNotesParams { tag, limit } = params.0;
        let mut notes = self
            .blocking("List notes", |nb| Ok(nb.list_notes()?))
            .await?;

        if let Some(tag) = tag {
            notes.retain(|n| n.tags.iter().any(|t| t == &tag));
        }
        notes.truncate(limit.min(MAX_LIST_LIMIT));

        to_json(&notes)
    }

    #[tool(description = "Re-embed every note and drop vectors whose note no longer exists.")]
    async fn notes_reindex(&self) -> Result<CallToolResult, McpError> {
        let stats = self
            .blocking("Reindex", |nb| Ok(nb.rebuild_index()?))
            .await?;

        to_json(&stats)
    }
}

#[tool_handler]
impl ServerHandler for NotesService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "noteseek MCP server. Semantic search and read access over a personal notes store."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Run the MCP server on stdio
pub async fn run_mcp_server(notebook: Arc<Notebook>) -> Result<()> {
    use tokio::io::{stdin, stdout};

    info!("starting MCP server on stdio");
    let service = NotesService::new(notebook);
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
