mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use anyhow::Context;
use clap::{Parser, Subcommand};
use noteseek::{Config, DataPaths, Notebook};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "noteseek")]
#[command(about = "Personal notes with semantic search", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // ===== Notes =====
    /// Create a note
    Add {
        title: String,
        #[arg(long, short, default_value = "", help = "Note body")]
        body: String,
        #[arg(long = "tag", short, help = "Tag (repeatable); #hashtags in the body are added too")]
        tags: Vec<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Edit an existing note
    Edit {
        id: i64,
        #[arg(long, help = "New title")]
        title: Option<String>,
        #[arg(long, short, help = "New body")]
        body: Option<String>,
        #[arg(long = "tag", short, help = "Replace tags (repeatable)")]
        tags: Option<Vec<String>>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Delete a note
    Delete { id: i64 },
    /// Show a note
    Show {
        id: i64,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List notes, most recently updated first
    List {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Tag usage report
    Tags {
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== Semantic Search =====
    /// Semantic search over notes
    #[command(alias = "s")]
    Search {
        query: String,
        #[arg(long, short, help = "Limit results")]
        limit: Option<usize>,
        #[arg(long = "tag", short, help = "Require tag (repeatable)")]
        tags: Vec<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Inspect or rebuild the search index
    Index {
        #[arg(long, help = "Show index status only")]
        status: bool,
        #[arg(long, help = "Re-embed every note")]
        rebuild: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Interactive search prompt
    #[command(alias = "i")]
    Interactive {
        #[arg(long, short, help = "Limit results")]
        limit: Option<usize>,
        #[arg(long = "tag", short, help = "Require tag (repeatable)")]
        tags: Vec<String>,
    },
    /// Download the embedding model artifact
    Model {
        #[arg(long, help = "Override the configured model URL")]
        url: Option<String>,
    },

    // ===== MCP Server =====
    /// Start MCP server on stdio
    #[cfg(feature = "mcp")]
    Mcp,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = DataPaths::new();
    let config = Config::load_or_init(&paths.config)?;
    init_logging(&config);

    // Model download needs no notebook
    if let Commands::Model { url } = cli.command {
        return commands::model::run(&paths, &config, url);
    }

    let notebook = Notebook::open(&paths, &config)
        .with_context(|| format!("Failed to open notebook at {}", paths.root.display()))?;
    let default_limit = config.search.default_limit;

    match cli.command {
        // Notes
        Commands::Add {
            title,
            body,
            tags,
            json,
        } => commands::notes::add(&notebook, &title, &body, &tags, json),
        Commands::Edit {
            id,
            title,
            body,
            tags,
            json,
        } => commands::notes::edit(&notebook, id, title, body, tags, json),
        Commands::Delete { id } => commands::notes::delete(&notebook, id),
        Commands::Show { id, json } => commands::notes::show(&notebook, id, json),
        Commands::List { json } => commands::notes::list(&notebook, json),
        Commands::Tags { json } => commands::tags::run(&notebook, json),

        // Semantic Search
        Commands::Search {
            query,
            limit,
            tags,
            json,
        } => commands::search::run(
            &notebook,
            &query,
            limit.unwrap_or(default_limit),
            &tags,
            json,
        ),
        Commands::Index {
            status,
            rebuild,
            json,
        } => commands::index::run(&notebook, status, rebuild, json),
        Commands::Interactive { limit, tags } => {
            commands::interactive::run(&notebook, limit.unwrap_or(default_limit), tags)
        }
        Commands::Model { .. } => unreachable!("handled before the notebook is opened"),

        // MCP Server
        #[cfg(feature = "mcp")]
        Commands::Mcp => run_mcp_server(notebook),
    }
}

/// Log to stderr; RUST_LOG wins over the configured filter.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "mcp")]
fn run_mcp_server(notebook: Notebook) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::run_mcp_server(std::sync::Arc::new(notebook)))
}
