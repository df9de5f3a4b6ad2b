//! Runtime configuration loaded from `config.yaml` in the data directory.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: usize = 10;
const DEFAULT_SNIPPET_CHARS: usize = 300;
const DEFAULT_OVER_FETCH: usize = 5;
const DEFAULT_MODEL_FILE: &str = "model.onnx";
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const DEFAULT_LOG_FILTER: &str = "warn";

/// Which `VectorIndex` implementation backs the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Side table in the notes database, survives restarts.
    Sqlite,
    /// Volatile map, rebuilt from the note store on every start.
    Memory,
}

impl std::fmt::Display for IndexBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_backend")]
    pub backend: IndexBackend,

    /// Result count when the caller does not pass one
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Maximum characters in a result snippet
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,

    /// Extra candidates fetched to make up for notes deleted since indexing
    #[serde(default = "default_over_fetch")]
    pub over_fetch: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            default_limit: DEFAULT_LIMIT,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
            over_fetch: DEFAULT_OVER_FETCH,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Where `noteseek model` downloads the artifact from
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_model_file")]
    pub file_name: String,

    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: None,
            file_name: default_model_file(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub model: ModelConfig,

    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            model: ModelConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_backend() -> IndexBackend {
    IndexBackend::Sqlite
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_snippet_chars() -> usize {
    DEFAULT_SNIPPET_CHARS
}

fn default_over_fetch() -> usize {
    DEFAULT_OVER_FETCH
}

fn default_model_file() -> String {
    DEFAULT_MODEL_FILE.to_string()
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Config {
    /// Load the config file, writing the defaults first if it does not exist.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_yaml::to_string(&config)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Malformed config at {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(raw)?;
        config.validate();
        Ok(config)
    }

    fn validate(&mut self) {
        if self.search.default_limit == 0 {
            self.search.default_limit = DEFAULT_LIMIT;
        }
        if self.search.snippet_chars == 0 {
            self.search.snippet_chars = DEFAULT_SNIPPET_CHARS;
        }
        if self.model.download_timeout_secs == 0 {
            self.model.download_timeout_secs = DEFAULT_DOWNLOAD_TIMEOUT_SECS;
        }
    }
}
