//! Model command - fetch the embedding model artifact

use std::time::Duration;

use anyhow::{bail, Result};
use colored::Colorize;
use noteseek::search::artifact::ensure_model_artifact;
use noteseek::{Config, DataPaths};

pub fn run(paths: &DataPaths, config: &Config, url: Option<String>) -> Result<()> {
    let Some(url) = url.or_else(|| config.model.url.clone()) else {
        bail!(
            "No model URL configured. Set model.url in {} or pass --url",
            paths.config.display()
        );
    };

    let timeout = Duration::from_secs(config.model.download_timeout_secs);
    let path = ensure_model_artifact(&url, &paths.models, &config.model.file_name, timeout)?;

    println!(
        "{} Model ready at {}",
        "✓".green().bold(),
        path.display().to_string().cyan()
    );
    Ok(())
}
