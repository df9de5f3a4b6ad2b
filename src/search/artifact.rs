//! Model artifact download
//!
//! Fetches an external model file into the models directory once. Writes go
//! through a temporary file in the same directory that is renamed into place,
//! so the final path only ever holds a complete file.
//!
//! Uses the blocking reqwest client: call from a plain thread, not from inside
//! a Tokio runtime.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Ensure `dir/file_name` exists, downloading it from `url` if needed.
///
/// Returns the final path. No request is made when the file is already there.
pub fn ensure_model_artifact(
    url: &str,
    dir: &Path,
    file_name: &str,
    timeout: Duration,
) -> Result<PathBuf> {
    let target = dir.join(file_name);
    if target.exists() {
        debug!(path = %target.display(), "model artifact already present");
        return Ok(target);
    }

    info!(url, path = %target.display(), "downloading model artifact");
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to fetch {}", url))?
        .error_for_status()?;

    let bytes = write_atomically(dir, &target, response)?;
    info!(bytes, path = %target.display(), "model artifact saved");
    Ok(target)
}

/// Stream `reader` into `target` via a temporary sibling file and a rename.
///
/// On any error the temporary file is removed and `target` is left untouched.
pub fn write_atomically<R: Read>(dir: &Path, target: &Path, mut reader: R) -> Result<u64> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    let bytes = std::io::copy(&mut reader, &mut tmp).context("Download interrupted")?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move artifact into {}", target.display()))?;

    Ok(bytes)
}
