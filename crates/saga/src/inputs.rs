//! Reading operator files: blueprints, requirement lists, instruction lists.

use saga_core::Blueprint;
use saga_error::{SagaResult, StorageError, StorageErrorKind};
use std::path::Path;
use tracing::{debug, instrument};

/// Read a text file verbatim.
///
/// # Errors
///
/// Returns `FileRead` if the file cannot be read.
pub async fn read_text(path: &Path) -> SagaResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!("{}: {e}", path.display()))).into()
    })
}

/// Load a blueprint; its identifier is the file stem.
///
/// # Errors
///
/// Returns `FileRead` if the file cannot be read and `InvalidPath` if it has no
/// usable stem.
#[instrument(fields(path = %path.display()))]
pub async fn load_blueprint(path: &Path) -> SagaResult<Blueprint> {
    let id = file_stem(path)?;
    let text = read_text(path).await?;
    debug!(id = %id, chars = text.chars().count(), "Loaded blueprint");
    Ok(Blueprint::new(id, text))
}

/// Load a list with one entry per line.
///
/// Blank lines and lines starting with `#` are skipped; entries are trimmed.
///
/// # Errors
///
/// Returns `FileRead` if the file cannot be read.
#[instrument(fields(path = %path.display()))]
pub async fn load_lines(path: &Path) -> SagaResult<Vec<String>> {
    let text = read_text(path).await?;
    let entries: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    debug!(entries = entries.len(), "Loaded list");
    Ok(entries)
}

/// File stem of `path` as an owned string.
///
/// # Errors
///
/// Returns `InvalidPath` if the path has no UTF-8 stem.
pub fn file_stem(path: &Path) -> SagaResult<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            StorageError::new(StorageErrorKind::InvalidPath(path.display().to_string())).into()
        })
}
