//! Per-blueprint artifact directories with versioned file names.

use saga_core::ArtifactKind;
use saga_error::{SagaResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// File name of an artifact version.
///
/// Version 1 is the plain name; later versions carry a `_vN` suffix.
///
/// # Examples
///
/// ```
/// use saga_core::ArtifactKind;
/// use saga_storage::artifact_file_name;
///
/// assert_eq!(artifact_file_name(ArtifactKind::Bible, 1), "bible.txt");
/// assert_eq!(artifact_file_name(ArtifactKind::Plan, 3), "plan_v3.txt");
/// ```
pub fn artifact_file_name(kind: ArtifactKind, version: u32) -> String {
    if version <= 1 {
        format!("{}.txt", kind.stem())
    } else {
        format!("{}_v{}.txt", kind.stem(), version)
    }
}

fn parse_version(kind: ArtifactKind, file_name: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(kind.stem())?.strip_suffix(".txt")?;
    if rest.is_empty() {
        return Some(1);
    }
    let version: u32 = rest.strip_prefix("_v")?.parse().ok()?;
    (version >= 2).then_some(version)
}

/// Versions of one artifact kind present in a blueprint directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactVersions {
    dir: PathBuf,
    kind: ArtifactKind,
    versions: Vec<u32>,
}

impl ArtifactVersions {
    /// Create a listing; versions are sorted and deduplicated.
    pub fn new(dir: impl Into<PathBuf>, kind: ArtifactKind, mut versions: Vec<u32>) -> Self {
        versions.sort_unstable();
        versions.dedup();
        Self {
            dir: dir.into(),
            kind,
            versions,
        }
    }

    /// Directory the listing was taken from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact kind.
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Existing versions, ascending.
    pub fn versions(&self) -> &[u32] {
        &self.versions
    }

    /// Highest existing version.
    pub fn latest(&self) -> Option<u32> {
        self.versions.last().copied()
    }

    /// First version number that does not collide with an existing file.
    ///
    /// Saturates at `u32::MAX`; writing that version then fails as a collision.
    pub fn next(&self) -> u32 {
        self.latest().map_or(1, |v| v.saturating_add(1))
    }

    /// Path of a given version.
    pub fn path(&self, version: u32) -> PathBuf {
        self.dir.join(artifact_file_name(self.kind, version))
    }
}

/// Root of all run artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`. Nothing is created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a blueprint's artifacts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the identifier is empty or would escape the root.
    pub fn blueprint_dir(&self, blueprint_id: &str) -> SagaResult<PathBuf> {
        let id = blueprint_id.trim();
        if id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(['/', '\\'])
        {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
                "blueprint identifier '{blueprint_id}' is not a valid directory name"
            )))
            .into());
        }
        Ok(self.root.join(id))
    }

    /// List the versions of `kind` already written for a blueprint.
    ///
    /// A missing directory is an empty listing.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryList` if the directory exists but cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn existing_versions(
        &self,
        blueprint_id: &str,
        kind: ArtifactKind,
    ) -> SagaResult<ArtifactVersions> {
        let dir = self.blueprint_dir(blueprint_id)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ArtifactVersions::new(dir, kind, Vec::new()));
            }
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::DirectoryList(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
                .into());
            }
        };

        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryList(format!(
                "{}: {}",
                dir.display(),
                e
            )))
        })? {
            if let Some(version) = entry
                .file_name()
                .to_str()
                .and_then(|name| parse_version(kind, name))
            {
                versions.push(version);
            }
        }

        tracing::debug!(dir = %dir.display(), found = versions.len(), "Listed artifact versions");
        Ok(ArtifactVersions::new(dir, kind, versions))
    }

    /// Read an artifact verbatim.
    ///
    /// # Errors
    ///
    /// Returns `FileRead` if the file cannot be read as UTF-8 text.
    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn read_artifact(&self, path: &Path) -> SagaResult<String> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        tracing::debug!(chars = text.chars().count(), "Loaded artifact");
        Ok(text)
    }

    /// Write a new artifact and flush it to disk.
    ///
    /// # Errors
    ///
    /// Returns `FileWrite` if the file already exists or cannot be written, and
    /// `DirectoryCreation` if its directory cannot be created.
    #[tracing::instrument(skip(self, path, contents), fields(path = %path.display(), bytes = contents.len()))]
    pub async fn write_artifact(&self, path: &Path, contents: &str) -> SagaResult<()> {
        write_new_file(path, contents).await
    }
}

/// Create `path` (never replacing an existing file), write and `sync_all`.
pub(crate) async fn write_new_file(path: &Path, contents: &str) -> SagaResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }

    let write_error = |e: std::io::Error| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            path.display(),
            e
        )))
    };

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(write_error)?;
    file.write_all(contents.as_bytes())
        .await
        .map_err(write_error)?;
    file.sync_all().await.map_err(write_error)?;

    tracing::info!(path = %path.display(), bytes = contents.len(), "Wrote artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_parsed_from_file_names() {
        assert_eq!(parse_version(ArtifactKind::Bible, "bible.txt"), Some(1));
        assert_eq!(parse_version(ArtifactKind::Bible, "bible_v12.txt"), Some(12));
        assert_eq!(parse_version(ArtifactKind::Bible, "bible_v1.txt"), None);
        assert_eq!(parse_version(ArtifactKind::Bible, "bible_vx.txt"), None);
        assert_eq!(parse_version(ArtifactKind::Bible, "bible.md"), None);
        assert_eq!(parse_version(ArtifactKind::Plan, "bible.txt"), None);
    }

    #[test]
    fn next_version_follows_highest() {
        let versions = ArtifactVersions::new("out/x", ArtifactKind::Plan, vec![3, 1]);
        assert_eq!(versions.latest(), Some(3));
        assert_eq!(versions.next(), 4);
        assert_eq!(versions.path(4), PathBuf::from("out/x/plan_v4.txt"));
    }

    #[test]
    fn exhausted_versions_saturate() {
        let versions = ArtifactVersions::new("out/x", ArtifactKind::Metadata, vec![u32::MAX]);
        assert_eq!(versions.next(), u32::MAX);
    }

    #[test]
    fn empty_listing_starts_at_plain_name() {
        let versions = ArtifactVersions::new("out/x", ArtifactKind::Story, Vec::new());
        assert_eq!(versions.next(), 1);
        assert_eq!(versions.path(1), PathBuf::from("out/x/story.txt"));
    }

    #[test]
    fn escaping_identifiers_are_rejected() {
        let store = ArtifactStore::new("out");
        assert!(store.blueprint_dir("../etc").is_err());
        assert!(store.blueprint_dir("  ").is_err());
        assert!(store.blueprint_dir("..").is_err());
        assert!(store.blueprint_dir("lighthouse").is_ok());
    }
}
