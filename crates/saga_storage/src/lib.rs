//! Versioned artifact storage for Saga.
//!
//! Every artifact a run produces (bible, plan, story, metadata) lives under
//! `{output_dir}/{blueprint_id}/`. Files are never overwritten: when a name is
//! taken, the next free version is used (`bible.txt`, `bible_v2.txt`, ...).
//! Every write is flushed to disk before the call returns.
//!
//! Improvement chains persist each step as it completes through an
//! [`ImprovementSink`]; [`FileSystemImprovementSink`] writes
//! `{output_dir}/improvements/{name}/step_NN.txt` and a `summary.txt`.
//!
//! # Example
//!
//! ```rust
//! use saga_core::ArtifactKind;
//! use saga_storage::ArtifactStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ArtifactStore::new("/tmp/saga-output");
//! let versions = store.existing_versions("lighthouse", ArtifactKind::Bible).await?;
//! let path = versions.path(versions.next());
//! store.write_artifact(&path, "The keeper, the storm, the island.").await?;
//! assert_eq!(store.read_artifact(&path).await?, "The keeper, the storm, the island.");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifacts;
mod improvements;

pub use artifacts::{ArtifactStore, ArtifactVersions, artifact_file_name};
pub use improvements::{FileSystemImprovementSink, render_step, render_summary};
pub use saga_error::{StorageError, StorageErrorKind};

use saga_core::{ChainMode, ImprovementStep};
use saga_error::SagaResult;
use std::path::PathBuf;

/// Destination for improvement chain results.
///
/// The chain hands each step to the sink as soon as it finishes, successful or
/// not, before starting the next instruction.
#[async_trait::async_trait]
pub trait ImprovementSink: Send + Sync {
    /// Persist one finished step and return where it was written.
    async fn persist_step(&self, step: &ImprovementStep) -> SagaResult<PathBuf>;

    /// Persist the outcome overview of a completed chain.
    async fn persist_summary(
        &self,
        mode: ChainMode,
        steps: &[ImprovementStep],
    ) -> SagaResult<PathBuf>;
}
