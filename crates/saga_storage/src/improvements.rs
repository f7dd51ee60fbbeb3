//! Filesystem persistence for improvement chains.

use crate::ImprovementSink;
use crate::artifacts::write_new_file;
use chrono::Utc;
use saga_core::{ChainMode, ImprovementStep, StepOutcome};
use saga_error::{SagaResult, StorageError, StorageErrorKind};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Render one step as a self-describing text file.
///
/// Successful steps end with their output text; failed steps with the error.
pub fn render_step(step: &ImprovementStep) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Step {}", step.index);
    let _ = writeln!(out, "Instruction: {}", step.instruction);
    let _ = writeln!(out, "Applied to: {}", step.base);
    match &step.outcome {
        StepOutcome::Succeeded {
            text,
            eval_count,
            prompt_eval_count,
            elapsed_secs,
        } => {
            let _ = writeln!(
                out,
                "Status: succeeded (eval_count={eval_count}, prompt_eval_count={prompt_eval_count}, {elapsed_secs:.1}s)"
            );
            let _ = write!(out, "\n{}\n", text.trim_end());
        }
        StepOutcome::Failed { error } => {
            let _ = writeln!(out, "Status: failed");
            let _ = writeln!(out, "Error: {error}");
        }
    }
    out
}

/// Render the outcome overview of a chain.
pub fn render_summary(mode: ChainMode, steps: &[ImprovementStep]) -> String {
    let succeeded = steps.iter().filter(|s| s.succeeded()).count();
    let mut out = String::new();
    let _ = writeln!(out, "Improvement chain summary");
    let _ = writeln!(out, "Written: {}", Utc::now().to_rfc3339());
    let _ = writeln!(out, "Mode: {mode}");
    let _ = writeln!(out, "Steps: {} ({} succeeded, {} failed)", steps.len(), succeeded, steps.len() - succeeded);
    let _ = writeln!(out);
    for step in steps {
        let status = match &step.outcome {
            StepOutcome::Succeeded { elapsed_secs, .. } => format!("ok ({elapsed_secs:.1}s)"),
            StepOutcome::Failed { error } => format!("FAILED: {error}"),
        };
        let location = step
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:02}. [{}] {} -> {}",
            step.index, step.base, step.instruction, location
        );
        let _ = writeln!(out, "    {status}");
    }
    out
}

/// Writes each step to `{root}/improvements/{name}/step_NN.txt`.
///
/// If the named directory already holds files, the next free `{name}_vN`
/// directory is used, so earlier chains are never overwritten.
#[derive(Debug, Clone)]
pub struct FileSystemImprovementSink {
    dir: PathBuf,
}

impl FileSystemImprovementSink {
    /// Pick and create the chain directory.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for an unusable name and `DirectoryCreation` or
    /// `DirectoryList` if the directory cannot be prepared.
    #[tracing::instrument(skip(root), fields(root = %root.as_ref().display()))]
    pub async fn create(root: impl AsRef<Path>, name: &str) -> SagaResult<Self> {
        let name = name.trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
                "improvement chain name '{name}' is not a valid directory name"
            )))
            .into());
        }

        let base = root.as_ref().join("improvements");
        let mut version = 1u32;
        let dir = loop {
            let candidate = if version == 1 {
                base.join(name)
            } else {
                base.join(format!("{name}_v{version}"))
            };
            if is_vacant(&candidate).await? {
                break candidate;
            }
            version += 1;
        };

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                dir.display(),
                e
            )))
        })?;

        tracing::info!(dir = %dir.display(), "Prepared improvement chain directory");
        Ok(Self { dir })
    }

    /// Directory the chain writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a step file.
    pub fn step_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("step_{index:02}.txt"))
    }
}

async fn is_vacant(dir: &Path) -> SagaResult<bool> {
    match tokio::fs::read_dir(dir).await {
        Ok(mut entries) => {
            let first = entries.next_entry().await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryList(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
            })?;
            Ok(first.is_none())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(StorageError::new(StorageErrorKind::DirectoryList(format!(
            "{}: {}",
            dir.display(),
            e
        )))
        .into()),
    }
}

#[async_trait::async_trait]
impl ImprovementSink for FileSystemImprovementSink {
    #[tracing::instrument(skip(self, step), fields(index = step.index, succeeded = step.succeeded()))]
    async fn persist_step(&self, step: &ImprovementStep) -> SagaResult<PathBuf> {
        let path = self.step_path(step.index);
        write_new_file(&path, &render_step(step)).await?;
        Ok(path)
    }

    #[tracing::instrument(skip(self, steps), fields(steps = steps.len()))]
    async fn persist_summary(
        &self,
        mode: ChainMode,
        steps: &[ImprovementStep],
    ) -> SagaResult<PathBuf> {
        let path = self.dir.join("summary.txt");
        write_new_file(&path, &render_summary(mode, steps)).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_core::StepBase;

    fn failed_step() -> ImprovementStep {
        ImprovementStep {
            index: 2,
            instruction: "Tighten the dialogue".to_string(),
            base: StepBase::Original,
            outcome: StepOutcome::Failed {
                error: "endpoint unreachable".to_string(),
            },
            path: None,
        }
    }

    #[test]
    fn failed_step_records_error() {
        let text = render_step(&failed_step());
        assert!(text.starts_with("Step 2\n"));
        assert!(text.contains("Status: failed"));
        assert!(text.contains("Error: endpoint unreachable"));
    }

    #[test]
    fn summary_counts_outcomes() {
        let ok = ImprovementStep {
            index: 1,
            instruction: "Add sensory detail".to_string(),
            base: StepBase::Original,
            outcome: StepOutcome::Succeeded {
                text: "better".to_string(),
                eval_count: 10,
                prompt_eval_count: 20,
                elapsed_secs: 1.5,
            },
            path: Some(PathBuf::from("step_01.txt")),
        };
        let summary = render_summary(ChainMode::Original, &[ok, failed_step()]);
        assert!(summary.contains("Steps: 2 (1 succeeded, 1 failed)"));
        assert!(summary.contains("01. [base text] Add sensory detail -> step_01.txt"));
        assert!(summary.contains("FAILED: endpoint unreachable"));
    }
}
