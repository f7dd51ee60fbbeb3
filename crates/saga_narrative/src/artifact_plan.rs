//! Where each artifact of a run comes from and where it goes.

use saga_core::{ArtifactKind, ReuseMode};
use saga_storage::ArtifactVersions;
use std::path::PathBuf;

/// Decision for one artifact: load `path`, or generate and write to `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPlan {
    /// File to read from or write to
    pub path: PathBuf,
    /// Whether the artifact must be generated
    pub should_generate: bool,
    /// Version number of `path`
    pub version: u32,
}

impl ArtifactPlan {
    /// Whether an existing artifact is reused.
    pub fn is_reuse(&self) -> bool {
        !self.should_generate
    }
}

/// Decide how to obtain an artifact given the files already on disk.
///
/// When the reuse policy covers `kind` and a version exists, the highest
/// version is loaded. Otherwise the artifact is generated into the first free
/// version, so an earlier file is never overwritten.
///
/// # Examples
///
/// ```
/// use saga_core::{ArtifactKind, ReuseMode};
/// use saga_narrative::resolve_artifact_path;
/// use saga_storage::ArtifactVersions;
///
/// let existing = ArtifactVersions::new("out/tale", ArtifactKind::Bible, vec![1, 2]);
///
/// let plan = resolve_artifact_path(ReuseMode::Regenerate, ArtifactKind::Bible, &existing);
/// assert!(plan.should_generate);
/// assert!(plan.path.ends_with("bible_v3.txt"));
///
/// let plan = resolve_artifact_path(ReuseMode::ReuseBible, ArtifactKind::Bible, &existing);
/// assert!(!plan.should_generate);
/// assert!(plan.path.ends_with("bible_v2.txt"));
/// ```
pub fn resolve_artifact_path(
    mode: ReuseMode,
    kind: ArtifactKind,
    existing: &ArtifactVersions,
) -> ArtifactPlan {
    if let Some(version) = existing.latest().filter(|_| mode.reuses(kind)) {
        return ArtifactPlan {
            path: existing.path(version),
            should_generate: false,
            version,
        };
    }
    let version = existing.next();
    ArtifactPlan {
        path: existing.path(version),
        should_generate: true,
        version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(kind: ArtifactKind, versions: Vec<u32>) -> ArtifactVersions {
        ArtifactVersions::new("out/tale", kind, versions)
    }

    #[test]
    fn regenerate_without_files_uses_plain_name() {
        let plan = resolve_artifact_path(
            ReuseMode::Regenerate,
            ArtifactKind::Plan,
            &listing(ArtifactKind::Plan, vec![]),
        );
        assert_eq!(plan.path, PathBuf::from("out/tale/plan.txt"));
        assert!(plan.should_generate);
        assert_eq!(plan.version, 1);
    }

    #[test]
    fn reuse_without_files_falls_back_to_generation() {
        let plan = resolve_artifact_path(
            ReuseMode::ReuseBoth,
            ArtifactKind::Plan,
            &listing(ArtifactKind::Plan, vec![]),
        );
        assert!(plan.should_generate);
    }

    #[test]
    fn reuse_bible_still_regenerates_plan() {
        let plan = resolve_artifact_path(
            ReuseMode::ReuseBible,
            ArtifactKind::Plan,
            &listing(ArtifactKind::Plan, vec![1]),
        );
        assert!(plan.should_generate);
        assert_eq!(plan.path, PathBuf::from("out/tale/plan_v2.txt"));
    }

    #[test]
    fn reuse_both_loads_latest_plan() {
        let plan = resolve_artifact_path(
            ReuseMode::ReuseBoth,
            ArtifactKind::Plan,
            &listing(ArtifactKind::Plan, vec![1, 4, 2]),
        );
        assert!(plan.is_reuse());
        assert_eq!(plan.version, 4);
    }

    #[test]
    fn story_is_always_a_fresh_version() {
        let plan = resolve_artifact_path(
            ReuseMode::ReuseBoth,
            ArtifactKind::Story,
            &listing(ArtifactKind::Story, vec![1]),
        );
        assert!(plan.should_generate);
        assert_eq!(plan.path, PathBuf::from("out/tale/story_v2.txt"));
    }
}
