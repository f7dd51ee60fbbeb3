//! Artifact reuse policy.

use serde::{Deserialize, Serialize};

/// Whether bible and plan artifacts are recomputed or loaded from prior runs.
///
/// # Examples
///
/// ```
/// use saga_core::{ArtifactKind, ReuseMode};
///
/// let mode: ReuseMode = "reuse-bible".parse().unwrap();
/// assert!(mode.reuses(ArtifactKind::Bible));
/// assert!(!mode.reuses(ArtifactKind::Plan));
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReuseMode {
    /// Generate everything; never overwrite earlier artifacts
    #[default]
    Regenerate,
    /// Load an existing bible, generate the plan
    ReuseBible,
    /// Load an existing bible and plan
    ReuseBoth,
}

impl ReuseMode {
    /// Whether an existing artifact of this kind may be loaded instead of generated.
    pub fn reuses(self, kind: ArtifactKind) -> bool {
        match (self, kind) {
            (Self::ReuseBible, ArtifactKind::Bible) => true,
            (Self::ReuseBoth, ArtifactKind::Bible | ArtifactKind::Plan) => true,
            _ => false,
        }
    }
}

/// The persisted artifacts of a pipeline run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ArtifactKind {
    /// Character/world/plot reference
    Bible,
    /// Scene-by-scene breakdown
    Plan,
    /// Final narrative
    Story,
    /// Run trace
    Metadata,
}

impl ArtifactKind {
    /// File stem used on disk (`bible`, `plan`, ...).
    pub fn stem(self) -> &'static str {
        match self {
            Self::Bible => "bible",
            Self::Plan => "plan",
            Self::Story => "story",
            Self::Metadata => "metadata",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regenerate_reuses_nothing() {
        for kind in <ArtifactKind as strum::IntoEnumIterator>::iter() {
            assert!(!ReuseMode::Regenerate.reuses(kind));
        }
    }

    #[test]
    fn story_is_never_reused() {
        assert!(!ReuseMode::ReuseBoth.reuses(ArtifactKind::Story));
        assert!(!ReuseMode::ReuseBoth.reuses(ArtifactKind::Metadata));
    }

    #[test]
    fn display_matches_cli_spelling() {
        assert_eq!(ReuseMode::ReuseBoth.to_string(), "reuse-both");
    }
}
