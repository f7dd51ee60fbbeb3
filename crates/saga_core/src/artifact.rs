//! Persisted story and metadata artifacts.

use crate::{ReuseMode, RequirementCheck};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Fixed-width rule separating scene blocks in the story artifact.
pub const STORY_RULE: &str = "============================================================";

/// The final narrative of a run.
///
/// # Examples
///
/// ```
/// use saga_core::StoryArtifact;
///
/// let story = StoryArtifact::new("Embers", vec!["First.".into(), "Second.".into()]);
/// let text = story.render();
/// assert!(text.starts_with("Embers\n\nScene 1\n\nFirst."));
/// assert!(text.contains("Scene 2\n\nSecond."));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryArtifact {
    title: String,
    scenes: Vec<String>,
}

impl StoryArtifact {
    /// Create a story from its title and ordered scene texts.
    pub fn new(title: impl Into<String>, scenes: Vec<String>) -> Self {
        Self {
            title: title.into(),
            scenes,
        }
    }

    /// Story title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Scene texts in order.
    pub fn scenes(&self) -> &[String] {
        &self.scenes
    }

    /// Title line, blank line, then `Scene <n>` blocks separated by [`STORY_RULE`].
    pub fn render(&self) -> String {
        let blocks: Vec<String> = self
            .scenes
            .iter()
            .enumerate()
            .map(|(i, text)| format!("Scene {}\n\n{}", i + 1, text.trim()))
            .collect();
        let separator = format!("\n\n{STORY_RULE}\n\n");
        format!("{}\n\n{}\n", self.title, blocks.join(&separator))
    }
}

/// Where a bible or plan came from in a given run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArtifactSource {
    /// Generated during this run and written to `path`
    Generated {
        /// File the artifact was written to
        path: PathBuf,
        /// Size ceiling used for the call
        num_predict: u32,
        /// Generated units
        eval_count: u64,
        /// Call duration
        elapsed_secs: f64,
    },
    /// Loaded verbatim from an earlier run
    Reused {
        /// File the artifact was read from
        path: PathBuf,
    },
}

impl ArtifactSource {
    /// Whether the artifact was loaded rather than generated.
    pub fn is_reused(&self) -> bool {
        matches!(self, Self::Reused { .. })
    }

    /// File backing the artifact.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Generated { path, .. } | Self::Reused { path } => path,
        }
    }
}

/// Audit record of one scene call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct SceneRecord {
    /// 1-based scene number
    ordinal: usize,
    /// Marker line of the segment
    heading: String,
    /// System text sent
    system_prompt: String,
    /// User text sent
    user_prompt: String,
    /// Text received
    response: String,
    /// Size ceiling used
    num_predict: u32,
    /// Generated units
    eval_count: u64,
    /// Prompt units
    prompt_eval_count: u64,
    /// Call duration
    elapsed_secs: f64,
}

impl SceneRecord {
    /// Creates a new scene record builder.
    pub fn builder() -> SceneRecordBuilder {
        SceneRecordBuilder::default()
    }

    /// Words in the response.
    pub fn word_count(&self) -> usize {
        self.response.split_whitespace().count()
    }

    /// Characters in the response.
    pub fn char_count(&self) -> usize {
        self.response.chars().count()
    }
}

/// Human-readable audit trail of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Blueprint identifier
    pub blueprint_id: String,
    /// Story title
    pub title: String,
    /// Model that served the run
    pub model: String,
    /// Reuse policy of the run
    pub reuse_mode: ReuseMode,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Preprocessing outcome, if preprocessing was configured
    pub preprocess_note: Option<String>,
    /// Bible provenance
    pub bible: ArtifactSource,
    /// Plan provenance
    pub plan: ArtifactSource,
    /// Advisory requirement check results
    pub requirements: Vec<RequirementCheck>,
    /// One entry per scene, in order
    pub scenes: Vec<SceneRecord>,
}

impl MetadataRecord {
    /// Number of scene entries.
    pub fn entry_count(&self) -> usize {
        self.scenes.len()
    }

    /// Render the trace as plain text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Run metadata: {}", self.title);
        let _ = writeln!(out, "Blueprint: {}", self.blueprint_id);
        let _ = writeln!(out, "Model: {}", self.model);
        let _ = writeln!(out, "Reuse mode: {}", self.reuse_mode);
        let _ = writeln!(out, "Started: {}", self.started_at.to_rfc3339());
        if let Some(note) = &self.preprocess_note {
            let _ = writeln!(out, "Preprocessing: {note}");
        }
        render_source(&mut out, "Bible", &self.bible);
        render_source(&mut out, "Plan", &self.plan);

        if !self.requirements.is_empty() {
            let _ = writeln!(out, "\nRequirements:");
            for check in &self.requirements {
                let status = if check.is_satisfied() { "ok" } else { "incomplete" };
                let _ = writeln!(out, "- [{status}] {}", check.requirement);
                if !check.missing.is_empty() {
                    let _ = writeln!(out, "    missing: {}", check.missing.join(", "));
                }
            }
        }

        let total_words: usize = self.scenes.iter().map(SceneRecord::word_count).sum();
        let total_secs: f64 = self.scenes.iter().map(|s| s.elapsed_secs).sum();
        let _ = writeln!(
            out,
            "\nScenes: {} ({} words, {:.1}s)",
            self.scenes.len(),
            total_words,
            total_secs
        );

        for scene in &self.scenes {
            let _ = writeln!(out, "\n--- Scene {}: {} ---", scene.ordinal, scene.heading);
            let _ = writeln!(
                out,
                "num_predict={} eval_count={} prompt_eval_count={} elapsed={:.2}s words={} chars={}",
                scene.num_predict,
                scene.eval_count,
                scene.prompt_eval_count,
                scene.elapsed_secs,
                scene.word_count(),
                scene.char_count()
            );
            let _ = writeln!(out, "\n[system]\n{}", scene.system_prompt);
            let _ = writeln!(out, "\n[user]\n{}", scene.user_prompt);
            let _ = writeln!(out, "\n[response]\n{}", scene.response);
        }
        out
    }
}

fn render_source(out: &mut String, name: &str, source: &ArtifactSource) {
    match source {
        ArtifactSource::Generated {
            path,
            num_predict,
            eval_count,
            elapsed_secs,
        } => {
            let _ = writeln!(
                out,
                "{name}: generated -> {} (num_predict={num_predict}, eval_count={eval_count}, {elapsed_secs:.1}s)",
                path.display()
            );
        }
        ArtifactSource::Reused { path } => {
            let _ = writeln!(out, "{name}: reused <- {}", path.display());
        }
    }
}
