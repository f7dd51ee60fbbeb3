//! Story pipeline and improvement chains for Saga.
//!
//! This crate turns a blueprint into a finished story through three generation
//! phases and applies ordered rewrites to finished text.
//!
//! # Features
//!
//! - **Scene plan parsing**: marker table over common plan dialects ([`parse_scene_plan`])
//! - **Requirement checks**: advisory token coverage of mandatory constraints
//! - **Story pipeline**: Bible → Plan → Scenes with reuse policies and versioned artifacts
//! - **Improvement chains**: original or cumulative rewrites with per-step persistence
//!
//! # Example
//!
//! ```rust,ignore
//! use saga_core::{Blueprint, ClientConfig, PipelineConfig};
//! use saga_interface::CancelToken;
//! use saga_models::OllamaClient;
//! use saga_narrative::StoryPipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new(ClientConfig::default())?;
//! let pipeline = StoryPipeline::new(client, PipelineConfig::default())?;
//!
//! let blueprint = Blueprint::new("lighthouse", "Title: Embers\nA keeper and a storm.");
//! let report = pipeline.run(&blueprint, &CancelToken::new()).await?;
//! println!("Story written to {}", report.story_path().display());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifact_plan;
mod chain;
mod entities;
mod pipeline;
mod plan_parser;
mod prompts;
mod requirements;
mod stage;

pub use artifact_plan::{ArtifactPlan, resolve_artifact_path};
pub use chain::ImprovementChain;
pub use entities::{EntityEntry, EntityLedger};
pub use pipeline::{BatchOutcome, BatchReport, PreprocessOutcome, RunReport, StoryPipeline};
pub use plan_parser::{MarkerDialect, SCENE_MARKERS, SceneMarker, match_marker, parse_scene_plan};
pub use requirements::check_requirements;
pub use stage::{PipelineStage, RunOutcome};
