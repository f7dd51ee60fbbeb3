//! Core data types for the Saga narrative generation pipeline.
//!
//! This crate provides the data model shared by every Saga component: generation
//! requests and results, scene segments, reuse policy, improvement steps, the
//! persisted story and metadata artifacts, and the immutable configuration values
//! handed to each component at construction time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifact;
mod blueprint;
mod config;
mod improvement;
mod request;
mod requirement;
mod reuse;
mod scene;
mod telemetry;

pub use artifact::{
    ArtifactSource, MetadataRecord, SceneRecord, SceneRecordBuilder, StoryArtifact, STORY_RULE,
};
pub use blueprint::Blueprint;
pub use config::{
    ClientConfig, ClientConfigBuilder, ImprovementConfig, PipelineConfig, PipelineConfigBuilder,
    PreprocessConfig, PromptCatalog, TokenBudget, TokenBudgetBuilder,
};
pub use improvement::{ChainMode, ImprovementStep, StepBase, StepOutcome};
pub use request::{
    GenerationRequest, GenerationRequestBuilder, GenerationResult, PromptFormat, SamplingOptions,
    TransportMode,
};
pub use requirement::{RequirementCheck, RequirementSpec};
pub use reuse::{ArtifactKind, ReuseMode};
pub use scene::SceneSegment;
pub use telemetry::init_tracing;
