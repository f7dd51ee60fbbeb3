//! Saga - blueprint-to-story generation
//!
//! Saga turns an operator-written blueprint into a finished multi-scene story
//! by driving a locally hosted Ollama-compatible model through three phases
//! (story bible, scene plan, scenes), and applies ordered rewrites to finished
//! text through improvement chains.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use saga::{Blueprint, CancelToken, OllamaClient, SagaConfig, StoryPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SagaConfig::load(None)?;
//!     let client = OllamaClient::new(config.client().clone())?;
//!     let pipeline = StoryPipeline::new(client, config.pipeline_config())?;
//!
//!     let blueprint = Blueprint::new("lighthouse", "Title: Embers\nA keeper and a storm.");
//!     let report = pipeline.run(&blueprint, &CancelToken::new()).await?;
//!     println!("{}", report.story_path().display());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `saga_error` - Error types
//! - `saga_core` - Data model and configuration values
//! - `saga_interface` - `TextGenerator` trait and cancellation token
//! - `saga_models` - Ollama client and duration estimator
//! - `saga_storage` - Versioned artifact files and improvement persistence
//! - `saga_narrative` - Scene plan parsing, requirement checks, pipeline, chains
//!
//! This crate re-exports everything for convenience and adds layered
//! configuration loading.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod inputs;

pub use config::SagaConfig;
pub use inputs::{file_stem, load_blueprint, load_lines, read_text};

pub use saga_core::*;
pub use saga_error::*;
pub use saga_interface::*;
pub use saga_models::{DurationEstimator, OllamaClient, TimingSample};
pub use saga_narrative::{
    BatchOutcome, BatchReport, EntityLedger, ImprovementChain, PipelineStage, PreprocessOutcome,
    RunOutcome, RunReport, StoryPipeline, check_requirements, parse_scene_plan,
};
pub use saga_storage::{ArtifactStore, FileSystemImprovementSink, ImprovementSink};
