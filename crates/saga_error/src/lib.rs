//! Error types for the Saga pipeline.
//!
//! This crate provides the foundation error types used throughout the Saga workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use saga_error::{GenerationError, GenerationErrorKind, SagaResult};
//!
//! fn call_backend() -> SagaResult<String> {
//!     Err(GenerationError::new(GenerationErrorKind::Transport(
//!         "Connection refused".to_string(),
//!     )))?
//! }
//!
//! assert!(call_backend().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod generation;
mod narrative;
mod storage;

pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{SagaError, SagaErrorKind, SagaResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use narrative::{NarrativeError, NarrativeErrorKind};
pub use storage::{StorageError, StorageErrorKind};
