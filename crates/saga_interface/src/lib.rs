//! Trait definitions for the Saga pipeline.
//!
//! The pipeline, the improvement chain and the CLI are written against
//! [`TextGenerator`] rather than a concrete HTTP client, so tests can drive them
//! with scripted in-process generators.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod traits;

pub use cancel::CancelToken;
pub use traits::TextGenerator;
