//! Generation endpoint client for Saga.
//!
//! This crate talks to an Ollama-compatible `/api/generate` endpoint in batch or
//! streaming mode and keeps a small adaptive model of call durations for progress
//! feedback.
//!
//! # Example
//!
//! ```no_run
//! use saga_core::{ClientConfig, GenerationRequest};
//! use saga_interface::{CancelToken, TextGenerator};
//! use saga_models::OllamaClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new(ClientConfig::default())?;
//! let request = client
//!     .request_defaults()
//!     .label("hello")
//!     .user("Say hello")
//!     .num_predict(64u32)
//!     .build()?;
//! let result = client.generate(&request, &CancelToken::new()).await?;
//! println!("{}", result.text());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ollama;
mod timing;

pub use ollama::{OllamaClient, StreamAccumulator, StreamEvent, StreamEvents, decode_line};
pub use timing::{DurationEstimator, TimingSample};
