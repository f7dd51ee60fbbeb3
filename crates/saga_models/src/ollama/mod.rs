//! Ollama-protocol client implementation.

mod client;
mod dto;
mod stream;

pub use client::OllamaClient;
pub use stream::{StreamAccumulator, StreamEvent, StreamEvents, decode_line};
