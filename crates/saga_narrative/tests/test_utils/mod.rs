//! Shared test utilities for the narrative crate.

pub mod mock_generator;

#[allow(unused_imports)]
pub use mock_generator::{MockGenerator, MockResponse};
