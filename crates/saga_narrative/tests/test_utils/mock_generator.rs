//! Scripted text generator for pipeline and chain tests.

use async_trait::async_trait;
use saga_core::{GenerationRequest, GenerationResult};
use saga_error::{GenerationError, GenerationErrorKind, SagaResult};
use saga_interface::{CancelToken, TextGenerator};
use std::sync::{Arc, Mutex};

/// What the mock returns for a matching request.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this text
    Text(String),
    /// Return `"Output for {label}."`
    Label,
    /// Fail with this error
    Error(GenerationErrorKind),
    /// Fire the cancellation token and fail as cancelled
    Cancel,
}

/// Generator that answers by request label and records every request.
///
/// Rules match the label exactly, or by prefix when the key ends with `*`.
/// The most recently added matching rule wins; unmatched labels get [`MockResponse::Label`].
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    rules: Vec<(String, MockResponse)>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

#[allow(dead_code)]
impl MockGenerator {
    /// Create a mock that echoes labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule.
    pub fn respond(mut self, key: impl Into<String>, response: MockResponse) -> Self {
        self.rules.push((key.into(), response));
        self
    }

    /// Add a rule returning fixed text.
    pub fn text(self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.respond(key, MockResponse::Text(text.into()))
    }

    /// Every request received, in order.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Labels of every request received, in order.
    pub fn labels(&self) -> Vec<String> {
        self.calls().iter().map(|r| r.label().clone()).collect()
    }

    /// The request with this label, if one was made.
    pub fn call(&self, label: &str) -> Option<GenerationRequest> {
        self.calls().into_iter().find(|r| r.label() == label)
    }

    /// Number of requests whose label starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|r| r.label().starts_with(prefix))
            .count()
    }

    fn response_for(&self, label: &str) -> MockResponse {
        self.rules
            .iter()
            .rev()
            .find(|(key, _)| match key.strip_suffix('*') {
                Some(prefix) => label.starts_with(prefix),
                None => key == label,
            })
            .map(|(_, response)| response.clone())
            .unwrap_or(MockResponse::Label)
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> SagaResult<GenerationResult> {
        self.calls.lock().unwrap().push(request.clone());
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;

        match self.response_for(request.label()) {
            MockResponse::Text(text) => Ok(GenerationResult::new(text, 42, 100, 0.25)),
            MockResponse::Label => Ok(GenerationResult::new(
                format!("Output for {}.", request.label()),
                42,
                100,
                0.25,
            )),
            MockResponse::Error(kind) => Err(GenerationError::new(kind).into()),
            MockResponse::Cancel => {
                cancel.cancel();
                Err(GenerationError::new(GenerationErrorKind::Cancelled).into())
            }
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
