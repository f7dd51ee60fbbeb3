//! Trait definitions for generation backends.

use crate::CancelToken;
use async_trait::async_trait;
use saga_core::{GenerationRequest, GenerationResult};
use saga_error::SagaResult;

/// Core trait that every generation backend implements.
///
/// Calls are awaited one at a time by their callers; implementations may assume
/// no two calls on the same generator overlap within a pipeline run.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one generation call.
    ///
    /// When `cancel` fires mid-call the implementation must discard any
    /// accumulated text and return a cancellation error.
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> SagaResult<GenerationResult>;

    /// Model identifier (e.g., "llama3").
    fn model_name(&self) -> &str;

    /// Default request settings derived from this backend's configuration.
    ///
    /// Callers build requests through this so transport mode and sampling
    /// parameters come from one place.
    fn request_defaults(&self) -> saga_core::GenerationRequestBuilder {
        GenerationRequest::builder()
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for std::sync::Arc<T> {
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> SagaResult<GenerationResult> {
        (**self).generate(request, cancel).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn request_defaults(&self) -> saga_core::GenerationRequestBuilder {
        (**self).request_defaults()
    }
}
