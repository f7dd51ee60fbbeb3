//! Ollama-protocol HTTP client.

use super::dto::{BatchResponse, GenerateBody, TagsResponse, WireOptions};
use super::stream::StreamAccumulator;
use crate::DurationEstimator;
use futures_util::StreamExt;
use saga_core::{ClientConfig, GenerationRequest, GenerationRequestBuilder, GenerationResult};
use saga_error::{ConfigError, GenerationError, GenerationErrorKind, SagaResult};
use saga_interface::{CancelToken, TextGenerator};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Longest error body kept in a status error.
const MAX_ERROR_BODY: usize = 512;

/// Client for an Ollama-compatible generation endpoint.
#[derive(Debug)]
pub struct OllamaClient {
    config: ClientConfig,
    client: reqwest::Client,
    estimator: Mutex<DurationEstimator>,
}

impl OllamaClient {
    /// Create a client from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client cannot
    /// be constructed.
    #[instrument(skip(config), fields(base_url = %config.base_url(), model = %config.model()))]
    pub fn new(config: ClientConfig) -> SagaResult<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {e}")))?;

        info!(
            timeout_secs = ?config.timeout_secs(),
            transport = %config.transport(),
            "Creating generation client"
        );

        let estimator = Mutex::new(DurationEstimator::new(config.calibration_window()));
        Ok(Self {
            config,
            client,
            estimator,
        })
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url().trim_end_matches('/'), path)
    }

    /// Check that the endpoint is reachable and serves the configured model.
    ///
    /// Returns the names of all locally available models.
    ///
    /// # Errors
    ///
    /// Returns `Transport`/`Status` if the endpoint is unreachable and
    /// `ModelNotFound` if the model is not listed.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> SagaResult<Vec<String>> {
        let url = self.endpoint("api/tags");
        debug!(url = %url, "Checking endpoint health");

        let response = self.client.get(&url).send().await.map_err(|e| {
            GenerationError::new(GenerationErrorKind::Transport(format!(
                "Health check failed: {e}"
            )))
        })?;
        let response = ensure_success(response).await?;
        let tags: TagsResponse = response.json().await.map_err(|e| {
            GenerationError::new(GenerationErrorKind::Decode(format!(
                "Failed to parse model list: {e}"
            )))
        })?;

        let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        let model = self.config.model();
        let available = names
            .iter()
            .any(|name| name == model || name.split(':').next() == Some(model.as_str()));
        if !available {
            warn!(model = %model, available = ?names, "Model not found on endpoint");
            return Err(GenerationError::new(GenerationErrorKind::ModelNotFound(model.clone())).into());
        }

        info!(models = names.len(), "Endpoint healthy");
        Ok(names)
    }

    fn log_estimate(&self, request: &GenerationRequest) -> Option<f64> {
        let estimate = self
            .estimator
            .lock()
            .ok()
            .and_then(|estimator| estimator.estimate(*request.num_predict()));
        match estimate {
            Some(secs) => info!(
                label = %request.label(),
                num_predict = request.num_predict(),
                estimated_secs = secs.round(),
                "Generating"
            ),
            None => info!(
                label = %request.label(),
                num_predict = request.num_predict(),
                "Generating (no duration estimate yet)"
            ),
        }
        estimate
    }

    fn record_timing(&self, request: &GenerationRequest, estimate: Option<f64>, elapsed: f64) {
        if let Some(accuracy) = estimate.and_then(|e| DurationEstimator::accuracy(e, elapsed)) {
            debug!(
                label = %request.label(),
                error_pct = (accuracy * 1000.0).round() / 10.0,
                "Duration estimate accuracy"
            );
        }
        if let Ok(mut estimator) = self.estimator.lock() {
            let kept = estimator.record(*request.num_predict(), elapsed);
            debug!(kept, samples = estimator.len(), "Timing sample");
        }
    }

    async fn read_batch(
        &self,
        response: reqwest::Response,
        cancel: &CancelToken,
    ) -> Result<(String, u64, u64), GenerationError> {
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(GenerationError::new(GenerationErrorKind::Cancelled));
            }
            body = response.text() => body.map_err(|e| {
                GenerationError::new(GenerationErrorKind::Transport(format!(
                    "Failed to read response body: {e}"
                )))
            })?,
        };

        let parsed: BatchResponse = serde_json::from_str(&body).map_err(|e| {
            GenerationError::new(GenerationErrorKind::Decode(format!(
                "Invalid batch response: {e}"
            )))
        })?;
        Ok((parsed.response, parsed.eval_count, parsed.prompt_eval_count))
    }

    async fn read_stream(
        &self,
        response: reqwest::Response,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<(String, u64, u64), GenerationError> {
        let mut bytes = response.bytes_stream();
        let mut accumulator = StreamAccumulator::new();
        let mut pending: Vec<u8> = Vec::new();
        let progress_interval = usize::try_from(*self.config.progress_interval()).unwrap_or(0);
        let started = Instant::now();
        let mut last_reported = 0;

        'read: loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(
                        label = %request.label(),
                        discarded_chars = accumulator.char_count(),
                        "Generation cancelled; discarding partial text"
                    );
                    return Err(GenerationError::new(GenerationErrorKind::Cancelled));
                }
                next = bytes.next() => next,
            };

            let chunk = match next {
                None => break,
                Some(Err(e)) => {
                    return Err(GenerationError::new(GenerationErrorKind::Transport(format!(
                        "Stream interrupted: {e}"
                    ))));
                }
                Some(Ok(chunk)) => chunk,
            };

            pending.extend_from_slice(&chunk);
            while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                if accumulator.push_line(&String::from_utf8_lossy(&line))? {
                    break 'read;
                }
            }

            if progress_interval > 0 && accumulator.fragments() >= last_reported + progress_interval
            {
                last_reported = accumulator.fragments();
                debug!(
                    label = %request.label(),
                    fragments = accumulator.fragments(),
                    chars = accumulator.char_count(),
                    elapsed_secs = started.elapsed().as_secs(),
                    "Streaming progress"
                );
            }
        }

        if !accumulator.is_done() && !pending.is_empty() {
            accumulator.push_line(&String::from_utf8_lossy(&pending))?;
        }
        if accumulator.malformed_lines() > 0 {
            warn!(
                label = %request.label(),
                skipped = accumulator.malformed_lines(),
                "Skipped malformed stream lines"
            );
        }
        accumulator.finish()
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    warn!(status = status.as_u16(), "Endpoint returned error status");
    Err(GenerationError::new(GenerationErrorKind::Status {
        status: status.as_u16(),
        body,
    }))
}

#[async_trait::async_trait]
impl TextGenerator for OllamaClient {
    #[instrument(skip(self, request, cancel), fields(label = %request.label(), stream = request.transport().is_stream()))]
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> SagaResult<GenerationResult> {
        if cancel.is_cancelled() {
            return Err(GenerationError::new(GenerationErrorKind::Cancelled).into());
        }

        let stream = request.transport().is_stream();
        let prompt = self
            .config
            .prompt_format()
            .render(request.system(), request.user());
        debug!(prompt_length = prompt.len(), "Built prompt");

        let body = GenerateBody {
            model: self.config.model(),
            prompt,
            stream,
            options: WireOptions::from_request(request),
        };

        let estimate = self.log_estimate(request);
        let started = Instant::now();

        let send = self.client.post(self.endpoint("api/generate")).json(&body).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(GenerationError::new(GenerationErrorKind::Cancelled).into());
            }
            response = send => response.map_err(|e| {
                GenerationError::new(GenerationErrorKind::Transport(format!(
                    "Request failed: {e}"
                )))
            })?,
        };
        let response = ensure_success(response).await?;

        let (text, eval_count, prompt_eval_count) = if stream {
            self.read_stream(response, request, cancel).await?
        } else {
            self.read_batch(response, cancel).await?
        };

        if text.trim().is_empty() {
            warn!(label = %request.label(), "Endpoint returned no usable text");
            return Err(GenerationError::new(GenerationErrorKind::EmptyGeneration(format!(
                "'{}' returned only whitespace",
                request.label()
            )))
            .into());
        }

        let elapsed = started.elapsed().as_secs_f64();
        self.record_timing(request, estimate, elapsed);
        info!(
            label = %request.label(),
            eval_count,
            prompt_eval_count,
            elapsed_secs = (elapsed * 10.0).round() / 10.0,
            "Generation complete"
        );

        Ok(GenerationResult::new(
            text,
            eval_count,
            prompt_eval_count,
            elapsed,
        ))
    }

    fn model_name(&self) -> &str {
        self.config.model()
    }

    fn request_defaults(&self) -> GenerationRequestBuilder {
        let mut builder = GenerationRequest::builder();
        builder
            .options(self.config.sampling().clone())
            .transport(*self.config.transport());
        builder
    }
}
