//! Wire types for the `/api/generate` and `/api/tags` endpoints.

use saga_core::GenerationRequest;
use serde::{Deserialize, Serialize};

/// Request body for `/api/generate`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct GenerateBody<'a> {
    pub model: &'a str,
    pub prompt: String,
    pub stream: bool,
    pub options: WireOptions<'a>,
}

/// Endpoint `options` object.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct WireOptions<'a> {
    pub num_predict: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repeat_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<&'a [String]>,
}

impl<'a> WireOptions<'a> {
    pub(crate) fn from_request(request: &'a GenerationRequest) -> Self {
        let options = request.options();
        Self {
            num_predict: *request.num_predict(),
            temperature: *options.temperature(),
            top_p: *options.top_p(),
            top_k: *options.top_k(),
            repeat_penalty: *options.repeat_penalty(),
            seed: *options.seed(),
            stop: options.stop().as_deref(),
        }
    }
}

/// Complete response of a non-streaming call.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BatchResponse {
    pub response: String,
    #[serde(default)]
    pub eval_count: u64,
    #[serde(default)]
    pub prompt_eval_count: u64,
}

/// One line of a streaming response.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub eval_count: Option<u64>,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `/api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagEntry>,
}

/// One locally available model.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TagEntry {
    pub name: String,
}
