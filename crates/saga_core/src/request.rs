//! Request and result types for a single generation call.

use derive_getters::Getters;
use saga_error::BuilderError;
use serde::{Deserialize, Serialize};

/// How the response is carried back from the endpoint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransportMode {
    /// One JSON object containing the complete text
    Batch,
    /// Newline-delimited JSON fragments
    #[default]
    Stream,
}

impl TransportMode {
    /// Whether the endpoint should be asked to stream.
    pub fn is_stream(self) -> bool {
        matches!(self, Self::Stream)
    }
}

/// Instruction-turn format wrapped around the system and user text.
///
/// # Examples
///
/// ```
/// use saga_core::PromptFormat;
///
/// let prompt = PromptFormat::Plain.render("Be terse.", "Describe the sea.");
/// assert_eq!(prompt, "Be terse.\n\nDescribe the sea.");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromptFormat {
    /// System and user text separated by a blank line
    #[default]
    Plain,
    /// `[INST] <<SYS>> ... <</SYS>> ... [/INST]`
    Llama,
    /// `<|im_start|>` role turns
    ChatMl,
}

impl PromptFormat {
    /// Build the outgoing prompt from system and user text.
    ///
    /// An empty system text is omitted rather than rendered as an empty turn.
    pub fn render(self, system: &str, user: &str) -> String {
        let system = system.trim();
        match self {
            Self::Plain if system.is_empty() => user.to_string(),
            Self::Plain => format!("{system}\n\n{user}"),
            Self::Llama if system.is_empty() => format!("[INST] {user} [/INST]"),
            Self::Llama => format!("[INST] <<SYS>>\n{system}\n<</SYS>>\n\n{user} [/INST]"),
            Self::ChatMl => {
                let mut prompt = String::new();
                if !system.is_empty() {
                    prompt.push_str(&format!("<|im_start|>system\n{system}<|im_end|>\n"));
                }
                prompt.push_str(&format!(
                    "<|im_start|>user\n{user}<|im_end|>\n<|im_start|>assistant\n"
                ));
                prompt
            }
        }
    }
}

/// Sampling parameters forwarded to the endpoint's `options` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct SamplingOptions {
    /// Sampling temperature
    temperature: f32,
    /// Nucleus cutoff
    top_p: f32,
    /// Top-k cutoff
    top_k: u32,
    /// Repetition penalty
    repeat_penalty: f32,
    /// Fixed seed for reproducible output
    seed: Option<i64>,
    /// Stop sequences
    stop: Option<Vec<String>>,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_p: 0.9,
            top_k: 40,
            repeat_penalty: 1.1,
            seed: None,
            stop: None,
        }
    }
}

impl SamplingOptions {
    /// Same options with a fixed seed.
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Same options with a different temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Same options with stop sequences.
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = (!stop.is_empty()).then_some(stop);
        self
    }
}

/// One call to the generation backend.
///
/// # Examples
///
/// ```
/// use saga_core::{GenerationRequest, TransportMode};
///
/// let request = GenerationRequest::builder()
///     .label("bible")
///     .system("You are a story architect.")
///     .user("Draft the world.")
///     .num_predict(3500u32)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.label(), "bible");
/// assert_eq!(*request.transport(), TransportMode::Stream);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct GenerationRequest {
    /// Short name used in logs and metadata (e.g. `bible`, `scene 3`)
    label: String,
    /// System text
    #[builder(default)]
    system: String,
    /// User text
    user: String,
    /// Maximum number of units to generate
    num_predict: u32,
    /// Sampling parameters
    #[builder(default)]
    options: SamplingOptions,
    /// Batch or stream transport
    #[builder(default)]
    transport: TransportMode,
}

impl GenerationRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }
}

impl GenerationRequestBuilder {
    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns an error if `label`, `user` or `num_predict` is missing.
    pub fn build(&self) -> Result<GenerationRequest, BuilderError> {
        self.build_internal()
            .map_err(|e| BuilderError::from(e.to_string()))
    }
}

/// Successful outcome of one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct GenerationResult {
    /// Full generated text
    text: String,
    /// Number of generated units reported by the endpoint
    eval_count: u64,
    /// Number of prompt units reported by the endpoint
    prompt_eval_count: u64,
    /// Wall-clock duration of the call
    elapsed_secs: f64,
}

impl GenerationResult {
    /// Create a result from its parts.
    pub fn new(
        text: impl Into<String>,
        eval_count: u64,
        prompt_eval_count: u64,
        elapsed_secs: f64,
    ) -> Self {
        Self {
            text: text.into(),
            eval_count,
            prompt_eval_count,
            elapsed_secs,
        }
    }

    /// Consume the result, keeping only the text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Whitespace-separated word count of the text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Character count of the text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
