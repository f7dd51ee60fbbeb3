//! Immutable configuration values handed to each component at construction.
//!
//! Every optional setting is resolved once, at deserialization time, through serde
//! defaults. Components never look up settings mid-operation.

use crate::{ChainMode, PromptFormat, ReuseMode, SamplingOptions, TransportMode};
use derive_getters::Getters;
use saga_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the generation endpoint client.
///
/// # Examples
///
/// ```
/// use saga_core::ClientConfig;
///
/// let config = ClientConfig::default();
/// assert_eq!(config.base_url(), "http://localhost:11434");
/// assert!(config.timeout().is_none());
///
/// let testing = ClientConfig::for_testing("http://127.0.0.1:9999");
/// assert!(testing.timeout().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct ClientConfig {
    /// Endpoint base URL
    base_url: String,
    /// Model served by the endpoint
    model: String,
    /// Instruction-turn format
    prompt_format: PromptFormat,
    /// Batch or stream transport for every request built from this config
    transport: TransportMode,
    /// Optional request timeout in seconds; absent means wait indefinitely
    timeout_secs: Option<u64>,
    /// Log progress every this many stream fragments (0 disables)
    progress_interval: u32,
    /// Lower bound of the duration estimator's calibration window
    calibration_min: u32,
    /// Upper bound of the duration estimator's calibration window
    calibration_max: u32,
    /// Sampling parameters
    sampling: SamplingOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            prompt_format: PromptFormat::default(),
            transport: TransportMode::default(),
            timeout_secs: None,
            progress_interval: 200,
            calibration_min: 3000,
            calibration_max: 4000,
            sampling: SamplingOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Timeout applied to the secondary client used by tests and health checks.
    pub const TESTING_TIMEOUT_SECS: u64 = 120;

    /// Creates a new client config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Configuration for a testing-oriented client with a fixed timeout.
    pub fn for_testing(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: Some(Self::TESTING_TIMEOUT_SECS),
            ..Self::default()
        }
    }

    /// Same config pointing at a different endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Same config targeting a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Inclusive size window in which timing samples are recorded.
    pub fn calibration_window(&self) -> RangeInclusive<u32> {
        self.calibration_min..=self.calibration_max
    }

    /// Checks internal consistency.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is empty or the calibration window is inverted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::new("client.model must not be empty"));
        }
        if self.calibration_min > self.calibration_max {
            return Err(ConfigError::new(format!(
                "client.calibration_min ({}) exceeds calibration_max ({})",
                self.calibration_min, self.calibration_max
            )));
        }
        Ok(())
    }
}

/// Size ceilings for each generation phase.
///
/// Phase ceilings are `min(total / divisor, cap)` unless an override is set.
///
/// # Examples
///
/// ```
/// use saga_core::TokenBudget;
///
/// let budget = TokenBudget::default();
/// assert_eq!(budget.bible_limit(), 4000);
/// assert_eq!(budget.plan_limit(), 3000);
/// assert_eq!(budget.scene_limit(5), 3200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct TokenBudget {
    /// Total units available to the run
    total: u32,
    /// Divisor applied to `total` for the bible
    bible_divisor: u32,
    /// Hard cap for the bible
    bible_cap: u32,
    /// Manual bible ceiling, bypassing the formula
    bible_override: Option<u32>,
    /// Divisor applied to `total` for the plan
    plan_divisor: u32,
    /// Hard cap for the plan
    plan_cap: u32,
    /// Manual plan ceiling, bypassing the formula
    plan_override: Option<u32>,
    /// Hard cap for each scene
    scene_cap: u32,
    /// Manual scene ceiling, bypassing the formula
    scene_override: Option<u32>,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            total: 16000,
            bible_divisor: 4,
            bible_cap: 4000,
            bible_override: None,
            plan_divisor: 4,
            plan_cap: 3000,
            plan_override: None,
            scene_cap: 4000,
            scene_override: None,
        }
    }
}

impl TokenBudget {
    /// Creates a new budget builder.
    pub fn builder() -> TokenBudgetBuilder {
        TokenBudgetBuilder::default()
    }

    /// Ceiling for the bible call.
    pub fn bible_limit(&self) -> u32 {
        self.bible_override
            .unwrap_or_else(|| (self.total / self.bible_divisor.max(1)).min(self.bible_cap))
    }

    /// Ceiling for the plan call.
    pub fn plan_limit(&self) -> u32 {
        self.plan_override
            .unwrap_or_else(|| (self.total / self.plan_divisor.max(1)).min(self.plan_cap))
    }

    /// Ceiling for each scene call when the plan has `scene_count` scenes.
    pub fn scene_limit(&self, scene_count: usize) -> u32 {
        let count = u32::try_from(scene_count.max(1)).unwrap_or(u32::MAX);
        self.scene_override
            .unwrap_or_else(|| (self.total / count).min(self.scene_cap))
    }

    /// Checks that no divisor is zero and the total is usable.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total == 0 {
            return Err(ConfigError::new("budget.total must be greater than zero"));
        }
        if self.bible_divisor == 0 || self.plan_divisor == 0 {
            return Err(ConfigError::new("budget divisors must be greater than zero"));
        }
        Ok(())
    }
}

/// Opaque prompt strings supplied to the pipeline.
///
/// The pipeline appends labeled context blocks (blueprint, bible, plan, scene) to
/// each instruction; it never interprets the instruction text itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct PromptCatalog {
    /// System text for the bible call
    bible_system: String,
    /// Instruction for the bible call
    bible_instruction: String,
    /// System text for the plan call
    plan_system: String,
    /// Instruction for the plan call
    plan_instruction: String,
    /// System text for scene calls
    scene_system: String,
    /// Instruction for scene calls
    scene_instruction: String,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self {
            bible_system: "You are a meticulous story architect.".to_string(),
            bible_instruction: "Write a story bible for the blueprint below: characters, setting, \
                                themes and the overall plot arc."
                .to_string(),
            plan_system: "You are a meticulous story architect.".to_string(),
            plan_instruction: "Break the story into scenes. Start every scene with a line of the \
                               form 'Scene <n>: <title>' followed by its description."
                .to_string(),
            scene_system: "You are a novelist writing one scene at a time.".to_string(),
            scene_instruction: "Write the full prose for the scene below, consistent with the \
                                bible and the plan."
                .to_string(),
        }
    }
}

/// Optional transformation applied to the blueprint before the bible phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PreprocessConfig {
    /// Instruction describing the rewrite
    instruction: String,
    /// System text for the call
    #[serde(default)]
    system: String,
    /// Size ceiling for the call
    #[serde(default = "default_preprocess_limit")]
    num_predict: u32,
}

fn default_preprocess_limit() -> u32 {
    2000
}

impl PreprocessConfig {
    /// Create a preprocessing step from its instruction.
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            system: String::new(),
            num_predict: default_preprocess_limit(),
        }
    }
}

/// Settings for a pipeline run.
///
/// # Examples
///
/// ```
/// use saga_core::{PipelineConfig, ReuseMode};
///
/// let config = PipelineConfig::builder()
///     .output_dir("out")
///     .reuse(ReuseMode::ReuseBoth)
///     .build()
///     .unwrap();
/// assert_eq!(*config.reuse(), ReuseMode::ReuseBoth);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct PipelineConfig {
    /// Root directory for artifacts
    output_dir: PathBuf,
    /// Reuse policy for bible and plan
    reuse: ReuseMode,
    /// Phase size ceilings
    budget: TokenBudget,
    /// Prompt strings
    prompts: PromptCatalog,
    /// Optional blueprint preprocessing
    preprocess: Option<PreprocessConfig>,
    /// Mandatory constraints checked against the plan
    requirements: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            reuse: ReuseMode::default(),
            budget: TokenBudget::default(),
            prompts: PromptCatalog::default(),
            preprocess: None,
            requirements: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new pipeline config builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Same config with a different reuse policy.
    pub fn with_reuse(mut self, reuse: ReuseMode) -> Self {
        self.reuse = reuse;
        self
    }

    /// Same config writing under a different directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Same config with a different prompt catalog.
    pub fn with_prompts(mut self, prompts: PromptCatalog) -> Self {
        self.prompts = prompts;
        self
    }

    /// Same config with additional requirements.
    pub fn with_requirements(mut self, requirements: Vec<String>) -> Self {
        self.requirements.extend(requirements);
        self
    }
}

/// Settings for improvement chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct ImprovementConfig {
    /// Chaining mode
    mode: ChainMode,
    /// Size ceiling for each step
    num_predict: u32,
    /// System text for each step
    system: String,
}

impl Default for ImprovementConfig {
    fn default() -> Self {
        Self {
            mode: ChainMode::default(),
            num_predict: 4000,
            system: "You are a careful editor. Return only the revised text.".to_string(),
        }
    }
}

impl ImprovementConfig {
    /// Create a chain config.
    pub fn new(mode: ChainMode, num_predict: u32, system: impl Into<String>) -> Self {
        Self {
            mode,
            num_predict,
            system: system.into(),
        }
    }

    /// Same config with a different mode.
    pub fn with_mode(mut self, mode: ChainMode) -> Self {
        self.mode = mode;
        self
    }
}
