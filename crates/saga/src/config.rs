//! Layered configuration for the `saga` binary.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Bundled defaults (include_str! from saga.toml)
//! 2. `~/.config/saga/saga.toml`
//! 3. `./saga.toml`
//! 4. An explicit file passed on the command line

use config::{Config, File, FileFormat};
use derive_getters::Getters;
use saga_core::{ClientConfig, ImprovementConfig, PipelineConfig, PromptCatalog};
use saga_error::{ConfigError, SagaResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../saga.toml");

/// Everything the binary needs to build a client, a pipeline and a chain.
///
/// # Example
///
/// ```no_run
/// use saga::SagaConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SagaConfig::load(None)?;
/// println!("Model: {}", config.client().model());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct SagaConfig {
    /// Generation endpoint settings
    client: ClientConfig,
    /// Pipeline settings; its prompts are replaced by `prompts`
    pipeline: PipelineConfig,
    /// Prompt strings for every phase
    prompts: PromptCatalog,
    /// Improvement chain settings
    improvement: ImprovementConfig,
}

impl SagaConfig {
    /// Load the bundled defaults only.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled file cannot be parsed.
    pub fn bundled() -> SagaResult<Self> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Parse a configuration from TOML text.
    ///
    /// Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or has mistyped values.
    pub fn from_toml_str(text: &str) -> SagaResult<Self> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {e}")))?;
        finish(config)
    }

    /// Load configuration with precedence: explicit file > current dir > home dir > bundled.
    ///
    /// User files are optional and skipped when absent; `explicit` must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any present source cannot be parsed, or if the
    /// resulting client or budget settings are invalid.
    #[instrument(skip(explicit), fields(explicit = ?explicit))]
    pub fn load(explicit: Option<&Path>) -> SagaResult<Self> {
        debug!("Loading configuration");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/saga/saga.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("saga").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder.build().map_err(|e| {
            ConfigError::new(format!("Failed to build configuration: {e}"))
        })?;
        finish(config)
    }

    /// Same configuration pointing the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Pipeline settings with the top-level prompt catalog applied.
    pub fn pipeline_config(&self) -> PipelineConfig {
        self.pipeline.clone().with_prompts(self.prompts.clone())
    }

    /// Check the client and budget settings.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> SagaResult<()> {
        self.client.validate()?;
        self.pipeline.budget().validate()?;
        Ok(())
    }
}

fn finish(config: Config) -> SagaResult<SagaConfig> {
    let parsed: SagaConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {e}")))?;
    parsed.validate()?;
    debug!(
        model = %parsed.client.model(),
        base_url = %parsed.client.base_url(),
        output_dir = %parsed.pipeline.output_dir().display(),
        "Configuration loaded"
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_core::{ChainMode, ReuseMode, TransportMode};

    #[test]
    fn bundled_matches_builtin_defaults() {
        let bundled = SagaConfig::bundled().unwrap();
        assert_eq!(bundled.client(), &ClientConfig::default());
        assert_eq!(bundled.pipeline_config(), PipelineConfig::default());
        assert_eq!(bundled.improvement(), &ImprovementConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = SagaConfig::from_toml_str(
            r#"
            [client]
            model = "mistral"
            transport = "batch"

            [pipeline]
            reuse = "reuse-both"

            [improvement]
            mode = "cumulative"
            "#,
        )
        .unwrap();

        assert_eq!(config.client().model(), "mistral");
        assert_eq!(*config.client().transport(), TransportMode::Batch);
        assert_eq!(config.client().base_url(), "http://localhost:11434");
        assert_eq!(*config.pipeline().reuse(), ReuseMode::ReuseBoth);
        assert_eq!(*config.improvement().mode(), ChainMode::Cumulative);
        assert_eq!(config.pipeline().budget().bible_limit(), 4000);
    }

    #[test]
    fn improvement_system_text_is_configurable() {
        let config = SagaConfig::from_toml_str(
            r#"
            [improvement]
            system = "You are a ruthless line editor."
            "#,
        )
        .unwrap();

        assert_eq!(config.improvement().system(), "You are a ruthless line editor.");
        assert_eq!(config.improvement().num_predict(), &4000);
    }

    #[test]
    fn top_level_prompts_reach_the_pipeline() {
        let config = SagaConfig::from_toml_str(
            r#"
            [prompts]
            scene_instruction = "Write in the present tense."
            "#,
        )
        .unwrap();

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.prompts().scene_instruction(), "Write in the present tense.");
        assert_eq!(
            pipeline.prompts().bible_system(),
            PromptCatalog::default().bible_system()
        );
    }

    #[test]
    fn zero_divisor_is_rejected() {
        let result = SagaConfig::from_toml_str(
            r#"
            [pipeline.budget]
            bible_divisor = 0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_model_is_rejected() {
        let result = SagaConfig::from_toml_str("[client]\nmodel = \"\"\n");
        assert!(result.is_err());
    }
}
