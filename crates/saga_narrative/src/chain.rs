//! Ordered transformations over finished text with per-step isolation.

use crate::prompts;
use saga_core::{ChainMode, ImprovementConfig, ImprovementStep, StepBase, StepOutcome};
use saga_error::{NarrativeError, NarrativeErrorKind, SagaResult};
use saga_interface::{CancelToken, TextGenerator};
use saga_storage::ImprovementSink;

/// Applies a list of instructions to a text, one generation call per instruction.
///
/// Each step is handed to the sink as soon as it finishes. A failed step is
/// recorded and the chain moves on; only cancellation or a persistence error
/// stops it early.
///
/// In [`ChainMode::Cumulative`], step *n* works on the output of the latest
/// successful step before it, or on the base text when there is none. Every
/// step records the [`StepBase`] it used.
pub struct ImprovementChain<G: TextGenerator, S: ImprovementSink> {
    generator: G,
    sink: S,
    config: ImprovementConfig,
}

impl<G: TextGenerator, S: ImprovementSink> ImprovementChain<G, S> {
    /// Create a chain.
    pub fn new(generator: G, sink: S, config: ImprovementConfig) -> Self {
        Self {
            generator,
            sink,
            config,
        }
    }

    /// Underlying generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Chain configuration.
    pub fn config(&self) -> &ImprovementConfig {
        &self.config
    }

    /// Destination of persisted steps.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run every instruction against `base_text`.
    ///
    /// # Errors
    ///
    /// Returns `NoInstructions` for an empty list, `EmptyBlueprint` for a blank
    /// base text, `Cancelled` if the token fires (already persisted steps stay
    /// on disk), and any storage error raised while persisting.
    #[tracing::instrument(
        skip(self, base_text, instructions, mode, cancel),
        fields(steps = instructions.len(), mode = %mode, base_chars = base_text.len())
    )]
    pub async fn run(
        &self,
        base_text: &str,
        instructions: &[String],
        mode: ChainMode,
        cancel: &CancelToken,
    ) -> SagaResult<Vec<ImprovementStep>> {
        if instructions.is_empty() {
            return Err(NarrativeError::new(NarrativeErrorKind::NoInstructions).into());
        }
        if base_text.trim().is_empty() {
            return Err(NarrativeError::new(NarrativeErrorKind::EmptyBlueprint(
                "improvement base text".to_string(),
            ))
            .into());
        }

        let mut steps: Vec<ImprovementStep> = Vec::with_capacity(instructions.len());
        let mut last_success: Option<(usize, String)> = None;

        for (position, instruction) in instructions.iter().enumerate() {
            let index = position + 1;
            if cancel.is_cancelled() {
                return Err(cancelled(index));
            }

            let (base, input) = match (mode, &last_success) {
                (ChainMode::Cumulative, Some((step, text))) => (StepBase::Step(*step), text.as_str()),
                _ => (StepBase::Original, base_text),
            };
            if mode == ChainMode::Cumulative && index > 1 && base != StepBase::Step(index - 1) {
                tracing::warn!(
                    step = index,
                    base = %base,
                    "Previous step failed; applying instruction to the last successful text"
                );
            }

            let request = self
                .generator
                .request_defaults()
                .label(format!("improvement {index}"))
                .system(self.config.system().clone())
                .user(prompts::improvement(instruction, input))
                .num_predict(*self.config.num_predict())
                .build()?;

            let outcome = match self.generator.generate(&request, cancel).await {
                Ok(result) if result.text().trim().is_empty() => StepOutcome::Failed {
                    error: "generation returned no text".to_string(),
                },
                Ok(result) => StepOutcome::Succeeded {
                    eval_count: *result.eval_count(),
                    prompt_eval_count: *result.prompt_eval_count(),
                    elapsed_secs: *result.elapsed_secs(),
                    text: result.into_text(),
                },
                Err(e) if e.is_cancelled() => return Err(cancelled(index)),
                Err(e) => StepOutcome::Failed {
                    error: e.to_string(),
                },
            };

            let mut step = ImprovementStep {
                index,
                instruction: instruction.clone(),
                base,
                outcome,
                path: None,
            };
            let path = self.sink.persist_step(&step).await?;
            step.path = Some(path);

            match &step.outcome {
                StepOutcome::Succeeded { text, .. } => {
                    tracing::info!(step = index, chars = text.chars().count(), "Improvement step succeeded");
                    last_success = Some((index, text.clone()));
                }
                StepOutcome::Failed { error } => {
                    tracing::error!(step = index, error = %error, "Improvement step failed, continuing chain");
                }
            }
            steps.push(step);
        }

        let summary = self.sink.persist_summary(mode, &steps).await?;
        let succeeded = steps.iter().filter(|s| s.succeeded()).count();
        tracing::info!(
            succeeded,
            failed = steps.len() - succeeded,
            summary = %summary.display(),
            "Improvement chain finished"
        );
        Ok(steps)
    }
}

#[track_caller]
fn cancelled(index: usize) -> saga_error::SagaError {
    tracing::warn!(step = index, "Improvement chain cancelled");
    NarrativeError::new(NarrativeErrorKind::Cancelled(format!("improvement step {index}"))).into()
}
