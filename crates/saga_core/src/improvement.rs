//! Improvement chain steps.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which text each improvement instruction is applied to.
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
pub enum ChainMode {
    /// Every instruction sees the untouched base text
    #[default]
    Original,
    /// Each instruction sees the previous successful output
    Cumulative,
}

/// The text a step was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum StepBase {
    /// The chain's base text
    #[display("base text")]
    Original,
    /// Output of an earlier step (1-based index)
    #[display("output of step {}", _0)]
    Step(usize),
}

/// What happened when a step ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The instruction produced text
    Succeeded {
        /// Transformed text
        text: String,
        /// Generated units
        eval_count: u64,
        /// Prompt units
        prompt_eval_count: u64,
        /// Call duration
        elapsed_secs: f64,
    },
    /// The instruction failed; the chain moved on
    Failed {
        /// Error description
        error: String,
    },
}

/// One transformation instruction and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementStep {
    /// 1-based position in the chain
    pub index: usize,
    /// Instruction text
    pub instruction: String,
    /// Text the instruction was applied to
    pub base: StepBase,
    /// Result of the call
    pub outcome: StepOutcome,
    /// Where the step was persisted
    pub path: Option<PathBuf>,
}

impl ImprovementStep {
    /// Whether the step produced text.
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, StepOutcome::Succeeded { .. })
    }

    /// Output text of a successful step.
    pub fn output(&self) -> Option<&str> {
        match &self.outcome {
            StepOutcome::Succeeded { text, .. } => Some(text),
            StepOutcome::Failed { .. } => None,
        }
    }

    /// Error text of a failed step.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            StepOutcome::Succeeded { .. } => None,
            StepOutcome::Failed { error } => Some(error),
        }
    }
}
