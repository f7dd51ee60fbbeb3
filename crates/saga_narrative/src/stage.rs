//! Forward-only lifecycle of a pipeline run.

use saga_error::{NarrativeError, NarrativeErrorKind};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum RunOutcome {
    /// Story and metadata were persisted
    #[display("success")]
    Success,
    /// A phase failed; nothing partial was persisted
    #[display("failure")]
    Failure,
}

/// Stage a pipeline run has reached.
///
/// Stages only move forward. Any non-terminal stage may jump straight to
/// `Terminal(Failure)`; `Terminal(Success)` is reachable only from `Persisted`.
///
/// # Examples
///
/// ```
/// use saga_narrative::{PipelineStage, RunOutcome};
///
/// let stage = PipelineStage::Idle.advance(PipelineStage::BibleReady).unwrap();
/// assert!(stage.advance(PipelineStage::ScenesReady).is_err());
/// assert_eq!(stage.fail(), PipelineStage::Terminal(RunOutcome::Failure));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PipelineStage {
    /// Nothing has run yet
    #[display("idle")]
    Idle,
    /// Bible generated or loaded
    #[display("bible-ready")]
    BibleReady,
    /// Plan generated or loaded and parsed
    #[display("plan-ready")]
    PlanReady,
    /// Every scene generated
    #[display("scenes-ready")]
    ScenesReady,
    /// Story and metadata written
    #[display("persisted")]
    Persisted,
    /// Run finished
    #[display("terminal ({})", _0)]
    Terminal(RunOutcome),
}

impl PipelineStage {
    /// The stage that normally follows this one.
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::BibleReady),
            Self::BibleReady => Some(Self::PlanReady),
            Self::PlanReady => Some(Self::ScenesReady),
            Self::ScenesReady => Some(Self::Persisted),
            Self::Persisted => Some(Self::Terminal(RunOutcome::Success)),
            Self::Terminal(_) => None,
        }
    }

    /// Whether the run has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for anything but the successor or, from a
    /// non-terminal stage, `Terminal(Failure)`.
    pub fn advance(self, next: Self) -> Result<Self, NarrativeError> {
        let allowed = self.successor() == Some(next)
            || (!self.is_terminal() && next == Self::Terminal(RunOutcome::Failure));
        if !allowed {
            return Err(NarrativeError::new(NarrativeErrorKind::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            }));
        }
        tracing::debug!(from = %self, to = %next, "Pipeline stage advanced");
        Ok(next)
    }

    /// Stage after a failure. Terminal stages stay where they are.
    pub fn fail(self) -> Self {
        if self.is_terminal() {
            self
        } else {
            Self::Terminal(RunOutcome::Failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_walks_every_stage() {
        let mut stage = PipelineStage::Idle;
        while let Some(next) = stage.successor() {
            stage = stage.advance(next).unwrap();
        }
        assert_eq!(stage, PipelineStage::Terminal(RunOutcome::Success));
    }

    #[test]
    fn stages_never_move_backwards() {
        let err = PipelineStage::PlanReady
            .advance(PipelineStage::BibleReady)
            .unwrap_err();
        assert!(matches!(err.kind, NarrativeErrorKind::InvalidTransition { .. }));
    }

    #[test]
    fn success_requires_persistence() {
        assert!(PipelineStage::ScenesReady
            .advance(PipelineStage::Terminal(RunOutcome::Success))
            .is_err());
    }

    #[test]
    fn terminal_stages_are_final() {
        let done = PipelineStage::Terminal(RunOutcome::Success);
        assert!(done.advance(PipelineStage::Terminal(RunOutcome::Failure)).is_err());
        assert_eq!(done.fail(), done);
    }
}
