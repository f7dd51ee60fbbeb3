//! Pipeline-level error types.

/// Specific error conditions for pipeline and chain operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum NarrativeErrorKind {
    /// The scene plan contained no recognizable scene markers
    #[display("No scenes could be extracted from the scene plan")]
    NoScenesExtracted,

    /// A pipeline phase failed and the run was aborted
    #[display("Phase '{}' failed: {}", phase, message)]
    PhaseFailed {
        /// Phase name (bible, plan, scene 3, persist, ...)
        phase: String,
        /// Failure description
        message: String,
    },

    /// A pipeline stage transition was attempted out of order
    #[display("Invalid stage transition from {} to {}", from, to)]
    InvalidTransition {
        /// Current stage
        from: String,
        /// Requested stage
        to: String,
    },

    /// Blueprint text is empty or whitespace-only
    #[display("Blueprint '{}' is empty", _0)]
    EmptyBlueprint(String),

    /// An improvement chain was started without instructions
    #[display("Improvement chain has no instructions")]
    NoInstructions,

    /// Run was cancelled between or during phases
    #[display("Run cancelled during {}", _0)]
    Cancelled(String),
}

/// Error type for pipeline operations.
///
/// # Examples
///
/// ```
/// use saga_error::{NarrativeError, NarrativeErrorKind};
///
/// let err = NarrativeError::new(NarrativeErrorKind::NoScenesExtracted);
/// assert!(format!("{}", err).contains("No scenes"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Narrative Error: {} at line {} in {}", kind, line, file)]
pub struct NarrativeError {
    /// The specific error condition
    pub kind: NarrativeErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl NarrativeError {
    /// Create a new NarrativeError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: NarrativeErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
