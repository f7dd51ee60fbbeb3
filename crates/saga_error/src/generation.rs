//! Errors raised while driving the text-generation endpoint.

/// Specific failure conditions of a single generation call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Connection could not be established or broke mid-response
    #[display("Transport failure: {}", _0)]
    Transport(String),

    /// Endpoint answered with a non-success status
    #[display("Endpoint returned status {}: {}", status, body)]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Batch response body could not be decoded
    #[display("Failed to decode response: {}", _0)]
    Decode(String),

    /// The call produced no usable text
    #[display("Generation produced no usable text: {}", _0)]
    EmptyGeneration(String),

    /// The call was abandoned through its cancellation token
    #[display("Generation cancelled")]
    Cancelled,

    /// Requested model is not served by the endpoint
    #[display("Model not found: {}", _0)]
    ModelNotFound(String),
}

/// Generation error with location tracking.
///
/// # Examples
///
/// ```
/// use saga_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::Cancelled);
/// assert!(err.is_cancelled());
/// assert!(format!("{}", err).contains("cancelled"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The specific error condition
    pub kind: GenerationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether this error came from a fired cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, GenerationErrorKind::Cancelled)
    }
}
