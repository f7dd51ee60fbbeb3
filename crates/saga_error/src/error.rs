//! Top-level error wrapper types.

use crate::{BuilderError, ConfigError, GenerationError, NarrativeError, StorageError};

/// Every error condition the workspace can surface.
///
/// # Examples
///
/// ```
/// use saga_error::{SagaError, ConfigError};
///
/// let err: SagaError = ConfigError::new("missing model").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum SagaErrorKind {
    /// Generation endpoint error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Artifact storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Pipeline or chain error
    #[from(NarrativeError)]
    Narrative(NarrativeError),
}

/// Saga error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Saga Error: {}", _0)]
pub struct SagaError(Box<SagaErrorKind>);

impl SagaError {
    /// Create a new error from a kind.
    pub fn new(kind: SagaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &SagaErrorKind {
        &self.0
    }

    /// Whether the error originates from a fired cancellation token.
    pub fn is_cancelled(&self) -> bool {
        match self.kind() {
            SagaErrorKind::Generation(e) => e.is_cancelled(),
            SagaErrorKind::Narrative(e) => {
                matches!(e.kind, crate::NarrativeErrorKind::Cancelled(_))
            }
            _ => false,
        }
    }
}

// Generic From implementation for any type that converts to SagaErrorKind
impl<T> From<T> for SagaError
where
    T: Into<SagaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Saga operations.
pub type SagaResult<T> = std::result::Result<T, SagaError>;
