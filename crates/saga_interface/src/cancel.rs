//! Cooperative cancellation for in-flight generation calls.

use tokio::sync::watch;

/// Cloneable handle used to abandon in-flight calls.
///
/// All clones observe the same state; cancelling any clone cancels them all.
///
/// # Examples
///
/// ```
/// use saga_interface::CancelToken;
///
/// let token = CancelToken::new();
/// let observer = token.clone();
/// assert!(!observer.is_cancelled());
/// token.cancel();
/// assert!(observer.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: std::sync::Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Create a token that has not fired.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: std::sync::Arc::new(sender),
        }
    }

    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the token fires; resolves immediately if it already has.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as self, so wait_for only errors if it is dropped.
        let _ = receiver.wait_for(|fired| *fired).await;
    }
}
