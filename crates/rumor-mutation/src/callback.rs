//! External callback strategy
//!
//! Delegates mutation to a caller-supplied function, typically a bridge to a
//! text generation service. The call runs on a helper thread and is bounded
//! by a timeout; on error or timeout the fallback strategy produces the text.

use crate::MutationError;
use rumor_domain::traits::{MutatedContent, MutationStrategy};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// Signature of an external mutation function
pub type MutationCallback = dyn Fn(&str, f64) -> Result<String, MutationError> + Send + Sync;

/// Mutation through an external callback with a deterministic fallback
pub struct ExternalCallbackStrategy {
    callback: Arc<MutationCallback>,
    timeout: Duration,
    fallback: Arc<dyn MutationStrategy>,
}

impl ExternalCallbackStrategy {
    /// Create a strategy around `callback`
    pub fn new(
        callback: Arc<MutationCallback>,
        timeout: Duration,
        fallback: Arc<dyn MutationStrategy>,
    ) -> Self {
        Self {
            callback,
            timeout,
            fallback,
        }
    }

    /// Name of the strategy used when the callback fails
    pub fn fallback_name(&self) -> &str {
        self.fallback.name()
    }

    /// Run the callback once, bounded by the timeout
    ///
    /// A callback that overruns keeps running on its helper thread; its
    /// result is discarded.
    pub fn try_callback(&self, content: &str, strength: f64) -> Result<String, MutationError> {
        let (tx, rx) = mpsc::channel();
        let callback = Arc::clone(&self.callback);
        let content = content.to_string();

        std::thread::spawn(move || {
            let outcome = callback(&content, strength);
            // The receiver is gone once the caller has timed out
            let _ = tx.send(outcome);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(text)) if text.trim().is_empty() => Err(MutationError::Callback(
                "callback returned empty content".to_string(),
            )),
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(MutationError::Timeout(self.timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(MutationError::Callback(
                "callback panicked".to_string(),
            )),
        }
    }
}

impl MutationStrategy for ExternalCallbackStrategy {
    fn name(&self) -> &str {
        "external_callback"
    }

    fn mutate(&self, content: &str, strength: f64) -> String {
        self.produce(content, strength).content
    }

    fn produce(&self, content: &str, strength: f64) -> MutatedContent {
        match self.try_callback(content, strength) {
            Ok(text) => MutatedContent {
                content: text,
                strategy: self.name().to_string(),
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = self.fallback.name(),
                    "Mutation callback failed, using fallback strategy"
                );
                self.fallback.produce(content, strength)
            }
        }
    }
}
