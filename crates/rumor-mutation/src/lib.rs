//! Rumor Mill Mutation Layer
//!
//! Pluggable content mutation applied when a rumor is retold.
//!
//! # Architecture
//!
//! This crate provides implementations of the `MutationStrategy` trait from
//! `rumor-domain`. Strategies are selected by configuration and never fail:
//! the external callback strategy falls back to a built-in one when the
//! callback errors or runs past its timeout.
//!
//! # Strategies
//!
//! - `WordSubstitutionStrategy`: softens certainty, place and time phrases
//! - `TemplateStrategy`: wraps the content in hearsay framing
//! - `ExternalCallbackStrategy`: delegates to a caller-supplied function
//!
//! # Examples
//!
//! ```
//! use rumor_mutation::WordSubstitutionStrategy;
//! use rumor_domain::traits::MutationStrategy;
//!
//! let strategy = WordSubstitutionStrategy::seeded(7);
//! let mutated = strategy.mutate("The king is ill", 1.0);
//! assert!(mutated.contains("might be"));
//! ```

#![warn(missing_docs)]

pub mod callback;
pub mod config;
pub mod template;
pub mod word;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use callback::{ExternalCallbackStrategy, MutationCallback};
pub use config::{StrategyConfig, StrategyKind};
pub use template::TemplateStrategy;
pub use word::WordSubstitutionStrategy;

/// Errors raised by an external mutation callback
///
/// These never escape a spread; they are logged and trigger the fallback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    /// The callback reported a failure or returned unusable text
    #[error("Mutation callback failed: {0}")]
    Callback(String),

    /// The callback did not answer in time
    #[error("Mutation callback timed out after {0:?}")]
    Timeout(Duration),
}

/// Mock mutation callback for deterministic testing
///
/// Returns a fixed response, optionally after a delay or as an error. Clones
/// share their call counter.
///
/// # Examples
///
/// ```
/// use rumor_mutation::MockCallback;
///
/// let mock = MockCallback::new("The king is dead");
/// assert_eq!(mock.call("The king is ill", 0.5).unwrap(), "The king is dead");
/// assert_eq!(mock.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockCallback {
    response: String,
    delay: Option<Duration>,
    fail: bool,
    call_count: Arc<Mutex<usize>>,
}

impl MockCallback {
    /// Create a mock that always answers with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            delay: None,
            fail: false,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a mock that always fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    /// Sleep for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times the callback was invoked
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock() = 0;
    }

    /// Invoke the mock directly
    pub fn call(&self, _content: &str, _strength: f64) -> Result<String, MutationError> {
        *self.call_count.lock() += 1;
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            return Err(MutationError::Callback("Mock error".to_string()));
        }
        Ok(self.response.clone())
    }

    /// Wrap the mock as a callback for `ExternalCallbackStrategy`
    pub fn into_callback(self) -> Arc<MutationCallback> {
        Arc::new(move |content: &str, strength: f64| self.call(content, strength))
    }
}

impl Default for MockCallback {
    fn default() -> Self {
        Self::new("Default mock mutation")
    }
}
