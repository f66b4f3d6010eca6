//! Result and error types for gesture testing.

use thiserror::Error;

/// Result type for gesture operations
pub type GestureResult<T> = Result<T, GestureError>;

/// Errors that can occur while resolving, simulating, or running gesture tests
#[derive(Debug, Error)]
pub enum GestureError {
    /// A selector matched nothing in the DOM
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector (or point description) that failed to resolve
        selector: String,
    },

    /// A custom assertion predicate raised an error
    #[error("Assertion evaluation failed: {message}")]
    AssertionEvaluation {
        /// Error message
        message: String,
    },

    /// A lifecycle hook (setup, teardown, beforeAll, ...) failed
    #[error("Hook '{hook}' failed: {message}")]
    Hook {
        /// Hook name
        hook: String,
        /// Error message
        message: String,
    },

    /// Declarative test document is malformed
    #[error("Spec parse error: {message}")]
    SpecParse {
        /// Error message
        message: String,
    },

    /// A named callback is not present in the registry
    #[error("Unresolved callback '{name}' ({kind})")]
    UnresolvedCallback {
        /// Callback name referenced by the test document
        name: String,
        /// Kind of callback ("hook" or "predicate")
        kind: &'static str,
    },

    /// An automation run is already in flight
    #[error("Automation run already in progress")]
    AlreadyRunning,

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Test or gesture configuration is invalid
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// DOM backend error (query, geometry, or dispatch failed)
    #[error("DOM error: {message}")]
    Dom {
        /// Error message
        message: String,
    },

    /// Invalid state error (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GestureError {
    /// Create an element-not-found error
    #[must_use]
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Create a hook error
    #[must_use]
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Create a document parse error
    #[must_use]
    pub fn spec_parse(message: impl Into<String>) -> Self {
        Self::SpecParse {
            message: message.into(),
        }
    }

    /// Create a DOM backend error
    #[must_use]
    pub fn dom(message: impl Into<String>) -> Self {
        Self::Dom {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an assertion evaluation error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionEvaluation {
            message: message.into(),
        }
    }
}
