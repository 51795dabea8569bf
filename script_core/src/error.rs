//! Error types for the script event core.
//!
//! Scheduling mistakes surface synchronously as [`ScriptError`]. Failures
//! raised by callbacks never propagate; they are captured as
//! [`CallbackFailure`] records, reported on the host's error channel and
//! collected in the advance report.

use std::any::Any;

use thiserror::Error;

use crate::{TimerId, VirtualTime};

/// The top-level error type for the script event core.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A delay or interval outside its allowed range.
    #[error("invalid {name} {value}: {reason}")]
    InvalidArgument {
        name: &'static str,
        value: i64,
        reason: &'static str,
    },

    /// The host moved the clock backwards.
    #[error("clock regression: host supplied {requested} but the clock is already at {current}")]
    ClockRegression {
        requested: VirtualTime,
        current: VirtualTime,
    },

    /// `advance` was called from inside a callback of the same context.
    #[error("advance called while the context is already advancing")]
    ReentrantAdvance,

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A message batch from the host was not valid JSON.
    #[error("failed to decode message batch: {0}")]
    MessageDecode(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, ScriptError>`.
pub type Result<T> = std::result::Result<T, ScriptError>;

/// What a callback returns when it fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    /// Create a callback error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Recover a message from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("panicked: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("panicked: {}", s)
        } else {
            "panicked".to_string()
        };
        Self { message }
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

// Lets callbacks use `?` on the scheduling surface.
impl From<ScriptError> for CallbackError {
    fn from(err: ScriptError) -> Self {
        Self::new(err.to_string())
    }
}

/// Result type of every timer callback and message handler.
pub type CallbackResult = std::result::Result<(), CallbackError>;

/// Where a failing callback was registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOrigin {
    /// A timer callback.
    Timer(TimerId),

    /// A subscriber for the given message type.
    Handler { message_type: String },
}

impl std::fmt::Display for FailureOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureOrigin::Timer(id) => write!(f, "timer {}", id),
            FailureOrigin::Handler { message_type } => {
                write!(f, "handler for \"{}\"", message_type)
            }
        }
    }
}

/// A caught callback failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{origin} failed: {message}")]
pub struct CallbackFailure {
    pub origin: FailureOrigin,
    pub message: String,
}

impl CallbackFailure {
    pub fn new(origin: FailureOrigin, error: CallbackError) -> Self {
        Self {
            origin,
            message: error.message,
        }
    }
}
