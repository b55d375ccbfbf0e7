//! This module defines all error types used throughout the crate.

use crate::state_machine::StateClass;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A state name that is not part of the catalog
    #[error("Unknown state: {0}")]
    UnknownState(String),

    /// A state declared twice with conflicting classes
    #[error("State {name} already declared as {existing}, cannot redeclare as {requested}")]
    DuplicateState {
        name: String,
        existing: StateClass,
        requested: StateClass,
    },

    /// A transition record that cannot be part of the model
    #[error("Malformed transition: {0}")]
    MalformedTransition(String),

    /// An observed transition the model does not declare
    #[error("Illegal transition: {previous} --[{trigger}]--> {next}")]
    IllegalTransition {
        previous: String,
        trigger: String,
        next: String,
    },

    /// A trigger label no transition carries
    #[error("Unknown trigger: {0}")]
    UnknownTrigger(String),

    /// A trigger label declared both as a command and as an event
    #[error("Trigger {0} is declared both as a command and as an event")]
    AmbiguousTrigger(String),

    /// Model schema parsing errors
    #[error("Schema parsing error in {file:?}: {message}")]
    SchemaParse { file: PathBuf, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an unknown state error
    pub fn unknown_state(name: impl Into<String>) -> Self {
        Self::UnknownState(name.into())
    }

    /// Create a malformed transition error
    pub fn malformed_transition(msg: impl Into<String>) -> Self {
        Self::MalformedTransition(msg.into())
    }

    /// Attach the file a schema parse error came from; other errors pass through
    pub fn in_file(self, path: &Path) -> Self {
        match self {
            Error::SchemaParse { message, .. } => Error::SchemaParse {
                file: path.to_path_buf(),
                message,
            },
            other => other,
        }
    }

    /// Check if the error points at a state missing from the catalog
    pub fn is_unknown_state(&self) -> bool {
        matches!(self, Error::UnknownState(_))
    }
}

// Implement From traits for common external error types

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::SchemaParse {
            file: PathBuf::from("unknown"),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Custom(format!("TOML serialization error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SchemaParse {
            file: PathBuf::from("unknown"),
            message: format!("JSON error: {}", err),
        }
    }
}

// Helper macros for creating errors

/// Create a custom error with formatting
#[macro_export]
macro_rules! custom_error {
    ($($arg:tt)*) => {
        $crate::error::Error::Custom(format!($($arg)*))
    };
}

/// Bail with a custom error message
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::custom_error!($($arg)*))
    };
}

/// Ensure a condition is true or return error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($($arg)*);
        }
    };
}
