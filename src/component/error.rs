//! Error types for component operations

use std::error::Error;
use std::fmt;

use crate::class::ClassError;
use crate::events::EventError;

/// Errors that can occur while building or wiring components
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// Error from the event layer
    Event(EventError),

    /// Error from a class definition
    Class(ClassError),

    /// Validation rule could not be built or updated
    InvalidRule { rule: String, reason: String },

    /// Props or theme could not be parsed
    Config(String),

    /// No factory registered for a component kind
    UnknownKind(String),

    /// Error acquiring lock
    LockError(String),
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(err) => write!(f, "Event error: {}", err),
            Self::Class(err) => write!(f, "Class error: {}", err),
            Self::InvalidRule { rule, reason } => write!(f, "Invalid rule '{}': {}", rule, reason),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::UnknownKind(kind) => write!(f, "Unknown component kind '{}'", kind),
            Self::LockError(msg) => write!(f, "Lock error: {}", msg),
        }
    }
}

impl Error for ComponentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Event(err) => Some(err),
            Self::Class(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EventError> for ComponentError {
    fn from(error: EventError) -> Self {
        ComponentError::Event(error)
    }
}

impl From<ClassError> for ComponentError {
    fn from(error: ClassError) -> Self {
        ComponentError::Class(error)
    }
}

impl From<serde_json::Error> for ComponentError {
    fn from(error: serde_json::Error) -> Self {
        ComponentError::Config(error.to_string())
    }
}
