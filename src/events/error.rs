//! Error types for the event layer

/// Errors raised by registries, channels and controllers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// A channel with this name is already registered
    #[error("event '{name}' is already registered in '{registry}'")]
    DuplicateRegistration { registry: String, name: String },

    /// No channel with this name is registered
    #[error("event '{name}' is not registered in '{registry}'")]
    NotFound { registry: String, name: String },

    /// The controller holds no response for this event
    #[error("controller is not subscribed to event '{event}'")]
    NotSubscribed { event: String },

    /// Controller bookkeeping and channel state disagree
    #[error("controller bookkeeping for '{event}' (handler '{handler}') does not match the registry")]
    Desynchronized { event: String, handler: String },

    /// A lock guarding shared state was poisoned
    #[error("lock error: {0}")]
    Lock(String),
}

impl EventError {
    pub(crate) fn lock<E: std::fmt::Display>(what: &str, err: E) -> Self {
        Self::Lock(format!("failed to lock {}: {}", what, err))
    }
}
