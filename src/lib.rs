// Core module of the nyui widget toolkit
pub mod class;
pub mod component;
pub mod dom;
pub mod events;
pub mod kit;

/// Version of the nyui toolkit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export of common types for convenience
pub mod prelude {
    pub use crate::class::{ClassDef, ClassError, ClassSpec, Instance};
    pub use crate::component::{Component, ComponentBase, ComponentError, Context};
    pub use crate::dom::Element;
    pub use crate::events::{
        Controller, EventArgs, EventChannel, EventError, EventInfo, EventRegistry, EventSource,
        Response, RunOutcome,
    };
    pub use crate::kit::prelude::*;
}

/// Errors that can occur in the toolkit
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Event error: {0}")]
    Event(#[from] events::EventError),

    #[error("Class error: {0}")]
    Class(#[from] class::ClassError),

    #[error("Component error: {0}")]
    Component(#[from] component::ComponentError),
}
