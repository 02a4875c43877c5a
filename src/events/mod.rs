//! Named event dispatch
//!
//! The event layer is built from three pieces:
//! - [`EventChannel`] listens to one raw source and fans each firing out to
//!   named handlers, folding their results into one allow/suppress verdict
//! - [`EventRegistry`] names channels and owns their lifetime
//! - [`Controller`] gives each consumer its own set of responses on a shared
//!   registry

pub mod channel;
pub mod controller;
pub mod error;
pub mod registry;
pub mod source;

pub use channel::{
    EventArgs, EventChannel, HandlerFailure, HandlerFn, HandlerKey, HandlerResult, RunOutcome,
};
pub use controller::{Controller, ControllerId, Response};
pub use error::EventError;
pub use registry::{EventInfo, EventRegistry, GLOBAL_REGISTRY_NAME};
pub use source::{EventSource, ListenerId, SourceCallback, SourceHandle};
