//! Raw event sources
//!
//! A source is anything that can fire named UI events (`"click"`, `"submit"`,
//! ...) at listeners. Channels attach to a source through this trait and
//! detach from it again when they are released.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of a single listener attached to a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate a process-unique listener id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Listener callback. Returning `false` asks the source to suppress the
/// default action of the event.
pub type SourceCallback = Arc<dyn Fn() -> bool + Send + Sync>;

/// Shared handle to a source
pub type SourceHandle = Arc<dyn EventSource>;

/// Capability a raw event source must provide
pub trait EventSource: Send + Sync {
    /// Attach `callback` to every future firing of `event_type`.
    ///
    /// Earlier listeners for the same type stay attached.
    fn listen(&self, event_type: &str, callback: SourceCallback) -> ListenerId;

    /// Detach a listener. Returns `false` if it was not attached.
    fn unlisten(&self, id: ListenerId) -> bool;

    /// Short human readable description used in logs
    fn describe(&self) -> String {
        "source".to_string()
    }
}
