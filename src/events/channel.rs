//! Event channels
//!
//! A channel attaches to exactly one raw event source and fans every firing
//! out to a table of named handlers. Handler results are folded into one
//! boolean that tells the source whether to keep its default action.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::controller::ControllerId;
use super::source::{ListenerId, SourceHandle};

/// Result returned by a handler.
///
/// `Ok(false)` suppresses the default action, `Ok(true)` lets it happen.
pub type HandlerResult = Result<bool, String>;

/// Shared handler function
pub type HandlerFn = Arc<dyn Fn(&EventArgs) -> HandlerResult + Send + Sync>;

/// Argument record shared by every handler of one run
#[derive(Clone)]
pub struct EventArgs {
    /// Source the channel listens to
    pub source: SourceHandle,
    /// Raw event type, e.g. `"click"`
    pub event_type: String,
    /// Name of the channel in its registry
    pub event_name: String,
}

impl fmt::Debug for EventArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventArgs")
            .field("source", &self.source.describe())
            .field("event_type", &self.event_type)
            .field("event_name", &self.event_name)
            .finish()
    }
}

/// Key of a handler inside a channel.
///
/// Handlers bound directly on the channel have no owner. Handlers bound
/// through a controller are owned by it, so equal short names chosen by
/// different controllers never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    owner: Option<ControllerId>,
    name: String,
}

impl HandlerKey {
    pub(crate) fn new(owner: Option<ControllerId>, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }

    /// Controller that bound the handler, if any
    pub fn owner(&self) -> Option<ControllerId> {
        self.owner
    }

    /// Public short name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner {
            Some(owner) => write!(f, "{}/{}", owner, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A handler that returned an error or panicked during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub handler: HandlerKey,
    pub message: String,
}

/// Result of one channel run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// `false` if any handler returned `Ok(false)`
    pub allowed: bool,
    /// Number of handlers invoked
    pub invoked: usize,
    /// Handlers that failed; they do not vote on `allowed`
    pub failures: Vec<HandlerFailure>,
}

impl RunOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct HandlerEntry {
    key: HandlerKey,
    handler: HandlerFn,
}

/// A named wrapper around one raw event source binding
pub struct EventChannel {
    args: EventArgs,
    listener: ListenerId,
    bound: AtomicBool,
    handlers: RwLock<Vec<HandlerEntry>>,
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("event_name", &self.args.event_name)
            .field("event_type", &self.args.event_type)
            .field("source", &self.args.source.describe())
            .field("bound", &self.is_bound())
            .field("handlers", &self.handlers())
            .finish()
    }
}

impl EventChannel {
    /// Create a channel and attach it to `source` for `event_type`.
    ///
    /// The source only holds a weak reference back to the channel; once the
    /// last handle is dropped the listener is detached.
    pub fn attach(
        source: SourceHandle,
        event_type: impl Into<String>,
        event_name: impl Into<String>,
    ) -> Arc<Self> {
        let event_type = event_type.into();
        let event_name = event_name.into();

        let channel = Arc::new_cyclic(|weak: &std::sync::Weak<EventChannel>| {
            let weak = weak.clone();
            let listener = source.listen(
                &event_type,
                Arc::new(move || match weak.upgrade() {
                    Some(channel) => channel.fire(),
                    None => true,
                }),
            );

            Self {
                args: EventArgs {
                    source: source.clone(),
                    event_type: event_type.clone(),
                    event_name: event_name.clone(),
                },
                listener,
                bound: AtomicBool::new(true),
                handlers: RwLock::new(Vec::new()),
            }
        });

        log::debug!(
            "channel '{}' attached to {} ({}, {})",
            channel.args.event_name,
            channel.args.source.describe(),
            channel.args.event_type,
            channel.listener
        );
        channel
    }

    /// Channel name inside its registry
    pub fn name(&self) -> &str {
        &self.args.event_name
    }

    /// Raw event type the channel listens for
    pub fn event_type(&self) -> &str {
        &self.args.event_type
    }

    pub fn source(&self) -> &SourceHandle {
        &self.args.source
    }

    /// Argument record handed to every handler
    pub fn args(&self) -> &EventArgs {
        &self.args
    }

    /// Whether the raw listener is still attached
    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }

    /// Bind `handler` under `name`, replacing any handler already bound
    /// under that name.
    pub fn bind<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&EventArgs) -> HandlerResult + Send + Sync + 'static,
    {
        self.bind_key(HandlerKey::new(None, name), Arc::new(handler));
    }

    /// Remove the handler bound under `name`. Unknown names are a no-op.
    pub fn unbind(&self, name: &str) -> bool {
        self.unbind_key(&HandlerKey::new(None, name))
    }

    /// Whether a handler is bound directly under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.contains_key(&HandlerKey::new(None, name))
    }

    /// Keys of all bound handlers in binding order
    pub fn handlers(&self) -> Vec<HandlerKey> {
        self.handlers
            .read()
            .map(|h| h.iter().map(|e| e.key.clone()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.handlers.read().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn bind_key(&self, key: HandlerKey, handler: HandlerFn) {
        let Ok(mut handlers) = self.handlers.write() else {
            log::error!("channel '{}': handler table lock poisoned", self.name());
            return;
        };
        log::debug!("channel '{}': bind {}", self.args.event_name, key);
        match handlers.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.handler = handler,
            None => handlers.push(HandlerEntry { key, handler }),
        }
    }

    pub(crate) fn unbind_key(&self, key: &HandlerKey) -> bool {
        let Ok(mut handlers) = self.handlers.write() else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|e| &e.key != key);
        let removed = handlers.len() != before;
        if removed {
            log::debug!("channel '{}': unbind {}", self.args.event_name, key);
        }
        removed
    }

    pub(crate) fn contains_key(&self, key: &HandlerKey) -> bool {
        self.handlers
            .read()
            .map(|h| h.iter().any(|e| &e.key == key))
            .unwrap_or(false)
    }

    /// Run every handler bound at the moment of the call.
    ///
    /// All handlers run even after one returned `false` or failed. Bindings
    /// changed by a handler take effect from the next run.
    pub fn run(&self) -> RunOutcome {
        let snapshot: Vec<(HandlerKey, HandlerFn)> = match self.handlers.read() {
            Ok(handlers) => handlers
                .iter()
                .map(|e| (e.key.clone(), e.handler.clone()))
                .collect(),
            Err(_) => Vec::new(),
        };

        log::trace!(
            "channel '{}': running {} handler(s)",
            self.args.event_name,
            snapshot.len()
        );

        let mut outcome = RunOutcome {
            allowed: true,
            invoked: 0,
            failures: Vec::new(),
        };

        for (key, handler) in snapshot {
            outcome.invoked += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&self.args))) {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => outcome.allowed = false,
                Ok(Err(message)) => outcome.failures.push(HandlerFailure {
                    handler: key,
                    message,
                }),
                Err(payload) => outcome.failures.push(HandlerFailure {
                    handler: key,
                    message: panic_message(payload.as_ref()),
                }),
            }
        }

        outcome
    }

    /// Detach the raw listener from the source. Idempotent.
    pub fn release(&self) -> bool {
        if !self.bound.swap(false, Ordering::SeqCst) {
            return false;
        }
        let detached = self.args.source.unlisten(self.listener);
        log::debug!(
            "channel '{}' released from {} (detached: {})",
            self.args.event_name,
            self.args.source.describe(),
            detached
        );
        true
    }

    // Entry point used by the raw listener.
    fn fire(&self) -> bool {
        let outcome = self.run();
        for failure in &outcome.failures {
            log::warn!(
                "channel '{}': handler {} failed: {}",
                self.args.event_name,
                failure.handler,
                failure.message
            );
        }
        outcome.allowed
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        self.release();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
