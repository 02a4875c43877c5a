//! Controllers
//!
//! A controller is one consumer's view of a registry. It remembers every
//! response it installed so it can take them down again without touching
//! handlers installed by anybody else.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::channel::{EventArgs, HandlerFn, HandlerKey, HandlerResult};
use super::error::EventError;
use super::registry::EventRegistry;

/// Identity of a controller, used to namespace its handler names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(u64);

impl ControllerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller#{}", self.0)
    }
}

/// A named handler to install on an event
#[derive(Clone)]
pub struct Response {
    handler_name: String,
    handler: HandlerFn,
}

impl Response {
    pub fn new<F>(handler_name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&EventArgs) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler_name: handler_name.into(),
            handler: Arc::new(handler),
        }
    }

    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    pub fn handler(&self) -> &HandlerFn {
        &self.handler
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("handler_name", &self.handler_name)
            .finish_non_exhaustive()
    }
}

/// Per-consumer facade over a registry
pub struct Controller {
    id: ControllerId,
    registry: Arc<EventRegistry>,
    responses: RwLock<HashMap<String, Response>>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.id)
            .field("registry", &self.registry.name())
            .field("responses", &self.subscriptions())
            .finish()
    }
}

impl Controller {
    /// Create a controller over `registry`
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self {
            id: ControllerId::next(),
            registry,
            responses: RwLock::new(HashMap::new()),
        }
    }

    /// Create a controller over [`EventRegistry::global`]
    pub fn with_global() -> Self {
        Self::new(EventRegistry::global())
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    /// Install one response per event.
    ///
    /// Every event must already be registered; if one is missing nothing is
    /// installed. A response replaces this controller's previous response
    /// for the same event.
    pub fn add_response<I, K>(&self, mapping: I) -> Result<(), EventError>
    where
        I: IntoIterator<Item = (K, Response)>,
        K: Into<String>,
    {
        let resolved = mapping
            .into_iter()
            .map(|(event, response)| {
                let event = event.into();
                self.registry
                    .get(&event)
                    .map(|channel| (event, channel, response))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut responses = self
            .responses
            .write()
            .map_err(|e| EventError::lock("controller responses", e))?;

        for (event, channel, response) in resolved {
            if let Some(previous) = responses.get(&event) {
                if previous.handler_name != response.handler_name {
                    channel.unbind_key(&self.key(&previous.handler_name));
                }
            }
            channel.bind_key(self.key(&response.handler_name), response.handler.clone());
            log::debug!(
                "{}: responding to '{}' with '{}'",
                self.id,
                event,
                response.handler_name
            );
            responses.insert(event, response);
        }

        Ok(())
    }

    /// Install a single response
    pub fn respond<F>(
        &self,
        event: impl Into<String>,
        handler_name: impl Into<String>,
        handler: F,
    ) -> Result<(), EventError>
    where
        F: Fn(&EventArgs) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_response([(event.into(), Response::new(handler_name, handler))])
    }

    /// Take down this controller's response to `event`.
    ///
    /// Fails with [`EventError::NotSubscribed`] if this controller never
    /// responded to it, and with [`EventError::Desynchronized`] if the
    /// registry no longer holds the handler this controller installed. The
    /// bookkeeping entry is dropped in both of the latter cases.
    pub fn remove_response(&self, event: &str) -> Result<(), EventError> {
        let removed = self
            .responses
            .write()
            .map_err(|e| EventError::lock("controller responses", e))?
            .remove(event)
            .ok_or_else(|| EventError::NotSubscribed {
                event: event.to_string(),
            })?;

        let desync = || EventError::Desynchronized {
            event: event.to_string(),
            handler: removed.handler_name.clone(),
        };

        let channel = self.registry.get(event).map_err(|_| desync())?;
        if !channel.unbind_key(&self.key(&removed.handler_name)) {
            return Err(desync());
        }

        log::debug!("{}: stopped responding to '{}'", self.id, event);
        Ok(())
    }

    pub fn is_subscribed(&self, event: &str) -> bool {
        self.responses
            .read()
            .map(|r| r.contains_key(event))
            .unwrap_or(false)
    }

    /// `(event, handler name)` pairs this controller installed, sorted by event
    pub fn subscriptions(&self) -> Vec<(String, String)> {
        let mut subscriptions: Vec<(String, String)> = self
            .responses
            .read()
            .map(|r| {
                r.iter()
                    .map(|(event, response)| (event.clone(), response.handler_name.clone()))
                    .collect()
            })
            .unwrap_or_default();
        subscriptions.sort();
        subscriptions
    }

    /// Take down every response this controller installed.
    ///
    /// Channels that have disappeared from the registry are skipped.
    pub fn clear(&self) {
        let drained: Vec<(String, Response)> = match self.responses.write() {
            Ok(mut responses) => responses.drain().collect(),
            Err(_) => return,
        };
        for (event, response) in drained {
            if let Ok(channel) = self.registry.get(&event) {
                channel.unbind_key(&self.key(&response.handler_name));
            }
        }
    }

    fn key(&self, handler_name: &str) -> HandlerKey {
        HandlerKey::new(Some(self.id), handler_name)
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.clear();
    }
}
