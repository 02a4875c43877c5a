//! Named collections of event channels

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use super::channel::EventChannel;
use super::error::EventError;
use super::source::SourceHandle;

/// Name of the process-wide default registry
pub const GLOBAL_REGISTRY_NAME: &str = "nyui";

/// Description of a channel to register
#[derive(Clone)]
pub struct EventInfo {
    /// Raw event type the source fires, e.g. `"click"`
    pub event_type: String,
    /// Name the channel is registered under
    pub name: String,
    /// Source to listen to
    pub source: SourceHandle,
}

impl EventInfo {
    pub fn new(
        event_type: impl Into<String>,
        name: impl Into<String>,
        source: SourceHandle,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            name: name.into(),
            source,
        }
    }
}

impl fmt::Debug for EventInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventInfo")
            .field("event_type", &self.event_type)
            .field("name", &self.name)
            .field("source", &self.source.describe())
            .finish()
    }
}

/// A named collection of channels
pub struct EventRegistry {
    name: String,
    channels: RwLock<HashMap<String, Arc<EventChannel>>>,
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("name", &self.name)
            .field("channels", &self.names())
            .finish()
    }
}

impl EventRegistry {
    /// Create an empty registry
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            channels: RwLock::new(HashMap::new()),
        })
    }

    /// The process-wide default registry.
    ///
    /// Created on first use and never dropped. Prefer passing a registry
    /// explicitly; this exists for consumers that have none to hand.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<EventRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| {
                log::debug!("initializing global registry '{}'", GLOBAL_REGISTRY_NAME);
                EventRegistry::new(GLOBAL_REGISTRY_NAME)
            })
            .clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach a new channel to `info.source` and register it under
    /// `info.name`.
    ///
    /// Fails with [`EventError::DuplicateRegistration`] if the name is taken;
    /// in that case nothing is attached to the source.
    pub fn register(&self, info: EventInfo) -> Result<Arc<EventChannel>, EventError> {
        let mut channels = self
            .channels
            .write()
            .map_err(|e| EventError::lock("registry channels", e))?;

        if channels.contains_key(&info.name) {
            return Err(EventError::DuplicateRegistration {
                registry: self.name.clone(),
                name: info.name,
            });
        }

        let channel = EventChannel::attach(info.source, info.event_type, info.name.clone());
        channels.insert(info.name, channel.clone());
        log::debug!("registry '{}': registered '{}'", self.name, channel.name());
        Ok(channel)
    }

    /// Register `info`, releasing and replacing any channel of the same name.
    pub fn replace(&self, info: EventInfo) -> Result<Arc<EventChannel>, EventError> {
        let mut channels = self
            .channels
            .write()
            .map_err(|e| EventError::lock("registry channels", e))?;

        if let Some(old) = channels.remove(&info.name) {
            log::warn!(
                "registry '{}': replacing channel '{}' ({} handler(s) dropped)",
                self.name,
                old.name(),
                old.len()
            );
            old.release();
        }

        let channel = EventChannel::attach(info.source, info.event_type, info.name.clone());
        channels.insert(info.name, channel.clone());
        Ok(channel)
    }

    /// Unregister a channel and release its raw listener.
    ///
    /// Unknown names are a no-op.
    pub fn remove(&self, name: &str) -> Option<Arc<EventChannel>> {
        let removed = self.channels.write().ok()?.remove(name)?;
        removed.release();
        log::debug!("registry '{}': removed '{}'", self.name, name);
        Some(removed)
    }

    /// Look up a channel by name
    pub fn get(&self, name: &str) -> Result<Arc<EventChannel>, EventError> {
        let channels = self
            .channels
            .read()
            .map_err(|e| EventError::lock("registry channels", e))?;

        channels
            .get(name)
            .cloned()
            .ok_or_else(|| EventError::NotFound {
                registry: self.name.clone(),
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels
            .read()
            .map(|c| c.contains_key(name))
            .unwrap_or(false)
    }

    /// Registered channel names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.channels.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for EventRegistry {
    fn drop(&mut self) {
        if let Ok(channels) = self.channels.get_mut() {
            for channel in channels.values() {
                channel.release();
            }
        }
    }
}
