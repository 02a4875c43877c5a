//! Component model
//!
//! Every component owns a [`ComponentBase`]: a root element (its view), a
//! model instance built from a [`ClassDef`], a private event registry that
//! exposes the component's events, and controllers over that registry.
//! Outside code subscribes to a component's events through
//! [`Component::bind`]; the component wires its own behaviour through an
//! internal controller so the two never disturb each other.

mod context;
mod error;
mod registry;

#[cfg(test)]
mod tests;

pub use context::Context;
pub use error::ComponentError;
pub use registry::{AnyComponent, ComponentRegistry};

use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use serde_json::Value;

use crate::class::{ClassDef, Instance};
use crate::dom::Element;
use crate::events::{Controller, EventChannel, EventInfo, EventRegistry, Response};

/// The root model class every component model derives from.
///
/// Provides `get(field)` and `set(field, value)`.
pub fn model_class() -> &'static ClassDef {
    static MODEL: OnceLock<ClassDef> = OnceLock::new();
    MODEL.get_or_init(|| {
        let mut model = ClassDef::root("model");
        model
            .define_method("get", |this, args| {
                let field = args.first().and_then(Value::as_str).ok_or("get expects a field name")?;
                Ok(this.get(field).cloned().unwrap_or(Value::Null))
            })
            .define_method("set", |this, args| {
                let field = args.first().and_then(Value::as_str).ok_or("set expects a field name")?;
                let value = args.get(1).cloned().unwrap_or(Value::Null);
                this.set(field.to_string(), value.clone());
                Ok(value)
            });
        model
    })
}

/// State shared by all components
pub struct ComponentBase {
    name: String,
    root: Arc<Element>,
    model: RwLock<Instance>,
    events: Arc<EventRegistry>,
    internal: Controller,
    external: Controller,
}

impl fmt::Debug for ComponentBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBase")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("events", &self.events.names())
            .finish()
    }
}

impl ComponentBase {
    /// Build a base around `root`, instantiating the model from `model`
    pub fn new(
        name: impl Into<String>,
        root: Arc<Element>,
        model: &ClassDef,
        args: &[Value],
    ) -> Result<Self, ComponentError> {
        let name = name.into();
        let events = EventRegistry::new(name.clone());
        let model = model.instantiate(args)?;

        log::debug!("component '{}' created on {:?}", name, root.tag());

        Ok(Self {
            internal: Controller::new(events.clone()),
            external: Controller::new(events.clone()),
            name,
            root,
            model: RwLock::new(model),
            events,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The component's view
    pub fn root(&self) -> &Arc<Element> {
        &self.root
    }

    /// Registry exposing the component's events
    pub fn events(&self) -> &Arc<EventRegistry> {
        &self.events
    }

    /// Expose `event_type` on the root element as the component event `name`
    pub fn expose(
        &self,
        event_type: &str,
        name: &str,
    ) -> Result<Arc<EventChannel>, ComponentError> {
        Ok(self
            .events
            .register(EventInfo::new(event_type, name, self.root.clone()))?)
    }

    /// Controller the component uses for its own behaviour
    pub fn internal(&self) -> &Controller {
        &self.internal
    }

    /// Call a model method
    pub fn model_call(&self, method: &str, args: &[Value]) -> Result<Value, ComponentError> {
        let mut model = self
            .model
            .write()
            .map_err(|e| ComponentError::LockError(e.to_string()))?;
        Ok(model.call(method, args)?)
    }

    /// Read a model field
    pub fn field(&self, name: &str) -> Option<Value> {
        self.model.read().ok()?.get(name).cloned()
    }

    /// Write a model field
    pub fn set_field(&self, name: &str, value: impl Into<Value>) -> Result<(), ComponentError> {
        self.model_call("set", &[Value::from(name), value.into()])
            .map(|_| ())
    }

    fn bind<I, K>(&self, mapping: I) -> Result<(), ComponentError>
    where
        I: IntoIterator<Item = (K, Response)>,
        K: Into<String>,
    {
        Ok(self.external.add_response(mapping)?)
    }

    fn unbind(&self, event: &str) -> Result<(), ComponentError> {
        Ok(self.external.remove_response(event)?)
    }
}

/// Component trait - implemented by all kit components
pub trait Component: Send + Sync {
    /// The props type for this component
    type Props: Clone + Send + Sync + 'static;

    /// Create a new component instance
    fn create(props: Self::Props, context: &Context) -> Result<Self, ComponentError>
    where
        Self: Sized;

    /// Update component with new props
    fn update(&mut self, props: Self::Props) -> Result<(), ComponentError>;

    fn base(&self) -> &ComponentBase;

    /// Root element of the component
    fn root(&self) -> &Arc<Element> {
        self.base().root()
    }

    /// Registry exposing the component's events
    fn events(&self) -> &Arc<EventRegistry> {
        self.base().events()
    }

    /// Subscribe to component events
    fn bind<I, K>(&self, mapping: I) -> Result<(), ComponentError>
    where
        I: IntoIterator<Item = (K, Response)>,
        K: Into<String>,
        Self: Sized,
    {
        self.base().bind(mapping)
    }

    /// Drop a subscription made through [`Component::bind`]
    fn unbind(&self, event: &str) -> Result<(), ComponentError> {
        self.base().unbind(event)
    }
}
