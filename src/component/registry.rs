//! Component factories keyed by kind name

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Component, ComponentBase, ComponentError, Context};
use crate::events::Response;

/// Type-erased view of a component, as returned by [`ComponentRegistry::create`]
pub trait AnyComponent: Send + Sync {
    fn component_base(&self) -> &ComponentBase;

    fn as_any(&self) -> &dyn Any;

    /// Subscribe to component events
    fn bind_responses(&self, mapping: Vec<(String, Response)>) -> Result<(), ComponentError> {
        self.component_base().bind(mapping)
    }

    /// Drop a subscription made through [`AnyComponent::bind_responses`]
    fn unbind_response(&self, event: &str) -> Result<(), ComponentError> {
        self.component_base().unbind(event)
    }
}

impl<C: Component + 'static> AnyComponent for C {
    fn component_base(&self) -> &ComponentBase {
        self.base()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for dyn AnyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.component_base(), f)
    }
}

/// Factory for creating component instances from JSON props
type ComponentFactory =
    Box<dyn Fn(Value, &Context) -> Result<Box<dyn AnyComponent>, ComponentError> + Send + Sync>;

/// Component factories by kind name
#[derive(Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, ComponentFactory>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `C` under `kind`; a previous factory for `kind` is replaced
    pub fn register<C>(&mut self, kind: impl Into<String>) -> &mut Self
    where
        C: Component + 'static,
        C::Props: DeserializeOwned,
    {
        let kind = kind.into();
        log::debug!("component kind '{}' registered", kind);
        self.components.insert(
            kind,
            Box::new(
                |props: Value, context: &Context| -> Result<Box<dyn AnyComponent>, ComponentError> {
                    let props: C::Props = serde_json::from_value(props)?;
                    Ok(Box::new(C::create(props, context)?))
                },
            ),
        );
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.components.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Create a component of `kind` from JSON props
    pub fn create(
        &self,
        kind: &str,
        props: Value,
        context: &Context,
    ) -> Result<Box<dyn AnyComponent>, ComponentError> {
        let factory = self
            .components
            .get(kind)
            .ok_or_else(|| ComponentError::UnknownKind(kind.to_string()))?;
        factory(props, context)
    }
}
