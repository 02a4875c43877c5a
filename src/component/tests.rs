//! Tests for the component base

use crate::class::{ClassDef, ClassSpec};
use crate::component::{
    model_class, AnyComponent, Component, ComponentBase, ComponentError, ComponentRegistry, Context,
};
use crate::dom::Element;
use crate::events::{EventError, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// A simple counting button built on the component base
#[derive(Debug)]
struct CounterButton {
    base: ComponentBase,
    clicks: Arc<AtomicUsize>,
}

#[derive(Debug, Clone, Deserialize)]
struct CounterProps {
    label: String,
}

fn counter_model() -> ClassDef {
    model_class().derive_chained(
        ClassSpec::new("counter")
            .constructor(|this, args| {
                this.set("label", args.first().cloned().unwrap_or(Value::Null));
                Ok(())
            })
            .method("label", |this, _| Ok(this.get("label").cloned().unwrap_or_default())),
    )
}

impl Component for CounterButton {
    type Props = CounterProps;

    fn create(props: Self::Props, _context: &Context) -> Result<Self, ComponentError> {
        let root = Element::with_content("button", "counter", props.label.clone());
        let base = ComponentBase::new("counter", root, &counter_model(), &[json!(props.label)])?;
        base.expose("click", "click")?;

        let clicks = Arc::new(AtomicUsize::new(0));
        let c = clicks.clone();
        base.internal().respond("click", "count", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        })?;

        Ok(Self { base, clicks })
    }

    fn update(&mut self, props: Self::Props) -> Result<(), ComponentError> {
        self.base.set_field("label", props.label.clone())?;
        self.base.root().set_text(props.label);
        Ok(())
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }
}

fn counter(label: &str) -> CounterButton {
    CounterButton::create(
        CounterProps {
            label: label.to_string(),
        },
        &Context::new(),
    )
    .expect("counter should build")
}

#[test]
fn test_model_built_from_class() {
    let mut button = counter("Go");
    assert_eq!(button.base().field("label"), Some(json!("Go")));
    assert_eq!(button.base().model_call("label", &[]).unwrap(), json!("Go"));

    button
        .update(CounterProps {
            label: "Stop".to_string(),
        })
        .unwrap();
    assert_eq!(
        button.base().model_call("get", &[json!("label")]).unwrap(),
        json!("Stop")
    );
    assert_eq!(button.root().text(), "Stop");
}

#[test]
fn test_model_errors_surface_as_component_errors() {
    let button = counter("Go");
    assert!(matches!(
        button.base().model_call("missing", &[]),
        Err(ComponentError::Class(_))
    ));
    assert!(matches!(
        button.base().model_call("get", &[]),
        Err(ComponentError::Class(_))
    ));
}

#[test]
fn test_internal_and_external_responses_are_independent() {
    let button = counter("Go");
    let outside = Arc::new(AtomicUsize::new(0));
    let o = outside.clone();

    // Same handler name as the internal response.
    button
        .bind([(
            "click",
            Response::new("count", move |_| {
                o.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            }),
        )])
        .unwrap();

    assert!(!button.root().fire("click"));
    assert_eq!(button.clicks.load(Ordering::SeqCst), 1);
    assert_eq!(outside.load(Ordering::SeqCst), 1);

    button.unbind("click").unwrap();
    assert!(button.root().fire("click"));
    assert_eq!(button.clicks.load(Ordering::SeqCst), 2);
    assert_eq!(outside.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unknown_events_and_duplicates() {
    let button = counter("Go");

    assert!(matches!(
        button.bind([("hover", Response::new("h", |_| Ok(true)))]),
        Err(ComponentError::Event(EventError::NotFound { .. }))
    ));
    assert!(matches!(
        button.unbind("click"),
        Err(ComponentError::Event(EventError::NotSubscribed { .. }))
    ));
    assert!(matches!(
        button.base().expose("click", "click"),
        Err(ComponentError::Event(EventError::DuplicateRegistration { .. }))
    ));
    assert_eq!(button.events().names(), vec!["click".to_string()]);
}

#[test]
fn test_components_have_private_registries() {
    let first = counter("A");
    let second = counter("B");

    assert!(!Arc::ptr_eq(first.events(), second.events()));
    second.root().fire("click");
    assert_eq!(first.clicks.load(Ordering::SeqCst), 0);
    assert_eq!(second.clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_registry_creates_components_by_kind() {
    let mut registry = ComponentRegistry::new();
    registry.register::<CounterButton>("counter");
    assert!(registry.contains("counter"));
    assert_eq!(registry.kinds(), vec!["counter"]);

    let component = registry
        .create("counter", json!({ "label": "Go" }), &Context::new())
        .unwrap();
    let button = component
        .as_any()
        .downcast_ref::<CounterButton>()
        .expect("factory builds a CounterButton");
    assert_eq!(button.root().text(), "Go");

    let seen = Arc::new(AtomicUsize::new(0));
    let s = seen.clone();
    component
        .bind_responses(vec![(
            "click".to_string(),
            Response::new("seen", move |_| {
                s.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }),
        )])
        .unwrap();
    assert!(component.component_base().root().fire("click"));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(button.clicks.load(Ordering::SeqCst), 1);
    component.unbind_response("click").unwrap();
}

#[test]
fn test_registry_rejects_unknown_kind_and_bad_props() {
    let mut registry = ComponentRegistry::new();
    registry.register::<CounterButton>("counter");

    assert_eq!(
        registry
            .create("slider", json!({}), &Context::new())
            .unwrap_err(),
        ComponentError::UnknownKind("slider".to_string())
    );
    assert!(matches!(
        registry.create("counter", json!({ "label": 3 }), &Context::new()),
        Err(ComponentError::Config(_))
    ));
}
