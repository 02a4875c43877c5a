// End-to-end scenarios for the class and event layers

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use nyui::component::AnyComponent;
use nyui::prelude::*;
use serde_json::json;

fn click_registry() -> (Arc<EventRegistry>, Arc<Element>) {
    let registry = EventRegistry::new("scenarios");
    let source = Element::new("button");
    registry
        .register(EventInfo::new("click", "click", source.clone()))
        .expect("fresh registry accepts click");
    (registry, source)
}

// Firing the source runs the controller's handler and keeps the default.
#[test]
fn test_handler_allows_default() -> Result<(), nyui::Error> {
    let (registry, source) = click_registry();
    let controller = Controller::new(registry);
    let invoked = Arc::new(AtomicBool::new(false));

    let i = invoked.clone();
    controller.add_response([(
        "click",
        Response::new("h1", move |_| {
            i.store(true, Ordering::SeqCst);
            Ok(true)
        }),
    )])?;

    assert!(source.fire("click"));
    assert!(invoked.load(Ordering::SeqCst));
    Ok(())
}

// A handler returning false suppresses the default but still ran.
#[test]
fn test_handler_suppresses_default() -> Result<(), nyui::Error> {
    let (registry, source) = click_registry();
    let controller = Controller::new(registry);
    let invoked = Arc::new(AtomicBool::new(false));

    let i = invoked.clone();
    controller.add_response([(
        "click",
        Response::new("h1", move |_| {
            i.store(true, Ordering::SeqCst);
            Ok(false)
        }),
    )])?;

    assert!(!source.fire("click"));
    assert!(invoked.load(Ordering::SeqCst));
    Ok(())
}

// Two controllers picking the same handler name both keep their handler.
#[test]
fn test_shared_registry_same_handler_name() -> Result<(), nyui::Error> {
    let (registry, source) = click_registry();
    let first = Controller::new(registry.clone());
    let second = Controller::new(registry.clone());
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let c = first_calls.clone();
    first.add_response([(
        "click",
        Response::new("h1", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }),
    )])?;
    let c = second_calls.clone();
    second.add_response([(
        "click",
        Response::new("h1", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }),
    )])?;

    source.fire("click");
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);

    let channel = registry.get("click")?;
    let owners: Vec<_> = channel.handlers().iter().map(|k| k.owner()).collect();
    assert_eq!(owners, vec![Some(first.id()), Some(second.id())]);
    Ok(())
}

// A child's own method wins and the parent constructor is recorded.
#[test]
fn test_derived_class_overrides_and_links_parent() -> Result<(), nyui::Error> {
    let mut parent = ClassDef::root("P");
    parent.define_method("greet", |_, _| Ok(json!("p")));

    let child = parent.derive(ClassSpec::new("C").method("greet", |_, _| Ok(json!("c"))));
    let mut instance = child.instantiate(&[])?;

    assert_eq!(instance.call("greet", &[])?, json!("c"));
    assert!(child.is_derived_from(&parent));
    assert!(Arc::ptr_eq(
        child.super_constructor().expect("derived class has a parent"),
        parent.constructor()
    ));
    Ok(())
}

// add then remove leaves the channel without the handler.
#[test]
fn test_add_then_remove_response() -> Result<(), nyui::Error> {
    let (registry, source) = click_registry();
    let controller = Controller::new(registry.clone());

    controller.add_response([("click", Response::new("h", |_| Ok(false)))])?;
    controller.remove_response("click")?;

    let channel = registry.get("click")?;
    assert!(channel.handlers().iter().all(|key| key.name() != "h"));
    assert!(source.fire("click"));
    Ok(())
}

// Direct channel binds and controller binds coexist and report outcomes.
#[test]
fn test_run_outcome_collects_failures() -> Result<(), nyui::Error> {
    let (registry, _source) = click_registry();
    let channel = registry.get("click")?;
    channel.bind("ok", |_| Ok(true));
    channel.bind("broken", |_| Err("no database".to_string()));

    let controller = Controller::new(registry.clone());
    controller.respond("click", "veto", |_| Ok(false))?;

    let outcome = channel.run();
    assert_eq!(outcome.invoked, 3);
    assert!(!outcome.allowed);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].handler.name(), "broken");
    Ok(())
}

// A form component wired through its controller blocks invalid submits.
#[test]
fn test_form_blocks_invalid_submit() -> Result<(), nyui::Error> {
    let root = Element::new("form");
    let email = Element::new("input");
    email.set_class_name("required email");
    root.append_child(email.clone());

    let form = Form::create(FormProps::for_element(root.clone()), &Context::new())?;
    assert!(!form.submit());
    assert_eq!(form.error_for(&email).as_deref(), Some("This field is required."));

    email.set_value("someone@example.com");
    assert!(form.submit());
    assert_eq!(form.error_for(&email), None);
    Ok(())
}

// Kit components can be built by kind name from JSON props.
#[test]
fn test_kit_components_by_kind() -> Result<(), nyui::Error> {
    let kit = nyui::kit::components();
    assert_eq!(kit.kinds(), vec!["form", "tip"]);

    let tip = kit.create("tip", json!({ "text": "Saved", "class": "note" }), &Context::new())?;
    let tip = tip.as_any().downcast_ref::<Tip>().expect("tip kind builds a Tip");
    assert_eq!(tip.get(), "Saved");
    assert_eq!(tip.root().class_name(), "note");

    let form = kit.create("form", json!({}), &Context::new())?;
    assert_eq!(form.component_base().root().tag(), "form");
    Ok(())
}
