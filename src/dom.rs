//! In-memory element tree
//!
//! `Element` is the DOM-like primitive the kit components are built on. It
//! keeps the handful of properties the widgets need (tag, classes, text,
//! value, visibility, children) and implements [`EventSource`] so channels
//! can listen to it.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::events::{EventSource, ListenerId, SourceCallback};

struct Listener {
    id: ListenerId,
    event_type: String,
    callback: SourceCallback,
}

/// A node in the element tree
pub struct Element {
    id: usize,
    tag: String,
    attributes: RwLock<HashMap<String, String>>,
    text: RwLock<String>,
    value: RwLock<String>,
    visible: AtomicBool,
    parent: RwLock<Weak<Element>>,
    children: RwLock<Vec<Arc<Element>>>,
    listeners: RwLock<Vec<Listener>>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("class", &self.class_name())
            .field("text", &self.text())
            .field("visible", &self.is_visible())
            .field("children", &self.children().len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Element {
    /// Create a detached, visible element
    pub fn new(tag: impl Into<String>) -> Arc<Self> {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

        Arc::new(Self {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            tag: tag.into(),
            attributes: RwLock::new(HashMap::new()),
            text: RwLock::new(String::new()),
            value: RwLock::new(String::new()),
            visible: AtomicBool::new(true),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Create an element with a class attribute and text content
    pub fn with_content(
        tag: impl Into<String>,
        class_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Arc<Self> {
        let element = Self::new(tag);
        element.set_class_name(class_name);
        element.set_text(text);
        element
    }

    /// Unique element id
    pub fn id(&self) -> usize {
        self.id
    }

    /// Tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes
            .read()
            .ok()
            .and_then(|attrs| attrs.get(name).cloned())
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut attrs) = self.attributes.write() {
            attrs.insert(name.into(), value.into());
        }
    }

    /// Space separated class list
    pub fn class_name(&self) -> String {
        self.attribute("class").unwrap_or_default()
    }

    pub fn set_class_name(&self, class_name: impl Into<String>) {
        self.set_attribute("class", class_name);
    }

    /// Whether `class` appears as a whole word in the class list
    pub fn has_class(&self, class: &str) -> bool {
        self.class_name().split_whitespace().any(|c| c == class)
    }

    pub fn add_class(&self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes = self.class_name();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        self.set_class_name(classes);
    }

    pub fn text(&self) -> String {
        self.text.read().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        if let Ok(mut current) = self.text.write() {
            *current = text.into();
        }
    }

    /// Form field value
    pub fn value(&self) -> String {
        self.value.read().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        if let Ok(mut current) = self.value.write() {
            *current = value.into();
        }
    }

    pub fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
    }

    pub fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Parent element, if attached and still alive
    pub fn parent(&self) -> Option<Arc<Element>> {
        self.parent.read().ok().and_then(|p| p.upgrade())
    }

    /// Snapshot of the children
    pub fn children(&self) -> Vec<Arc<Element>> {
        self.children
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Append `child` as the last child, detaching it from any previous parent
    pub fn append_child(self: &Arc<Self>, child: Arc<Element>) {
        child.detach();
        if let Ok(mut parent) = child.parent.write() {
            *parent = Arc::downgrade(self);
        }
        if let Ok(mut children) = self.children.write() {
            children.push(child);
        }
    }

    /// Insert `sibling` directly after this element in its parent.
    ///
    /// Returns `false` when this element has no parent.
    pub fn insert_after(&self, sibling: Arc<Element>) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        sibling.detach();
        if let Ok(mut slot) = sibling.parent.write() {
            *slot = Arc::downgrade(&parent);
        }
        let Ok(mut children) = parent.children.write() else {
            return false;
        };
        let position = children
            .iter()
            .position(|c| c.id == self.id)
            .map(|i| i + 1)
            .unwrap_or(children.len());
        children.insert(position, sibling);
        true
    }

    /// Remove this element from its parent
    pub fn detach(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        if let Ok(mut children) = parent.children.write() {
            children.retain(|c| c.id != self.id);
        }
        if let Ok(mut slot) = self.parent.write() {
            *slot = Weak::new();
        }
    }

    /// All descendants in document order
    pub fn descendants(&self) -> Vec<Arc<Element>> {
        let mut found = Vec::new();
        for child in self.children() {
            found.push(child.clone());
            found.extend(child.descendants());
        }
        found
    }

    /// Descendants carrying `class`, in document order
    pub fn find_by_class(&self, class: &str) -> Vec<Arc<Element>> {
        self.descendants()
            .into_iter()
            .filter(|e| e.has_class(class))
            .collect()
    }

    /// Number of attached listeners across all event types
    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Fire `event_type` at every listener attached for it.
    ///
    /// Every listener runs. Returns `false` when at least one of them asked
    /// to suppress the default action.
    pub fn fire(&self, event_type: &str) -> bool {
        let callbacks: Vec<SourceCallback> = match self.listeners.read() {
            Ok(listeners) => listeners
                .iter()
                .filter(|l| l.event_type == event_type)
                .map(|l| l.callback.clone())
                .collect(),
            Err(_) => return true,
        };

        log::trace!(
            "<{}#{}> firing {} to {} listener(s)",
            self.tag,
            self.id,
            event_type,
            callbacks.len()
        );

        let mut allow_default = true;
        for callback in callbacks {
            if !callback() {
                allow_default = false;
            }
        }
        allow_default
    }
}

impl EventSource for Element {
    fn listen(&self, event_type: &str, callback: SourceCallback) -> ListenerId {
        let id = ListenerId::next();
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push(Listener {
                id,
                event_type: event_type.to_string(),
                callback,
            });
        }
        id
    }

    fn unlisten(&self, id: ListenerId) -> bool {
        match self.listeners.write() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|l| l.id != id);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    fn describe(&self) -> String {
        format!("<{}#{}>", self.tag, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_fire_runs_every_listener() {
        let element = Element::new("button");
        let calls = Arc::new(AtomicUsize::new(0));

        for allow in [true, false, true] {
            let calls = calls.clone();
            element.listen(
                "click",
                Arc::new(move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    allow
                }),
            );
        }

        assert!(!element.fire("click"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(element.fire("keyup"));
    }

    #[test]
    fn test_unlisten_detaches_only_that_listener() {
        let element = Element::new("div");
        let first = element.listen("click", Arc::new(|| false));
        element.listen("click", Arc::new(|| true));

        assert!(!element.fire("click"));
        assert!(element.unlisten(first));
        assert!(!element.unlisten(first));
        assert!(element.fire("click"));
        assert_eq!(element.listener_count(), 1);
    }

    #[test]
    fn test_tree_operations() {
        let form = Element::new("form");
        let name = Element::new("input");
        let email = Element::new("input");
        form.append_child(name.clone());
        form.append_child(email.clone());

        let tip = Element::with_content("p", "tip", "oops");
        assert!(name.insert_after(tip.clone()));

        let ids: Vec<usize> = form.children().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![name.id(), tip.id(), email.id()]);
        assert_eq!(tip.parent().map(|p| p.id()), Some(form.id()));

        let tips: Vec<usize> = form.find_by_class("tip").iter().map(|e| e.id()).collect();
        assert_eq!(tips, vec![tip.id()]);

        tip.detach();
        assert_eq!(form.children().len(), 2);
        assert!(!Element::new("p").insert_after(Element::new("p")));
    }

    #[test]
    fn test_classes() {
        let field = Element::new("input");
        field.set_class_name("required wide");
        field.add_class("email");
        field.add_class("email");

        assert_eq!(field.class_name(), "required wide email");
        assert!(field.has_class("wide"));
        assert!(!field.has_class("wid"));
    }
}
