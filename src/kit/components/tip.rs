// Tip component for the kit

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};

use crate::class::{ClassDef, ClassSpec};
use crate::component::{model_class, Component, ComponentBase, ComponentError, Context};
use crate::dom::Element;

/// Properties for the Tip component
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TipProps {
    /// Text content of the tip
    pub text: Option<String>,
    /// Tag wrapping the content, theme default if unset
    pub tag: Option<String>,
    /// Class of the wrapping element, theme default if unset
    pub class: Option<String>,
}

impl TipProps {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

fn tip_model() -> &'static ClassDef {
    static MODEL: OnceLock<ClassDef> = OnceLock::new();
    MODEL.get_or_init(|| {
        model_class().derive_chained(ClassSpec::new("tip").constructor(|this, args| {
            this.set("text", args.first().cloned().unwrap_or_else(|| json!("")));
            Ok(())
        }))
    })
}

/// A small text element, hidden until shown
///
/// The tip exposes one event, `"click"`, fired when its element is clicked.
///
/// ```
/// use nyui::component::{Component, Context};
/// use nyui::events::Response;
/// use nyui::kit::{Tip, TipProps};
///
/// let tip = Tip::create(TipProps::text("Saved"), &Context::new()).unwrap();
/// tip.bind([("click", Response::new("dismiss", |_| Ok(true)))]).unwrap();
/// tip.show();
/// assert!(tip.root().fire("click"));
/// ```
#[derive(Debug)]
pub struct Tip {
    base: ComponentBase,
}

impl Tip {
    /// Replace the tip text
    pub fn set(&self, text: &str) -> Result<(), ComponentError> {
        self.base.set_field("text", text)?;
        self.base.root().set_text(text);
        Ok(())
    }

    /// Current tip text
    pub fn get(&self) -> String {
        self.base
            .field("text")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn show(&self) {
        self.base.root().show();
    }

    pub fn hide(&self) {
        self.base.root().hide();
    }

    pub fn is_visible(&self) -> bool {
        self.base.root().is_visible()
    }
}

impl Component for Tip {
    type Props = TipProps;

    fn create(props: Self::Props, context: &Context) -> Result<Self, ComponentError> {
        let theme = context.theme();
        let text = props.text.unwrap_or_default();
        let root = Element::with_content(
            props.tag.unwrap_or_else(|| theme.tip_tag.clone()),
            props.class.unwrap_or_else(|| theme.tip_class.clone()),
            text.clone(),
        );
        root.hide();

        let base = ComponentBase::new("tip", root, tip_model(), &[Value::from(text)])?;
        base.expose("click", "click")?;
        Ok(Self { base })
    }

    /// Update text and class. The tag is fixed at creation; asking for a
    /// different one is a [`ComponentError::Config`] and changes nothing.
    fn update(&mut self, props: Self::Props) -> Result<(), ComponentError> {
        if let Some(tag) = props.tag.as_deref().filter(|t| *t != self.base.root().tag()) {
            return Err(ComponentError::Config(format!(
                "tip tag is fixed at <{}>, cannot change to <{}>",
                self.base.root().tag(),
                tag
            )));
        }
        if let Some(text) = props.text {
            self.set(&text)?;
        }
        if let Some(class) = props.class {
            self.base.root().set_class_name(class);
        }
        Ok(())
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }
}

/// Create a tip and place it right after `anchor`
pub(crate) fn tip_after(
    anchor: &Arc<Element>,
    props: TipProps,
    context: &Context,
) -> Result<Tip, ComponentError> {
    let tip = Tip::create(props, context)?;
    if !anchor.insert_after(tip.root().clone()) {
        log::debug!("tip anchor <{}> has no parent, tip left detached", anchor.tag());
    }
    Ok(tip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Response;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_tip_defaults_from_theme() {
        let tip = Tip::create(TipProps::text("hello"), &Context::new()).unwrap();
        assert_eq!(tip.get(), "hello");
        assert_eq!(tip.root().tag(), "p");
        assert_eq!(tip.root().class_name(), "nyui-tip");
        assert_eq!(tip.root().text(), "hello");
        assert!(!tip.is_visible());
    }

    #[test]
    fn test_set_show_hide() {
        let props = TipProps {
            tag: Some("span".to_string()),
            class: Some("warn".to_string()),
            ..TipProps::default()
        };
        let tip = Tip::create(props, &Context::new()).unwrap();
        assert_eq!(tip.get(), "");

        tip.set("careful").unwrap();
        tip.show();
        assert_eq!(tip.get(), "careful");
        assert_eq!(tip.root().text(), "careful");
        assert_eq!(tip.root().tag(), "span");
        assert!(tip.is_visible());

        tip.hide();
        assert!(!tip.is_visible());
    }

    #[test]
    fn test_click_event_reaches_bound_response() {
        let tip = Tip::create(TipProps::text("x"), &Context::new()).unwrap();
        let clicked = Arc::new(AtomicBool::new(false));
        let c = clicked.clone();
        tip.bind([(
            "click",
            Response::new("on_click", move |args| {
                assert_eq!(args.event_name, "click");
                c.store(true, Ordering::SeqCst);
                Ok(false)
            }),
        )])
        .unwrap();

        assert!(!tip.root().fire("click"));
        assert!(clicked.load(Ordering::SeqCst));

        tip.unbind("click").unwrap();
        assert!(tip.root().fire("click"));
    }

    #[test]
    fn test_props_from_json() {
        let props: TipProps = serde_json::from_str(r#"{ "text": "hi", "class": "c" }"#).unwrap();
        let mut tip = Tip::create(props, &Context::new()).unwrap();
        assert_eq!(tip.root().class_name(), "c");

        tip.update(TipProps::text("bye")).unwrap();
        assert_eq!(tip.get(), "bye");
    }

    #[test]
    fn test_update_rejects_tag_change() {
        let mut tip = Tip::create(TipProps::text("hi"), &Context::new()).unwrap();

        let retag = TipProps {
            text: Some("ignored".to_string()),
            tag: Some("span".to_string()),
            ..TipProps::default()
        };
        assert!(matches!(tip.update(retag), Err(ComponentError::Config(_))));
        assert_eq!(tip.get(), "hi");
        assert_eq!(tip.root().tag(), "p");

        let same_tag = TipProps {
            text: Some("still p".to_string()),
            tag: Some("p".to_string()),
            ..TipProps::default()
        };
        tip.update(same_tag).unwrap();
        assert_eq!(tip.get(), "still p");
    }
}
