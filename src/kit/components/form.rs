// Form component for the kit

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;
use serde::Deserialize;

use super::tip::{tip_after, Tip, TipProps};
use crate::component::{model_class, Component, ComponentBase, ComponentError, Context};
use crate::dom::Element;

/// Tags treated as form fields
const FIELD_TAGS: [&str; 3] = ["input", "textarea", "select"];

/// Test a field must pass
pub type RuleTest = Arc<dyn Fn(&Element) -> bool + Send + Sync>;

/// A validation rule, applied to every field whose class list contains the
/// rule's name
#[derive(Clone)]
pub struct Rule {
    message: String,
    test: RuleTest,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Rule {
    pub fn new<F>(message: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Element) -> bool + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            test: Arc::new(test),
        }
    }

    /// A rule passing empty fields and fields whose value matches `pattern`
    pub fn pattern(
        name: &str,
        message: impl Into<String>,
        pattern: &str,
    ) -> Result<Self, ComponentError> {
        let regex = Regex::new(pattern).map_err(|e| ComponentError::InvalidRule {
            rule: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(message, move |field| {
            let value = field.value();
            value.is_empty() || regex.is_match(&value)
        }))
    }

    /// Field must not be empty
    pub fn required() -> Self {
        Self::new("This field is required.", |field| !field.value().is_empty())
    }

    /// Field must be empty or look like an email address
    pub fn email() -> Result<Self, ComponentError> {
        Self::pattern(
            "email",
            "Not a valid email address.",
            r"(?i)^[a-z0-9_+.-]+@([a-z0-9-]+\.)+[a-z0-9]{2,4}$",
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn check(&self, field: &Element) -> bool {
        (self.test)(field)
    }
}

/// Change to an existing rule, or the parts of a new one
#[derive(Clone, Default)]
pub struct RuleUpdate {
    pub message: Option<String>,
    pub test: Option<RuleTest>,
}

impl RuleUpdate {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            test: None,
        }
    }

    pub fn with_test<F>(mut self, test: F) -> Self
    where
        F: Fn(&Element) -> bool + Send + Sync + 'static,
    {
        self.test = Some(Arc::new(test));
        self
    }
}

/// Pattern rule as read from configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub message: String,
    pub pattern: String,
}

/// Properties for the Form component
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormProps {
    /// Existing form element to validate; a fresh `<form>` if unset
    #[serde(skip)]
    pub element: Option<Arc<Element>>,
    /// Tag of the error tips, theme default if unset
    pub tag: Option<String>,
    /// Class of the error tips, theme default if unset
    pub class: Option<String>,
    /// Extra pattern rules, added to or replacing the standard ones
    pub rules: BTreeMap<String, RuleConfig>,
}

impl FormProps {
    pub fn for_element(element: Arc<Element>) -> Self {
        Self {
            element: Some(element),
            ..Self::default()
        }
    }
}

struct FormState {
    root: Arc<Element>,
    context: Context,
    tip_tag: RwLock<String>,
    tip_class: RwLock<String>,
    rules: RwLock<Vec<(String, Rule)>>,
    tips: RwLock<HashMap<usize, Tip>>,
}

impl FormState {
    fn fields(&self) -> Vec<Arc<Element>> {
        self.root
            .descendants()
            .into_iter()
            .filter(|e| FIELD_TAGS.contains(&e.tag()))
            .collect()
    }

    fn tip_props(&self) -> TipProps {
        TipProps {
            text: None,
            tag: self.tip_tag.read().ok().map(|t| t.clone()),
            class: self.tip_class.read().ok().map(|c| c.clone()),
        }
    }

    /// Message of the last rule `field` fails, if any.
    ///
    /// A rule test that panics counts as a failure.
    fn failing_message(field: &Element, rules: &[(String, Rule)]) -> Option<String> {
        let mut message = None;
        for (name, rule) in rules {
            if !field.has_class(name) {
                continue;
            }
            let passed = panic::catch_unwind(AssertUnwindSafe(|| rule.check(field)))
                .unwrap_or_else(|_| {
                    log::warn!("rule '{}' panicked on <{}#{}>", name, field.tag(), field.id());
                    false
                });
            if !passed {
                message = Some(rule.message().to_string());
            }
        }
        message
    }

    fn check(&self) -> Result<bool, ComponentError> {
        let rules = self
            .rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        // Rule tests run before any tip is touched.
        let results: Vec<(Arc<Element>, Option<String>)> = self
            .fields()
            .into_iter()
            .map(|field| {
                let message = Self::failing_message(&field, &rules);
                (field, message)
            })
            .collect();

        let mut tips = self.tips.write().unwrap_or_else(PoisonError::into_inner);
        let mut valid = true;
        for (field, message) in results {
            let Some(message) = message else {
                if let Some(tip) = tips.get(&field.id()) {
                    tip.hide();
                }
                continue;
            };
            valid = false;

            let tip = match tips.entry(field.id()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    entry.insert(tip_after(&field, self.tip_props(), &self.context)?)
                }
            };
            tip.set(&message)?;
            tip.show();
        }

        log::debug!("form <{}#{}> checked: valid={}", self.root.tag(), self.root.id(), valid);
        Ok(valid)
    }
}

/// A form validator
///
/// Fields are validated by the rules named in their class list. `check`
/// shows an error tip after every failing field and hides the tips of fields
/// that pass again. The form exposes a `"submit"` event; its own response,
/// `form_submit`, suppresses submission while the form is invalid.
pub struct Form {
    base: ComponentBase,
    state: Arc<FormState>,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("base", &self.base)
            .field("rules", &self.rule_names())
            .finish()
    }
}

impl Form {
    /// Validate every field, updating error tips
    pub fn check(&self) -> Result<bool, ComponentError> {
        self.state.check()
    }

    /// Fire the form's submit event; returns whether submission may proceed
    pub fn submit(&self) -> bool {
        self.base.root().fire("submit")
    }

    /// Add new rules or override parts of existing ones.
    ///
    /// A new rule needs both a message and a test.
    pub fn set_rules<I, K>(&self, updates: I) -> Result<(), ComponentError>
    where
        I: IntoIterator<Item = (K, RuleUpdate)>,
        K: Into<String>,
    {
        let mut rules = self
            .state
            .rules
            .write()
            .map_err(|e| ComponentError::LockError(e.to_string()))?;

        for (name, update) in updates {
            let name = name.into();
            match rules.iter_mut().find(|(n, _)| *n == name) {
                Some((_, rule)) => {
                    if let Some(message) = update.message {
                        rule.message = message;
                    }
                    if let Some(test) = update.test {
                        rule.test = test;
                    }
                }
                None => {
                    let (Some(message), Some(test)) = (update.message, update.test) else {
                        return Err(ComponentError::InvalidRule {
                            rule: name,
                            reason: "a new rule needs a message and a test".to_string(),
                        });
                    };
                    rules.push((name, Rule { message, test }));
                }
            }
        }
        Ok(())
    }

    /// Add or replace a whole rule
    pub fn add_rule(&self, name: impl Into<String>, rule: Rule) -> Result<(), ComponentError> {
        self.set_rules([(
            name.into(),
            RuleUpdate {
                message: Some(rule.message),
                test: Some(rule.test),
            },
        )])
    }

    pub fn rule_names(&self) -> Vec<String> {
        self.state
            .rules
            .read()
            .map(|r| r.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default()
    }

    /// Message of the visible error tip after `field`, if any
    pub fn error_for(&self, field: &Element) -> Option<String> {
        let tips = self.state.tips.read().ok()?;
        tips.get(&field.id())
            .filter(|tip| tip.is_visible())
            .map(|tip| tip.get())
    }
}

impl Component for Form {
    type Props = FormProps;

    fn create(props: Self::Props, context: &Context) -> Result<Self, ComponentError> {
        let theme = context.theme();
        let root = props.element.unwrap_or_else(|| Element::new("form"));

        let mut rules = vec![
            ("required".to_string(), Rule::required()),
            ("email".to_string(), Rule::email()?),
        ];
        for (name, config) in props.rules {
            let rule = Rule::pattern(&name, config.message, &config.pattern)?;
            match rules.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = rule,
                None => rules.push((name, rule)),
            }
        }

        let state = Arc::new(FormState {
            root: root.clone(),
            context: context.clone(),
            tip_tag: RwLock::new(props.tag.unwrap_or_else(|| theme.form_tip_tag.clone())),
            tip_class: RwLock::new(props.class.unwrap_or_else(|| theme.form_tip_class.clone())),
            rules: RwLock::new(rules),
            tips: RwLock::new(HashMap::new()),
        });

        let base = ComponentBase::new("form", root, model_class(), &[])?;
        // Submission is modelled as the form element's own "submit" event.
        base.expose("submit", "submit")?;

        let weak = Arc::downgrade(&state);
        base.internal().respond("submit", "form_submit", move |_| match weak.upgrade() {
            Some(state) => match state.check() {
                Ok(valid) => Ok(valid),
                Err(e) => {
                    log::warn!("form validation failed, blocking submit: {}", e);
                    Ok(false)
                }
            },
            None => Ok(true),
        })?;

        Ok(Self { base, state })
    }

    fn update(&mut self, props: Self::Props) -> Result<(), ComponentError> {
        if let Some(tag) = props.tag {
            if let Ok(mut current) = self.state.tip_tag.write() {
                *current = tag;
            }
        }
        if let Some(class) = props.class {
            if let Ok(mut current) = self.state.tip_class.write() {
                *current = class;
            }
        }
        for (name, config) in props.rules {
            let rule = Rule::pattern(&name, config.message, &config.pattern)?;
            self.add_rule(name, rule)?;
        }
        Ok(())
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }
}
