// Theme support for the kit

use serde::{Deserialize, Serialize};

use crate::component::ComponentError;

/// Defaults the kit components fall back to when their props leave a value
/// unset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Tag wrapping tip content
    pub tip_tag: String,
    /// Class of standalone tips
    pub tip_class: String,
    /// Tag of the tips a form shows next to invalid fields
    pub form_tip_tag: String,
    /// Class of the tips a form shows next to invalid fields
    pub form_tip_class: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            tip_tag: "p".to_string(),
            tip_class: "nyui-tip".to_string(),
            form_tip_tag: "p".to_string(),
            form_tip_class: "nyui-form-tip".to_string(),
        }
    }
}

impl Theme {
    /// Parse a theme; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ComponentError> {
        Ok(serde_json::from_str(json)?)
    }
}
