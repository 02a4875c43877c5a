//! Context handed to components at creation

use std::sync::Arc;

use crate::kit::Theme;

use super::ComponentError;

/// Shared creation context: carries the theme every component reads its
/// defaults from
#[derive(Debug, Clone, Default)]
pub struct Context {
    theme: Arc<Theme>,
}

impl Context {
    /// Context with the default theme
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(theme: Theme) -> Self {
        Self {
            theme: Arc::new(theme),
        }
    }

    /// Build a context from a JSON theme document
    pub fn from_json(json: &str) -> Result<Self, ComponentError> {
        Ok(Self::with_theme(Theme::from_json(json)?))
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}
