// Kit: ready-made components built on the component model

pub mod components;
pub mod theme;

pub use components::{Form, FormProps, Rule, RuleConfig, RuleUpdate, Tip, TipProps};
pub use theme::Theme;

use crate::component::ComponentRegistry;

/// Factories for the kit components, registered as `"tip"` and `"form"`
pub fn components() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry.register::<Tip>("tip").register::<Form>("form");
    registry
}

/// Re-export of common components for convenience
pub mod prelude {
    pub use crate::kit::components::form::{Form, FormProps};
    pub use crate::kit::components::tip::{Tip, TipProps};
    pub use crate::kit::theme::Theme;
}
