// Kit component module organization

pub mod form;
pub mod tip;

pub use form::{Form, FormProps, Rule, RuleConfig, RuleUpdate};
pub use tip::{Tip, TipProps};
