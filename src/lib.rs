//! Decoy HTTP template engine.
//!
//! Loads a declarative template of fake endpoints and canned responses,
//! validates it, and answers "which rule serves this request" for the
//! serving layer.

pub mod observability;
pub mod routing;
pub mod settings;
pub mod template;

pub use routing::{SelectError, Selection, Selector};
pub use settings::Settings;
pub use template::{Rule, Template, TemplateError, TemplateStore, ValidationError};
