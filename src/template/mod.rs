//! Decoy template subsystem.
//!
//! # Data Flow
//! ```text
//! template file (YAML/TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Template (validated, immutable)
//!     → store.rs publishes it via Arc to request handlers
//!
//! On change:
//!     watcher.rs detects change
//!     → loader.rs loads new template
//!     → validation.rs validates
//!     → atomic swap in store.rs
//!     → new requests see the new template
//! ```
//!
//! # Design Decisions
//! - A template is immutable once loaded; changes require full reload
//! - Every key but a rule's `id` is optional in the file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::{load, load_bytes, load_file, load_str, load_validated};
pub use loader::{FormatError, LoadError, TemplateError, TemplateFormat};
pub use schema::{methods_as_strings, HttpMethod, ResponseType, Rule, Template, TemplateKind};
pub use schema::DEFAULT_RULE_ID;
pub use store::TemplateStore;
pub use validation::{validate, ValidationError};
pub use watcher::TemplateWatcher;
