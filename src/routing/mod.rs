//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path, method)
//!     → selector.rs (ignore list, then rule lookup)
//!     → Return: Ignored, matched Rule, default Rule or Replay
//!
//! Selector compilation (at startup and on reload):
//!     validated Template
//!     → hash the ignore list
//!     → index non-default rules by endpoint
//!     → freeze as immutable Selector
//! ```
//!
//! # Design Decisions
//! - Selectors compiled once per template, immutable at runtime
//! - Exact path matching only; no prefixes or patterns
//! - Deterministic: same input always selects the same rule
//! - Missing default surfaces as an error rather than a silent empty rule

pub mod selector;

pub use selector::{is_ignored, select, SelectError, Selection, Selector};
