//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! loader, validation, selector, store, watcher
//!     → tracing events with structured fields
//!     → logging.rs subscriber (EnvFilter + fmt layer)
//!     → stderr, pretty or JSON
//! ```
//!
//! # Design Decisions
//! - Library code only emits events; the binary installs the subscriber
//! - `RUST_LOG` overrides the configured level

pub mod logging;

pub use logging::{LogFormat, LoggingConfig};
