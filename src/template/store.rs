//! Shared, swappable template.
//!
//! Request handlers call [`TemplateStore::selector`] and keep the returned
//! `Arc` for the duration of one request. A reload publishes a new compiled
//! selector with a single atomic swap; in-flight requests finish against the
//! template they started with.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;

use crate::routing::Selector;
use crate::template::loader::{load_validated, TemplateError};
use crate::template::schema::Template;
use crate::template::validation::{validate, ValidationError};

/// Holds the active template.
#[derive(Debug)]
pub struct TemplateStore {
    current: ArcSwap<Selector>,
}

impl TemplateStore {
    /// Create a store from a template. The template must pass validation.
    pub fn new(template: Arc<Template>) -> Result<Self, ValidationError> {
        validate(&template)?;
        Ok(Self {
            current: ArcSwap::from_pointee(Selector::new(template)),
        })
    }

    /// Load, validate and publish a template file.
    pub fn open(path: &Path) -> Result<Self, TemplateError> {
        let template = load_validated(path)?;
        tracing::info!(
            path = %path.display(),
            kind = ?template.kind,
            rules = template.requests.len(),
            "Template active"
        );
        Ok(Self {
            current: ArcSwap::from_pointee(Selector::new(template)),
        })
    }

    /// The active selector.
    pub fn selector(&self) -> Arc<Selector> {
        self.current.load_full()
    }

    /// The active template.
    pub fn template(&self) -> Arc<Template> {
        Arc::clone(self.current.load().template())
    }

    /// Validate and publish a new template. On error the active template is
    /// left untouched.
    pub fn replace(&self, template: Arc<Template>) -> Result<(), ValidationError> {
        validate(&template)?;
        self.publish(template);
        Ok(())
    }

    /// Reload from disk. On error the active template is left untouched.
    pub fn reload(&self, path: &Path) -> Result<(), TemplateError> {
        match load_validated(path) {
            Ok(template) => {
                self.publish(template);
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Template reload failed. Keeping current template."
                );
                Err(e)
            }
        }
    }

    /// Publish templates received from a watcher until the channel closes.
    ///
    /// Each template is validated again; rejected ones are logged and
    /// skipped.
    pub async fn apply_updates(&self, mut updates: mpsc::UnboundedReceiver<Arc<Template>>) {
        while let Some(template) = updates.recv().await {
            if let Err(e) = self.replace(template) {
                tracing::error!(error = %e, "Rejected template update. Keeping current template.");
            }
        }
        tracing::debug!("Template update channel closed");
    }

    fn publish(&self, template: Arc<Template>) {
        let rules = template.requests.len();
        self.current.store(Arc::new(Selector::new(template)));
        tracing::info!(rules, "Template swapped");
    }
}
