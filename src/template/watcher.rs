//! Template file watcher for hot reload.
//!
//! A save that renames a sibling file over the template replaces its inode.
//! The watch is placed on the template's directory and only events naming
//! the template file trigger a reload, so it survives any number of such
//! saves.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::template::loader::load_validated;
use crate::template::schema::Template;

/// Forwards each validated revision of a template file.
///
/// Revisions that fail to load or validate are logged and dropped, so the
/// receiver only ever sees templates that are safe to publish.
pub struct TemplateWatcher {
    path: PathBuf,
    file_name: OsString,
    updates: mpsc::UnboundedSender<Arc<Template>>,
}

impl TemplateWatcher {
    /// Create a watcher for `path` and the receiving end of its updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<Arc<Template>>) {
        let (updates, update_rx) = mpsc::unbounded_channel();
        let file_name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();

        (
            Self {
                path: path.to_path_buf(),
                file_name,
                updates,
            },
            update_rx,
        )
    }

    /// Start watching on notify's background thread.
    ///
    /// Watching stops when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = watch_dir(&self.path).to_path_buf();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_template_event(&event, &self.file_name) => self.reload(),
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), dir = %dir.display(), "Template watcher started");
        Ok(watcher)
    }

    fn reload(&self) {
        tracing::info!(path = %self.path.display(), "Template change detected, reloading");
        match load_validated(&self.path) {
            Ok(template) => {
                if self.updates.send(template).is_err() {
                    tracing::warn!(
                        path = %self.path.display(),
                        "Template update receiver is gone; dropping revision"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload template. Keeping current template.");
            }
        }
    }
}

/// Directory holding `path`. A bare file name lives in the working directory.
fn watch_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Returns true when `event` may have changed the file called `file_name`.
///
/// Content writes, creations and renames count; metadata-only changes and
/// removals do not.
fn is_template_event(event: &Event, file_name: &OsStr) -> bool {
    let relevant = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    relevant
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name))
}
