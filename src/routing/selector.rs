//! Rule selection for incoming requests.
//!
//! # Responsibilities
//! - Suppress decoy handling for ignored paths
//! - Match exact endpoint and method against non-default rules
//! - Fall back to the default rule when nothing matches
//!
//! # Design Decisions
//! - Endpoint and method matching are case-sensitive
//! - First declared rule wins
//! - Never mutates the template; safe to call from many tasks at once

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::template::schema::{Rule, Template, TemplateKind};

/// What the caller should do with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Selection<'a> {
    /// The path is on the ignore list; skip decoy handling entirely.
    Ignored,
    /// A non-default rule matched path and method.
    Matched(&'a Rule),
    /// Nothing matched; answer with the default rule.
    Default(&'a Rule),
    /// Shodan template; replay the banner captured for `ip`.
    Replay { ip: &'a str },
}

impl<'a> Selection<'a> {
    /// The rule to answer with, if any.
    pub fn rule(&self) -> Option<&'a Rule> {
        match *self {
            Selection::Matched(rule) | Selection::Default(rule) => Some(rule),
            Selection::Ignored | Selection::Replay { .. } => None,
        }
    }
}

/// Integrity faults. A validated template never produces these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("raw template has no default rule")]
    MissingDefault,
    #[error("template type {0:?} has no selectable rules")]
    Unselectable(Option<String>),
}

/// Returns true if decoy handling is suppressed for `path`.
pub fn is_ignored(template: &Template, path: &str) -> bool {
    template.ignore.iter().any(|p| p == path)
}

/// Pick the response descriptor for a request.
///
/// `path` is expected to be normalized by the caller.
pub fn select<'a>(
    template: &'a Template,
    path: &str,
    method: &str,
) -> Result<Selection<'a>, SelectError> {
    dispatch(template, is_ignored(template, path), || {
        template
            .requests
            .iter()
            .find(|rule| !rule.is_default() && rule.endpoint == path && rule.accepts(method))
    })
}

/// Shared decision once the caller knows whether the path is ignored.
///
/// `lookup` finds the matching non-default rule and only runs for raw
/// templates.
fn dispatch<'a>(
    template: &'a Template,
    ignored: bool,
    lookup: impl FnOnce() -> Option<&'a Rule>,
) -> Result<Selection<'a>, SelectError> {
    if ignored {
        return Ok(Selection::Ignored);
    }

    match &template.kind {
        Some(TemplateKind::Raw) => match lookup() {
            Some(rule) => Ok(Selection::Matched(rule)),
            None => template
                .default_rule()
                .map(Selection::Default)
                .ok_or(SelectError::MissingDefault),
        },
        Some(TemplateKind::Shodan) => Ok(Selection::Replay { ip: &template.ip }),
        Some(TemplateKind::Unknown(tag)) => Err(SelectError::Unselectable(Some(tag.clone()))),
        None => Err(SelectError::Unselectable(None)),
    }
}

/// A template compiled for lookups.
///
/// Holds the ignore list as a set and indexes non-default rules by
/// endpoint. Answers are identical to [`select`].
#[derive(Debug)]
pub struct Selector {
    template: Arc<Template>,
    ignore: HashSet<String>,
    /// endpoint -> indices into `template.requests`, in declared order
    endpoints: HashMap<String, Vec<usize>>,
}

impl Selector {
    /// Compile a selector from a template.
    pub fn new(template: Arc<Template>) -> Self {
        let ignore: HashSet<String> = template.ignore.iter().cloned().collect();

        let mut endpoints: HashMap<String, Vec<usize>> = HashMap::new();
        if template.is_raw() {
            for (index, rule) in template.requests.iter().enumerate() {
                if !rule.is_default() {
                    endpoints.entry(rule.endpoint.clone()).or_default().push(index);
                }
            }
        }

        tracing::debug!(
            endpoints = endpoints.len(),
            ignored = template.ignore.len(),
            "Selector compiled"
        );

        Self {
            template,
            ignore,
            endpoints,
        }
    }

    /// The template this selector was compiled from.
    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore.contains(path)
    }

    /// Pick the response descriptor for a request.
    pub fn select(&self, path: &str, method: &str) -> Result<Selection<'_>, SelectError> {
        let template = self.template.as_ref();
        dispatch(template, self.is_ignored(path), || {
            self.endpoints
                .get(path)
                .into_iter()
                .flatten()
                .map(|&index| &template.requests[index])
                .find(|rule| rule.accepts(method))
        })
    }
}
