//! Template validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Uniqueness of rule ids and endpoints
//! - Presence and completeness of the default rule
//! - Well-formedness of the ignore list
//!
//! # Design Decisions
//! - Stops at the first violation; there is no aggregate report
//! - Every check is a pure function of the template and can be run alone
//! - Runs before a template is handed to the selector

use std::collections::HashSet;

use thiserror::Error;

use crate::template::schema::{Rule, Template, TemplateKind, DEFAULT_RULE_ID};

/// A semantic problem found in a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing template type")]
    MissingType,
    #[error("request id `{id}` is not unique")]
    DuplicateId { id: String },
    #[error("request endpoint `{endpoint}` is not unique")]
    DuplicateEndpoint { endpoint: String },
    #[error("missing default request")]
    MissingDefault,
    #[error("missing id in request #{index}")]
    MissingId { index: usize },
    #[error("missing endpoint in request with id `{id}`")]
    MissingEndpoint { id: String },
    #[error("missing methods in request with id `{id}`")]
    MissingMethods { id: String },
    #[error("missing response type in request with id `{id}`")]
    MissingResponseType { id: String },
    #[error("missing content type in request with id `{id}`")]
    MissingContentType { id: String },
    #[error("missing content in request with id `{id}`")]
    MissingContent { id: String },
    #[error("duplicate path `{path}` in ignore list")]
    DuplicateIgnorePath { path: String },
    #[error("ignored path `{path}` must start with a forward slash")]
    IgnorePathNotAbsolute { path: String },
    #[error("path `{path}` defined both in ignore list and requests")]
    IgnoreEndpointConflict { path: String },
    #[error("ip is mandatory")]
    MissingIp,
}

/// Validate a template, dispatching on its type.
pub fn validate(template: &Template) -> Result<(), ValidationError> {
    let result = match &template.kind {
        None => Err(ValidationError::MissingType),
        Some(TemplateKind::Raw) => check_raw_template(template),
        Some(TemplateKind::Shodan) => check_shodan_template(template),
        Some(TemplateKind::Unknown(tag)) => {
            tracing::warn!(kind = %tag, "Unknown template type, no checks applied");
            Ok(())
        }
    };

    match &result {
        Ok(()) => tracing::debug!(kind = ?template.kind, "Template validated"),
        Err(e) => tracing::debug!(error = %e, "Template rejected"),
    }
    result
}

/// Checks a raw template, in fixed order, stopping at the first failure.
pub fn check_raw_template(template: &Template) -> Result<(), ValidationError> {
    check_unique_ids(template)?;
    check_unique_endpoints(template)?;
    check_default_present(template)?;
    check_requests(template)?;
    check_default_request(template)?;
    check_ignore(template)
}

/// Checks a shodan template.
///
/// Succeeds only when `ip` is empty. The condition and the error message
/// disagree; deployed templates depend on the condition.
pub fn check_shodan_template(template: &Template) -> Result<(), ValidationError> {
    if !template.ip.is_empty() {
        return Err(ValidationError::MissingIp);
    }
    Ok(())
}

/// Rule ids must be pairwise distinct. Always passes for non-raw templates.
pub fn check_unique_ids(template: &Template) -> Result<(), ValidationError> {
    if !template.is_raw() {
        return Ok(());
    }
    match first_duplicate(template.requests.iter().map(|r| r.id.as_str())) {
        Some(id) => Err(ValidationError::DuplicateId { id: id.to_string() }),
        None => Ok(()),
    }
}

/// Rule endpoints must be pairwise distinct. Always passes for non-raw
/// templates.
pub fn check_unique_endpoints(template: &Template) -> Result<(), ValidationError> {
    if !template.is_raw() {
        return Ok(());
    }
    match first_duplicate(template.requests.iter().map(|r| r.endpoint.as_str())) {
        Some(endpoint) => Err(ValidationError::DuplicateEndpoint {
            endpoint: endpoint.to_string(),
        }),
        None => Ok(()),
    }
}

/// A raw template needs a rule with the reserved default id.
pub fn check_default_present(template: &Template) -> Result<(), ValidationError> {
    if template.is_raw() && template.default_rule().is_none() {
        return Err(ValidationError::MissingDefault);
    }
    Ok(())
}

/// Every rule needs an id; every non-default rule needs all of its fields.
///
/// Rules are scanned in declared order and the first blank field wins.
pub fn check_requests(template: &Template) -> Result<(), ValidationError> {
    for (index, rule) in template.requests.iter().enumerate() {
        if is_blank(&rule.id) {
            return Err(ValidationError::MissingId { index });
        }
        if rule.is_default() {
            continue;
        }

        let id = || rule.id.clone();
        if is_blank(&rule.endpoint) {
            return Err(ValidationError::MissingEndpoint { id: id() });
        }
        if rule.methods.is_empty() {
            return Err(ValidationError::MissingMethods { id: id() });
        }
        if rule.response_type.is_none() {
            return Err(ValidationError::MissingResponseType { id: id() });
        }
        if is_blank(&rule.content_type) {
            return Err(ValidationError::MissingContentType { id: id() });
        }
        if is_blank(&rule.content) {
            return Err(ValidationError::MissingContent { id: id() });
        }
    }
    Ok(())
}

/// The default rule needs a response type, a content type and content.
///
/// Without a default rule the empty rule is checked, which fails on the
/// response type.
pub fn check_default_request(template: &Template) -> Result<(), ValidationError> {
    let empty = Rule::default();
    let rule = template.default_rule().unwrap_or(&empty);
    let id = || DEFAULT_RULE_ID.to_string();

    if rule.response_type.is_none() {
        return Err(ValidationError::MissingResponseType { id: id() });
    }
    if is_blank(&rule.content_type) {
        return Err(ValidationError::MissingContentType { id: id() });
    }
    if is_blank(&rule.content) {
        return Err(ValidationError::MissingContent { id: id() });
    }
    Ok(())
}

/// The ignore list must hold distinct absolute paths that no rule serves.
pub fn check_ignore(template: &Template) -> Result<(), ValidationError> {
    let ignore = &template.ignore;
    if ignore.is_empty() {
        return Ok(());
    }

    if let Some(path) = first_duplicate(ignore.iter().map(String::as_str)) {
        return Err(ValidationError::DuplicateIgnorePath {
            path: path.to_string(),
        });
    }

    // An empty entry is reported here rather than treated as a wildcard.
    if let Some(path) = ignore.iter().find(|p| !p.starts_with('/')) {
        return Err(ValidationError::IgnorePathNotAbsolute { path: path.clone() });
    }

    let endpoints: HashSet<&str> = template
        .requests
        .iter()
        .map(|r| r.endpoint.as_str())
        .collect();
    if let Some(path) = ignore.iter().find(|p| endpoints.contains(p.as_str())) {
        return Err(ValidationError::IgnoreEndpointConflict { path: path.clone() });
    }

    Ok(())
}

/// Returns the first item already seen earlier in the sequence.
fn first_duplicate<'a>(items: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    items.into_iter().find(|item| !seen.insert(*item))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
