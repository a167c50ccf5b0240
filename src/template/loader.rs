//! Template loading from disk or memory.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::template::schema::Template;
use crate::template::validation::{validate, ValidationError};

/// Structured-text formats a template can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateFormat {
    #[default]
    Yaml,
    Toml,
}

impl TemplateFormat {
    /// Pick the format from a file extension. Anything but `.toml` is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => TemplateFormat::Toml,
            _ => TemplateFormat::Yaml,
        }
    }
}

/// Parser diagnostic for a malformed template.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("template is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Error type for template loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read template {source_name:?}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("in file {source_name:?}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: FormatError,
    },
}

/// Error type for the load-then-validate pipeline.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("template {source_name:?} is invalid: {source}")]
    Validation {
        source_name: String,
        #[source]
        source: ValidationError,
    },
}

/// Read a whole template from `reader` and parse it.
///
/// No semantic validation happens here: a well-formed template with
/// duplicate ids loads fine.
pub fn load<R: Read>(
    mut reader: R,
    source_name: &str,
    format: TemplateFormat,
) -> Result<Template, LoadError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(|source| LoadError::Io {
        source_name: source_name.to_string(),
        source,
    })?;
    load_bytes(&buf, source_name, format)
}

/// Parse a template from an in-memory buffer.
pub fn load_bytes(
    buf: &[u8],
    source_name: &str,
    format: TemplateFormat,
) -> Result<Template, LoadError> {
    parse(buf, format).map_err(|source| LoadError::Parse {
        source_name: source_name.to_string(),
        source,
    })
}

/// Parse a template from a string.
pub fn load_str(
    content: &str,
    source_name: &str,
    format: TemplateFormat,
) -> Result<Template, LoadError> {
    load_bytes(content.as_bytes(), source_name, format)
}

/// Load a template file. The format follows the file extension.
pub fn load_file(path: &Path) -> Result<Template, LoadError> {
    let source_name = path.display().to_string();
    let file = File::open(path).map_err(|source| LoadError::Io {
        source_name: source_name.clone(),
        source,
    })?;
    let template = load(file, &source_name, TemplateFormat::from_path(path))?;

    tracing::debug!(
        path = %source_name,
        kind = ?template.kind,
        rules = template.requests.len(),
        ignored = template.ignore.len(),
        "Template loaded"
    );
    Ok(template)
}

/// Load and validate a template file.
///
/// The returned template is ready to be shared with request handlers.
pub fn load_validated(path: &Path) -> Result<Arc<Template>, TemplateError> {
    let template = load_file(path)?;
    validate(&template).map_err(|source| TemplateError::Validation {
        source_name: path.display().to_string(),
        source,
    })?;
    Ok(Arc::new(template))
}

fn parse(buf: &[u8], format: TemplateFormat) -> Result<Template, FormatError> {
    match format {
        TemplateFormat::Yaml => Ok(serde_yaml::from_slice(buf)?),
        TemplateFormat::Toml => Ok(toml::from_str(std::str::from_utf8(buf)?)?),
    }
}
