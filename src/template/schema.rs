//! Template schema definitions.
//!
//! This module defines the shape of a decoy template as it appears on disk.
//! All types derive Serde traits; semantic checks live in `validation.rs`.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Reserved rule id marking the fallback rule.
pub const DEFAULT_RULE_ID: &str = "default";

/// Root decoy template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Template {
    /// Template type. `None` when the tag is absent or empty; any other
    /// unrecognised text, whitespace included, is kept as `Unknown`.
    #[serde(
        rename = "type",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<TemplateKind>,

    /// Rule entries, in declared order. Only meaningful for raw templates.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<Rule>,

    /// Paths that are never handled as decoy routes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,

    /// Address whose captured banner is replayed by shodan templates.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip: String,
}

impl Template {
    /// Returns true for raw templates.
    pub fn is_raw(&self) -> bool {
        matches!(self.kind, Some(TemplateKind::Raw))
    }

    /// The fallback rule of a raw template.
    ///
    /// Scans rules in declared order and returns the first one whose id is
    /// [`DEFAULT_RULE_ID`]. Any other template type has no default rule.
    pub fn default_rule(&self) -> Option<&Rule> {
        if !self.is_raw() {
            return None;
        }
        self.requests.iter().find(|rule| rule.is_default())
    }
}

/// Template type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Responses come from explicit rule entries.
    Raw,
    /// Responses replay a previously captured scan banner for `ip`.
    Shodan,
    /// Unrecognised tag, kept verbatim.
    Unknown(String),
}

impl TemplateKind {
    pub fn as_str(&self) -> &str {
        match self {
            TemplateKind::Raw => "raw",
            TemplateKind::Shodan => "shodan",
            TemplateKind::Unknown(tag) => tag,
        }
    }
}

impl FromStr for TemplateKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "raw" => TemplateKind::Raw,
            "shodan" => TemplateKind::Shodan,
            other => TemplateKind::Unknown(other.to_string()),
        })
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TemplateKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One decoy endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rule {
    /// Rule identifier. [`DEFAULT_RULE_ID`] marks the fallback rule.
    pub id: String,

    /// Methods this rule answers to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<HttpMethod>,

    /// Exact request path this rule matches.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    /// Whether `content` is a literal payload or a file path.
    #[serde(
        rename = "response-type",
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_type: Option<ResponseType>,

    /// MIME type emitted with the response.
    #[serde(rename = "content-type", default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,

    /// Literal payload or file reference, per `response_type`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
}

impl Rule {
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_RULE_ID
    }

    /// Returns true if this rule answers to the given method token.
    /// Method tokens are case-sensitive.
    pub fn accepts(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.as_str() == method)
    }
}

/// HTTP methods a rule can answer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    /// RFC 5789
    Patch,
    Delete,
    Connect,
    Options,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Connect,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown HTTP method `{0}`")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// How a rule's `content` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// `content` is the literal payload.
    Raw,
    /// `content` is a path to read the payload from.
    File,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Raw => "raw",
            ResponseType::File => "file",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown response type `{0}`, expected `raw` or `file`")]
pub struct UnknownResponseType(pub String);

impl FromStr for ResponseType {
    type Err = UnknownResponseType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(ResponseType::Raw),
            "file" => Ok(ResponseType::File),
            other => Err(UnknownResponseType(other.to_string())),
        }
    }
}

/// Projects methods to their textual tokens, preserving order.
pub fn methods_as_strings(methods: &[HttpMethod]) -> Vec<String> {
    methods.iter().map(|m| m.as_str().to_string()).collect()
}

/// Deserializes an optional tag where a missing, null or empty value means
/// "not set".
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.is_empty() => raw.parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

/// Like [`empty_as_none`], but a whitespace-only value also means "not set".
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw.parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}
