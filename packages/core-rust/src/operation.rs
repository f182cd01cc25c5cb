//! Static operation descriptors shared by the client and server pipelines.
//!
//! An [`Operation`] is built once at startup, usually from a JSON document
//! produced by code generation, and only read afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PathError;
use crate::params::{placeholder_names, substitute_path};

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path pattern with `{name}` placeholders, e.g. `/items/{itemId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTemplate {
    pub pattern: String,
}

impl PathTemplate {
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    #[must_use]
    pub fn parameter_names(&self) -> Vec<&str> {
        placeholder_names(&self.pattern)
    }

    /// Render the pattern with percent-encoded parameter values.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::MissingParameter`] if a placeholder has no value.
    pub fn render(&self, params: &BTreeMap<String, String>) -> Result<String, PathError> {
        substitute_path(&self.pattern, params)
    }
}

/// Declared request body: whether it is required and which media types it
/// accepts (each mapped to an opaque schema).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBodySpec {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub content: BTreeMap<String, Value>,
}

/// Descriptor of one API operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    pub method: HttpMethod,
    pub path: PathTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodySpec>,
    /// Status codes treated as success by the client. `None` accepts any status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_codes: Option<BTreeSet<u16>>,
}

impl Operation {
    #[must_use]
    pub fn new(method: HttpMethod, pattern: impl Into<String>) -> Self {
        Self {
            operation_id: None,
            method,
            path: PathTemplate::new(pattern),
            request_body: None,
            success_codes: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Declare a request body accepting `media_types`, each with an empty schema.
    #[must_use]
    pub fn with_request_body<I, S>(mut self, required: bool, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let content = media_types
            .into_iter()
            .map(|media_type| (media_type.into(), Value::Object(serde_json::Map::new())))
            .collect();
        self.request_body = Some(RequestBodySpec { required, content });
        self
    }

    #[must_use]
    pub fn with_success_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.success_codes = Some(codes.into_iter().collect());
        self
    }

    /// Parse a descriptor from its JSON document form.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error for malformed documents.
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    /// Whether the operation declares `media_type` as a request body type.
    #[must_use]
    pub fn accepts(&self, media_type: &str) -> bool {
        self.request_body.as_ref().is_some_and(|body| {
            body.content
                .keys()
                .any(|declared| declared.eq_ignore_ascii_case(media_type))
        })
    }

    /// The request media type when exactly one is declared.
    #[must_use]
    pub fn single_request_media_type(&self) -> Option<&str> {
        let body = self.request_body.as_ref()?;
        let mut keys = body.content.keys();
        match (keys.next(), keys.next()) {
            (Some(only), None) => Some(only.as_str()),
            _ => None,
        }
    }

    /// Whether `status_code` counts as success. Operations without a declared
    /// success set accept every status.
    #[must_use]
    pub fn is_success(&self, status_code: u16) -> bool {
        self.success_codes
            .as_ref()
            .map_or(true, |codes| codes.contains(&status_code))
    }

    /// Display name for logs: the operation id, else `METHOD pattern`.
    #[must_use]
    pub fn name(&self) -> String {
        match &self.operation_id {
            Some(id) => id.clone(),
            None => format!("{} {}", self.method, self.path.pattern),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
