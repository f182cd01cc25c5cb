//! Error types shared by the client and server pipelines.
//!
//! [`HttpError`] is the structured failure that crosses the wire. Its JSON
//! form is `{ kind, code?, message, details? }`; the status code travels
//! out-of-band as the transport status, so it is skipped by serde and restored
//! by [`HttpError::from_response`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::response::{ApiResponse, ResponseContent};

/// Stable error kind strings carried in the `kind` field of error bodies.
pub mod error_kinds {
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const UNSUPPORTED_MEDIA_TYPE: &str = "UNSUPPORTED_MEDIA_TYPE";
    pub const UNPROCESSABLE_CONTENT: &str = "UNPROCESSABLE_CONTENT";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

    pub const VALIDATION_ERROR_PATH: &str = "VALIDATION_ERROR_PATH";
    pub const VALIDATION_ERROR_QUERY_STRING: &str = "VALIDATION_ERROR_QUERY_STRING";
    pub const VALIDATION_ERROR_COOKIE: &str = "VALIDATION_ERROR_COOKIE";
    pub const VALIDATION_ERROR_HEADER: &str = "VALIDATION_ERROR_HEADER";
    pub const VALIDATION_ERROR_AUTHORIZER: &str = "VALIDATION_ERROR_AUTHORIZER";
    pub const VALIDATION_ERROR_BODY: &str = "VALIDATION_ERROR_BODY";
}

// ---------------------------------------------------------------------------
// CodecError / PathError
// ---------------------------------------------------------------------------

/// Failure of an encode or decode step.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("{codec} codec cannot encode a {body} body")]
    BodyMismatch {
        codec: &'static str,
        body: &'static str,
    },
}

/// Failure to render a path pattern from a parameter map.
///
/// A missing parameter means the caller passed an incomplete parameter set;
/// it is never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("missing path parameter `{name}` for pattern `{pattern}`")]
    MissingParameter { name: String, pattern: String },
}

// ---------------------------------------------------------------------------
// ValidationField
// ---------------------------------------------------------------------------

/// Request field a validator is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationField {
    Path,
    QueryString,
    Cookie,
    Header,
    Authorizer,
    Body,
}

impl ValidationField {
    /// Error kind raised when this field fails validation.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::Path => error_kinds::VALIDATION_ERROR_PATH,
            Self::QueryString => error_kinds::VALIDATION_ERROR_QUERY_STRING,
            Self::Cookie => error_kinds::VALIDATION_ERROR_COOKIE,
            Self::Header => error_kinds::VALIDATION_ERROR_HEADER,
            Self::Authorizer => error_kinds::VALIDATION_ERROR_AUTHORIZER,
            Self::Body => error_kinds::VALIDATION_ERROR_BODY,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Path => "path parameters",
            Self::QueryString => "query string",
            Self::Cookie => "cookies",
            Self::Header => "headers",
            Self::Authorizer => "authorizer context",
            Self::Body => "request body",
        }
    }
}

// ---------------------------------------------------------------------------
// HttpError
// ---------------------------------------------------------------------------

/// Structured HTTP failure with a stable `kind` code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind} ({status_code}): {message}")]
pub struct HttpError {
    /// Transport status. Not part of the JSON body.
    #[serde(skip)]
    pub status_code: u16,
    /// Stable error code, e.g. `VALIDATION_ERROR_QUERY_STRING`.
    pub kind: String,
    /// Optional application-specific sub-code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Arbitrary structured detail (e.g. validator errors).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl HttpError {
    #[must_use]
    pub fn new(status_code: u16, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            kind: kind.into(),
            code: None,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, error_kinds::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, error_kinds::UNAUTHORIZED, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, error_kinds::FORBIDDEN, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, error_kinds::NOT_FOUND, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, error_kinds::CONFLICT, message)
    }

    /// The request body exceeds the host's size limit.
    #[must_use]
    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            413,
            error_kinds::PAYLOAD_TOO_LARGE,
            format!("request body exceeds {limit} bytes"),
        )
    }

    /// The request carried a content type the operation does not declare.
    #[must_use]
    pub fn unsupported_media_type(media_type: &str) -> Self {
        Self::new(
            415,
            error_kinds::UNSUPPORTED_MEDIA_TYPE,
            format!("unsupported media type: {media_type}"),
        )
    }

    #[must_use]
    pub fn unprocessable_content(message: impl Into<String>) -> Self {
        Self::new(422, error_kinds::UNPROCESSABLE_CONTENT, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, error_kinds::INTERNAL_SERVER_ERROR, message)
    }

    /// A validator rejected `field`; `details` is the validator's error payload.
    #[must_use]
    pub fn validation(field: ValidationField, details: Value) -> Self {
        Self::new(
            400,
            field.kind(),
            format!("{} failed validation", field.describe()),
        )
        .with_details(details)
    }

    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// JSON form of the error body.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("kind".to_string(), Value::String(self.kind.clone()));
        if let Some(code) = &self.code {
            body.insert("code".to_string(), Value::String(code.clone()));
        }
        body.insert("message".to_string(), Value::String(self.message.clone()));
        if let Some(details) = &self.details {
            body.insert("details".to_string(), details.clone());
        }
        Value::Object(body)
    }

    /// Canonical JSON error response for this error.
    #[must_use]
    pub fn to_response(&self) -> ApiResponse {
        ApiResponse::json(self.status_code, self.to_json())
    }

    /// Parse a response body back into an `HttpError`.
    ///
    /// Returns `None` when the body is not a JSON error object.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Option<Self> {
        let parsed: Result<Self, _> = match &response.content {
            ResponseContent::Json(Some(value)) => serde_json::from_value(value.clone()),
            ResponseContent::Text(text) | ResponseContent::Html(text) => {
                serde_json::from_str(text)
            }
            ResponseContent::Binary(bytes) => serde_json::from_slice(bytes),
            ResponseContent::Json(None) | ResponseContent::Empty | ResponseContent::Form(_) => {
                return None
            }
        };
        let mut error = parsed.ok()?;
        error.status_code = response.status_code;
        Some(error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
