//! Typed responses: `(status, content, headers)` with per-kind codecs.
//!
//! [`ResponseContent`] is the tagged variant over the response kinds. Each
//! kind fixes its media type, and encoding or decoding a kind always goes
//! through that media type's codec from the shared table.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::codec::Codec;
use crate::error::CodecError;
use crate::media::{parse_media_type, Body, MediaContainer, MediaType};
use crate::params::{encode_params, ToParam};

/// Body of a response, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseContent {
    Empty,
    Text(String),
    Html(String),
    Json(Option<Value>),
    Binary(Bytes),
    Form(Map<String, Value>),
}

impl ResponseContent {
    /// Media type fixed by this kind. `None` for `Empty`.
    #[must_use]
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            Self::Empty => None,
            Self::Text(_) => Some(MediaType::TextPlain),
            Self::Html(_) => Some(MediaType::TextHtml),
            Self::Json(_) => Some(MediaType::Json),
            Self::Binary(_) => Some(MediaType::OctetStream),
            Self::Form(_) => Some(MediaType::FormUrlEncoded),
        }
    }

    fn to_body(&self) -> Option<Body> {
        match self {
            Self::Empty => None,
            Self::Text(text) | Self::Html(text) => Some(Body::Text(text.clone())),
            Self::Json(value) => Some(Body::Json(value.clone())),
            Self::Binary(bytes) => Some(Body::Binary(bytes.clone())),
            Self::Form(map) => Some(Body::Form(map.clone())),
        }
    }

    fn from_body(media_type: MediaType, body: Body) -> Self {
        match body {
            Body::Text(text) if media_type == MediaType::TextHtml => Self::Html(text),
            Body::Text(text) => Self::Text(text),
            Body::Json(value) => Self::Json(value),
            Body::Form(map) => Self::Form(map),
            Body::Binary(bytes) => Self::Binary(bytes),
        }
    }
}

/// A response value: status, typed content, lower-cased headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub content: ResponseContent,
    pub headers: BTreeMap<String, String>,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status_code: u16, content: ResponseContent) -> Self {
        Self {
            status_code,
            content,
            headers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn empty(status_code: u16) -> Self {
        Self::new(status_code, ResponseContent::Empty)
    }

    #[must_use]
    pub fn text(status_code: u16, text: impl Into<String>) -> Self {
        Self::new(status_code, ResponseContent::Text(text.into()))
    }

    #[must_use]
    pub fn html(status_code: u16, html: impl Into<String>) -> Self {
        Self::new(status_code, ResponseContent::Html(html.into()))
    }

    #[must_use]
    pub fn json(status_code: u16, value: impl Into<Value>) -> Self {
        Self::new(status_code, ResponseContent::Json(Some(value.into())))
    }

    #[must_use]
    pub fn binary(status_code: u16, bytes: impl Into<Bytes>) -> Self {
        Self::new(status_code, ResponseContent::Binary(bytes.into()))
    }

    pub fn form<I, K, V>(status_code: u16, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), Value::String(value.into())))
            .collect();
        Self::new(status_code, ResponseContent::Form(map))
    }

    /// Add a header. The name is lower-cased; an absent value is ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl ToParam) -> Self {
        if let Some(value) = value.to_param() {
            self.headers.insert(name.to_ascii_lowercase(), value);
        }
        self
    }

    #[must_use]
    pub fn media_type(&self) -> Option<MediaType> {
        self.content.media_type()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Encode the content through its kind's codec. `Empty` yields an empty
    /// text envelope.
    ///
    /// # Errors
    ///
    /// Propagates the codec's [`CodecError`].
    pub fn encode_body(&self) -> Result<MediaContainer, CodecError> {
        match (self.content.media_type(), self.content.to_body()) {
            (Some(media_type), Some(body)) => media_type.codec().encode(body),
            _ => Ok(MediaContainer::default()),
        }
    }

    /// Rebuild a response from wire parts, dispatching on `content-type`.
    ///
    /// Without a content type and without a positive `content-length` the
    /// response is `Empty`. Unknown or missing content types decode as binary.
    ///
    /// # Errors
    ///
    /// Propagates the selected codec's [`CodecError`].
    pub fn decode<I, K, V>(
        status_code: u16,
        headers: I,
        container: MediaContainer,
    ) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToParam,
    {
        let headers = encode_params(headers);
        let media_type = headers
            .get("content-type")
            .and_then(|value| parse_media_type(value));
        let has_length = headers
            .get("content-length")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .is_some_and(|length| length > 0);

        let content = if media_type.is_none() && !has_length {
            ResponseContent::Empty
        } else {
            let kind = media_type
                .as_deref()
                .and_then(MediaType::lookup)
                .unwrap_or(MediaType::DEFAULT);
            ResponseContent::from_body(kind, kind.codec().decode(container)?)
        };

        Ok(Self {
            status_code,
            content,
            headers,
        })
    }

    /// Check an untyped value against the response shape
    /// `{ statusCode, content?: { mediaType?, body? }, headers? }`.
    ///
    /// Returns `None` when the value is not a well-formed response: missing
    /// or out-of-range status, an unknown media type, or a body whose shape
    /// does not fit the media type. Binary bodies are base64 strings.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        let untyped: UntypedResponse = serde_json::from_value(value).ok()?;
        if !(100..=599).contains(&untyped.status_code) {
            return None;
        }
        let body = untyped.content.body;
        let content = match untyped.content.media_type {
            None => ResponseContent::Empty,
            Some(media_type) => match (MediaType::lookup(&media_type)?, body) {
                (MediaType::Json, body) => ResponseContent::Json(body),
                (MediaType::TextPlain, Some(Value::String(text))) => ResponseContent::Text(text),
                (MediaType::TextHtml, Some(Value::String(html))) => ResponseContent::Html(html),
                (MediaType::FormUrlEncoded, Some(Value::Object(map))) => ResponseContent::Form(map),
                (MediaType::OctetStream, Some(Value::String(encoded))) => {
                    ResponseContent::Binary(Bytes::from(BASE64.decode(encoded).ok()?))
                }
                _ => return None,
            },
        };
        Some(Self {
            status_code: untyped.status_code,
            content,
            headers: encode_params(&untyped.headers),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UntypedResponse {
    status_code: u16,
    #[serde(default)]
    content: UntypedContent,
    #[serde(default)]
    headers: Map<String, Value>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UntypedContent {
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    body: Option<Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
