//! Media types, the `MediaContainer` transport envelope, and the per-media codecs.
//!
//! Each supported media type owns one composed codec: a content-shape stage
//! (JSON, form pairs, raw text, raw bytes) chained with an envelope stage that
//! produces a [`MediaContainer`]. The dispatch table is built once and only
//! read afterwards; unknown media types resolve to the octet-stream codec.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::codec::{Chain, Codec};
use crate::error::CodecError;

// ---------------------------------------------------------------------------
// MediaContainer
// ---------------------------------------------------------------------------

/// Transport envelope for a body: literal text or base64-encoded bytes.
///
/// When `is_base64_encoded` is true, `body` decodes to the raw payload bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContainer {
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl MediaContainer {
    /// A literal text envelope.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            is_base64_encoded: false,
        }
    }

    /// A base64 envelope around `bytes`.
    #[must_use]
    pub fn base64(bytes: &[u8]) -> Self {
        Self {
            body: BASE64.encode(bytes),
            is_base64_encoded: true,
        }
    }

    /// Wrap raw wire bytes received with `media_type`.
    ///
    /// Bodies of text-shaped media types that are valid UTF-8 travel as text;
    /// everything else is base64-encoded.
    #[must_use]
    pub fn from_wire(bytes: &[u8], media_type: Option<&str>) -> Self {
        let textual = media_type
            .and_then(MediaType::lookup)
            .is_some_and(MediaType::is_textual);
        match std::str::from_utf8(bytes) {
            Ok(text) if textual => Self::text(text),
            _ => Self::base64(bytes),
        }
    }

    /// The raw payload bytes this envelope carries.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Base64`] if the envelope claims base64 but the
    /// body is not valid base64.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        if self.is_base64_encoded {
            Ok(BASE64.decode(&self.body)?)
        } else {
            Ok(self.body.as_bytes().to_vec())
        }
    }
}

// ---------------------------------------------------------------------------
// Content-shape stages
// ---------------------------------------------------------------------------

/// JSON text stage. `None` encodes to the empty string and back.
pub struct JsonCodec<T = Value> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for JsonCodec<T> {}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T> Codec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Input = Option<T>;
    type Output = String;

    fn encode(&self, input: Option<T>) -> Result<String, CodecError> {
        match input {
            Some(value) => Ok(serde_json::to_string(&value)?),
            None => Ok(String::new()),
        }
    }

    fn decode(&self, output: String) -> Result<Option<T>, CodecError> {
        if output.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&output)?))
    }
}

/// `application/x-www-form-urlencoded` stage.
///
/// Only string-valued entries are serialized. Decoding keeps the last value
/// of a repeated key.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCodec;

impl Codec for FormCodec {
    type Input = Map<String, Value>;
    type Output = String;

    fn encode(&self, input: Map<String, Value>) -> Result<String, CodecError> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &input {
            if let Value::String(value) = value {
                serializer.append_pair(key, value);
            }
        }
        Ok(serializer.finish())
    }

    fn decode(&self, output: String) -> Result<Map<String, Value>, CodecError> {
        Ok(form_urlencoded::parse(output.as_bytes())
            .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
            .collect())
    }
}

/// Pass-through stage for payloads already in envelope shape (text, bytes).
pub struct Identity<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Identity<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Identity<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Identity<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Identity<T> {}

impl<T> fmt::Debug for Identity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Identity")
    }
}

impl<T> Codec for Identity<T> {
    type Input = T;
    type Output = T;

    fn encode(&self, input: T) -> Result<T, CodecError> {
        Ok(input)
    }

    fn decode(&self, output: T) -> Result<T, CodecError> {
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Envelope stages
// ---------------------------------------------------------------------------

/// Text envelope: body travels literally with `is_base64_encoded = false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEnvelope;

impl Codec for TextEnvelope {
    type Input = String;
    type Output = MediaContainer;

    fn encode(&self, input: String) -> Result<MediaContainer, CodecError> {
        Ok(MediaContainer::text(input))
    }

    fn decode(&self, output: MediaContainer) -> Result<String, CodecError> {
        if output.is_base64_encoded {
            return Ok(String::from_utf8(BASE64.decode(&output.body)?)?);
        }
        Ok(output.body)
    }
}

/// Binary envelope: bytes travel as base64 with `is_base64_encoded = true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryEnvelope;

impl Codec for BinaryEnvelope {
    type Input = Bytes;
    type Output = MediaContainer;

    fn encode(&self, input: Bytes) -> Result<MediaContainer, CodecError> {
        Ok(MediaContainer::base64(&input))
    }

    fn decode(&self, output: MediaContainer) -> Result<Bytes, CodecError> {
        Ok(Bytes::from(output.to_bytes()?))
    }
}

pub type JsonMediaCodec = Chain<JsonCodec, TextEnvelope>;
pub type FormMediaCodec = Chain<FormCodec, TextEnvelope>;
pub type TextMediaCodec = Chain<Identity<String>, TextEnvelope>;
pub type BinaryMediaCodec = Chain<Identity<Bytes>, BinaryEnvelope>;

// ---------------------------------------------------------------------------
// MediaType
// ---------------------------------------------------------------------------

/// Media types with a dedicated codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    TextPlain,
    TextHtml,
    OctetStream,
    Json,
    FormUrlEncoded,
}

impl MediaType {
    /// Media type assumed when nothing more specific is known.
    pub const DEFAULT: Self = Self::OctetStream;

    pub const ALL: [Self; 5] = [
        Self::TextPlain,
        Self::TextHtml,
        Self::OctetStream,
        Self::Json,
        Self::FormUrlEncoded,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextPlain => "text/plain",
            Self::TextHtml => "text/html",
            Self::OctetStream => "application/octet-stream",
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }

    /// Find the media type named by a content-type value. Parameters after
    /// `;` are ignored and comparison is case-insensitive.
    #[must_use]
    pub fn lookup(content_type: &str) -> Option<Self> {
        let essence = essence(content_type)?;
        Self::ALL
            .into_iter()
            .find(|media_type| media_type.as_str().eq_ignore_ascii_case(essence))
    }

    /// Whether bodies of this type travel as literal text.
    #[must_use]
    pub fn is_textual(self) -> bool {
        !matches!(self, Self::OctetStream)
    }

    /// The codec owned by this media type.
    #[must_use]
    pub fn codec(self) -> &'static MediaCodec {
        &MEDIA_CODECS[&self]
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media type part of a content-type value, parameters removed.
fn essence(content_type: &str) -> Option<&str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    (!essence.is_empty()).then_some(essence)
}

/// Normalized media type of a content-type header value: parameters
/// stripped, trimmed, lower-cased. `None` for an empty value.
#[must_use]
pub fn parse_media_type(content_type: &str) -> Option<String> {
    essence(content_type).map(str::to_ascii_lowercase)
}

/// Codec for `media_type`, falling back to the octet-stream codec.
#[must_use]
pub fn media_codec(media_type: &str) -> &'static MediaCodec {
    if let Some(known) = MediaType::lookup(media_type) {
        return known.codec();
    }
    tracing::debug!(media_type, "no dedicated codec, falling back to octet-stream");
    MediaType::DEFAULT.codec()
}

static MEDIA_CODECS: LazyLock<HashMap<MediaType, MediaCodec>> = LazyLock::new(|| {
    MediaType::ALL
        .into_iter()
        .map(|media_type| (media_type, MediaCodec::for_media_type(media_type)))
        .collect()
});

// ---------------------------------------------------------------------------
// Body / MediaCodec
// ---------------------------------------------------------------------------

/// A decoded body in one of the supported content shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// JSON value; `None` is an absent value (empty payload).
    Json(Option<Value>),
    Form(Map<String, Value>),
    Text(String),
    Binary(Bytes),
}

impl Body {
    /// A present JSON body.
    #[must_use]
    pub fn json(value: impl Into<Value>) -> Self {
        Self::Json(Some(value.into()))
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        Self::Binary(bytes.into())
    }

    /// Form body from string pairs.
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), Value::String(value.into())))
                .collect(),
        )
    }

    /// Shape name, used in error messages.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Form(_) => "form",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }

    /// JSON view of the body for validators. Binary bodies become base64
    /// strings; an absent JSON value becomes `null`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(value) => value.clone().unwrap_or(Value::Null),
            Self::Form(map) => Value::Object(map.clone()),
            Self::Text(text) => Value::String(text.clone()),
            Self::Binary(bytes) => Value::String(BASE64.encode(bytes)),
        }
    }
}

/// The composed codec owned by one media type.
#[derive(Debug, Clone, Copy)]
pub enum MediaCodec {
    Json(JsonMediaCodec),
    Form(FormMediaCodec),
    Text(TextMediaCodec),
    Binary(BinaryMediaCodec),
}

impl MediaCodec {
    fn for_media_type(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Json => Self::Json(JsonCodec::new().chain(TextEnvelope)),
            MediaType::FormUrlEncoded => Self::Form(FormCodec.chain(TextEnvelope)),
            MediaType::TextPlain | MediaType::TextHtml => {
                Self::Text(Identity::new().chain(TextEnvelope))
            }
            MediaType::OctetStream => Self::Binary(Identity::new().chain(BinaryEnvelope)),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Form(_) => "form",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }
}

impl Codec for MediaCodec {
    type Input = Body;
    type Output = MediaContainer;

    /// Encode a body whose shape matches this codec. The binary codec also
    /// accepts text, sending its UTF-8 bytes.
    fn encode(&self, input: Body) -> Result<MediaContainer, CodecError> {
        match (self, input) {
            (Self::Json(codec), Body::Json(value)) => codec.encode(value),
            (Self::Form(codec), Body::Form(map)) => codec.encode(map),
            (Self::Text(codec), Body::Text(text)) => codec.encode(text),
            (Self::Binary(codec), Body::Binary(bytes)) => codec.encode(bytes),
            (Self::Binary(codec), Body::Text(text)) => codec.encode(Bytes::from(text)),
            (codec, body) => Err(CodecError::BodyMismatch {
                codec: codec.shape(),
                body: body.shape(),
            }),
        }
    }

    fn decode(&self, output: MediaContainer) -> Result<Body, CodecError> {
        match self {
            Self::Json(codec) => codec.decode(output).map(Body::Json),
            Self::Form(codec) => codec.decode(output).map(Body::Form),
            Self::Text(codec) => codec.decode(output).map(Body::Text),
            Self::Binary(codec) => codec.decode(output).map(Body::Binary),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
