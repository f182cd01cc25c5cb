//! Wire types at the server boundary.
//!
//! [`ApiGatewayEvent`] is the inbound event in API-Gateway HTTP payload shape
//! and [`ApiGatewayResult`] the outbound result. Both use camelCase field
//! names on the wire. Missing and `null` maps deserialize as empty maps.

use std::collections::{BTreeMap, HashMap};

use opcodec_core::{
    encode_params, error_kinds, ApiResponse, CodecError, HttpError, MediaContainer,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Deserializes a field that may be absent or `null` as `T::default()`.
fn null_as_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Request context attached by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Context produced by the authorizer for this request, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorizer: Option<Value>,
}

/// Inbound HTTP event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    /// `name=value` cookie strings. `None` when the gateway sent no array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub request_context: RequestContext,
}

impl ApiGatewayEvent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_path_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_parameters.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookies.get_or_insert_with(Vec::new).push(cookie.into());
        self
    }

    /// Literal text body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.is_base64_encoded = false;
        self
    }

    /// Raw bytes body, base64-encoded on the event.
    #[must_use]
    pub fn with_binary_body(mut self, bytes: &[u8]) -> Self {
        let container = MediaContainer::base64(bytes);
        self.body = Some(container.body);
        self.is_base64_encoded = true;
        self
    }

    #[must_use]
    pub fn with_authorizer(mut self, context: Value) -> Self {
        self.request_context.authorizer = Some(context);
        self
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Outbound result. Header names are lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayResult {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ApiGatewayResult {
    /// Encode a response through its kind's codec.
    ///
    /// Response headers are kept with lower-cased names, except
    /// `content-type`, which always comes from the response's media type when
    /// it has one.
    ///
    /// # Errors
    ///
    /// Propagates the codec's [`CodecError`].
    pub fn from_response(response: &ApiResponse) -> Result<Self, CodecError> {
        let container = response.encode_body()?;
        let mut headers = encode_params(&response.headers);
        if let Some(media_type) = response.media_type() {
            headers.insert("content-type".to_string(), media_type.as_str().to_string());
        }
        Ok(Self {
            status_code: response.status_code,
            headers,
            body: container.body,
            is_base64_encoded: container.is_base64_encoded,
        })
    }

    /// Generic internal error result. Built without any codec so it cannot fail.
    #[must_use]
    pub fn internal_error(message: &str) -> Self {
        let body = HttpError::new(500, error_kinds::INTERNAL_SERVER_ERROR, message).to_json();
        Self {
            status_code: 500,
            headers: BTreeMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: body.to_string(),
            is_base64_encoded: false,
        }
    }

    /// Raw body bytes, base64-decoded when flagged.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Base64`] for a malformed base64 body.
    pub fn body_bytes(&self) -> Result<Vec<u8>, CodecError> {
        MediaContainer {
            body: self.body.clone(),
            is_base64_encoded: self.is_base64_encoded,
        }
        .to_bytes()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_gateway_payload_with_nulls() {
        let event: ApiGatewayEvent = serde_json::from_value(json!({
            "rawPath": "/items/7",
            "pathParameters": {"itemId": "7"},
            "queryStringParameters": null,
            "headers": {"content-type": "application/json"},
            "cookies": ["session=abc"],
            "body": "{\"a\":1}",
            "isBase64Encoded": false,
            "requestContext": {"requestId": "r-1", "authorizer": {"lambda": {"user": "u"}}}
        }))
        .unwrap();
        assert_eq!(event.path_parameters.get("itemId").map(String::as_str), Some("7"));
        assert!(event.query_string_parameters.is_empty());
        assert_eq!(event.cookies.as_deref(), Some(&["session=abc".to_string()][..]));
        assert_eq!(event.request_context.request_id.as_deref(), Some("r-1"));
        assert_eq!(
            event.request_context.authorizer,
            Some(json!({"lambda": {"user": "u"}}))
        );
    }

    #[test]
    fn empty_payload_deserializes_to_defaults() {
        let event: ApiGatewayEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(event, ApiGatewayEvent::default());
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = ApiGatewayResult::from_response(&ApiResponse::text(200, "hi")).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "statusCode": 200,
                "headers": {"content-type": "text/plain"},
                "body": "hi",
                "isBase64Encoded": false
            })
        );
    }

    #[test]
    fn content_type_always_comes_from_media_type() {
        let response = ApiResponse::json(201, json!({"ok": true}))
            .with_header("Content-Type", "text/plain")
            .with_header("X-Extra", "1");
        let result = ApiGatewayResult::from_response(&response).unwrap();
        assert_eq!(result.headers.get("content-type").map(String::as_str), Some("application/json"));
        assert_eq!(result.headers.get("x-extra").map(String::as_str), Some("1"));
        assert_eq!(result.body, r#"{"ok":true}"#);
    }

    #[test]
    fn headers_set_directly_are_lower_cased() {
        let mut response = ApiResponse::json(200, json!([]));
        response
            .headers
            .insert("Content-Type".to_string(), "text/csv".to_string());
        response.headers.insert("X-Trace".to_string(), "t".to_string());
        let result = ApiGatewayResult::from_response(&response).unwrap();
        assert_eq!(
            result.headers,
            BTreeMap::from([
                ("content-type".to_string(), "application/json".to_string()),
                ("x-trace".to_string(), "t".to_string()),
            ])
        );
    }

    #[test]
    fn binary_results_are_base64() {
        let result =
            ApiGatewayResult::from_response(&ApiResponse::binary(200, vec![0u8, 1, 2])).unwrap();
        assert!(result.is_base64_encoded);
        assert_eq!(result.body_bytes().unwrap(), vec![0u8, 1, 2]);
    }

    #[test]
    fn internal_error_result_is_json() {
        let result = ApiGatewayResult::internal_error("Internal server error");
        assert_eq!(result.status_code, 500);
        let body: Value = serde_json::from_str(&result.body).unwrap();
        assert_eq!(body["kind"], "INTERNAL_SERVER_ERROR");
    }
}
