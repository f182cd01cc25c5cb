//! Operation client.
//!
//! Each call is split into a [`ApiClient::build_request`] step producing an
//! [`HttpRequest`] and a [`ApiClient::parse_response`] step consuming an
//! [`HttpResponse`]; both are pure. [`ApiClient::call`] composes them with
//! signing and the transport.

use std::sync::Arc;

use bytes::Bytes;
use opcodec_core::{
    encode_params, encode_query, media_codec, stringify_params, ApiResponse, Codec, HttpError,
    MediaContainer, MediaType, Operation,
};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::{HttpRequest, HttpResponse};
use crate::request::RequestPayload;
use crate::signer::RequestSigner;
use crate::transport::{ReqwestTransport, Transport};

/// Client for operations served under one base URL.
///
/// Holds no per-call state; one client can issue any number of concurrent
/// calls.
#[derive(Clone)]
pub struct ApiClient<T> {
    config: ClientConfig,
    transport: T,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl ApiClient<ReqwestTransport> {
    /// Client using a [`ReqwestTransport`] configured from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn reqwest(config: ClientConfig) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::new(config, transport))
    }
}

impl<T> ApiClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            signer: None,
        }
    }

    #[must_use]
    pub fn with_signer<S>(mut self, signer: S) -> Self
    where
        S: RequestSigner + 'static,
    {
        self.signer = Some(Arc::new(signer));
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the wire request for `operation`.
    ///
    /// The request media type is the payload's, else the operation's only
    /// declared request media type, else `application/octet-stream`.
    /// `content-type` is only set when there is a body, and always matches
    /// the codec used.
    ///
    /// # Errors
    ///
    /// [`ClientError::Path`] for a missing path parameter,
    /// [`ClientError::Encode`] when the body does not fit the media type.
    pub fn build_request(
        &self,
        operation: &Operation,
        payload: &RequestPayload,
    ) -> Result<HttpRequest, ClientError> {
        let media_type = payload
            .media_type
            .as_deref()
            .or_else(|| operation.single_request_media_type())
            .unwrap_or(MediaType::DEFAULT.as_str());

        let body = payload
            .body
            .clone()
            .map(|body| encode_body(media_type, body))
            .transpose()?;

        let mut headers = encode_params(&payload.headers);
        let cookies = stringify_params(&payload.cookies);
        if !cookies.is_empty() {
            let cookie = cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            headers.insert("cookie".to_string(), cookie);
        }
        if body.is_some() {
            headers.insert("content-type".to_string(), media_type.to_string());
        }

        let path = operation.path.render(&stringify_params(&payload.path))?;
        let query = encode_query(&stringify_params(&payload.query));
        let url = if query.is_empty() {
            format!("{}{path}", self.config.base_url)
        } else {
            format!("{}{path}?{query}", self.config.base_url)
        };

        Ok(HttpRequest {
            method: operation.method,
            url,
            headers,
            body,
        })
    }

    /// Decode `response` and classify it against the operation's success codes.
    ///
    /// # Errors
    ///
    /// For a status outside the success set: [`ClientError::Http`] when the
    /// body is a structured error, else [`ClientError::UnexpectedResponse`].
    /// [`ClientError::Decode`] when a success body does not decode.
    pub fn parse_response(
        &self,
        operation: &Operation,
        response: HttpResponse,
    ) -> Result<ApiResponse, ClientError> {
        let success = operation.is_success(response.status);
        let container = MediaContainer::from_wire(&response.body, response.header("content-type"));
        let headers = response
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()));

        let decoded = ApiResponse::decode(response.status, headers, container);
        if success {
            return decoded.map_err(ClientError::Decode);
        }

        let api_response = match decoded {
            Ok(api_response) => api_response,
            Err(err) => {
                debug!(error = %err, status = response.status, "error body did not decode, keeping raw bytes");
                raw_response(&response)
            }
        };
        match HttpError::from_response(&api_response) {
            Some(err) => Err(ClientError::Http(err)),
            None => Err(ClientError::UnexpectedResponse(Box::new(api_response))),
        }
    }
}

impl<T: Transport> ApiClient<T> {
    /// Build, sign, send and classify one call.
    ///
    /// # Errors
    ///
    /// Everything [`build_request`](Self::build_request) and
    /// [`parse_response`](Self::parse_response) return, plus
    /// [`ClientError::Signing`] and [`ClientError::Transport`] carrying the
    /// signer's or transport's error unchanged.
    pub async fn call(
        &self,
        operation: &Operation,
        payload: &RequestPayload,
    ) -> Result<ApiResponse, ClientError> {
        let mut request = self.build_request(operation, payload)?;
        if let Some(signer) = &self.signer {
            request = signer.sign(request).await.map_err(ClientError::Signing)?;
        }

        debug!(operation = %operation.name(), method = %request.method, url = %request.url, "sending request");
        let response = self
            .transport
            .send(request)
            .await
            .map_err(ClientError::Transport)?;
        debug!(operation = %operation.name(), status = response.status, "received response");

        self.parse_response(operation, response)
    }
}

impl<T> std::fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("signed", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

fn encode_body(media_type: &str, body: opcodec_core::Body) -> Result<Bytes, ClientError> {
    let container = media_codec(media_type)
        .encode(body)
        .map_err(ClientError::Encode)?;
    container.to_bytes().map(Bytes::from).map_err(ClientError::Encode)
}

fn raw_response(response: &HttpResponse) -> ApiResponse {
    response.headers.iter().fold(
        ApiResponse::binary(response.status, response.body.clone()),
        |api_response, (name, value)| api_response.with_header(name, value.as_str()),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use opcodec_core::{error_kinds, Body, HttpMethod, PathError, ResponseContent};
    use serde_json::json;

    use super::*;
    use crate::signer::BearerSigner;

    fn client() -> ApiClient<()> {
        ApiClient::new(ClientConfig::new("http://localhost:3000/"), ())
    }

    fn create_item() -> Operation {
        Operation::new(HttpMethod::Post, "/items/{itemId}")
            .with_request_body(true, ["application/json"])
            .with_success_codes([200, 201])
    }

    fn response(status: u16, content_type: Option<&str>, body: &[u8]) -> HttpResponse {
        let mut headers = vec![("content-length".to_string(), body.len().to_string())];
        if let Some(content_type) = content_type {
            headers.push(("Content-Type".to_string(), content_type.to_string()));
        }
        HttpResponse {
            status,
            headers,
            body: Bytes::copy_from_slice(body),
        }
    }

    #[test]
    fn builds_url_headers_and_body() {
        let payload = RequestPayload::new()
            .path_param("itemId", "a b/c")
            .query("dryRun", true)
            .query("absent", None::<&str>)
            .header("X-Tenant", "acme")
            .header("X-Skip", None::<i64>)
            .cookie("session", "s1")
            .cookie("theme", "dark")
            .body(Body::json(json!({"name": "widget"})));
        let request = client().build_request(&create_item(), &payload).unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "http://localhost:3000/items/a%20b%2Fc?dryRun=true");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("x-tenant"), Some("acme"));
        assert_eq!(request.header("x-skip"), None);
        assert_eq!(request.header("cookie"), Some("session=s1; theme=dark"));
        assert_eq!(request.body, Some(Bytes::from_static(br#"{"name":"widget"}"#)));
    }

    #[test]
    fn explicit_media_type_wins() {
        let operation = Operation::new(HttpMethod::Post, "/forms")
            .with_request_body(true, ["application/json", "application/x-www-form-urlencoded"]);
        let payload = RequestPayload::new()
            .media_type("application/x-www-form-urlencoded")
            .header("content-type", "text/plain")
            .body(Body::form([("q", "rust lang")]));
        let request = client().build_request(&operation, &payload).unwrap();
        assert_eq!(request.header("content-type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(request.body, Some(Bytes::from_static(b"q=rust+lang")));
    }

    #[test]
    fn default_media_type_is_binary() {
        let operation = Operation::new(HttpMethod::Put, "/blobs");
        let payload = RequestPayload::new().body(Body::binary(vec![1u8, 2, 3]));
        let request = client().build_request(&operation, &payload).unwrap();
        assert_eq!(request.header("content-type"), Some("application/octet-stream"));
        assert_eq!(request.body, Some(Bytes::from_static(&[1, 2, 3])));
    }

    #[test]
    fn no_body_means_no_payload_and_no_content_type() {
        let request = client()
            .build_request(&create_item(), &RequestPayload::new().path_param("itemId", 1))
            .unwrap();
        assert!(request.body.is_none());
        assert_eq!(request.header("content-type"), None);
    }

    #[test]
    fn missing_path_parameter_is_fatal() {
        let err = client()
            .build_request(&create_item(), &RequestPayload::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Path(PathError::MissingParameter { ref name, .. }) if name == "itemId"
        ));
    }

    #[test]
    fn mismatched_body_fails_to_encode() {
        let payload = RequestPayload::new()
            .path_param("itemId", 1)
            .body(Body::binary(vec![0u8]));
        let err = client().build_request(&create_item(), &payload).unwrap_err();
        assert!(matches!(err, ClientError::Encode(_)));
    }

    #[test]
    fn success_statuses_decode_by_content_type() {
        let parsed = client()
            .parse_response(
                &create_item(),
                response(201, Some("application/json; charset=utf-8"), br#"{"id":7}"#),
            )
            .unwrap();
        assert_eq!(parsed.status_code, 201);
        assert_eq!(parsed.content, ResponseContent::Json(Some(json!({"id": 7}))));
    }

    #[test]
    fn empty_bodies_decode_to_empty() {
        let operation = Operation::new(HttpMethod::Delete, "/items/{itemId}");
        let parsed = client()
            .parse_response(&operation, response(204, None, b""))
            .unwrap();
        assert_eq!(parsed.content, ResponseContent::Empty);
    }

    #[test]
    fn undeclared_status_with_error_body_is_http_error() {
        let body = br#"{"kind":"NOT_FOUND","message":"no item 7"}"#;
        let err = client()
            .parse_response(&create_item(), response(404, Some("application/json"), body))
            .unwrap_err();
        let ClientError::Http(err) = err else {
            panic!("expected a structured error, got {err:?}");
        };
        assert_eq!(err.status_code, 404);
        assert_eq!(err.kind, error_kinds::NOT_FOUND);
        assert_eq!(err.message, "no item 7");
    }

    #[test]
    fn undeclared_status_without_error_body_is_raw_response() {
        let err = client()
            .parse_response(&create_item(), response(502, Some("text/html"), b"<h1>Bad gateway</h1>"))
            .unwrap_err();
        assert_eq!(err.status_code(), Some(502));
        let ClientError::UnexpectedResponse(raw) = err else {
            panic!("expected the raw response");
        };
        assert_eq!(raw.content, ResponseContent::Html("<h1>Bad gateway</h1>".to_string()));
    }

    #[test]
    fn undecodable_error_body_keeps_raw_bytes() {
        let err = client()
            .parse_response(&create_item(), response(500, Some("application/json"), b"oops"))
            .unwrap_err();
        let ClientError::UnexpectedResponse(raw) = err else {
            panic!("expected the raw response");
        };
        assert_eq!(raw.content, ResponseContent::Binary(Bytes::from_static(b"oops")));
    }

    #[test]
    fn without_success_codes_every_status_succeeds() {
        let operation = Operation::new(HttpMethod::Get, "/items");
        let parsed = client()
            .parse_response(&operation, response(500, Some("text/plain"), b"still fine"))
            .unwrap();
        assert_eq!(parsed.status_code, 500);
    }

    /// Records sent requests and answers with a canned response.
    struct StubTransport {
        sent: Mutex<Vec<HttpRequest>>,
        reply: HttpResponse,
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: HttpRequest) -> anyhow::Result<HttpResponse> {
            self.sent.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _request: HttpRequest) -> anyhow::Result<HttpResponse> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn call_signs_before_sending() {
        let transport = StubTransport {
            sent: Mutex::new(Vec::new()),
            reply: response(200, Some("text/plain"), b"ok"),
        };
        let client = ApiClient::new(ClientConfig::new("http://api"), transport)
            .with_signer(BearerSigner::new("t0k3n"));
        let payload = RequestPayload::new().path_param("itemId", 3);
        let parsed = client.call(&create_item(), &payload).await.unwrap();
        assert_eq!(parsed.content, ResponseContent::Text("ok".to_string()));

        let sent = client.transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("authorization"), Some("Bearer t0k3n"));
        assert_eq!(sent[0].url, "http://api/items/3");
    }

    #[tokio::test]
    async fn signing_failures_propagate_unchanged() {
        let client = ApiClient::new(ClientConfig::new("http://api"), FailingTransport)
            .with_signer(BearerSigner::new(""));
        let payload = RequestPayload::new().path_param("itemId", 3);
        let err = client.call(&create_item(), &payload).await.unwrap_err();
        assert!(matches!(err, ClientError::Signing(_)));
        assert_eq!(err.to_string(), "bearer token is empty");
    }

    #[tokio::test]
    async fn transport_failures_propagate_unchanged() {
        let client = ApiClient::new(ClientConfig::new("http://api"), FailingTransport);
        let payload = RequestPayload::new().path_param("itemId", 3);
        let err = client.call(&create_item(), &payload).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.to_string(), "connection refused");
    }
}
