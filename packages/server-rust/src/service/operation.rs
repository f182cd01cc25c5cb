//! The server pipeline for one operation.
//!
//! An inbound [`ApiGatewayEvent`] moves through
//! `raw_request -> validate -> request -> handle -> classify -> response ->
//! encode -> raw_response`. Any stage up to `handle` may fail; the failure is
//! classified into a response and the remaining stages still run, so every
//! event ends in a well-formed [`ApiGatewayResult`].

use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures_util::FutureExt;
use opcodec_core::{
    encode_params, media_codec, parse_media_type, stringify_params, ApiResponse, Codec, HttpError,
    MediaContainer, Operation, ValidationField,
};
use serde_json::{json, Value};
use tower::Service;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::config::ServerConfig;
use super::failure::Failure;
use super::handler::Handler;
use super::middleware::Middleware;
use super::request::{parse_cookies, to_object, ApiRequest};
use super::validator::Validators;
use crate::event::{ApiGatewayEvent, ApiGatewayResult};

// ---------------------------------------------------------------------------
// OperationServer
// ---------------------------------------------------------------------------

/// Serves one [`Operation`] with a handler, optional validators and optional
/// middleware.
///
/// Cloning is cheap; all clones share the same handler and descriptor.
#[derive(Clone)]
pub struct OperationServer {
    operation: Arc<Operation>,
    handler: Arc<dyn Handler>,
    validators: Validators,
    middleware: Option<Arc<dyn Middleware>>,
    config: Arc<ServerConfig>,
}

impl OperationServer {
    pub fn new<H>(operation: Operation, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        Self {
            operation: Arc::new(operation),
            handler: Arc::new(handler),
            validators: Validators::default(),
            middleware: None,
            config: Arc::new(ServerConfig::default()),
        }
    }

    #[must_use]
    pub fn with_validators(mut self, validators: Validators) -> Self {
        self.validators = validators;
        self
    }

    #[must_use]
    pub fn with_middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middleware = Some(Arc::new(middleware));
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Run one event through the pipeline. Never fails.
    pub async fn handle_event(&self, event: ApiGatewayEvent) -> ApiGatewayResult {
        let span = info_span!(
            "operation",
            operation = %self.operation.name(),
            method = self.operation.method.as_str(),
            path = %self.operation.path.pattern,
            request_id = event.request_context.request_id.as_deref().unwrap_or_default(),
            status_code = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );
        self.run(event).instrument(span).await
    }

    async fn run(&self, event: ApiGatewayEvent) -> ApiGatewayResult {
        let start = Instant::now();

        let (response, failure) = match self.process(event).await {
            Ok(response) => (response, None),
            Err(failure) => {
                self.report(&failure);
                let response = failure.to_response(&self.config.internal_error_message);
                (response, Some(failure))
            }
        };

        let response = match &self.middleware {
            Some(middleware) => middleware.response(response, failure.as_ref()).await,
            None => response,
        };

        let result = match ApiGatewayResult::from_response(&response) {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "failed to encode response");
                ApiGatewayResult::internal_error(&self.config.internal_error_message)
            }
        };

        let result = match &self.middleware {
            Some(middleware) => middleware.raw_response(result).await,
            None => result,
        };

        let outcome = failure.as_ref().map_or("ok", Failure::outcome);
        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;
        let span = tracing::Span::current();
        span.record("status_code", result.status_code);
        span.record("duration_ms", duration_ms);
        span.record("outcome", outcome);
        info!(
            status_code = result.status_code,
            duration_ms, outcome, "operation complete"
        );

        result
    }

    /// Stages that may fail: raw request hook, validation, request hook, handler.
    async fn process(&self, event: ApiGatewayEvent) -> Result<ApiResponse, Failure> {
        let event = match &self.middleware {
            Some(middleware) => middleware.raw_request(event).await?,
            None => event,
        };
        let request = self.validate(event)?;
        let request = match &self.middleware {
            Some(middleware) => middleware.request(request, &self.operation).await?,
            None => request,
        };
        self.invoke(request).await
    }

    /// Call the handler, turning a panic into an unclassified failure.
    async fn invoke(&self, request: ApiRequest) -> Result<ApiResponse, Failure> {
        match AssertUnwindSafe(self.handler.handle(request))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => Err(Failure::Internal(anyhow::anyhow!(
                "handler panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }

    fn validate(&self, event: ApiGatewayEvent) -> Result<ApiRequest, HttpError> {
        let ApiGatewayEvent {
            path_parameters,
            query_string_parameters,
            headers,
            cookies,
            body,
            is_base64_encoded,
            request_context,
            ..
        } = event;

        let headers = encode_params(&headers);
        let path = stringify_params(&path_parameters);
        let query = stringify_params(&query_string_parameters);
        let cookies = parse_cookies(
            cookies.as_deref(),
            headers.get("cookie").map(String::as_str),
        );
        let authorizer = request_context.authorizer;

        let validators = &self.validators;
        validators.check(ValidationField::Path, || to_object(&path))?;
        validators.check(ValidationField::QueryString, || to_object(&query))?;
        validators.check(ValidationField::Cookie, || to_object(&cookies))?;
        validators.check(ValidationField::Header, || to_object(&headers))?;
        validators.check(ValidationField::Authorizer, || {
            authorizer.clone().unwrap_or(Value::Null)
        })?;

        let mut request = ApiRequest {
            path,
            query,
            headers,
            cookies,
            authorizer,
            media_type: None,
            body: None,
        };

        let Some(spec) = &self.operation.request_body else {
            return Ok(request);
        };
        let content_type = request
            .headers
            .get("content-type")
            .and_then(|value| parse_media_type(value));
        let Some(media_type) = content_type else {
            if spec.required {
                return Err(HttpError::unprocessable_content(
                    "a content-type header is required for this request body",
                ));
            }
            return Ok(request);
        };
        if !self.operation.accepts(&media_type) {
            return Err(HttpError::unsupported_media_type(&media_type));
        }

        let container = MediaContainer {
            body: body.unwrap_or_default(),
            is_base64_encoded,
        };
        let decoded = media_codec(&media_type).decode(container).map_err(|err| {
            HttpError::bad_request("request body could not be decoded")
                .with_details(Value::String(err.to_string()))
        })?;
        validators.check(ValidationField::Body, || {
            json!({"mediaType": media_type, "body": decoded.to_value()})
        })?;

        request.media_type = Some(media_type);
        request.body = Some(decoded);
        Ok(request)
    }

    fn report(&self, failure: &Failure) {
        match failure {
            Failure::Internal(err) => {
                error!(error = ?err, "unclassified failure, responding with internal error");
            }
            Failure::Http(err) if err.is_server_error() => {
                error!(kind = %err.kind, message = %err.message, "operation failed");
            }
            Failure::Http(err) if self.config.log_rejections => {
                warn!(
                    kind = %err.kind,
                    status_code = err.status_code,
                    message = %err.message,
                    "request rejected"
                );
            }
            Failure::Http(err) => {
                debug!(kind = %err.kind, status_code = err.status_code, "request rejected");
            }
            Failure::Response(response) => {
                debug!(status_code = response.status_code, "short-circuit response");
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl fmt::Debug for OperationServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationServer")
            .field("operation", &self.operation)
            .field("validators", &self.validators)
            .field("middleware", &self.middleware.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// tower::Service
// ---------------------------------------------------------------------------

impl Service<ApiGatewayEvent> for OperationServer {
    type Response = ApiGatewayResult;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<ApiGatewayResult, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: ApiGatewayEvent) -> Self::Future {
        let server = self.clone();
        Box::pin(async move { Ok(server.handle_event(event).await) })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use opcodec_core::{error_kinds, Body, HttpMethod};
    use tower::ServiceExt;

    use super::*;
    use crate::service::handler::{handler_fn, json_handler_fn};
    use crate::service::validator::Validator;

    fn body_json(result: &ApiGatewayResult) -> Value {
        serde_json::from_str(&result.body).unwrap()
    }

    /// Echoes the decoded request back as JSON.
    fn echo_server(operation: Operation) -> OperationServer {
        OperationServer::new(
            operation,
            handler_fn(|request: ApiRequest| async move {
                Ok::<_, Failure>(ApiResponse::json(
                    200,
                    json!({
                        "path": to_object(&request.path),
                        "query": to_object(&request.query),
                        "cookies": to_object(&request.cookies),
                        "mediaType": request.media_type,
                        "body": request.body.as_ref().map(Body::to_value),
                    }),
                ))
            }),
        )
    }

    fn post_items() -> Operation {
        Operation::new(HttpMethod::Post, "/items/{itemId}").with_request_body(
            true,
            ["application/json", "application/x-www-form-urlencoded", "text/plain"],
        )
    }

    #[tokio::test]
    async fn decodes_json_bodies() {
        let server = echo_server(post_items());
        let event = ApiGatewayEvent::new()
            .with_path_parameter("itemId", "7")
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body(r#"{"a":1}"#);
        let result = server.handle_event(event).await;
        assert_eq!(result.status_code, 200);
        let body = body_json(&result);
        assert_eq!(body["mediaType"], "application/json");
        assert_eq!(body["body"], json!({"a": 1}));
        assert_eq!(body["path"], json!({"itemId": "7"}));
    }

    #[tokio::test]
    async fn decodes_form_bodies() {
        let server = echo_server(post_items());
        let event = ApiGatewayEvent::new()
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_body("name=Ada+Lovelace&lang=en");
        let body = body_json(&server.handle_event(event).await);
        assert_eq!(body["body"], json!({"name": "Ada Lovelace", "lang": "en"}));
    }

    #[tokio::test]
    async fn undeclared_content_type_is_unsupported() {
        let server = echo_server(post_items());
        let event = ApiGatewayEvent::new()
            .with_header("content-type", "application/xml")
            .with_body("<a/>");
        let result = server.handle_event(event).await;
        assert_eq!(result.status_code, 415);
        assert_eq!(body_json(&result)["kind"], error_kinds::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn missing_content_type_for_required_body_is_unprocessable() {
        let server = echo_server(post_items());
        let result = server.handle_event(ApiGatewayEvent::new().with_body("x")).await;
        assert_eq!(result.status_code, 422);
        assert_eq!(body_json(&result)["kind"], error_kinds::UNPROCESSABLE_CONTENT);
    }

    #[tokio::test]
    async fn missing_content_type_for_optional_body_skips_decoding() {
        let operation =
            Operation::new(HttpMethod::Put, "/notes").with_request_body(false, ["text/plain"]);
        let result = echo_server(operation)
            .handle_event(ApiGatewayEvent::new().with_body("ignored"))
            .await;
        assert_eq!(result.status_code, 200);
        assert_eq!(body_json(&result)["body"], Value::Null);
    }

    #[tokio::test]
    async fn operations_without_body_ignore_it() {
        let operation = Operation::new(HttpMethod::Get, "/items");
        let event = ApiGatewayEvent::new()
            .with_header("content-type", "application/xml")
            .with_body("<a/>");
        let result = echo_server(operation).handle_event(event).await;
        assert_eq!(result.status_code, 200);
        assert_eq!(body_json(&result)["mediaType"], Value::Null);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let server = echo_server(post_items());
        let event = ApiGatewayEvent::new()
            .with_header("content-type", "application/json")
            .with_body("{not json");
        let result = server.handle_event(event).await;
        assert_eq!(result.status_code, 400);
        assert_eq!(body_json(&result)["kind"], error_kinds::BAD_REQUEST);
    }

    #[tokio::test]
    async fn base64_text_bodies_are_unwrapped() {
        let server = echo_server(post_items());
        let event = ApiGatewayEvent::new()
            .with_header("content-type", "text/plain")
            .with_binary_body("héllo".as_bytes());
        let body = body_json(&server.handle_event(event).await);
        assert_eq!(body["body"], "héllo");
    }

    #[tokio::test]
    async fn query_validation_failure_is_tagged() {
        let validators = Validators::new().with(
            ValidationField::QueryString,
            Validator::predicate(
                |query| query.get("limit").is_some(),
                |_| json!([{"path": "limit", "message": "required"}]),
            ),
        );
        let server = echo_server(Operation::new(HttpMethod::Get, "/items")).with_validators(validators);
        let result = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(result.status_code, 400);
        let body = body_json(&result);
        assert_eq!(body["kind"], error_kinds::VALIDATION_ERROR_QUERY_STRING);
        assert_eq!(body["details"], json!([{"path": "limit", "message": "required"}]));
    }

    #[tokio::test]
    async fn header_validators_see_lower_cased_names() {
        let validators = Validators::new().with(
            ValidationField::Header,
            Validator::predicate(|headers| headers.get("x-api-key").is_some(), |_| json!("key")),
        );
        let server = echo_server(Operation::new(HttpMethod::Get, "/")).with_validators(validators);
        let ok = server
            .handle_event(ApiGatewayEvent::new().with_header("X-Api-Key", "k"))
            .await;
        assert_eq!(ok.status_code, 200);
        let rejected = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(body_json(&rejected)["kind"], error_kinds::VALIDATION_ERROR_HEADER);
    }

    #[tokio::test]
    async fn cookie_and_authorizer_validation() {
        let validators = Validators::new()
            .with(
                ValidationField::Cookie,
                Validator::predicate(|c| c.get("session").is_some(), |_| json!("session")),
            )
            .with(
                ValidationField::Authorizer,
                Validator::predicate(|a| a.get("userId").is_some(), |_| json!("userId")),
            );
        let server = echo_server(Operation::new(HttpMethod::Get, "/")).with_validators(validators);

        let no_cookie = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(body_json(&no_cookie)["kind"], error_kinds::VALIDATION_ERROR_COOKIE);

        let no_authorizer = server
            .handle_event(ApiGatewayEvent::new().with_cookie("session=s=1"))
            .await;
        assert_eq!(
            body_json(&no_authorizer)["kind"],
            error_kinds::VALIDATION_ERROR_AUTHORIZER
        );

        let ok = server
            .handle_event(
                ApiGatewayEvent::new()
                    .with_header("cookie", "session=s=1")
                    .with_authorizer(json!({"userId": "u-1"})),
            )
            .await;
        assert_eq!(ok.status_code, 200);
        assert_eq!(body_json(&ok)["cookies"], json!({"session": "s=1"}));
    }

    #[tokio::test]
    async fn body_validator_sees_media_type_and_body() {
        let validators = Validators::new().with(
            ValidationField::Body,
            Validator::new(|data| {
                if data["mediaType"] == "application/json" && data["body"]["a"].is_number() {
                    Ok(())
                } else {
                    Err(json!({"received": data.clone()}))
                }
            }),
        );
        let server = echo_server(post_items()).with_validators(validators);
        let event = |body: &str| {
            ApiGatewayEvent::new()
                .with_header("content-type", "application/json")
                .with_body(body)
        };
        assert_eq!(server.handle_event(event(r#"{"a":1}"#)).await.status_code, 200);
        let rejected = server.handle_event(event(r#"{"a":"x"}"#)).await;
        assert_eq!(body_json(&rejected)["kind"], error_kinds::VALIDATION_ERROR_BODY);
    }

    #[tokio::test]
    async fn plain_values_from_handlers_are_internal_errors() {
        let server = OperationServer::new(
            Operation::new(HttpMethod::Get, "/"),
            json_handler_fn(|_| async { Ok::<_, Failure>(json!(42)) }),
        );
        let result = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(result.status_code, 500);
        let body = body_json(&result);
        assert_eq!(body["kind"], error_kinds::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "handler must return an ApiResponse");
    }

    #[tokio::test]
    async fn unclassified_failures_are_masked() {
        let server = OperationServer::new(
            Operation::new(HttpMethod::Get, "/"),
            handler_fn(|_| async {
                Err::<ApiResponse, Failure>(anyhow::anyhow!("connection string leaked").into())
            }),
        );
        let result = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(result.status_code, 500);
        assert!(!result.body.contains("leaked"));
        assert_eq!(body_json(&result)["message"], "Internal server error");
    }

    #[tokio::test]
    async fn internal_error_message_is_configurable() {
        let server = OperationServer::new(
            Operation::new(HttpMethod::Get, "/"),
            handler_fn(|_| async {
                Err::<ApiResponse, Failure>(anyhow::anyhow!("boom").into())
            }),
        )
        .with_config(ServerConfig {
            internal_error_message: "Something went wrong".to_string(),
            ..ServerConfig::default()
        });
        let result = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(body_json(&result)["message"], "Something went wrong");
    }

    #[tokio::test]
    async fn handler_panics_become_internal_errors() {
        let server = OperationServer::new(
            Operation::new(HttpMethod::Get, "/"),
            handler_fn(|request: ApiRequest| async move {
                if request.path.is_empty() {
                    panic!("handler bug");
                }
                Ok::<_, Failure>(ApiResponse::empty(204))
            }),
        );
        let result = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(result.status_code, 500);
        assert!(!result.body.contains("handler bug"));
    }

    #[tokio::test]
    async fn thrown_responses_are_used_verbatim() {
        let server = OperationServer::new(
            Operation::new(HttpMethod::Get, "/"),
            handler_fn(|_| async {
                Err::<ApiResponse, Failure>(
                    ApiResponse::text(429, "slow down").with_header("Retry-After", 5).into(),
                )
            }),
        );
        let result = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(result.status_code, 429);
        assert_eq!(result.body, "slow down");
        assert_eq!(result.headers.get("retry-after").map(String::as_str), Some("5"));
        assert_eq!(result.headers.get("content-type").map(String::as_str), Some("text/plain"));
    }

    #[tokio::test]
    async fn structured_errors_render_as_json() {
        let server = OperationServer::new(
            Operation::new(HttpMethod::Get, "/"),
            handler_fn(|_| async {
                Err::<ApiResponse, Failure>(
                    HttpError::conflict("version mismatch").with_code("E_VERSION").into(),
                )
            }),
        );
        let result = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(result.status_code, 409);
        assert_eq!(
            body_json(&result),
            json!({"kind": "CONFLICT", "code": "E_VERSION", "message": "version mismatch"})
        );
    }

    /// Records the hook order and the failure seen by `response`.
    #[derive(Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        reject_request: bool,
    }

    impl Recorder {
        fn push(&self, entry: impl Into<String>) {
            self.calls.lock().unwrap().push(entry.into());
        }
    }

    #[async_trait]
    impl Middleware for Recorder {
        async fn raw_request(&self, event: ApiGatewayEvent) -> Result<ApiGatewayEvent, Failure> {
            self.push("raw_request");
            Ok(event.with_header("x-injected", "yes"))
        }

        async fn request(
            &self,
            request: ApiRequest,
            operation: &Operation,
        ) -> Result<ApiRequest, Failure> {
            self.push(format!("request {}", operation.name()));
            if self.reject_request {
                return Err(HttpError::forbidden("nope").into());
            }
            Ok(request)
        }

        async fn response(&self, response: ApiResponse, failure: Option<&Failure>) -> ApiResponse {
            self.push(format!("response {}", failure.map_or("none", Failure::outcome)));
            response.with_header("x-hooked", "1")
        }

        async fn raw_response(&self, mut result: ApiGatewayResult) -> ApiGatewayResult {
            self.push("raw_response");
            result.headers.insert("x-raw".to_string(), "1".to_string());
            result
        }
    }

    fn recording_server(reject_request: bool) -> (OperationServer, Arc<Mutex<Vec<String>>>) {
        let recorder = Recorder {
            reject_request,
            ..Recorder::default()
        };
        let calls = Arc::clone(&recorder.calls);
        let handler_calls = Arc::clone(&calls);
        let server = OperationServer::new(
            Operation::new(HttpMethod::Get, "/hooks").with_id("hooks"),
            handler_fn(move |request: ApiRequest| {
                let calls = Arc::clone(&handler_calls);
                async move {
                    calls.lock().unwrap().push("handler".to_string());
                    let injected = request.header("x-injected").unwrap_or("no").to_string();
                    Ok::<_, Failure>(ApiResponse::text(200, injected))
                }
            }),
        )
        .with_middleware(recorder);
        (server, calls)
    }

    #[tokio::test]
    async fn hooks_run_in_order() {
        let (server, calls) = recording_server(false);
        let result = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(result.body, "yes");
        assert_eq!(result.headers.get("x-hooked").map(String::as_str), Some("1"));
        assert_eq!(result.headers.get("x-raw").map(String::as_str), Some("1"));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["raw_request", "request hooks", "handler", "response none", "raw_response"]
        );
    }

    #[tokio::test]
    async fn response_hook_receives_the_failure() {
        let (server, calls) = recording_server(true);
        let result = server.handle_event(ApiGatewayEvent::new()).await;
        assert_eq!(result.status_code, 403);
        assert_eq!(result.headers.get("x-hooked").map(String::as_str), Some("1"));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["raw_request", "request hooks", "response rejected", "raw_response"]
        );
    }

    #[tokio::test]
    async fn serves_as_a_tower_service() {
        let server = echo_server(Operation::new(HttpMethod::Get, "/items"));
        let result = server
            .oneshot(ApiGatewayEvent::new().with_query("limit", "10"))
            .await
            .unwrap();
        assert_eq!(body_json(&result)["query"], json!({"limit": "10"}));
    }

    #[tokio::test]
    async fn concurrent_events_are_independent() {
        let server = echo_server(Operation::new(HttpMethod::Get, "/items/{itemId}"));
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let server = server.clone();
                tokio::spawn(async move {
                    let event = ApiGatewayEvent::new().with_path_parameter("itemId", i.to_string());
                    (i, server.handle_event(event).await)
                })
            })
            .collect();
        for task in tasks {
            let (i, result) = task.await.unwrap();
            assert_eq!(body_json(&result)["path"]["itemId"], i.to_string());
        }
    }
}
