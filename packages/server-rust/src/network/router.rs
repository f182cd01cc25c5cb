//! Maps operation servers onto axum routes.
//!
//! Each HTTP request is adapted into an [`ApiGatewayEvent`] the way an API
//! gateway would: lower-cased headers, cookies split into their own array,
//! text bodies passed as-is and everything else base64-encoded. The
//! resulting [`ApiGatewayResult`] is turned back into an HTTP response.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::extract::{FromRequest, Path, Query, Request};
use axum::http::header::{HeaderName, HeaderValue, COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, MethodFilter, MethodRouter};
use axum::{Json, RequestPartsExt, Router};
use opcodec_core::{HttpError, HttpMethod, MediaContainer};
use serde_json::json;
use tracing::{error, warn};

use super::config::NetworkConfig;
use super::middleware::{with_http_layers, REQUEST_ID_HEADER};
use crate::event::{ApiGatewayEvent, ApiGatewayResult, RequestContext};
use crate::service::{Authorizer, AuthorizerEntrypoint, OperationServer};

type SharedAuthorizer = AuthorizerEntrypoint<Arc<dyn Authorizer>>;

/// Path served by the host itself.
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("an operation is already registered for {method} {pattern}")]
    Duplicate { method: HttpMethod, pattern: String },
    #[error("{pattern} is reserved by the host")]
    Reserved { pattern: String },
    #[error("invalid path pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },
}

/// Collects operation servers and builds the axum router serving them.
#[derive(Default)]
pub struct OperationRouter {
    /// Servers keyed by their axum route path.
    servers: Vec<(String, OperationServer)>,
    authorizer: Option<SharedAuthorizer>,
}

impl OperationRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server under its operation's method and path pattern.
    ///
    /// Patterns that differ only in placeholder names are the same route.
    ///
    /// # Errors
    ///
    /// - [`RouteError::InvalidPattern`] when the pattern cannot be routed.
    /// - [`RouteError::Reserved`] for [`HEALTH_PATH`].
    /// - [`RouteError::Duplicate`] when the method and route are taken.
    pub fn register(&mut self, server: OperationServer) -> Result<(), RouteError> {
        let operation = server.operation();
        let path = route_path(&operation.path.pattern)?;
        if path == HEALTH_PATH {
            return Err(RouteError::Reserved {
                pattern: operation.path.pattern.clone(),
            });
        }
        let taken = self.servers.iter().any(|(existing_path, existing)| {
            *existing_path == path && existing.operation().method == operation.method
        });
        if taken {
            return Err(RouteError::Duplicate {
                method: operation.method,
                pattern: operation.path.pattern.clone(),
            });
        }
        self.servers.push((path, server));
        Ok(())
    }

    /// Run `authorizer` before every operation. Allowed requests carry the
    /// authorizer context as `{"lambda": context}`; denied requests get 403.
    #[must_use]
    pub fn with_authorizer<A>(mut self, authorizer: A) -> Self
    where
        A: Authorizer + 'static,
    {
        let shared: Arc<dyn Authorizer> = Arc::new(authorizer);
        self.authorizer = Some(AuthorizerEntrypoint::new(shared));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Build the axum router: one route per path pattern, one method handler
    /// per operation, plus `GET /health`, wrapped in the HTTP layers.
    pub fn into_router(self, config: &NetworkConfig) -> Router {
        let operations = self.servers.len();
        let mut routes: BTreeMap<String, MethodRouter> = BTreeMap::new();

        for (path, server) in self.servers {
            let filter = method_filter(server.operation().method);
            let route = Route {
                parameter_names: server
                    .operation()
                    .path
                    .parameter_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                server,
                authorizer: self.authorizer.clone(),
                max_body_bytes: config.max_body_bytes,
            };
            let handler = move |request: Request| {
                let route = route.clone();
                async move { route.dispatch(request).await }
            };
            let methods = routes.remove(&path).unwrap_or_else(MethodRouter::new);
            routes.insert(path, methods.on(filter, handler));
        }

        let health = get(move || async move {
            Json(json!({"status": "ok", "operations": operations}))
        });
        let router = routes
            .into_iter()
            .fold(Router::new().route(HEALTH_PATH, health), |router, (path, methods)| {
                router.route(&path, methods)
            });
        with_http_layers(router, config)
    }
}

/// The axum path for `pattern`. Placeholders are renamed by position
/// (`{p0}`, `{p1}`, ...) so routes never disagree on parameter names.
fn route_path(pattern: &str) -> Result<String, RouteError> {
    let invalid = |reason| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };
    let rest = pattern
        .strip_prefix('/')
        .ok_or_else(|| invalid("must start with '/'"))?;

    let mut position = 0;
    let mut segments = Vec::new();
    for segment in rest.split('/') {
        if segment.starts_with([':', '*']) {
            return Err(invalid("segments may not start with ':' or '*'"));
        }
        if !segment.contains(['{', '}']) {
            segments.push(segment.to_string());
            continue;
        }
        let whole = segment
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .is_some_and(|name| !name.is_empty() && !name.contains(['{', '}', '*']));
        if !whole {
            return Err(invalid("a placeholder must span a whole segment"));
        }
        segments.push(format!("{{p{position}}}"));
        position += 1;
    }
    Ok(format!("/{}", segments.join("/")))
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::Options => MethodFilter::OPTIONS,
        HttpMethod::Head => MethodFilter::HEAD,
        HttpMethod::Patch => MethodFilter::PATCH,
        HttpMethod::Trace => MethodFilter::TRACE,
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct Route {
    server: OperationServer,
    authorizer: Option<SharedAuthorizer>,
    /// Placeholder names of the operation's pattern, in path order.
    parameter_names: Vec<String>,
    max_body_bytes: usize,
}

impl Route {
    async fn dispatch(self, request: Request) -> Response {
        let event = match self.read_event(request).await {
            Ok(event) => event,
            Err(rejection) => return into_response(rejection),
        };
        let event = match &self.authorizer {
            Some(authorizer) => match authorize(authorizer, event).await {
                Ok(event) => event,
                Err(result) => return into_response(result),
            },
            None => event,
        };
        into_response(self.server.handle_event(event).await)
    }

    async fn read_event(&self, request: Request) -> Result<ApiGatewayEvent, ApiGatewayResult> {
        let (mut parts, body) = request.into_parts();

        let path_parameters = if self.parameter_names.is_empty() {
            HashMap::new()
        } else {
            let Path(values) = parts
                .extract::<Path<Vec<String>>>()
                .await
                .map_err(|rejection| error_result(&HttpError::bad_request(rejection.body_text())))?;
            self.parameter_names.iter().cloned().zip(values).collect()
        };
        let Query(query) = parts
            .extract::<Query<HashMap<String, String>>>()
            .await
            .map_err(|rejection| error_result(&HttpError::bad_request(rejection.body_text())))?;

        let headers = event_headers(&parts.headers);
        let cookies: Vec<String> = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .map(str::trim)
            .filter(|cookie| !cookie.is_empty())
            .map(str::to_string)
            .collect();
        let raw_path = parts.uri.path().to_string();

        let bytes = match Bytes::from_request(Request::from_parts(parts, body), &()).await {
            Ok(bytes) => bytes,
            Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_))) => {
                return Err(error_result(&HttpError::payload_too_large(self.max_body_bytes)));
            }
            Err(rejection) => {
                return Err(error_result(&HttpError::bad_request(rejection.body_text())));
            }
        };
        let (body, is_base64_encoded) = if bytes.is_empty() {
            (None, false)
        } else {
            let container =
                MediaContainer::from_wire(&bytes, headers.get("content-type").map(String::as_str));
            (Some(container.body), container.is_base64_encoded)
        };

        Ok(ApiGatewayEvent {
            raw_path: Some(raw_path),
            path_parameters,
            query_string_parameters: query,
            request_context: RequestContext {
                request_id: headers.get(REQUEST_ID_HEADER).cloned(),
                authorizer: None,
            },
            headers,
            cookies: (!cookies.is_empty()).then_some(cookies),
            body,
            is_base64_encoded,
        })
    }
}

/// JSON error result for failures raised by the host before the pipeline runs.
fn error_result(error: &HttpError) -> ApiGatewayResult {
    ApiGatewayResult::from_response(&error.to_response())
        .unwrap_or_else(|_| ApiGatewayResult::internal_error(&error.message))
}

/// Header map with multi-valued headers joined by `,`. Cookies are left out;
/// they travel in the event's cookie array.
fn event_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        if *name == COOKIE {
            continue;
        }
        let Ok(value) = value.to_str() else {
            continue;
        };
        map.entry(name.as_str().to_string())
            .and_modify(|joined| {
                joined.push(',');
                joined.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    map
}

async fn authorize(
    authorizer: &SharedAuthorizer,
    mut event: ApiGatewayEvent,
) -> Result<ApiGatewayEvent, ApiGatewayResult> {
    match authorizer.handle(event.clone()).await {
        Ok(decision) if decision.is_authorized => {
            event.request_context.authorizer = Some(json!({"lambda": decision.context}));
            Ok(event)
        }
        Ok(_) => Err(error_result(&HttpError::forbidden("Forbidden"))),
        Err(err) => {
            error!(error = ?err, "authorizer failed");
            Err(ApiGatewayResult::internal_error("Internal server error"))
        }
    }
}

fn into_response(result: ApiGatewayResult) -> Response {
    let body = match result.body_bytes() {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, "result body is not valid base64");
            return into_response(ApiGatewayResult::internal_error("Internal server error"));
        }
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() =
        StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in &result.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!(header = %name, "dropping invalid response header"),
        }
    }
    response
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
