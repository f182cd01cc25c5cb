//! Pipeline hooks.
//!
//! Hooks run strictly in the order `raw_request -> request -> handler ->
//! response -> raw_response`. Each has a pass-through default, so an
//! implementation overrides only the stages it cares about.

use async_trait::async_trait;
use opcodec_core::{ApiResponse, Operation};

use super::failure::Failure;
use super::request::ApiRequest;
use crate::event::{ApiGatewayEvent, ApiGatewayResult};

#[async_trait]
pub trait Middleware: Send + Sync {
    /// Transform the raw event before any parsing.
    ///
    /// # Errors
    ///
    /// A failure short-circuits to error classification.
    async fn raw_request(&self, event: ApiGatewayEvent) -> Result<ApiGatewayEvent, Failure> {
        Ok(event)
    }

    /// Transform the validated request before it reaches the handler.
    ///
    /// # Errors
    ///
    /// A failure short-circuits to error classification.
    async fn request(
        &self,
        request: ApiRequest,
        _operation: &Operation,
    ) -> Result<ApiRequest, Failure> {
        Ok(request)
    }

    /// Transform the response before encoding. `failure` is the original
    /// failure when an earlier stage failed.
    async fn response(&self, response: ApiResponse, _failure: Option<&Failure>) -> ApiResponse {
        response
    }

    /// Final transform of the wire-ready result.
    async fn raw_response(&self, result: ApiGatewayResult) -> ApiGatewayResult {
        result
    }
}

#[cfg(test)]
mod tests {
    use opcodec_core::HttpMethod;

    use super::*;

    struct PassThrough;

    impl Middleware for PassThrough {}

    #[tokio::test]
    async fn defaults_pass_values_through() {
        let hooks = PassThrough;
        let event = ApiGatewayEvent::new().with_header("x", "1");
        assert_eq!(hooks.raw_request(event.clone()).await.unwrap(), event);

        let operation = Operation::new(HttpMethod::Get, "/");
        let request = ApiRequest::default();
        assert_eq!(hooks.request(request.clone(), &operation).await.unwrap(), request);

        let response = ApiResponse::text(200, "ok");
        assert_eq!(hooks.response(response.clone(), None).await, response);

        let result = ApiGatewayResult::internal_error("boom");
        assert_eq!(hooks.raw_response(result.clone()).await, result);
    }
}
