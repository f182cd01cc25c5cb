//! Operation handlers.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use opcodec_core::{ApiResponse, HttpError};
use serde_json::Value;

use super::failure::Failure;
use super::request::ApiRequest;

/// Handles one validated request.
///
/// Returning `Err(Failure::Response(..))` short-circuits with that response;
/// it is a recognized outcome, not an error.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: ApiRequest) -> Result<ApiResponse, Failure>;
}

/// [`Handler`] from an async function returning a typed response.
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async function as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse, Failure>> + Send + 'static,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ApiResponse, Failure>> + Send + 'static,
{
    async fn handle(&self, request: ApiRequest) -> Result<ApiResponse, Failure> {
        (self.f)(request).await
    }
}

/// [`Handler`] from an async function returning an untyped JSON value.
///
/// The value must have the shape `{statusCode, content: {mediaType?, body?},
/// headers?}`. Anything else is an internal error.
pub struct JsonHandlerFn<F, Fut> {
    f: F,
    _future: PhantomData<fn() -> Fut>,
}

pub fn json_handler_fn<F, Fut>(f: F) -> JsonHandlerFn<F, Fut>
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, Failure>> + Send + 'static,
{
    JsonHandlerFn {
        f,
        _future: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> Handler for JsonHandlerFn<F, Fut>
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, Failure>> + Send + 'static,
{
    async fn handle(&self, request: ApiRequest) -> Result<ApiResponse, Failure> {
        let value = (self.f)(request).await?;
        ApiResponse::from_value(value)
            .ok_or_else(|| HttpError::internal("handler must return an ApiResponse").into())
    }
}
