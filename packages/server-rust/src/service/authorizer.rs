//! Authorizer entrypoint.
//!
//! An [`Authorizer`] turns an inbound event into an allow/deny decision.
//! [`AuthorizerEntrypoint`] wraps one so that an
//! [`AuthorizerError::Unauthorized`] failure becomes a plain denial instead
//! of an error; the gateway then sees a clean "not authorized" decision.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use opcodec_core::HttpError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::event::ApiGatewayEvent;

/// Decision returned to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResult {
    pub is_authorized: bool,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl AuthorizerResult {
    #[must_use]
    pub fn allow(context: Map<String, Value>) -> Self {
        Self {
            is_authorized: true,
            context,
        }
    }

    /// Denial with an empty context.
    #[must_use]
    pub fn deny() -> Self {
        Self {
            is_authorized: false,
            context: Map::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthorizerError {
    /// The caller is not authorized. Converted to a denial by the entrypoint.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A 401 [`HttpError`] is an unauthorized failure; any other status is not.
impl From<HttpError> for AuthorizerError {
    fn from(err: HttpError) -> Self {
        if err.status_code == 401 {
            Self::Unauthorized(err.message)
        } else {
            Self::Other(anyhow::Error::new(err))
        }
    }
}

#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, event: ApiGatewayEvent) -> Result<AuthorizerResult, AuthorizerError>;
}

#[async_trait]
impl<A: Authorizer + ?Sized> Authorizer for Arc<A> {
    async fn authorize(&self, event: ApiGatewayEvent) -> Result<AuthorizerResult, AuthorizerError> {
        (**self).authorize(event).await
    }
}

/// [`Authorizer`] from an async function.
pub struct AuthorizerFn<F> {
    f: F,
}

pub fn authorizer_fn<F, Fut>(f: F) -> AuthorizerFn<F>
where
    F: Fn(ApiGatewayEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AuthorizerResult, AuthorizerError>> + Send + 'static,
{
    AuthorizerFn { f }
}

#[async_trait]
impl<F, Fut> Authorizer for AuthorizerFn<F>
where
    F: Fn(ApiGatewayEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AuthorizerResult, AuthorizerError>> + Send + 'static,
{
    async fn authorize(&self, event: ApiGatewayEvent) -> Result<AuthorizerResult, AuthorizerError> {
        (self.f)(event).await
    }
}

/// Wraps an [`Authorizer`], containing unauthorized failures.
#[derive(Debug, Clone)]
pub struct AuthorizerEntrypoint<A> {
    authorizer: A,
}

impl<A: Authorizer> AuthorizerEntrypoint<A> {
    pub fn new(authorizer: A) -> Self {
        Self { authorizer }
    }

    /// Run the authorizer.
    ///
    /// # Errors
    ///
    /// Propagates [`AuthorizerError::Other`] unchanged. Unauthorized failures
    /// are returned as [`AuthorizerResult::deny`].
    pub async fn handle(&self, event: ApiGatewayEvent) -> Result<AuthorizerResult, AuthorizerError> {
        match self.authorizer.authorize(event).await {
            Err(AuthorizerError::Unauthorized(reason)) => {
                info!(reason = %reason, "authorizer denied request");
                Ok(AuthorizerResult::deny())
            }
            outcome => outcome,
        }
    }
}
