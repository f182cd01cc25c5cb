//! Request signing.

use async_trait::async_trait;

use crate::http::HttpRequest;

/// Signs or augments a built request before it is sent.
#[async_trait]
pub trait RequestSigner: Send + Sync {
    /// # Errors
    ///
    /// Any error aborts the call and reaches the caller unchanged.
    async fn sign(&self, request: HttpRequest) -> anyhow::Result<HttpRequest>;
}

/// Adds `authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerSigner {
    token: String,
}

impl BearerSigner {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerSigner").finish_non_exhaustive()
    }
}

#[async_trait]
impl RequestSigner for BearerSigner {
    async fn sign(&self, mut request: HttpRequest) -> anyhow::Result<HttpRequest> {
        if self.token.is_empty() {
            anyhow::bail!("bearer token is empty");
        }
        request
            .headers
            .insert("authorization".to_string(), format!("Bearer {}", self.token));
        Ok(request)
    }
}
