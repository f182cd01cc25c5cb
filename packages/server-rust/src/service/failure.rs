//! The failure type produced by pipeline stages.

use opcodec_core::{ApiResponse, HttpError};

/// A failure raised by a middleware hook, a validator, or a handler.
///
/// Classification, from most to least specific:
/// - [`Failure::Response`] is an early response sent as-is.
/// - [`Failure::Http`] is a typed error rendered as its JSON body.
/// - [`Failure::Internal`] is anything else and becomes a generic 500.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error("short-circuit response with status {}", .0.status_code)]
    Response(ApiResponse),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ApiResponse> for Failure {
    fn from(response: ApiResponse) -> Self {
        Self::Response(response)
    }
}

impl Failure {
    /// Wrap any error as an unclassified failure.
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(anyhow::Error::new(err))
    }

    /// The response sent for this failure. Unclassified failures become a
    /// generic internal error carrying `internal_message`.
    #[must_use]
    pub fn to_response(&self, internal_message: &str) -> ApiResponse {
        match self {
            Self::Response(response) => response.clone(),
            Self::Http(err) => err.to_response(),
            Self::Internal(_) => HttpError::internal(internal_message).to_response(),
        }
    }

    /// Short outcome label recorded on the operation span.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Response(_) => "short_circuit",
            Self::Http(_) => "rejected",
            Self::Internal(_) => "error",
        }
    }
}
