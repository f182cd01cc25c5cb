//! Errors returned by [`ApiClient`](crate::ApiClient) calls.

use opcodec_core::{ApiResponse, CodecError, HttpError, PathError};

/// Failure of a client call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The payload is missing a path parameter the operation needs.
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] CodecError),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] CodecError),

    /// The signer's error, unchanged.
    #[error(transparent)]
    Signing(anyhow::Error),

    /// The transport's error, unchanged.
    #[error(transparent)]
    Transport(anyhow::Error),

    /// A non-success status whose body parsed as a structured error.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A non-success status whose body is not a structured error.
    #[error("unexpected response with status {}", .0.status_code)]
    UnexpectedResponse(Box<ApiResponse>),
}

impl ClientError {
    /// Status code of the response behind this error, if there was one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(err) => Some(err.status_code),
            Self::UnexpectedResponse(response) => Some(response.status_code),
            _ => None,
        }
    }
}
