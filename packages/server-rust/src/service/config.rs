//! Operation server settings.

/// Configuration for an [`OperationServer`](super::OperationServer) pipeline.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Message sent to callers when a failure is not classified.
    pub internal_error_message: String,
    /// Log classified rejections (validation, 4xx) at `warn` instead of `debug`.
    pub log_rejections: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            internal_error_message: "Internal server error".to_string(),
            log_rejections: false,
        }
    }
}
