//! opcodec server: runs inbound HTTP events through an operation's
//! validation, middleware and handler pipeline, and hosts operations
//! over HTTP with axum.

pub mod event;
pub mod network;
pub mod service;

pub use event::{ApiGatewayEvent, ApiGatewayResult, RequestContext};
pub use network::{NetworkConfig, NetworkModule, OperationRouter};
pub use service::{
    authorizer_fn, handler_fn, json_handler_fn, ApiRequest, Authorizer, AuthorizerEntrypoint,
    AuthorizerError, AuthorizerResult, Failure, Handler, Middleware, OperationServer, ServerConfig,
    Validator, Validators,
};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
