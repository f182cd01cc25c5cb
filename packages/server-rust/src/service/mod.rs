//! Server operation pipeline.
//!
//! 1. **Validation** (`validator`): per-field validators over the inbound event
//! 2. **Middleware** (`middleware`): hooks around validation and handling
//! 3. **Handling** (`handler`): typed and untyped handler adapters
//! 4. **Pipeline** (`operation`): `OperationServer`, which runs the stages and
//!    classifies failures
//! 5. **Authorizer** (`authorizer`): allow/deny entrypoint with denial containment

pub mod authorizer;
pub mod config;
pub mod failure;
pub mod handler;
pub mod middleware;
pub mod operation;
pub mod request;
pub mod validator;

pub use authorizer::{
    authorizer_fn, Authorizer, AuthorizerEntrypoint, AuthorizerError, AuthorizerFn,
    AuthorizerResult,
};
pub use config::ServerConfig;
pub use failure::Failure;
pub use handler::{handler_fn, json_handler_fn, Handler, HandlerFn, JsonHandlerFn};
pub use middleware::Middleware;
pub use operation::OperationServer;
pub use request::ApiRequest;
pub use validator::{Validator, Validators};
