//! Local HTTP host for operation servers.

pub mod config;
pub mod middleware;
pub mod module;
pub mod router;

pub use config::NetworkConfig;
pub use module::{shutdown_signal, NetworkModule};
pub use router::{OperationRouter, RouteError, HEALTH_PATH};
