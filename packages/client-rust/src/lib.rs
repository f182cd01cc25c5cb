//! opcodec client: builds wire requests from operation descriptors, signs
//! and sends them, and classifies responses against declared success codes.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod signer;
pub mod transport;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use http::{HttpRequest, HttpResponse};
pub use request::RequestPayload;
pub use signer::{BearerSigner, RequestSigner};
pub use transport::{ReqwestTransport, Transport};
