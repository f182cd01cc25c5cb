//! HTTP requests and responses described as plain data.
//!
//! [`ApiClient`](crate::ApiClient) builds [`HttpRequest`] values and parses
//! [`HttpResponse`] values without touching the network; a
//! [`Transport`](crate::Transport) performs the round-trip in between.

use std::collections::BTreeMap;

use bytes::Bytes;
use opcodec_core::HttpMethod;

/// An outgoing request. Header names are lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// A received response, as returned by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    /// First header value with `name`, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
