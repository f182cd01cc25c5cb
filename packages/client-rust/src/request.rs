//! Per-call request inputs.

use std::collections::BTreeMap;

use opcodec_core::{Body, ToParam};

/// Inputs of one call: parameters, optional media type, optional body.
///
/// Parameter values are stringified when set. Absent values (`None`, JSON
/// `null`) are kept as `None` and dropped when the request is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestPayload {
    pub path: BTreeMap<String, Option<String>>,
    pub query: BTreeMap<String, Option<String>>,
    pub headers: BTreeMap<String, Option<String>>,
    pub cookies: BTreeMap<String, Option<String>>,
    pub media_type: Option<String>,
    pub body: Option<Body>,
}

impl RequestPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl ToParam) -> Self {
        self.path.insert(name.into(), value.to_param());
        self
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl ToParam) -> Self {
        self.query.insert(name.into(), value.to_param());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl ToParam) -> Self {
        self.headers.insert(name.into(), value.to_param());
        self
    }

    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl ToParam) -> Self {
        self.cookies.insert(name.into(), value.to_param());
        self
    }

    #[must_use]
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }
}
