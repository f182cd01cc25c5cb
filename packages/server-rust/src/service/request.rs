//! The decoded request handed to handlers and request hooks.

use std::collections::BTreeMap;

use opcodec_core::Body;
use serde_json::{Map, Value};

/// A validated request as seen by middleware and handlers.
///
/// Header names are lower-cased. Path, query and cookie names keep the case
/// they arrived with. `body` is only set for operations that declare a
/// request body and received a `content-type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequest {
    pub path: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub authorizer: Option<Value>,
    pub media_type: Option<String>,
    pub body: Option<Body>,
}

impl ApiRequest {
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Header lookup, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// The body as a JSON value, when it decoded as JSON.
    #[must_use]
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Some(Body::Json(value)) => value.as_ref(),
            _ => None,
        }
    }
}

/// JSON object view of a string map, as passed to validators.
pub(crate) fn to_object(params: &BTreeMap<String, String>) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect::<Map<String, Value>>(),
    )
}

/// Cookies from the event's cookie array, else from the `cookie` header.
///
/// Entries are `name=value`; only the first `=` splits. Entries without `=`
/// are skipped.
pub(crate) fn parse_cookies(
    cookies: Option<&[String]>,
    header: Option<&str>,
) -> BTreeMap<String, String> {
    let entries: Vec<&str> = match (cookies, header) {
        (Some(cookies), _) => cookies.iter().map(String::as_str).collect(),
        (None, Some(header)) => header.split(';').collect(),
        (None, None) => Vec::new(),
    };
    entries
        .into_iter()
        .filter_map(|entry| entry.trim().split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .collect()
}
