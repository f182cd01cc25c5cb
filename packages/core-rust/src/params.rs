//! Header, query and path parameter encoding.
//!
//! Parameter maps arrive with heterogeneous scalar values (strings, numbers,
//! booleans, absent). [`encode_params`] turns them into the canonical
//! lower-cased string map used for headers on both sides of the wire;
//! [`stringify_params`] does the same without touching key case, for path and
//! query maps whose keys are case-sensitive.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use url::form_urlencoded;

use crate::error::PathError;

/// `{name}` placeholder in a path pattern.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^{}]+)\}").unwrap_or_else(|e| unreachable!("placeholder regex: {e}"))
});

// ---------------------------------------------------------------------------
// ParamValue / ToParam
// ---------------------------------------------------------------------------

/// A scalar parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Conversion of a parameter value to its wire string. `None` means absent:
/// the entry is dropped rather than sent with an empty value.
pub trait ToParam {
    fn to_param(&self) -> Option<String>;
}

impl ToParam for str {
    fn to_param(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl ToParam for String {
    fn to_param(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl ToParam for ParamValue {
    fn to_param(&self) -> Option<String> {
        Some(self.to_string())
    }
}

macro_rules! display_param {
    ($($ty:ty),*) => {
        $(
            impl ToParam for $ty {
                fn to_param(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

display_param!(i32, i64, u16, u32, u64, usize, f64, bool);

/// `null` is absent; strings are taken verbatim; other JSON values use their
/// JSON text.
impl ToParam for Value {
    fn to_param(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl<T: ToParam> ToParam for Option<T> {
    fn to_param(&self) -> Option<String> {
        self.as_ref().and_then(ToParam::to_param)
    }
}

impl<T: ToParam + ?Sized> ToParam for &T {
    fn to_param(&self) -> Option<String> {
        (**self).to_param()
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Normalize a header-style map: absent values dropped, values stringified,
/// keys lower-cased.
pub fn encode_params<I, K, V>(params: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: ToParam,
{
    params
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .to_param()
                .map(|value| (key.as_ref().to_ascii_lowercase(), value))
        })
        .collect()
}

/// Like [`encode_params`] but keeps key case.
pub fn stringify_params<I, K, V>(params: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: ToParam,
{
    params
        .into_iter()
        .filter_map(|(key, value)| value.to_param().map(|value| (key.as_ref().to_string(), value)))
        .collect()
}

/// Percent-encode a single URL component (path segment or parameter value).
#[must_use]
pub fn encode_component(value: &str) -> String {
    // byte_serialize writes spaces as `+` and escapes a literal `+` as `%2B`.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Serialize a query map as `k=v&...`. Empty maps produce an empty string.
#[must_use]
pub fn encode_query(params: &BTreeMap<String, String>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(params);
    serializer.finish()
}

/// Names of the `{name}` placeholders in `pattern`, in order.
#[must_use]
pub fn placeholder_names(pattern: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(pattern)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Substitute every `{name}` placeholder in `pattern` with its percent-encoded
/// value from `params`.
///
/// # Errors
///
/// Returns [`PathError::MissingParameter`] if any placeholder has no entry.
pub fn substitute_path(
    pattern: &str,
    params: &BTreeMap<String, String>,
) -> Result<String, PathError> {
    let mut rendered = String::with_capacity(pattern.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(pattern) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = params
            .get(name.as_str())
            .ok_or_else(|| PathError::MissingParameter {
                name: name.as_str().to_string(),
                pattern: pattern.to_string(),
            })?;
        rendered.push_str(&pattern[last..whole.start()]);
        rendered.push_str(&encode_component(value));
        last = whole.end();
    }
    rendered.push_str(&pattern[last..]);
    Ok(rendered)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
