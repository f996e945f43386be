//! Common types used throughout checkup

use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Named arguments handed to a check
pub type Parameters = BTreeMap<String, Value>;

/// Structured failure reported by a check or by reference resolution
///
/// The combined `"<kind> <message>"` form is only produced when a report is
/// serialized; see [`CheckFailure::exception`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    /// Failure kind tag (e.g. `ConnectionRefused`, `ModuleNotFound`)
    pub kind: String,
    /// Human readable message
    pub message: String,
}

impl CheckFailure {
    /// Create a failure with an explicit kind
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a failure from any error, tagging it with the error's type name
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        Self::new(short_type_name::<E>(), err.to_string())
    }

    /// A required parameter was not supplied
    pub fn missing_parameter(name: &str) -> Self {
        Self::new(
            "MissingParameter",
            format!("missing required parameter '{name}'"),
        )
    }

    /// A parameter was supplied with an unusable value
    pub fn invalid_parameter(name: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            "InvalidParameter",
            format!("invalid parameter '{name}': {reason}"),
        )
    }

    /// Prefix the message with `context`, keeping the kind
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }

    /// Combined `"<kind> <message>"` rendering
    pub fn exception(&self) -> String {
        format!("{} {}", self.kind, self.message)
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.message)
    }
}

impl std::error::Error for CheckFailure {}

impl From<Error> for CheckFailure {
    fn from(err: Error) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<std::io::Error> for CheckFailure {
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("{:?}", err.kind()), err.to_string())
    }
}

/// Typed accessors over [`Parameters`] for check implementations
pub trait ParametersExt {
    /// Fetch a parameter in its string form; numbers and booleans are
    /// stringified
    fn get_str(&self, key: &str) -> Result<String, CheckFailure>;

    /// Fetch an optional parameter in its string form
    fn get_str_opt(&self, key: &str) -> Option<String>;

    /// Fetch an unsigned integer parameter, accepting numeric strings
    fn get_u64(&self, key: &str) -> Result<u64, CheckFailure>;
}

impl ParametersExt for Parameters {
    fn get_str(&self, key: &str) -> Result<String, CheckFailure> {
        self.get_str_opt(key)
            .ok_or_else(|| CheckFailure::missing_parameter(key))
    }

    fn get_str_opt(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_to_string)
    }

    fn get_u64(&self, key: &str) -> Result<u64, CheckFailure> {
        match self.get(key) {
            None | Some(Value::Null) => Err(CheckFailure::missing_parameter(key)),
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| CheckFailure::invalid_parameter(key, "not an unsigned integer")),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|e| CheckFailure::invalid_parameter(key, e)),
            Some(other) => Err(CheckFailure::invalid_parameter(
                key,
                format!("unexpected value {other}"),
            )),
        }
    }
}

/// String form of a scalar value; `None` for null, arrays and maps
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
