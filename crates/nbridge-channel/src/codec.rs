//! Method call and result types with their JSON envelopes
//!
//! Results travel as the JSON method codec envelopes used by Flutter
//! platform channels:
//! - success: `[result]`
//! - error: `[code, message, details]`
//! - not implemented: `null`

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use nbridge_core::prelude::*;

/// Error code for an unknown package identifier
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Error code for arguments of the wrong shape
pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";

/// A named call issued by the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, args: Value) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// A call without arguments
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }
}

/// Outcome of a method call. Every call ends in exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResult {
    Success(Value),
    Error {
        code: String,
        message: Option<String>,
        details: Option<Value>,
    },
    NotImplemented,
}

impl MethodResult {
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Success(value.into())
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: Some(message.into()),
            details: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResult::Success(_))
    }

    /// Error code, if this is a failure
    pub fn error_code(&self) -> Option<&str> {
        match self {
            MethodResult::Error { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Success payload, if any
    pub fn value(&self) -> Option<&Value> {
        match self {
            MethodResult::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Encode as a method codec envelope
    pub fn to_envelope(&self) -> Value {
        match self {
            MethodResult::Success(value) => json!([value]),
            MethodResult::Error {
                code,
                message,
                details,
            } => json!([code, message, details]),
            MethodResult::NotImplemented => Value::Null,
        }
    }

    /// Decode a method codec envelope
    pub fn from_envelope(envelope: Value) -> Result<Self> {
        match envelope {
            Value::Null => Ok(MethodResult::NotImplemented),
            Value::Array(mut items) => match items.len() {
                1 => Ok(MethodResult::Success(items.remove(0))),
                3 => {
                    let details = items.pop().filter(|d| !d.is_null());
                    let message = items
                        .pop()
                        .and_then(|m| m.as_str().map(String::from));
                    let code = items
                        .pop()
                        .and_then(|c| c.as_str().map(String::from))
                        .ok_or_else(|| Error::protocol("error envelope code is not a string"))?;
                    Ok(MethodResult::Error {
                        code,
                        message,
                        details,
                    })
                }
                n => Err(Error::protocol(format!(
                    "envelope must have 1 or 3 elements, got {}",
                    n
                ))),
            },
            other => Err(Error::protocol(format!(
                "envelope must be an array or null, got {}",
                other
            ))),
        }
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        match self {
            MethodResult::Success(_) => "ok".to_string(),
            MethodResult::Error { code, message, .. } => match message {
                Some(m) => format!("error {}: {}", code, m),
                None => format!("error {}", code),
            },
            MethodResult::NotImplemented => "not implemented".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let result = MethodResult::success(true);
        assert_eq!(result.to_envelope(), json!([true]));
        assert!(result.is_success());
        assert_eq!(result.value(), Some(&json!(true)));
    }

    #[test]
    fn test_error_envelope() {
        let result = MethodResult::error(NOT_FOUND, "Application name not found");
        assert_eq!(
            result.to_envelope(),
            json!(["NOT_FOUND", "Application name not found", null])
        );
        assert_eq!(result.error_code(), Some("NOT_FOUND"));
    }

    #[test]
    fn test_not_implemented_envelope_is_null() {
        assert_eq!(MethodResult::NotImplemented.to_envelope(), Value::Null);
        assert_eq!(
            MethodResult::from_envelope(Value::Null).unwrap(),
            MethodResult::NotImplemented
        );
    }

    #[test]
    fn test_decode_error_envelope_with_details() {
        let decoded =
            MethodResult::from_envelope(json!(["INVALID_ARGUMENT", null, {"got": 5}])).unwrap();
        assert_eq!(
            decoded,
            MethodResult::Error {
                code: "INVALID_ARGUMENT".into(),
                message: None,
                details: Some(json!({"got": 5})),
            }
        );
    }

    #[test]
    fn test_decode_rejects_malformed_envelopes() {
        assert!(MethodResult::from_envelope(json!([1, 2])).is_err());
        assert!(MethodResult::from_envelope(json!({"ok": true})).is_err());
        assert!(MethodResult::from_envelope(json!([5, "m", null])).is_err());
    }

    #[test]
    fn test_method_call_args_default_to_null() {
        let call: MethodCall = serde_json::from_str(r#"{"method": "getDeviceInfo"}"#).unwrap();
        assert_eq!(call, MethodCall::bare("getDeviceInfo"));
    }

    #[test]
    fn test_summary() {
        assert_eq!(MethodResult::success(1).summary(), "ok");
        assert_eq!(
            MethodResult::error("NOT_FOUND", "missing").summary(),
            "error NOT_FOUND: missing"
        );
        assert_eq!(MethodResult::NotImplemented.summary(), "not implemented");
    }
}
