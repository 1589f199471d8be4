//! Line framing for the bridge channel
//!
//! One frame per line. Frames may be wrapped in `[...]` for resilience, the
//! same way the Flutter daemon wraps its `--machine` messages; both forms are
//! accepted on input and the wrapped form is produced on output.

use serde_json::{json, Value};

use nbridge_core::prelude::*;

use crate::codec::{MethodCall, MethodResult};

/// A single message on the channel
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// UI → native: a call awaiting exactly one reply with the same id
    Call { id: u64, call: MethodCall },
    /// native → UI: the reply to a call
    Reply { id: u64, result: MethodResult },
    /// native → UI: an unsolicited push event
    Event { event: String, params: Value },
}

/// Strip the outer brackets from a frame line
///
/// Returns the inner content if brackets are present.
pub fn strip_brackets(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        Some(&trimmed[1..trimmed.len() - 1])
    } else {
        None
    }
}

impl Frame {
    /// Parse a frame from a single line.
    ///
    /// Frames are told apart by their keys: `method` marks a call, `reply` a
    /// reply, `event` a push event.
    pub fn parse(line: &str) -> Result<Self> {
        let json = strip_brackets(line).unwrap_or_else(|| line.trim());
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Call id of a line that failed to parse as a frame.
    ///
    /// `Some` when the line is a JSON object with a numeric `id` and no
    /// `reply` or `event` key, i.e. a call the UI side is waiting on.
    pub fn malformed_call_id(line: &str) -> Option<u64> {
        let json = strip_brackets(line).unwrap_or_else(|| line.trim());
        let value: Value = serde_json::from_str(json).ok()?;
        let obj = value.as_object()?;
        if obj.contains_key("reply") || obj.contains_key("event") {
            return None;
        }
        obj.get("id")?.as_u64()
    }

    /// Interpret an already-parsed JSON object as a frame
    pub fn from_value(mut value: Value) -> Result<Self> {
        let obj = value
            .as_object_mut()
            .ok_or_else(|| Error::protocol("frame is not a JSON object"))?;

        if let Some(event) = obj.get("event").and_then(|v| v.as_str()).map(String::from) {
            let params = obj.remove("params").unwrap_or(Value::Null);
            return Ok(Frame::Event { event, params });
        }

        let id = obj
            .get("id")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Error::protocol("frame has no numeric id"))?;

        if let Some(method) = obj.get("method").and_then(|v| v.as_str()).map(String::from) {
            let args = obj.remove("args").unwrap_or(Value::Null);
            return Ok(Frame::Call {
                id,
                call: MethodCall { method, args },
            });
        }

        if let Some(reply) = obj.remove("reply") {
            let result = MethodResult::from_envelope(reply)?;
            return Ok(Frame::Reply { id, result });
        }

        Err(Error::protocol(format!(
            "frame #{} is neither a call nor a reply",
            id
        )))
    }

    /// Encode this frame as a bracket-wrapped line (no trailing newline)
    pub fn encode(&self) -> String {
        let inner = match self {
            Frame::Call { id, call } => json!({
                "id": id,
                "method": call.method,
                "args": call.args,
            }),
            Frame::Reply { id, result } => json!({
                "id": id,
                "reply": result.to_envelope(),
            }),
            Frame::Event { event, params } => json!({
                "event": event,
                "params": params,
            }),
        };
        format!("[{}]", inner)
    }

    /// Get a human-readable summary of this frame
    pub fn summary(&self) -> String {
        match self {
            Frame::Call { id, call } => format!("Call #{}: {}", id, call.method),
            Frame::Reply { id, result } => format!("Reply #{}: {}", id, result.summary()),
            Frame::Event { event, .. } => format!("Event: {}", event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_brackets() {
        assert_eq!(strip_brackets("[{\"a\":1}]"), Some("{\"a\":1}"));
        assert_eq!(strip_brackets("  [x]  "), Some("x"));
        assert_eq!(strip_brackets("{\"a\":1}"), None);
    }

    #[test]
    fn test_malformed_call_id() {
        let line = r#"[{"id":4,"method":["toggleListeners"]}]"#;
        assert!(Frame::parse(line).is_err());
        assert_eq!(Frame::malformed_call_id(line), Some(4));

        assert_eq!(Frame::malformed_call_id(r#"{"id":2}"#), Some(2));
        assert_eq!(Frame::malformed_call_id(r#"{"id":"x","method":1}"#), None);
        assert_eq!(Frame::malformed_call_id(r#"{"id":1,"reply":[1,2,3,4]}"#), None);
        assert_eq!(Frame::malformed_call_id("garbage"), None);
    }

    #[test]
    fn test_parse_call_with_and_without_brackets() {
        let wrapped = Frame::parse(r#"[{"id":3,"method":"getAppName","args":"com.x"}]"#).unwrap();
        let bare = Frame::parse(r#"{"id":3,"method":"getAppName","args":"com.x"}"#).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(
            wrapped,
            Frame::Call {
                id: 3,
                call: MethodCall::new("getAppName", json!("com.x")),
            }
        );
    }

    #[test]
    fn test_parse_call_without_args() {
        let frame = Frame::parse(r#"{"id":1,"method":"toggleListeners"}"#).unwrap();
        assert_eq!(
            frame,
            Frame::Call {
                id: 1,
                call: MethodCall::bare("toggleListeners"),
            }
        );
    }

    #[test]
    fn test_parse_reply() {
        let frame = Frame::parse(r#"[{"id":9,"reply":["NOT_FOUND","missing",null]}]"#).unwrap();
        match frame {
            Frame::Reply { id, result } => {
                assert_eq!(id, 9);
                assert_eq!(result.error_code(), Some("NOT_FOUND"));
            }
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_not_implemented_reply() {
        let frame = Frame::parse(r#"{"id":2,"reply":null}"#).unwrap();
        assert_eq!(
            frame,
            Frame::Reply {
                id: 2,
                result: MethodResult::NotImplemented,
            }
        );
    }

    #[test]
    fn test_parse_event() {
        let frame =
            Frame::parse(r#"[{"event":"onMessageReceived","params":{"from":"+1"}}]"#).unwrap();
        assert_eq!(
            frame,
            Frame::Event {
                event: "onMessageReceived".into(),
                params: json!({"from": "+1"}),
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Frame::parse("not json").is_err());
        assert!(Frame::parse("[1,2,3]").is_err());
        assert!(Frame::parse(r#"{"method":"x"}"#).is_err());
        assert!(Frame::parse(r#"{"id":1}"#).is_err());
    }

    #[test]
    fn test_encoded_frames_parse_back() {
        let frames = vec![
            Frame::Call {
                id: 5,
                call: MethodCall::bare("getDeviceInfo"),
            },
            Frame::Reply {
                id: 5,
                result: MethodResult::success(json!({"model": "Pixel"})),
            },
            Frame::Event {
                event: "onListenersChanged".into(),
                params: json!({"active": true}),
            },
        ];
        for frame in frames {
            let line = frame.encode();
            assert!(line.starts_with('[') && line.ends_with(']'));
            assert_eq!(Frame::parse(&line).unwrap(), frame);
        }
    }

    #[test]
    fn test_summary() {
        let frame = Frame::Call {
            id: 1,
            call: MethodCall::bare("toggleListeners"),
        };
        assert_eq!(frame.summary(), "Call #1: toggleListeners");
    }
}
