//! The closed call surface of the bridge channel
//!
//! Incoming [`MethodCall`]s are resolved into a typed [`BridgeCall`] through
//! a flat name table. Unknown names and malformed arguments are rejected
//! with a [`CallRejection`] that converts into a [`MethodResult`], so a call
//! can never escape as a fault.

use serde_json::Value;

use crate::codec::{MethodCall, MethodResult, INVALID_ARGUMENT};

/// Default channel name shared by both sides
pub const CHANNEL_NAME: &str = "notificationChannel";

pub const TOGGLE_LISTENERS: &str = "toggleListeners";
pub const GET_RECEIVED_MESSAGES: &str = "getReceivedMessages";
pub const GET_APP_NAME: &str = "getAppName";
pub const GET_DEVICE_INFO: &str = "getDeviceInfo";

/// Recognized calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    /// Flip the aggregate listener state
    ToggleListeners,
    /// Snapshot of the event log
    GetReceivedMessages,
    /// Display name of an installed application
    GetAppName { package_name: String },
    /// Fresh device telemetry snapshot
    GetDeviceInfo,
}

/// Why a method call could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRejection {
    /// The method name is not part of the call surface
    Unknown(String),
    /// The arguments do not have the expected shape
    InvalidArgument { method: String, message: String },
}

impl From<CallRejection> for MethodResult {
    fn from(rejection: CallRejection) -> Self {
        match rejection {
            CallRejection::Unknown(_) => MethodResult::NotImplemented,
            CallRejection::InvalidArgument { message, .. } => {
                MethodResult::error(INVALID_ARGUMENT, message)
            }
        }
    }
}

impl BridgeCall {
    /// Resolve a method call through the dispatch table
    pub fn from_method_call(call: &MethodCall) -> Result<Self, CallRejection> {
        match call.method.as_str() {
            TOGGLE_LISTENERS => Ok(BridgeCall::ToggleListeners),
            GET_RECEIVED_MESSAGES => Ok(BridgeCall::GetReceivedMessages),
            GET_APP_NAME => {
                let package_name = package_name_arg(&call.args).ok_or_else(|| {
                    CallRejection::InvalidArgument {
                        method: call.method.clone(),
                        message: "Expected a package name string".to_string(),
                    }
                })?;
                Ok(BridgeCall::GetAppName { package_name })
            }
            GET_DEVICE_INFO => Ok(BridgeCall::GetDeviceInfo),
            other => Err(CallRejection::Unknown(other.to_string())),
        }
    }

    /// Wire method name
    pub fn method_name(&self) -> &'static str {
        match self {
            BridgeCall::ToggleListeners => TOGGLE_LISTENERS,
            BridgeCall::GetReceivedMessages => GET_RECEIVED_MESSAGES,
            BridgeCall::GetAppName { .. } => GET_APP_NAME,
            BridgeCall::GetDeviceInfo => GET_DEVICE_INFO,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            BridgeCall::ToggleListeners => "toggle listeners",
            BridgeCall::GetReceivedMessages => "get received messages",
            BridgeCall::GetAppName { .. } => "get app name",
            BridgeCall::GetDeviceInfo => "get device info",
        }
    }

    /// Build the method call for this request
    pub fn to_method_call(&self) -> MethodCall {
        let args = match self {
            BridgeCall::GetAppName { package_name } => Value::String(package_name.clone()),
            _ => Value::Null,
        };
        MethodCall::new(self.method_name(), args)
    }
}

/// Accept a bare string or a
/// `{"packageName": "..."}` map.
fn package_name_arg(args: &Value) -> Option<String> {
    match args {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("packageName")
            .and_then(|v| v.as_str())
            .map(String::from),
        _ => None,
    }
}
