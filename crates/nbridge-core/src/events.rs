//! Domain event definitions
//!
//! Events are produced from OS broadcasts, appended to the event log and
//! pushed to the UI layer. They are immutable once constructed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────
// Push Event Names
// ─────────────────────────────────────────────────────────

/// Pushed once per decoded SMS fragment
pub const ON_MESSAGE_RECEIVED: &str = "onMessageReceived";

/// Pushed on every listener lifecycle transition
pub const ON_LISTENERS_CHANGED: &str = "onListenersChanged";

/// Pushed for package broadcasts when enabled in the configuration
pub const ON_PACKAGE_CHANGED: &str = "onPackageChanged";

// ─────────────────────────────────────────────────────────
// Event Structs
// ─────────────────────────────────────────────────────────

/// A decoded incoming SMS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsEvent {
    /// Originating address, empty when the PDU carried none
    pub from: String,
    /// Decoded message body
    pub message: String,
    /// Service centre timestamp in epoch milliseconds
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_center_address: Option<String>,
}

/// Package broadcast action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageAction {
    Added,
    Removed,
    Replaced,
}

impl PackageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageAction::Added => "ADDED",
            PackageAction::Removed => "REMOVED",
            PackageAction::Replaced => "REPLACED",
        }
    }
}

/// An installed-package change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEvent {
    pub action: PackageAction,
    /// Data URI of the broadcast, e.g. `package:com.example.app`
    pub data: String,
}

impl PackageEvent {
    /// Package identifier carried by the `package:` data URI
    pub fn package_name(&self) -> Option<String> {
        let uri = url::Url::parse(&self.data).ok()?;
        if uri.scheme() != "package" || uri.path().is_empty() {
            return None;
        }
        Some(uri.path().to_string())
    }
}

// ─────────────────────────────────────────────────────────
// Event Enum
// ─────────────────────────────────────────────────────────

/// Normalized event stored in the event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    MessageReceived(SmsEvent),
    PackageChanged(PackageEvent),
}

/// Shape of records returned by `getReceivedMessages`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    /// A list of field objects
    #[default]
    Map,
    /// A list of `{key=value, ...}` strings
    String,
}

impl Event {
    /// Ordered string fields of this event
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Event::MessageReceived(sms) => {
                let mut fields = vec![
                    ("from", sms.from.clone()),
                    ("message", sms.message.clone()),
                    ("timestamp", sms.timestamp.to_string()),
                ];
                if let Some(sca) = &sms.service_center_address {
                    fields.push(("serviceCenterAddress", sca.clone()));
                }
                fields
            }
            Event::PackageChanged(pkg) => vec![
                ("action", pkg.action.as_str().to_string()),
                ("data", pkg.data.clone()),
            ],
        }
    }

    /// Push payload: a JSON object of the string fields
    pub fn payload(&self) -> Value {
        let map: Map<String, Value> = self
            .fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v)))
            .collect();
        Value::Object(map)
    }

    /// Render this event as a log record in the requested shape
    pub fn to_record(&self, shape: RecordShape) -> Value {
        match shape {
            RecordShape::Map => self.payload(),
            RecordShape::String => Value::String(self.stringify()),
        }
    }

    fn stringify(&self) -> String {
        let body = self
            .fields()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{}}}", body)
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        match self {
            Event::MessageReceived(sms) => format!("SMS from {}", display_sender(&sms.from)),
            Event::PackageChanged(pkg) => format!(
                "Package {}: {}",
                pkg.action.as_str().to_lowercase(),
                pkg.package_name().unwrap_or_else(|| pkg.data.clone())
            ),
        }
    }
}

fn display_sender(from: &str) -> &str {
    if from.is_empty() {
        "<unknown>"
    } else {
        from
    }
}
