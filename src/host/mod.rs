//! Host mode - drives the bridge engine over stdin/stdout
//!
//! Stdin carries one line per input:
//! - channel frames from the UI layer, e.g. `[{"id":1,"method":"toggleListeners"}]`
//! - simulated OS broadcasts, `{"broadcast":{"action":"...","pdus":["<hex>"]}}`
//! - permission prompt results, `{"permissionResult":{"requestCode":1,"grants":[true]}}`
//!
//! Stdout carries reply and push-event frames, one per line. Logs go to the
//! rolling log file so stdout stays a clean protocol stream.

pub mod runner;
pub mod signals;
pub mod simulator;

use serde::Deserialize;
use serde_json::Value;

use nbridge_app::broadcast::SMS_RECEIVED;
use nbridge_app::{Broadcast, Message, ReplyTo};
use nbridge_channel::{strip_brackets, Frame};
use nbridge_core::prelude::*;

/// A broadcast as written on stdin; PDUs are hex strings
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastInput {
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub pdus: Vec<String>,
}

fn default_action() -> String {
    SMS_RECEIVED.to_string()
}

impl BroadcastInput {
    pub fn into_broadcast(self) -> Result<Broadcast> {
        let pdus = self
            .pdus
            .iter()
            .map(|pdu| hex::decode(pdu.trim()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::protocol(format!("PDU is not valid hex: {}", e)))?;
        Ok(Broadcast {
            action: self.action,
            data: self.data,
            pdus,
        })
    }
}

/// A permission prompt result as written on stdin
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResultInput {
    pub request_code: u32,
    #[serde(default)]
    pub grants: Vec<bool>,
}

/// One parsed stdin line
#[derive(Debug)]
pub enum HostInput {
    Frame(Frame),
    Broadcast(Broadcast),
    PermissionResult { request_code: u32, grants: Vec<bool> },
}

impl HostInput {
    /// Classify and parse a stdin line
    pub fn parse(line: &str) -> Result<Self> {
        let json = strip_brackets(line).unwrap_or_else(|| line.trim());
        let mut value: Value = serde_json::from_str(json)?;

        if let Some(broadcast) = value.get_mut("broadcast").map(Value::take) {
            let input: BroadcastInput = serde_json::from_value(broadcast)?;
            return Ok(HostInput::Broadcast(input.into_broadcast()?));
        }

        if let Some(result) = value.get_mut("permissionResult").map(Value::take) {
            let input: PermissionResultInput = serde_json::from_value(result)?;
            return Ok(HostInput::PermissionResult {
                request_code: input.request_code,
                grants: input.grants,
            });
        }

        Frame::from_value(value).map(HostInput::Frame)
    }

    /// Convert into an engine message. Only call frames are accepted from the UI.
    pub fn into_message(self) -> Result<Message> {
        match self {
            HostInput::Frame(Frame::Call { id, call }) => Ok(Message::Call {
                call,
                reply: ReplyTo::Channel(id),
            }),
            HostInput::Frame(frame) => Err(Error::protocol(format!(
                "unexpected frame from UI: {}",
                frame.summary()
            ))),
            HostInput::Broadcast(broadcast) => Ok(Message::Broadcast(broadcast)),
            HostInput::PermissionResult {
                request_code,
                grants,
            } => Ok(Message::PermissionResult {
                request_code,
                grants,
            }),
        }
    }
}
