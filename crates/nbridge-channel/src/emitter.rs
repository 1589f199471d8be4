//! Outbound half of the channel: replies and one-way push events

use serde_json::Value;
use tokio::sync::mpsc;

use nbridge_core::prelude::*;

use crate::codec::MethodResult;
use crate::frame::Frame;

/// One end of the named bridge channel.
///
/// Lines written to `tx` arrive on the peer's `rx`.
#[derive(Debug)]
pub struct ChannelEnd {
    name: String,
    pub tx: mpsc::UnboundedSender<String>,
    pub rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelEnd {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn split(self) -> (mpsc::UnboundedSender<String>, mpsc::UnboundedReceiver<String>) {
        (self.tx, self.rx)
    }
}

/// Create a connected pair of channel ends: `(ui_end, native_end)`
pub fn channel_pair(name: impl Into<String>) -> (ChannelEnd, ChannelEnd) {
    let name = name.into();
    let (to_native_tx, to_native_rx) = mpsc::unbounded_channel();
    let (to_ui_tx, to_ui_rx) = mpsc::unbounded_channel();

    let ui = ChannelEnd {
        name: name.clone(),
        tx: to_native_tx,
        rx: to_ui_rx,
    };
    let native = ChannelEnd {
        name,
        tx: to_ui_tx,
        rx: to_native_rx,
    };
    (ui, native)
}

/// Writes replies and push events to the UI side of the channel.
///
/// Pushes carry no acknowledgement: a frame is delivered only if the UI end
/// is still alive, and a dead end is not an error.
#[derive(Clone, Debug)]
pub struct EventEmitter {
    outbound: mpsc::UnboundedSender<String>,
}

impl EventEmitter {
    pub fn new(outbound: mpsc::UnboundedSender<String>) -> Self {
        Self { outbound }
    }

    /// Create an emitter plus the receiver its frames arrive on
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn new_for_test() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Push an unsolicited event. Returns whether the frame was queued.
    pub fn emit(&self, event: &str, params: Value) -> bool {
        self.send_frame(Frame::Event {
            event: event.to_string(),
            params,
        })
    }

    /// Send the reply for call `id`
    pub fn reply(&self, id: u64, result: MethodResult) -> bool {
        self.send_frame(Frame::Reply { id, result })
    }

    /// Check whether the UI end is still receiving
    pub fn is_alive(&self) -> bool {
        !self.outbound.is_closed()
    }

    fn send_frame(&self, frame: Frame) -> bool {
        match self.outbound.send(frame.encode()) {
            Ok(()) => {
                trace!("Queued {}", frame.summary());
                true
            }
            Err(_) => {
                debug!("UI channel closed, dropping {}", frame.summary());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_emit_writes_event_frame() {
        let (emitter, mut rx) = EventEmitter::new_for_test();

        assert!(emitter.emit("onMessageReceived", json!({"from": "+1"})));

        let line = rx.try_recv().unwrap();
        assert_eq!(
            Frame::parse(&line).unwrap(),
            Frame::Event {
                event: "onMessageReceived".into(),
                params: json!({"from": "+1"}),
            }
        );
    }

    #[test]
    fn test_reply_writes_reply_frame() {
        let (emitter, mut rx) = EventEmitter::new_for_test();

        assert!(emitter.reply(7, MethodResult::success(true)));

        let line = rx.try_recv().unwrap();
        assert_eq!(
            Frame::parse(&line).unwrap(),
            Frame::Reply {
                id: 7,
                result: MethodResult::success(true),
            }
        );
    }

    #[test]
    fn test_emit_on_closed_channel_is_not_an_error() {
        let (emitter, rx) = EventEmitter::new_for_test();
        drop(rx);

        assert!(!emitter.is_alive());
        assert!(!emitter.emit("onMessageReceived", json!({})));
    }

    #[test]
    fn test_channel_pair_connects_both_directions() {
        let (ui, native) = channel_pair("notificationChannel");
        assert_eq!(ui.name(), "notificationChannel");
        assert_eq!(native.name(), "notificationChannel");

        let (ui_tx, mut ui_rx) = ui.split();
        let (native_tx, mut native_rx) = native.split();

        ui_tx.send("to native".into()).unwrap();
        native_tx.send("to ui".into()).unwrap();

        assert_eq!(native_rx.try_recv().unwrap(), "to native");
        assert_eq!(ui_rx.try_recv().unwrap(), "to ui");
    }
}
