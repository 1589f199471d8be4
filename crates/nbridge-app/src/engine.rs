//! Engine - single-consumer loop that owns the bridge state
//!
//! Producers reach the engine only through a [`BridgeHandle`]. The engine
//! drains its inbox one message at a time, so the event log and listener
//! state need no locks and log order equals delivery order.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use nbridge_channel::{ChannelEnd, EventEmitter, Frame, MethodCall, MethodResult};
use nbridge_core::prelude::*;

use crate::broadcast::Broadcast;
use crate::config::Settings;
use crate::handler::{self, UpdateAction, UpdateResult};
use crate::message::{Message, ReplyTo};
use crate::platform::Platform;
use crate::state::BridgeState;

/// Cloneable producer side of the engine inbox
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<Message>,
}

impl BridgeHandle {
    /// Queue a message, waiting for inbox capacity
    pub async fn send(&self, message: Message) -> Result<()> {
        self.tx.send(message).await.map_err(|_| Error::ChannelClosed)
    }

    /// Queue a message without waiting. Usable from OS callback threads.
    pub fn try_send(&self, message: Message) -> Result<()> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::channel_send("engine inbox is full"),
            mpsc::error::TrySendError::Closed(_) => Error::ChannelClosed,
        })
    }

    /// Queue a message from a non-async thread, waiting for capacity.
    ///
    /// Panics if called from within an async execution context.
    pub fn blocking_send(&self, message: Message) -> Result<()> {
        self.tx.blocking_send(message).map_err(|_| Error::ChannelClosed)
    }

    /// Issue a call in-process and wait for its result
    pub async fn call(&self, call: MethodCall) -> Result<MethodResult> {
        let (tx, rx) = oneshot::channel();
        self.send(Message::Call {
            call,
            reply: ReplyTo::Direct(tx),
        })
        .await?;
        rx.await.map_err(|_| Error::ChannelClosed)
    }

    pub fn try_broadcast(&self, broadcast: Broadcast) -> Result<()> {
        self.try_send(Message::Broadcast(broadcast))
    }

    pub fn try_permission_result(&self, request_code: u32, grants: Vec<bool>) -> Result<()> {
        self.try_send(Message::PermissionResult {
            request_code,
            grants,
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Message::Shutdown).await
    }

    /// Check whether the engine has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the engine inbox
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::Receiver<Message>,
}

impl Inbox {
    /// Take the next queued message without waiting
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}

/// Create the engine inbox.
///
/// Created ahead of the engine so platform implementations can hold a
/// handle for delivering broadcasts and permission results.
pub fn inbox(capacity: usize) -> (BridgeHandle, Inbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (BridgeHandle { tx }, Inbox { rx })
}

/// The bridge engine
#[derive(Debug)]
pub struct Engine {
    pub state: BridgeState,
    inbox: Inbox,
}

impl Engine {
    pub fn new(settings: Settings, platform: Platform, emitter: EventEmitter, inbox: Inbox) -> Self {
        Self {
            state: BridgeState::new(settings, platform, emitter),
            inbox,
        }
    }

    /// Create an engine serving the native end of a bridge channel.
    ///
    /// Spawns a reader task that forwards call frames into the inbox; must
    /// be called within a tokio runtime.
    pub fn connect(
        settings: Settings,
        platform: Platform,
        handle: &BridgeHandle,
        inbox: Inbox,
        native_end: ChannelEnd,
    ) -> Self {
        debug!("Serving channel '{}'", native_end.name());
        let (to_ui, from_ui) = native_end.split();
        spawn_channel_reader(handle.clone(), from_ui);
        Self::new(settings, platform, EventEmitter::new(to_ui), inbox)
    }

    /// Process a single message
    pub fn process_message(&mut self, message: Message) -> UpdateResult {
        handler::update(&mut self.state, message)
    }

    /// Drain the inbox until shutdown or until every handle is dropped.
    ///
    /// Listeners are stopped either way. Returns the final state.
    pub async fn run(mut self) -> BridgeState {
        info!("Bridge engine started");

        let mut shut_down = false;
        while let Some(message) = self.inbox.rx.recv().await {
            let result = self.process_message(message);
            if result.action == Some(UpdateAction::Shutdown) {
                shut_down = true;
                break;
            }
        }

        if !shut_down {
            debug!("Inbox closed, stopping listeners");
            self.process_message(Message::Shutdown);
        }

        info!("Bridge engine stopped");
        self.state
    }
}

/// Forward call frames from the UI side into the engine inbox
pub fn spawn_channel_reader(
    handle: BridgeHandle,
    mut from_ui: mpsc::UnboundedReceiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = from_ui.recv().await {
            match Frame::parse(&line) {
                Ok(Frame::Call { id, call }) => {
                    trace!("Call #{} from UI: {}", id, call.method);
                    let message = Message::Call {
                        call,
                        reply: ReplyTo::Channel(id),
                    };
                    if handle.send(message).await.is_err() {
                        debug!("Engine gone, stopping channel reader");
                        break;
                    }
                }
                Ok(frame) => warn!("Unexpected frame from UI: {}", frame.summary()),
                Err(e) => match Frame::malformed_call_id(&line) {
                    Some(id) => {
                        warn!("Malformed call #{} from UI: {}", id, e);
                        let message = Message::MalformedCall {
                            id,
                            reason: e.to_string(),
                        };
                        if handle.send(message).await.is_err() {
                            debug!("Engine gone, stopping channel reader");
                            break;
                        }
                    }
                    None => warn!("Dropping malformed frame: {}", e),
                },
            }
        }
        debug!("UI side closed the channel");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakePlatform;
    use nbridge_channel::{
        channel_pair, BridgeCall, ChannelClient, CHANNEL_NAME, INVALID_ARGUMENT,
    };
    use nbridge_core::ListenerState;
    use serde_json::json;

    #[tokio::test]
    async fn test_direct_call_round_trip() {
        let fake = FakePlatform::granting_all();
        let (handle, inbox) = inbox(8);
        let (emitter, _rx) = EventEmitter::new_for_test();
        let engine = Engine::new(Settings::default(), fake.platform(), emitter, inbox);
        let task = tokio::spawn(engine.run());

        let result = handle
            .call(MethodCall::bare("toggleListeners"))
            .await
            .unwrap();
        assert_eq!(result, MethodResult::success(true));

        handle.shutdown().await.unwrap();
        let state = task.await.unwrap();
        assert_eq!(state.listeners.state(), ListenerState::Stopped);
        assert_eq!(fake.active_registrations(), 0);
    }

    #[tokio::test]
    async fn test_dropping_all_handles_stops_listeners() {
        let fake = FakePlatform::granting_all();
        let (handle, inbox) = inbox(8);
        let (emitter, _rx) = EventEmitter::new_for_test();
        let engine = Engine::new(Settings::default(), fake.platform(), emitter, inbox);
        let task = tokio::spawn(engine.run());

        handle
            .call(MethodCall::bare("toggleListeners"))
            .await
            .unwrap();
        assert_eq!(fake.active_registrations(), 2);

        drop(handle);
        task.await.unwrap();
        assert_eq!(fake.active_registrations(), 0);
    }

    #[tokio::test]
    async fn test_connected_engine_serves_channel_client() {
        let fake = FakePlatform::granting_all();
        let (ui_end, native_end) = channel_pair(CHANNEL_NAME);
        let (handle, inbox) = inbox(8);
        let engine = Engine::connect(
            Settings::default(),
            fake.platform(),
            &handle,
            inbox,
            native_end,
        );
        tokio::spawn(engine.run());

        let (client, mut events) = ChannelClient::connect(ui_end);

        let result = client.call(&BridgeCall::ToggleListeners).await.unwrap();
        assert_eq!(result, MethodResult::success(true));

        let event = events.recv().await.unwrap();
        assert_eq!(event.event, "onListenersChanged");
        assert_eq!(event.params, json!({"active": true, "state": "active"}));

        let unknown = client
            .invoke(MethodCall::bare("launchMissiles"))
            .await
            .unwrap();
        assert_eq!(unknown, MethodResult::NotImplemented);
    }

    #[tokio::test]
    async fn test_malformed_call_is_answered() {
        let fake = FakePlatform::new();
        let (ui_end, native_end) = channel_pair(CHANNEL_NAME);
        let (handle, inbox) = inbox(8);
        let engine = Engine::connect(
            Settings::default(),
            fake.platform(),
            &handle,
            inbox,
            native_end,
        );
        tokio::spawn(engine.run());

        let (to_native, mut from_native) = ui_end.split();
        to_native.send(r#"[{"id":5,"method":7}]"#.to_string()).unwrap();
        to_native.send("not even json".to_string()).unwrap();
        to_native
            .send(r#"[{"id":6,"method":"getAppName","args":"com.x"}]"#.to_string())
            .unwrap();

        let first = Frame::parse(&from_native.recv().await.unwrap()).unwrap();
        match first {
            Frame::Reply { id, result } => {
                assert_eq!(id, 5);
                assert_eq!(result.error_code(), Some(INVALID_ARGUMENT));
            }
            other => panic!("unexpected frame {:?}", other),
        }

        // The unparseable line is dropped; the next call is still served
        let second = Frame::parse(&from_native.recv().await.unwrap()).unwrap();
        assert!(matches!(second, Frame::Reply { id: 6, .. }));
    }

    #[tokio::test]
    async fn test_try_send_reports_full_inbox() {
        let (handle, _inbox) = inbox(1);
        handle.try_send(Message::Shutdown).unwrap();

        let err = handle.try_send(Message::Shutdown).unwrap_err();
        assert!(matches!(err, Error::ChannelSend { .. }));
    }

    #[tokio::test]
    async fn test_try_send_after_engine_dropped() {
        let (handle, inbox) = inbox(1);
        drop(inbox);

        assert!(handle.is_closed());
        assert!(matches!(
            handle.try_broadcast(Broadcast::sms(Vec::new())),
            Err(Error::ChannelClosed)
        ));
    }
}
