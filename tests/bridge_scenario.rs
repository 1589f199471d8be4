//! End-to-end bridge tests: a UI-side client talking to a running engine
//! over an in-process channel.
//!
//! Run with: cargo test --test bridge_scenario

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use native_bridge::app::test_utils::FakePlatform;
use native_bridge::app::{
    inbox, Broadcast, BridgeHandle, BridgeState, Engine, LateBroadcastPolicy, Message, Settings,
};
use native_bridge::channel::{
    channel_pair, BridgeCall, ChannelClient, MethodCall, MethodResult, PushEvent, CHANNEL_NAME,
    NOT_FOUND,
};
use native_bridge::core::{DeviceSnapshot, ListenerKind, Permission, NO_SIM_CARD, UNKNOWN};

const HOW_ARE_YOU: &str =
    "07911326040000F0040B911346610089F60000208062917314080CC8F71D14969741F977FD07";
const PART_TWO: &str = "0044048121430000322113329595000F0500032A0202E061391D44BFBF01";

struct Bridge {
    client: ChannelClient,
    events: mpsc::UnboundedReceiver<PushEvent>,
    handle: BridgeHandle,
    engine: JoinHandle<BridgeState>,
}

impl Bridge {
    fn start(fake: &Arc<FakePlatform>, settings: Settings) -> Self {
        let (ui, native) = channel_pair(CHANNEL_NAME);
        let (handle, inbox) = inbox(settings.channel.inbox_capacity);
        let engine = Engine::connect(settings, fake.platform(), &handle, inbox, native);
        let engine = tokio::spawn(engine.run());
        let (client, events) = ChannelClient::connect(ui);
        Self {
            client,
            events,
            handle,
            engine,
        }
    }

    async fn call(&self, call: BridgeCall) -> MethodResult {
        self.client.call(&call).await.unwrap()
    }

    async fn broadcast(&self, fragments: &[&str]) {
        let pdus = fragments.iter().map(|h| hex::decode(h).unwrap()).collect();
        self.handle
            .send(Message::Broadcast(Broadcast::sms(pdus)))
            .await
            .unwrap();
    }

    async fn next_event(&mut self) -> PushEvent {
        tokio::time::timeout(Duration::from_secs(1), self.events.recv())
            .await
            .expect("push event timed out")
            .expect("event stream closed")
    }

    async fn messages(&self) -> Vec<Value> {
        match self.call(BridgeCall::GetReceivedMessages).await {
            MethodResult::Success(Value::Array(records)) => records,
            other => panic!("unexpected result {:?}", other),
        }
    }

    async fn stop(self) -> BridgeState {
        self.handle.shutdown().await.unwrap();
        self.engine.await.unwrap()
    }
}

#[tokio::test]
async fn test_full_listener_session() {
    let fake = FakePlatform::granting_all();
    let mut bridge = Bridge::start(&fake, Settings::default());

    assert_eq!(
        bridge.call(BridgeCall::ToggleListeners).await,
        MethodResult::success(true)
    );
    let changed = bridge.next_event().await;
    assert_eq!(changed.event, "onListenersChanged");
    assert_eq!(changed.params, json!({"active": true, "state": "active"}));

    bridge.broadcast(&[HOW_ARE_YOU, PART_TWO]).await;

    let first = bridge.next_event().await;
    let second = bridge.next_event().await;
    assert_eq!(first.event, "onMessageReceived");
    assert_eq!(first.params["from"], "+31641600986");
    assert_eq!(first.params["message"], "How are you?");
    assert_eq!(second.params["from"], "1234");
    assert_eq!(second.params["message"], "part two");

    let records = bridge.messages().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["message"], "How are you?");
    assert_eq!(records[1]["message"], "part two");
    assert!(records[0]["timestamp"].is_string());

    assert_eq!(
        bridge.call(BridgeCall::ToggleListeners).await,
        MethodResult::success(false)
    );
    assert_eq!(
        bridge.next_event().await.params,
        json!({"active": false, "state": "stopped"})
    );
    assert_eq!(fake.active_registrations(), 0);

    // Listeners are gone, so this one never reaches the log
    bridge.broadcast(&[HOW_ARE_YOU]).await;
    assert_eq!(bridge.messages().await.len(), 2);

    let state = bridge.stop().await;
    assert_eq!(state.log.len(), 2);
}

#[tokio::test]
async fn test_late_broadcasts_accepted_when_configured() {
    let fake = FakePlatform::granting_all();
    let mut settings = Settings::default();
    settings.listeners.late_broadcasts = LateBroadcastPolicy::Accept;
    let mut bridge = Bridge::start(&fake, settings);

    bridge.broadcast(&[HOW_ARE_YOU]).await;

    assert_eq!(bridge.next_event().await.event, "onMessageReceived");
    assert_eq!(bridge.messages().await.len(), 1);
    bridge.stop().await;
}

#[tokio::test]
async fn test_registration_is_idempotent_across_sessions() {
    let fake = FakePlatform::granting_all();
    let bridge = Bridge::start(&fake, Settings::default());

    for _ in 0..3 {
        bridge.call(BridgeCall::ToggleListeners).await;
        assert_eq!(fake.active_of(ListenerKind::Sms), 1);
        assert_eq!(fake.active_of(ListenerKind::PackageChange), 1);
        bridge.call(BridgeCall::ToggleListeners).await;
        assert_eq!(fake.active_registrations(), 0);
    }

    assert_eq!(fake.registrations(), fake.unregistrations());
    bridge.stop().await;
}

#[tokio::test]
async fn test_permission_prompt_round_trip() {
    let fake = FakePlatform::new();
    let mut bridge = Bridge::start(&fake, Settings::default());

    assert_eq!(
        bridge.call(BridgeCall::ToggleListeners).await,
        MethodResult::success(false)
    );
    assert_eq!(
        bridge.next_event().await.params,
        json!({"active": false, "state": "starting"})
    );
    assert_eq!(fake.prompts(), vec![1]);

    for permission in Permission::all() {
        fake.grant(*permission);
    }
    bridge
        .handle
        .send(Message::PermissionResult {
            request_code: 1,
            grants: vec![true, true, true],
        })
        .await
        .unwrap();

    assert_eq!(
        bridge.next_event().await.params,
        json!({"active": true, "state": "active"})
    );
    assert_eq!(fake.active_registrations(), 2);

    let state = bridge.stop().await;
    assert!(!state.listeners.is_active());
    assert_eq!(fake.active_registrations(), 0);
}

#[tokio::test]
async fn test_app_name_lookup() {
    let fake = FakePlatform::new();
    fake.install("com.example.chat", "Chat");
    let bridge = Bridge::start(&fake, Settings::default());

    assert_eq!(
        bridge
            .call(BridgeCall::GetAppName {
                package_name: "com.example.chat".into()
            })
            .await,
        MethodResult::success("Chat")
    );

    let missing = bridge
        .call(BridgeCall::GetAppName {
            package_name: "com.example.missing".into(),
        })
        .await;
    assert_eq!(missing.error_code(), Some(NOT_FOUND));

    bridge.stop().await;
}

#[tokio::test]
async fn test_device_info_is_always_complete() {
    let fake = FakePlatform::new();
    let bridge = Bridge::start(&fake, Settings::default());

    let info = match bridge.call(BridgeCall::GetDeviceInfo).await {
        MethodResult::Success(value) => value,
        other => panic!("unexpected result {:?}", other),
    };

    let map = info.as_object().unwrap();
    assert_eq!(map.len(), 11);
    for key in DeviceSnapshot::KEYS {
        assert!(map.contains_key(key), "missing {}", key);
    }
    assert_eq!(info["batteryPercentage"], -1);
    assert_eq!(info["model"], UNKNOWN);
    assert_eq!(info["networkName"], NO_SIM_CARD);
    assert_eq!(info["smsPermission"], false);

    bridge.stop().await;
}

#[tokio::test]
async fn test_unknown_method_is_not_implemented() {
    let fake = FakePlatform::new();
    let bridge = Bridge::start(&fake, Settings::default());

    let result = bridge
        .client
        .invoke(MethodCall::bare("sendMessage"))
        .await
        .unwrap();
    assert_eq!(result, MethodResult::NotImplemented);

    bridge.stop().await;
}
