//! # nbridge-app - Bridge Engine
//!
//! Owns the listener lifecycle, the event log and the engine loop that
//! serves the bridge channel. Platform facilities are reached through the
//! traits in [`platform`].
//!
//! Depends on [`nbridge_core`] for domain types and [`nbridge_channel`] for
//! the wire side.
//!
//! ## Public API
//!
//! ### Engine
//! - [`Engine`] - Single-consumer loop owning [`BridgeState`]
//! - [`BridgeHandle`] - Cloneable producer handle (async and `try_` submission)
//! - [`inbox()`] - Create the engine inbox ahead of the engine
//! - [`Message`] - Calls, broadcasts, permission results, shutdown
//!
//! ### Listeners
//! - [`ListenerManager`] - Permission-gated lifecycle state machine
//! - [`Broadcast`] - OS broadcast and its normalization into events
//! - [`SmsDeliver`] - SMS-DELIVER PDU decoder
//!
//! ### Queries
//! - [`EventLog`] - Append-only event log
//! - [`device_info::collect()`] - Fault-isolated device telemetry
//!
//! ### Configuration
//! - [`Settings`] - Engine settings loaded by [`load_settings()`]

pub mod broadcast;
pub mod config;
pub mod device_info;
pub mod engine;
pub mod event_log;
pub mod handler;
pub mod lifecycle;
pub mod message;
pub mod platform;
pub mod sms;
pub mod state;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use broadcast::Broadcast;
pub use config::{load_settings, LateBroadcastPolicy, Settings, CONFIG_FILENAME};
pub use engine::{inbox, spawn_channel_reader, BridgeHandle, Engine, Inbox};
pub use event_log::EventLog;
pub use handler::{update, UpdateAction, UpdateResult};
pub use lifecycle::{ListenerManager, PermissionOutcome, ToggleOutcome, PERMISSIONS_REQUIRED};
pub use message::{Message, ReplyTo};
pub use platform::{
    Location, LocationProvider, NetworkInterface, Notifier, PackageRegistry, PermissionGate,
    Platform, ReceiverRegistry, SimState, Telemetry,
};
pub use sms::SmsDeliver;
pub use state::BridgeState;
