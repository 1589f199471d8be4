//! Configuration types
//!
//! Defines:
//! - `Settings` - Engine settings
//! - One struct per TOML section

use serde::{Deserialize, Serialize};

use nbridge_core::{Permission, RecordShape, LISTENER_PERMISSIONS};

use crate::platform::LocationProvider;

/// Engine settings (from nbridge.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub channel: ChannelSettings,

    #[serde(default)]
    pub listeners: ListenerSettings,

    #[serde(default)]
    pub event_log: EventLogSettings,

    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelSettings {
    /// Name shared by both ends of the channel
    #[serde(default = "default_channel_name")]
    pub name: String,

    /// Capacity of the engine inbox
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
            inbox_capacity: default_inbox_capacity(),
        }
    }
}

fn default_channel_name() -> String {
    nbridge_channel::CHANNEL_NAME.to_string()
}

fn default_inbox_capacity() -> usize {
    256
}

/// What to do with a broadcast whose listener is not registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LateBroadcastPolicy {
    /// Discard: no log entry, no push
    #[default]
    Drop,
    /// Process as if the listener were registered
    Accept,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ListenerSettings {
    #[serde(default)]
    pub late_broadcasts: LateBroadcastPolicy,

    /// Register the package-change receiver alongside the SMS receiver
    #[serde(default = "default_true")]
    pub watch_packages: bool,

    /// Push `onPackageChanged` for package broadcasts
    #[serde(default)]
    pub emit_package_events: bool,

    /// Permissions that must all be granted before listeners start
    #[serde(default = "default_required_permissions")]
    pub required_permissions: Vec<Permission>,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            late_broadcasts: LateBroadcastPolicy::default(),
            watch_packages: true,
            emit_package_events: false,
            required_permissions: default_required_permissions(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_required_permissions() -> Vec<Permission> {
    LISTENER_PERMISSIONS.to_vec()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EventLogSettings {
    /// Shape of records returned by `getReceivedMessages`
    #[serde(default)]
    pub record_shape: RecordShape,

    /// Evict the oldest entry beyond this many (unbounded when unset)
    #[serde(default)]
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TelemetrySettings {
    /// Interface whose first IPv4 address is reported
    #[serde(default = "default_wifi_interface")]
    pub wifi_interface: String,

    /// Location providers, queried in order
    #[serde(default = "default_location_providers")]
    pub location_providers: Vec<LocationProvider>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            wifi_interface: default_wifi_interface(),
            location_providers: default_location_providers(),
        }
    }
}

fn default_wifi_interface() -> String {
    "wlan0".to_string()
}

fn default_location_providers() -> Vec<LocationProvider> {
    vec![LocationProvider::Gps, LocationProvider::Network]
}
