//! Device telemetry collection for `getDeviceInfo`
//!
//! Every source is queried on its own; a failing source only degrades its
//! field to the sentinel.

use std::net::IpAddr;

use nbridge_core::prelude::*;
use nbridge_core::{DeviceSnapshot, Permission, NO_SIM_CARD};

use crate::config::TelemetrySettings;
use crate::platform::Platform;

/// Log a failed telemetry query and drop the error
fn field<T>(source: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            let err = Error::telemetry_unavailable(source, e.to_string());
            debug!("{}", err);
            None
        }
    }
}

/// Collect a fresh snapshot
pub fn collect(platform: &Platform, settings: &TelemetrySettings) -> DeviceSnapshot {
    let telemetry = &platform.telemetry;
    let mut snapshot = DeviceSnapshot::default();

    if let Some(level) = field("battery", telemetry.battery_percent()) {
        snapshot.battery_percentage = level;
    }

    if let Some(model) = field("model", telemetry.model()).filter(|m| !m.is_empty()) {
        snapshot.model = model;
    }

    if let Some(release) = field("os_release", telemetry.os_release()) {
        snapshot.operating_system = format!("Android {}", release);
    }

    snapshot.sim_card = field("sim_state", telemetry.sim_state())
        .map(|state| state.is_ready())
        .unwrap_or(false);

    snapshot.airplane_mode = field("airplane_mode", telemetry.airplane_mode()).unwrap_or(false);

    snapshot.network_permission = platform
        .permissions
        .is_granted(Permission::AccessNetworkState);
    snapshot.sms_permission = platform.permissions.is_granted(Permission::ReceiveSms);

    if snapshot.sim_card {
        if let Some(name) = field("operator_name", telemetry.network_operator_name()).flatten() {
            snapshot.network_name = name;
        }
    } else {
        snapshot.network_name = NO_SIM_CARD.to_string();
    }

    if let Some(ip) = wifi_address(platform, &settings.wifi_interface) {
        snapshot.ip_address = ip.to_string();
    }

    if platform
        .permissions
        .is_granted(Permission::AccessFineLocation)
    {
        for provider in &settings.location_providers {
            let fix = field("location", telemetry.last_known_location(*provider)).flatten();
            if let Some(location) = fix {
                trace!("Location from {} provider", provider.name());
                snapshot.latitude = format_coordinate(location.latitude);
                snapshot.longitude = format_coordinate(location.longitude);
                break;
            }
        }
    }

    snapshot
}

/// Render a coordinate the way the JVM prints a double: always a fractional
/// part, and `1.0E-4` notation outside `[1e-3, 1e7)`.
fn format_coordinate(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || !value.is_finite() || (1e-3..1e7).contains(&magnitude) {
        return format!("{:?}", value);
    }

    let scientific = format!("{:e}", value);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => {
            format!("{}E{}", mantissa, exponent)
        }
        Some((mantissa, exponent)) => format!("{}.0E{}", mantissa, exponent),
        None => scientific,
    }
}

/// First non-loopback IPv4 address on the named interface
fn wifi_address(platform: &Platform, interface: &str) -> Option<IpAddr> {
    field("network_interfaces", platform.telemetry.network_interfaces())?
        .into_iter()
        .filter(|iface| iface.name == interface)
        .flat_map(|iface| iface.addresses)
        .find(|addr| addr.is_ipv4() && !addr.is_loopback())
}
