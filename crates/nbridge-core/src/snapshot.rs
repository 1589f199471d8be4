//! Device telemetry snapshot returned by `getDeviceInfo`

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel for string fields that could not be computed
pub const UNKNOWN: &str = "Unknown";

/// Sentinel for the battery level when unavailable
pub const UNKNOWN_BATTERY: i32 = -1;

/// Carrier name reported when no SIM is ready
pub const NO_SIM_CARD: &str = "No SIM Card";

/// Point-in-time telemetry. Computed on demand, never cached.
///
/// Every field is always present; unavailable values carry sentinels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    pub battery_percentage: i32,
    pub model: String,
    pub operating_system: String,
    pub sim_card: bool,
    pub airplane_mode: bool,
    pub network_permission: bool,
    pub sms_permission: bool,
    pub network_name: String,
    pub ip_address: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self {
            battery_percentage: UNKNOWN_BATTERY,
            model: UNKNOWN.to_string(),
            operating_system: UNKNOWN.to_string(),
            sim_card: false,
            airplane_mode: false,
            network_permission: false,
            sms_permission: false,
            network_name: UNKNOWN.to_string(),
            ip_address: UNKNOWN.to_string(),
            latitude: UNKNOWN.to_string(),
            longitude: UNKNOWN.to_string(),
        }
    }
}

impl DeviceSnapshot {
    /// Keys of the result mapping, in declaration order
    pub const KEYS: [&'static str; 11] = [
        "batteryPercentage",
        "model",
        "operatingSystem",
        "simCard",
        "airplaneMode",
        "networkPermission",
        "smsPermission",
        "networkName",
        "ipAddress",
        "latitude",
        "longitude",
    ];

    /// Convert into the mapping sent across the channel
    pub fn to_value(&self) -> Value {
        // Plain struct of scalars; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_uses_sentinels_for_every_key() {
        let value = DeviceSnapshot::default().to_value();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 11);
        for key in DeviceSnapshot::KEYS {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(obj["batteryPercentage"], -1);
        assert_eq!(obj["ipAddress"], "Unknown");
        assert_eq!(obj["simCard"], false);
    }

    #[test]
    fn test_snapshot_value_types() {
        let snapshot = DeviceSnapshot {
            battery_percentage: 87,
            model: "Pixel 7".into(),
            operating_system: "Android 14".into(),
            sim_card: true,
            network_name: "Carrier".into(),
            ..Default::default()
        };
        let value = snapshot.to_value();
        assert!(value["batteryPercentage"].is_i64());
        assert!(value["model"].is_string());
        assert!(value["simCard"].is_boolean());
        assert_eq!(value["operatingSystem"], "Android 14");
    }
}
