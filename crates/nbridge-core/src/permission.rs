//! Privileged OS permissions the bridge depends on

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Runtime permissions checked or requested by the bridge.
///
/// Serialized using the Android manifest permission names so configuration
/// files can list them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "android.permission.RECEIVE_SMS")]
    ReceiveSms,
    #[serde(rename = "android.permission.READ_SMS")]
    ReadSms,
    #[serde(rename = "android.permission.ACCESS_NETWORK_STATE")]
    AccessNetworkState,
    #[serde(rename = "android.permission.ACCESS_FINE_LOCATION")]
    AccessFineLocation,
}

/// Permissions required before the listeners may start
pub const LISTENER_PERMISSIONS: [Permission; 3] = [
    Permission::ReceiveSms,
    Permission::ReadSms,
    Permission::AccessNetworkState,
];

impl Permission {
    pub const fn all() -> &'static [Self] {
        &[
            Self::ReceiveSms,
            Self::ReadSms,
            Self::AccessNetworkState,
            Self::AccessFineLocation,
        ]
    }

    /// Manifest name of this permission
    pub const fn manifest_name(&self) -> &'static str {
        match self {
            Self::ReceiveSms => "android.permission.RECEIVE_SMS",
            Self::ReadSms => "android.permission.READ_SMS",
            Self::AccessNetworkState => "android.permission.ACCESS_NETWORK_STATE",
            Self::AccessFineLocation => "android.permission.ACCESS_FINE_LOCATION",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_name())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.manifest_name() == s)
            .ok_or_else(|| Error::config(format!("unknown permission: {}", s)))
    }
}
