//! Platform seams
//!
//! Everything the bridge needs from the host OS is reached through these
//! traits: permission grants, receiver registration, the package registry,
//! telemetry providers and user-visible notices. Implementations are called
//! from the engine task and must not block for long.

use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use nbridge_core::prelude::*;
use nbridge_core::{ListenerKind, Permission, ReceiverHandle};

// ─────────────────────────────────────────────────────────
// Telemetry Types
// ─────────────────────────────────────────────────────────

/// SIM card state as reported by the telephony service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimState {
    Ready,
    #[default]
    Absent,
    /// Present but locked or not yet usable
    NotReady,
}

impl SimState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SimState::Ready)
    }
}

/// Source of a last-known location fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationProvider {
    Gps,
    Network,
}

impl LocationProvider {
    pub fn name(&self) -> &'static str {
        match self {
            LocationProvider::Gps => "gps",
            LocationProvider::Network => "network",
        }
    }
}

/// A location fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A network interface and its addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
}

// ─────────────────────────────────────────────────────────
// Seams
// ─────────────────────────────────────────────────────────

/// Runtime permission checks and prompts
#[cfg_attr(test, mockall::automock)]
pub trait PermissionGate: Send + Sync {
    fn is_granted(&self, permission: Permission) -> bool;

    /// Show the OS prompt. The outcome arrives later as a permission result
    /// carrying the same `request_code`.
    fn request(&self, request_code: u32, permissions: &[Permission]) -> Result<()>;
}

/// OS broadcast receiver registration
#[cfg_attr(test, mockall::automock)]
pub trait ReceiverRegistry: Send + Sync {
    fn register(&self, kind: ListenerKind) -> Result<ReceiverHandle>;
    fn unregister(&self, handle: ReceiverHandle) -> Result<()>;
}

/// Installed application lookup
#[cfg_attr(test, mockall::automock)]
pub trait PackageRegistry: Send + Sync {
    /// Display label of an installed package, `None` when not installed
    fn application_label(&self, package_name: &str) -> Result<Option<String>>;
}

/// Device telemetry providers. Each query may fail independently.
#[cfg_attr(test, mockall::automock)]
pub trait Telemetry: Send + Sync {
    fn battery_percent(&self) -> Result<i32>;
    fn model(&self) -> Result<String>;
    fn os_release(&self) -> Result<String>;
    fn sim_state(&self) -> Result<SimState>;
    fn airplane_mode(&self) -> Result<bool>;
    fn network_operator_name(&self) -> Result<Option<String>>;
    fn network_interfaces(&self) -> Result<Vec<NetworkInterface>>;
    fn last_known_location(&self, provider: LocationProvider) -> Result<Option<Location>>;
}

/// Short user-visible notices (toast equivalent)
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// The full set of platform collaborators
#[derive(Clone)]
pub struct Platform {
    pub permissions: Arc<dyn PermissionGate>,
    pub receivers: Arc<dyn ReceiverRegistry>,
    pub packages: Arc<dyn PackageRegistry>,
    pub telemetry: Arc<dyn Telemetry>,
    pub notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}
