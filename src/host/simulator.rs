//! Simulated device platform for host mode
//!
//! Backs every platform seam with values from the `[simulator]` section of
//! the config file. Telemetry fields left unset behave like an unavailable
//! OS service.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;

use nbridge_app::{
    BridgeHandle, Location, LocationProvider, NetworkInterface, Notifier, PackageRegistry,
    PermissionGate, Platform, ReceiverRegistry, SimState, Telemetry,
};
use nbridge_core::prelude::*;
use nbridge_core::{ListenerKind, Permission, ReceiverHandle};

/// How the simulated user answers permission prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptResponse {
    Grant,
    Deny,
    /// Leave the prompt open; a `permissionResult` line answers it
    #[default]
    None,
}

/// `[simulator]` section of the config file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    pub granted: Vec<Permission>,
    pub prompt_response: PromptResponse,
    /// Package name to display label
    pub apps: HashMap<String, String>,
    pub battery_percent: Option<i32>,
    pub model: Option<String>,
    pub os_release: Option<String>,
    pub sim_state: Option<SimState>,
    pub airplane_mode: Option<bool>,
    pub operator_name: Option<String>,
    pub interfaces: Option<Vec<NetworkInterface>>,
    pub location: Option<Location>,
}

#[derive(Debug, Default, Deserialize)]
struct HostFile {
    #[serde(default)]
    simulator: SimulatorSettings,
}

/// Load the `[simulator]` section, falling back to defaults
pub fn load_simulator_settings(config_path: &Path) -> SimulatorSettings {
    if !config_path.exists() {
        return SimulatorSettings::default();
    }

    match std::fs::read_to_string(config_path) {
        Ok(content) => match parse_simulator_settings(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to parse simulator section of {:?}: {}", config_path, e);
                SimulatorSettings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            SimulatorSettings::default()
        }
    }
}

pub fn parse_simulator_settings(content: &str) -> Result<SimulatorSettings> {
    toml::from_str::<HostFile>(content)
        .map(|file| file.simulator)
        .map_err(|e| Error::config(e.to_string()))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn unavailable<T>(value: &Option<T>, service: &str) -> Result<T>
where
    T: Clone,
{
    value
        .clone()
        .ok_or_else(|| Error::platform(format!("{} not available", service)))
}

/// Platform backed by [`SimulatorSettings`]
#[derive(Debug)]
pub struct SimulatedPlatform {
    settings: SimulatorSettings,
    granted: Mutex<HashSet<Permission>>,
    receivers: Mutex<HashMap<u64, ListenerKind>>,
    next_handle: AtomicU64,
    handle: BridgeHandle,
}

impl SimulatedPlatform {
    /// Prompt answers are delivered back to the engine through `handle`
    pub fn new(settings: SimulatorSettings, handle: BridgeHandle) -> Arc<Self> {
        let granted = settings.granted.iter().copied().collect();
        Arc::new(Self {
            settings,
            granted: Mutex::new(granted),
            receivers: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(0),
            handle,
        })
    }

    pub fn platform(self: &Arc<Self>) -> Platform {
        Platform {
            permissions: self.clone(),
            receivers: self.clone(),
            packages: self.clone(),
            telemetry: self.clone(),
            notifier: self.clone(),
        }
    }

    /// Receivers currently registered
    pub fn active_receivers(&self) -> usize {
        lock(&self.receivers).len()
    }
}

impl PermissionGate for SimulatedPlatform {
    fn is_granted(&self, permission: Permission) -> bool {
        lock(&self.granted).contains(&permission)
    }

    fn request(&self, request_code: u32, permissions: &[Permission]) -> Result<()> {
        info!(
            "Permission prompt #{} for {} permission(s)",
            request_code,
            permissions.len()
        );

        let grant = match self.settings.prompt_response {
            PromptResponse::None => return Ok(()),
            PromptResponse::Grant => true,
            PromptResponse::Deny => false,
        };

        if grant {
            lock(&self.granted).extend(permissions.iter().copied());
        }
        self.handle
            .try_permission_result(request_code, vec![grant; permissions.len()])
            .context("Failed to deliver simulated prompt answer")
    }
}

impl ReceiverRegistry for SimulatedPlatform {
    fn register(&self, kind: ListenerKind) -> Result<ReceiverHandle> {
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.receivers).insert(id, kind);
        debug!("Registered {} receiver #{}", kind.label(), id);
        Ok(ReceiverHandle(id))
    }

    fn unregister(&self, handle: ReceiverHandle) -> Result<()> {
        lock(&self.receivers)
            .remove(&handle.0)
            .map(|kind| debug!("Unregistered {} receiver #{}", kind.label(), handle.0))
            .ok_or_else(|| Error::platform(format!("receiver {} not registered", handle.0)))
    }
}

impl PackageRegistry for SimulatedPlatform {
    fn application_label(&self, package_name: &str) -> Result<Option<String>> {
        Ok(self.settings.apps.get(package_name).cloned())
    }
}

impl Telemetry for SimulatedPlatform {
    fn battery_percent(&self) -> Result<i32> {
        unavailable(&self.settings.battery_percent, "battery service")
    }

    fn model(&self) -> Result<String> {
        unavailable(&self.settings.model, "build info")
    }

    fn os_release(&self) -> Result<String> {
        unavailable(&self.settings.os_release, "build info")
    }

    fn sim_state(&self) -> Result<SimState> {
        unavailable(&self.settings.sim_state, "telephony service")
    }

    fn airplane_mode(&self) -> Result<bool> {
        unavailable(&self.settings.airplane_mode, "settings provider")
    }

    fn network_operator_name(&self) -> Result<Option<String>> {
        Ok(self.settings.operator_name.clone())
    }

    fn network_interfaces(&self) -> Result<Vec<NetworkInterface>> {
        unavailable(&self.settings.interfaces, "network interfaces")
    }

    fn last_known_location(&self, provider: LocationProvider) -> Result<Option<Location>> {
        trace!("Location query via {}", provider.name());
        Ok(self.settings.location)
    }
}

impl Notifier for SimulatedPlatform {
    fn notify(&self, message: &str) {
        info!("Notice: {}", message);
        eprintln!("{}", message);
    }
}
