//! Test utilities for the bridge engine
//!
//! Provides a [`FakePlatform`] implementing every platform seam with
//! in-memory state and registration counters.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use nbridge_core::prelude::*;
use nbridge_core::{ListenerKind, Permission, ReceiverHandle};

use crate::platform::{
    Location, LocationProvider, NetworkInterface, Notifier, PackageRegistry, PermissionGate,
    Platform, ReceiverRegistry, SimState, Telemetry,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory platform double.
///
/// Telemetry queries all fail, so device info reports sentinels except for
/// the permission flags.
#[derive(Debug, Default)]
pub struct FakePlatform {
    granted: Mutex<HashSet<Permission>>,
    prompts: Mutex<Vec<u32>>,
    labels: Mutex<HashMap<String, String>>,
    notices: Mutex<Vec<String>>,
    active: Mutex<BTreeMap<u64, ListenerKind>>,
    failing_kind: Mutex<Option<ListenerKind>>,
    registrations: AtomicUsize,
    unregistrations: AtomicUsize,
    next_handle: AtomicU64,
}

impl FakePlatform {
    /// A platform with no permissions granted
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A platform with every permission granted
    pub fn granting_all() -> Arc<Self> {
        let fake = Self::new();
        for permission in Permission::all() {
            fake.grant(*permission);
        }
        fake
    }

    /// Bundle this fake into a [`Platform`]
    pub fn platform(self: &Arc<Self>) -> Platform {
        Platform {
            permissions: self.clone(),
            receivers: self.clone(),
            packages: self.clone(),
            telemetry: self.clone(),
            notifier: self.clone(),
        }
    }

    pub fn grant(&self, permission: Permission) {
        lock(&self.granted).insert(permission);
    }

    pub fn install(&self, package_name: &str, label: &str) {
        lock(&self.labels).insert(package_name.to_string(), label.to_string());
    }

    /// Make registration of `kind` fail
    pub fn fail_registration_of(&self, kind: ListenerKind) {
        *lock(&self.failing_kind) = Some(kind);
    }

    /// Request codes of every prompt shown so far
    pub fn prompts(&self) -> Vec<u32> {
        lock(&self.prompts).clone()
    }

    pub fn notices(&self) -> Vec<String> {
        lock(&self.notices).clone()
    }

    /// Total successful `register` calls
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Total successful `unregister` calls
    pub fn unregistrations(&self) -> usize {
        self.unregistrations.load(Ordering::SeqCst)
    }

    /// Receivers currently registered
    pub fn active_registrations(&self) -> usize {
        lock(&self.active).len()
    }

    /// Receivers of `kind` currently registered
    pub fn active_of(&self, kind: ListenerKind) -> usize {
        lock(&self.active).values().filter(|k| **k == kind).count()
    }
}

impl PermissionGate for FakePlatform {
    fn is_granted(&self, permission: Permission) -> bool {
        lock(&self.granted).contains(&permission)
    }

    fn request(&self, request_code: u32, _permissions: &[Permission]) -> Result<()> {
        lock(&self.prompts).push(request_code);
        Ok(())
    }
}

impl ReceiverRegistry for FakePlatform {
    fn register(&self, kind: ListenerKind) -> Result<ReceiverHandle> {
        if *lock(&self.failing_kind) == Some(kind) {
            return Err(Error::platform(format!("{} receiver refused", kind.label())));
        }
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.active).insert(id, kind);
        self.registrations.fetch_add(1, Ordering::SeqCst);
        Ok(ReceiverHandle(id))
    }

    fn unregister(&self, handle: ReceiverHandle) -> Result<()> {
        match lock(&self.active).remove(&handle.0) {
            Some(_) => {
                self.unregistrations.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(Error::platform(format!("receiver {} not registered", handle.0))),
        }
    }
}

impl PackageRegistry for FakePlatform {
    fn application_label(&self, package_name: &str) -> Result<Option<String>> {
        Ok(lock(&self.labels).get(package_name).cloned())
    }
}

impl Telemetry for FakePlatform {
    fn battery_percent(&self) -> Result<i32> {
        Err(Error::platform("no battery service"))
    }

    fn model(&self) -> Result<String> {
        Err(Error::platform("no build info"))
    }

    fn os_release(&self) -> Result<String> {
        Err(Error::platform("no build info"))
    }

    fn sim_state(&self) -> Result<SimState> {
        Err(Error::platform("no telephony service"))
    }

    fn airplane_mode(&self) -> Result<bool> {
        Err(Error::platform("no settings provider"))
    }

    fn network_operator_name(&self) -> Result<Option<String>> {
        Err(Error::platform("no telephony service"))
    }

    fn network_interfaces(&self) -> Result<Vec<NetworkInterface>> {
        Err(Error::platform("no network interfaces"))
    }

    fn last_known_location(&self, _provider: LocationProvider) -> Result<Option<Location>> {
        Err(Error::platform("no location service"))
    }
}

impl Notifier for FakePlatform {
    fn notify(&self, message: &str) {
        lock(&self.notices).push(message.to_string());
    }
}
