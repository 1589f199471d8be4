//! Permission-gated listener lifecycle
//!
//! `Stopped → Active` when every required permission is already granted,
//! otherwise `Stopped → Starting` while the OS prompt is outstanding and
//! `Starting → Active | Stopped` once the matching result arrives.
//! `Active → Stopped` on toggle or shutdown.

use std::collections::BTreeMap;

use nbridge_core::prelude::*;
use nbridge_core::{ListenerKind, ListenerState, Permission, ReceiverHandle};

use crate::platform::Platform;

/// Notice shown when the permission prompt is denied
pub const PERMISSIONS_REQUIRED: &str = "Permissions required!";

/// Notice shown when the OS refuses a receiver registration
pub const LISTENERS_FAILED: &str = "Could not start listeners";

/// Result of a toggle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Listeners were active and are now stopped
    Stopped,
    /// Permissions were already granted and listeners are now active
    Started,
    /// A permission prompt was issued
    PermissionRequested { request_code: u32 },
    /// A prompt is already outstanding; nothing was done
    AlreadyPending,
    /// Starting failed; listeners remain stopped
    Failed,
}

/// Result of a permission prompt that matched the outstanding request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    /// Granted, but registering the receivers failed
    Failed,
}

/// Owns listener state and the registration slot of each kind
#[derive(Debug)]
pub struct ListenerManager {
    state: ListenerState,
    slots: BTreeMap<ListenerKind, ReceiverHandle>,
    kinds: Vec<ListenerKind>,
    required: Vec<Permission>,
    pending_request: Option<u32>,
    next_request_code: u32,
}

impl ListenerManager {
    /// Create a stopped manager that registers `kinds` once `required` is granted
    pub fn new(kinds: Vec<ListenerKind>, required: Vec<Permission>) -> Self {
        Self {
            state: ListenerState::Stopped,
            slots: BTreeMap::new(),
            kinds,
            required,
            pending_request: None,
            next_request_code: 1,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_registered(&self, kind: ListenerKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn registered_count(&self) -> usize {
        self.slots.len()
    }

    /// Request code of the outstanding permission prompt
    pub fn pending_request(&self) -> Option<u32> {
        self.pending_request
    }

    /// Flip the aggregate listener state
    pub fn toggle(&mut self, platform: &Platform) -> ToggleOutcome {
        match self.state {
            ListenerState::Active => {
                self.stop(platform);
                ToggleOutcome::Stopped
            }
            ListenerState::Starting => {
                debug!("Toggle ignored, permission prompt still outstanding");
                ToggleOutcome::AlreadyPending
            }
            ListenerState::Stopped => self.begin_start(platform),
        }
    }

    fn begin_start(&mut self, platform: &Platform) -> ToggleOutcome {
        let missing: Vec<Permission> = self
            .required
            .iter()
            .copied()
            .filter(|p| !platform.permissions.is_granted(*p))
            .collect();

        if missing.is_empty() {
            return match self.start(platform) {
                Ok(()) => ToggleOutcome::Started,
                Err(_) => ToggleOutcome::Failed,
            };
        }

        let request_code = self.next_request_code;
        self.next_request_code = self.next_request_code.wrapping_add(1).max(1);

        debug!(
            "Requesting permissions (code {}): missing {:?}",
            request_code, missing
        );

        match platform.permissions.request(request_code, &self.required) {
            Ok(()) => {
                self.pending_request = Some(request_code);
                self.state = ListenerState::Starting;
                ToggleOutcome::PermissionRequested { request_code }
            }
            Err(e) => {
                warn!("Permission request failed: {}", e);
                ToggleOutcome::Failed
            }
        }
    }

    /// Register every configured kind and enter `Active`.
    ///
    /// Already-registered kinds are left alone. If any registration fails,
    /// the kinds registered so far are rolled back and a notice is shown.
    pub fn start(&mut self, platform: &Platform) -> Result<()> {
        let mut added = Vec::new();

        for kind in self.kinds.clone() {
            if self.slots.contains_key(&kind) {
                continue;
            }
            match platform.receivers.register(kind) {
                Ok(handle) => {
                    debug!("Registered {} receiver ({:?})", kind.label(), handle);
                    self.slots.insert(kind, handle);
                    added.push(kind);
                }
                Err(e) => {
                    warn!("Failed to register {} receiver: {}", kind.label(), e);
                    for kind in added {
                        self.unregister(platform, kind);
                    }
                    self.state = ListenerState::Stopped;
                    self.pending_request = None;
                    platform.notifier.notify(LISTENERS_FAILED);
                    return Err(Error::registration(format!("{}: {}", kind.label(), e)));
                }
            }
        }

        self.state = ListenerState::Active;
        self.pending_request = None;
        info!("Listeners active ({} registered)", self.slots.len());
        Ok(())
    }

    /// Unregister every kind and enter `Stopped`. A no-op when nothing is registered.
    pub fn stop(&mut self, platform: &Platform) {
        let kinds: Vec<ListenerKind> = self.slots.keys().copied().collect();
        for kind in kinds {
            self.unregister(platform, kind);
        }
        if self.state != ListenerState::Stopped {
            info!("Listeners stopped");
        }
        self.state = ListenerState::Stopped;
        self.pending_request = None;
    }

    fn unregister(&mut self, platform: &Platform, kind: ListenerKind) {
        if let Some(handle) = self.slots.remove(&kind) {
            if let Err(e) = platform.receivers.unregister(handle) {
                warn!("Failed to unregister {} receiver: {}", kind.label(), e);
            }
        }
    }

    /// Apply the outcome of a permission prompt.
    ///
    /// Returns `None` when `request_code` does not match the outstanding
    /// prompt; such results are ignored.
    pub fn on_permission_result(
        &mut self,
        platform: &Platform,
        request_code: u32,
        grants: &[bool],
    ) -> Option<PermissionOutcome> {
        if self.pending_request != Some(request_code) {
            debug!("Ignoring permission result for unknown code {}", request_code);
            return None;
        }
        self.pending_request = None;

        if !grants.is_empty() && grants.iter().all(|granted| *granted) {
            match self.start(platform) {
                Ok(()) => Some(PermissionOutcome::Granted),
                Err(_) => Some(PermissionOutcome::Failed),
            }
        } else {
            self.state = ListenerState::Stopped;
            platform.notifier.notify(PERMISSIONS_REQUIRED);
            Some(PermissionOutcome::Denied)
        }
    }

    /// Stop everything on host teardown
    pub fn shutdown(&mut self, platform: &Platform) {
        self.stop(platform);
    }
}
