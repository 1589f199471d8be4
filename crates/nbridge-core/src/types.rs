//! Listener lifecycle types shared by the engine and its consumers

use serde::{Deserialize, Serialize};

/// Kind of OS-level observer managed by the lifecycle manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    /// Incoming SMS broadcast receiver
    Sms,
    /// Package added/removed/replaced broadcast receiver
    PackageChange,
}

impl ListenerKind {
    /// Every listener kind, in registration order
    pub const ALL: [ListenerKind; 2] = [ListenerKind::Sms, ListenerKind::PackageChange];

    pub fn label(&self) -> &'static str {
        match self {
            ListenerKind::Sms => "sms",
            ListenerKind::PackageChange => "package-change",
        }
    }
}

/// Lifecycle state of the listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerState {
    /// No observers registered
    #[default]
    Stopped,
    /// A permission prompt is outstanding
    Starting,
    /// Observers registered with the OS
    Active,
}

impl ListenerState {
    pub fn is_active(&self) -> bool {
        matches!(self, ListenerState::Active)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListenerState::Stopped => "stopped",
            ListenerState::Starting => "starting",
            ListenerState::Active => "active",
        }
    }
}

/// Opaque handle for an OS receiver registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverHandle(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_state_default_is_stopped() {
        assert_eq!(ListenerState::default(), ListenerState::Stopped);
        assert!(!ListenerState::Starting.is_active());
        assert!(ListenerState::Active.is_active());
    }

    #[test]
    fn test_listener_kind_labels() {
        assert_eq!(ListenerKind::Sms.label(), "sms");
        assert_eq!(ListenerKind::PackageChange.label(), "package-change");
        assert_eq!(ListenerKind::ALL.len(), 2);
    }
}
