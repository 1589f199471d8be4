//! OS broadcasts and their normalization into events

use nbridge_core::prelude::*;
use nbridge_core::{Event, ListenerKind, PackageAction, PackageEvent};

use crate::sms::SmsDeliver;

pub const SMS_RECEIVED: &str = "android.provider.Telephony.SMS_RECEIVED";
pub const PACKAGE_ADDED: &str = "android.intent.action.PACKAGE_ADDED";
pub const PACKAGE_REMOVED: &str = "android.intent.action.PACKAGE_REMOVED";
pub const PACKAGE_REPLACED: &str = "android.intent.action.PACKAGE_REPLACED";

/// An asynchronous notification delivered by the OS
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Broadcast {
    /// Intent action
    pub action: String,
    /// Data URI, e.g. `package:com.example.app`
    pub data: Option<String>,
    /// Raw PDU fragments of an SMS broadcast, in delivery order
    pub pdus: Vec<Vec<u8>>,
}

impl Broadcast {
    pub fn sms(pdus: Vec<Vec<u8>>) -> Self {
        Self {
            action: SMS_RECEIVED.to_string(),
            data: None,
            pdus,
        }
    }

    pub fn package(action: PackageAction, package_name: &str) -> Self {
        let action = match action {
            PackageAction::Added => PACKAGE_ADDED,
            PackageAction::Removed => PACKAGE_REMOVED,
            PackageAction::Replaced => PACKAGE_REPLACED,
        };
        Self {
            action: action.to_string(),
            data: Some(format!("package:{}", package_name)),
            pdus: Vec::new(),
        }
    }

    /// The listener kind that receives this broadcast, if any
    pub fn listener_kind(&self) -> Option<ListenerKind> {
        if self.action == SMS_RECEIVED {
            Some(ListenerKind::Sms)
        } else if package_action(&self.action).is_some() {
            Some(ListenerKind::PackageChange)
        } else {
            None
        }
    }

    /// Normalize into events.
    ///
    /// An SMS broadcast yields one event per fragment that decodes, in
    /// fragment order. Fragments that fail to decode are skipped.
    pub fn normalize(&self) -> Vec<Event> {
        if self.action == SMS_RECEIVED {
            return self
                .pdus
                .iter()
                .enumerate()
                .filter_map(|(index, pdu)| match SmsDeliver::decode(pdu) {
                    Ok(sms) => Some(Event::MessageReceived(sms.into_event())),
                    Err(e) => {
                        warn!("Skipping SMS fragment {}: {}", index, e);
                        None
                    }
                })
                .collect();
        }

        if let Some(action) = package_action(&self.action) {
            return match &self.data {
                Some(data) if !data.is_empty() => vec![Event::PackageChanged(PackageEvent {
                    action,
                    data: data.clone(),
                })],
                _ => {
                    warn!("Ignoring {} broadcast without package data", action.as_str());
                    Vec::new()
                }
            };
        }

        debug!("Ignoring broadcast with action {}", self.action);
        Vec::new()
    }
}

fn package_action(action: &str) -> Option<PackageAction> {
    match action {
        PACKAGE_ADDED => Some(PackageAction::Added),
        PACKAGE_REMOVED => Some(PackageAction::Removed),
        PACKAGE_REPLACED => Some(PackageAction::Replaced),
        _ => None,
    }
}
