//! Engine-owned bridge state

use nbridge_channel::{EventEmitter, MethodResult};
use nbridge_core::prelude::*;
use nbridge_core::ListenerKind;

use crate::config::Settings;
use crate::event_log::EventLog;
use crate::lifecycle::ListenerManager;
use crate::message::ReplyTo;
use crate::platform::Platform;

/// Everything the handlers read and mutate. Owned by a single engine task.
#[derive(Debug)]
pub struct BridgeState {
    pub settings: Settings,
    pub listeners: ListenerManager,
    pub log: EventLog,
    pub platform: Platform,
    pub emitter: EventEmitter,
}

impl BridgeState {
    pub fn new(settings: Settings, platform: Platform, emitter: EventEmitter) -> Self {
        let kinds = if settings.listeners.watch_packages {
            ListenerKind::ALL.to_vec()
        } else {
            vec![ListenerKind::Sms]
        };
        let listeners =
            ListenerManager::new(kinds, settings.listeners.required_permissions.clone());
        let log = EventLog::new(settings.event_log.max_entries);

        Self {
            settings,
            listeners,
            log,
            platform,
            emitter,
        }
    }

    /// Deliver the result of a call to whoever issued it
    pub fn reply(&self, to: ReplyTo, result: MethodResult) {
        match to {
            ReplyTo::Channel(id) => {
                self.emitter.reply(id, result);
            }
            ReplyTo::Direct(tx) => {
                if tx.send(result).is_err() {
                    debug!("Caller dropped before the reply was ready");
                }
            }
        }
    }
}
