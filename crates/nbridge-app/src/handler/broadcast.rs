//! OS broadcast handlers

use nbridge_core::prelude::*;
use nbridge_core::{Event, ON_MESSAGE_RECEIVED, ON_PACKAGE_CHANGED};

use crate::broadcast::Broadcast;
use crate::config::LateBroadcastPolicy;
use crate::state::BridgeState;

pub(crate) fn handle_broadcast(state: &mut BridgeState, broadcast: &Broadcast) {
    let Some(kind) = broadcast.listener_kind() else {
        debug!("Ignoring broadcast {}", broadcast.action);
        return;
    };

    if !state.listeners.is_registered(kind) {
        match state.settings.listeners.late_broadcasts {
            LateBroadcastPolicy::Drop => {
                debug!("Dropping {} broadcast, listener not registered", kind.label());
                return;
            }
            LateBroadcastPolicy::Accept => {
                debug!("Accepting late {} broadcast", kind.label());
            }
        }
    }

    for event in broadcast.normalize() {
        info!("{}", event.summary());

        let push = match &event {
            Event::MessageReceived(_) => Some(ON_MESSAGE_RECEIVED),
            Event::PackageChanged(_) if state.settings.listeners.emit_package_events => {
                Some(ON_PACKAGE_CHANGED)
            }
            Event::PackageChanged(_) => None,
        };
        let payload = event.payload();

        state.log.push(event);

        if let Some(name) = push {
            state.emitter.emit(name, payload);
        }
    }
}
