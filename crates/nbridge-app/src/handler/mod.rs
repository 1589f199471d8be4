//! Handler module - update function and per-message handlers
//!
//! Organized into submodules:
//! - `calls`: UI method calls
//! - `broadcast`: OS broadcasts
//! - `permissions`: Permission prompt results

pub(crate) mod broadcast;
pub(crate) mod calls;
pub(crate) mod permissions;


use serde_json::json;

use nbridge_channel::{MethodResult, INVALID_ARGUMENT};
use nbridge_core::prelude::*;
use nbridge_core::ON_LISTENERS_CHANGED;

use crate::lifecycle::ListenerManager;
use crate::message::{Message, ReplyTo};
use crate::platform::Platform;
use crate::state::BridgeState;

/// Actions that the engine loop should perform after update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    /// Leave the loop
    Shutdown,
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            action: Some(action),
        }
    }
}

/// Process one message against the bridge state
pub fn update(state: &mut BridgeState, message: Message) -> UpdateResult {
    match message {
        Message::Call { call, reply } => {
            let result = calls::handle_call(state, &call);
            state.reply(reply, result);
            UpdateResult::none()
        }
        Message::MalformedCall { id, reason } => {
            debug!("Rejecting malformed call #{}: {}", id, reason);
            state.reply(
                ReplyTo::Channel(id),
                MethodResult::error(INVALID_ARGUMENT, reason),
            );
            UpdateResult::none()
        }
        Message::Broadcast(broadcast) => {
            broadcast::handle_broadcast(state, &broadcast);
            UpdateResult::none()
        }
        Message::PermissionResult {
            request_code,
            grants,
        } => {
            permissions::handle_permission_result(state, request_code, &grants);
            UpdateResult::none()
        }
        Message::Shutdown => {
            with_transition(state, |listeners, platform| listeners.shutdown(platform));
            UpdateResult::action(UpdateAction::Shutdown)
        }
    }
}

/// Run a lifecycle operation, pushing `onListenersChanged` if the state moved
pub(crate) fn with_transition<T>(
    state: &mut BridgeState,
    op: impl FnOnce(&mut ListenerManager, &Platform) -> T,
) -> T {
    let before = state.listeners.state();
    let out = op(&mut state.listeners, &state.platform);
    let after = state.listeners.state();

    if before != after {
        debug!("Listeners {} -> {}", before.label(), after.label());
        state.emitter.emit(
            ON_LISTENERS_CHANGED,
            json!({
                "active": after.is_active(),
                "state": after.label(),
            }),
        );
    }
    out
}
