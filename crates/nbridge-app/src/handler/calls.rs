//! UI method call handlers

use nbridge_channel::{BridgeCall, MethodCall, MethodResult, NOT_FOUND};
use nbridge_core::prelude::*;

use crate::device_info;
use crate::state::BridgeState;

use super::with_transition;

/// Message of the `NOT_FOUND` error returned by `getAppName`
pub const APP_NAME_NOT_FOUND: &str = "Application name not found";

pub(crate) fn handle_call(state: &mut BridgeState, call: &MethodCall) -> MethodResult {
    let call = match BridgeCall::from_method_call(call) {
        Ok(call) => call,
        Err(rejection) => {
            debug!("Rejected call '{}': {:?}", call.method, rejection);
            return rejection.into();
        }
    };

    debug!("Handling {}", call.description());

    match call {
        BridgeCall::ToggleListeners => toggle_listeners(state),
        BridgeCall::GetReceivedMessages => {
            MethodResult::success(state.log.records(state.settings.event_log.record_shape))
        }
        BridgeCall::GetAppName { package_name } => app_name(state, &package_name),
        BridgeCall::GetDeviceInfo => MethodResult::success(
            device_info::collect(&state.platform, &state.settings.telemetry).to_value(),
        ),
    }
}

fn toggle_listeners(state: &mut BridgeState) -> MethodResult {
    let outcome = with_transition(state, |listeners, platform| listeners.toggle(platform));
    debug!("Toggle outcome: {:?}", outcome);
    MethodResult::success(state.listeners.is_active())
}

fn app_name(state: &BridgeState, package_name: &str) -> MethodResult {
    match state.platform.packages.application_label(package_name) {
        Ok(Some(label)) if !label.is_empty() => MethodResult::success(label),
        Ok(_) => MethodResult::error(NOT_FOUND, APP_NAME_NOT_FOUND),
        Err(e) => {
            debug!("Label lookup for {} failed: {}", package_name, e);
            MethodResult::error(NOT_FOUND, APP_NAME_NOT_FOUND)
        }
    }
}
