//! Permission prompt result handler

use nbridge_core::prelude::*;

use crate::state::BridgeState;

use super::with_transition;

pub(crate) fn handle_permission_result(state: &mut BridgeState, request_code: u32, grants: &[bool]) {
    let outcome = with_transition(state, |listeners, platform| {
        listeners.on_permission_result(platform, request_code, grants)
    });

    if let Some(outcome) = outcome {
        info!("Permission prompt {} resolved: {:?}", request_code, outcome);
    }
}
