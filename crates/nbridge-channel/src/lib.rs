//! # nbridge-channel - Bridge Channel Multiplexer
//!
//! One named, bidirectional, line-oriented channel carrying two kinds of
//! traffic between the UI layer and the native host:
//! - calls from the UI, each answered by exactly one reply
//! - one-way push events from the native side
//!
//! Depends on [`nbridge_core`] for error handling.
//!
//! ## Public API
//!
//! ### Wire Format
//! - [`Frame`] - Call, reply or event line
//! - [`MethodCall`], [`MethodResult`] - Method codec types and envelopes
//!
//! ### Call Surface
//! - [`BridgeCall`] - The recognized calls
//! - [`CallRejection`] - Unknown method or malformed arguments
//!
//! ### Endpoints
//! - [`channel_pair()`] - Create connected UI and native ends
//! - [`EventEmitter`] - Native side: replies and push events
//! - [`ChannelClient`] - UI side: calls with reply matching and timeouts
//! - [`RequestTracker`] - Pending call bookkeeping

pub mod calls;
pub mod client;
pub mod codec;
pub mod emitter;
pub mod frame;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use calls::{
    BridgeCall, CallRejection, CHANNEL_NAME, GET_APP_NAME, GET_DEVICE_INFO,
    GET_RECEIVED_MESSAGES, TOGGLE_LISTENERS,
};
pub use client::{next_request_id, ChannelClient, PushEvent, RequestTracker};
pub use codec::{MethodCall, MethodResult, INVALID_ARGUMENT, NOT_FOUND};
pub use emitter::{channel_pair, ChannelEnd, EventEmitter};
pub use frame::{strip_brackets, Frame};
