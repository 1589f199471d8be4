//! Message types for the engine inbox
//!
//! UI calls, OS broadcasts and permission results all arrive as messages on
//! a single queue, drained by one consumer.

use tokio::sync::oneshot;

use nbridge_channel::{MethodCall, MethodResult};

use crate::broadcast::Broadcast;

/// Where the result of a call goes
#[derive(Debug)]
pub enum ReplyTo {
    /// A reply frame on the bridge channel, carrying the call id
    Channel(u64),
    /// An in-process caller awaiting the result
    Direct(oneshot::Sender<MethodResult>),
}

/// All inputs the engine reacts to
#[derive(Debug)]
pub enum Message {
    /// A method call from the UI layer
    Call { call: MethodCall, reply: ReplyTo },

    /// An OS broadcast delivered to a receiver
    Broadcast(Broadcast),

    /// A UI frame with a call id that could not be parsed as a call
    MalformedCall { id: u64, reason: String },

    /// Outcome of a permission prompt, one flag per requested permission
    PermissionResult { request_code: u32, grants: Vec<bool> },

    /// Host teardown: stop every listener and exit the loop
    Shutdown,
}
