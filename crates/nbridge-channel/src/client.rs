//! UI-side endpoint of the channel
//!
//! This module provides:
//! - Request ID tracking for matching replies to calls
//! - A client that issues calls and receives push events
//! - Timeout handling for calls the native side never answers

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, RwLock};

use nbridge_core::prelude::*;

use crate::calls::BridgeCall;
use crate::codec::{MethodCall, MethodResult};
use crate::emitter::ChannelEnd;
use crate::frame::Frame;

/// Error code delivered to callers whose call was cancelled
pub const CANCELLED: &str = "CANCELLED";

/// Global request ID counter
static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique request ID
pub fn next_request_id() -> u64 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A call awaiting its reply
struct PendingCall {
    /// Channel to send the reply
    reply_tx: oneshot::Sender<MethodResult>,
    /// Method name for logging
    method: String,
}

/// Tracks pending calls and matches replies
pub struct RequestTracker {
    pending: Arc<RwLock<HashMap<u64, PendingCall>>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new pending call
    /// Returns (request_id, receiver for the reply)
    pub async fn register(&self, method: &str) -> (u64, oneshot::Receiver<MethodResult>) {
        let id = next_request_id();
        let (tx, rx) = oneshot::channel();

        let pending = PendingCall {
            reply_tx: tx,
            method: method.to_string(),
        };

        self.pending.write().await.insert(id, pending);

        (id, rx)
    }

    /// Handle an incoming reply
    /// Returns true if the reply was matched to a pending call
    pub async fn handle_reply(&self, id: u64, result: MethodResult) -> bool {
        if let Some(pending) = self.pending.write().await.remove(&id) {
            trace!("Reply #{} matched call '{}'", id, pending.method);
            let _ = pending.reply_tx.send(result);
            true
        } else {
            false
        }
    }

    /// Forget a single pending call without answering it
    pub async fn remove(&self, id: u64) -> bool {
        self.pending.write().await.remove(&id).is_some()
    }

    /// Cancel all pending calls (e.g., when the channel closes)
    pub async fn cancel_all(&self) {
        let mut pending = self.pending.write().await;
        for (_, call) in pending.drain() {
            let _ = call
                .reply_tx
                .send(MethodResult::error(CANCELLED, "Call cancelled"));
        }
    }

    /// Get the number of pending calls
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// An unsolicited event received from the native side
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    pub event: String,
    pub params: Value,
}

/// Issues calls over the channel and routes replies and push events
#[derive(Clone)]
pub struct ChannelClient {
    /// Line sink towards the native side
    to_native: mpsc::UnboundedSender<String>,
    /// Request tracker for reply matching
    tracker: Arc<RequestTracker>,
}

impl std::fmt::Debug for ChannelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelClient")
            .field("to_native", &"<channel>")
            .field("tracker", &"<tracker>")
            .finish()
    }
}

impl ChannelClient {
    /// Default time to wait for a reply
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Attach to the UI end of a channel.
    ///
    /// Spawns the reader task on the current tokio runtime and returns the
    /// client plus the stream of push events.
    pub fn connect(end: ChannelEnd) -> (Self, mpsc::UnboundedReceiver<PushEvent>) {
        let (to_native, from_native) = end.split();
        let tracker = Arc::new(RequestTracker::new());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        tokio::spawn(read_loop(from_native, tracker.clone(), events_tx));

        (Self { to_native, tracker }, events_rx)
    }

    /// Issue a call and wait for its reply
    pub async fn invoke(&self, call: MethodCall) -> Result<MethodResult> {
        self.invoke_with_timeout(call, Self::DEFAULT_TIMEOUT).await
    }

    /// Issue a typed bridge call and wait for its reply
    pub async fn call(&self, call: &BridgeCall) -> Result<MethodResult> {
        self.invoke(call.to_method_call()).await
    }

    /// Issue a call with a custom timeout
    pub async fn invoke_with_timeout(
        &self,
        call: MethodCall,
        timeout: Duration,
    ) -> Result<MethodResult> {
        let (id, reply_rx) = self.tracker.register(&call.method).await;
        let method = call.method.clone();
        let line = Frame::Call { id, call }.encode();

        debug!("Sending call #{}: {}", id, method);

        if self.to_native.send(line).is_err() {
            self.tracker.remove(id).await;
            return Err(Error::channel_send("bridge channel"));
        }

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(result)) => {
                debug!("Call #{} completed: {}", id, result.summary());
                Ok(result)
            }
            Ok(Err(_)) => Err(Error::ChannelClosed),
            Err(_) => {
                self.tracker.remove(id).await;
                Err(Error::timeout(method))
            }
        }
    }

    /// Get the request tracker
    pub fn tracker(&self) -> &Arc<RequestTracker> {
        &self.tracker
    }
}

async fn read_loop(
    mut from_native: mpsc::UnboundedReceiver<String>,
    tracker: Arc<RequestTracker>,
    events_tx: mpsc::UnboundedSender<PushEvent>,
) {
    while let Some(line) = from_native.recv().await {
        match Frame::parse(&line) {
            Ok(Frame::Reply { id, result }) => {
                if !tracker.handle_reply(id, result).await {
                    warn!("Reply #{} does not match any pending call", id);
                }
            }
            Ok(Frame::Event { event, params }) => {
                let _ = events_tx.send(PushEvent { event, params });
            }
            Ok(frame) => warn!("Unexpected frame on UI side: {}", frame.summary()),
            Err(e) => warn!("Dropping malformed frame: {}", e),
        }
    }

    debug!("Native side closed the channel");
    tracker.cancel_all().await;
}
