//! Test utilities for channel frames
//!
//! Provides helpers for reading the frames an emitter has queued.

use tokio::sync::mpsc;

use crate::codec::MethodResult;
use crate::frame::Frame;

/// Drains every queued line and parses it as a frame.
///
/// Lines that fail to parse are skipped.
pub fn drain_frames(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Frame> {
    let mut frames = Vec::new();
    while let Ok(line) = rx.try_recv() {
        if let Ok(frame) = Frame::parse(&line) {
            frames.push(frame);
        }
    }
    frames
}

/// Drains queued frames and keeps only push events as `(event, params)`.
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<(String, serde_json::Value)> {
    drain_frames(rx)
        .into_iter()
        .filter_map(|frame| match frame {
            Frame::Event { event, params } => Some((event, params)),
            _ => None,
        })
        .collect()
}

/// Drains queued frames and returns the result of the reply for call `id`.
pub fn take_reply(rx: &mut mpsc::UnboundedReceiver<String>, id: u64) -> Option<MethodResult> {
    drain_frames(rx).into_iter().find_map(|frame| match frame {
        Frame::Reply { id: reply_id, result } if reply_id == id => Some(result),
        _ => None,
    })
}
