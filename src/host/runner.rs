//! Host mode runner

use std::io::{self, BufRead, Write};
use std::path::Path;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use nbridge_app::{inbox, load_settings, BridgeHandle, Engine, Message};
use nbridge_channel::{EventEmitter, Frame};
use nbridge_core::prelude::*;

use super::signals::spawn_signal_handler;
use super::simulator::{load_simulator_settings, SimulatedPlatform};
use super::HostInput;

/// Serve the bridge over stdin/stdout until stdin closes or a signal arrives
pub async fn run_host(config_path: &Path) -> Result<()> {
    let settings = load_settings(config_path);
    let simulator = load_simulator_settings(config_path);

    info!("Serving channel '{}' on stdio", settings.channel.name);

    let (handle, inbox) = inbox(settings.channel.inbox_capacity);
    let sim = SimulatedPlatform::new(simulator, handle.clone());

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let engine = Engine::new(settings, sim.platform(), EventEmitter::new(out_tx), inbox);
    let writer = spawn_stdout_writer(out_rx);

    let stdin_handle = handle.clone();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        let forwarded = forward_lines(stdin.lock(), &stdin_handle);
        info!("Stdin closed after {} message(s)", forwarded);
        let _ = stdin_handle.blocking_send(Message::Shutdown);
    });

    spawn_signal_handler(handle);

    let state = engine.run().await;
    info!(
        "{} event(s) logged, {} receiver(s) left registered",
        state.log.len(),
        sim.active_receivers()
    );

    // The writer finishes once every emitter is gone
    drop(state);
    if let Err(e) = writer.await {
        warn!("Stdout writer failed: {}", e);
    }

    Ok(())
}

/// Parse each line and queue it on the engine inbox. Returns the number of
/// messages forwarded.
pub fn forward_lines<R: BufRead>(reader: R, handle: &BridgeHandle) -> usize {
    let mut forwarded = 0;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match HostInput::parse(&line).and_then(HostInput::into_message) {
            Ok(message) => match handle.blocking_send(message) {
                Ok(()) => forwarded += 1,
                Err(e) if e.is_fatal() => {
                    debug!("Engine gone, stopping stdin reader");
                    break;
                }
                Err(e) => warn!("Failed to queue stdin line: {}", e),
            },
            Err(e) => match Frame::malformed_call_id(&line) {
                Some(id) => {
                    warn!("Malformed call #{} on stdin: {}", id, e);
                    let message = Message::MalformedCall {
                        id,
                        reason: e.to_string(),
                    };
                    if handle.blocking_send(message).is_err() {
                        break;
                    }
                    forwarded += 1;
                }
                None => warn!("Dropping stdin line: {}", e),
            },
        }
    }

    forwarded
}

/// Write outbound frames to stdout, one per line
fn spawn_stdout_writer(mut out_rx: mpsc::UnboundedReceiver<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = out_rx.recv().await {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if writeln!(handle, "{}", line).and_then(|_| handle.flush()).is_err() {
                error!("Failed to write to stdout");
                break;
            }
        }
    })
}
